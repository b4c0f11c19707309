mod common;

// std
use std::sync::Arc;
// crates.io
use tokio::task::JoinHandle;
// self
use common::*;
use session_broker::{
	auth::{TokenPair, TokenSecret},
	client::SessionClient,
	coordinator::RefreshPhase,
	error::RequestError,
	http::{HeaderValue, Method, StatusCode},
	store::{MemoryTokenStore, TokenStore},
	transport::ApiResponse,
};

fn spawn_get(
	client: &Arc<SessionClient>,
	path: String,
) -> JoinHandle<Result<ApiResponse, RequestError>> {
	let client = client.clone();

	tokio::spawn(async move {
		let request = client.request(Method::GET, &path).expect("Fixture path should join.");

		client.send(request).await
	})
}

async fn assert_single_flight(n: usize) {
	let store = expired_session();
	let transport = ScriptedTransport::accepting("T2");
	let invoker = GatedInvoker::gated("T2");
	let client = client(store.clone(), transport.clone(), invoker.clone());
	let paths = (0..n).map(|i| format!("/api/v1/orders/{i}")).collect::<Vec<_>>();
	let handles =
		paths.iter().map(|path| spawn_get(&client, path.clone())).collect::<Vec<_>>();

	wait_for_parked(&client, n - 1).await;
	invoker.open();

	for (handle, path) in handles.into_iter().zip(&paths) {
		let response = handle
			.await
			.expect("Request task should not panic.")
			.unwrap_or_else(|e| panic!("Request {path} should succeed after refresh: {e}"));

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.body, path.as_bytes());
	}

	assert_eq!(invoker.calls(), 1, "{n} concurrent failures must share one refresh.");
	assert_eq!(transport.calls(), 2 * n);
	assert_eq!(client.coordinator().phase(), RefreshPhase::Idle);
	assert_eq!(client.coordinator().waiting(), 0);
	assert_eq!(client.refresh_metrics().queued(), (n - 1) as u64);
	assert_eq!(client.refresh_metrics().replays(), n as u64);

	let pair = store.tokens().expect("Refreshed session should be stored.");

	assert_eq!(pair.access_token.expose(), "T2");
	assert_eq!(pair.refresh_token.as_ref().map(TokenSecret::expose), Some("R2"));
	assert_eq!(store.writes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_request_refreshes_once() {
	assert_single_flight(1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn five_concurrent_requests_share_one_refresh() {
	assert_single_flight(5).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hundred_concurrent_requests_share_one_refresh() {
	assert_single_flight(100).await;
}

#[tokio::test]
async fn replay_is_attempted_at_most_once() -> color_eyre::Result<()> {
	let store = expired_session();
	let transport = ScriptedTransport::accepting("T2");
	let invoker = GatedInvoker::minting("T3");
	let client = client(store.clone(), transport.clone(), invoker.clone());
	let request = client.request(Method::GET, "/api/v1/orders")?;
	let err = client.send(request).await.expect_err("A second 401 must reach the caller.");
	let failure = err.failure().expect("Terminal 401 should carry the response.");

	assert_eq!(failure.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(failure.request.authorization(), Some(&HeaderValue::from_static("Bearer T3")));
	assert_eq!(transport.calls(), 2);
	assert_eq!(invoker.calls(), 1);
	assert_eq!(store.access_token().as_ref().map(TokenSecret::expose), Some("T3"));

	Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_refresh_rejects_every_caller_with_its_own_failure() {
	let store = expired_session();
	let transport = ScriptedTransport::accepting("T2");
	let invoker = GatedInvoker::gated_rejection();
	let client = client(store.clone(), transport.clone(), invoker.clone());
	let paths = (0..5).map(|i| format!("/api/v1/cart/{i}")).collect::<Vec<_>>();
	let handles =
		paths.iter().map(|path| spawn_get(&client, path.clone())).collect::<Vec<_>>();

	wait_for_parked(&client, 4).await;
	invoker.open();

	for (handle, path) in handles.into_iter().zip(&paths) {
		let err = handle
			.await
			.expect("Request task should not panic.")
			.expect_err("Every caller should observe the failed refresh.");
		let failure = err.failure().expect("Callers should receive their original response.");

		assert_eq!(failure.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(failure.response.body, path.as_bytes());
	}

	assert_eq!(invoker.calls(), 1);
	assert_eq!(transport.calls(), 5, "Nothing may be replayed after a failed refresh.");
	assert_eq!(store.clears(), 1);
	assert!(store.tokens().is_none());
	assert_eq!(client.refresh_metrics().failures(), 1);
	assert_eq!(client.coordinator().phase(), RefreshPhase::Idle);
}

#[tokio::test]
async fn missing_refresh_token_ends_the_session_without_refreshing() {
	let store = Arc::new(MemoryTokenStore::with_tokens(
		TokenPair::new("T1").expect("Fixture should be valid."),
	));
	let transport = ScriptedTransport::accepting("T2");
	let invoker = GatedInvoker::minting("T2");
	let client = client(store.clone(), transport.clone(), invoker.clone());
	let request =
		client.request(Method::GET, "/api/v1/orders").expect("Fixture path should join.");
	let err = client.send(request).await.expect_err("Access-only sessions cannot be refreshed.");

	assert!(err.is_unauthorized());
	assert_eq!(invoker.calls(), 0);
	assert_eq!(transport.calls(), 1);
	assert!(store.tokens().is_none());
	assert_eq!(client.coordinator().phase(), RefreshPhase::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_a_and_b_are_both_replayed() {
	let store = expired_session();
	let transport = ScriptedTransport::accepting("T2");
	let invoker = GatedInvoker::gated("T2");
	let client = client(store.clone(), transport.clone(), invoker.clone());
	let a = spawn_get(&client, "/a".into());

	while client.coordinator().phase() != RefreshPhase::Refreshing {
		tokio::task::yield_now().await;
	}

	let b = spawn_get(&client, "/b".into());

	wait_for_parked(&client, 1).await;

	assert_eq!(client.coordinator().phase(), RefreshPhase::Refreshing);
	assert_eq!(client.coordinator().waiting(), 1);

	invoker.open();

	let a = a.await.expect("Task A should not panic.").expect("A should be replayed.");
	let b = b.await.expect("Task B should not panic.").expect("B should be replayed.");

	assert_eq!((a.status, a.body.as_slice()), (StatusCode::OK, b"/a".as_slice()));
	assert_eq!((b.status, b.body.as_slice()), (StatusCode::OK, b"/b".as_slice()));
	assert_eq!(invoker.calls(), 1);
	assert_eq!(client.coordinator().phase(), RefreshPhase::Idle);
	assert_eq!(client.coordinator().waiting(), 0);
}

#[tokio::test]
async fn replays_reach_the_backend_trigger_first_then_in_arrival_order() {
	let store = expired_session();
	let transport = ScriptedTransport::accepting("T2");
	let invoker = GatedInvoker::gated("T2");
	let client = client(store.clone(), transport.clone(), invoker.clone());
	let a = spawn_get(&client, "/a".into());

	while client.coordinator().phase() != RefreshPhase::Refreshing {
		tokio::task::yield_now().await;
	}

	let b = spawn_get(&client, "/b".into());

	wait_for_parked(&client, 1).await;

	let c = spawn_get(&client, "/c".into());

	wait_for_parked(&client, 2).await;
	invoker.open();

	for (handle, path) in [a, b, c].into_iter().zip(["/a", "/b", "/c"]) {
		let response = handle
			.await
			.expect("Request task should not panic.")
			.unwrap_or_else(|e| panic!("Request {path} should be replayed: {e}"));

		assert_eq!(response.body, path.as_bytes());
	}

	assert_eq!(transport.dispatched(), ["/a", "/b", "/c", "/a", "/b", "/c"]);
	assert_eq!(invoker.calls(), 1);
}

#[tokio::test]
async fn sessions_refresh_again_after_a_completed_cycle() -> color_eyre::Result<()> {
	let store = expired_session();
	let transport = ScriptedTransport::accepting("T2");
	let invoker = GatedInvoker::minting("T2");
	let client = client(store.clone(), transport.clone(), invoker.clone());

	client.send(client.request(Method::GET, "/first")?).await?;

	// Expire the session again behind the client's back.
	store.set_tokens(TokenPair::new("T1")?.with_refresh_token("R2"));

	let response = client.send(client.request(Method::GET, "/second")?).await?;

	assert_eq!(response.body, b"/second");
	assert_eq!(invoker.calls(), 2);
	assert_eq!(client.refresh_metrics().successes(), 2);

	Ok(())
}
