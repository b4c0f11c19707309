//! Simple file-backed [`TokenStore`] that keeps a session alive across process restarts.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	store::{StoreError, TokenStore},
};

/// Persists the session pair to a JSON file after each mutation.
///
/// Reads are served from memory; the file is only touched on open, replace, and clear.
/// Persistence failures never roll back the in-memory session. They are logged and the next
/// successful write (or [`FileTokenStore::flush`]) brings the file back in sync.
#[derive(Debug)]
pub struct FileTokenStore {
	path: PathBuf,
	inner: RwLock<Option<TokenPair>>,
}
impl FileTokenStore {
	/// Opens (or creates) a store at the provided path, eagerly loading an existing session.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: RwLock::new(snapshot) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Writes the in-memory session to disk, surfacing any failure.
	pub fn flush(&self) -> Result<()> {
		let guard = self.inner.read();

		Ok(self.persist_locked(guard.as_ref())?)
	}

	fn load_snapshot(path: &Path) -> Result<Option<TokenPair>, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
		};

		if bytes.is_empty() {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: Option<&TokenPair>) -> Result<(), StoreError> {
		let Some(pair) = contents else {
			return match fs::remove_file(&self.path) {
				Ok(()) => Ok(()),
				Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
				Err(e) => Err(StoreError::Backend {
					message: format!("Failed to remove {}: {e}", self.path.display()),
				}),
			};
		};

		Self::ensure_parent_exists(&self.path)?;

		let serialized = serde_json::to_vec_pretty(pair).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize session snapshot: {e}"),
		})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn persist_or_log(&self, contents: Option<&TokenPair>) {
		if let Err(e) = self.persist_locked(contents) {
			obs_event!(warn, path = %self.path.display(), error = %e, "Failed to persist session tokens.");

			#[cfg(not(feature = "tracing"))]
			let _ = e;
		}
	}
}
impl TokenStore for FileTokenStore {
	fn tokens(&self) -> Option<TokenPair> {
		self.inner.read().clone()
	}

	fn set_tokens(&self, pair: TokenPair) {
		let mut guard = self.inner.write();

		*guard = Some(pair);

		self.persist_or_log(guard.as_ref());
	}

	fn clear_tokens(&self) {
		let mut guard = self.inner.write();

		guard.take();

		self.persist_or_log(None);
	}
}
