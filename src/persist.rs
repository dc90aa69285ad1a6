//! Durable single-slot store for the last-connected address
//!
//! Survives process restarts the way browser storage survives page
//! reloads. Last-write-wins, no transactional guarantees; callers
//! treat read/write failures as "no persisted session".

use crate::{constants::SESSION_STORE_KEY, error::StoreError, types::WalletAddress};
use std::fs;
use std::path::PathBuf;

/// Minimal durable key-value slot for the session address
pub trait SessionStore: Send + Sync {
    /// Writes the address, replacing any previous value
    fn save(&self, address: &WalletAddress) -> Result<(), StoreError>;

    /// Reads the stored address, `None` when absent or unreadable
    fn load(&self) -> Option<WalletAddress>;

    /// Removes the stored address
    fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed session store
///
/// The address is written verbatim to a single file named after the
/// fixed store key inside the given directory.
pub struct FileSessionStore {
    slot: PathBuf,
}

impl FileSessionStore {
    /// Creates a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            slot: dir.into().join(SESSION_STORE_KEY),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, address: &WalletAddress) -> Result<(), StoreError> {
        if let Some(parent) = self.slot.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.slot, address.as_str())?;
        Ok(())
    }

    fn load(&self) -> Option<WalletAddress> {
        match fs::read_to_string(&self.slot) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(WalletAddress::new(trimmed))
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read persisted session, treating as absent");
                None
            }
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.slot) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// In-memory session store for testing
    #[derive(Default)]
    pub struct MemoryStore {
        slot: Mutex<Option<WalletAddress>>,
        fail_writes: bool,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store whose writes always fail, for degrade-path tests
        pub fn failing() -> Self {
            Self {
                slot: Mutex::new(None),
                fail_writes: true,
            }
        }

        pub fn stored(&self) -> Option<WalletAddress> {
            self.slot.lock().unwrap().clone()
        }
    }

    impl SessionStore for MemoryStore {
        fn save(&self, address: &WalletAddress) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(std::io::Error::other("scripted write failure").into());
            }
            *self.slot.lock().unwrap() = Some(address.clone());
            Ok(())
        }

        fn load(&self) -> Option<WalletAddress> {
            self.slot.lock().unwrap().clone()
        }

        fn clear(&self) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(std::io::Error::other("scripted write failure").into());
            }
            *self.slot.lock().unwrap() = None;
            Ok(())
        }
    }
}
