//! Tab-scoped session identifier.
//!
//! One id per simulated browser tab, created on first use. With a backing
//! file the id survives a reload of the same tab; without one it lives as long
//! as the store. `reset` starts a new session.

use chrono::Utc;
use fs_err as fs;
use rand::Rng;
use std::cell::RefCell;
use std::path::PathBuf;

pub const SESSION_FILE_NAME: &str = "session_id";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_LEN: usize = 9;

#[derive(Debug, Default)]
pub struct SessionStore {
    current: RefCell<Option<String>>,
    backing_file: Option<PathBuf>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A store whose id is also kept in `path`, so a new store for the same
    /// tab picks it up again.
    pub fn with_backing_file(path: PathBuf) -> Self {
        Self {
            current: RefCell::new(None),
            backing_file: Some(path),
        }
    }

    /// Returns the session id, creating it on first use.
    pub fn get(&self) -> String {
        if let Some(id) = self.current.borrow().as_ref() {
            return id.clone();
        }

        let id = self.read_backing().unwrap_or_else(|| {
            let id = generate_session_id();
            self.write_backing(&id);
            tracing::debug!(session_id = %id, "Created tracking session");
            id
        });
        *self.current.borrow_mut() = Some(id.clone());
        id
    }

    /// The id if one has been created, without creating one.
    pub fn peek(&self) -> Option<String> {
        self.current.borrow().clone().or_else(|| self.read_backing())
    }

    /// Forgets the current id; the next `get` starts a new session.
    pub fn reset(&self) {
        self.current.borrow_mut().take();
        if let Some(path) = &self.backing_file {
            if path.exists() {
                if let Err(err) = fs::remove_file(path) {
                    tracing::warn!(error = %err, "Failed to remove session file");
                }
            }
        }
    }

    fn read_backing(&self) -> Option<String> {
        let path = self.backing_file.as_ref()?;
        let content = fs::read_to_string(path).ok()?;
        let id = content.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    fn write_backing(&self, id: &str) {
        let Some(path) = &self.backing_file else {
            return;
        };
        let result = path
            .parent()
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| fs::write(path, id));
        if let Err(err) = result {
            tracing::warn!(error = %err, "Failed to persist session id; keeping it in memory");
        }
    }
}

/// `session_<unix-millis>_<9 base36 chars>`; unique enough to tell tabs apart,
/// not a secret.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..RANDOM_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}
