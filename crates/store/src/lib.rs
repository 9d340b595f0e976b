use std::{io::ErrorKind, path::Path, sync::Arc};

use model::session::SessionState;
use tokio::fs;

/// Fixed name of the one slot a browsing session persists into.
pub const SLOT_FILE: &str = "navigation-quiz-state.json";

/// Best-effort persistence for the session state: one JSON blob in one
/// file. The question store stays the source of truth for shape; anything
/// unreadable here is simply treated as "no saved state."
#[derive(Clone)]
pub struct SessionStore {
    slot: Arc<Path>,
}

impl SessionStore {
    pub fn new(dir: &Path) -> Self {
        Self { slot: Arc::from(dir.join(SLOT_FILE)) }
    }

    /// Returns the last saved session, or `None` if there is none or it
    /// cannot be read. Never an error: corrupt JSON is discarded.
    pub async fn load(&self) -> Option<SessionState> {
        let bytes = match fs::read(&*self.slot).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                log::warn!("cannot read session slot: {err}");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(session) => Some(session),
            Err(err) => {
                log::warn!("discarding corrupt session slot: {err}");
                None
            }
        }
    }

    /// Writes the session through to the slot. Failures are logged and
    /// swallowed; a save never fails the operation that triggered it.
    pub async fn save(&self, session: &SessionState) {
        let json = match serde_json::to_vec(session) {
            Ok(json) => json,
            Err(err) => {
                log::error!("cannot serialize session: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&*self.slot, json).await {
            log::warn!("cannot write session slot: {err}");
        }
    }

    /// Removes the slot. Clearing an already-empty slot is not an error.
    pub async fn clear(&self) {
        match fs::remove_file(&*self.slot).await {
            Ok(()) => (),
            Err(err) if err.kind() == ErrorKind::NotFound => (),
            Err(err) => log::warn!("cannot clear session slot: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStore;
    use model::session::SessionState;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("navquiz-store-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test(flavor = "current_thread")]
    async fn round_trip() {
        let store = SessionStore::new(&scratch_dir("round-trip"));
        store.clear().await;

        let mut session = SessionState::fresh(3);
        session.position = 2;
        session.score = 1;
        session.answers[0] = Some("A".into());
        store.save(&session).await;

        assert_eq!(store.load().await, Some(session));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_slot_loads_as_none() {
        let store = SessionStore::new(&scratch_dir("missing"));
        store.clear().await;
        assert_eq!(store.load().await, None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn corrupt_slot_loads_as_none() {
        let dir = scratch_dir("corrupt");
        std::fs::write(dir.join(super::SLOT_FILE), b"{not json").unwrap();
        let store = SessionStore::new(&dir);
        assert_eq!(store.load().await, None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn clear_removes_the_slot() {
        let store = SessionStore::new(&scratch_dir("clear"));
        store.save(&SessionState::fresh(1)).await;
        assert!(store.load().await.is_some());

        store.clear().await;
        assert_eq!(store.load().await, None);
        // Clearing twice stays quiet.
        store.clear().await;
    }
}
