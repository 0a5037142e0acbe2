//! Gateway-owned session store.
//!
//! Persists one file per session (`sessions/<id>/session.json`), mirrored
//! from an in-memory `RwLock<HashMap<..>>` the same way the durable stores
//! this crate has always used. The claims side-store lives in [`crate::claims`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;

use forge_domain::error::{Error, Result};
use forge_domain::phase::SessionStatus;
use forge_domain::state::forge_state::ForgeState;
use forge_domain::state::snapshot::from_snapshot;
use forge_domain::tool::Message;
use forge_domain::trace::TraceEvent;

use crate::session::SessionRow;

/// Gateway-owned session store backed by one JSON file per session.
pub struct SessionStore {
    base_dir: PathBuf,
    sessions: RwLock<HashMap<String, SessionRow>>,
}

impl SessionStore {
    /// Load or create the store at `state_dir/sessions/`, restoring any
    /// session rows already on disk.
    pub fn new(state_dir: &Path) -> Result<Self> {
        let base_dir = state_dir.join("sessions");
        std::fs::create_dir_all(&base_dir).map_err(Error::Io)?;

        let mut sessions = HashMap::new();
        if let Ok(entries) = std::fs::read_dir(&base_dir) {
            for entry in entries.flatten() {
                let path = entry.path().join("session.json");
                if !path.exists() {
                    continue;
                }
                match std::fs::read_to_string(&path).map_err(Error::Io).and_then(|raw| {
                    serde_json::from_str::<SessionRow>(&raw).map_err(Error::Json)
                }) {
                    Ok(row) => {
                        sessions.insert(row.id.clone(), row);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session row");
                    }
                }
            }
        }

        tracing::info!(sessions = sessions.len(), path = %base_dir.display(), "session store loaded");

        Ok(Self {
            base_dir,
            sessions: RwLock::new(sessions),
        })
    }

    fn session_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(id).join("session.json")
    }

    /// Create a new session from a problem statement.
    pub fn create(&self, problem: String) -> Result<SessionRow> {
        let id = uuid::Uuid::new_v4().to_string();
        let row = SessionRow::new(id.clone(), problem);

        {
            let mut sessions = self.sessions.write();
            sessions.insert(id.clone(), row.clone());
        }
        self.flush_one(&id)?;

        TraceEvent::SessionResolved {
            session_key: id.clone(),
            session_id: id,
            is_new: true,
        }
        .emit();

        Ok(row)
    }

    /// Look up a session by id.
    pub fn get(&self, id: &str) -> Option<SessionRow> {
        self.sessions.read().get(id).cloned()
    }

    /// List sessions, optionally filtered by status, with pagination.
    pub fn list(&self, limit: usize, offset: usize, status: Option<SessionStatus>) -> Vec<SessionRow> {
        let sessions = self.sessions.read();
        let mut rows: Vec<SessionRow> = sessions
            .values()
            .filter(|r| status.map(|s| r.status == s).unwrap_or(true))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().skip(offset).take(limit).collect()
    }

    /// Mark a session cancelled if it is currently active (not already
    /// crystallized or cancelled). Returns the updated row, or `None` if the
    /// session does not exist.
    pub fn cancel(&self, id: &str) -> Result<Option<SessionRow>> {
        let updated = {
            let mut sessions = self.sessions.write();
            match sessions.get_mut(id) {
                Some(row) => {
                    if !matches!(row.status, SessionStatus::Crystallized | SessionStatus::Cancelled) {
                        row.status = SessionStatus::Cancelled;
                        row.resolved_at = Some(Utc::now());
                    }
                    Some(row.clone())
                }
                None => None,
            }
        };
        if updated.is_some() {
            self.flush_one(id)?;
            TraceEvent::SessionCancelled {
                session_id: id.to_owned(),
                phase: updated.as_ref().unwrap().current_phase.as_str().to_owned(),
            }
            .emit();
        }
        Ok(updated)
    }

    /// Evict a session from the in-memory map. Callers that need the
    /// cascading durable delete should follow up with [`Self::purge`]
    /// (typically on a background task, per the DELETE endpoint's "202
    /// accepted, cascade in the background" contract).
    pub fn evict(&self, id: &str) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    /// Remove a session's on-disk files and its claims side-store directory.
    pub fn purge(&self, id: &str) -> Result<()> {
        let dir = self.base_dir.join(id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(Error::Io)?;
        }
        Ok(())
    }

    /// Append turn messages to a session's history and persist.
    pub fn append_messages(&self, id: &str, messages: &[Message]) -> Result<()> {
        {
            let mut sessions = self.sessions.write();
            if let Some(row) = sessions.get_mut(id) {
                row.message_history.extend_from_slice(messages);
            }
        }
        self.flush_one(id)
    }

    /// Record token usage for a session.
    pub fn record_usage(&self, id: &str, usage: &forge_domain::stream::Usage) -> Result<()> {
        {
            let mut sessions = self.sessions.write();
            if let Some(row) = sessions.get_mut(id) {
                row.tokens.record(usage);
            }
        }
        self.flush_one(id)
    }

    /// Commit a `ForgeState` snapshot: sync the row's denormalized fields
    /// and persist. This is the suspension/commit point referenced by the
    /// concurrency model (after token accounting, after state sync).
    pub fn commit_snapshot(&self, id: &str, state: &ForgeState) -> Result<()> {
        {
            let mut sessions = self.sessions.write();
            if let Some(row) = sessions.get_mut(id) {
                let from = row.current_phase;
                row.sync_from_state(state);
                if from != state.current_phase {
                    TraceEvent::PhaseTransition {
                        session_id: id.to_owned(),
                        from: from.as_str().to_owned(),
                        to: state.current_phase.as_str().to_owned(),
                        round: state.current_round,
                    }
                    .emit();
                }
            }
        }
        self.flush_one(id)
    }

    /// Restore the live `ForgeState` from a session's last snapshot.
    pub fn restore_forge_state(&self, id: &str) -> Result<Option<ForgeState>> {
        let snapshot = match self.sessions.read().get(id) {
            Some(row) => row.forge_state_snapshot.clone(),
            None => return Ok(None),
        };
        from_snapshot(snapshot).map(Some)
    }

    fn flush_one(&self, id: &str) -> Result<()> {
        let row = match self.sessions.read().get(id) {
            Some(row) => row.clone(),
            None => return Ok(()),
        };
        let dir = self.base_dir.join(id);
        std::fs::create_dir_all(&dir).map_err(Error::Io)?;
        let json = serde_json::to_string_pretty(&row).map_err(Error::Json)?;
        std::fs::write(self.session_path(id), json).map_err(Error::Io)?;
        Ok(())
    }

    /// Persist every in-memory session row to disk.
    pub fn flush_all(&self) -> Result<()> {
        let ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        for id in ids {
            self.flush_one(&id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let row = store.create("a problem statement long enough".into()).unwrap();
        let fetched = store.get(&row.id).unwrap();
        assert_eq!(fetched.problem, row.problem);
    }

    #[test]
    fn restart_restores_sessions_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = SessionStore::new(dir.path()).unwrap();
            store.create("persisted across restart".into()).unwrap().id
        };
        let store2 = SessionStore::new(dir.path()).unwrap();
        assert!(store2.get(&id).is_some());
    }

    #[test]
    fn cancel_marks_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let row = store.create("cancel me please".into()).unwrap();
        let updated = store.cancel(&row.id).unwrap().unwrap();
        assert_eq!(updated.status, SessionStatus::Cancelled);
    }

    #[test]
    fn evict_then_purge_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let row = store.create("delete me".into()).unwrap();
        assert!(store.evict(&row.id));
        assert!(store.get(&row.id).is_none());
        store.purge(&row.id).unwrap();
        assert!(!dir.path().join("sessions").join(&row.id).exists());
    }

    #[test]
    fn commit_snapshot_updates_phase_and_round() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let row = store.create("track my phase".into()).unwrap();

        let mut state = ForgeState::default();
        state.fundamentals.push("f1".into());
        state.current_round = 2;
        store.commit_snapshot(&row.id, &state).unwrap();

        let updated = store.get(&row.id).unwrap();
        assert_eq!(updated.current_round, 2);
        let restored = store.restore_forge_state(&row.id).unwrap().unwrap();
        assert_eq!(restored.fundamentals, vec!["f1".to_string()]);
    }

    #[test]
    fn list_filters_by_status_and_paginates() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let a = store.create("session a problem text".into()).unwrap();
        let _b = store.create("session b problem text".into()).unwrap();
        store.cancel(&a.id).unwrap();

        let cancelled = store.list(10, 0, Some(SessionStatus::Cancelled));
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, a.id);

        let all = store.list(1, 0, None);
        assert_eq!(all.len(), 1);
    }
}
