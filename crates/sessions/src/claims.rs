//! Durable knowledge-claim store.
//!
//! One `claims.json` per session, alongside its `session.json`, holding the
//! `KnowledgeClaim`/`Evidence`/`ClaimEdge` rows. Cascade-deleted together
//! with the session directory by [`crate::store::SessionStore::purge`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use forge_domain::error::{Error, Result};
use forge_domain::state::claim::{ClaimEdge, Evidence, KnowledgeClaim};

/// The full durable claim graph for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimGraph {
    pub claims: Vec<KnowledgeClaim>,
    pub evidence: Vec<Evidence>,
    pub edges: Vec<ClaimEdge>,
}

/// Holds the per-session claim graphs, mirrored to `sessions/<id>/claims.json`.
pub struct ClaimsStore {
    base_dir: PathBuf,
    graphs: RwLock<HashMap<String, ClaimGraph>>,
}

impl ClaimsStore {
    pub fn new(state_dir: &Path) -> Result<Self> {
        let base_dir = state_dir.join("sessions");
        std::fs::create_dir_all(&base_dir).map_err(Error::Io)?;

        let mut graphs = HashMap::new();
        if let Ok(entries) = std::fs::read_dir(&base_dir) {
            for entry in entries.flatten() {
                let session_id = match entry.file_name().into_string() {
                    Ok(s) => s,
                    Err(_) => continue,
                };
                let path = entry.path().join("claims.json");
                if !path.exists() {
                    continue;
                }
                if let Ok(raw) = std::fs::read_to_string(&path) {
                    if let Ok(graph) = serde_json::from_str::<ClaimGraph>(&raw) {
                        graphs.insert(session_id, graph);
                    }
                }
            }
        }

        Ok(Self {
            base_dir,
            graphs: RwLock::new(graphs),
        })
    }

    fn claims_path(&self, session_id: &str) -> PathBuf {
        self.base_dir.join(session_id).join("claims.json")
    }

    fn flush(&self, session_id: &str) -> Result<()> {
        let graph = self.graphs.read().get(session_id).cloned().unwrap_or_default();
        let dir = self.base_dir.join(session_id);
        std::fs::create_dir_all(&dir).map_err(Error::Io)?;
        let json = serde_json::to_string_pretty(&graph).map_err(Error::Json)?;
        std::fs::write(self.claims_path(session_id), json).map_err(Error::Io)?;
        Ok(())
    }

    /// Whole-graph snapshot for a session, e.g. for the `/graph` endpoint.
    pub fn graph(&self, session_id: &str) -> ClaimGraph {
        self.graphs.read().get(session_id).cloned().unwrap_or_default()
    }

    pub fn add_claim(&self, session_id: &str, claim: KnowledgeClaim) -> Result<()> {
        {
            let mut graphs = self.graphs.write();
            graphs.entry(session_id.to_owned()).or_default().claims.push(claim);
        }
        self.flush(session_id)
    }

    pub fn add_evidence(&self, session_id: &str, evidence: Evidence) -> Result<()> {
        {
            let mut graphs = self.graphs.write();
            graphs.entry(session_id.to_owned()).or_default().evidence.push(evidence);
        }
        self.flush(session_id)
    }

    pub fn add_edge(&self, session_id: &str, edge: ClaimEdge) -> Result<()> {
        {
            let mut graphs = self.graphs.write();
            graphs.entry(session_id.to_owned()).or_default().edges.push(edge);
        }
        self.flush(session_id)
    }

    /// Update a claim's status and scores in place (applying a user verdict).
    pub fn update_claim(
        &self,
        session_id: &str,
        claim_id: &str,
        f: impl FnOnce(&mut KnowledgeClaim),
    ) -> Result<bool> {
        let found = {
            let mut graphs = self.graphs.write();
            match graphs.get_mut(session_id) {
                Some(graph) => match graph.claims.iter_mut().find(|c| c.id == claim_id) {
                    Some(claim) => {
                        f(claim);
                        true
                    }
                    None => false,
                },
                None => false,
            }
        };
        if found {
            self.flush(session_id)?;
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_domain::state::claim::ClaimStatus;

    fn sample_claim(id: &str) -> KnowledgeClaim {
        KnowledgeClaim {
            id: id.into(),
            session_id: "s1".into(),
            claim_text: "text".into(),
            thesis_text: "thesis".into(),
            antithesis_text: "antithesis".into(),
            phase_created: "synthesize".into(),
            round_created: 0,
            status: ClaimStatus::Proposed,
            confidence: 0.5,
            falsifiability_condition: "cond".into(),
            qualification: None,
            scores: None,
            rejection_reason: None,
        }
    }

    #[test]
    fn add_and_read_back_claim_graph() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClaimsStore::new(dir.path()).unwrap();
        store.add_claim("s1", sample_claim("c1")).unwrap();
        assert_eq!(store.graph("s1").claims.len(), 1);
    }

    #[test]
    fn update_claim_mutates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClaimsStore::new(dir.path()).unwrap();
        store.add_claim("s1", sample_claim("c1")).unwrap();
        let found = store
            .update_claim("s1", "c1", |c| c.status = ClaimStatus::Validated)
            .unwrap();
        assert!(found);
        assert_eq!(store.graph("s1").claims[0].status, ClaimStatus::Validated);
    }

    #[test]
    fn restart_restores_claim_graphs_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = ClaimsStore::new(dir.path()).unwrap();
            store.add_claim("s1", sample_claim("c1")).unwrap();
        }
        let store2 = ClaimsStore::new(dir.path()).unwrap();
        assert_eq!(store2.graph("s1").claims.len(), 1);
    }
}
