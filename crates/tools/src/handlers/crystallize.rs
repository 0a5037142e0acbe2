//! CRYSTALLIZE-phase tool handler.

use forge_domain::state::forge_state::ForgeState;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ok, parse_args};

pub struct CrystallizeHandlers;

#[derive(Deserialize)]
struct GenerateKnowledgeDocumentArgs {
    framing: String,
    decomposition: String,
    exploration: String,
    claims: String,
    dialectic_process: String,
    knowledge_graph: String,
    negative_knowledge: String,
    gaps: String,
    convergence_locks: String,
    round_history: String,
}

impl CrystallizeHandlers {
    /// Assembles the ten named sections into the final markdown document.
    /// Storing the document does not itself advance the phase — that's the
    /// `generate_final_spec` pause tool's job.
    pub fn generate_knowledge_document(state: &mut ForgeState, args: Value) -> Value {
        let req: GenerateKnowledgeDocumentArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        let markdown = format!(
            "## [S1-2] Framing\n\n{}\n\n## Decomposition\n\n{}\n\n## [S3] Exploration\n\n{}\n\n\
             ## [S4-5] Claims\n\n{}\n\n## Dialectic process\n\n{}\n\n## [S6] Knowledge graph\n\n{}\n\n\
             ## [S7] Negative knowledge\n\n{}\n\n## [S8-9] Gaps\n\n{}\n\nConvergence locks:\n\n{}\n\n\
             ## [S10] Round history\n\n{}\n",
            req.framing,
            req.decomposition,
            req.exploration,
            req.claims,
            req.dialectic_process,
            req.knowledge_graph,
            req.negative_knowledge,
            req.gaps,
            req.convergence_locks,
            req.round_history,
        );
        let word_count = markdown.split_whitespace().count();
        state.knowledge_document_markdown = Some(markdown);
        ok(json!({"word_count": word_count}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_knowledge_document_stores_markdown() {
        let mut state = ForgeState::default();
        let args = json!({
            "framing": "f", "decomposition": "d", "exploration": "e",
            "claims": "c", "dialectic_process": "p", "knowledge_graph": "g",
            "negative_knowledge": "n", "gaps": "gp", "convergence_locks": "cl",
            "round_history": "r",
        });
        let result = CrystallizeHandlers::generate_knowledge_document(&mut state, args);
        assert_eq!(result["status"], "ok");
        assert!(state.knowledge_document_markdown.is_some());
        assert_eq!(state.current_phase, forge_domain::Phase::Decompose);
    }
}
