//! Tool schemas, handlers, and dispatch for the dialectical reasoning
//! pipeline, plus the research sub-agent tool calls delegate to.

pub mod dispatch;
pub mod handlers;
pub mod research_agent;
pub mod schemas;

pub use dispatch::dispatch;
pub use research_agent::{ResearchPurpose, ResearchResult, ResearchSubAgent};
pub use schemas::all_tools_for_phase;
