//! Core runtime — ties sessions, prompt assembly, LLM streaming, tool
//! dispatch, and persistence into one deterministic loop.
//!
//! Entry point: [`run_turn`] takes a session + user message and returns a
//! stream of [`TurnEvent`]s suitable for SSE or non-streaming aggregation.

pub mod cancel;
pub mod compact;
pub mod digest;
pub mod language;
pub mod prompt;
pub mod review;
pub mod session_lock;
pub mod translate;
pub mod turn;

pub use turn::{run_turn, TurnEvent, TurnInput};
