//! Session storage for forge-gateway.
//!
//! Each session is a JSON-file-backed aggregate: `sessions/<id>/session.json`
//! holds the `Session` row plus the last `ForgeState` snapshot,
//! `sessions/<id>/claims.json` holds the durable knowledge-claim rows. Both
//! files are mirrored from an in-memory `RwLock<HashMap<..>>`, the same
//! shape this crate's session store has always used.

pub mod claims;
pub mod session;
pub mod store;

pub use claims::ClaimsStore;
pub use session::{Session, SessionRow};
pub use store::SessionStore;
