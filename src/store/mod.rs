//! Persistence adapters implementing [`crate::auth::AuthStore`]: Postgres
//! (production) and in-memory (local dev and tests).

pub mod mem;
pub mod pg;

pub use mem::MemStore;
pub use pg::PgStore;
