pub mod postgres;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

pub use postgres::{Database, PgStore};
pub use store::{AccountStore, HistoryStore};
