//! Per-call MongoDB record helpers.
//!
//! Each operation in [`store`] opens its own connection, validates the target
//! names, does one thing and closes the connection again.

pub mod error;
pub mod store;

pub use error::{ErrorKind, RecordStoreError, Result};
pub use store::{
    exists_and_unique, find, insert, insert_record, update, Existence, FindResult, UpdateCounts,
};
