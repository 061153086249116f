//! Data models for the volunteer management backend.
//!
//! API-facing types serialize as camelCase; the persisted record in
//! `datastore` keeps the snake_case layout of the data file.

mod application;
mod datastore;
mod identity;
mod opportunity;

pub use application::*;
pub use datastore::*;
pub use identity::*;
pub use opportunity::*;
