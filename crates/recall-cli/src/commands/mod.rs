//! CLI command implementations

pub mod context;
pub mod doctor;
pub mod list;
pub mod rebuild;
pub mod schema;
pub mod search;
pub mod stats;
pub mod sync;
pub mod tools;
