pub mod common;
pub mod diff;
pub mod query;
pub mod sync;
