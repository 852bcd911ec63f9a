pub mod ai;
pub mod search;
pub mod store;
