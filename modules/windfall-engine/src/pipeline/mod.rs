//! Candidate filtering and entry construction.

pub mod entry;
pub mod filter;


pub use entry::build_plan;
pub use filter::{DropReason, FilterPipeline};
