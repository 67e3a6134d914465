// Launch engine: artifact caching, viewer supervision and run orchestration.

pub mod cache;
pub mod orchestrator;
pub mod stats;
pub mod supervisor;
