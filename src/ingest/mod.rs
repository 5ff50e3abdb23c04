pub mod merge;
pub mod orchestrator;
