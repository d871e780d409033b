// Maintenance task orchestration

pub mod models;
pub mod runner;


pub use models::{unsaved_notice, RunSummary, Task, TaskOutcome, TaskSelection};
pub use runner::TaskRunner;
