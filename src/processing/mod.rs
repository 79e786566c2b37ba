//! Job-backed operation orchestration
//!
//! Each tracked operation creates a job, runs the engine on the blocking pool
//! under the configured timeout, and records exactly one terminal outcome.

mod orchestrator;
mod status;

pub use orchestrator::{execute, run_job, EngineOutput, JobOutcome};
pub use status::{job_status, JobView};
