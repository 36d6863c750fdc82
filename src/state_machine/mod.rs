mod job;
mod state;

pub use job::{Job, JobOutcome};
pub use state::{JobState, StateMachine, StatusUpdate, Transition};
