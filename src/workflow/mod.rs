pub mod submit_flow;
pub mod task_ctx;

pub use submit_flow::{SubmissionFlow, SubmitOutcome};
pub use task_ctx::TaskCtx;
