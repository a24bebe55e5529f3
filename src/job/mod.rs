mod handle;
mod table;

pub use handle::{GroupState, PipelineHandle};
pub use table::{Job, JobState, JobTable};
