mod context;
mod queue;
mod student_created;

pub use context::JobWorkerContext;
pub use queue::{JobsTaskQueue, QueueError, TaskQueue, enqueue_job};
pub use student_created::{
    StudentCreatedJobPayload, enqueue_student_created_job, process_student_created_job,
};
