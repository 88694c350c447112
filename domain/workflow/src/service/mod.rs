mod task_operate;
mod worker_select;

#[rustfmt::skip]
pub use {
    task_operate::TaskOperateClient,
    worker_select::{WorkerInfo, WorkerSelector},
};
