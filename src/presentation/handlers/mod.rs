mod health;
mod tasks;

pub use health::health_handler;
pub use tasks::{
    cancel_all_handler, clear_results_handler, delete_task_handler, get_task_handler,
    list_tasks_handler, submit_task_handler, SubmitTaskRequest, TaskResponse,
};
