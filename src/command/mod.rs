mod checkpoints;
mod interactive;
mod task;

pub use checkpoints::run_checkpoints;
pub use interactive::run_interactive;
pub use task::run_task;
