//! CLI command handlers, one file per command.

mod completions;
mod configure;
mod probe;
mod save;
mod status;

pub use completions::run_completions;
pub use configure::run_configure;
pub use probe::run_probe;
pub use save::{run_save, SaveArgs};
pub use status::run_status;
