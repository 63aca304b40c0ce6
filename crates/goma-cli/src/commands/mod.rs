mod add;
mod common;
mod delete;
mod list;
mod status;
mod sync;
mod update;

pub use add::{run_add, AddArgs};
pub use delete::run_delete;
pub use list::run_list;
pub use status::run_status;
pub use sync::run_sync;
pub use update::{run_update, UpdateArgs};
