pub mod backup;
pub mod list;

pub use backup::run_backup;
pub use list::run_list;
