pub mod client;
pub mod traits;

pub use client::GitlabClient;
pub use traits::{ByteStream, ExportStatus, GitlabApi};
