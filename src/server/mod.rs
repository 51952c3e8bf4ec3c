pub mod context;
pub mod file_api;
pub mod file_index;
pub mod http;

pub use context::{AppContext, AppError};
pub use file_api::{read_file, resolve_safe_dir, resolve_safe_path, FileApiError, FileContent};
pub use file_index::{list_project, DirectoryEntry};
pub use http::{build_router, run_server};
