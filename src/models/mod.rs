pub mod path_index;
pub mod scan_result;
pub mod snapshot;

pub use path_index::{FileIndex, FolderIndex, PathIndex};
pub use scan_result::{FoundEntry, ScanReport, ScanResult, TaskFailure};
pub use snapshot::{IndexSnapshot, IndexState};
