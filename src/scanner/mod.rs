pub mod coordinator;
pub mod path_classifier;
pub mod tree_scanner;
pub mod worker_pool;

pub use coordinator::{ScanCoordinator, ScanTarget};
pub use path_classifier::PathClassifier;
pub use tree_scanner::TreeScanner;
pub use worker_pool::{TaskOutcome, WorkerPool};
