pub mod index_manager;

pub use index_manager::IndexManager;
