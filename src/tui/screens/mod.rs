pub mod search_screen;

pub use search_screen::{SearchScreen, SearchView};
