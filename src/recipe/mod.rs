pub mod loader;

pub use loader::{find_duplicate_source_assignments, QueryStore, RecipeStore};
