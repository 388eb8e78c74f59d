pub mod loader;
pub mod store;

pub use loader::{load_feature_table, load_movies};
pub use store::{CatalogPaths, CatalogStore};
