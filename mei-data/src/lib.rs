mod loader;

pub use loader::{BracketLoader, BracketLoaderError, BracketRecord};
