pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::CalculationError;
pub use db::repository::{MeiRepository, RepositoryError};
pub use models::*;
