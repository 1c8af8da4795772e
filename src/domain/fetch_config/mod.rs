pub mod model;
pub mod repository;

pub use model::{FetchConfiguration, NewFetchConfiguration};
pub use repository::{ConfigurationRepository, PgConfigurationRepository};
