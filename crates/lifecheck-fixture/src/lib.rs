pub mod builder;
pub mod error;
pub mod params;
pub mod sql;

pub use builder::{resource, ResourceBlockBuilder};
pub use error::FixtureError;
pub use params::FixtureParams;
