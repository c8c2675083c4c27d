pub mod error;
pub mod sql;
pub mod types;


pub use error::DomainError;
pub use sql::SqlEdition;
pub use types::{
    Address, AttrValue, ConfigDocument, RefExpr, ResourceBlock, ResourceName, ResourceType,
};
