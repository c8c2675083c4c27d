pub mod apply;
pub mod error;
pub mod report;

pub use apply::{apply, destroy, resolve_block};
pub use error::EngineError;
pub use report::{ApplyReport, ApplyRequest, Change, DestroyReport};
