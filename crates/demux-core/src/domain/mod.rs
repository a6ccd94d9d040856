//! Domain model (paths, requests, outcomes, errors, ...).
//!
//! transport にも registry にも依存しない型だけを置く。

pub mod errors;
pub mod ids;
pub mod outcome;
pub mod path;
pub mod request;
pub mod state;

pub use self::errors::{ActionError, BatchError, ItemError};
pub use self::ids::BatchId;
pub use self::outcome::ResultItem;
pub use self::path::{ActionPath, DEFAULT_SEPARATOR, PathError};
pub use self::request::{ActionInput, BatchRequest, RequestItem};
pub use self::state::{ItemState, RejectStage};
