pub mod config;
pub mod error;
pub mod request;
pub mod wait;

pub use config::{Config, ConfigLoader, Timings};
pub use error::{Error, Result};
pub use request::{CopyFlags, SearchKind, StatusFilter, StatusFilters, TransferRequest};
pub use wait::WaitPolicy;
