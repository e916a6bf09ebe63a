//! Configuration persistence for the vigil monitoring agent
//!
//! A configuration file is a JSON document holding the monitored items, the
//! triggers, and the state both accumulate across runs. Loading before a run
//! and saving after it are the transactional boundary around the processing
//! core; nothing in between touches the disk.

mod document;
mod error;

pub use document::ConfigDocument;
pub use error::{ConfigError, ConfigResult};
