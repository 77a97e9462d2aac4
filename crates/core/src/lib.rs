pub mod config;
pub mod error;
pub mod range;

pub use config::{BisectConfig, Config, TargetConfig};
pub use error::*;
pub use range::{ProbeOutcome, RowRange};
