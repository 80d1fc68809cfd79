pub mod config;
pub mod datasets;
pub mod error;
pub mod types;

pub use config::Config;
pub use datasets::{Dataset, DatasetRegistry};
pub use error::{BattleLensError, Result};
pub use types::*;
