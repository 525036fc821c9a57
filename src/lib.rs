pub mod config;
pub mod error;
pub mod fetcher;
pub mod flattener;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod summarizer;

pub use config::{Config, DataLayout};
pub use error::{Error, Result};
pub use model::{AdvisoryKind, Ecosystem, FlatRow, SummaryRow};
pub use summarizer::YearRange;
