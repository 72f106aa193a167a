//! Container access, copy and export around the `h5scope-core` analysis
//! engine.

pub mod config;
pub mod error;
pub mod export;
pub mod formats;
pub mod generate;
pub mod store;

pub use config::AnalysisConfig;
pub use error::{Result, StoreError};
pub use formats::{open_container, JsonContainer, WavContainer};
pub use store::{copy_items, flatten, is_plottable, Container, Dataset, DatasetInfo, Node, NodeKind};
