//! Price-history ingestion

pub mod align;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use align::align_length;
pub use provider::{DataError, DataSource, FetchResult, HistoryFetcher};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
