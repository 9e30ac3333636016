//! Feature preparation: cleaning, indicators, forward-fill, train/test split

pub mod fill;
pub mod indicators;
pub mod preprocess;
pub mod split;

pub use fill::{forward_fill, forward_filled};
pub use indicators::{IndicatorFrame, IndicatorSource, DEFAULT_INDICATORS};
pub use preprocess::{DatasetError, FeaturePreprocessor};
pub use split::{DatasetSplitter, SplitDataset};
