//! Domain types for PriceCast

pub mod bar;
pub mod feature;
pub mod trajectory;

pub use bar::{CleanBar, PriceBar};
pub use feature::{Dataset, FeatureRow};
pub use trajectory::{AccountRecord, ActionRecord, RawAction, Trajectory};
