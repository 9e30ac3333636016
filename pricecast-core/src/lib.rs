//! PriceCast Core: price history, feature datasets, and signal translation.
//!
//! This crate holds the data side of the prediction service:
//! - Domain types (bars, feature rows, datasets, actions, equity records)
//! - History fetchers (Yahoo Finance chart API, deterministic synthetic walk)
//! - Column alignment for ragged provider responses
//! - Feature preprocessing around an external indicator source
//! - Date-based train/test splitting
//! - Translation of policy actions into bounded price predictions

pub mod data;
pub mod domain;
pub mod features;
pub mod signal;
