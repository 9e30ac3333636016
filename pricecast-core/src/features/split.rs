//! Train/test partitioning by date.

use chrono::{Days, NaiveDate};

use super::preprocess::DatasetError;
use crate::domain::Dataset;

/// Training and testing windows cut from one dataset.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    /// Rows in `[min_date, split_date)`.
    pub train: Dataset,
    /// Rows in `[split_date, max_date]`.
    pub test: Dataset,
    pub split_date: NaiveDate,
}

/// Reserves the trailing `test_window_days` calendar days for testing.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSplitter {
    test_window_days: u32,
}

impl DatasetSplitter {
    pub fn new(test_window_days: u32) -> Self {
        Self { test_window_days }
    }

    pub fn test_window_days(&self) -> u32 {
        self.test_window_days
    }

    pub fn split(&self, dataset: &Dataset) -> Result<SplitDataset, DatasetError> {
        let label = dataset.tickers().join(",");
        let (Some(min_date), Some(max_date)) = (dataset.min_date(), dataset.max_date()) else {
            return Err(DatasetError::insufficient(&label, "dataset is empty"));
        };

        let split_date = max_date.checked_sub_days(Days::new(u64::from(self.test_window_days)));
        let Some(split_date) = split_date.filter(|d| *d > min_date) else {
            return Err(DatasetError::insufficient(
                &label,
                format!(
                    "{} to {} cannot hold a {}-day test window, reduce the window or extend the lookback",
                    min_date, max_date, self.test_window_days
                ),
            ));
        };

        let train = dataset.slice_dates(min_date..split_date);
        let test = dataset.slice_dates(split_date..=max_date);
        if train.is_empty() || test.is_empty() {
            return Err(DatasetError::insufficient(
                &label,
                "empty training or testing dataset produced",
            ));
        }

        Ok(SplitDataset {
            train,
            test,
            split_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureRow;
    use chrono::Duration;

    fn daily(days: usize) -> Dataset {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let rows = (0..days)
            .map(|i| FeatureRow {
                ticker: "SPY".into(),
                date: start + Duration::days(i as i64),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                adj_close: 1.0,
                volume: 1.0,
                indicators: vec![],
            })
            .collect();
        Dataset::new(vec![], rows)
    }

    #[test]
    fn window_longer_than_history_fails() {
        let err = DatasetSplitter::new(400).split(&daily(365)).unwrap_err();
        assert!(matches!(err, DatasetError::InsufficientData { .. }));
    }

    #[test]
    fn window_beyond_calendar_range_is_insufficient() {
        let err = DatasetSplitter::new(u32::MAX).split(&daily(10)).unwrap_err();
        assert!(matches!(err, DatasetError::InsufficientData { .. }));
    }

    #[test]
    fn window_equal_to_span_fails() {
        // 365 rows span 364 days.
        assert!(DatasetSplitter::new(364).split(&daily(365)).is_err());
        assert!(DatasetSplitter::new(363).split(&daily(365)).is_ok());
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let ds = daily(100);
        let split = DatasetSplitter::new(30).split(&ds).unwrap();
        assert_eq!(split.train.len() + split.test.len(), 100);
        assert_eq!(split.test.len(), 31);
        assert!(split.train.max_date().unwrap() < split.split_date);
        assert_eq!(split.test.min_date(), Some(split.split_date));
        assert_eq!(split.test.max_date(), ds.max_date());
    }

    #[test]
    fn empty_dataset_fails() {
        assert!(DatasetSplitter::new(10).split(&Dataset::default()).is_err());
    }

    #[test]
    fn sparse_rows_still_split() {
        // Rows only on the first and last day; the window lands between them.
        let full = daily(50);
        let rows = vec![full.rows()[0].clone(), full.rows()[49].clone()];
        let sparse = Dataset::new(vec![], rows);
        let split = DatasetSplitter::new(10).split(&sparse).unwrap();
        assert_eq!(split.train.len(), 1);
        assert_eq!(split.test.len(), 1);
    }
}
