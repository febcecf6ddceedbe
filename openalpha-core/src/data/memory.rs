//! In-memory data provider for tests, benchmarks and synthetic runs.

use super::provider::{Calendar, DataError, DataProvider, Dataset};
use std::collections::HashMap;
use std::sync::Arc;

/// A provider whose datasets are supplied up front.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    calendar: Option<Arc<Calendar>>,
    datasets: HashMap<String, Arc<Dataset>>,
}

impl MemoryProvider {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar: Some(Arc::new(calendar)),
            datasets: HashMap::new(),
        }
    }

    /// A provider with no calendar; every `calendar()` call fails.
    pub fn without_calendar() -> Self {
        Self::default()
    }

    /// Add or replace a dataset, keyed by its name.
    pub fn insert(&mut self, dataset: Dataset) -> &mut Self {
        self.datasets
            .insert(dataset.name().to_string(), Arc::new(dataset));
        self
    }

    pub fn with(mut self, dataset: Dataset) -> Self {
        self.insert(dataset);
        self
    }
}

impl DataProvider for MemoryProvider {
    fn calendar(&self) -> Result<Arc<Calendar>, DataError> {
        self.calendar
            .clone()
            .ok_or_else(|| DataError::CalendarUnavailable("no calendar supplied".into()))
    }

    fn get(&self, name: &str) -> Result<Arc<Dataset>, DataError> {
        self.datasets
            .get(name)
            .cloned()
            .ok_or_else(|| DataError::NotFound { name: name.into() })
    }

    fn has(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }
}
