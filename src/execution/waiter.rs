//! Data availability waiter - blocks until every partition is fully written

use crate::{
    core::WaitSpec,
    execution::{DataTimeoutError, Reporter, RunEvent},
    services::{ObjectEntry, StorageListingService, TableMetadataService},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Polling parameters for the waiter
#[derive(Debug, Clone, PartialEq)]
pub struct WaitOptions {
    /// Give up once this much time has passed since waiting started
    pub deadline: Duration,

    /// Sleep between polls of an unavailable partition
    pub poll_interval: Duration,

    /// Objects modified more recently than this are still being written
    pub staleness_window: Duration,

    /// Refresh table metadata once before checking any partition
    pub refresh_metadata: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(12 * 3600),
            poll_interval: Duration::from_secs(60),
            staleness_window: Duration::from_secs(60),
            refresh_metadata: false,
        }
    }
}

impl WaitOptions {
    /// Default options with a deadline given in (fractional) hours
    pub fn with_max_wait_hours(hours: f64) -> Result<Self, String> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(format!("max wait must be a non-negative number of hours, got {}", hours));
        }
        let deadline = Duration::try_from_secs_f64(hours * 3600.0)
            .map_err(|e| format!("max wait of {} hours is out of range: {}", hours, e))?;
        Ok(Self {
            deadline,
            ..Self::default()
        })
    }
}

/// Whether a partition listing looks completely written at `now`.
///
/// An empty listing is not available yet. If any object was touched within
/// `window` of `now` the producer is assumed to still be writing.
pub fn partition_available(objects: &[ObjectEntry], now: DateTime<Utc>, window: Duration) -> bool {
    if objects.is_empty() {
        return false;
    }
    objects.iter().all(|o| match (now - o.last_modified).to_std() {
        Ok(age) => age >= window,
        // Modified "in the future": certainly fresh
        Err(_) => false,
    })
}

/// Location of a partition below its table location
pub fn partition_location(table_location: &str, partition: &str) -> String {
    format!("{}/{}", table_location.trim_end_matches('/'), partition)
}

/// Listing prefix for a location, always ending with `/`
pub fn listing_prefix(location: &str) -> String {
    if location.ends_with('/') {
        location.to_string()
    } else {
        format!("{}/", location)
    }
}

/// Blocks until all configured partitions are available or the deadline passes
pub struct DataAvailabilityWaiter {
    storage: Arc<dyn StorageListingService>,
    metadata: Arc<dyn TableMetadataService>,
    options: WaitOptions,
    reporter: Reporter,
}

impl DataAvailabilityWaiter {
    pub fn new(
        storage: Arc<dyn StorageListingService>,
        metadata: Arc<dyn TableMetadataService>,
        options: WaitOptions,
        reporter: Reporter,
    ) -> Self {
        Self {
            storage,
            metadata,
            options,
            reporter,
        }
    }

    /// Wait for every partition of every listed table, in order
    pub async fn await_data(&self, wait_specs: &[WaitSpec]) -> Result<(), DataTimeoutError> {
        let start = Instant::now();

        if self.options.refresh_metadata {
            let success = match self.metadata.refresh_metadata().await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Metadata refresh failed, checking data anyway: {}", e);
                    false
                }
            };
            self.reporter.emit(RunEvent::MetadataRefreshed { success });
        }

        for spec in wait_specs {
            let table_location = self.resolve_table(&spec.table_name, start).await?;
            for partition in &spec.partitions {
                let location = partition_location(&table_location, partition);
                self.await_partition(&location, start).await?;
            }
        }

        Ok(())
    }

    async fn resolve_table(&self, table: &str, start: Instant) -> Result<String, DataTimeoutError> {
        loop {
            match self.metadata.location(table).await {
                Ok(location) => return Ok(location),
                Err(e) => warn!(table = %table, "Failed to look up table location: {}", e),
            }
            self.check_deadline(table, start)?;
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    async fn await_partition(&self, location: &str, start: Instant) -> Result<(), DataTimeoutError> {
        let prefix = listing_prefix(location);
        loop {
            let available = match self.storage.list(&prefix).await {
                Ok(objects) => {
                    partition_available(&objects, Utc::now(), self.options.staleness_window)
                }
                Err(e) => {
                    warn!(location = %location, "Failed to list partition: {}", e);
                    false
                }
            };

            if available {
                info!("{} is available", location);
                self.reporter.emit(RunEvent::PartitionAvailable {
                    location: location.to_string(),
                });
                return Ok(());
            }

            self.check_deadline(location, start)?;

            info!("Waiting for {} to be available...", location);
            self.reporter.emit(RunEvent::PartitionWaiting {
                location: location.to_string(),
                elapsed: start.elapsed(),
            });
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    fn check_deadline(&self, location: &str, start: Instant) -> Result<(), DataTimeoutError> {
        let waited = start.elapsed();
        if waited > self.options.deadline {
            error!(
                "Waited {:?} for {}. Data is still not available.",
                waited, location
            );
            return Err(DataTimeoutError {
                location: location.to_string(),
                waited,
            });
        }
        Ok(())
    }
}
