//! Storage and distributed filesystem health

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::heartbeat::minutes_since;
use super::HealthStatus;
use crate::headroom::sanitize;
use crate::models::{ClientConnectivity, HdfsStatus, Mount};

/// Minutes without a successful client connection before a pool turns red
pub const CONNECTIVITY_STALE_MINUTES: f64 = 15.0;

/// Thresholds for the filesystem roll-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageThresholds {
    pub live_ratio_red: f64,
    pub live_ratio_yellow: f64,
    pub under_replicated_red: f64,
    pub under_replicated_yellow: f64,
    pub ttf_hours_red: f64,
    pub ttf_hours_yellow: f64,
}

impl Default for StorageThresholds {
    fn default() -> Self {
        Self {
            live_ratio_red: 0.90,
            live_ratio_yellow: 0.95,
            under_replicated_red: 5.0,
            under_replicated_yellow: 1.0,
            ttf_hours_red: 6.0,
            ttf_hours_yellow: 24.0,
        }
    }
}

impl StorageThresholds {
    /// Evaluate the filesystem roll-up
    ///
    /// Rules run in priority order: safe mode, datanode liveness, replication,
    /// time-to-full. The first red match wins; yellow rules are only checked
    /// once no red rule matched.
    pub fn evaluate(&self, hdfs: &HdfsStatus) -> HealthStatus {
        if hdfs.safe_mode {
            return HealthStatus::Red;
        }

        let live_ratio = if hdfs.datanodes_expected > 0 {
            f64::from(hdfs.datanodes_live) / f64::from(hdfs.datanodes_expected)
        } else {
            1.0
        };
        let under_replicated = sanitize(hdfs.under_replicated_blocks_pct);
        let ttf_hours = hdfs.ttf_hours.filter(|h| !h.is_nan());

        if live_ratio < self.live_ratio_red
            || under_replicated > self.under_replicated_red
            || ttf_hours.is_some_and(|h| h < self.ttf_hours_red)
        {
            return HealthStatus::Red;
        }

        if live_ratio < self.live_ratio_yellow
            || under_replicated > self.under_replicated_yellow
            || ttf_hours.is_some_and(|h| h < self.ttf_hours_yellow)
        {
            return HealthStatus::Yellow;
        }

        HealthStatus::Green
    }
}

/// Filesystem status under the default thresholds
///
/// A missing roll-up is yellow: the state is unknown, not known-bad.
pub fn storage_overall_status(hdfs: Option<&HdfsStatus>) -> HealthStatus {
    match hdfs {
        Some(hdfs) => StorageThresholds::default().evaluate(hdfs),
        None => HealthStatus::Yellow,
    }
}

/// Status of one client pool's connectivity over the last 15 minutes
///
/// Success above 95% is green, 90% and up is yellow. A pool with no success
/// within [`CONNECTIVITY_STALE_MINUTES`] is red regardless of its rate.
pub fn connectivity_status(pool: &ClientConnectivity, now: DateTime<Utc>) -> HealthStatus {
    let stale = match pool.last_success {
        Some(last) => minutes_since(last, now) > CONNECTIVITY_STALE_MINUTES,
        None => true,
    };
    if stale {
        return HealthStatus::Red;
    }

    let success = sanitize(pool.success_pct_15m);
    if success > 95.0 {
        HealthStatus::Green
    } else if success >= 90.0 {
        HealthStatus::Yellow
    } else {
        HealthStatus::Red
    }
}

pub fn mount_status(mount: &Mount) -> HealthStatus {
    if mount.status.eq_ignore_ascii_case("mounted") {
        HealthStatus::Green
    } else {
        HealthStatus::Red
    }
}
