//! Heartbeat liveness
//!
//! Age of the last heartbeat against watch and critical thresholds. The
//! current time is always passed in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HealthStatus;

/// Heartbeat age thresholds in minutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatThresholds {
    pub warn_minutes: f64,
    pub crit_minutes: f64,
}

impl Default for HeartbeatThresholds {
    fn default() -> Self {
        Self {
            warn_minutes: 10.0,
            crit_minutes: 15.0,
        }
    }
}

/// Heartbeat age and its verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatStatus {
    /// Minutes since the last heartbeat; `None` when none was ever recorded
    pub minutes: Option<f64>,
    pub status: HealthStatus,
}

/// Classify the age of `last_heartbeat` relative to `now`
///
/// A missing heartbeat is treated as infinitely old and is always red.
/// Timestamps in the future count as zero minutes old.
pub fn heartbeat_status(
    last_heartbeat: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    thresholds: &HeartbeatThresholds,
) -> HeartbeatStatus {
    let Some(last) = last_heartbeat else {
        return HeartbeatStatus {
            minutes: None,
            status: HealthStatus::Red,
        };
    };

    let minutes = minutes_since(last, now);
    let status = if minutes > thresholds.crit_minutes {
        HealthStatus::Red
    } else if minutes > thresholds.warn_minutes {
        HealthStatus::Yellow
    } else {
        HealthStatus::Green
    };

    HeartbeatStatus {
        minutes: Some(minutes),
        status,
    }
}

pub(crate) fn minutes_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - then).num_milliseconds().max(0);
    millis as f64 / 60_000.0
}
