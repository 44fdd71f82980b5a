//! Multi-signal tenant health
//!
//! Five pipeline signals are each compared against a watch and an action
//! threshold. Any action breach makes the tenant red, otherwise any watch
//! breach makes it yellow. Comparisons are strict: a value sitting exactly on
//! a threshold stays in the lower bucket.

use serde::{Deserialize, Serialize};

use super::HealthStatus;
use crate::headroom::sanitize;
use crate::models::{Tenant, TenantMetrics};

/// Minutes of consumer lag at the current drain rate
///
/// The drain rate is floored at one message per second so a stalled consumer
/// still yields a finite, conservative figure.
pub fn lag_minutes(lag_messages: u64, drain_per_sec: f64) -> f64 {
    let drain = sanitize(drain_per_sec).max(1.0);
    (lag_messages as f64 / drain) / 60.0
}

/// Ratio of inject rate to drain rate, drain floored at one per second
pub fn rate_ratio(inject_per_sec: f64, drain_per_sec: f64) -> f64 {
    let drain = sanitize(drain_per_sec).max(1.0);
    sanitize(inject_per_sec).max(0.0) / drain
}

/// Identifies one of the tenant health signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    KafkaLag,
    PnodeCpu,
    KafkaDisk,
    InjectDrain,
    ComputeRatio,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::KafkaLag => write!(f, "Kafka lag"),
            Signal::PnodeCpu => write!(f, "pnode CPU"),
            Signal::KafkaDisk => write!(f, "Kafka disk"),
            Signal::InjectDrain => write!(f, "inject/drain"),
            Signal::ComputeRatio => write!(f, "Spark inject/drain"),
        }
    }
}

/// Signal values derived from one tenant snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    pub lag_min: f64,
    pub cpu_fraction: f64,
    pub disk_fraction: f64,
    pub inject_drain_ratio: f64,
    pub compute_ratio: f64,
}

impl Signals {
    pub fn from_metrics(metrics: &TenantMetrics) -> Self {
        Self {
            lag_min: lag_minutes(metrics.kafka_lag_messages, metrics.drain_msgs_per_sec),
            cpu_fraction: sanitize(metrics.pnode_cpu_pct),
            disk_fraction: sanitize(metrics.kafka_disk_used_pct),
            inject_drain_ratio: rate_ratio(
                metrics.inject_msgs_per_sec,
                metrics.drain_msgs_per_sec,
            ),
            compute_ratio: rate_ratio(metrics.spark_inject_per_sec, metrics.spark_drain_per_sec),
        }
    }

    fn values(&self) -> [(Signal, f64); 5] {
        [
            (Signal::KafkaLag, self.lag_min),
            (Signal::PnodeCpu, self.cpu_fraction),
            (Signal::KafkaDisk, self.disk_fraction),
            (Signal::InjectDrain, self.inject_drain_ratio),
            (Signal::ComputeRatio, self.compute_ratio),
        ]
    }
}

/// Watch and action levels for one signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub watch: f64,
    pub action: f64,
}

impl Threshold {
    pub const fn new(watch: f64, action: f64) -> Self {
        Self { watch, action }
    }

    /// Classify a value; action is checked before watch
    pub fn classify(&self, value: f64) -> HealthStatus {
        if value > self.action {
            HealthStatus::Red
        } else if value > self.watch {
            HealthStatus::Yellow
        } else {
            HealthStatus::Green
        }
    }
}

/// Thresholds for every tenant signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub kafka_lag_minutes: Threshold,
    pub pnode_cpu: Threshold,
    pub kafka_disk: Threshold,
    pub inject_drain: Threshold,
    pub compute_ratio: Threshold,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            kafka_lag_minutes: Threshold::new(2.0, 5.0),
            pnode_cpu: Threshold::new(0.75, 0.85),
            kafka_disk: Threshold::new(0.70, 0.80),
            inject_drain: Threshold::new(1.05, 1.15),
            compute_ratio: Threshold::new(1.05, 1.15),
        }
    }
}

impl SignalThresholds {
    pub fn threshold(&self, signal: Signal) -> Threshold {
        match signal {
            Signal::KafkaLag => self.kafka_lag_minutes,
            Signal::PnodeCpu => self.pnode_cpu,
            Signal::KafkaDisk => self.kafka_disk,
            Signal::InjectDrain => self.inject_drain,
            Signal::ComputeRatio => self.compute_ratio,
        }
    }

    /// Worst status over all signals
    pub fn evaluate(&self, signals: &Signals) -> HealthStatus {
        let values = signals.values();
        if values
            .iter()
            .any(|(signal, value)| *value > self.threshold(*signal).action)
        {
            return HealthStatus::Red;
        }
        if values
            .iter()
            .any(|(signal, value)| *value > self.threshold(*signal).watch)
        {
            return HealthStatus::Yellow;
        }
        HealthStatus::Green
    }
}

/// Tenant status under the default thresholds
pub fn status_from_signals(signals: &Signals) -> HealthStatus {
    SignalThresholds::default().evaluate(signals)
}

/// A signal that crossed its watch or action level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalBreach {
    pub signal: Signal,
    pub value: f64,
    pub level: HealthStatus,
}

/// Signals above their watch level, worst first
pub fn breached_signals(signals: &Signals, thresholds: &SignalThresholds) -> Vec<SignalBreach> {
    let mut breaches: Vec<SignalBreach> = signals
        .values()
        .into_iter()
        .filter_map(|(signal, value)| {
            let level = thresholds.threshold(signal).classify(value);
            (level != HealthStatus::Green).then_some(SignalBreach {
                signal,
                value,
                level,
            })
        })
        .collect();
    breaches.sort_by(|a, b| b.level.cmp(&a.level));
    breaches
}

/// One-sentence explanation of a tenant's status for operators
pub fn explain_status(tenant: &Tenant, signals: &Signals, thresholds: &SignalThresholds) -> String {
    let status = thresholds.evaluate(signals);
    let readings = [
        format!("Kafka lag {:.1}m", signals.lag_min),
        format!("inject/drain {:.2}x", signals.inject_drain_ratio),
        format!("pnode CPU {}", percent(signals.cpu_fraction)),
        format!("Kafka disk {}", percent(signals.disk_fraction)),
        format!("Spark inject/drain {:.2}x", signals.compute_ratio),
    ]
    .join(", ");

    if status == HealthStatus::Green {
        return format!(
            "{} is {}: no signal above its watch level ({}).",
            tenant.name,
            status.label(),
            readings
        );
    }

    let breaches = breached_signals(signals, thresholds)
        .iter()
        .map(|b| format!("{} ({})", b.signal, b.level.label().to_lowercase()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{} is {} because of {} ({}). Recommend scaling the bottleneck pool first \
         (Kafka/pnode/Presto/Spark) or adding 1 SU if onboarding is expected.",
        tenant.name,
        status.label(),
        breaches,
        readings
    )
}

fn percent(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0).round())
}
