//! Metrics collection and registry.

use crate::session::{SessionStats, ScanSession};
use crate::signals::LiveSignals;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of scanner state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether a session is currently scanning.
    pub is_scanning: bool,
    /// Live signals out of three.
    pub live_signals: usize,
    pub keyword_live: bool,
    pub roll_no_live: bool,
    pub name_live: bool,
    pub sessions_started: u64,
    pub ticks_started: u64,
    pub ticks_dropped: u64,
    pub sample_failures: u64,
    pub results_discarded: u64,
    pub scans_accepted: u64,
    pub attendance_out: u64,
    pub attendance_in: u64,
    pub attendance_failures: u64,
}

/// Prometheus metrics registry for the scanner.
pub struct MetricsRegistry {
    registry: Registry,

    // Session gauges
    scanning: IntGauge,
    live_signals: IntGauge,
    keyword_live: IntGauge,
    roll_no_live: IntGauge,
    name_live: IntGauge,

    // Sampling counters
    sessions_total: IntCounter,
    ticks_total: IntCounter,
    ticks_dropped_total: IntCounter,
    sample_failures_total: IntCounter,
    results_discarded_total: IntCounter,

    // Decision and attendance counters
    scans_accepted_total: IntCounter,
    attendance_out_total: IntCounter,
    attendance_in_total: IntCounter,
    attendance_failures_total: IntCounter,
}

/// Advances a counter to an absolute total.
fn catch_up(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all scanner metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let scanning = IntGauge::new(
            "campus_gate_scanning",
            "Whether a scan session is active (1=scanning, 0=not)",
        )?;
        let live_signals = IntGauge::new(
            "campus_gate_live_signals",
            "Number of signals currently live (0-3)",
        )?;
        let keyword_live = IntGauge::new("campus_gate_keyword_live", "Keyword signal live")?;
        let roll_no_live = IntGauge::new("campus_gate_roll_no_live", "Roll number signal live")?;
        let name_live = IntGauge::new("campus_gate_name_live", "Name signal live")?;

        let sessions_total = IntCounter::new(
            "campus_gate_sessions_total",
            "Scan sessions started",
        )?;
        let ticks_total = IntCounter::new(
            "campus_gate_ticks_total",
            "Sampling ticks that took a frame",
        )?;
        let ticks_dropped_total = IntCounter::new(
            "campus_gate_ticks_dropped_total",
            "Ticks dropped while a sample was in flight",
        )?;
        let sample_failures_total = IntCounter::new(
            "campus_gate_sample_failures_total",
            "Samples that produced no text",
        )?;
        let results_discarded_total = IntCounter::new(
            "campus_gate_results_discarded_total",
            "Late results discarded after stop or reset",
        )?;

        let scans_accepted_total = IntCounter::new(
            "campus_gate_scans_accepted_total",
            "Scans accepted by the decision rule",
        )?;
        let attendance_out_total = IntCounter::new(
            "campus_gate_attendance_out_total",
            "Students recorded as leaving",
        )?;
        let attendance_in_total = IntCounter::new(
            "campus_gate_attendance_in_total",
            "Students recorded as returning",
        )?;
        let attendance_failures_total = IntCounter::new(
            "campus_gate_attendance_failures_total",
            "Accepted scans the attendance book rejected",
        )?;

        registry.register(Box::new(scanning.clone()))?;
        registry.register(Box::new(live_signals.clone()))?;
        registry.register(Box::new(keyword_live.clone()))?;
        registry.register(Box::new(roll_no_live.clone()))?;
        registry.register(Box::new(name_live.clone()))?;
        registry.register(Box::new(sessions_total.clone()))?;
        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(ticks_dropped_total.clone()))?;
        registry.register(Box::new(sample_failures_total.clone()))?;
        registry.register(Box::new(results_discarded_total.clone()))?;
        registry.register(Box::new(scans_accepted_total.clone()))?;
        registry.register(Box::new(attendance_out_total.clone()))?;
        registry.register(Box::new(attendance_in_total.clone()))?;
        registry.register(Box::new(attendance_failures_total.clone()))?;

        Ok(Self {
            registry,
            scanning,
            live_signals,
            keyword_live,
            roll_no_live,
            name_live,
            sessions_total,
            ticks_total,
            ticks_dropped_total,
            sample_failures_total,
            results_discarded_total,
            scans_accepted_total,
            attendance_out_total,
            attendance_in_total,
            attendance_failures_total,
        })
    }

    /// Updates all metrics from a snapshot.
    ///
    /// Counters only move forward; a snapshot with lower totals leaves
    /// them unchanged.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.scanning.set(i64::from(snapshot.is_scanning));
        self.live_signals.set(snapshot.live_signals as i64);
        self.keyword_live.set(i64::from(snapshot.keyword_live));
        self.roll_no_live.set(i64::from(snapshot.roll_no_live));
        self.name_live.set(i64::from(snapshot.name_live));

        catch_up(&self.sessions_total, snapshot.sessions_started);
        catch_up(&self.ticks_total, snapshot.ticks_started);
        catch_up(&self.ticks_dropped_total, snapshot.ticks_dropped);
        catch_up(&self.sample_failures_total, snapshot.sample_failures);
        catch_up(&self.results_discarded_total, snapshot.results_discarded);
        catch_up(&self.scans_accepted_total, snapshot.scans_accepted);
        catch_up(&self.attendance_out_total, snapshot.attendance_out);
        catch_up(&self.attendance_in_total, snapshot.attendance_in);
        catch_up(&self.attendance_failures_total, snapshot.attendance_failures);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry").finish_non_exhaustive()
    }
}

impl MetricsSnapshot {
    /// Builds a snapshot from running totals and the signals live now.
    pub fn from_stats(stats: &SessionStats, live: &LiveSignals, is_scanning: bool) -> Self {
        Self {
            is_scanning,
            live_signals: live.count(),
            keyword_live: live.keyword,
            roll_no_live: live.roll_no.is_some(),
            name_live: live.name,
            sessions_started: stats.sessions_started,
            ticks_started: stats.ticks_started,
            ticks_dropped: stats.ticks_dropped,
            sample_failures: stats.sample_failures,
            results_discarded: stats.results_discarded,
            scans_accepted: stats.scans_accepted,
            attendance_out: stats.attendance_out,
            attendance_in: stats.attendance_in,
            attendance_failures: stats.attendance_failures,
        }
    }

    /// Builds a snapshot of a session as of `now`.
    pub fn from_session(session: &ScanSession, now: crate::clock::Timestamp) -> Self {
        Self::from_stats(session.stats(), &session.live(now), session.is_scanning())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let stats = SessionStats {
            sessions_started: 1,
            ticks_started: 12,
            ticks_dropped: 3,
            scans_accepted: 1,
            attendance_out: 1,
            ..SessionStats::default()
        };
        let live = LiveSignals {
            keyword: true,
            roll_no: Some("12345".into()),
            name: false,
        };
        registry.update(&MetricsSnapshot::from_stats(&stats, &live, true));

        let output = registry.encode().unwrap();
        assert!(output.contains("campus_gate_scanning 1"));
        assert!(output.contains("campus_gate_live_signals 2"));
        assert!(output.contains("campus_gate_ticks_total 12"));
        assert!(output.contains("campus_gate_ticks_dropped_total 3"));
        assert!(output.contains("campus_gate_attendance_out_total 1"));
    }

    #[test]
    fn test_counters_do_not_go_backwards() {
        let registry = MetricsRegistry::new().unwrap();
        let mut snapshot = MetricsSnapshot {
            ticks_started: 10,
            ..MetricsSnapshot::default()
        };
        registry.update(&snapshot);
        snapshot.ticks_started = 4;
        registry.update(&snapshot);

        assert!(registry.encode().unwrap().contains("campus_gate_ticks_total 10"));
    }

    #[test]
    fn test_from_idle_session() {
        let session = ScanSession::default();
        let snapshot = MetricsSnapshot::from_session(&session, crate::clock::Timestamp::ZERO);
        assert!(!snapshot.is_scanning);
        assert_eq!(snapshot.ticks_started, 0);
    }
}
