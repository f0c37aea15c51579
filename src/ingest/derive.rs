//! Pure derivations over metric records. Every function degrades to None
//! instead of dividing by zero or panicking on absent fields; a None
//! derived value must never escalate a server's status.

use crate::storage::MetricRecord;

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// memory_used / memory_total as a percentage; None if total is absent or zero.
pub fn memory_percent(metric: &MetricRecord, decimals: u32) -> Option<f64> {
    percent_of(metric.memory_used, metric.memory_total, decimals)
}

/// swap_used / swap_total as a percentage; None if total is absent or zero.
pub fn swap_percent(metric: &MetricRecord, decimals: u32) -> Option<f64> {
    percent_of(metric.swap_used, metric.swap_total, decimals)
}

fn percent_of(used: Option<i64>, total: Option<i64>, decimals: u32) -> Option<f64> {
    let total = total?;
    if total == 0 {
        return None;
    }
    let used = used.unwrap_or(0);
    Some(round_to(used as f64 / total as f64 * 100.0, decimals))
}

/// load_1m / cpu_cores; None if the core count is absent or zero.
pub fn normalized_load(metric: &MetricRecord, decimals: u32) -> Option<f64> {
    let cores = metric.cpu_cores?;
    if cores == 0 {
        return None;
    }
    let load = metric.load_1m.unwrap_or(0.0);
    Some(round_to(load / cores as f64, decimals))
}

/// Highest disk usage with its mount label; None when no disks were
/// reported. The first maximum encountered keeps the label on ties.
pub fn max_disk(metric: &MetricRecord) -> Option<(String, f64)> {
    let entries = metric.disk_entries();
    if entries.is_empty() {
        return None;
    }

    let mut max_percent = 0.0;
    let mut max_mount = "/".to_string();
    for entry in entries {
        if let Some(percent) = entry.percent {
            if percent > max_percent {
                max_percent = percent;
                max_mount = entry.mount.unwrap_or_else(|| "/".to_string());
            }
        }
    }

    Some((max_mount, max_percent))
}

pub fn max_disk_percent(metric: &MetricRecord, decimals: u32) -> Option<f64> {
    max_disk(metric).map(|(_, percent)| round_to(percent, decimals))
}

/// Services whose status is anything but "running", in either payload shape.
pub fn failed_services_count(metric: &MetricRecord) -> usize {
    metric
        .service_statuses()
        .iter()
        .filter(|(_, status)| status != "running")
        .count()
}

/// Interval delta for a monotonic counter. The first point of a series and
/// any counter reset (raw difference below zero) both yield 0.
pub fn counter_delta(curr: i64, prev: Option<i64>) -> i64 {
    match prev {
        Some(p) if curr >= p => curr - p,
        _ => 0,
    }
}

/// Seconds elapsed between two records; zero or negative gaps mean
/// duplicate or out-of-order timestamps and disqualify rate computation.
pub fn elapsed_seconds(curr: &MetricRecord, prev: &MetricRecord) -> i64 {
    (curr.recorded_at - prev.recorded_at).num_seconds()
}
