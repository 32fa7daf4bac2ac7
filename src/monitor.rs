//! Per-request resource monitoring.
//!
//! Samples wall-clock time, process CPU time and resident memory before and
//! after each request and reports the difference as response headers.

use crate::server::SharedState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::warn;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";
pub const CPU_USAGE_HEADER: &str = "x-cpu-usage";
pub const MEMORY_USAGE_HEADER: &str = "x-memory-usage";
pub const MEMORY_DIFF_HEADER: &str = "x-memory-usage-diff";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Point-in-time snapshot of this process.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSample {
    pub at: Instant,
    /// User + system CPU time consumed since process start
    pub cpu_time: Duration,
    /// Resident set size in bytes
    pub rss_bytes: u64,
}

/// Reads resource counters for the current process.
pub struct ProcessProbe {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl ProcessProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("Process metrics unavailable: {}", e);
                None
            }
        };

        Self {
            pid,
            system: Mutex::new(System::new()),
        }
    }

    /// Take a sample. Counters read as zero when the platform does not expose them.
    pub fn sample(&self) -> ResourceSample {
        let at = Instant::now();
        let Some(pid) = self.pid else {
            return ResourceSample {
                at,
                cpu_time: Duration::ZERO,
                rss_bytes: 0,
            };
        };

        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            false,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let (cpu_ms, rss_bytes) = system
            .process(pid)
            .map(|p| (p.accumulated_cpu_time(), p.memory()))
            .unwrap_or((0, 0));

        ResourceSample {
            at,
            cpu_time: Duration::from_millis(cpu_ms),
            rss_bytes,
        }
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Resources consumed between two samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    pub elapsed_secs: f64,
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub memory_diff_mb: f64,
}

impl ResourceUsage {
    pub fn between(start: &ResourceSample, end: &ResourceSample) -> Self {
        let elapsed_secs = end.at.saturating_duration_since(start.at).as_secs_f64();
        let cpu_secs = end.cpu_time.saturating_sub(start.cpu_time).as_secs_f64();
        let cpu_percent = if elapsed_secs > 0.0 {
            cpu_secs / elapsed_secs * 100.0
        } else {
            0.0
        };

        Self {
            elapsed_secs,
            cpu_percent,
            memory_mb: end.rss_bytes as f64 / BYTES_PER_MB,
            memory_diff_mb: (end.rss_bytes as f64 - start.rss_bytes as f64) / BYTES_PER_MB,
        }
    }

    /// Header name/value pairs, formatted for the response.
    pub fn header_values(&self) -> [(&'static str, String); 4] {
        [
            (PROCESS_TIME_HEADER, format!("{:.4}", self.elapsed_secs)),
            (CPU_USAGE_HEADER, format!("{:.2}%", self.cpu_percent)),
            (MEMORY_USAGE_HEADER, format!("{:.2} MB", self.memory_mb)),
            (MEMORY_DIFF_HEADER, format!("{:.2} MB", self.memory_diff_mb)),
        ]
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in self.header_values() {
            // Formatted floats are always valid header values
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(name, value);
            }
        }
    }
}

/// Middleware attaching monitoring headers to every response.
pub async fn track_resources(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let start = state.probe.sample();
    let mut response = next.run(request).await;
    let end = state.probe.sample();

    ResourceUsage::between(&start, &end).apply(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(at: Instant, cpu_ms: u64, rss_bytes: u64) -> ResourceSample {
        ResourceSample {
            at,
            cpu_time: Duration::from_millis(cpu_ms),
            rss_bytes,
        }
    }

    #[test]
    fn test_usage_cpu_percentage() {
        let t0 = Instant::now();
        let start = sample(t0, 1_000, 100 * 1024 * 1024);
        let end = sample(t0 + Duration::from_millis(200), 1_100, 101 * 1024 * 1024);

        let usage = ResourceUsage::between(&start, &end);
        assert!((usage.elapsed_secs - 0.2).abs() < 1e-9);
        assert!((usage.cpu_percent - 50.0).abs() < 1e-6);
        assert!((usage.memory_mb - 101.0).abs() < 1e-9);
        assert!((usage.memory_diff_mb - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_usage_zero_elapsed_reports_zero_cpu() {
        let t0 = Instant::now();
        let start = sample(t0, 1_000, 0);
        let end = sample(t0, 1_050, 0);

        let usage = ResourceUsage::between(&start, &end);
        assert_eq!(usage.elapsed_secs, 0.0);
        assert_eq!(usage.cpu_percent, 0.0);
    }

    #[test]
    fn test_usage_memory_can_shrink() {
        let t0 = Instant::now();
        let start = sample(t0, 0, 3 * 1024 * 1024);
        let end = sample(t0 + Duration::from_millis(1), 0, 2 * 1024 * 1024);

        let usage = ResourceUsage::between(&start, &end);
        assert!((usage.memory_diff_mb + 1.0).abs() < 1e-9);
        assert_eq!(usage.header_values()[3].1, "-1.00 MB");
    }

    #[test]
    fn test_header_formatting() {
        let usage = ResourceUsage {
            elapsed_secs: 0.012345,
            cpu_percent: 87.5,
            memory_mb: 143.2,
            memory_diff_mb: 0.125,
        };
        let values = usage.header_values();

        assert_eq!(values[0], (PROCESS_TIME_HEADER, "0.0123".to_string()));
        assert_eq!(values[1], (CPU_USAGE_HEADER, "87.50%".to_string()));
        assert_eq!(values[2], (MEMORY_USAGE_HEADER, "143.20 MB".to_string()));
        assert_eq!(values[3].0, MEMORY_DIFF_HEADER);
        assert!(values[3].1.ends_with(" MB"));
    }

    #[test]
    fn test_apply_sets_all_headers() {
        let usage = ResourceUsage {
            elapsed_secs: 1.0,
            cpu_percent: 0.0,
            memory_mb: 1.0,
            memory_diff_mb: 0.0,
        };
        let mut headers = HeaderMap::new();
        usage.apply(&mut headers);

        assert_eq!(headers.len(), 4);
        assert_eq!(headers["x-process-time"], "1.0000");
        assert_eq!(headers["x-cpu-usage"], "0.00%");
    }

    #[test]
    fn test_probe_samples_current_process() {
        let probe = ProcessProbe::new();
        let first = probe.sample();
        let second = probe.sample();

        assert!(second.at >= first.at);
        assert!(second.cpu_time >= first.cpu_time);
    }
}
