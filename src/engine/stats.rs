// Download progress accounting for the artifact fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DownloadSnapshot {
    pub bytes: u64,
    pub elapsed: Duration,
    pub bytes_per_sec: u64,
}

pub struct DownloadStats {
    started: Instant,
    bytes: AtomicU64,
}

impl DownloadStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            bytes: AtomicU64::new(0),
        }
    }

    pub fn record_written(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn total_written(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DownloadSnapshot {
        let elapsed = self.started.elapsed();
        let bytes = self.total_written();
        let secs = elapsed.as_secs_f64();
        // Too short a window gives a meaningless rate.
        let bytes_per_sec = if secs > 0.001 {
            (bytes as f64 / secs) as u64
        } else {
            0
        };
        DownloadSnapshot {
            bytes,
            elapsed,
            bytes_per_sec,
        }
    }
}

impl Default for DownloadStats {
    fn default() -> Self {
        Self::new()
    }
}
