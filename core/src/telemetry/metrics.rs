use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Counters accumulated across sweeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub sweeps: usize,
    pub points: usize,
    pub rejected: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_sweep(&self, points: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.sweeps += 1;
            metrics.points += points;
        }
    }

    pub fn record_rejected(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rejected += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_accumulates_counts() {
        let recorder = MetricsRecorder::new();
        recorder.record_sweep(200);
        recorder.record_sweep(50);
        recorder.record_rejected();
        assert_eq!(
            recorder.snapshot(),
            MetricsSnapshot {
                sweeps: 2,
                points: 250,
                rejected: 1,
            }
        );
    }
}
