use std::time::{Duration, Instant};

/// Default smoothing factor for the ETA moving average.
pub const DEFAULT_ALPHA: f64 = 0.3;

/// Default minimum spacing between ETA samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Smooths remaining-time estimates with an exponential moving average.
///
/// Each sample derives a fresh estimate from the average rate since the
/// transfer started, then blends it: `eta = (1 - alpha) * prev + alpha * fresh`.
/// Samples closer together than `min_interval` return the previous value.
#[derive(Debug, Clone)]
pub struct EtaEstimator {
    alpha: f64,
    min_interval: Duration,
    last_sample: Option<Instant>,
    eta: Option<f64>,
}

impl Default for EtaEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA, DEFAULT_SAMPLE_INTERVAL)
    }
}

impl EtaEstimator {
    pub fn new(alpha: f64, min_interval: Duration) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            min_interval,
            last_sample: None,
            eta: None,
        }
    }

    /// Feeds a progress observation and returns the smoothed ETA in seconds.
    ///
    /// Returns `None` until a rate can be measured.
    pub fn sample(
        &mut self,
        now: Instant,
        started_at: Instant,
        processed: u64,
        total: u64,
    ) -> Option<f64> {
        if processed >= total {
            self.eta = Some(0.0);
            self.last_sample = Some(now);
            return self.eta;
        }

        if let Some(last) = self.last_sample
            && now.saturating_duration_since(last) < self.min_interval
        {
            return self.eta;
        }

        let elapsed = now.saturating_duration_since(started_at).as_secs_f64();
        if elapsed <= 0.0 || processed == 0 {
            return self.eta;
        }

        let rate = processed as f64 / elapsed;
        let fresh = (total - processed) as f64 / rate;
        let smoothed = match self.eta {
            Some(prev) => (1.0 - self.alpha) * prev + self.alpha * fresh,
            None => fresh,
        };
        self.eta = Some(smoothed);
        self.last_sample = Some(now);
        self.eta
    }

    /// Last computed estimate.
    pub fn current(&self) -> Option<f64> {
        self.eta
    }

    /// Forgets all samples.
    pub fn reset(&mut self) {
        self.last_sample = None;
        self.eta = None;
    }
}
