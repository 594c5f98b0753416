use std::time::Duration;

/// Base delay before each fetch to an origin
const BASE_DELAY_SECS: f64 = 1.0;

/// Per-origin success/error counters driving the adaptive delay
///
/// Counters are absolute for the lifetime of a crawl; there is no decay. An
/// origin that errors keeps paying for it until the process exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OriginStats {
    /// Fetches that returned 200 with an HTML content type
    pub successes: u32,

    /// Fetches that failed at the transport layer or returned a non-200
    pub errors: u32,
}

impl OriginStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one fetch
    pub fn record(&mut self, success: bool) {
        if success {
            self.successes += 1;
        } else {
            self.errors += 1;
        }
    }

    /// Computes the adaptive delay applied before the next fetch
    ///
    /// `delay = 1.0s × (1 + 0.5·errors) × max(0.5, 1 − 0.1·successes)`
    ///
    /// A healthy origin converges to a 0.5 s floor; each error adds half a
    /// second to the error factor with no upper bound.
    pub fn adaptive_delay(&self) -> Duration {
        let error_factor = 1.0 + 0.5 * self.errors as f64;
        let success_factor = (1.0 - 0.1 * self.successes as f64).max(0.5);
        Duration::from_secs_f64(BASE_DELAY_SECS * error_factor * success_factor)
    }
}
