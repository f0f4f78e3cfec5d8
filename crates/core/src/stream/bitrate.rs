use std::collections::VecDeque;
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

/// Sliding-window estimate of the outgoing bitrate of a track.
///
/// Every packet handed to the transport is recorded with its size; the
/// estimate is the number of bits recorded within the last window.
#[derive(Debug)]
pub struct BitrateMeter {
    window: Duration,
    samples: VecDeque<(Instant, usize)>,
    bytes_in_window: usize,
}

impl BitrateMeter {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
            bytes_in_window: 0,
        }
    }

    pub fn record(&mut self, bytes: usize) {
        self.record_at(Instant::now(), bytes);
    }

    /// Bits per second sent over the last window.
    pub fn bits_per_second(&self) -> u64 {
        self.bits_per_second_at(Instant::now())
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.bytes_in_window = 0;
    }

    fn record_at(&mut self, now: Instant, bytes: usize) {
        self.samples.push_back((now, bytes));
        self.bytes_in_window += bytes;

        while let Some(&(at, size)) = self.samples.front() {
            if now.duration_since(at) <= self.window {
                break;
            }
            self.samples.pop_front();
            self.bytes_in_window -= size;
        }
    }

    fn bits_per_second_at(&self, now: Instant) -> u64 {
        let stale: usize = self
            .samples
            .iter()
            .take_while(|(at, _)| now.duration_since(*at) > self.window)
            .map(|(_, size)| size)
            .sum();
        let bits = (self.bytes_in_window - stale) as u128 * 8;
        let window_ms = self.window.as_millis().max(1);
        (bits * 1000 / window_ms) as u64
    }
}

impl Default for BitrateMeter {
    fn default() -> Self {
        Self::new()
    }
}
