use std::sync::Mutex;

use hdrhistogram::Histogram;
use indexmap::IndexMap;

/// Nanosecond timers for the dispatch stages, one set per thread context.
#[derive(Debug)]
pub(crate) struct Timers(IndexMap<String, Mutex<StageTimer>>);

impl Timers {
    pub(crate) fn new() -> Self {
        let mut timers = IndexMap::new();
        for name in ["proto_detect", "applayer_parse"] {
            timers.insert(name.to_string(), Mutex::new(StageTimer::new()));
        }
        Timers(timers)
    }

    pub(crate) fn record(&self, which: &str, value: u64) {
        if let Some(timer) = self.0.get(which) {
            timer.lock().unwrap().record(value);
        } else {
            log::error!("No stage timer found for: {}", which);
        }
    }

    /// Emit a summary line per non-empty stage timer.
    pub(crate) fn log_stats(&self) {
        for (name, timer) in self.0.iter() {
            if let Some(line) = timer.lock().unwrap().summary() {
                log::info!("{}: {}", name, line);
            }
        }
    }
}

#[derive(Debug)]
struct StageTimer {
    cnt: u64,
    hist: Histogram<u64>,
}

impl StageTimer {
    fn new() -> Self {
        StageTimer {
            cnt: 0,
            hist: Histogram::new_with_bounds(1, 60 * 1_000_000_000, 3).unwrap(),
        }
    }

    fn record(&mut self, value: u64) {
        self.cnt += 1;
        if self.hist.record(value.max(1)).is_err() {
            log::warn!("Failed to record timer value {}", value);
        }
    }

    fn summary(&self) -> Option<String> {
        if self.cnt == 0 {
            return None;
        }
        Some(format!(
            "cnt {} avg {}ns p50 {}ns p99 {}ns max {}ns",
            self.cnt,
            self.hist.mean() as u64,
            self.hist.value_at_quantile(0.5),
            self.hist.value_at_quantile(0.99),
            self.hist.max(),
        ))
    }
}
