//! Prometheus metrics (lock-free atomics).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Wallet ---
    pub connects: AtomicU64,

    // --- Image capture ---
    pub generations: AtomicU64,
    pub generation_errors: AtomicU64,
    pub uploads: AtomicU64,

    // --- Pinning ---
    pub pins: AtomicU64,
    pub pin_errors: AtomicU64,

    // --- Chain ---
    pub collections_created: AtomicU64,
    pub mint_attempts: AtomicU64,
    pub mint_success: AtomicU64,
    pub mint_errors: AtomicU64,

    // --- Latency (μs) ---
    pub mint_duration_us_sum: AtomicU64,
    pub mint_duration_us_max: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            connects: AtomicU64::new(0),
            generations: AtomicU64::new(0),
            generation_errors: AtomicU64::new(0),
            uploads: AtomicU64::new(0),
            pins: AtomicU64::new(0),
            pin_errors: AtomicU64::new(0),
            collections_created: AtomicU64::new(0),
            mint_attempts: AtomicU64::new(0),
            mint_success: AtomicU64::new(0),
            mint_errors: AtomicU64::new(0),
            mint_duration_us_sum: AtomicU64::new(0),
            mint_duration_us_max: AtomicU64::new(0),
        }
    }

    pub fn record_mint_duration(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.mint_duration_us_sum.fetch_add(us, Ordering::Relaxed);
        self.mint_duration_us_max.fetch_max(us, Ordering::Relaxed);
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let connects = self.connects.load(Ordering::Relaxed);
        let generations = self.generations.load(Ordering::Relaxed);
        let generation_errors = self.generation_errors.load(Ordering::Relaxed);
        let uploads = self.uploads.load(Ordering::Relaxed);
        let pins = self.pins.load(Ordering::Relaxed);
        let pin_errors = self.pin_errors.load(Ordering::Relaxed);
        let collections_created = self.collections_created.load(Ordering::Relaxed);
        let mint_attempts = self.mint_attempts.load(Ordering::Relaxed);
        let mint_success = self.mint_success.load(Ordering::Relaxed);
        let mint_errors = self.mint_errors.load(Ordering::Relaxed);
        let dur_sum = self.mint_duration_us_sum.load(Ordering::Relaxed);
        let dur_max = self.mint_duration_us_max.swap(0, Ordering::Relaxed);

        let dur_sum_s = dur_sum as f64 / 1_000_000.0;
        let dur_max_s = dur_max as f64 / 1_000_000.0;

        format!(
            "\
# HELP mint_scape_connects_total Successful wallet connections.\n\
# TYPE mint_scape_connects_total counter\n\
mint_scape_connects_total {connects}\n\
# HELP mint_scape_generations_total Image generation requests.\n\
# TYPE mint_scape_generations_total counter\n\
mint_scape_generations_total {generations}\n\
# HELP mint_scape_generation_errors_total Failed or empty generations.\n\
# TYPE mint_scape_generation_errors_total counter\n\
mint_scape_generation_errors_total {generation_errors}\n\
# HELP mint_scape_uploads_total Local image uploads.\n\
# TYPE mint_scape_uploads_total counter\n\
mint_scape_uploads_total {uploads}\n\
# HELP mint_scape_pins_total Successful pins (files and documents).\n\
# TYPE mint_scape_pins_total counter\n\
mint_scape_pins_total {pins}\n\
# HELP mint_scape_pin_errors_total Failed pins.\n\
# TYPE mint_scape_pin_errors_total counter\n\
mint_scape_pin_errors_total {pin_errors}\n\
# HELP mint_scape_collections_created_total Collections created on the fly.\n\
# TYPE mint_scape_collections_created_total counter\n\
mint_scape_collections_created_total {collections_created}\n\
# HELP mint_scape_mint_attempts_total Mint attempts that passed validation.\n\
# TYPE mint_scape_mint_attempts_total counter\n\
mint_scape_mint_attempts_total {mint_attempts}\n\
# HELP mint_scape_mint_success_total Confirmed mints.\n\
# TYPE mint_scape_mint_success_total counter\n\
mint_scape_mint_success_total {mint_success}\n\
# HELP mint_scape_mint_errors_total Failed mint attempts.\n\
# TYPE mint_scape_mint_errors_total counter\n\
mint_scape_mint_errors_total {mint_errors}\n\
# HELP mint_scape_mint_duration_seconds_sum Total pin-to-confirmation time (seconds).\n\
# TYPE mint_scape_mint_duration_seconds_sum counter\n\
mint_scape_mint_duration_seconds_sum {dur_sum_s:.6}\n\
# HELP mint_scape_mint_duration_seconds_max Max pin-to-confirmation seconds since last scrape.\n\
# TYPE mint_scape_mint_duration_seconds_max gauge\n\
mint_scape_mint_duration_seconds_max {dur_max_s:.6}\n"
        )
    }
}
