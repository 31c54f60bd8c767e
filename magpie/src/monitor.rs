//! The capture loop.
//!
//! One dedicated thread polls the change detector on a fixed cadence,
//! classifies whatever fires, stamps it with frontmost-app provenance, and
//! drives it into the store. Successive clipboard changes apply in order
//! because everything on the capture path runs here. Retention sweeps run
//! on the same thread between ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::content_detection;
use crate::interface::CaptureOutcome;
use crate::pasteboard::ChangeDetector;
use crate::store::HistoryStore;

/// Handle to a running capture loop. `stop` signals and joins the thread;
/// dropping the handle signals without waiting.
pub struct CaptureHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Start polling the store's pasteboard.
pub fn start(store: Arc<HistoryStore>) -> CaptureHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let join = std::thread::Builder::new()
        .name("magpie-capture".to_string())
        .spawn(move || run_loop(store, stop_flag))
        .expect("Failed to spawn capture thread");
    CaptureHandle {
        stop,
        join: Some(join),
    }
}

fn run_loop(store: Arc<HistoryStore>, stop: Arc<AtomicBool>) {
    let pasteboard = store.pasteboard();
    let poll_interval = store.config().poll_interval();
    let sweep_interval = store.config().sweep_interval();
    let mut detector = ChangeDetector::new();
    let mut last_sweep = Instant::now();

    info!(
        interval_ms = poll_interval.as_millis() as u64,
        "capture loop started"
    );

    while !stop.load(Ordering::SeqCst) {
        let tick_started = Instant::now();

        if let Some(snapshot) = detector.poll(pasteboard.as_ref()) {
            if let Some(mut payload) = content_detection::classify(&snapshot) {
                if let Some(app) = pasteboard.frontmost_app() {
                    payload.source_app = app.name;
                    payload.source_app_id = app.identifier;
                }
                match store.capture(payload) {
                    CaptureOutcome::Inserted(id) => debug!(id, "captured"),
                    CaptureOutcome::Touched(id) => debug!(id, "recaptured"),
                    CaptureOutcome::Rejected => {}
                }
            }
        }

        if last_sweep.elapsed() >= sweep_interval {
            store.sweep(Utc::now());
            last_sweep = Instant::now();
        }

        // Sleep out the remainder of the tick so slow captures do not
        // accumulate drift.
        let elapsed = tick_started.elapsed();
        if elapsed < poll_interval {
            std::thread::sleep(poll_interval - elapsed);
        }
    }

    info!("capture loop stopped");
}
