use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};

use vodvod_core::progress::{format_bytes, ProgressObserver, ProgressSnapshot};

/// Renders download progress as a single indicatif bar.
///
/// The bar is created lazily on the first snapshot: a bounded bar when the
/// server sent a size, a spinner with a byte counter otherwise.
pub struct TerminalProgressObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgressObserver {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, snapshot: &ProgressSnapshot, f: impl FnOnce(&ProgressBar)) {
        let mut guard = match self.bar.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let bar = guard.get_or_insert_with(|| new_bar(snapshot.total_bytes));
        f(bar);
    }
}

fn new_bar(total_bytes: Option<u64>) -> ProgressBar {
    match total_bytes {
        Some(total) => {
            let pb = ProgressBar::new(total.max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "[{bar:40.cyan/blue}] {bytes}/{total_bytes} ({binary_bytes_per_sec}) ETA {eta} {msg}",
            ) {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::with_template("{spinner} {bytes} ({binary_bytes_per_sec}) {msg}")
            {
                pb.set_style(style);
            }
            pb
        }
    }
}

#[async_trait]
impl ProgressObserver for TerminalProgressObserver {
    async fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.with_bar(snapshot, |pb| pb.set_position(snapshot.received_bytes));
    }

    async fn on_complete(&self, snapshot: &ProgressSnapshot, final_path: &Path) {
        self.with_bar(snapshot, |pb| {
            pb.set_position(snapshot.received_bytes);
            pb.finish_with_message(format!(
                "saved {} to {} at {}/s",
                format_bytes(snapshot.received_bytes),
                final_path.display(),
                format_bytes(snapshot.speed as u64)
            ));
        });
    }

    async fn on_error(&self, error: &str) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.abandon_with_message(format!("failed: {}", error));
            }
        }
    }

    async fn on_cancelled(&self) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.abandon_with_message("cancelled");
            }
        }
    }
}
