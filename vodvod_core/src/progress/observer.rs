use std::path::Path;

use async_trait::async_trait;

use super::snapshot::ProgressSnapshot;

/// Trait for anything that wants to observe a download.
///
/// Lifecycle:
/// - `on_progress` is called for every progress event (per-chunk granularity).
/// - exactly one of `on_complete`, `on_error` or `on_cancelled` follows.
#[async_trait]
pub trait ProgressObserver: Send + Sync + 'static {
    async fn on_progress(&self, snapshot: &ProgressSnapshot);

    async fn on_complete(&self, snapshot: &ProgressSnapshot, final_path: &Path);

    async fn on_error(&self, error: &str);

    async fn on_cancelled(&self) {}
}
