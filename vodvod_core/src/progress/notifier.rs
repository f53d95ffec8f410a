use std::time::Instant;

use tokio::sync::mpsc;

use super::observer::ProgressObserver;
use super::snapshot::ProgressSnapshot;
use crate::types::types::{DownloadEvent, ProgressEvent, TerminalEvent};

/// EMA smoothing factor. 0.3 = responsive but stable.
const EMA_ALPHA: f64 = 0.3;

/// Consumes the `DownloadEvent`s of one download, aggregates them into
/// `ProgressSnapshot`s, and fans out to all registered observers.
///
/// | Channel message              | Observer method called            |
/// |------------------------------|-----------------------------------|
/// | `Progress(ev)`               | `on_progress(&snapshot)`          |
/// | `Finished(Complete)`         | `on_complete(&final, &path)`      |
/// | `Finished(Error)`            | `on_error(&msg)`                  |
/// | `Finished(Cancelled)`        | `on_cancelled()`                  |
/// | Channel closed, no terminal  | `on_error(..)`                    |
pub struct ProgressNotifier {
    observers: Vec<Box<dyn ProgressObserver>>,
    snapshot: ProgressSnapshot,
    last_update: Instant,
    start_time: Instant,
}

impl Default for ProgressNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            observers: Vec::new(),
            snapshot: ProgressSnapshot::empty(),
            last_update: now,
            start_time: now,
        }
    }

    /// Register an observer. Must be called before `run()`.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Drain events until the terminal event arrives or the channel closes.
    /// Returns the terminal event, if one was received.
    pub async fn run(mut self, mut rx: mpsc::Receiver<DownloadEvent>) -> Option<TerminalEvent> {
        self.start_time = Instant::now();
        self.last_update = self.start_time;

        while let Some(event) = rx.recv().await {
            match event {
                DownloadEvent::Progress(ev) => {
                    self.handle_progress(ev);
                    for observer in &self.observers {
                        observer.on_progress(&self.snapshot).await;
                    }
                }
                DownloadEvent::Finished(terminal) => {
                    self.finish(&terminal).await;
                    return Some(terminal);
                }
            }
        }

        let msg = "download task ended without reporting a result";
        log::error!("[progress_notifier] {}", msg);
        for observer in &self.observers {
            observer.on_error(msg).await;
        }
        None
    }

    fn handle_progress(&mut self, ev: ProgressEvent) {
        let now = Instant::now();
        let delta = ev.received_bytes.saturating_sub(self.snapshot.received_bytes);

        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        if elapsed > 0.0 {
            let instant_speed = delta as f64 / elapsed;
            self.snapshot.speed = EMA_ALPHA * instant_speed + (1.0 - EMA_ALPHA) * self.snapshot.speed;
            self.last_update = now;
        }

        self.snapshot.received_bytes = ev.received_bytes;
        self.snapshot.total_bytes = ev.total_bytes;
        self.snapshot.percentage = ev.percentage;
        self.snapshot.eta_secs = match ev.total_bytes {
            Some(total) if self.snapshot.speed > 0.0 => {
                Some(total.saturating_sub(ev.received_bytes) as f64 / self.snapshot.speed)
            }
            _ => None,
        };
    }

    async fn finish(&mut self, terminal: &TerminalEvent) {
        self.snapshot.done = true;
        match terminal {
            TerminalEvent::Complete { final_path, .. } => {
                let elapsed = self.start_time.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    self.snapshot.speed = self.snapshot.received_bytes as f64 / elapsed;
                }
                self.snapshot.eta_secs = Some(0.0);
                self.snapshot.final_path = Some(final_path.clone());
                for observer in &self.observers {
                    observer.on_complete(&self.snapshot, final_path).await;
                }
            }
            TerminalEvent::Error { message, .. } => {
                for observer in &self.observers {
                    observer.on_error(message).await;
                }
            }
            TerminalEvent::Cancelled => {
                for observer in &self.observers {
                    observer.on_cancelled().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ProgressObserver for Recorder {
        async fn on_progress(&self, snapshot: &ProgressSnapshot) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("progress:{}", snapshot.received_bytes));
        }

        async fn on_complete(&self, snapshot: &ProgressSnapshot, final_path: &Path) {
            assert!(snapshot.done);
            self.calls
                .lock()
                .unwrap()
                .push(format!("complete:{}", final_path.display()));
        }

        async fn on_error(&self, error: &str) {
            self.calls.lock().unwrap().push(format!("error:{}", error));
        }

        async fn on_cancelled(&self) {
            self.calls.lock().unwrap().push("cancelled".to_string());
        }
    }

    fn recorder() -> (Box<Recorder>, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Box::new(Recorder {
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }

    #[tokio::test]
    async fn test_notifier_fans_out_progress_then_complete() {
        let (observer, calls) = recorder();
        let mut notifier = ProgressNotifier::new();
        notifier.add_observer(observer);

        let (tx, rx) = mpsc::channel(8);
        tx.send(DownloadEvent::Progress(ProgressEvent::new(600, Some(1000))))
            .await
            .unwrap();
        tx.send(DownloadEvent::Progress(ProgressEvent::new(1000, Some(1000))))
            .await
            .unwrap();
        tx.send(DownloadEvent::Finished(TerminalEvent::Complete {
            final_path: PathBuf::from("/tmp/a.mp4"),
            filename: "a.mp4".to_string(),
        }))
        .await
        .unwrap();

        let terminal = notifier.run(rx).await;
        assert!(terminal.unwrap().is_complete());
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["progress:600", "progress:1000", "complete:/tmp/a.mp4"]
        );
    }

    #[tokio::test]
    async fn test_notifier_stops_at_terminal_event() {
        let (observer, calls) = recorder();
        let mut notifier = ProgressNotifier::new();
        notifier.add_observer(observer);

        let (tx, rx) = mpsc::channel(8);
        tx.send(DownloadEvent::Finished(TerminalEvent::Cancelled))
            .await
            .unwrap();
        tx.send(DownloadEvent::Progress(ProgressEvent::new(1, None)))
            .await
            .unwrap();

        assert_eq!(notifier.run(rx).await, Some(TerminalEvent::Cancelled));
        assert_eq!(*calls.lock().unwrap(), vec!["cancelled"]);
    }

    #[tokio::test]
    async fn test_notifier_reports_missing_terminal_event() {
        let (observer, calls) = recorder();
        let mut notifier = ProgressNotifier::new();
        notifier.add_observer(observer);

        let (tx, rx) = mpsc::channel::<DownloadEvent>(8);
        drop(tx);

        assert_eq!(notifier.run(rx).await, None);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("error:"));
    }
}
