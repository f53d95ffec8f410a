use tokio::sync::mpsc;

use crate::types::types::{DownloadEvent, ProgressEvent, TerminalEvent};

/// Per-request event channel handed to the download manager.
///
/// `finish` consumes the sink, so a request can produce at most one terminal
/// event and nothing after it. Progress that would move `received_bytes`
/// backwards is dropped.
///
/// If the receiving side has gone away the download still runs to completion;
/// events are simply discarded.
#[derive(Debug)]
pub struct EventSink {
    tx: mpsc::Sender<DownloadEvent>,
    last_received: Option<u64>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<DownloadEvent>) -> Self {
        Self {
            tx,
            last_received: None,
        }
    }

    /// Create a sink together with the receiver its events arrive on.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DownloadEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    pub async fn progress(&mut self, received_bytes: u64, total_bytes: Option<u64>) {
        if matches!(self.last_received, Some(last) if received_bytes < last) {
            log::warn!(
                "[event_sink] dropping regressing progress: {} < {:?}",
                received_bytes,
                self.last_received
            );
            return;
        }
        self.last_received = Some(received_bytes);
        let event = ProgressEvent::new(received_bytes, total_bytes);
        let _ = self.tx.send(DownloadEvent::Progress(event)).await;
    }

    /// Deliver the terminal event without waiting on the consumer.
    ///
    /// When the channel is full the event is handed to a background task that
    /// waits for capacity, so the download task can end even if nobody is
    /// reading.
    pub fn finish(self, terminal: TerminalEvent) {
        match self.tx.try_send(DownloadEvent::Finished(terminal)) {
            Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                let tx = self.tx;
                tokio::spawn(async move {
                    let _ = tx.send(event).await;
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_regressing_progress_is_dropped() {
        let (mut sink, mut rx) = EventSink::channel(8);
        sink.progress(10, Some(100)).await;
        sink.progress(5, Some(100)).await;
        sink.progress(20, Some(100)).await;
        sink.finish(TerminalEvent::Cancelled);

        let mut received = Vec::new();
        while let Some(ev) = rx.recv().await {
            received.push(ev);
        }

        assert_eq!(
            received,
            vec![
                DownloadEvent::Progress(ProgressEvent::new(10, Some(100))),
                DownloadEvent::Progress(ProgressEvent::new(20, Some(100))),
                DownloadEvent::Finished(TerminalEvent::Cancelled),
            ]
        );
    }

    #[tokio::test]
    async fn test_finish_does_not_wait_for_a_full_channel() {
        let (mut sink, mut rx) = EventSink::channel(1);
        sink.progress(1, Some(2)).await;
        sink.finish(TerminalEvent::Cancelled);

        assert_eq!(
            rx.recv().await,
            Some(DownloadEvent::Progress(ProgressEvent::new(1, Some(2))))
        );
        assert_eq!(
            rx.recv().await,
            Some(DownloadEvent::Finished(TerminalEvent::Cancelled))
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_closed_receiver_does_not_fail() {
        let (mut sink, rx) = EventSink::channel(1);
        drop(rx);
        sink.progress(1, None).await;
        sink.finish(TerminalEvent::Cancelled);
    }
}
