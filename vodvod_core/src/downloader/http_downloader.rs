use reqwest::Client;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::DownloaderConfig;
use crate::downloader::stream_grabber::{file_name_of, open_stream, stream_to_file};
use crate::progress::notifier::ProgressNotifier;
use crate::progress::observer::ProgressObserver;
use crate::progress::sink::EventSink;
use crate::types::types::{DownloadError, DownloadRequest, TerminalEvent};

/// Streams single resources to disk, one spawned task per request.
///
/// Requests share the HTTP connection pool and nothing else. Two requests
/// writing to the same destination race; the last writer wins.
pub struct HttpDownloader {
    client: Client,
    config: DownloaderConfig,
    notifier: ProgressNotifier,
    cancel_token: CancellationToken,
}

/// Handle to a download started with `HttpDownloader::download`.
pub struct DownloadHandle {
    cancel_token: CancellationToken,
    task: JoinHandle<TerminalEvent>,
}

impl DownloadHandle {
    /// Request cancellation. Checked at every chunk boundary; the partial
    /// file is removed and a `Cancelled` terminal event is emitted.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the download task. Returns `None` only if the task panicked.
    pub async fn join(self) -> Option<TerminalEvent> {
        self.task.await.ok()
    }
}

impl HttpDownloader {
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        // Redirects are followed by hand so hops can be counted.
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client,
            config,
            notifier: ProgressNotifier::new(),
            cancel_token: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Register a progress observer. Must be called before `run()`.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.notifier.add_observer(observer);
    }

    /// Start a download and return immediately.
    ///
    /// `sink` receives zero or more progress events followed by exactly one
    /// terminal event.
    pub fn download(&self, request: DownloadRequest, sink: EventSink) -> DownloadHandle {
        let cancel_token = self.cancel_token.child_token();
        let client = self.client.clone();
        let config = self.config.clone();
        let task_token = cancel_token.clone();

        let task = tokio::spawn(async move {
            transfer(&client, &config, request, sink, &task_token).await
        });

        DownloadHandle { cancel_token, task }
    }

    /// Run one download to its terminal event, feeding the registered
    /// observers along the way.
    ///
    /// Observers are consumed by this call; register new ones before the
    /// next `run()`.
    pub async fn run(&mut self, request: DownloadRequest) -> TerminalEvent {
        let (sink, rx) = EventSink::channel(self.config.event_buffer);

        // Take the notifier out so it can drain the channel while the
        // transfer task runs. A fresh empty notifier is left in place.
        let notifier = std::mem::take(&mut self.notifier);

        let handle = self.download(request, sink);
        let observed = notifier.run(rx).await;
        let joined = handle.join().await;

        observed.or(joined).unwrap_or_else(|| TerminalEvent::Error {
            message: "download task aborted".to_string(),
            retryable: false,
        })
    }

    /// Cancel every download started by this downloader, including ones
    /// started afterwards.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Token behind `stop()`. Cancelling it is the same as calling `stop()`,
    /// and it can be moved to another task while `run()` holds `&mut self`.
    pub fn stop_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

async fn transfer(
    client: &Client,
    config: &DownloaderConfig,
    request: DownloadRequest,
    mut sink: EventSink,
    cancel_token: &CancellationToken,
) -> TerminalEvent {
    log::info!(
        "[http_downloader] starting {} -> {}",
        request.source_url,
        request.destination_path.display()
    );

    let terminal = match fetch_to_file(client, config, &request, &mut sink, cancel_token).await {
        Ok(received) => {
            log::info!(
                "[http_downloader] finished {} ({} bytes)",
                request.destination_path.display(),
                received
            );
            TerminalEvent::Complete {
                filename: file_name_of(&request.destination_path),
                final_path: request.destination_path,
            }
        }
        Err(DownloadError::Cancelled) => {
            log::info!("[http_downloader] cancelled {}", request.source_url);
            TerminalEvent::Cancelled
        }
        Err(e) => {
            log::error!("[http_downloader] {} failed: {}", request.source_url, e);
            TerminalEvent::from(&e)
        }
    };

    sink.finish(terminal.clone());
    terminal
}

async fn fetch_to_file(
    client: &Client,
    config: &DownloaderConfig,
    request: &DownloadRequest,
    sink: &mut EventSink,
    cancel_token: &CancellationToken,
) -> Result<u64, DownloadError> {
    let response = open_stream(client, &request.source_url, config.max_redirects, cancel_token).await?;
    stream_to_file(
        response,
        &request.destination_path,
        sink,
        cancel_token,
        config.idle_timeout,
    )
    .await
}
