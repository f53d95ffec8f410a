use std::future::Future;
use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, Response, StatusCode, Url};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::progress::sink::EventSink;
use crate::types::types::DownloadError;

/// Parses a source URL and rejects anything that is not plain HTTP or TLS.
pub fn parse_source_url(raw: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(raw).map_err(|e| DownloadError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    ensure_http(&url)?;
    Ok(url)
}

fn ensure_http(url: &Url) -> Result<(), DownloadError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DownloadError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Issues a GET for `source_url` and follows redirects until a 200 arrives.
///
/// The client must have automatic redirects disabled; hops are counted here
/// and more than `max_redirects` of them fail with `TooManyRedirects`.
/// A 3xx without a `Location` header and any other non-200 status fail with
/// `HttpStatus`.
pub async fn open_stream(
    client: &Client,
    source_url: &str,
    max_redirects: usize,
    cancel: &CancellationToken,
) -> Result<Response, DownloadError> {
    let mut url = parse_source_url(source_url)?;
    let mut redirects = 0usize;

    loop {
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            sent = client.get(url.clone()).send() => sent,
        };
        let response = sent?;
        let status = response.status();

        if status == StatusCode::OK {
            return Ok(response);
        }

        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            if let Some(location) = location {
                if redirects >= max_redirects {
                    log::error!(
                        "[stream_grabber] giving up on {} after {} redirects",
                        source_url,
                        redirects
                    );
                    return Err(DownloadError::TooManyRedirects(max_redirects));
                }
                let next = url.join(&location).map_err(|e| DownloadError::InvalidUrl {
                    url: location.clone(),
                    reason: e.to_string(),
                })?;
                ensure_http(&next)?;
                log::debug!(
                    "[stream_grabber] {} {} -> {}",
                    status.as_u16(),
                    url,
                    next
                );
                redirects += 1;
                url = next;
                continue;
            }
        }

        return Err(DownloadError::HttpStatus {
            status: status.as_u16(),
        });
    }
}

/// Streams the body of a 200 response into `destination`, truncating any
/// existing file, and reports cumulative progress after every chunk.
///
/// On any failure after the file was created (write error, broken stream,
/// idle timeout, cancellation) the partial file is removed before the error
/// is returned. Returns the number of bytes written.
pub async fn stream_to_file(
    response: Response,
    destination: &Path,
    sink: &mut EventSink,
    cancel: &CancellationToken,
    idle_timeout: Option<Duration>,
) -> Result<u64, DownloadError> {
    let file = tokio::fs::File::create(destination)
        .await
        .map_err(DownloadError::Disk)?;

    match write_body(response, file, sink, cancel, idle_timeout).await {
        Ok(received) => Ok(received),
        Err(e) => {
            remove_partial(destination).await;
            Err(e)
        }
    }
}

async fn write_body(
    response: Response,
    file: tokio::fs::File,
    sink: &mut EventSink,
    cancel: &CancellationToken,
    idle_timeout: Option<Duration>,
) -> Result<u64, DownloadError> {
    let total_bytes = response.content_length();
    let mut writer = tokio::io::BufWriter::with_capacity(256 * 1024, file);
    let mut stream = response.bytes_stream();
    let mut received: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            next = with_idle_timeout(idle_timeout, stream.next()) => next?,
        };

        let chunk = match next {
            Some(chunk) => chunk?,
            None => break,
        };
        if chunk.is_empty() {
            continue;
        }

        writer.write_all(&chunk).await.map_err(DownloadError::Disk)?;
        received += chunk.len() as u64;
        // A consumer that stops reading must not hold off cancellation.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            _ = sink.progress(received, total_bytes) => {}
        }
    }

    writer.flush().await.map_err(DownloadError::Disk)?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(DownloadError::Disk)?;

    Ok(received)
}

async fn with_idle_timeout<F: Future>(
    limit: Option<Duration>,
    fut: F,
) -> Result<F::Output, DownloadError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DownloadError::IdleTimeout(limit)),
        None => Ok(fut.await),
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::info!("[stream_grabber] removed partial file {}", path.display()),
        Err(e) => log::warn!(
            "[stream_grabber] could not remove partial file {}: {}",
            path.display(),
            e
        ),
    }
}

/// Base name of a destination path, as reported in `Complete` events.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Last non-empty path segment of a URL, percent-decoded.
pub fn filename_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode(segment);
    if decoded.is_empty() || decoded.contains(['/', '\\']) {
        None
    } else {
        Some(decoded)
    }
}

/// Percent-decode a URL path segment (e.g. `My%20File.mp4` → `My File.mp4`).
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
