use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use vodvod_core::config::{DownloaderConfig, VodApiConfig, DEFAULT_API_URL, DEFAULT_MAX_REDIRECTS};
use vodvod_core::downloader::http_downloader::HttpDownloader;
use vodvod_core::downloader::stream_grabber::filename_from_url;
use vodvod_core::types::types::{DownloadRequest, TerminalEvent};
use vodvod_core::vod::{filter_vods, format_duration, Vod, VodClient};

mod terminal_observer;
use terminal_observer::TerminalProgressObserver;

#[derive(Parser)]
#[command(name = "vodvod", about = "Browse VOD listings and download recordings")]
struct Args {
    /// Base URL of the VOD listing API
    #[arg(long, global = true, env = "VODVOD_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List VODs, optionally for a single streamer
    List {
        /// Streamer login
        #[arg(short, long)]
        streamer: Option<String>,

        /// Only show VODs whose title, streamer or game contains this text
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Print the raw records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download a file
    Download {
        /// URL to download
        url: String,

        /// Output file or directory (defaults to the URL's file name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS)]
        max_redirects: usize,

        /// Abort when no data arrives for this many seconds
        #[arg(long)]
        idle_timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::List {
            streamer,
            search,
            json,
        } => list(&args.api_url, streamer, search, json).await,
        Command::Download {
            url,
            output,
            max_redirects,
            idle_timeout,
        } => {
            let mut config = DownloaderConfig::default().with_max_redirects(max_redirects);
            if let Some(secs) = idle_timeout {
                config = config.with_idle_timeout(Duration::from_secs(secs));
            }
            download(url, output, config).await
        }
    }
}

async fn list(api_url: &str, streamer: Option<String>, search: Option<String>, json: bool) -> ExitCode {
    let client = match VodClient::new(VodApiConfig::default().with_base_url(api_url)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create API client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let streamer = streamer
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let fetched = match &streamer {
        Some(login) => client.fetch_streamer(login).await,
        None => client.fetch_all().await,
    };
    let vods = match fetched {
        Ok(vods) => vods,
        Err(e) => {
            eprintln!("CONNECTION FAILED: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shown = filter_vods(&vods, search.as_deref().unwrap_or(""));

    if json {
        return match serde_json::to_string_pretty(&shown) {
            Ok(out) => {
                println!("{}", out);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to encode listing: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    if shown.is_empty() {
        println!("NO VODS FOUND");
    }
    for vod in &shown {
        print_vod(&client, vod);
    }

    let suffix = streamer.map(|s| format!(" (@{})", s)).unwrap_or_default();
    if shown.len() == vods.len() {
        println!("VODs: {}{}", vods.len(), suffix);
    } else {
        println!("VODs: {}/{}{}", shown.len(), vods.len(), suffix);
    }
    ExitCode::SUCCESS
}

fn print_vod(client: &VodClient, vod: &Vod) {
    println!("{}  {}", format_duration(vod.duration_secs()), vod.title());
    println!(
        "          @{} | {} | {} | {} views | {}",
        vod.streamer(),
        vod.game(),
        vod.language(),
        vod.views(),
        vod.start_time().unwrap_or("Unknown Date")
    );
    println!("          {}", client.stream_url(vod));
}

/// Picks the destination file: an explicit file, a file inside an explicit
/// directory, or the URL's own file name in the current directory.
fn resolve_destination(url: &str, output: Option<PathBuf>) -> PathBuf {
    let fallback = || filename_from_url(url).unwrap_or_else(|| "download.bin".to_string());
    match output {
        Some(dir) if dir.is_dir() => dir.join(fallback()),
        Some(file) => file,
        None => PathBuf::from(fallback()),
    }
}

async fn download(url: String, output: Option<PathBuf>, config: DownloaderConfig) -> ExitCode {
    let destination = resolve_destination(&url, output);
    let mut downloader = match HttpDownloader::new(config) {
        Ok(downloader) => downloader,
        Err(e) => {
            eprintln!("Failed to create downloader: {}", e);
            return ExitCode::FAILURE;
        }
    };
    downloader.add_observer(Box::new(TerminalProgressObserver::new()));

    println!("Starting download: {} -> {}", url, destination.display());
    let start = Instant::now();

    let stop = downloader.stop_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupt received, cancelling download");
            stop.cancel();
        }
    });

    let terminal = downloader.run(DownloadRequest::new(url, destination)).await;
    ctrl_c.abort();

    match terminal {
        TerminalEvent::Complete { filename, .. } => {
            println!(
                "Download of {} completed in {:.2}s",
                filename,
                start.elapsed().as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        TerminalEvent::Error { message, retryable } => {
            eprintln!("Download failed: {}", message);
            if retryable {
                eprintln!("The failure may be temporary; try again.");
            }
            ExitCode::FAILURE
        }
        TerminalEvent::Cancelled => {
            eprintln!("Download cancelled");
            ExitCode::from(130)
        }
    }
}
