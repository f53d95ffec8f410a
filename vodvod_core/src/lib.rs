pub mod config;
pub mod downloader;
pub mod progress;
pub mod types;
pub mod vod;
