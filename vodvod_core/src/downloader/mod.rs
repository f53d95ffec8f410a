pub mod http_downloader;
pub mod stream_grabber;
