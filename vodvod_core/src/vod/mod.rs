pub mod client;
pub mod format;
pub mod model;

pub use client::{VodApiError, VodClient};
pub use format::{filter_vods, format_duration, suggested_filename};
pub use model::{Vod, VodMetadata};
