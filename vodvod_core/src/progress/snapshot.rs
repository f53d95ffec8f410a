use std::path::PathBuf;

use serde::Serialize;

/// Aggregate view of one download, rebuilt after every event.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub received_bytes: u64,
    pub total_bytes: Option<u64>,
    pub percentage: Option<u8>,
    /// Bytes per second (EMA while running, average once done).
    pub speed: f64,
    /// Seconds left, known only when the total size is.
    pub eta_secs: Option<f64>,
    pub done: bool,
    pub final_path: Option<PathBuf>,
}

impl ProgressSnapshot {
    pub fn empty() -> Self {
        Self {
            received_bytes: 0,
            total_bytes: None,
            percentage: None,
            speed: 0.0,
            eta_secs: None,
            done: false,
            final_path: None,
        }
    }
}

/// Human-readable byte formatting.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
