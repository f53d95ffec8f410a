use serde::{Deserialize, Serialize};

const PLACEHOLDER_BOX_ART: &str = "https://via.placeholder.com/40x56/111122/00ffff?text=Game";
const PLACEHOLDER_PROFILE: &str = "https://via.placeholder.com/50/111122/00ffff?text=User";

/// One recorded stream as returned by the listing API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vod {
    /// Path relative to the API base URL.
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Metadata", default)]
    pub metadata: Option<VodMetadata>,
}

/// A nullable string as the API encodes it: `{"String": "...", "Valid": true}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NullString {
    #[serde(rename = "String", default)]
    pub string: String,
    #[serde(rename = "Valid", default)]
    pub valid: bool,
}

/// A nullable float: `{"Float64": 123.0, "Valid": true}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NullFloat {
    #[serde(rename = "Float64", default)]
    pub float64: f64,
    #[serde(rename = "Valid", default)]
    pub valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VodMetadata {
    #[serde(default)]
    pub title_at_start: Option<String>,
    #[serde(default)]
    pub streamer_login_at_start: Option<String>,
    #[serde(default)]
    pub game_name_at_start: Option<String>,
    #[serde(default)]
    pub language_at_start: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub max_views: Option<u64>,
    #[serde(default)]
    pub hls_duration_seconds: Option<NullFloat>,
    #[serde(default)]
    pub box_art_url_at_start: Option<NullString>,
    #[serde(default)]
    pub profile_image_url_at_start: Option<NullString>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

impl Vod {
    fn meta(&self) -> Option<&VodMetadata> {
        self.metadata.as_ref()
    }

    pub fn title(&self) -> &str {
        non_empty(self.meta().and_then(|m| m.title_at_start.as_deref())).unwrap_or("Unnamed Stream")
    }

    pub fn streamer(&self) -> &str {
        non_empty(self.meta().and_then(|m| m.streamer_login_at_start.as_deref())).unwrap_or("Unknown")
    }

    pub fn game(&self) -> &str {
        non_empty(self.meta().and_then(|m| m.game_name_at_start.as_deref())).unwrap_or("Unknown Game")
    }

    pub fn language(&self) -> &str {
        non_empty(self.meta().and_then(|m| m.language_at_start.as_deref())).unwrap_or("en")
    }

    pub fn start_time(&self) -> Option<&str> {
        non_empty(self.meta().and_then(|m| m.start_time.as_deref()))
    }

    pub fn views(&self) -> u64 {
        self.meta().and_then(|m| m.max_views).unwrap_or(0)
    }

    /// Duration in seconds as reported, fractions kept; 0.0 when unknown.
    pub fn duration_secs(&self) -> f64 {
        self.meta()
            .and_then(|m| m.hls_duration_seconds.as_ref())
            .map(|d| d.float64)
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .unwrap_or(0.0)
    }

    pub fn box_art_url(&self) -> &str {
        non_empty(
            self.meta()
                .and_then(|m| m.box_art_url_at_start.as_ref())
                .map(|s| s.string.as_str()),
        )
        .unwrap_or(PLACEHOLDER_BOX_ART)
    }

    /// Box art resized for a card thumbnail.
    pub fn thumbnail_url(&self) -> String {
        self.box_art_url().replace("-40x56", "-320x180")
    }

    pub fn profile_image_url(&self) -> &str {
        non_empty(
            self.meta()
                .and_then(|m| m.profile_image_url_at_start.as_ref())
                .map(|s| s.string.as_str()),
        )
        .unwrap_or(PLACEHOLDER_PROFILE)
    }
}
