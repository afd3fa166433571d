use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{UnmarkError, UnmarkResult};

/// Default processing backend when neither the config file nor the environment sets one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding [`EditorConfig::api_base_url`].
pub const ENV_API_URL: &str = "UNMARK_API_URL";

/// Environment variable overriding [`EditorConfig::request_timeout_secs`].
pub const ENV_REQUEST_TIMEOUT: &str = "UNMARK_REQUEST_TIMEOUT_SECS";

/// Smallest brush width the editor accepts (display pixels).
pub const MIN_BRUSH_WIDTH: f64 = 5.0;

/// Largest brush width the editor accepts (display pixels).
pub const MAX_BRUSH_WIDTH: f64 = 100.0;

/// Resolution the mask is rasterized at before it is sent to the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskResolution {
    /// Canvas display size; the backend resamples to the image size.
    #[default]
    Display,
    /// Natural size of the source image; stroke geometry is scaled by `1 / scale_factor`.
    Natural,
}

/// Fraction of the viewport the canvas is allowed to occupy on each axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewportUsage {
    /// Share of the viewport width, in `(0, 1]`.
    pub width: f64,
    /// Share of the viewport height, in `(0, 1]`.
    pub height: f64,
}

impl Default for ViewportUsage {
    fn default() -> Self {
        Self {
            width: 0.8,
            height: 0.6,
        }
    }
}

/// Editor and client settings.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Base URL of the processing backend (`POST {base}/process-image`).
    pub api_base_url: String,
    /// Whole-request timeout for a submission.
    pub request_timeout_secs: u64,
    /// TCP connect timeout.
    pub connect_timeout_secs: u64,
    /// Share of the viewport the canvas may use.
    pub viewport_usage: ViewportUsage,
    /// Brush width at session start (display pixels).
    pub default_brush_width: f64,
    /// Translucent color strokes are shown in while editing.
    pub highlight_color: Rgba8,
    /// Resolution of the exported mask.
    pub mask_resolution: MaskResolution,
    /// File name offered when the processed result is saved.
    pub download_file_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
            viewport_usage: ViewportUsage::default(),
            default_brush_width: 20.0,
            highlight_color: Rgba8::HIGHLIGHT,
            mask_resolution: MaskResolution::Display,
            download_file_name: "processed_image.png".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> UnmarkResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| UnmarkError::validation(format!("parse config JSON: {e}")))
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> UnmarkResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            UnmarkError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Apply `UNMARK_*` environment overrides from the process environment.
    pub fn with_env_overrides(self) -> UnmarkResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `lookup`; empty values are ignored.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> UnmarkResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs = raw.trim().parse().map_err(|e| {
                UnmarkError::validation(format!("{ENV_REQUEST_TIMEOUT}='{raw}': {e}"))
            })?;
        }
        Ok(self)
    }

    /// Check invariants the rest of the crate relies on.
    pub fn validate(&self) -> UnmarkResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(UnmarkError::validation("api_base_url must not be empty"));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(UnmarkError::validation("timeouts must be > 0"));
        }
        let in_unit = |v: f64| v > 0.0 && v <= 1.0;
        if !in_unit(self.viewport_usage.width) || !in_unit(self.viewport_usage.height) {
            return Err(UnmarkError::validation(
                "viewport_usage fractions must be in (0, 1]",
            ));
        }
        if !(MIN_BRUSH_WIDTH..=MAX_BRUSH_WIDTH).contains(&self.default_brush_width) {
            return Err(UnmarkError::validation(format!(
                "default_brush_width must be in {MIN_BRUSH_WIDTH}..={MAX_BRUSH_WIDTH}"
            )));
        }
        if self.download_file_name.trim().is_empty() {
            return Err(UnmarkError::validation(
                "download_file_name must not be empty",
            ));
        }
        Ok(())
    }

    /// Join the base URL with an endpoint path, tolerating a trailing slash on the base.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
