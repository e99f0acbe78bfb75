use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::geometry::Rect;
use crate::processing::blend::BorderProfile;
use crate::processing::window::WindowDetection;

/// Top-level bezel configuration, usually read from `bezel.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Directory holding the bezel artwork.
    pub bezel_dir: PathBuf,
    /// Master switch; when off, `load()` never touches the file system.
    pub show: bool,
    /// Artwork tried after all title-derived names. Empty disables it.
    pub default_name: String,
    /// Artwork file extensions in lookup order (lowercase, without dot).
    pub extensions: Vec<String>,
    pub window: WindowOptions,
    pub blend: BlendOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WindowOptions {
    /// How the window is located when the artwork carries no sidecar.
    pub detection: WindowDetection,
    /// Pixels with alpha up to this value count as transparent.
    pub transparent_alpha: u8,
    /// Fixed window applied to every artwork without a sidecar.
    pub manual: Option<Rect>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BlendOptions {
    /// Feather quantization in artwork pixels. Zero or less gives hard edges.
    pub step: i32,
    /// Feather thickness at the window corners, as a fraction of the window.
    pub corner_fraction: f32,
    /// Feather thickness at the middle of the window edges.
    pub edge_fraction: f32,
}

impl Configuration {
    /// Parse a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(mut self) -> Result<Self> {
        for ext in &mut self.extensions {
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }
        self.extensions.retain(|ext| !ext.is_empty());
        ensure!(
            !self.extensions.is_empty(),
            "extensions must list at least one file type"
        );
        self.default_name = self.default_name.trim().to_string();
        if let Some(manual) = self.window.manual {
            ensure!(!manual.is_empty(), "window.manual must be non-empty");
        }
        self.blend.validate().context("invalid blend configuration")?;
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            bezel_dir: PathBuf::from("bezels"),
            show: true,
            default_name: "default".to_string(),
            extensions: vec!["png".to_string(), "webp".to_string()],
            window: WindowOptions::default(),
            blend: BlendOptions::default(),
        }
    }
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            detection: WindowDetection::default(),
            transparent_alpha: 0,
            manual: None,
        }
    }
}

impl BlendOptions {
    fn validate(&self) -> Result<()> {
        ensure!(self.step >= 0, "blend.step must be >= 0");
        for (key, v) in [
            ("corner-fraction", self.corner_fraction),
            ("edge-fraction", self.edge_fraction),
        ] {
            ensure!(
                v.is_finite() && (0.0..=0.5).contains(&v),
                "blend.{key} must be within [0, 0.5]"
            );
        }
        ensure!(
            self.corner_fraction <= self.edge_fraction,
            "blend.corner-fraction must not exceed blend.edge-fraction"
        );
        Ok(())
    }

    #[must_use]
    pub fn profile(&self) -> BorderProfile {
        BorderProfile {
            corner_fraction: self.corner_fraction,
            edge_fraction: self.edge_fraction,
        }
    }
}

impl Default for BlendOptions {
    fn default() -> Self {
        let profile = BorderProfile::default();
        Self {
            step: 1,
            corner_fraction: profile.corner_fraction,
            edge_fraction: profile.edge_fraction,
        }
    }
}
