//! Shared configuration loader for the richdoc toolchain.
//!
//! `defaults/richdoc.default.toml` is embedded into every binary so that docs
//! and runtime behavior stay in sync. Applications layer user-specific files
//! on top of those defaults via [`Loader`] before deserializing into
//! [`RichdocConfig`], then turn the result into renderer inputs with the
//! helpers on [`RenderConfig`] and [`ImagesConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use richdoc::error::FontError;
use richdoc::formats::pdf::{
    DefaultImageFetcher, FaceSlot, FontBook, PageGeometry, RenderContext,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_TOML: &str = include_str!("../defaults/richdoc.default.toml");

/// Top-level configuration consumed by richdoc applications.
#[derive(Debug, Clone, Deserialize)]
pub struct RichdocConfig {
    pub render: RenderConfig,
    pub images: ImagesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub base_url: String,
    pub body_font_size: f32,
    pub page: PageConfig,
    pub fonts: FontsConfig,
}

/// Page size and margins, in points.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageConfig {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

/// TrueType files per face. Empty strings keep the built-in face.
#[derive(Debug, Clone, Deserialize)]
pub struct FontsConfig {
    pub regular: String,
    pub bold: String,
    pub italic: String,
    pub bold_italic: String,
    pub monospace: String,
}

impl FontsConfig {
    fn path(&self, slot: FaceSlot) -> &str {
        match slot {
            FaceSlot::Regular => &self.regular,
            FaceSlot::Bold => &self.bold,
            FaceSlot::Italic => &self.italic,
            FaceSlot::BoldItalic => &self.bold_italic,
            FaceSlot::Monospace => &self.monospace,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    pub allow_remote: bool,
    pub timeout_secs: u64,
    pub max_bytes: u64,
}

/// A configured value that cannot be turned into a renderer input.
#[derive(Error, Debug)]
pub enum RenderConfigError {
    #[error(transparent)]
    Font(#[from] FontError),

    #[error("invalid render.base_url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

impl RenderConfig {
    pub fn page_geometry(&self) -> PageGeometry {
        PageGeometry {
            width: self.page.width,
            height: self.page.height,
            margin_top: self.page.margin_top,
            margin_bottom: self.page.margin_bottom,
            margin_left: self.page.margin_left,
            margin_right: self.page.margin_right,
        }
    }

    /// Loads the configured font files over the built-in faces.
    pub fn font_book(&self) -> Result<FontBook, FontError> {
        let mut book = FontBook::builtin();
        for slot in FaceSlot::ALL {
            let path = self.fonts.path(slot).trim();
            if path.is_empty() {
                continue;
            }
            log::debug!("loading {slot:?} face from {path}");
            book = book.with_font_file(slot, Path::new(path))?;
        }
        Ok(book)
    }

    /// The base URL, `None` when not configured.
    pub fn base_url(&self) -> Result<Option<Url>, url::ParseError> {
        let raw = self.base_url.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        Url::parse(raw).map(Some)
    }
}

impl ImagesConfig {
    pub fn image_fetcher(&self) -> DefaultImageFetcher {
        DefaultImageFetcher {
            allow_remote: self.allow_remote,
            timeout: Duration::from_secs(self.timeout_secs),
            max_bytes: self.max_bytes,
        }
    }
}

impl RichdocConfig {
    pub fn page_geometry(&self) -> PageGeometry {
        self.render.page_geometry()
    }

    pub fn font_book(&self) -> Result<FontBook, FontError> {
        self.render.font_book()
    }

    pub fn base_url(&self) -> Result<Option<Url>, url::ParseError> {
        self.render.base_url()
    }

    pub fn image_fetcher(&self) -> DefaultImageFetcher {
        self.images.image_fetcher()
    }

    /// Everything the PDF renderer needs, minus the per-document header and
    /// comments.
    pub fn render_context(&self) -> Result<RenderContext, RenderConfigError> {
        Ok(RenderContext::new()
            .with_geometry(self.page_geometry())
            .with_fonts(self.font_book()?)
            .with_body_size(self.render.body_font_size)
            .with_base_url(self.base_url()?)
            .with_fetcher(Arc::new(self.image_fetcher())))
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<RichdocConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<RichdocConfig, ConfigError> {
    Loader::new().build()
}
