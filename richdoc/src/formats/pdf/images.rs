//! Image sources, fetching, and decoding.
//!
//! Image `src` values are resolved into an [`ImageSource`], fetched through an
//! [`ImageFetcher`], and decoded into raw RGB plus an optional alpha channel.
//! Every failure is returned as an [`ImageFetchError`] for the caller to log;
//! a missing image never fails a render.

use crate::error::ImageFetchError;
use base64::Engine;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Where an image's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An `http`/`https` URL.
    Remote(Url),
    /// A local file, from a `file://` URL or a plain path.
    File(PathBuf),
    /// Bytes inlined in a `data:` URI.
    Inline(Vec<u8>),
}

impl ImageSource {
    /// Resolves an image `src`. Relative references are joined onto `base`
    /// when one is given, and treated as local paths otherwise.
    pub fn resolve(src: &str, base: Option<&Url>) -> Result<Self, ImageFetchError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(ImageFetchError::InvalidSource(String::new()));
        }
        if let Some(rest) = src.strip_prefix("data:") {
            return parse_data_uri(rest).map(ImageSource::Inline);
        }
        match Url::parse(src) {
            Ok(url) => Self::from_url(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match base {
                Some(base) => base
                    .join(src)
                    .map_err(|_| ImageFetchError::InvalidSource(src.to_string()))
                    .and_then(Self::from_url),
                None => Ok(ImageSource::File(PathBuf::from(src))),
            },
            Err(_) => Err(ImageFetchError::InvalidSource(src.to_string())),
        }
    }

    fn from_url(url: Url) -> Result<Self, ImageFetchError> {
        match url.scheme() {
            "http" | "https" => Ok(ImageSource::Remote(url)),
            "file" => url
                .to_file_path()
                .map(ImageSource::File)
                .map_err(|_| ImageFetchError::InvalidSource(url.to_string())),
            // A Windows drive letter parses as a one-letter scheme.
            scheme if scheme.len() == 1 => Ok(ImageSource::File(PathBuf::from(url.as_str()))),
            scheme => Err(ImageFetchError::UnsupportedScheme(scheme.to_string())),
        }
    }
}

/// Decodes the part of a `data:` URI after the scheme.
fn parse_data_uri(rest: &str) -> Result<Vec<u8>, ImageFetchError> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageFetchError::InvalidSource("data URI without payload".to_string()))?;
    if meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|err| ImageFetchError::Decode(format!("base64: {err}")))
    } else {
        Ok(percent_decode(payload))
    }
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Retrieves raw image bytes. Implementations must be usable from several
/// renders at once.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, source: &ImageSource) -> Result<Vec<u8>, ImageFetchError>;
}

/// Reads files and inline data, and downloads remote images over HTTP when
/// allowed.
#[derive(Debug, Clone)]
pub struct DefaultImageFetcher {
    pub allow_remote: bool,
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl Default for DefaultImageFetcher {
    fn default() -> Self {
        Self {
            allow_remote: true,
            timeout: Duration::from_secs(10),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

impl DefaultImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetcher that never touches the network.
    pub fn offline() -> Self {
        Self {
            allow_remote: false,
            ..Self::default()
        }
    }

    fn check_size(&self, len: u64) -> Result<(), ImageFetchError> {
        if len > self.max_bytes {
            Err(ImageFetchError::TooLarge {
                limit: self.max_bytes,
            })
        } else {
            Ok(())
        }
    }

    #[cfg(feature = "remote-images")]
    fn download(&self, url: &Url) -> Result<Vec<u8>, ImageFetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| ImageFetchError::Http(err.to_string()))?;
        let response = client
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|err| ImageFetchError::Http(err.to_string()))?;
        if let Some(len) = response.content_length() {
            self.check_size(len)?;
        }
        let mut bytes = Vec::new();
        response
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)?;
        self.check_size(bytes.len() as u64)?;
        Ok(bytes)
    }

    #[cfg(not(feature = "remote-images"))]
    fn download(&self, url: &Url) -> Result<Vec<u8>, ImageFetchError> {
        Err(ImageFetchError::UnsupportedScheme(format!(
            "{} (built without remote-images)",
            url.scheme()
        )))
    }
}

impl ImageFetcher for DefaultImageFetcher {
    fn fetch(&self, source: &ImageSource) -> Result<Vec<u8>, ImageFetchError> {
        match source {
            ImageSource::Inline(bytes) => {
                self.check_size(bytes.len() as u64)?;
                Ok(bytes.clone())
            }
            ImageSource::File(path) => {
                let file = std::fs::File::open(path)?;
                self.check_size(file.metadata()?.len())?;
                let mut bytes = Vec::new();
                file.take(self.max_bytes + 1).read_to_end(&mut bytes)?;
                Ok(bytes)
            }
            ImageSource::Remote(url) if self.allow_remote => self.download(url),
            ImageSource::Remote(url) => Err(ImageFetchError::Http(format!(
                "remote images are disabled: {url}"
            ))),
        }
    }
}

/// A decoded image ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// 8-bit RGB samples, row-major.
    pub rgb: Vec<u8>,
    /// 8-bit alpha samples, absent when the image is fully opaque.
    pub alpha: Option<Vec<u8>>,
}

impl DecodedImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageFetchError> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| ImageFetchError::Decode(err.to_string()))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageFetchError::Decode("empty image".to_string()));
        }
        let pixels = rgba.into_raw();
        let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
        let mut alpha = Vec::with_capacity(pixels.len() / 4);
        for px in pixels.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(px[3]);
        }
        let alpha = alpha.iter().any(|a| *a != 255).then_some(alpha);
        Ok(Self {
            width,
            height,
            rgb,
            alpha,
        })
    }
}

/// Per-render cache so that measuring and painting fetch each image once.
pub struct ImageCache<'a> {
    fetcher: &'a dyn ImageFetcher,
    by_src: HashMap<String, Option<usize>>,
    images: Vec<DecodedImage>,
}

impl<'a> ImageCache<'a> {
    pub fn new(fetcher: &'a dyn ImageFetcher) -> Self {
        Self {
            fetcher,
            by_src: HashMap::new(),
            images: Vec::new(),
        }
    }

    /// Index and pixel size of the image for `src`; `None` when it could not
    /// be fetched or decoded (logged once).
    pub fn get(&mut self, src: &str, base: Option<&Url>) -> Option<(usize, u32, u32)> {
        if let Some(entry) = self.by_src.get(src) {
            return entry.map(|index| self.describe(index));
        }
        let loaded = ImageSource::resolve(src, base)
            .and_then(|source| self.fetcher.fetch(&source))
            .and_then(|bytes| DecodedImage::decode(&bytes));
        let entry = match loaded {
            Ok(image) => {
                log::debug!("loaded image {src} ({}x{})", image.width, image.height);
                self.images.push(image);
                Some(self.images.len() - 1)
            }
            Err(err) => {
                log::warn!("image '{src}' omitted: {err}");
                None
            }
        };
        self.by_src.insert(src.to_string(), entry);
        entry.map(|index| self.describe(index))
    }

    fn describe(&self, index: usize) -> (usize, u32, u32) {
        let image = &self.images[index];
        (index, image.width, image.height)
    }

    pub fn into_images(self) -> Vec<DecodedImage> {
        self.images
    }
}

/// Fetcher that refuses every source.
#[cfg(test)]
pub struct NoImages;

#[cfg(test)]
impl ImageFetcher for NoImages {
    fn fetch(&self, source: &ImageSource) -> Result<Vec<u8>, ImageFetchError> {
        Err(ImageFetchError::InvalidSource(format!("{source:?}")))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    /// A PNG of the given size with a semi-transparent first pixel.
    pub fn png(width: u32, height: u32) -> Vec<u8> {
        let mut img = ImageBuffer::from_pixel(width, height, Rgba([200u8, 30, 30, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 128]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .expect("png encoding");
        out.into_inner()
    }
}
