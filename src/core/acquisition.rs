//! Image acquisition
//!
//! Turns a photo from the camera or file picker into a self-contained
//! `data:` URI that can travel in a JSON request body. The bytes are never
//! re-encoded, so the label keeps full resolution for the vision model.
//!
//! The container format is guessed from the content and the header is read
//! through the `image` decoders, so truncated or junk files are rejected
//! before anything is sent. The file extension only serves as a hint that is
//! logged when it disagrees.

use crate::domain::{MedscanError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageReader;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Cursor;
use std::path::Path;

/// Image container formats accepted for label extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// MIME type used in the data URI
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
        }
    }

    fn from_decoder_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            image::ImageFormat::WebP => Some(ImageFormat::WebP),
            image::ImageFormat::Bmp => Some(ImageFormat::Bmp),
            image::ImageFormat::Tiff => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    /// Detects the format from the content and checks that its header decodes
    ///
    /// # Errors
    ///
    /// Returns [`MedscanError::Input`] when the bytes are not an image, use a
    /// format that cannot be read, or stop before the image header is complete.
    pub fn detect(bytes: &[u8]) -> Result<(Self, u32, u32)> {
        let guessed = image::guess_format(bytes)
            .map_err(|_| MedscanError::Input("File is not a decodable image".to_string()))?;

        let format = Self::from_decoder_format(guessed).ok_or_else(|| {
            MedscanError::Input(format!("Unsupported image format: {guessed:?}"))
        })?;

        let (width, height) = ImageReader::with_format(Cursor::new(bytes), guessed)
            .into_dimensions()
            .map_err(|e| MedscanError::Input(format!("File is not a decodable image: {e}")))?;

        if width == 0 || height == 0 {
            return Err(MedscanError::Input(
                "File is not a decodable image: image has no pixels".to_string(),
            ));
        }

        Ok((format, width, height))
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// A label photo encoded for transport
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    format: ImageFormat,
    width: u32,
    height: u32,
    data_uri: String,
    byte_len: usize,
    fingerprint: String,
}

impl EncodedImage {
    /// Image format detected from the bytes
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Pixel dimensions read from the image header
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `data:<mime>;base64,<payload>` string
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// Size of the raw image in bytes
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// SHA-256 of the raw bytes, hex encoded; safe to log
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Accepts an already encoded `data:` URI, as produced by a browser
    /// `FileReader`
    ///
    /// The payload is decoded and checked like a file would be, and the URI is
    /// rebuilt with the MIME type of the detected format.
    ///
    /// # Errors
    ///
    /// Returns [`MedscanError::Input`] if the string is empty, is not a
    /// base64 data URI or does not contain an image.
    pub fn parse_data_uri(encoded: &str, max_bytes: usize) -> Result<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(MedscanError::Input("No image provided".to_string()));
        }

        let rest = encoded.strip_prefix("data:").ok_or_else(|| {
            MedscanError::Input("Encoded image must be a data: URI".to_string())
        })?;

        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            MedscanError::Input("Encoded image is missing its payload".to_string())
        })?;

        if !header.ends_with(";base64") {
            return Err(MedscanError::Input(
                "Encoded image must use base64 encoding".to_string(),
            ));
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| MedscanError::Input(format!("Encoded image is not valid base64: {e}")))?;

        encode_image(&bytes, max_bytes)
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("byte_len", &self.byte_len)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Encodes raw image bytes as a data URI
///
/// # Errors
///
/// Returns [`MedscanError::Input`] if `bytes` is empty, larger than
/// `max_bytes`, or not a decodable image.
///
/// # Example
///
/// ```
/// use medscan::core::acquisition::{encode_image, ImageFormat};
/// use std::io::Cursor;
///
/// let photo = image::RgbImage::from_pixel(4, 2, image::Rgb([255, 255, 255]));
/// let mut png = Vec::new();
/// photo.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png).unwrap();
///
/// let encoded = encode_image(&png, 1024).unwrap();
/// assert_eq!(encoded.format(), ImageFormat::Png);
/// assert_eq!(encoded.dimensions(), (4, 2));
/// assert!(encoded.data_uri().starts_with("data:image/png;base64,"));
///
/// // A bare JPEG signature is not an image
/// assert!(encode_image(&[0xFF, 0xD8, 0xFF], 1024).is_err());
/// ```
pub fn encode_image(bytes: &[u8], max_bytes: usize) -> Result<EncodedImage> {
    if bytes.is_empty() {
        return Err(MedscanError::Input("No image provided".to_string()));
    }

    if bytes.len() > max_bytes {
        return Err(MedscanError::Input(format!(
            "Image is too large: {} bytes (limit {} bytes)",
            bytes.len(),
            max_bytes
        )));
    }

    let (format, width, height) = ImageFormat::detect(bytes)?;

    let data_uri = format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes));
    let fingerprint = format!("{:x}", Sha256::digest(bytes));

    Ok(EncodedImage {
        format,
        width,
        height,
        data_uri,
        byte_len: bytes.len(),
        fingerprint,
    })
}

/// Reads and encodes an image file
///
/// # Errors
///
/// Returns [`MedscanError::Input`] if the file does not exist or is not an
/// image, and [`MedscanError::Io`] for other read failures.
pub async fn load_image_file(path: impl AsRef<Path>, max_bytes: usize) -> Result<EncodedImage> {
    let path = path.as_ref();

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MedscanError::Input(format!(
                "Image file not found: {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let image = encode_image(&bytes, max_bytes)?;

    if let Some(hinted) = mime_guess::from_path(path).first() {
        if hinted.essence_str() != image.format().mime_type() {
            tracing::warn!(
                path = %path.display(),
                extension_format = %hinted,
                detected_format = %image.format(),
                "Image extension does not match its content"
            );
        }
    }

    tracing::debug!(
        path = %path.display(),
        format = %image.format(),
        width = image.width,
        height = image.height,
        bytes = image.byte_len(),
        fingerprint = %image.fingerprint(),
        "Image loaded"
    );

    Ok(image)
}
