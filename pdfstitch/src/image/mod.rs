//! Wrapping a PNG or JPEG into a single-page PDF.
//!
//! The format is sniffed from the leading bytes, never from the file
//! extension. JPEGs are embedded as-is; PNGs are decoded and re-deflated.
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::config::PageLayout;
//! use pdfstitch::image::ImageWrapper;
//! use pdfstitch::io::PdfWriter;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = ImageWrapper::new(PageLayout::ImageSize).wrap_file(Path::new("photo.jpg"))?;
//! PdfWriter::new().save(&doc, Path::new("photo.pdf"))?;
//! # Ok(())
//! # }
//! ```

pub mod jpeg;
pub mod png;

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::builder::ImageXObject;
use crate::config::{Metadata, PageLayout};
use crate::document::Document;
use crate::error::{PdfStitchError, Result};
use crate::io::reader::read_source;
use crate::io::serializer::format_real;
use crate::object::Name;

/// Resource name the page's content stream paints the image under.
pub const IMAGE_RESOURCE: &str = "Im1";

/// Why an image cannot be embedded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FormatError(String);

impl FormatError {
    /// Create a format error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Result type of the image decoders.
pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// An image plus its optional soft mask, ready to register.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// The colour image.
    pub image: ImageXObject,
    /// Alpha channel as a DeviceGray image.
    pub smask: Option<ImageXObject>,
}

/// Raster formats that can be wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG / JFIF.
    Jpeg,
    /// PNG.
    Png,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("JPEG"),
            Self::Png => f.write_str("PNG"),
        }
    }
}

/// Identify the image format from magic bytes.
pub fn sniff(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if data.starts_with(&png::SIGNATURE) {
        Some(ImageFormat::Png)
    } else {
        None
    }
}

/// Where the image lands on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// MediaBox width.
    pub page_width: f64,
    /// MediaBox height.
    pub page_height: f64,
    /// Left edge of the image.
    pub x: f64,
    /// Bottom edge of the image.
    pub y: f64,
    /// Drawn width.
    pub width: f64,
    /// Drawn height.
    pub height: f64,
}

impl Placement {
    /// Place a `width` x `height` pixel image according to `layout`.
    pub fn compute(layout: &PageLayout, width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        match *layout {
            PageLayout::ImageSize => Self {
                page_width: w,
                page_height: h,
                x: 0.0,
                y: 0.0,
                width: w,
                height: h,
            },
            PageLayout::Fixed { size, margin } => {
                let available_w = (size.width - 2.0 * margin).max(0.0);
                let available_h = (size.height - 2.0 * margin).max(0.0);
                let scale = (available_w / w).min(available_h / h);
                let (drawn_w, drawn_h) = (w * scale, h * scale);
                Self {
                    page_width: size.width,
                    page_height: size.height,
                    x: (size.width - drawn_w) / 2.0,
                    y: (size.height - drawn_h) / 2.0,
                    width: drawn_w,
                    height: drawn_h,
                }
            }
        }
    }

    /// Content stream painting the image resource into this box.
    pub fn content_stream(&self) -> Vec<u8> {
        format!(
            "q {} 0 0 {} {} {} cm /{IMAGE_RESOURCE} Do Q\n",
            format_real(self.width),
            format_real(self.height),
            format_real(self.x),
            format_real(self.y)
        )
        .into_bytes()
    }
}

/// Builds single-page documents around one image.
#[derive(Debug, Clone, Default)]
pub struct ImageWrapper {
    layout: PageLayout,
    metadata: Metadata,
}

impl ImageWrapper {
    /// Create a wrapper placing images according to `layout`.
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            metadata: Metadata::default(),
        }
    }

    /// Set the document information written to the output.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Read `path` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing or unreadable
    /// - The bytes are not a supported PNG or JPEG
    pub fn wrap_file(&self, path: &Path) -> Result<Document> {
        let data = read_source(path)?;
        self.wrap_bytes(path, data)
    }

    /// Wrap already-read image bytes; `path` is used in error messages.
    pub fn wrap_bytes(&self, path: &Path, data: Vec<u8>) -> Result<Document> {
        let unsupported = |e: FormatError| PdfStitchError::unsupported_image(path.to_path_buf(), e.to_string());

        let format = sniff(&data).ok_or_else(|| {
            PdfStitchError::unsupported_image(path.to_path_buf(), "not a PNG or JPEG file")
        })?;
        let embedded = match format {
            ImageFormat::Jpeg => EmbeddedImage {
                image: jpeg::to_xobject(data).map_err(unsupported)?,
                smask: None,
            },
            ImageFormat::Png => png::to_xobject(&data).map_err(unsupported)?,
        };

        let EmbeddedImage { mut image, smask } = embedded;
        let placement = Placement::compute(&self.layout, image.width, image.height);
        debug!(
            "{}: {format} {}x{} placed at {:?}",
            path.display(),
            image.width,
            image.height,
            placement
        );

        let mut doc = Document::new();
        let parent = doc.pages_root();
        let mut builder = doc.builder();
        if let Some(smask) = smask {
            image.smask = Some(builder.new_image_xobject(smask)?);
        }
        let xobject = builder.new_image_xobject(image)?;
        let content = builder.new_content_stream(placement.content_stream());
        let page = builder.new_page(
            parent,
            (placement.page_width, placement.page_height),
            content,
            &[(Name::from(IMAGE_RESOURCE), xobject)],
        );
        doc.add_page(page)?;
        doc.set_info(&self.metadata);

        info!("Wrapped {} as a single {format} page", path.display());
        Ok(doc)
    }
}

/// Wrap one image file with the given layout.
///
/// Convenience function equivalent to `ImageWrapper::new(layout).wrap_file(path)`.
pub fn wrap_image_file(path: &Path, layout: PageLayout) -> Result<Document> {
    ImageWrapper::new(layout).wrap_file(path)
}
