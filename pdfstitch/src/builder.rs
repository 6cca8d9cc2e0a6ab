//! Construction of document-level objects from higher-level requests.
//!
//! [`ContentBuilder`] translates intents such as "a page of this size showing
//! that content" into dictionaries registered in an [`ObjectStore`]. It is the
//! only place that knows the key layout of catalogs, page nodes, content
//! streams and image XObjects.

use std::fmt;

use crate::config::Metadata;
use crate::dictionary;
use crate::error::{PdfStitchError, Result};
use crate::filters::has_zlib_header;
use crate::object::{Dictionary, Name, ObjectNumber, ObjectStore, Stream, Value};

/// Producer string written to the document information dictionary.
pub const PRODUCER: &str = concat!("pdfstitch ", env!("CARGO_PKG_VERSION"));

/// Encoding applied to an image XObject payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// Baseline or progressive JPEG bytes.
    DctDecode,
    /// zlib stream of (optionally predicted) samples.
    FlateDecode,
    /// Raw, unencoded samples.
    None,
}

impl ImageFilter {
    fn pdf_name(self) -> Option<&'static str> {
        match self {
            Self::DctDecode => Some("DCTDecode"),
            Self::FlateDecode => Some("FlateDecode"),
            Self::None => None,
        }
    }
}

impl fmt::Display for ImageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pdf_name().unwrap_or("None"))
    }
}

/// Colour space of an image XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpace {
    /// One grey component.
    DeviceGray,
    /// Three RGB components.
    DeviceRgb,
    /// Four CMYK components.
    DeviceCmyk,
    /// Palette lookup into a base space.
    Indexed {
        /// Space the palette entries live in.
        base: Box<ColorSpace>,
        /// Highest valid index.
        hival: u8,
        /// `(hival + 1) * base components` bytes.
        lookup: Vec<u8>,
    },
}

impl ColorSpace {
    /// Number of components per sample in the image data.
    pub fn components(&self) -> usize {
        match self {
            Self::DeviceGray | Self::Indexed { .. } => 1,
            Self::DeviceRgb => 3,
            Self::DeviceCmyk => 4,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::DeviceGray => Value::name("DeviceGray"),
            Self::DeviceRgb => Value::name("DeviceRGB"),
            Self::DeviceCmyk => Value::name("DeviceCMYK"),
            Self::Indexed {
                base,
                hival,
                lookup,
            } => Value::Array(vec![
                Value::name("Indexed"),
                base.to_value(),
                Value::Integer(i64::from(*hival)),
                Value::String(lookup.clone(), crate::object::StringFormat::Hex),
            ]),
        }
    }
}

/// Everything needed to register an image XObject.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Width in samples.
    pub width: u32,
    /// Height in samples.
    pub height: u32,
    /// Bits per colour component.
    pub bits_per_component: u8,
    /// Colour space of the samples.
    pub color_space: ColorSpace,
    /// Encoding of `data`.
    pub filter: ImageFilter,
    /// Optional `/DecodeParms` for the filter.
    pub decode_parms: Option<Dictionary>,
    /// Optional `/Decode` array.
    pub decode: Option<Vec<f64>>,
    /// Optional soft mask image.
    pub smask: Option<ObjectNumber>,
    /// Encoded payload.
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Reject payloads whose bytes cannot be what `filter` claims.
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PdfStitchError::other(format!(
                "image has invalid dimensions {}x{}",
                self.width, self.height
            )));
        }

        if ![1, 2, 4, 8, 16].contains(&self.bits_per_component) {
            return Err(PdfStitchError::other(format!(
                "unsupported bits per component: {}",
                self.bits_per_component
            )));
        }

        if let ColorSpace::Indexed {
            base,
            hival,
            lookup,
        } = &self.color_space
        {
            let expected = (usize::from(*hival) + 1) * base.components();
            if lookup.len() < expected {
                return Err(PdfStitchError::other(format!(
                    "palette has {} bytes, expected {expected}",
                    lookup.len()
                )));
            }
        }

        let data = self.data.as_slice();
        let looks_like_jpeg = data.starts_with(&[0xFF, 0xD8, 0xFF]);

        match self.filter {
            ImageFilter::DctDecode => {
                if !looks_like_jpeg {
                    return Err(PdfStitchError::filter_mismatch(
                        self.filter.to_string(),
                        "payload does not start with a JPEG SOI marker",
                    ));
                }
                if self.bits_per_component != 8 {
                    return Err(PdfStitchError::filter_mismatch(
                        self.filter.to_string(),
                        "JPEG images must use 8 bits per component",
                    ));
                }
                if matches!(self.color_space, ColorSpace::Indexed { .. }) {
                    return Err(PdfStitchError::filter_mismatch(
                        self.filter.to_string(),
                        "JPEG images cannot use an indexed colour space",
                    ));
                }
            }
            ImageFilter::FlateDecode => {
                if !has_zlib_header(data) {
                    return Err(PdfStitchError::filter_mismatch(
                        self.filter.to_string(),
                        "payload is not a zlib stream",
                    ));
                }
            }
            ImageFilter::None => {
                let bits_per_row = self.width as usize
                    * self.color_space.components()
                    * usize::from(self.bits_per_component);
                let expected = bits_per_row.div_ceil(8) * self.height as usize;
                if data.len() != expected {
                    return Err(PdfStitchError::filter_mismatch(
                        self.filter.to_string(),
                        format!(
                            "raw samples are {} bytes, expected {expected}",
                            data.len()
                        ),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Registers catalog, page tree, content and image objects in a store.
pub struct ContentBuilder<'a> {
    store: &'a mut ObjectStore,
}

impl<'a> ContentBuilder<'a> {
    /// Wrap a store.
    pub fn new(store: &'a mut ObjectStore) -> Self {
        Self { store }
    }

    /// Register a `/Catalog` pointing at `pages`.
    pub fn new_catalog(&mut self, pages: ObjectNumber) -> ObjectNumber {
        self.store.register(dictionary! {
            "Type" => Value::name("Catalog"),
            "Pages" => Value::Reference(pages),
        })
    }

    /// Register a flat `/Pages` node; `/Count` is the number of kids.
    pub fn new_pages_node(&mut self, kids: &[ObjectNumber]) -> ObjectNumber {
        self.store.register(Self::pages_node(kids))
    }

    /// Dictionary of a flat `/Pages` node listing `kids` in order.
    pub fn pages_node(kids: &[ObjectNumber]) -> Dictionary {
        dictionary! {
            "Type" => Value::name("Pages"),
            "Kids" => kids.iter().map(|kid| Value::Reference(*kid)).collect::<Vec<_>>(),
            "Count" => kids.len() as i64,
        }
    }

    /// Register a `/Page` of `media_box` (width, height) points.
    ///
    /// `resources` maps XObject names used by the content stream to the
    /// registered XObjects.
    pub fn new_page(
        &mut self,
        parent: ObjectNumber,
        media_box: (f64, f64),
        content: ObjectNumber,
        resources: &[(Name, ObjectNumber)],
    ) -> ObjectNumber {
        let mut resource_dict = Dictionary::new();
        if !resources.is_empty() {
            resource_dict.set(
                "ProcSet",
                vec![
                    Value::name("PDF"),
                    Value::name("ImageB"),
                    Value::name("ImageC"),
                    Value::name("ImageI"),
                ],
            );
            let xobjects: Dictionary = resources
                .iter()
                .map(|(name, number)| (name.clone(), Value::Reference(*number)))
                .collect();
            resource_dict.set("XObject", xobjects);
        }

        let (width, height) = media_box;
        self.store.register(dictionary! {
            "Type" => Value::name("Page"),
            "Parent" => Value::Reference(parent),
            "MediaBox" => vec![
                Value::Integer(0),
                Value::Integer(0),
                number_value(width),
                number_value(height),
            ],
            "Resources" => resource_dict,
            "Contents" => Value::Reference(content),
        })
    }

    /// Register a content stream whose `/Length` is the exact payload length.
    pub fn new_content_stream(&mut self, operations: Vec<u8>) -> ObjectNumber {
        self.store.register(Stream::new(Dictionary::new(), operations))
    }

    /// Register an image XObject after checking the payload matches its filter.
    pub fn new_image_xobject(&mut self, image: ImageXObject) -> Result<ObjectNumber> {
        image.validate()?;

        let mut dict = dictionary! {
            "Type" => Value::name("XObject"),
            "Subtype" => Value::name("Image"),
            "Width" => image.width,
            "Height" => image.height,
            "ColorSpace" => image.color_space.to_value(),
            "BitsPerComponent" => i64::from(image.bits_per_component),
        };
        if let Some(filter) = image.filter.pdf_name() {
            dict.set("Filter", Value::name(filter));
        }
        if let Some(parms) = image.decode_parms {
            dict.set("DecodeParms", parms);
        }
        if let Some(decode) = image.decode {
            dict.set(
                "Decode",
                decode.into_iter().map(number_value).collect::<Vec<_>>(),
            );
        }
        if let Some(smask) = image.smask {
            dict.set("SMask", Value::Reference(smask));
        }

        Ok(self.store.register(Stream::new(dict, image.data)))
    }

    /// Register a document information dictionary.
    pub fn new_info(&mut self, metadata: &Metadata) -> ObjectNumber {
        let mut dict = Dictionary::new();
        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Keywords", &metadata.keywords),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                dict.set(key, Value::string(value.as_bytes()));
            }
        }
        dict.set("Producer", Value::string(PRODUCER));
        self.store.register(dict)
    }
}

/// Integers stay integers so page boxes read `[0 0 612 792]`.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Integer(n as i64)
    } else {
        Value::Real(n)
    }
}
