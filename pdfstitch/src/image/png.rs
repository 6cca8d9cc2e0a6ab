//! PNG embedding.
//!
//! PNGs are decoded with the `image` crate under an allocation limit,
//! converted to 8 bits per component and re-deflated. An alpha channel is
//! split off into a separate `/SMask` image.

use std::io::Cursor;

use ::image::{DynamicImage, ImageFormat, ImageReader, Limits};

use super::{EmbeddedImage, FormatError, FormatResult};
use crate::builder::{ColorSpace, ImageFilter, ImageXObject};
use crate::filters::flate_encode;

/// The 8-byte PNG signature.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Upper bound on the decoded sample buffer.
const MAX_DECODED_BYTES: u64 = 512 * 1024 * 1024;

/// Decode a PNG and describe it as an image XObject plus an optional soft mask.
pub fn to_xobject(data: &[u8]) -> FormatResult<EmbeddedImage> {
    if !data.starts_with(&SIGNATURE) {
        return Err(FormatError::new("missing PNG signature"));
    }
    let decoded = decode(data)?;
    let (width, height) = (decoded.width(), decoded.height());
    let color = decoded.color();

    let (color_space, samples, alpha) = match (color.has_color(), color.has_alpha()) {
        (false, false) => (ColorSpace::DeviceGray, decoded.into_luma8().into_raw(), None),
        (true, false) => (ColorSpace::DeviceRgb, decoded.into_rgb8().into_raw(), None),
        (false, true) => {
            let (gray, alpha) = split_alpha(&decoded.into_luma_alpha8().into_raw(), 2);
            (ColorSpace::DeviceGray, gray, Some(alpha))
        }
        (true, true) => {
            let (rgb, alpha) = split_alpha(&decoded.into_rgba8().into_raw(), 4);
            (ColorSpace::DeviceRgb, rgb, Some(alpha))
        }
    };

    let plane = |color_space: ColorSpace, samples: &[u8]| -> FormatResult<ImageXObject> {
        let data = flate_encode(samples)
            .map_err(|e| FormatError::new(format!("cannot deflate samples: {e}")))?;
        Ok(ImageXObject {
            width,
            height,
            bits_per_component: 8,
            color_space,
            filter: ImageFilter::FlateDecode,
            decode_parms: None,
            decode: None,
            smask: None,
            data,
        })
    };

    let image = plane(color_space, &samples)?;
    let smask = alpha
        .map(|alpha| plane(ColorSpace::DeviceGray, &alpha))
        .transpose()?;
    Ok(EmbeddedImage { image, smask })
}

fn decode(data: &[u8]) -> FormatResult<DynamicImage> {
    let mut reader = ImageReader::with_format(Cursor::new(data), ImageFormat::Png);
    let mut limits = Limits::default();
    limits.max_alloc = Some(MAX_DECODED_BYTES);
    reader.limits(limits);
    reader
        .decode()
        .map_err(|e| FormatError::new(format!("cannot decode PNG: {e}")))
}

/// Split interleaved samples whose last channel is alpha.
fn split_alpha(samples: &[u8], channels: usize) -> (Vec<u8>, Vec<u8>) {
    let pixels = samples.len() / channels;
    let mut color = Vec::with_capacity(pixels * (channels - 1));
    let mut alpha = Vec::with_capacity(pixels);
    for pixel in samples.chunks_exact(channels) {
        color.extend_from_slice(&pixel[..channels - 1]);
        alpha.push(pixel[channels - 1]);
    }
    (color, alpha)
}
