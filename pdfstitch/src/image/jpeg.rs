//! JPEG embedding.
//!
//! JPEG bytes are embedded untouched under `DCTDecode`; only the frame
//! header is read, for the dimensions and colour space.

use super::{FormatError, FormatResult};
use crate::builder::{ColorSpace, ImageFilter, ImageXObject};

/// Frame parameters of a JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegHeader {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of colour components.
    pub components: u8,
    /// Whether an Adobe APP14 segment was seen (inverted CMYK).
    pub adobe: bool,
}

/// Walk the marker segments up to the first frame header.
pub fn read_header(data: &[u8]) -> FormatResult<JpegHeader> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return Err(FormatError::new("missing JPEG start-of-image marker"));
    }

    let mut pos = 2;
    let mut adobe = false;
    loop {
        if data.get(pos) != Some(&0xFF) {
            return Err(FormatError::new(format!("expected a marker at byte {pos}")));
        }
        while data.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let Some(&marker) = data.get(pos) else {
            return Err(FormatError::new("file ends before the frame header"));
        };
        pos += 1;

        match marker {
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD8 => continue,
            0xD9 | 0xDA => return Err(FormatError::new("no frame header before image data")),
            _ => {}
        }

        let length = usize::from(be16(data, pos)?);
        if length < 2 {
            return Err(FormatError::new(format!("invalid segment length at byte {pos}")));
        }
        let segment = data
            .get(pos + 2..pos + length)
            .ok_or_else(|| FormatError::new("truncated marker segment"))?;

        match marker {
            0xEE if segment.starts_with(b"Adobe") => adobe = true,
            0xC3 | 0xC7 | 0xCB | 0xCF => {
                return Err(FormatError::new("lossless JPEG cannot be embedded with DCTDecode"));
            }
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return frame_header(segment, adobe);
            }
            _ => {}
        }
        pos += length;
    }
}

fn frame_header(segment: &[u8], adobe: bool) -> FormatResult<JpegHeader> {
    let &[precision, h1, h0, w1, w0, components, ..] = segment else {
        return Err(FormatError::new("truncated frame header"));
    };
    if precision != 8 {
        return Err(FormatError::new(format!(
            "{precision}-bit JPEG samples are not supported"
        )));
    }

    let height = u32::from(u16::from_be_bytes([h1, h0]));
    let width = u32::from(u16::from_be_bytes([w1, w0]));
    if width == 0 || height == 0 {
        return Err(FormatError::new(format!("invalid dimensions {width}x{height}")));
    }
    if !matches!(components, 1 | 3 | 4) {
        return Err(FormatError::new(format!("{components} colour components")));
    }

    Ok(JpegHeader {
        width,
        height,
        components,
        adobe,
    })
}

fn be16(data: &[u8], pos: usize) -> FormatResult<u16> {
    match data.get(pos..pos + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(FormatError::new("truncated marker segment")),
    }
}

/// Describe `data` as a `DCTDecode` image XObject.
pub fn to_xobject(data: Vec<u8>) -> FormatResult<ImageXObject> {
    let header = read_header(&data)?;
    let color_space = match header.components {
        1 => ColorSpace::DeviceGray,
        3 => ColorSpace::DeviceRgb,
        _ => ColorSpace::DeviceCmyk,
    };
    let decode = (header.components == 4 && header.adobe)
        .then(|| [1.0, 0.0].repeat(4));

    Ok(ImageXObject {
        width: header.width,
        height: header.height,
        bits_per_component: 8,
        color_space,
        filter: ImageFilter::DctDecode,
        decode_parms: None,
        decode,
        smask: None,
        data,
    })
}
