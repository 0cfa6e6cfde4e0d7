//! Image resolution (dpi) from file headers.
//!
//! The format is detected from the leading magic bytes, not the extension:
//!
//! | Format | Source of the resolution |
//! |--------|--------------------------|
//! | TIFF   | `XResolution`, `YResolution`, `ResolutionUnit` tags |
//! | PNG    | `pHYs` chunk (only when the unit is the meter) |
//! | JPEG   | JFIF `APP0` density (only dots per inch or per cm) |
//!
//! Anything else, or a header without a usable resolution, yields `None`.
//! All functions here block and belong inside `spawn_blocking`.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tiff::decoder::ifd::Value;
use tiff::tags::Tag;

const PNG_SIGNATURE: [u8; 4] = [0x89, b'P', b'N', b'G'];
const TIFF_LE: [u8; 4] = [b'I', b'I', 0x2A, 0x00];
const TIFF_BE: [u8; 4] = [b'M', b'M', 0x00, 0x2A];
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_APP0: [u8; 2] = [0xFF, 0xE0];

const INCH_PER_METER: f64 = 0.0254;
const CM_PER_INCH: f64 = 2.54;

/// Horizontal and vertical resolution of the image at `path`, in dpi.
pub fn read_dpi(path: &Path) -> Option<(f64, f64)> {
    let mut file = File::open(path).ok()?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).ok()?;
    file.seek(SeekFrom::Start(0)).ok()?;

    let dpi = if magic == PNG_SIGNATURE {
        png_dpi(file)
    } else if magic == TIFF_LE || magic == TIFF_BE {
        tiff_dpi(file)
    } else if magic[..2] == JPEG_SOI {
        let mut header = [0u8; 18];
        file.read_exact(&mut header).ok()?;
        jfif_dpi(&header)
    } else {
        None
    };

    dpi.filter(|(x, y)| x.is_finite() && y.is_finite() && *x > 0.0 && *y > 0.0)
}

fn png_dpi(file: File) -> Option<(f64, f64)> {
    let reader = png::Decoder::new(BufReader::new(file)).read_info().ok()?;
    let dims = reader.info().pixel_dims?;
    match dims.unit {
        png::Unit::Meter => Some((
            f64::from(dims.xppu) * INCH_PER_METER,
            f64::from(dims.yppu) * INCH_PER_METER,
        )),
        png::Unit::Unspecified => None,
    }
}

fn tiff_dpi(file: File) -> Option<(f64, f64)> {
    let mut decoder = tiff::decoder::Decoder::new(BufReader::new(file)).ok()?;
    let x = rational(decoder.find_tag(Tag::XResolution).ok()??)?;
    let y = rational(decoder.find_tag(Tag::YResolution).ok()??)?;

    // absent unit means inches
    let unit = match decoder.find_tag(Tag::ResolutionUnit).ok()? {
        Some(value) => value.into_u16().ok()?,
        None => 2,
    };
    match unit {
        2 => Some((x, y)),
        3 => Some((x * CM_PER_INCH, y * CM_PER_INCH)),
        _ => None,
    }
}

fn rational(value: Value) -> Option<f64> {
    match value {
        Value::Rational(n, d) if d != 0 => Some(f64::from(n) / f64::from(d)),
        Value::Double(v) => Some(v),
        Value::Float(v) => Some(f64::from(v)),
        _ => None,
    }
}

/// Density of a JFIF header.
///
/// `header` holds the first 18 bytes of the file:
///
/// ```text
/// FFD8 FFE0 len(2) "JFIF\0" version(2) units(1) xdensity(2) ydensity(2)
/// ```
pub(crate) fn jfif_dpi(header: &[u8]) -> Option<(f64, f64)> {
    if header.len() < 18 || header[0..2] != JPEG_SOI || header[2..4] != JPEG_APP0 {
        return None;
    }
    if &header[6..11] != b"JFIF\0" {
        return None;
    }

    let units = header[13];
    let x = f64::from(u16::from_be_bytes([header[14], header[15]]));
    let y = f64::from(u16::from_be_bytes([header[16], header[17]]));
    match units {
        1 => Some((x, y)),
        2 => Some((x * CM_PER_INCH, y * CM_PER_INCH)),
        // 0 is an aspect ratio only
        _ => None,
    }
}
