/// Radiance HDR (RGBE) decoder
///
/// Only the new-style run-length encoded format is accepted: every scanline
/// starts with `2 2 hi lo` followed by four run-length coded channel planes.

use std::path::Path;
use glam::Vec3;
use crate::error::{Error, Result};

const FORMAT_TAG: &str = "32-bit_rle_rgbe";
/// Widest scanline the RLE header can describe
const MAX_SCANLINE_WIDTH: u32 = 0x7FFF;
/// Longest run a single count byte can encode
const MAX_RUN: u64 = 127;

/// Linear float RGB image, rows top to bottom
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl HdrImage {
    /// Build from raw pixels, `pixels.len()` must equal `width * height`
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec3>) -> Result<Self> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return Err(Error::ImageDecode(format!(
                "{} pixels do not fill a {}x{} image",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, pixels })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::ImageDecode(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::decode(&bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        // Header block ends at the first empty line
        let mut format_ok = false;
        loop {
            let line = reader.line().ok_or_else(|| decode_error("Truncated header"))?;
            if line.is_empty() {
                break;
            }
            if line.starts_with("FORMAT=") && line.contains(FORMAT_TAG) {
                format_ok = true;
            }
        }
        if !format_ok {
            return Err(decode_error("Unsupported HDR format"));
        }

        let resolution = reader.line().ok_or_else(|| decode_error("Missing resolution line"))?;
        let (width, height) = parse_resolution(&resolution)
            .ok_or_else(|| Error::ImageDecode(format!("Invalid HDR resolution '{}'", resolution)))?;
        if width > MAX_SCANLINE_WIDTH {
            return Err(Error::ImageDecode(format!("HDR width {} exceeds RLE limit", width)));
        }

        // The header alone must not size the allocation
        let needed = min_encoded_len(width, height);
        if needed > reader.remaining() as u64 {
            return Err(Error::ImageDecode(format!(
                "HDR data too short for {}x{}: {} bytes left, at least {} needed",
                width,
                height,
                reader.remaining(),
                needed
            )));
        }

        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        let mut scanline = vec![0u8; width as usize * 4];

        for _ in 0..height {
            let marker = reader.take(4).ok_or_else(|| decode_error("Truncated scanline header"))?;
            if marker[0] != 2 || marker[1] != 2 || (marker[2] & 0x80) != 0 {
                return Err(decode_error("Unsupported HDR scanline"));
            }
            let scanline_width = ((marker[2] as u32) << 8) | marker[3] as u32;
            if scanline_width != width {
                return Err(decode_error("HDR scanline width mismatch"));
            }

            decode_scanline(&mut reader, width as usize, &mut scanline)?;

            pixels.extend(scanline.chunks_exact(4).map(|rgbe| rgbe_to_linear([rgbe[0], rgbe[1], rgbe[2], rgbe[3]])));
        }

        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Bilinear lookup on normalized coordinates; `u` wraps, `v` clamps
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Vec3 {
        let u = u - u.floor();
        let v = v.clamp(0.0, 1.0);

        let x = u * (self.width - 1) as f32;
        let y = v * (self.height - 1) as f32;

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1) % self.width;
        let y1 = (y0 + 1).min(self.height - 1);

        let tx = x - x0 as f32;
        let ty = y - y0 as f32;

        let top = self.pixel(x0, y0).lerp(self.pixel(x1, y0), tx);
        let bottom = self.pixel(x0, y1).lerp(self.pixel(x1, y1), tx);
        top.lerp(bottom, ty)
    }
}

/// `(c + 0.5) * 2^(e - 136)`, zero exponent is black
pub fn rgbe_to_linear(rgbe: [u8; 4]) -> Vec3 {
    let e = rgbe[3];
    if e == 0 {
        return Vec3::ZERO;
    }
    let scale = 2f32.powi(e as i32 - (128 + 8));
    Vec3::new(
        (rgbe[0] as f32 + 0.5) * scale,
        (rgbe[1] as f32 + 0.5) * scale,
        (rgbe[2] as f32 + 0.5) * scale,
    )
}

/// Accepts `-Y h +X w` and `+X w -Y h`
fn parse_resolution(line: &str) -> Option<(u32, u32)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (width, height) = match tokens.as_slice() {
        ["-Y", h, "+X", w] => (w.parse::<u32>().ok()?, h.parse::<u32>().ok()?),
        ["+X", w, "-Y", h] => (w.parse::<u32>().ok()?, h.parse::<u32>().ok()?),
        _ => return None,
    };
    (width > 0 && height > 0).then_some((width, height))
}

/// Smallest byte count `height` RLE scanlines of `width` pixels can take:
/// the 4-byte marker plus four planes made only of maximal runs
fn min_encoded_len(width: u32, height: u32) -> u64 {
    let runs_per_plane = (width as u64).div_ceil(MAX_RUN);
    height as u64 * (4 + 4 * 2 * runs_per_plane)
}

/// Decode four channel planes into interleaved RGBE
fn decode_scanline(reader: &mut ByteReader<'_>, width: usize, out: &mut [u8]) -> Result<()> {
    for channel in 0..4 {
        let mut x = 0usize;
        while x < width {
            let count = reader.byte().ok_or_else(|| decode_error("Truncated scanline"))?;
            if count > 128 {
                let run = (count - 128) as usize;
                let value = reader.byte().ok_or_else(|| decode_error("Truncated scanline"))?;
                if x + run > width {
                    return Err(decode_error("HDR run overflows scanline"));
                }
                for _ in 0..run {
                    out[4 * x + channel] = value;
                    x += 1;
                }
            } else {
                let literal = count as usize;
                if literal == 0 || x + literal > width {
                    return Err(decode_error("Bad HDR literal count"));
                }
                let values = reader.take(literal).ok_or_else(|| decode_error("Truncated scanline"))?;
                for &value in values {
                    out[4 * x + channel] = value;
                    x += 1;
                }
            }
        }
    }
    Ok(())
}

fn decode_error(message: &str) -> Error {
    Error::ImageDecode(message.to_string())
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let slice = self.bytes.get(self.pos..self.pos + n)?;
        self.pos += n;
        Some(slice)
    }

    /// Next `\n`-terminated line without the terminator (and a trailing `\r`)
    fn line(&mut self) -> Option<String> {
        let rest = self.bytes.get(self.pos..)?;
        if rest.is_empty() {
            return None;
        }
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        let mut line = &rest[..end];
        self.pos += (end + 1).min(rest.len());
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        Some(String::from_utf8_lossy(line).into_owned())
    }
}

#[cfg(test)]
#[path = "hdr_tests.rs"]
mod tests;
