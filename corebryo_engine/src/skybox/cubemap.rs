/// Equirectangular HDR to cubemap conversion
///
/// Output is six square faces in Vulkan layer order (+X, -X, +Y, -Y, +Z, -Z),
/// each row-major RGBA half floats.

use std::f32::consts::PI;
use glam::Vec3;
use crate::error::{Error, Result};
use super::hdr::HdrImage;

pub const CUBE_FACE_COUNT: u32 = 6;
/// RGBA16F
pub const CUBEMAP_TEXEL_BYTES: u64 = 8;

/// Half-float 1.0
const HALF_ONE: u16 = 0x3C00;

/// Six converted faces ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubemapFaces {
    face_size: u32,
    texels: Vec<u16>,
}

impl CubemapFaces {
    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    /// Four half floats per texel, faces back to back
    pub fn texels(&self) -> &[u16] {
        &self.texels
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Byte size of one face
    pub fn face_bytes(&self) -> u64 {
        self.face_size as u64 * self.face_size as u64 * CUBEMAP_TEXEL_BYTES
    }

    /// Staging offset of `face`
    pub fn face_offset(&self, face: u32) -> u64 {
        face as u64 * self.face_bytes()
    }
}

/// Build six `face_size`² faces by sampling `image` along each texel direction
pub fn build_faces(image: &HdrImage, face_size: u32) -> Result<CubemapFaces> {
    if face_size == 0 {
        return Err(Error::InvalidResource("Cubemap face size must be non-zero".to_string()));
    }

    let face_pixels = face_size as usize * face_size as usize;
    let mut texels = Vec::with_capacity(face_pixels * CUBE_FACE_COUNT as usize * 4);
    let size = face_size as f32;

    for face in 0..CUBE_FACE_COUNT {
        for y in 0..face_size {
            for x in 0..face_size {
                let a = 2.0 * (x as f32 + 0.5) / size - 1.0;
                let b = 2.0 * (y as f32 + 0.5) / size - 1.0;

                let (u, v) = direction_to_equirect(face_direction(face, a, b));
                let color = image.sample_bilinear(u, v);

                texels.extend_from_slice(&[
                    float_to_half(color.x),
                    float_to_half(color.y),
                    float_to_half(color.z),
                    HALF_ONE,
                ]);
            }
        }
    }

    Ok(CubemapFaces { face_size, texels })
}

/// Unnormalized direction through face coordinate `(a, b)` in [-1, 1]²
pub fn face_direction(face: u32, a: f32, b: f32) -> Vec3 {
    match face {
        0 => Vec3::new(1.0, -b, -a),
        1 => Vec3::new(-1.0, -b, a),
        2 => Vec3::new(a, 1.0, b),
        3 => Vec3::new(a, -1.0, -b),
        4 => Vec3::new(a, -b, 1.0),
        _ => Vec3::new(-a, -b, -1.0),
    }
}

/// Longitude/latitude texture coordinates of a direction
pub fn direction_to_equirect(direction: Vec3) -> (f32, f32) {
    let dir = direction.normalize();
    let theta = dir.z.atan2(dir.x);
    let phi = dir.y.clamp(-1.0, 1.0).acos();
    ((theta + PI) / (2.0 * PI), phi / PI)
}

/// IEEE half conversion with a truncated mantissa.
/// Values too small for a subnormal flush to signed zero, overflow saturates to infinity.
pub fn float_to_half(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = (bits >> 16) & 0x8000;
    let exponent = ((bits >> 23) & 0xFF) as i32 - 127 + 15;
    let mantissa = bits & 0x7F_FFFF;

    if exponent <= 0 {
        if exponent < -10 {
            return sign as u16;
        }
        let mantissa = mantissa | 0x80_0000;
        let shift = (1 - exponent) as u32;
        return (sign | (mantissa >> (shift + 13))) as u16;
    }

    if exponent >= 31 {
        return (sign | 0x7C00) as u16;
    }

    (sign | ((exponent as u32) << 10) | (mantissa >> 13)) as u16
}

#[cfg(test)]
#[path = "cubemap_tests.rs"]
mod tests;
