use super::*;

/// Encode `rows` of RGBE pixels as literal-only RLE scanlines
fn encode_hdr(width: u32, rows: &[Vec<[u8; 4]>]) -> Vec<u8> {
    let mut bytes = format!(
        "#?RADIANCE\nFORMAT={}\nEXPOSURE=1.0\n\n-Y {} +X {}\n",
        FORMAT_TAG,
        rows.len(),
        width
    )
    .into_bytes();

    for row in rows {
        bytes.extend_from_slice(&[2, 2, (width >> 8) as u8, (width & 0xFF) as u8]);
        for channel in 0..4 {
            bytes.push(width as u8);
            bytes.extend(row.iter().map(|px| px[channel]));
        }
    }
    bytes
}

// ============================================================================
// RGBE conversion
// ============================================================================

#[test]
fn test_rgbe_zero_exponent_is_black() {
    assert_eq!(rgbe_to_linear([255, 255, 255, 0]), Vec3::ZERO);
}

#[test]
fn test_rgbe_scale() {
    // 2^(129 - 136) = 1/128
    let c = rgbe_to_linear([128, 64, 0, 129]);
    assert_eq!(c, Vec3::new(128.5 / 128.0, 64.5 / 128.0, 0.5 / 128.0));
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_decode_literal_scanlines() {
    let rows = vec![
        vec![[128, 0, 0, 129], [0, 128, 0, 129], [0, 0, 128, 129]],
        vec![[0, 0, 0, 0], [255, 255, 255, 136], [1, 2, 3, 128]],
    ];
    let image = HdrImage::decode(&encode_hdr(3, &rows)).expect("decode");

    assert_eq!(image.width(), 3);
    assert_eq!(image.height(), 2);
    assert_eq!(image.pixels().len(), 6);
    assert_eq!(image.pixel(0, 0), rgbe_to_linear([128, 0, 0, 129]));
    assert_eq!(image.pixel(1, 1), Vec3::splat(255.5));
    assert_eq!(image.pixel(0, 1), Vec3::ZERO);
}

#[test]
fn test_decode_run_length_planes() {
    let mut bytes = format!("FORMAT={}\n\n+X 4 -Y 1\n", FORMAT_TAG).into_bytes();
    bytes.extend_from_slice(&[2, 2, 0, 4]);
    // R: run of 4 x 10, G: literal 2 + run 2, B: run of 4 x 0, E: run of 4 x 136
    bytes.extend_from_slice(&[128 + 4, 10]);
    bytes.extend_from_slice(&[2, 7, 8, 128 + 2, 9]);
    bytes.extend_from_slice(&[128 + 4, 0]);
    bytes.extend_from_slice(&[128 + 4, 136]);

    let image = HdrImage::decode(&bytes).expect("decode");
    assert_eq!(image.width(), 4);
    assert_eq!(image.pixel(0, 0), Vec3::new(10.5, 7.5, 0.5));
    assert_eq!(image.pixel(3, 0), Vec3::new(10.5, 9.5, 0.5));
}

#[test]
fn test_decode_rejects_missing_format() {
    let bytes = b"#?RADIANCE\n\n-Y 1 +X 1\n".to_vec();
    assert!(matches!(HdrImage::decode(&bytes), Err(Error::ImageDecode(_))));
}

#[test]
fn test_decode_rejects_bad_resolution() {
    let bytes = format!("FORMAT={}\n\n+Y 1 +X 1\n", FORMAT_TAG).into_bytes();
    assert!(matches!(HdrImage::decode(&bytes), Err(Error::ImageDecode(_))));
}

#[test]
fn test_decode_rejects_flat_scanline() {
    let mut bytes = format!("FORMAT={}\n\n-Y 1 +X 2\n", FORMAT_TAG).into_bytes();
    bytes.extend_from_slice(&[1, 1, 1, 0, 1, 1, 1, 0]);
    assert!(HdrImage::decode(&bytes).is_err());
}

#[test]
fn test_decode_rejects_width_mismatch() {
    let rows = vec![vec![[1, 1, 1, 128]; 2]];
    let mut bytes = encode_hdr(2, &rows);
    let header_end = bytes.len() - (4 + 4 * 3);
    bytes[header_end + 3] = 3;
    assert!(HdrImage::decode(&bytes).is_err());
}

#[test]
fn test_decode_rejects_truncated_data() {
    let rows = vec![vec![[1, 1, 1, 128]; 3]];
    let mut bytes = encode_hdr(3, &rows);
    bytes.truncate(bytes.len() - 2);
    assert!(HdrImage::decode(&bytes).is_err());
}

#[test]
fn test_decode_rejects_header_larger_than_data() {
    let bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 4000000000 +X 32767\n";
    let result = HdrImage::decode(bytes);
    assert!(matches!(result, Err(Error::ImageDecode(msg)) if msg.contains("too short")));
}

#[test]
fn test_minimum_encoded_length() {
    // One maximal run per plane
    assert_eq!(min_encoded_len(127, 1), 4 + 8);
    assert_eq!(min_encoded_len(128, 2), 2 * (4 + 16));

    // A fully run-length coded image passes the size check
    let width = 200u32;
    let mut bytes = format!("#?RADIANCE\nFORMAT={}\n\n-Y 1 +X {}\n", FORMAT_TAG, width).into_bytes();
    bytes.extend_from_slice(&[2, 2, 0, width as u8]);
    for value in [10u8, 20, 30, 128] {
        bytes.extend_from_slice(&[128 + 127, value, 128 + 73, value]);
    }
    let image = HdrImage::decode(&bytes).expect("decode");
    assert_eq!(image.pixels().len(), width as usize);
}

#[test]
fn test_load_missing_file() {
    let result = HdrImage::load("definitely/not/here.hdr");
    assert!(matches!(result, Err(Error::ImageDecode(msg)) if msg.contains("Failed to open")));
}

// ============================================================================
// Sampling
// ============================================================================

fn gradient() -> HdrImage {
    // 3x2: red ramps along x, green marks the bottom row
    let pixels = vec![
        Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 0.0),
    ];
    HdrImage::from_pixels(3, 2, pixels).expect("image")
}

#[test]
fn test_from_pixels_checks_size() {
    assert!(HdrImage::from_pixels(2, 2, vec![Vec3::ZERO; 3]).is_err());
    assert!(HdrImage::from_pixels(0, 0, Vec::new()).is_err());
}

#[test]
fn test_sample_bilinear_interpolates() {
    let image = gradient();
    let c = image.sample_bilinear(0.25, 0.5);
    assert!((c - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-6);
}

#[test]
fn test_sample_bilinear_clamps_v_and_wraps_u() {
    let image = gradient();
    assert_eq!(image.sample_bilinear(0.0, -3.0), image.pixel(0, 0));
    assert_eq!(image.sample_bilinear(0.0, 7.0), image.pixel(0, 1));
    assert_eq!(image.sample_bilinear(1.5, 0.0), image.sample_bilinear(0.5, 0.0));
}
