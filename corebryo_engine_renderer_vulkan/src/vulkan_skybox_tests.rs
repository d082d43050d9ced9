//! Unit tests for the cubemap staging layout

use super::*;
use corebryo_engine::glam::Vec3;

fn faces(size: u32) -> CubemapFaces {
    let image = HdrImage::from_pixels(4, 2, vec![Vec3::splat(0.5); 8]).expect("valid image");
    build_faces(&image, size).expect("faces")
}

#[test]
fn test_one_region_per_face() {
    let faces = faces(8);
    let regions = face_copy_regions(&faces);

    assert_eq!(regions.len(), 6);
    for (face, region) in regions.iter().enumerate() {
        assert_eq!(region.image_subresource.base_array_layer, face as u32);
        assert_eq!(region.image_subresource.layer_count, 1);
        assert_eq!(region.image_extent.width, 8);
        assert_eq!(region.image_extent.height, 8);
        assert_eq!(region.image_extent.depth, 1);
    }
}

#[test]
fn test_region_offsets_follow_face_size() {
    let faces = faces(16);
    let regions = face_copy_regions(&faces);

    // 16 * 16 texels of 8 bytes each
    for (face, region) in regions.iter().enumerate() {
        assert_eq!(region.buffer_offset, face as u64 * 16 * 16 * 8);
    }
    let last = &regions[5];
    assert_eq!(last.buffer_offset + faces.face_bytes(), faces.as_bytes().len() as u64);
}

#[test]
fn test_rows_are_tightly_packed() {
    let regions = face_copy_regions(&faces(4));
    assert!(regions.iter().all(|r| r.buffer_row_length == 0 && r.buffer_image_height == 0));
}
