//! Skybox asset pipeline
//!
//! Radiance HDR decoding, equirectangular to cubemap conversion and the
//! `skyboxes.txt` catalog. GPU upload lives in the backend.

mod assets;
mod catalog;
mod cubemap;
mod hdr;

pub use assets::{find_file_in_tree, locate_assets_root, locate_assets_root_from, ASSETS_READY_DIR};
pub use catalog::{SkyboxCatalog, SkyboxEntry, CATALOG_FILE_NAME, DEFAULT_FACE_SIZE};
pub use cubemap::{
    build_faces, direction_to_equirect, face_direction, float_to_half,
    CubemapFaces, CUBEMAP_TEXEL_BYTES, CUBE_FACE_COUNT,
};
pub use hdr::{rgbe_to_linear, HdrImage};
