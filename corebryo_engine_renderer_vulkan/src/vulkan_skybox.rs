/// Skybox - cubemap upload, catalog selection and the sky vertex buffer
///
/// The HDR is decoded and converted to six faces on the CPU by the core crate;
/// this module owns the GPU side: a staging copy into a 6-layer cube image and
/// the descriptor set the sky pipeline samples.

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::corebryo::render::{BufferHandle, Extent2D, SKYBOX_VERTICES};
use corebryo_engine::corebryo::skybox::{
    build_faces, CubemapFaces, HdrImage, SkyboxCatalog, SkyboxEntry, CUBE_FACE_COUNT,
};
use corebryo_engine::{engine_error, engine_info};
use ash::vk;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::vulkan_attachments::{AllocatedImage, ImageDesc, Sampler};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_set::{DescriptorSet, DescriptorSetLayout};

/// Texel format of uploaded cubemaps (RGBA half floats)
pub const CUBEMAP_FORMAT: vk::Format = vk::Format::R16G16B16A16_SFLOAT;

/// Resident cubemap: 6-layer image, cube view and sampler
pub struct Cubemap {
    sampler: Sampler,
    image: AllocatedImage,
}

impl Cubemap {
    /// Copy `faces` to a new device-local cube image, leaving it shader-readable
    pub fn upload(ctx: &Arc<GpuContext>, faces: &CubemapFaces, name: &str) -> Result<Self> {
        let size = faces.face_size();
        let image = AllocatedImage::new(
            Arc::clone(ctx),
            &ImageDesc {
                extent: Extent2D::new(size, size),
                format: CUBEMAP_FORMAT,
                samples: vk::SampleCountFlags::TYPE_1,
                usage: vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
                aspect: vk::ImageAspectFlags::COLOR,
                array_layers: CUBE_FACE_COUNT,
                flags: vk::ImageCreateFlags::CUBE_COMPATIBLE,
                view_type: vk::ImageViewType::CUBE,
            },
            name,
        )?;

        let staging = Buffer::with_data(
            Arc::clone(ctx),
            faces.as_bytes(),
            vk::BufferUsageFlags::TRANSFER_SRC,
            "skybox_staging",
        )?;

        let regions = face_copy_regions(faces);
        let whole_cube = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: CUBE_FACE_COUNT,
        };

        ctx.immediate_submit(|command_buffer| unsafe {
            let to_transfer = vk::ImageMemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image.image)
                .subresource_range(whole_cube);

            ctx.device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            ctx.device.cmd_copy_buffer_to_image(
                command_buffer,
                staging.buffer,
                image.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &regions,
            );

            let to_shader_read = vk::ImageMemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ)
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image.image)
                .subresource_range(whole_cube);

            ctx.device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_shader_read],
            );
        })?;

        let sampler_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .max_anisotropy(1.0)
            .max_lod(1.0);
        let sampler = Sampler::new(Arc::clone(ctx), &sampler_info, "skybox_sampler")?;

        Ok(Self { sampler, image })
    }

    pub fn face_size(&self) -> u32 {
        self.image.extent().width
    }
}

/// One buffer-to-image copy per face, faces laid out back to back in the staging buffer
fn face_copy_regions(faces: &CubemapFaces) -> Vec<vk::BufferImageCopy> {
    let size = faces.face_size();
    (0..CUBE_FACE_COUNT)
        .map(|face| vk::BufferImageCopy {
            buffer_offset: faces.face_offset(face),
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: face,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D { width: size, height: size, depth: 1 },
        })
        .collect()
}

// ============================================================================
// SkyboxResources
// ============================================================================

/// Catalog, active cubemap and the GPU objects the sky pipeline binds
///
/// Fields drop in order: cubemap, descriptor set, layout, vertex buffer.
pub struct SkyboxResources {
    cubemap: Option<Cubemap>,
    descriptor_set: DescriptorSet,
    layout: DescriptorSetLayout,
    vertex_buffer: Buffer,
    catalog: SkyboxCatalog,
    assets_root: PathBuf,
    active: Option<String>,
    ctx: Arc<GpuContext>,
}

impl SkyboxResources {
    /// Load the catalog found under `assets_root` and upload its default entry
    pub fn new(ctx: &Arc<GpuContext>, assets_root: &Path) -> Result<Self> {
        let catalog = SkyboxCatalog::discover(assets_root).map_err(|e| {
            engine_error!("corebryo::vulkan", "Skybox catalog unavailable: {}", e);
            e
        })?;

        let layout = DescriptorSetLayout::skybox(Arc::clone(ctx))?;
        let descriptor_set = DescriptorSet::new(Arc::clone(ctx), &layout, "skybox")?;
        let vertex_buffer = Buffer::with_data(
            Arc::clone(ctx),
            bytemuck::cast_slice(&SKYBOX_VERTICES),
            vk::BufferUsageFlags::VERTEX_BUFFER,
            "skybox_vertices",
        )?;

        let mut resources = Self {
            cubemap: None,
            descriptor_set,
            layout,
            vertex_buffer,
            catalog,
            assets_root: assets_root.to_path_buf(),
            active: None,
            ctx: Arc::clone(ctx),
        };

        let default_entry = resources.catalog.default_entry().clone();
        resources.activate(&default_entry)?;
        Ok(resources)
    }

    /// Switch to the catalog entry `name`, replacing the resident cubemap
    ///
    /// Waits for the device to go idle before the old cubemap is released.
    pub fn set_active_skybox(&mut self, name: &str) -> Result<()> {
        let entry = self.catalog.get(name).cloned().ok_or_else(|| {
            engine_error!("corebryo::vulkan", "Unknown skybox '{}'", name);
            Error::Catalog(format!("Unknown skybox '{}'", name))
        })?;

        self.activate(&entry)
    }

    fn activate(&mut self, entry: &SkyboxEntry) -> Result<()> {
        let image = HdrImage::load(&entry.hdr_path).map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to load skybox '{}' from {}: {}", entry.name, entry.hdr_path.display(), e);
            e
        })?;
        let faces = build_faces(&image, entry.size)?;

        self.ctx.wait_idle()?;
        self.cubemap = None;

        let cubemap = Cubemap::upload(&self.ctx, &faces, &entry.name)?;
        self.descriptor_set.write_combined_image_sampler(
            0,
            cubemap.image.view,
            cubemap.sampler.sampler,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        self.cubemap = Some(cubemap);
        self.active = Some(entry.name.clone());

        engine_info!(
            "corebryo::vulkan",
            "Skybox '{}' active ({}x{} from {}x{} HDR)",
            entry.name,
            entry.size,
            entry.size,
            image.width(),
            image.height()
        );
        Ok(())
    }

    pub fn active_skybox_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.cubemap.is_some()
    }

    pub fn catalog(&self) -> &SkyboxCatalog {
        &self.catalog
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    pub fn layout(&self) -> &DescriptorSetLayout {
        &self.layout
    }

    /// Set bound by the sky pipeline, once a cubemap is resident
    pub fn descriptor_set(&self) -> Option<vk::DescriptorSet> {
        self.cubemap.as_ref().map(|_| self.descriptor_set.set)
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer.handle()
    }
}

#[cfg(test)]
#[path = "vulkan_skybox_tests.rs"]
mod tests;
