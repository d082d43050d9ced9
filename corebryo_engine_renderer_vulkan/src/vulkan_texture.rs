/// Texture - material textures and the world descriptor sets that sample them
///
/// Each texture gets its own world set (light UBO, shadow map, texture), so
/// switching textures is one descriptor bind. Slot 0 is a 1x1 white texture
/// used by untextured materials.

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::corebryo::render::{Extent2D, TextureHandle};
use corebryo_engine::{engine_debug, engine_error};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_attachments::{AllocatedImage, ImageDesc, Sampler, ShadowTarget};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_set::{DescriptorSet, DescriptorSetLayout};

/// Texel format of material textures (8-bit sRGB RGBA)
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

const WHITE_TEXEL: [u8; 4] = [255, 255, 255, 255];

/// Sampled 2D texture
pub struct Texture {
    sampler: Sampler,
    image: AllocatedImage,
}

impl Texture {
    /// Copy tightly packed RGBA8 texels to a new device-local image
    pub fn upload(ctx: &Arc<GpuContext>, width: u32, height: u32, rgba: &[u8], name: &str) -> Result<Self> {
        check_rgba8(width, height, rgba.len())?;

        let image = AllocatedImage::new(
            Arc::clone(ctx),
            &ImageDesc {
                extent: Extent2D::new(width, height),
                format: TEXTURE_FORMAT,
                samples: vk::SampleCountFlags::TYPE_1,
                usage: vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
                aspect: vk::ImageAspectFlags::COLOR,
                array_layers: 1,
                flags: vk::ImageCreateFlags::empty(),
                view_type: vk::ImageViewType::TYPE_2D,
            },
            name,
        )?;

        let staging = Buffer::with_data(
            Arc::clone(ctx),
            rgba,
            vk::BufferUsageFlags::TRANSFER_SRC,
            "texture_staging",
        )?;

        let range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };
        let region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D { width, height, depth: 1 },
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
                .subresource_range(range);

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
                &[region],
            );

            let to_shader_read = vk::ImageMemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ)
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image.image)
                .subresource_range(range);

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
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .max_anisotropy(1.0)
            .max_lod(1.0);
        let sampler = Sampler::new(Arc::clone(ctx), &sampler_info, name)?;

        Ok(Self { sampler, image })
    }
}

/// Reject empty images and texel data that does not match `width * height * 4`
fn check_rgba8(width: u32, height: u32, len: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidResource(format!("Texture size {}x{} is empty", width, height)));
    }
    let expected = u64::from(width) * u64::from(height) * 4;
    if len as u64 != expected {
        return Err(Error::InvalidResource(format!(
            "Texture {}x{} needs {} RGBA8 bytes, got {}",
            width, height, expected, len
        )));
    }
    Ok(())
}

/// Index into the world set list; `None` when the handle was never issued
fn texture_slot(texture: Option<TextureHandle>, count: usize) -> Option<usize> {
    match texture {
        None => Some(0),
        Some(TextureHandle(id)) => {
            let slot = id as usize;
            (slot > 0 && slot < count).then_some(slot)
        }
    }
}

// ============================================================================
// TextureSet
// ============================================================================

/// Texture and the world set pointing at it
///
/// Fields drop in order: set, texture.
struct MaterialTexture {
    _set: DescriptorSet,
    _texture: Texture,
}

/// Every uploaded texture with its world descriptor set
pub struct TextureSet {
    entries: Vec<MaterialTexture>,
    /// Raw sets, indexed like `entries`
    sets: Vec<vk::DescriptorSet>,
    ctx: Arc<GpuContext>,
}

impl TextureSet {
    /// Upload the default white texture and build its world set
    pub fn new(
        ctx: &Arc<GpuContext>,
        layout: &DescriptorSetLayout,
        uniform_buffer: &Buffer,
        shadow: &ShadowTarget,
    ) -> Result<Self> {
        let mut textures = Self {
            entries: Vec::new(),
            sets: Vec::new(),
            ctx: Arc::clone(ctx),
        };
        textures.push(layout, uniform_buffer, shadow, 1, 1, &WHITE_TEXEL, "default_texture")?;
        Ok(textures)
    }

    /// Upload a texture; its handle goes into `Material::texture`
    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        layout: &DescriptorSetLayout,
        uniform_buffer: &Buffer,
        shadow: &ShadowTarget,
        width: u32,
        height: u32,
        rgba: &[u8],
        name: &str,
    ) -> Result<TextureHandle> {
        let texture = Texture::upload(&self.ctx, width, height, rgba, name).map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to upload texture '{}': {}", name, e);
            e
        })?;

        let set = DescriptorSet::new(Arc::clone(&self.ctx), layout, name)?;
        set.write_uniform_buffer(0, uniform_buffer.buffer, uniform_buffer.size());
        set.write_combined_image_sampler(
            1,
            shadow.image.view,
            shadow.sampler.sampler,
            vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        );
        set.write_combined_image_sampler(
            2,
            texture.image.view,
            texture.sampler.sampler,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );

        let handle = TextureHandle(self.entries.len() as u32);
        self.sets.push(set.set);
        self.entries.push(MaterialTexture { _set: set, _texture: texture });

        engine_debug!("corebryo::vulkan", "Texture '{}' uploaded ({}x{}) as {:?}", name, width, height, handle);
        Ok(handle)
    }

    /// World sets; slot 0 samples the default texture
    pub fn sets(&self) -> &[vk::DescriptorSet] {
        &self.sets
    }
}

/// World set for `texture` out of `sets`
pub fn world_set_for(sets: &[vk::DescriptorSet], texture: Option<TextureHandle>) -> Result<vk::DescriptorSet> {
    texture_slot(texture, sets.len())
        .and_then(|slot| sets.get(slot).copied())
        .ok_or_else(|| Error::InvalidResource(format!("Unknown texture {:?}", texture)))
}

#[cfg(test)]
#[path = "vulkan_texture_tests.rs"]
mod tests;
