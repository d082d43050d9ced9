/// DescriptorSet - set layouts and pool-owned descriptor sets
///
/// Two layouts exist:
///
/// ```text
/// world  : binding 0 = light UBO (vertex + fragment)
///          binding 1 = shadow map sampler (fragment)
///          binding 2 = material texture sampler (fragment)
/// skybox : binding 0 = cubemap sampler (fragment)
/// ```

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::engine_error;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Descriptor set layout
pub struct DescriptorSetLayout {
    ctx: Arc<GpuContext>,
    pub(crate) layout: vk::DescriptorSetLayout,
    bindings: Vec<(vk::DescriptorType, u32)>,
}

impl DescriptorSetLayout {
    /// Light uniform, shadow map and material texture, read by the world pipeline
    pub fn world(ctx: Arc<GpuContext>) -> Result<Self> {
        let bindings = [
            vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT),
            vk::DescriptorSetLayoutBinding::default()
                .binding(1)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT),
            vk::DescriptorSetLayoutBinding::default()
                .binding(2)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT),
        ];
        Self::create(ctx, &bindings, "world")
    }

    /// Cubemap sampled by the sky pipeline
    pub fn skybox(ctx: Arc<GpuContext>) -> Result<Self> {
        let bindings = [vk::DescriptorSetLayoutBinding::default()
            .binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::FRAGMENT)];
        Self::create(ctx, &bindings, "skybox")
    }

    fn create(ctx: Arc<GpuContext>, bindings: &[vk::DescriptorSetLayoutBinding], name: &str) -> Result<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe { ctx.device.create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to create {} descriptor set layout: {:?}", name, e);
                Error::InitializationFailed(format!("Failed to create {} descriptor set layout: {:?}", name, e))
            })?;

        Ok(Self {
            ctx,
            layout,
            bindings: bindings.iter().map(|b| (b.descriptor_type, b.descriptor_count)).collect(),
        })
    }

    /// Pool sizes for `set_count` sets of this layout
    fn pool_sizes(&self, set_count: u32) -> Vec<vk::DescriptorPoolSize> {
        let mut sizes: Vec<vk::DescriptorPoolSize> = Vec::new();
        for &(ty, count) in &self.bindings {
            match sizes.iter_mut().find(|size| size.ty == ty) {
                Some(size) => size.descriptor_count += count * set_count,
                None => sizes.push(vk::DescriptorPoolSize { ty, descriptor_count: count * set_count }),
            }
        }
        sizes
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Descriptor set allocated from its own pool
///
/// Destroying the pool frees the set.
pub struct DescriptorSet {
    ctx: Arc<GpuContext>,
    pool: vk::DescriptorPool,
    pub(crate) set: vk::DescriptorSet,
}

impl DescriptorSet {
    pub fn new(ctx: Arc<GpuContext>, layout: &DescriptorSetLayout, name: &str) -> Result<Self> {
        let pool_sizes = layout.pool_sizes(1);
        let pool_create_info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(1);

        let pool = unsafe { ctx.device.create_descriptor_pool(&pool_create_info, None) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to create descriptor pool for '{}': {:?}", name, e);
                Error::ResourceCreation(format!("Failed to create descriptor pool '{}': {:?}", name, e))
            })?;

        let mut owned = Self {
            ctx,
            pool,
            set: vk::DescriptorSet::null(),
        };

        let layouts = [layout.layout];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);

        let sets = unsafe { owned.ctx.device.allocate_descriptor_sets(&allocate_info) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to allocate descriptor set '{}': {:?}", name, e);
                Error::ResourceCreation(format!("Failed to allocate descriptor set '{}': {:?}", name, e))
            })?;
        owned.set = sets.first().copied().unwrap_or_default();

        Ok(owned)
    }

    /// Point `binding` at a whole uniform buffer
    pub fn write_uniform_buffer(&self, binding: u32, buffer: vk::Buffer, range: u64) {
        let buffer_infos = [vk::DescriptorBufferInfo {
            buffer,
            offset: 0,
            range,
        }];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.set)
            .dst_binding(binding)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&buffer_infos);

        unsafe {
            self.ctx.device.update_descriptor_sets(&[write], &[]);
        }
    }

    /// Point `binding` at an image view sampled in `layout`
    pub fn write_combined_image_sampler(
        &self,
        binding: u32,
        view: vk::ImageView,
        sampler: vk::Sampler,
        layout: vk::ImageLayout,
    ) {
        let image_infos = [vk::DescriptorImageInfo {
            sampler,
            image_view: view,
            image_layout: layout,
        }];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.set)
            .dst_binding(binding)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_infos);

        unsafe {
            self.ctx.device.update_descriptor_sets(&[write], &[]);
        }
    }
}

impl Drop for DescriptorSet {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}
