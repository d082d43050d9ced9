/// Attachment resources - MSAA color/depth targets and the shadow depth map
///
/// `AttachmentSet` is sized by the swapchain and rebuilt on resize.
/// `ShadowTarget` has a fixed resolution and lives until teardown.

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::corebryo::render::{Extent2D, SHADOW_MAP_SIZE};
use corebryo_engine::engine_error;
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_render_pass::{Framebuffer, RenderPass};

/// Depth format of the main and shadow depth attachments
pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Parameters of a device-local image and its view
#[derive(Debug, Clone, Copy)]
pub struct ImageDesc {
    pub extent: Extent2D,
    pub format: vk::Format,
    pub samples: vk::SampleCountFlags,
    pub usage: vk::ImageUsageFlags,
    pub aspect: vk::ImageAspectFlags,
    pub array_layers: u32,
    pub flags: vk::ImageCreateFlags,
    pub view_type: vk::ImageViewType,
}

impl ImageDesc {
    /// Single-layer 2D image
    pub fn attachment(
        extent: Extent2D,
        format: vk::Format,
        samples: vk::SampleCountFlags,
        usage: vk::ImageUsageFlags,
        aspect: vk::ImageAspectFlags,
    ) -> Self {
        Self {
            extent,
            format,
            samples,
            usage,
            aspect,
            array_layers: 1,
            flags: vk::ImageCreateFlags::empty(),
            view_type: vk::ImageViewType::TYPE_2D,
        }
    }
}

/// Device-local image, its memory and one view over every layer
pub struct AllocatedImage {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    extent: Extent2D,
}

impl AllocatedImage {
    pub fn new(ctx: Arc<GpuContext>, desc: &ImageDesc, name: &str) -> Result<Self> {
        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .flags(desc.flags)
                .image_type(vk::ImageType::TYPE_2D)
                .format(desc.format)
                .extent(vk::Extent3D {
                    width: desc.extent.width,
                    height: desc.extent.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(desc.array_layers)
                .samples(desc.samples)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(desc.usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_create_info, None)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to create image '{}': {:?}", name, e);
                    Error::ResourceCreation(format!("Failed to create image '{}': {:?}", name, e))
                })?;

            let mut owned = Self {
                ctx,
                image,
                view: vk::ImageView::null(),
                allocation: None,
                extent: desc.extent,
            };

            let requirements = owned.ctx.device.get_image_memory_requirements(image);
            let allocation = owned.ctx.allocator
                .lock()
                .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))?
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(
                        "corebryo::vulkan",
                        "Out of GPU memory for image '{}' ({}x{}, {:.2} MB)",
                        name,
                        desc.extent.width,
                        desc.extent.height,
                        size_mb
                    );
                    Error::ResourceCreation(format!("Failed to allocate image '{}': {:?}", name, e))
                })?;

            let (memory, offset) = (allocation.memory(), allocation.offset());
            owned.allocation = Some(allocation);

            owned.ctx.device.bind_image_memory(image, memory, offset)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to bind memory for image '{}': {:?}", name, e);
                    Error::ResourceCreation(format!("Failed to bind image memory '{}': {:?}", name, e))
                })?;

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(desc.view_type)
                .format(desc.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: desc.aspect,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: desc.array_layers,
                });

            owned.view = owned.ctx.device.create_image_view(&view_create_info, None)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to create view for image '{}': {:?}", name, e);
                    Error::ResourceCreation(format!("Failed to create image view '{}': {:?}", name, e))
                })?;

            Ok(owned)
        }
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}

impl Drop for AllocatedImage {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }
            self.ctx.device.destroy_image(self.image, None);

            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
        }
    }
}

/// Sampler owned by a texture
pub struct Sampler {
    ctx: Arc<GpuContext>,
    pub(crate) sampler: vk::Sampler,
}

impl Sampler {
    pub fn new(ctx: Arc<GpuContext>, info: &vk::SamplerCreateInfo, name: &str) -> Result<Self> {
        let sampler = unsafe { ctx.device.create_sampler(info, None) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to create sampler '{}': {:?}", name, e);
                Error::ResourceCreation(format!("Failed to create sampler '{}': {:?}", name, e))
            })?;
        Ok(Self { ctx, sampler })
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}

pub fn sample_count_to_vk(samples: u32) -> vk::SampleCountFlags {
    match samples {
        1 => vk::SampleCountFlags::TYPE_1,
        2 => vk::SampleCountFlags::TYPE_2,
        8 => vk::SampleCountFlags::TYPE_8,
        16 => vk::SampleCountFlags::TYPE_16,
        _ => vk::SampleCountFlags::TYPE_4,
    }
}

// ============================================================================
// AttachmentSet
// ============================================================================

/// MSAA depth plus one MSAA color image per swapchain image
pub struct AttachmentSet {
    pub depth: AllocatedImage,
    pub colors: Vec<AllocatedImage>,
}

impl AttachmentSet {
    pub fn new(
        ctx: &Arc<GpuContext>,
        extent: Extent2D,
        color_format: vk::Format,
        samples: vk::SampleCountFlags,
        image_count: usize,
    ) -> Result<Self> {
        let depth = AllocatedImage::new(
            Arc::clone(ctx),
            &ImageDesc::attachment(
                extent,
                DEPTH_FORMAT,
                samples,
                vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
                vk::ImageAspectFlags::DEPTH,
            ),
            "msaa_depth",
        )?;

        let colors = (0..image_count)
            .map(|_| {
                AllocatedImage::new(
                    Arc::clone(ctx),
                    &ImageDesc::attachment(
                        extent,
                        color_format,
                        samples,
                        vk::ImageUsageFlags::COLOR_ATTACHMENT,
                        vk::ImageAspectFlags::COLOR,
                    ),
                    "msaa_color",
                )
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { depth, colors })
    }
}

// ============================================================================
// ShadowTarget
// ============================================================================

/// Fixed-size depth map rendered from the light and sampled by the world pass
///
/// Fields drop in order: framebuffer, render pass, sampler, image.
pub struct ShadowTarget {
    pub framebuffer: Framebuffer,
    pub render_pass: RenderPass,
    pub sampler: Sampler,
    pub image: AllocatedImage,
}

impl ShadowTarget {
    pub fn new(ctx: &Arc<GpuContext>) -> Result<Self> {
        let extent = Self::extent();
        let image = AllocatedImage::new(
            Arc::clone(ctx),
            &ImageDesc::attachment(
                extent,
                DEPTH_FORMAT,
                vk::SampleCountFlags::TYPE_1,
                vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
                vk::ImageAspectFlags::DEPTH,
            ),
            "shadow_map",
        )?;

        let sampler_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
            .compare_enable(false)
            .max_anisotropy(1.0);
        let sampler = Sampler::new(Arc::clone(ctx), &sampler_info, "shadow_sampler")?;

        let render_pass = RenderPass::shadow(Arc::clone(ctx))?;
        let framebuffer = Framebuffer::new(Arc::clone(ctx), &render_pass, &[image.view], extent)?;

        Ok(Self {
            framebuffer,
            render_pass,
            sampler,
            image,
        })
    }

    pub fn extent() -> Extent2D {
        Extent2D::new(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE)
    }
}
