/// Swapchain - presentable images and their views
///
/// Settings come from the pure selection helpers of the core crate, so the
/// only Vulkan-specific work here is querying the surface and owning handles.

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::corebryo::render::{
    AcquireResult, Extent2D, PresentMode, PresentResult, SurfaceCapabilities,
    choose_extent, choose_image_count, choose_present_mode, choose_surface_format,
};
use corebryo_engine::{engine_debug, engine_error, engine_warn};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Format used when the surface has no preference
const FALLBACK_SURFACE_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Vulkan swapchain
///
/// Either fully built or fully released: views created before a failure are
/// destroyed by `Drop`.
pub struct Swapchain {
    ctx: Arc<GpuContext>,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: Extent2D,
    present_mode: PresentMode,
}

impl Swapchain {
    /// Create a swapchain for the context's surface
    ///
    /// # Arguments
    ///
    /// * `ctx` - GPU context owning the surface and the swapchain loader
    /// * `requested` - Window size, used when the surface leaves the extent open
    /// * `vsync` - Force FIFO presentation
    /// * `old` - Swapchain being replaced on resize; it is retired, not destroyed
    pub fn new(ctx: Arc<GpuContext>, requested: Extent2D, vsync: bool, old: Option<&Swapchain>) -> Result<Self> {
        let physical_device = ctx.physical_device;
        let surface = ctx.surface();
        let surface_loader = ctx.surface_loader();

        let (capabilities, formats, modes) = unsafe {
            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;
            let formats = surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;
            let modes = surface_loader
                .get_physical_device_surface_present_modes(physical_device, surface)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to query present modes: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get present modes: {:?}", e))
                })?;
            (capabilities, formats, modes)
        };

        let caps = surface_capabilities_from_vk(&capabilities);
        let extent = choose_extent(&caps, requested);
        let image_count = choose_image_count(&caps);
        let available_modes: Vec<PresentMode> = modes.iter().filter_map(|&m| present_mode_from_vk(m)).collect();
        let present_mode = choose_present_mode(&available_modes, vsync);
        let format = choose_surface_format(
            &formats,
            |f| f.format == vk::Format::UNDEFINED,
            FALLBACK_SURFACE_FORMAT,
        )
        .ok_or_else(|| {
            engine_error!("corebryo::vulkan", "Surface reports no formats");
            Error::InitializationFailed("Surface reports no formats".to_string())
        })?;

        if !vsync && present_mode == PresentMode::Fifo {
            engine_warn!("corebryo::vulkan", "Neither MAILBOX nor IMMEDIATE available, falling back to FIFO");
        }

        let old_swapchain = old.map_or(vk::SwapchainKHR::null(), |old| old.swapchain);
        let create_info = swapchain_create_info(
            surface,
            &capabilities,
            image_count,
            format,
            extent,
            present_mode,
            old_swapchain,
        );

        let swapchain = unsafe { ctx.swapchain_loader.create_swapchain(&create_info, None) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to create swapchain: {:?}", e);
                Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
            })?;

        let mut owned = Self {
            ctx,
            swapchain,
            images: Vec::new(),
            image_views: Vec::new(),
            format,
            extent,
            present_mode,
        };

        owned.images = unsafe { owned.ctx.swapchain_loader.get_swapchain_images(swapchain) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to get swapchain images: {:?}", e);
                Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
            })?;

        for index in 0..owned.images.len() {
            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(owned.images[index])
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe { owned.ctx.device.create_image_view(&view_create_info, None) }
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to create swapchain image view {}: {:?}", index, e);
                    Error::InitializationFailed(format!("Failed to create image views: {:?}", e))
                })?;
            owned.image_views.push(view);
        }

        engine_debug!(
            "corebryo::vulkan",
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            extent.width,
            extent.height,
            owned.images.len(),
            format.format,
            present_mode
        );

        Ok(owned)
    }

    /// Acquire the next image, signaling `image_available`
    ///
    /// A suboptimal image is still returned; out-of-date reports `Stale`.
    pub fn acquire(&self, image_available: vk::Semaphore) -> Result<AcquireResult> {
        let result = unsafe {
            self.ctx.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                image_available,
                vk::Fence::null(),
            )
        };

        match result {
            Ok((index, _suboptimal)) => Ok(AcquireResult::Image(index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireResult::Stale),
            Err(e) => {
                engine_error!("corebryo::vulkan", "Failed to acquire swapchain image: {:?}", e);
                Err(Error::BackendError(format!("Failed to acquire swapchain image: {:?}", e)))
            }
        }
    }

    /// Queue `image_index` for presentation once `render_finished` is signaled
    ///
    /// Never fails: anything but a clean present asks for a resize.
    pub fn present(&self, render_finished: vk::Semaphore, image_index: u32) -> PresentResult {
        let wait_semaphores = [render_finished];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe {
            self.ctx.swapchain_loader.queue_present(self.ctx.present_queue, &present_info)
        };

        match result {
            Ok(false) => PresentResult::Presented,
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => PresentResult::Stale,
            Err(e) => {
                engine_warn!("corebryo::vulkan", "Present failed: {:?}", e);
                PresentResult::Stale
            }
        }
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn format(&self) -> vk::Format {
        self.format.format
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.ctx.device.destroy_image_view(view, None);
            }
            self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn swapchain_create_info<'a>(
    surface: vk::SurfaceKHR,
    capabilities: &vk::SurfaceCapabilitiesKHR,
    image_count: u32,
    format: vk::SurfaceFormatKHR,
    extent: Extent2D,
    present_mode: PresentMode,
    old_swapchain: vk::SwapchainKHR,
) -> vk::SwapchainCreateInfoKHR<'a> {
    vk::SwapchainCreateInfoKHR::default()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(format.format)
        .image_color_space(format.color_space)
        .image_extent(vk::Extent2D { width: extent.width, height: extent.height })
        .image_array_layers(1)
        .image_usage(
            vk::ImageUsageFlags::COLOR_ATTACHMENT
                | vk::ImageUsageFlags::TRANSFER_SRC
                | vk::ImageUsageFlags::TRANSFER_DST,
        )
        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        .pre_transform(capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode_to_vk(present_mode))
        .clipped(true)
        .old_swapchain(old_swapchain)
}

fn surface_capabilities_from_vk(caps: &vk::SurfaceCapabilitiesKHR) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: caps.min_image_count,
        max_image_count: caps.max_image_count,
        current_extent: Extent2D::new(caps.current_extent.width, caps.current_extent.height),
        min_extent: Extent2D::new(caps.min_image_extent.width, caps.min_image_extent.height),
        max_extent: Extent2D::new(caps.max_image_extent.width, caps.max_image_extent.height),
    }
}

fn present_mode_from_vk(mode: vk::PresentModeKHR) -> Option<PresentMode> {
    match mode {
        vk::PresentModeKHR::IMMEDIATE => Some(PresentMode::Immediate),
        vk::PresentModeKHR::MAILBOX => Some(PresentMode::Mailbox),
        vk::PresentModeKHR::FIFO => Some(PresentMode::Fifo),
        vk::PresentModeKHR::FIFO_RELAXED => Some(PresentMode::FifoRelaxed),
        _ => None,
    }
}

fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
