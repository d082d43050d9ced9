/// GpuContext - instance, surface, device and allocator shared by every Vulkan object
///
/// Every GPU resource of the backend keeps an `Arc<GpuContext>`, so the context
/// is released only after the last resource built from it. Each handle lives in
/// a small owner whose `Drop` releases it: a context that fails halfway through
/// construction unwinds whatever was already created, in reverse order.

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::corebryo::render::RendererConfig;
use corebryo_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::sync::Mutex;

pub(crate) const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

// ============================================================================
// Device selection
// ============================================================================

/// What device selection needs to know about one physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCandidate {
    pub discrete: bool,
    /// First queue family with GRAPHICS support
    pub graphics_family: Option<u32>,
}

/// Index of the device to use: the first discrete GPU with a graphics family,
/// otherwise the first device with a graphics family
pub fn pick_physical_device(candidates: &[DeviceCandidate]) -> Option<usize> {
    candidates
        .iter()
        .position(|c| c.discrete && c.graphics_family.is_some())
        .or_else(|| candidates.iter().position(|c| c.graphics_family.is_some()))
}

/// Queue family used for presentation, preferring the graphics family
pub fn pick_present_family(
    graphics_family: u32,
    family_count: u32,
    supports_present: impl Fn(u32) -> bool,
) -> Option<u32> {
    if supports_present(graphics_family) {
        return Some(graphics_family);
    }
    (0..family_count).find(|&index| supports_present(index))
}

// ============================================================================
// Owners
// ============================================================================

struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    /// Read by the callback through its user-data pointer; freed after the messenger
    #[cfg(feature = "vulkan-validation")]
    _filter: Box<crate::debug::ValidationFilter>,
}

/// Loader, instance and the optional debug messenger
struct InstanceOwner {
    entry: ash::Entry,
    instance: ash::Instance,
    debug: Option<DebugMessenger>,
}

impl Drop for InstanceOwner {
    fn drop(&mut self) {
        unsafe {
            if let Some(debug) = self.debug.take() {
                debug.loader.destroy_debug_utils_messenger(debug.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Presentation surface, destroyed before the instance
struct SurfaceOwner {
    loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
}

impl Drop for SurfaceOwner {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

/// Logical device, destroyed after everything allocated from it
pub struct DeviceOwner(ash::Device);

impl Deref for DeviceOwner {
    type Target = ash::Device;

    fn deref(&self) -> &ash::Device {
        &self.0
    }
}

impl Drop for DeviceOwner {
    fn drop(&mut self) {
        unsafe {
            self.0.destroy_device(None);
        }
    }
}

// ============================================================================
// GpuContext
// ============================================================================

/// Shared GPU context for all Vulkan resources.
///
/// Fields drop in declaration order after `Drop::drop` has released the
/// upload pool and the allocator: device, then surface, then instance.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: DeviceOwner,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so its memory blocks are freed BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Reusable command pool for one-shot upload operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    pub upload_command_pool: Mutex<vk::CommandPool>,

    pub physical_device: vk::PhysicalDevice,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,

    pub swapchain_loader: ash::khr::swapchain::Device,

    /// Command buffer labels, loaded only when validation is active
    pub debug_utils: Option<ash::ext::debug_utils::Device>,

    surface: SurfaceOwner,
    instance: InstanceOwner,
}

impl GpuContext {
    /// Create the instance, surface, logical device and allocator for `window`
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &RendererConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let validation = validation_enabled(&entry, config.enable_validation);
            let instance = create_instance(entry, window, config, validation)?;
            let surface = create_surface(&instance, window)?;

            // Pick Physical Device
            let physical_devices = instance.instance
                .enumerate_physical_devices()
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to enumerate physical devices: {:?}", e);
                    Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
                })?;

            let candidates: Vec<DeviceCandidate> = physical_devices
                .iter()
                .map(|&pd| {
                    let properties = instance.instance.get_physical_device_properties(pd);
                    let families = instance.instance.get_physical_device_queue_family_properties(pd);
                    DeviceCandidate {
                        discrete: properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU,
                        graphics_family: families
                            .iter()
                            .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                            .map(|i| i as u32),
                    }
                })
                .collect();

            let chosen = pick_physical_device(&candidates).ok_or_else(|| {
                engine_error!("corebryo::vulkan", "No GPU exposes a graphics queue family ({} enumerated)", candidates.len());
                Error::NoCapableDevice
            })?;
            let physical_device = physical_devices[chosen];
            let graphics_family = candidates[chosen].graphics_family.ok_or(Error::NoCapableDevice)?;

            let properties = instance.instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string());
            engine_info!("corebryo::vulkan", "Using GPU '{}' ({:?})", device_name, properties.device_type);

            // Find present family
            let family_count = instance.instance
                .get_physical_device_queue_family_properties(physical_device)
                .len() as u32;
            let present_family = pick_present_family(graphics_family, family_count, |index| {
                surface.loader
                    .get_physical_device_surface_support(physical_device, index, surface.surface)
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                engine_error!("corebryo::vulkan", "No queue family can present to the surface");
                Error::InitializationFailed("No present queue family found".to_string())
            })?;

            // Create Logical Device
            let queue_priorities = [1.0];
            let mut queue_create_infos = vec![
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family)
                    .queue_priorities(&queue_priorities),
            ];
            if present_family != graphics_family {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family)
                        .queue_priorities(&queue_priorities),
                );
            }

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = DeviceOwner(
                instance.instance
                    .create_device(physical_device, &device_create_info, None)
                    .map_err(|e| {
                        engine_error!("corebryo::vulkan", "Failed to create logical device: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                    })?,
            );

            let graphics_queue = device.get_device_queue(graphics_family, 0);
            let present_queue = device.get_device_queue(present_family, 0);

            // Create GPU allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.instance.clone(),
                device: (*device).clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            let upload_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let upload_command_pool = device.create_command_pool(&upload_pool_create_info, None)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to create upload command pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e))
                })?;

            let swapchain_loader = ash::khr::swapchain::Device::new(&instance.instance, &device);
            let debug_utils = instance
                .debug
                .as_ref()
                .map(|_| ash::ext::debug_utils::Device::new(&instance.instance, &device));

            engine_debug!(
                "corebryo::vulkan",
                "Device ready: graphics family {}, present family {}, validation {}",
                graphics_family,
                present_family,
                validation
            );

            Ok(Self {
                device,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                upload_command_pool: Mutex::new(upload_command_pool),
                physical_device,
                graphics_queue,
                graphics_queue_family: graphics_family,
                present_queue,
                present_queue_family: present_family,
                swapchain_loader,
                debug_utils,
                surface,
                instance,
            })
        }
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance.instance
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface.surface
    }

    pub fn surface_loader(&self) -> &ash::khr::surface::Instance {
        &self.surface.loader
    }

    /// Whether the debug messenger is installed
    pub fn validation_active(&self) -> bool {
        self.instance.debug.is_some()
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.device.device_wait_idle() }
            .map_err(|e| engine_err!("corebryo::vulkan", "Failed to wait for device idle: {:?}", e))
    }

    /// Record and synchronously execute a one-shot command buffer on the graphics queue
    pub fn immediate_submit(&self, record: impl FnOnce(vk::CommandBuffer)) -> Result<()> {
        let pool = self.upload_command_pool.lock()
            .map_err(|_| Error::BackendError("Upload command pool lock poisoned".to_string()))?;

        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = self.device.allocate_command_buffers(&allocate_info)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to allocate upload command buffer: {:?}", e);
                    Error::BackendError(format!("Failed to allocate upload command buffer: {:?}", e))
                })?[0];

            let result = self.run_once(command_buffer, record);
            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }

    unsafe fn run_once(&self, command_buffer: vk::CommandBuffer, record: impl FnOnce(vk::CommandBuffer)) -> Result<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        self.device.begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| Error::BackendError(format!("Failed to begin upload command buffer: {:?}", e)))?;

        record(command_buffer);

        self.device.end_command_buffer(command_buffer)
            .map_err(|e| Error::BackendError(format!("Failed to end upload command buffer: {:?}", e)))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        self.device.queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to submit upload commands: {:?}", e);
                Error::BackendError(format!("Failed to submit upload commands: {:?}", e))
            })?;

        self.device.queue_wait_idle(self.graphics_queue)
            .map_err(|e| Error::BackendError(format!("Failed to wait for upload: {:?}", e)))
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            if let Ok(pool) = self.upload_command_pool.get_mut() {
                if *pool != vk::CommandPool::null() {
                    self.device.destroy_command_pool(*pool, None);
                    *pool = vk::CommandPool::null();
                }
            }

            // Free VkDeviceMemory blocks BEFORE the device field is dropped
            ManuallyDrop::drop(&mut self.allocator);
        }
    }
}

// ============================================================================
// Bootstrap helpers
// ============================================================================

/// Requested validation, downgraded to a warning when it cannot be provided
fn validation_enabled(entry: &ash::Entry, requested: bool) -> bool {
    if !requested {
        return false;
    }

    if !cfg!(feature = "vulkan-validation") {
        engine_warn!("corebryo::vulkan", "Validation requested but the vulkan-validation feature is disabled");
        return false;
    }

    let layers = unsafe { entry.enumerate_instance_layer_properties() }.unwrap_or_default();
    let available = layers
        .iter()
        .any(|layer| layer.layer_name_as_c_str().map(|name| name == VALIDATION_LAYER).unwrap_or(false));

    if !available {
        engine_warn!("corebryo::vulkan", "{:?} not installed, continuing without validation", VALIDATION_LAYER);
    }
    available
}

unsafe fn create_instance<W: HasDisplayHandle>(
    entry: ash::Entry,
    window: &W,
    config: &RendererConfig,
    validation: bool,
) -> Result<InstanceOwner> {
    let app_name = CString::new(config.app_name.as_str()).unwrap_or_else(|_| c"Corebryo Application".to_owned());
    let (major, minor, patch) = config.app_version;

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, major, minor, patch))
        .engine_name(c"Corebryo")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_2);

    let display_handle = window.display_handle()
        .map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to get display handle: {}", e);
            Error::InitializationFailed(format!("Failed to get display handle: {}", e))
        })?;
    let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
        .map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to get required extensions: {}", e);
            Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
        })?
        .to_vec();

    let layer_names = if validation {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        vec![VALIDATION_LAYER.as_ptr()]
    } else {
        vec![]
    };

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_layer_names(&layer_names)
        .enabled_extension_names(&extension_names);

    let instance = entry
        .create_instance(&create_info, None)
        .map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to create Vulkan instance: {:?}", e);
            Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
        })?;

    let mut owner = InstanceOwner { entry, instance, debug: None };
    if validation {
        owner.debug = create_debug_messenger(&owner.entry, &owner.instance, config)?;
    }
    Ok(owner)
}

#[cfg(feature = "vulkan-validation")]
unsafe fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    config: &RendererConfig,
) -> Result<Option<DebugMessenger>> {
    let loader = ash::ext::debug_utils::Instance::new(entry, instance);
    let filter = Box::new(crate::debug::ValidationFilter::new(&config.debug));

    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(filter.severity_flags())
        .message_type(filter.type_flags())
        .pfn_user_callback(Some(crate::debug::vulkan_debug_callback))
        .user_data(&*filter as *const crate::debug::ValidationFilter as *mut std::ffi::c_void);

    let messenger = loader
        .create_debug_utils_messenger(&debug_info, None)
        .map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to create debug messenger: {:?}", e);
            Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
        })?;

    Ok(Some(DebugMessenger { loader, messenger, _filter: filter }))
}

#[cfg(not(feature = "vulkan-validation"))]
unsafe fn create_debug_messenger(
    _entry: &ash::Entry,
    _instance: &ash::Instance,
    _config: &RendererConfig,
) -> Result<Option<DebugMessenger>> {
    Ok(None)
}

unsafe fn create_surface<W: HasDisplayHandle + HasWindowHandle>(
    instance: &InstanceOwner,
    window: &W,
) -> Result<SurfaceOwner> {
    let display_handle = window.display_handle()
        .map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to get display handle: {}", e);
            Error::InitializationFailed(format!("Failed to get display handle: {}", e))
        })?;
    let window_handle = window.window_handle()
        .map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to get window handle: {}", e);
            Error::InitializationFailed(format!("Failed to get window handle: {}", e))
        })?;

    let surface = ash_window::create_surface(
        &instance.entry,
        &instance.instance,
        display_handle.as_raw(),
        window_handle.as_raw(),
        None,
    )
    .map_err(|e| {
        engine_error!("corebryo::vulkan", "Failed to create surface: {:?}", e);
        Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
    })?;

    Ok(SurfaceOwner {
        loader: ash::khr::surface::Instance::new(&instance.entry, &instance.instance),
        surface,
    })
}

#[cfg(test)]
#[path = "vulkan_context_tests.rs"]
mod tests;
