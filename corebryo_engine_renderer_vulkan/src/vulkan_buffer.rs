/// Buffer - host-visible Vulkan buffers for meshes, uniforms and staging

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::corebryo::render::{BufferHandle, MeshBuffers, Vertex};
use corebryo_engine::{engine_err, engine_error};
use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan buffer with its own allocation
pub struct Buffer {
    /// Shared GPU context (device, allocator, queue, command pool)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Buffer size
    pub(crate) size: u64,
}

impl Buffer {
    /// Create a CPU-writable buffer
    pub fn new(ctx: Arc<GpuContext>, size: u64, usage: vk::BufferUsageFlags, name: &str) -> Result<Self> {
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&buffer_create_info, None)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to create buffer '{}' of size {} bytes: {:?}", name, size, e);
                    Error::ResourceCreation(format!("Failed to create buffer '{}': {:?}", name, e))
                })?;

            // From here on Drop releases the buffer if a later step fails
            let mut owned = Self { ctx, buffer, allocation: None, size };

            let requirements = owned.ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = owned.ctx.allocator
                .lock()
                .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))?
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("corebryo::vulkan", "Out of GPU memory for buffer '{}' (required: {:.2} MB)", name, size_mb);
                    Error::ResourceCreation(format!("Failed to allocate buffer '{}': {:?}", name, e))
                })?;

            let (memory, offset) = (allocation.memory(), allocation.offset());
            owned.allocation = Some(allocation);

            owned.ctx.device.bind_buffer_memory(buffer, memory, offset)
                .map_err(|e| engine_err!("corebryo::vulkan", "Failed to bind buffer memory for '{}': {:?}", name, e))?;

            Ok(owned)
        }
    }

    /// Create a buffer holding `data`
    pub fn with_data(ctx: Arc<GpuContext>, data: &[u8], usage: vk::BufferUsageFlags, name: &str) -> Result<Self> {
        let buffer = Self::new(ctx, data.len() as u64, usage, name)?;
        buffer.write(0, data)?;
        Ok(buffer)
    }

    /// Copy `data` into the mapped memory at `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            return Err(engine_err!(
                "corebryo::vulkan",
                "Buffer write out of range: {} bytes at offset {} (size {})",
                data.len(),
                offset,
                self.size
            ));
        }

        let allocation = self.allocation.as_ref().ok_or_else(|| {
            engine_error!("corebryo::vulkan", "Buffer write failed: no GPU allocation");
            Error::BackendError("Buffer has no allocation".to_string())
        })?;

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }
        Ok(())
    }

    pub fn handle(&self) -> BufferHandle {
        BufferHandle(self.buffer.as_raw())
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}

/// Raw Vulkan buffer behind a handle recorded into a draw item
pub(crate) fn vk_buffer(handle: BufferHandle) -> vk::Buffer {
    vk::Buffer::from_raw(handle.0)
}

// ============================================================================
// GpuMesh
// ============================================================================

/// Vertex buffer plus optional 32-bit index buffer
///
/// Draw items only borrow the raw handles: keep the mesh alive (and call
/// `wait_idle` before dropping it) while frames reference it.
pub struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Option<Buffer>,
    vertex_count: u32,
    index_count: u32,
}

impl GpuMesh {
    pub fn new(ctx: Arc<GpuContext>, vertices: &[Vertex], indices: Option<&[u32]>) -> Result<Self> {
        if vertices.is_empty() {
            return Err(Error::InvalidResource("Mesh has no vertices".to_string()));
        }

        let vertex_buffer = Buffer::with_data(
            Arc::clone(&ctx),
            bytemuck::cast_slice(vertices),
            vk::BufferUsageFlags::VERTEX_BUFFER,
            "mesh_vertices",
        )?;

        let index_buffer = match indices {
            Some(indices) if !indices.is_empty() => Some(Buffer::with_data(
                ctx,
                bytemuck::cast_slice(indices),
                vk::BufferUsageFlags::INDEX_BUFFER,
                "mesh_indices",
            )?),
            _ => None,
        };

        Ok(Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.map_or(0, |indices| indices.len() as u32),
            index_buffer,
        })
    }

    /// Handles and counts for a `DrawItem`
    pub fn buffers(&self) -> MeshBuffers {
        MeshBuffers {
            vertex_buffer: self.vertex_buffer.handle(),
            index_buffer: self.index_buffer.as_ref().map(Buffer::handle),
            vertex_count: self.vertex_count,
            index_count: self.index_count,
            has_index: self.index_buffer.is_some(),
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
