/// Draw submissions - what the scene hands to the frame orchestrator every tick

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Opaque handle to a backend buffer
///
/// The Vulkan backend stores the raw `VkBuffer` value. The handle carries no
/// ownership: the buffer must outlive every frame that references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Material texture registered with the backend
///
/// Issued by the backend's texture upload. Draws without one sample a 1x1
/// white texture, so untextured materials show their base color unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// View into externally owned mesh buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: Option<BufferHandle>,
    pub vertex_count: u32,
    pub index_count: u32,
    /// Draw through the index buffer when `index_count > 0`
    pub has_index: bool,
}

impl MeshBuffers {
    /// Non-indexed mesh
    pub fn vertices_only(vertex_buffer: BufferHandle, vertex_count: u32) -> Self {
        Self {
            vertex_buffer,
            index_buffer: None,
            vertex_count,
            index_count: 0,
            has_index: false,
        }
    }

    /// Whether the orchestrator will issue an indexed draw for this mesh
    pub fn draws_indexed(&self) -> bool {
        self.has_index && self.index_count > 0 && self.index_buffer.is_some()
    }

    /// Number of vertices the draw call consumes
    pub fn drawn_vertex_count(&self) -> u32 {
        if self.draws_indexed() {
            self.index_count
        } else {
            self.vertex_count
        }
    }
}

/// Surface parameters pushed with every opaque draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: Vec3,
    pub ambient: f32,
    pub alpha: f32,
    /// Diffuse texture multiplied with `base_color`
    pub texture: Option<TextureHandle>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::ONE,
            ambient: 0.0,
            alpha: 1.0,
            texture: None,
        }
    }
}

/// One renderable submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    /// Items without a mesh are skipped by every stage
    pub mesh: Option<MeshBuffers>,
    /// `None` renders with `Material::default()`
    pub material: Option<Material>,
    pub model: Mat4,
}

impl DrawItem {
    pub fn new(mesh: MeshBuffers, material: Material, model: Mat4) -> Self {
        Self {
            mesh: Some(mesh),
            material: Some(material),
            model,
        }
    }

    /// Mesh that can actually be drawn (present and non-empty)
    pub fn drawable_mesh(&self) -> Option<&MeshBuffers> {
        self.mesh.as_ref().filter(|mesh| mesh.vertex_count > 0)
    }
}

// ============================================================================
// Vertex formats
// ============================================================================

/// World vertex: position + uv, 20 bytes, binding 0
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;
    pub const POSITION_OFFSET: u32 = 0;
    pub const UV_OFFSET: u32 = 12;

    pub const fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }
}

/// Stride of the position-only skybox vertex stream
pub const SKYBOX_VERTEX_STRIDE: u32 = 12;

/// Number of vertices in the skybox cube
pub const SKYBOX_VERTEX_COUNT: u32 = 36;

const fn v(x: f32, y: f32, z: f32, u: f32, t: f32) -> Vertex {
    Vertex::new([x, y, z], [u, t])
}

/// Unit cube centered on the origin, two triangles per face, non-indexed
pub const CUBE_VERTICES: [Vertex; 36] = [
    // +Z
    v(-0.5, -0.5, 0.5, 0.0, 0.0), v(0.5, -0.5, 0.5, 1.0, 0.0), v(0.5, 0.5, 0.5, 1.0, 1.0),
    v(0.5, 0.5, 0.5, 1.0, 1.0), v(-0.5, 0.5, 0.5, 0.0, 1.0), v(-0.5, -0.5, 0.5, 0.0, 0.0),
    // -Z
    v(0.5, -0.5, -0.5, 0.0, 0.0), v(-0.5, -0.5, -0.5, 1.0, 0.0), v(-0.5, 0.5, -0.5, 1.0, 1.0),
    v(-0.5, 0.5, -0.5, 1.0, 1.0), v(0.5, 0.5, -0.5, 0.0, 1.0), v(0.5, -0.5, -0.5, 0.0, 0.0),
    // -X
    v(-0.5, -0.5, -0.5, 0.0, 0.0), v(-0.5, -0.5, 0.5, 1.0, 0.0), v(-0.5, 0.5, 0.5, 1.0, 1.0),
    v(-0.5, 0.5, 0.5, 1.0, 1.0), v(-0.5, 0.5, -0.5, 0.0, 1.0), v(-0.5, -0.5, -0.5, 0.0, 0.0),
    // +X
    v(0.5, -0.5, 0.5, 0.0, 0.0), v(0.5, -0.5, -0.5, 1.0, 0.0), v(0.5, 0.5, -0.5, 1.0, 1.0),
    v(0.5, 0.5, -0.5, 1.0, 1.0), v(0.5, 0.5, 0.5, 0.0, 1.0), v(0.5, -0.5, 0.5, 0.0, 0.0),
    // +Y
    v(-0.5, 0.5, 0.5, 0.0, 0.0), v(0.5, 0.5, 0.5, 1.0, 0.0), v(0.5, 0.5, -0.5, 1.0, 1.0),
    v(0.5, 0.5, -0.5, 1.0, 1.0), v(-0.5, 0.5, -0.5, 0.0, 1.0), v(-0.5, 0.5, 0.5, 0.0, 0.0),
    // -Y
    v(-0.5, -0.5, -0.5, 0.0, 0.0), v(0.5, -0.5, -0.5, 1.0, 0.0), v(0.5, -0.5, 0.5, 1.0, 1.0),
    v(0.5, -0.5, 0.5, 1.0, 1.0), v(-0.5, -0.5, 0.5, 0.0, 1.0), v(-0.5, -0.5, -0.5, 0.0, 0.0),
];

/// Skybox cube spanning [-1, 1] on every axis, positions only
pub const SKYBOX_VERTICES: [[f32; 3]; 36] = [
    [-1.0, 1.0, -1.0], [-1.0, -1.0, -1.0], [1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0],

    [-1.0, -1.0, 1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [-1.0, -1.0, 1.0],

    [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0],

    [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0],

    [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0],

    [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [1.0, -1.0, 1.0],
];
