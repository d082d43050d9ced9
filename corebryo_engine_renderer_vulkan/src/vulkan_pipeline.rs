/// Pipeline - shader modules and the sky / world / shadow pipeline set
///
/// Pipelines depend only on render pass layouts and descriptor set layouts,
/// so a swapchain resize keeps them.

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::corebryo::render::{
    PipelineKind, Vertex, MAIN_PUSH_CONSTANTS_SIZE, SHADOW_PUSH_CONSTANTS_SIZE,
    SKYBOX_PUSH_CONSTANTS_SIZE, SKYBOX_VERTEX_STRIDE,
};
use corebryo_engine::corebryo::skybox::find_file_in_tree;
use corebryo_engine::{engine_debug, engine_error};
use ash::vk;
use std::ffi::CStr;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_set::DescriptorSetLayout;
use crate::vulkan_render_pass::RenderPass;

const ENTRY_POINT: &CStr = c"main";

pub const WORLD_VERTEX_SHADER: &str = "Triangle.vert.spv";
pub const WORLD_FRAGMENT_SHADER: &str = "Triangle.frag.spv";
pub const SHADOW_VERTEX_SHADER: &str = "Shadow.vert.spv";
pub const SKYBOX_VERTEX_SHADER: &str = "Skybox.vert.spv";
pub const SKYBOX_FRAGMENT_SHADER: &str = "Skybox.frag.spv";

// ============================================================================
// Shader modules
// ============================================================================

/// SPIR-V shader module, destroyed once the pipelines that use it exist
pub struct ShaderModule {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
}

impl ShaderModule {
    /// Find `name` under the assets root and create a module from it
    pub fn load(ctx: Arc<GpuContext>, assets_root: &Path, name: &str) -> Result<Self> {
        let path = find_file_in_tree(assets_root, name).ok_or_else(|| {
            engine_error!("corebryo::vulkan", "Shader '{}' not found under {}", name, assets_root.display());
            Error::InitializationFailed(format!("Shader '{}' not found", name))
        })?;

        let bytes = std::fs::read(&path).map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to read shader {}: {}", path.display(), e);
            Error::InitializationFailed(format!("Failed to read shader '{}': {}", name, e))
        })?;

        Self::from_bytes(ctx, &bytes, name)
    }

    pub fn from_bytes(ctx: Arc<GpuContext>, bytes: &[u8], name: &str) -> Result<Self> {
        // read_spv copies into u32 words, so unaligned file buffers are fine
        let code = ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|e| {
            engine_error!("corebryo::vulkan", "Shader '{}' is not valid SPIR-V: {}", name, e);
            Error::InitializationFailed(format!("Invalid SPIR-V in '{}': {}", name, e))
        })?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe { ctx.device.create_shader_module(&create_info, None) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to create shader module '{}': {:?}", name, e);
                Error::InitializationFailed(format!("Failed to create shader module '{}': {:?}", name, e))
            })?;

        Ok(Self { ctx, module })
    }

    fn stage(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo<'static> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(stage)
            .module(self.module)
            .name(ENTRY_POINT)
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}

// ============================================================================
// Fixed-function state
// ============================================================================

/// How color output is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOutput {
    /// Depth-only pass, no color attachment
    None,
    /// Overwrite RGBA
    Opaque,
    /// SRC_ALPHA / ONE_MINUS_SRC_ALPHA on color, ONE / ZERO on alpha
    AlphaBlend,
}

/// Fixed-function settings that distinguish the three pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: vk::CompareOp,
    pub cull_mode: vk::CullModeFlags,
    pub samples: vk::SampleCountFlags,
    pub color: ColorOutput,
    pub vertex_stride: u32,
    /// (location, format, offset) in binding 0
    pub attributes: &'static [(u32, vk::Format, u32)],
    pub push_stages: vk::ShaderStageFlags,
    pub push_size: u32,
}

const POSITION_ONLY: [(u32, vk::Format, u32); 1] = [(0, vk::Format::R32G32B32_SFLOAT, 0)];

const POSITION_UV: [(u32, vk::Format, u32); 2] = [
    (0, vk::Format::R32G32B32_SFLOAT, Vertex::POSITION_OFFSET),
    (1, vk::Format::R32G32_SFLOAT, Vertex::UV_OFFSET),
];

impl PipelineState {
    /// Settings of `kind`, with `msaa` samples for the main pass pipelines
    pub fn for_kind(kind: PipelineKind, msaa: vk::SampleCountFlags) -> Self {
        match kind {
            // Drawn first, behind everything: the test never rejects and nothing is written
            PipelineKind::Sky => Self {
                depth_test: true,
                depth_write: false,
                depth_compare: vk::CompareOp::ALWAYS,
                cull_mode: vk::CullModeFlags::FRONT,
                samples: msaa,
                color: ColorOutput::Opaque,
                vertex_stride: SKYBOX_VERTEX_STRIDE,
                attributes: &POSITION_ONLY,
                push_stages: vk::ShaderStageFlags::VERTEX,
                push_size: SKYBOX_PUSH_CONSTANTS_SIZE,
            },
            PipelineKind::World => Self {
                depth_test: true,
                depth_write: true,
                depth_compare: vk::CompareOp::LESS,
                cull_mode: vk::CullModeFlags::NONE,
                samples: msaa,
                color: ColorOutput::AlphaBlend,
                vertex_stride: Vertex::STRIDE,
                attributes: &POSITION_UV,
                push_stages: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                push_size: MAIN_PUSH_CONSTANTS_SIZE,
            },
            PipelineKind::Shadow => Self {
                depth_test: true,
                depth_write: true,
                depth_compare: vk::CompareOp::LESS,
                cull_mode: vk::CullModeFlags::NONE,
                samples: vk::SampleCountFlags::TYPE_1,
                color: ColorOutput::None,
                vertex_stride: Vertex::STRIDE,
                attributes: &POSITION_ONLY,
                push_stages: vk::ShaderStageFlags::VERTEX,
                push_size: SHADOW_PUSH_CONSTANTS_SIZE,
            },
        }
    }

    fn blend_attachment(&self) -> Option<vk::PipelineColorBlendAttachmentState> {
        let attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA);

        match self.color {
            ColorOutput::None => None,
            ColorOutput::Opaque => Some(attachment.blend_enable(false)),
            ColorOutput::AlphaBlend => Some(
                attachment
                    .blend_enable(true)
                    .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                    .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                    .color_blend_op(vk::BlendOp::ADD)
                    .src_alpha_blend_factor(vk::BlendFactor::ONE)
                    .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                    .alpha_blend_op(vk::BlendOp::ADD),
            ),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Graphics pipeline and its layout
pub struct Pipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
}

impl Pipeline {
    fn new(
        ctx: Arc<GpuContext>,
        name: &str,
        state: &PipelineState,
        stages: &[vk::PipelineShaderStageCreateInfo],
        set_layouts: &[vk::DescriptorSetLayout],
        render_pass: &RenderPass,
    ) -> Result<Self> {
        let push_ranges = [vk::PushConstantRange {
            stage_flags: state.push_stages,
            offset: 0,
            size: state.push_size,
        }];
        let layout_create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(set_layouts)
            .push_constant_ranges(&push_ranges);

        let layout = unsafe { ctx.device.create_pipeline_layout(&layout_create_info, None) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to create {} pipeline layout: {:?}", name, e);
                Error::InitializationFailed(format!("Failed to create {} pipeline layout: {:?}", name, e))
            })?;

        let mut owned = Self {
            ctx,
            pipeline: vk::Pipeline::null(),
            layout,
        };

        let bindings = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: state.vertex_stride,
            input_rate: vk::VertexInputRate::VERTEX,
        }];
        let attributes: Vec<vk::VertexInputAttributeDescription> = state
            .attributes
            .iter()
            .map(|&(location, format, offset)| vk::VertexInputAttributeDescription {
                location,
                binding: 0,
                format,
                offset,
            })
            .collect();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic, only the counts matter
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(state.cull_mode)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(state.samples);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(state.depth_test)
            .depth_write_enable(state.depth_write)
            .depth_compare_op(state.depth_compare)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> =
            state.blend_attachment().into_iter().collect();
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass.render_pass)
            .subpass(0);

        let pipelines = unsafe {
            owned.ctx.device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
        }
        .map_err(|(_, e)| {
            engine_error!("corebryo::vulkan", "Failed to create {} pipeline: {:?}", name, e);
            Error::InitializationFailed(format!("Failed to create {} pipeline: {:?}", name, e))
        })?;
        owned.pipeline = pipelines.first().copied().unwrap_or_default();

        engine_debug!("corebryo::vulkan", "Created {} pipeline", name);
        Ok(owned)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                self.ctx.device.destroy_pipeline(self.pipeline, None);
            }
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

// ============================================================================
// PipelineSet
// ============================================================================

/// The three pipelines a frame binds
pub struct PipelineSet {
    pub sky: Pipeline,
    pub world: Pipeline,
    pub shadow: Pipeline,
}

impl PipelineSet {
    /// Build every pipeline; shader modules are released on return
    ///
    /// # Arguments
    ///
    /// * `assets_root` - Directory searched for the `.spv` files
    /// * `main_pass` - MSAA pass used by sky and world
    /// * `shadow_pass` - Depth-only pass used by shadow
    /// * `world_layout` - Light UBO + shadow map set
    /// * `skybox_layout` - Cubemap set
    pub fn new(
        ctx: &Arc<GpuContext>,
        assets_root: &Path,
        main_pass: &RenderPass,
        shadow_pass: &RenderPass,
        world_layout: &DescriptorSetLayout,
        skybox_layout: &DescriptorSetLayout,
        msaa: vk::SampleCountFlags,
    ) -> Result<Self> {
        let load = |name: &str| ShaderModule::load(Arc::clone(ctx), assets_root, name);

        let world_vert = load(WORLD_VERTEX_SHADER)?;
        let world_frag = load(WORLD_FRAGMENT_SHADER)?;
        let shadow_vert = load(SHADOW_VERTEX_SHADER)?;
        let sky_vert = load(SKYBOX_VERTEX_SHADER)?;
        let sky_frag = load(SKYBOX_FRAGMENT_SHADER)?;

        let sky = Pipeline::new(
            Arc::clone(ctx),
            "sky",
            &PipelineState::for_kind(PipelineKind::Sky, msaa),
            &[
                sky_vert.stage(vk::ShaderStageFlags::VERTEX),
                sky_frag.stage(vk::ShaderStageFlags::FRAGMENT),
            ],
            &[skybox_layout.layout],
            main_pass,
        )?;

        let world = Pipeline::new(
            Arc::clone(ctx),
            "world",
            &PipelineState::for_kind(PipelineKind::World, msaa),
            &[
                world_vert.stage(vk::ShaderStageFlags::VERTEX),
                world_frag.stage(vk::ShaderStageFlags::FRAGMENT),
            ],
            &[world_layout.layout],
            main_pass,
        )?;

        let shadow = Pipeline::new(
            Arc::clone(ctx),
            "shadow",
            &PipelineState::for_kind(PipelineKind::Shadow, msaa),
            &[shadow_vert.stage(vk::ShaderStageFlags::VERTEX)],
            &[],
            shadow_pass,
        )?;

        Ok(Self { sky, world, shadow })
    }

    pub fn get(&self, kind: PipelineKind) -> &Pipeline {
        match kind {
            PipelineKind::Sky => &self.sky,
            PipelineKind::World => &self.world,
            PipelineKind::Shadow => &self.shadow,
        }
    }
}

#[cfg(test)]
#[path = "vulkan_pipeline_tests.rs"]
mod tests;
