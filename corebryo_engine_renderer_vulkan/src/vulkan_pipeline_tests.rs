//! Unit tests for the fixed-function state of each pipeline

use super::*;

const MSAA: vk::SampleCountFlags = vk::SampleCountFlags::TYPE_4;

#[test]
fn test_sky_never_writes_depth() {
    let sky = PipelineState::for_kind(PipelineKind::Sky, MSAA);
    assert!(sky.depth_test);
    assert!(!sky.depth_write);
    assert_eq!(sky.depth_compare, vk::CompareOp::ALWAYS);
    assert_eq!(sky.cull_mode, vk::CullModeFlags::FRONT);
    assert_eq!(sky.vertex_stride, 12);
    assert_eq!(sky.attributes.len(), 1);
    assert_eq!(sky.push_size, 128);
    assert_eq!(sky.push_stages, vk::ShaderStageFlags::VERTEX);
}

#[test]
fn test_world_blends_and_writes_depth() {
    let world = PipelineState::for_kind(PipelineKind::World, MSAA);
    assert!(world.depth_write);
    assert_eq!(world.depth_compare, vk::CompareOp::LESS);
    assert_eq!(world.samples, MSAA);
    assert_eq!(world.vertex_stride, 20);
    assert_eq!(world.attributes, &[(0, vk::Format::R32G32B32_SFLOAT, 0), (1, vk::Format::R32G32_SFLOAT, 12)]);
    assert_eq!(world.push_size, 160);
    assert_eq!(world.push_stages, vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT);

    let blend = world.blend_attachment().expect("world pipeline has a color attachment");
    assert_eq!(blend.blend_enable, vk::TRUE);
    assert_eq!(blend.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
    assert_eq!(blend.dst_color_blend_factor, vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
    assert_eq!(blend.src_alpha_blend_factor, vk::BlendFactor::ONE);
    assert_eq!(blend.dst_alpha_blend_factor, vk::BlendFactor::ZERO);
}

#[test]
fn test_shadow_is_depth_only_single_sample() {
    let shadow = PipelineState::for_kind(PipelineKind::Shadow, MSAA);
    assert_eq!(shadow.color, ColorOutput::None);
    assert!(shadow.blend_attachment().is_none());
    assert_eq!(shadow.samples, vk::SampleCountFlags::TYPE_1);
    assert!(shadow.depth_test && shadow.depth_write);
    assert_eq!(shadow.push_size, 128);
}

#[test]
fn test_only_sky_culls() {
    for kind in [PipelineKind::World, PipelineKind::Shadow] {
        assert_eq!(PipelineState::for_kind(kind, MSAA).cull_mode, vk::CullModeFlags::NONE);
    }
}
