//! GPU tests for VulkanRenderer
//!
//! These need a Vulkan device, a display and the assets tree (shaders plus
//! skyboxes.txt), so they are marked with #[ignore]. winit allows a single
//! event loop per process, hence one test walking the whole lifecycle.
//!
//! Run with: cargo test --test vulkan_renderer_tests -- --ignored

use corebryo_engine::corebryo::Renderer;
use corebryo_engine::corebryo::render::{
    DrawItem, FrameOutcome, Material, RendererConfig, CUBE_VERTICES,
};
use corebryo_engine::glam::{Mat4, Vec3};
use corebryo_engine_renderer_vulkan::VulkanRenderer;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Helper to create a hidden test window
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("Vulkan Renderer Test")
        .with_inner_size(winit::dpi::PhysicalSize::new(800, 600))
        .with_visible(false);
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

fn draw_until_presented(renderer: &mut VulkanRenderer) -> FrameOutcome {
    let mut outcome = FrameOutcome::Skipped;
    for _ in 0..4 {
        outcome = renderer.draw_frame(1.0 / 60.0).unwrap();
        if outcome == FrameOutcome::Presented {
            break;
        }
        if outcome.needs_resize() {
            renderer.on_resize(800, 600).unwrap();
        }
    }
    outcome
}

#[test]
#[ignore] // Requires GPU, display and assets
fn test_vulkan_renderer_lifecycle() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = VulkanRenderer::new(&window, RendererConfig::default()).unwrap();

    // Default catalog entry is resident right after creation
    assert!(renderer.is_skybox_ready());
    let names = renderer.skybox_names();
    assert!(!names.is_empty());
    assert!(names.iter().any(|name| Some(name.as_str()) == renderer.active_skybox_name()));

    // Empty scene still clears, draws the sky and presents
    assert_eq!(draw_until_presented(&mut renderer), FrameOutcome::Presented);
    assert_eq!(renderer.stats().triangles, 0);

    // One lit cube
    let cube = renderer.create_mesh(&CUBE_VERTICES, None).unwrap();
    assert_eq!(cube.vertex_count(), 36);
    renderer.set_render_items(vec![DrawItem::new(
        cube.buffers(),
        Material {
            base_color: Vec3::new(0.8, 0.3, 0.2),
            ambient: 0.1,
            alpha: 1.0,
            texture: None,
        },
        Mat4::IDENTITY,
    )]);
    assert_eq!(draw_until_presented(&mut renderer), FrameOutcome::Presented);
    let stats = renderer.stats();
    assert_eq!(stats.triangles, 12);
    assert_eq!(stats.vertices, 36);
    assert!(stats.draw_calls >= 3);

    // Same cube with a 2x2 checker texture; malformed texel data is refused
    assert!(renderer.create_texture(2, 2, &[255; 12]).is_err());
    let checker: Vec<u8> = [[255, 255, 255, 255], [0, 0, 0, 255], [0, 0, 0, 255], [255, 255, 255, 255]].concat();
    let texture = renderer.create_texture(2, 2, &checker).unwrap();
    renderer.set_render_items(vec![DrawItem::new(
        cube.buffers(),
        Material { texture: Some(texture), ..Material::default() },
        Mat4::IDENTITY,
    )]);
    assert_eq!(draw_until_presented(&mut renderer), FrameOutcome::Presented);
    assert_eq!(renderer.stats().triangles, 12);

    // Zero-sized resize skips frames instead of failing
    renderer.on_resize(0, 0).unwrap();
    assert!(matches!(
        renderer.draw_frame(1.0 / 60.0).unwrap(),
        FrameOutcome::Skipped | FrameOutcome::SkippedStale
    ));
    renderer.on_resize(800, 600).unwrap();
    assert_eq!(draw_until_presented(&mut renderer), FrameOutcome::Presented);

    // Unknown skybox keeps the current one
    let active = renderer.active_skybox_name().map(str::to_string);
    assert!(renderer.set_active_skybox("no-such-skybox").is_err());
    assert_eq!(renderer.active_skybox_name().map(str::to_string), active);

    // Switching to another catalog entry
    let last = names.last().unwrap().clone();
    renderer.set_active_skybox(&last).unwrap();
    assert_eq!(renderer.active_skybox_name(), Some(last.as_str()));
    assert_eq!(draw_until_presented(&mut renderer), FrameOutcome::Presented);

    renderer.set_render_items(Vec::new());
    renderer.wait_idle().unwrap();
    drop(cube);
}
