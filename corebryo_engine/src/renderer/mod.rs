/// Renderer module - frame orchestration and the types a backend implements

pub mod config;
pub mod command_list;
pub mod draw_item;
pub mod push_constants;
pub mod light;
pub mod overlay;
pub mod swapchain;
pub mod frame_device;
pub mod frame;
pub mod renderer;

#[cfg(test)]
pub mod mock_renderer;

pub use config::*;
pub use command_list::*;
pub use draw_item::*;
pub use push_constants::*;
pub use light::*;
pub use overlay::*;
pub use swapchain::*;
pub use frame_device::*;
pub use frame::*;
pub use renderer::*;

