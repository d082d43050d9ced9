/*!
# Corebryo Engine

Platform-agnostic core of the Corebryo real-time renderer.

The crate owns everything that can be reasoned about without a GPU: the frame
orchestrator and the backend traits it drives, the fly camera, input
resolution, the sparse-set scene, and the skybox asset pipeline (Radiance HDR
decoding, cubemap conversion and the `skyboxes.txt` catalog). The Vulkan
backend lives in `corebryo_engine_renderer_vulkan`.

## Architecture

- **FrameRenderer**: wait, acquire, record shadow + main passes, submit, present
- **FrameDevice**: backend operations a frame is built from
- **CommandList**: backend command recording
- **Renderer**: object-safe frame interface registered with the `Engine` singleton
- **Scene**: entities with transform, mesh and material components
- **SkyboxCatalog**: named HDR environments resolved from the assets directory
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod renderer;
pub mod camera;
pub mod input;
pub mod scene;
pub mod skybox;

// Main corebryo namespace module
pub mod corebryo {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Frame interface
    pub use crate::renderer::Renderer;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Render sub-module with all rendering types
    pub mod render {
        pub use crate::renderer::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod input {
        pub use crate::input::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod skybox {
        pub use crate::skybox::*;
    }
}

// Re-export math library at crate root
pub use glam;
