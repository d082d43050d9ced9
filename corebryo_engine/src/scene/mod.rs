//! Scene module
//!
//! Entities with transform, mesh and material components kept in sparse
//! sets, flattened into draw items once per frame.

mod component_storage;
mod components;
mod scene;

pub use component_storage::ComponentStorage;
pub use components::{MaterialComponent, MeshComponent, TransformComponent};
pub use scene::{Component, Entity, Scene};
