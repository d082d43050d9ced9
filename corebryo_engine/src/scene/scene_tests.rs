use glam::{Mat4, Vec3, Vec4};
use crate::renderer::{BufferHandle, Material, MeshBuffers};
use super::*;

fn cube_mesh() -> MeshBuffers {
    MeshBuffers::vertices_only(BufferHandle(1), 36)
}

fn spawn_renderable(scene: &mut Scene, position: Vec3) -> Entity {
    let entity = scene.create_entity();
    scene.insert_component(entity, TransformComponent::from_position(position));
    scene.insert_component(entity, MeshComponent::new(cube_mesh()));
    scene.insert_component(entity, MaterialComponent::default());
    entity
}

// ============================================================================
// Entities
// ============================================================================

#[test]
fn test_entity_ids_are_monotonic() {
    let mut scene = Scene::new();
    let a = scene.create_entity();
    let b = scene.create_entity();
    scene.destroy_entity(a);
    let c = scene.create_entity();

    assert_eq!(a.id(), 0);
    assert_eq!(b.id(), 1);
    assert_eq!(c.id(), 2);
    assert!(!scene.is_alive(a));
    assert_eq!(scene.entity_count(), 2);
}

#[test]
fn test_destroy_twice_reports_false() {
    let mut scene = Scene::new();
    let entity = scene.create_entity();

    assert!(scene.destroy_entity(entity));
    assert!(!scene.destroy_entity(entity));
    assert!(!scene.destroy_entity(Entity::from_raw(42)));
}

#[test]
fn test_destroy_drops_components() {
    let mut scene = Scene::new();
    let entity = spawn_renderable(&mut scene, Vec3::ZERO);

    scene.destroy_entity(entity);

    assert!(!scene.has_component::<TransformComponent>(entity));
    assert!(!scene.has_component::<MeshComponent>(entity));
    assert!(!scene.has_component::<MaterialComponent>(entity));
    assert!(scene.storage::<TransformComponent>().is_empty());
}

#[test]
fn test_components_refused_on_dead_entity() {
    let mut scene = Scene::new();
    let entity = scene.create_entity();
    scene.destroy_entity(entity);

    assert!(scene.add_component::<TransformComponent>(entity).is_none());
}

// ============================================================================
// Components
// ============================================================================

#[test]
fn test_add_component_defaults() {
    let mut scene = Scene::new();
    let entity = scene.create_entity();

    let transform = scene.add_component::<TransformComponent>(entity).cloned();
    assert_eq!(transform, Some(TransformComponent::default()));
    assert_eq!(scene.get_component::<TransformComponent>(entity).map(|t| t.scale), Some(Vec3::ONE));
}

#[test]
fn test_get_component_mut_edits_in_place() {
    let mut scene = Scene::new();
    let entity = scene.create_entity();
    scene.add_component::<MaterialComponent>(entity);

    if let Some(material) = scene.get_component_mut::<MaterialComponent>(entity) {
        material.material.alpha = 0.5;
    }

    assert_eq!(scene.get_component::<MaterialComponent>(entity).map(|m| m.material.alpha), Some(0.5));
}

#[test]
fn test_remove_component() {
    let mut scene = Scene::new();
    let entity = spawn_renderable(&mut scene, Vec3::ZERO);

    assert!(scene.remove_component::<MeshComponent>(entity).is_some());
    assert!(!scene.has_component::<MeshComponent>(entity));
    assert!(scene.is_alive(entity));
}

#[test]
fn test_model_matrix_order() {
    let transform = TransformComponent {
        position: Vec3::new(1.0, 2.0, 3.0),
        rotation: Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
        scale: Vec3::new(2.0, 1.0, 1.0),
    };

    // Scale X by 2, rotate +X onto +Y, then translate
    let p = transform.model_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
    assert!((p.truncate() - Vec3::new(1.0, 4.0, 3.0)).length() < 1e-5);
}

// ============================================================================
// Render list
// ============================================================================

#[test]
fn test_render_list_requires_all_three_components() {
    let mut scene = Scene::new();
    let full = spawn_renderable(&mut scene, Vec3::new(0.0, 0.0, -5.0));

    let partial = scene.create_entity();
    scene.add_component::<TransformComponent>(partial);
    scene.add_component::<MeshComponent>(partial);

    let items = scene.build_render_list();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].mesh, Some(cube_mesh()));
    assert_eq!(items[0].material, Some(Material::default()));
    assert_eq!(
        items[0].model,
        scene.get_component::<TransformComponent>(full).map(|t| t.model_matrix()).unwrap_or(Mat4::ZERO)
    );
}

#[test]
fn test_render_list_skips_dead_and_keeps_creation_order() {
    let mut scene = Scene::new();
    let a = spawn_renderable(&mut scene, Vec3::X);
    let b = spawn_renderable(&mut scene, Vec3::Y);
    let _c = spawn_renderable(&mut scene, Vec3::Z);
    scene.destroy_entity(b);

    // Re-inserting on `a` moves nothing in creation order
    scene.insert_component(a, TransformComponent::from_position(Vec3::X * 2.0));

    let items = scene.build_render_list();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].model.w_axis.truncate(), Vec3::X * 2.0);
    assert_eq!(items[1].model.w_axis.truncate(), Vec3::Z);
}

#[test]
fn test_empty_mesh_component_still_emits_item() {
    let mut scene = Scene::new();
    let entity = scene.create_entity();
    scene.add_component::<TransformComponent>(entity);
    scene.add_component::<MeshComponent>(entity);
    scene.add_component::<MaterialComponent>(entity);

    let items = scene.build_render_list();
    assert_eq!(items.len(), 1);
    assert!(items[0].mesh.is_none());
}
