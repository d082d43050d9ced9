/// Scene - entity lifetimes plus one sparse set per component type
///
/// Entity ids are handed out monotonically and never reused. Destroying an
/// entity drops its components; the id stays dead.

use super::component_storage::ComponentStorage;
use super::components::{MaterialComponent, MeshComponent, TransformComponent};
use crate::renderer::DrawItem;

/// Entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    /// Build an entity from a raw id, e.g. one read back from a save file
    pub fn from_raw(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A component type stored in `Scene`
pub trait Component: Default + Sized + 'static {
    fn storage(scene: &Scene) -> &ComponentStorage<Self>;
    fn storage_mut(scene: &mut Scene) -> &mut ComponentStorage<Self>;
}

macro_rules! impl_component {
    ($ty:ty, $field:ident) => {
        impl Component for $ty {
            fn storage(scene: &Scene) -> &ComponentStorage<Self> {
                &scene.$field
            }

            fn storage_mut(scene: &mut Scene) -> &mut ComponentStorage<Self> {
                &mut scene.$field
            }
        }
    };
}

impl_component!(TransformComponent, transforms);
impl_component!(MeshComponent, meshes);
impl_component!(MaterialComponent, materials);

#[derive(Debug, Default)]
pub struct Scene {
    alive: Vec<bool>,
    transforms: ComponentStorage<TransformComponent>,
    meshes: ComponentStorage<MeshComponent>,
    materials: ComponentStorage<MaterialComponent>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== ENTITIES =====

    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity(self.alive.len() as u32);
        self.alive.push(true);
        entity
    }

    /// Kill `entity` and drop its components. Returns false if it was not alive.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        self.alive[entity.index()] = false;
        self.transforms.remove(entity);
        self.meshes.remove(entity);
        self.materials.remove(entity);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    /// Live entities in creation order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(id, _)| Entity(id as u32))
    }

    pub fn entity_count(&self) -> usize {
        self.alive.iter().filter(|alive| **alive).count()
    }

    // ===== COMPONENTS =====

    /// Component `T` of `entity`, default-constructed if missing.
    /// Returns `None` for dead entities.
    pub fn add_component<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }
        Some(T::storage_mut(self).add(entity))
    }

    /// Store `value` as component `T` of `entity`, replacing any previous one
    pub fn insert_component<T: Component>(&mut self, entity: Entity, value: T) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }
        Some(T::storage_mut(self).insert(entity, value))
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        T::storage(self).get(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        T::storage_mut(self).get_mut(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        T::storage(self).contains(entity)
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        T::storage_mut(self).remove(entity)
    }

    pub fn storage<T: Component>(&self) -> &ComponentStorage<T> {
        T::storage(self)
    }

    // ===== RENDERING =====

    /// One `DrawItem` per live entity carrying transform, mesh and material,
    /// in creation order
    pub fn build_render_list(&self) -> Vec<DrawItem> {
        self.entities()
            .filter_map(|entity| {
                let transform = self.transforms.get(entity)?;
                let mesh = self.meshes.get(entity)?;
                let material = self.materials.get(entity)?;
                Some(DrawItem {
                    mesh: mesh.mesh,
                    material: Some(material.material),
                    model: transform.model_matrix(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
