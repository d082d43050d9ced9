/// ComponentStorage - packed component array with stable entity lookup.
///
/// Components live contiguously in `components`; `entities[i]` names the owner
/// of `components[i]`, and `index_by_entity[entity]` points back into the dense
/// arrays. Removal swaps the last element into the hole, so iteration stays
/// dense and entity ids stay valid.

use super::Entity;

/// Sentinel for "entity has no component here"
const INVALID_INDEX: u32 = u32::MAX;

/// Sparse-set storage for one component type
#[derive(Debug, Clone)]
pub struct ComponentStorage<T> {
    components: Vec<T>,
    entities: Vec<Entity>,
    index_by_entity: Vec<u32>,
}

impl<T> ComponentStorage<T> {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            entities: Vec::new(),
            index_by_entity: Vec::new(),
        }
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|i| &self.components[i])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(move |i| &mut self.components[i])
    }

    /// Store `value` for `entity`, replacing any existing component
    pub fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        if let Some(i) = self.dense_index(entity) {
            self.components[i] = value;
            return &mut self.components[i];
        }

        self.ensure_size(entity);
        let index = self.components.len();
        self.components.push(value);
        self.entities.push(entity);
        self.index_by_entity[entity.index()] = index as u32;
        &mut self.components[index]
    }

    /// Remove the component of `entity`, moving the last component into its slot
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let index = self.dense_index(entity)?;
        let last = self.components.len() - 1;

        if index != last {
            let moved = self.entities[last];
            self.index_by_entity[moved.index()] = index as u32;
        }

        self.index_by_entity[entity.index()] = INVALID_INDEX;
        self.entities.swap_remove(index);
        Some(self.components.swap_remove(index))
    }

    pub fn clear(&mut self) {
        self.components.clear();
        self.entities.clear();
        self.index_by_entity.clear();
    }

    /// Dense iteration in storage order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.components.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.components.iter_mut())
    }

    /// Owners in storage order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        match self.index_by_entity.get(entity.index()) {
            Some(&i) if i != INVALID_INDEX => Some(i as usize),
            _ => None,
        }
    }

    fn ensure_size(&mut self, entity: Entity) {
        if entity.index() >= self.index_by_entity.len() {
            self.index_by_entity.resize(entity.index() + 1, INVALID_INDEX);
        }
    }
}

impl<T: Default> ComponentStorage<T> {
    /// Component of `entity`, created with `T::default()` if missing
    pub fn add(&mut self, entity: Entity) -> &mut T {
        if let Some(i) = self.dense_index(entity) {
            return &mut self.components[i];
        }
        self.insert(entity, T::default())
    }
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "component_storage_tests.rs"]
mod tests;
