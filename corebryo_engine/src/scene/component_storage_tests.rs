use super::*;
use crate::scene::Entity;

fn e(id: u32) -> Entity {
    Entity::from_raw(id)
}

#[test]
fn test_insert_and_get() {
    let mut storage = ComponentStorage::new();
    storage.insert(e(3), 30u32);
    storage.insert(e(0), 10u32);

    assert_eq!(storage.len(), 2);
    assert_eq!(storage.get(e(3)), Some(&30));
    assert_eq!(storage.get(e(0)), Some(&10));
    assert_eq!(storage.get(e(1)), None);
    assert_eq!(storage.get(e(99)), None);
}

#[test]
fn test_add_returns_existing_component() {
    let mut storage: ComponentStorage<u32> = ComponentStorage::new();

    *storage.add(e(2)) = 7;
    let again = storage.add(e(2));

    assert_eq!(*again, 7);
    assert_eq!(storage.len(), 1);
}

#[test]
fn test_insert_replaces() {
    let mut storage = ComponentStorage::new();
    storage.insert(e(1), "old");
    storage.insert(e(1), "new");

    assert_eq!(storage.len(), 1);
    assert_eq!(storage.get(e(1)), Some(&"new"));
}

#[test]
fn test_remove_swaps_last_into_hole() {
    let mut storage = ComponentStorage::new();
    storage.insert(e(0), 'a');
    storage.insert(e(1), 'b');
    storage.insert(e(2), 'c');

    assert_eq!(storage.remove(e(0)), Some('a'));

    // Entity 2 moved into slot 0 and is still reachable by id
    assert_eq!(storage.entities(), &[e(2), e(1)]);
    assert_eq!(storage.get(e(2)), Some(&'c'));
    assert_eq!(storage.get(e(1)), Some(&'b'));
    assert!(!storage.contains(e(0)));
}

#[test]
fn test_remove_last_and_missing() {
    let mut storage = ComponentStorage::new();
    storage.insert(e(5), 1.5f32);

    assert_eq!(storage.remove(e(4)), None);
    assert_eq!(storage.remove(e(5)), Some(1.5));
    assert_eq!(storage.remove(e(5)), None);
    assert!(storage.is_empty());
}

#[test]
fn test_reinsert_after_remove() {
    let mut storage = ComponentStorage::new();
    storage.insert(e(0), 1);
    storage.insert(e(1), 2);
    storage.remove(e(0));
    storage.insert(e(0), 3);

    assert_eq!(storage.get(e(0)), Some(&3));
    assert_eq!(storage.get(e(1)), Some(&2));
    assert_eq!(storage.len(), 2);
}

#[test]
fn test_iter_is_dense() {
    let mut storage = ComponentStorage::new();
    for id in 0..5 {
        storage.insert(e(id), id * 10);
    }
    storage.remove(e(1));
    storage.remove(e(3));

    let mut seen: Vec<(u32, u32)> = storage.iter().map(|(entity, v)| (entity.id(), *v)).collect();
    seen.sort();
    assert_eq!(seen, vec![(0, 0), (2, 20), (4, 40)]);

    for (_, value) in storage.iter_mut() {
        *value += 1;
    }
    assert_eq!(storage.get(e(4)), Some(&41));
}
