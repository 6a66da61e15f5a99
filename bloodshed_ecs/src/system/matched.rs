//! Set of entities handled by one system.

use slotmap::SecondaryMap;

use crate::EntityHandle;

/// Unordered set of entity handles with constant time insertion,
/// removal and membership test.
///
/// Handles are stored densely, so iteration over the set
/// is as cheap as iteration over a slice.
///
#[derive(Debug, Default)]
pub(crate) struct MatchedSet {
    entities: Vec<EntityHandle>,
    positions: SecondaryMap<EntityHandle, usize>,
}

impl MatchedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the entity was already in the set.
    pub fn insert(&mut self, handle: EntityHandle) -> bool {
        if self.positions.contains_key(handle) {
            return false;
        }
        self.positions.insert(handle, self.entities.len());
        self.entities.push(handle);
        true
    }

    /// Returns `false` if there was no such entity in the set.
    pub fn remove(&mut self, handle: EntityHandle) -> bool {
        let position = match self.positions.remove(handle) {
            Some(position) => position,
            None => return false,
        };
        self.entities.swap_remove(position);
        if let Some(&moved) = self.entities.get(position) {
            self.positions[moved] = position;
        }
        true
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.positions.contains_key(handle)
    }

    pub fn as_slice(&self) -> &[EntityHandle] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityStorage};

    #[test]
    fn test_insert_remove() {
        let mut entities = EntityStorage::with_key();
        let handles: Vec<_> = (0..4).map(|_| entities.insert(Entity::new())).collect();

        let mut set = MatchedSet::new();
        for &handle in &handles {
            assert!(set.insert(handle));
        }
        assert!(!set.insert(handles[2]));
        assert_eq!(set.len(), 4);

        assert!(set.remove(handles[0]));
        assert!(!set.remove(handles[0]));
        assert!(!set.contains(handles[0]));
        assert_eq!(set.as_slice(), &[handles[3], handles[1], handles[2]]);

        // position of the moved handle must be updated
        assert!(set.remove(handles[3]));
        assert_eq!(set.as_slice(), &[handles[2], handles[1]]);
        assert!(set.contains(handles[1]) && set.contains(handles[2]));
    }

    #[test]
    fn test_stale_handle() {
        let mut entities = EntityStorage::with_key();
        let stale = entities.insert(Entity::new());
        entities.remove(stale);
        let fresh = entities.insert(Entity::new());

        let mut set = MatchedSet::new();
        set.insert(fresh);
        assert!(!set.contains(stale));
        assert!(!set.remove(stale));
        assert_eq!(set.len(), 1);
    }
}
