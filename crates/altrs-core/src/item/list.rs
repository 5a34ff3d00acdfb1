// Altrs Named Item List
// Ordered registry with id/name lookup and wrap-around navigation

use crate::ids::{is_concrete, ItemId};

use super::named::{ItemChange, Named};

/// Ordered list of named items.
///
/// Sentinel entries (non-positive ids, e.g. the "any mode" default) may be
/// stored alongside real items; navigation skips them.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedItemList<T> {
    items: Vec<T>,
}

impl<T> Default for NamedItemList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Named> NamedItemList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get_by_id(&self, id: ItemId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_by_id_mut(&mut self, id: ItemId) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Case-insensitive lookup by name
    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.items
            .iter()
            .find(|item| item.name().eq_ignore_ascii_case(name))
    }

    pub fn contains_id(&self, id: ItemId) -> bool {
        self.get_by_id(id).is_some()
    }

    /// Append an item. Returns `None` (and drops the item) if the id is taken.
    pub fn add(&mut self, item: T) -> Option<ItemChange> {
        if self.contains_id(item.id()) {
            return None;
        }
        let change = ItemChange::Added {
            id: item.id(),
            name: item.name().to_string(),
        };
        self.items.push(item);
        Some(change)
    }

    /// Remove an item by id
    pub fn remove(&mut self, id: ItemId) -> Option<(T, ItemChange)> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some((self.items.remove(index), ItemChange::Removed { id }))
    }

    /// Rename an item, reporting a change only when the name differs
    pub fn rename(&mut self, id: ItemId, name: impl Into<String>) -> Option<ItemChange> {
        let name = name.into();
        let item = self.get_by_id_mut(id)?;
        if item.name() == name {
            return None;
        }
        let old_name = item.name().to_string();
        item.set_name(name.clone());
        Some(ItemChange::Renamed {
            id,
            old_name,
            new_name: name,
        })
    }

    /// Ids of real (positive-id) items in list order
    pub fn positive_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .map(|item| item.id())
            .filter(|id| is_concrete(*id))
            .collect()
    }

    /// Id of the item after `id`, wrapping from the last to the first.
    ///
    /// With fewer than two real items this returns `id` unchanged. An id that
    /// is not in the list (e.g. a wildcard) moves to the first real item.
    pub fn find_next_id(&self, id: ItemId) -> ItemId {
        let ids = self.positive_ids();
        if ids.len() < 2 {
            return id;
        }
        match ids.iter().position(|candidate| *candidate == id) {
            Some(index) => ids[(index + 1) % ids.len()],
            None => ids[0],
        }
    }

    /// Id of the item before `id`, wrapping from the first to the last.
    ///
    /// Mirrors [`find_next_id`](Self::find_next_id); an unknown id moves to
    /// the last real item.
    pub fn find_previous_id(&self, id: ItemId) -> ItemId {
        let ids = self.positive_ids();
        if ids.len() < 2 {
            return id;
        }
        match ids.iter().position(|candidate| *candidate == id) {
            Some(index) => ids[(index + ids.len() - 1) % ids.len()],
            None => ids[ids.len() - 1],
        }
    }

    /// Smallest positive id not used by any item
    pub fn first_unused_id(&self) -> ItemId {
        let mut id = 1;
        while self.contains_id(id) {
            id += 1;
        }
        id
    }

    /// First name of the form "`prefix` N" (N from 1) not used by any item
    pub fn unique_name(&self, prefix: &str) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("{} {}", prefix, n);
            if self.get_by_name(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl<T: Named> FromIterator<T> for NamedItemList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            list.add(item);
        }
        list
    }
}

impl<'a, T> IntoIterator for &'a NamedItemList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::DEFAULT_ID;
    use crate::item::NamedItem;

    fn modes() -> NamedItemList<NamedItem> {
        [
            NamedItem::new(DEFAULT_ID, "Any mode"),
            NamedItem::new(1, "Normal"),
            NamedItem::new(4, "Mouse"),
            NamedItem::new(2, "Typing"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_next_wraps_to_first_positive() {
        let list = modes();
        assert_eq!(list.find_next_id(1), 4);
        assert_eq!(list.find_next_id(4), 2);
        assert_eq!(list.find_next_id(2), 1);
    }

    #[test]
    fn test_previous_wraps_to_last_positive() {
        let list = modes();
        assert_eq!(list.find_previous_id(1), 2);
        assert_eq!(list.find_previous_id(2), 4);
        assert_eq!(list.find_previous_id(4), 1);
    }

    #[test]
    fn test_navigation_noop_with_one_or_zero_positive() {
        let single: NamedItemList<NamedItem> = [
            NamedItem::new(DEFAULT_ID, "Any"),
            NamedItem::new(3, "Only"),
        ]
        .into_iter()
        .collect();
        assert_eq!(single.find_next_id(3), 3);
        assert_eq!(single.find_previous_id(3), 3);

        let empty: NamedItemList<NamedItem> = NamedItemList::new();
        assert_eq!(empty.find_next_id(7), 7);
        assert_eq!(empty.find_previous_id(7), 7);
    }

    #[test]
    fn test_navigation_from_unknown_id() {
        let list = modes();
        assert_eq!(list.find_next_id(DEFAULT_ID), 1);
        assert_eq!(list.find_previous_id(DEFAULT_ID), 2);
    }

    #[test]
    fn test_first_unused_id_and_unique_name() {
        let mut list = modes();
        assert_eq!(list.first_unused_id(), 3);
        assert_eq!(list.unique_name("Mode"), "Mode 1");
        list.add(NamedItem::new(3, "Mode 1"));
        assert_eq!(list.first_unused_id(), 5);
        assert_eq!(list.unique_name("mode"), "mode 2");
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut list = modes();
        assert!(list.add(NamedItem::new(1, "Again")).is_none());
        assert_eq!(list.len(), 4);
        assert_eq!(
            list.add(NamedItem::new(9, "New")),
            Some(ItemChange::Added {
                id: 9,
                name: "New".to_string()
            })
        );
    }

    #[test]
    fn test_rename_and_remove() {
        let mut list = modes();
        assert_eq!(
            list.rename(4, "Pointer"),
            Some(ItemChange::Renamed {
                id: 4,
                old_name: "Mouse".to_string(),
                new_name: "Pointer".to_string()
            })
        );
        assert_eq!(list.rename(4, "Pointer"), None);
        assert_eq!(list.get_by_name("pointer").map(|i| i.id()), Some(4));

        let (removed, change) = list.remove(4).unwrap();
        assert_eq!(removed.name(), "Pointer");
        assert_eq!(change, ItemChange::Removed { id: 4 });
        assert!(list.remove(4).is_none());
    }
}
