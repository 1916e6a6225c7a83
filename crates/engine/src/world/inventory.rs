use thiserror::Error;

use super::entity::EntityId;

pub const DEFAULT_INVENTORY_WINDOW_SLOTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("item {0} is already in the inventory")]
    DuplicateItem(EntityId),
    #[error("item {0} is not in the inventory")]
    NotFound(EntityId),
}

/// The visible page of the inventory bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryWindow<'a> {
    pub slots: &'a [EntityId],
    pub offset: usize,
    pub total: usize,
    pub capacity: usize,
}

impl InventoryWindow<'_> {
    pub fn can_scroll_back(&self) -> bool {
        self.offset > 0
    }

    pub fn can_scroll_forward(&self) -> bool {
        self.offset + self.slots.len() < self.total
    }
}

/// Picked-up items in pickup order. Holds ids only; the entities stay in the
/// scene they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<EntityId>,
    window_slots: usize,
    scroll_offset: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_window_slots(DEFAULT_INVENTORY_WINDOW_SLOTS)
    }
}

impl Inventory {
    pub fn with_window_slots(window_slots: usize) -> Self {
        Self {
            items: Vec::new(),
            window_slots: window_slots.max(1),
            scroll_offset: 0,
        }
    }

    pub fn add(&mut self, item: EntityId) -> Result<(), InventoryError> {
        if self.has(item) {
            return Err(InventoryError::DuplicateItem(item));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn remove(&mut self, item: EntityId) -> Result<(), InventoryError> {
        let index = self
            .items
            .iter()
            .position(|existing| *existing == item)
            .ok_or(InventoryError::NotFound(item))?;
        self.items.remove(index);
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
        Ok(())
    }

    pub fn has(&self, item: EntityId) -> bool {
        self.items.contains(&item)
    }

    pub fn items(&self) -> &[EntityId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn window_slots(&self) -> usize {
        self.window_slots
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn window(&self) -> InventoryWindow<'_> {
        let end = (self.scroll_offset + self.window_slots).min(self.items.len());
        InventoryWindow {
            slots: &self.items[self.scroll_offset..end],
            offset: self.scroll_offset,
            total: self.items.len(),
            capacity: self.window_slots,
        }
    }

    /// Scrolls by `delta` items, clamped to both ends. Returns the new offset.
    pub fn scroll_by(&mut self, delta: isize) -> usize {
        let target = if delta.is_negative() {
            self.scroll_offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll_offset.saturating_add(delta as usize)
        };
        self.scroll_offset = target.min(self.max_offset());
        self.scroll_offset
    }

    fn max_offset(&self) -> usize {
        self.items.len().saturating_sub(self.window_slots)
    }

    pub(crate) fn restore(
        &mut self,
        items: Vec<EntityId>,
        scroll_offset: usize,
    ) -> Result<(), InventoryError> {
        let mut restored = Inventory::with_window_slots(self.window_slots);
        for item in items {
            restored.add(item)?;
        }
        restored.scroll_offset = scroll_offset.min(restored.max_offset());
        *self = restored;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(count: u32) -> Inventory {
        let mut inventory = Inventory::default();
        for id in 0..count {
            inventory.add(EntityId(id)).expect("add");
        }
        inventory
    }

    #[test]
    fn add_rejects_duplicates_and_keeps_order() {
        let mut inventory = Inventory::default();
        inventory.add(EntityId(3)).expect("first");
        inventory.add(EntityId(1)).expect("second");
        assert_eq!(
            inventory.add(EntityId(3)),
            Err(InventoryError::DuplicateItem(EntityId(3)))
        );
        assert_eq!(inventory.items(), &[EntityId(3), EntityId(1)]);
    }

    #[test]
    fn remove_preserves_remaining_order() {
        let mut inventory = filled(4);
        inventory.remove(EntityId(1)).expect("remove");
        assert_eq!(inventory.items(), &[EntityId(0), EntityId(2), EntityId(3)]);
        assert_eq!(
            inventory.remove(EntityId(1)),
            Err(InventoryError::NotFound(EntityId(1)))
        );
    }

    #[test]
    fn window_shows_eight_slots() {
        let inventory = filled(11);
        let window = inventory.window();
        assert_eq!(window.slots.len(), 8);
        assert_eq!(window.offset, 0);
        assert!(!window.can_scroll_back());
        assert!(window.can_scroll_forward());
    }

    #[test]
    fn scroll_clamps_at_both_ends() {
        let mut inventory = filled(11);
        assert_eq!(inventory.scroll_by(-2), 0);
        assert_eq!(inventory.scroll_by(2), 2);
        assert_eq!(inventory.scroll_by(10), 3);
        let window = inventory.window();
        assert_eq!(window.slots.first(), Some(&EntityId(3)));
        assert_eq!(window.slots.last(), Some(&EntityId(10)));
        assert!(!window.can_scroll_forward());
        assert_eq!(inventory.scroll_by(-100), 0);
    }

    #[test]
    fn short_inventory_cannot_scroll() {
        let mut inventory = filled(3);
        assert_eq!(inventory.scroll_by(5), 0);
        assert_eq!(inventory.window().slots.len(), 3);
    }

    #[test]
    fn removing_reclamps_offset() {
        let mut inventory = filled(10);
        assert_eq!(inventory.scroll_by(2), 2);
        inventory.remove(EntityId(9)).expect("remove");
        assert_eq!(inventory.scroll_offset(), 1);
    }

    #[test]
    fn restore_rejects_duplicate_ids() {
        let mut inventory = filled(2);
        let err = inventory
            .restore(vec![EntityId(5), EntityId(5)], 0)
            .expect_err("duplicate");
        assert_eq!(err, InventoryError::DuplicateItem(EntityId(5)));
        assert_eq!(inventory.items(), &[EntityId(0), EntityId(1)]);
    }
}
