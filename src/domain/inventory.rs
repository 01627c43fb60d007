// Fixed-slot player inventory and its pick-up/drop transitions.

use crate::domain::errors::SyncError;
use crate::domain::state::{Item, ItemId, PlayerId};

pub const INVENTORY_SLOTS: usize = 3;

/// Result of offering an item to the selected slot.
#[derive(Debug, Clone, PartialEq)]
pub enum PickupOutcome {
    Stored { slot: usize },
    // The selected slot already holds something; the item is handed back untouched.
    Occupied { item: Item },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    slots: [Option<Item>; INVENTORY_SLOTS],
    selected_slot: usize,
}

impl Inventory {
    pub fn selected_slot(&self) -> usize {
        self.selected_slot
    }

    pub fn select_slot(&mut self, player_id: PlayerId, slot: usize) -> Result<(), SyncError> {
        if slot >= INVENTORY_SLOTS {
            return Err(SyncError::InvalidSlot { player_id, slot });
        }
        self.selected_slot = slot;
        Ok(())
    }

    pub fn is_selected_slot_free(&self) -> bool {
        self.slots[self.selected_slot].is_none()
    }

    /// Stores the item in the selected slot only; other free slots are never searched.
    pub fn pick_up(&mut self, item: Item) -> PickupOutcome {
        let slot = self.selected_slot;
        match self.slots[slot] {
            None => {
                self.slots[slot] = Some(item);
                PickupOutcome::Stored { slot }
            }
            Some(_) => PickupOutcome::Occupied { item },
        }
    }

    /// Finds the slot holding `item_id`, empties it and returns the item.
    pub fn drop_item(&mut self, item_id: ItemId) -> Option<Item> {
        let index = self.slot_of(item_id)?;
        self.slots[index].take()
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.slot_of(item_id).is_some()
    }

    pub fn slot(&self, index: usize) -> Option<&Item> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> &[Option<Item>; INVENTORY_SLOTS] {
        &self.slots
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.slots.iter().flatten()
    }

    /// Empties every slot, e.g. when the owner leaves the session.
    pub fn take_all(&mut self) -> Vec<Item> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    // Linear scan is fine for three slots.
    fn slot_of(&self, item_id: ItemId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|item| item.id == item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::ItemType;

    fn coin(id: ItemId) -> Item {
        Item::new(id, ItemType::Coin, 10.0, 10.0)
    }

    #[test]
    fn when_selected_slot_is_empty_then_pick_up_stores_item_there() {
        let mut inventory = Inventory::default();
        inventory.select_slot(1, 2).expect("slot 2 is valid");

        let outcome = inventory.pick_up(coin(42));

        assert_eq!(outcome, PickupOutcome::Stored { slot: 2 });
        assert_eq!(inventory.slot(2).map(|item| item.id), Some(42));
        assert!(inventory.slot(0).is_none());
    }

    #[test]
    fn when_selected_slot_is_occupied_then_pick_up_hands_item_back() {
        let mut inventory = Inventory::default();
        inventory.pick_up(coin(1));

        // Slots 1 and 2 are free but pick-up only ever targets the selected slot.
        let outcome = inventory.pick_up(coin(2));

        assert_eq!(outcome, PickupOutcome::Occupied { item: coin(2) });
        assert_eq!(inventory.items().count(), 1);
        assert!(!inventory.contains(2));
    }

    #[test]
    fn when_item_is_held_then_drop_clears_its_slot_and_returns_it() {
        let mut inventory = Inventory::default();
        inventory.select_slot(1, 1).expect("slot 1 is valid");
        inventory.pick_up(coin(9));

        let dropped = inventory.drop_item(9);

        assert_eq!(dropped.map(|item| item.id), Some(9));
        assert!(inventory.slot(1).is_none());
        assert_eq!(inventory.slots().len(), INVENTORY_SLOTS);
    }

    #[test]
    fn when_item_is_not_held_then_drop_returns_none() {
        let mut inventory = Inventory::default();
        inventory.pick_up(coin(3));

        assert!(inventory.drop_item(4).is_none());
        assert!(inventory.contains(3));
    }

    #[test]
    fn when_slot_is_out_of_range_then_select_is_rejected() {
        let mut inventory = Inventory::default();

        let result = inventory.select_slot(5, INVENTORY_SLOTS);

        assert_eq!(
            result,
            Err(SyncError::InvalidSlot {
                player_id: 5,
                slot: INVENTORY_SLOTS
            })
        );
        assert_eq!(inventory.selected_slot(), 0);
    }

    #[test]
    fn take_all_empties_every_slot() {
        let mut inventory = Inventory::default();
        inventory.pick_up(coin(1));
        inventory.select_slot(1, 2).expect("slot 2 is valid");
        inventory.pick_up(coin(2));

        let taken = inventory.take_all();

        assert_eq!(taken.len(), 2);
        assert!(inventory.items().next().is_none());
    }
}
