//! Inventory: stacking order, bag contents, equip/unequip and weight.

use wayfarer_core::{
    config::GameData,
    error::GameError,
    inventory::{EquipmentSlot, Inventory, ItemStack, SlotRef, GENERAL_SLOTS},
};

fn stack(item: &str, quantity: u32) -> Option<ItemStack> {
    Some(ItemStack { item: item.into(), quantity })
}

fn with_bag(data: &GameData) -> Inventory {
    let mut inv = Inventory::new();
    inv.add_item(data, "backpack", 1).unwrap();
    inv.equip(data, SlotRef::General(0)).unwrap();
    inv
}

/// Without a bag, items stack into general slots up to the stack limit.
#[test]
fn stacks_fill_general_slots() {
    let data = GameData::default_test();
    let mut inv = Inventory::new();

    assert_eq!(inv.add_item(&data, "bread", 4).unwrap(), 4);
    assert_eq!(inv.add_item(&data, "bread", 8).unwrap(), 8);
    assert_eq!(inv.general_slots[0], stack("bread", 10));
    assert_eq!(inv.general_slots[1], stack("bread", 2));
    assert_eq!(inv.count_item("bread"), 12);
}

/// With a bag, existing stacks are topped up before empty slots are used,
/// and the bag is preferred over general slots.
#[test]
fn stacking_prefers_existing_stacks_then_bag() {
    let data = GameData::default_test();
    let mut inv = with_bag(&data);
    inv.general_slots[2] = stack("bread", 9);

    inv.add_item(&data, "bread", 3).unwrap();
    assert_eq!(inv.general_slots[2], stack("bread", 10), "existing stack topped up first");
    assert_eq!(inv.backpack()[0], stack("bread", 2), "overflow goes to the bag");

    inv.add_item(&data, "dagger", 1).unwrap();
    assert_eq!(inv.backpack()[1], stack("dagger", 1));
    assert!(inv.general_slots[0].is_none());
}

/// A partial fit adds what it can; no fit is an error.
#[test]
fn full_inventory_rejects_items() {
    let data = GameData::default_test();
    let mut inv = Inventory::new();
    for _ in 0..GENERAL_SLOTS {
        inv.add_item(&data, "longsword", 1).unwrap();
    }
    let err = inv.add_item(&data, "dagger", 1).unwrap_err();
    assert!(matches!(err, GameError::InventoryFull { .. }));

    let mut inv = Inventory::new();
    for _ in 0..GENERAL_SLOTS - 1 {
        inv.add_item(&data, "longsword", 1).unwrap();
    }
    assert_eq!(inv.add_item(&data, "iron-ingot", 12).unwrap(), 5);
}

/// Unknown items are rejected before anything changes.
#[test]
fn unknown_item_is_rejected() {
    let data = GameData::default_test();
    let mut inv = Inventory::new();
    assert!(matches!(
        inv.add_item(&data, "unobtainium", 1),
        Err(GameError::ItemNotFound { .. })
    ));
    assert_eq!(inv, Inventory::new());
}

/// Removal by id drains general slots before the bag.
#[test]
fn remove_item_drains_general_first() {
    let data = GameData::default_test();
    let mut inv = with_bag(&data);
    inv.general_slots[3] = stack("bread", 3);
    inv.add_item(&data, "bread", 7).unwrap();
    assert_eq!(inv.general_slots[3], stack("bread", 10));

    inv.general_slots[3] = stack("bread", 3);
    *inv.slot_mut(SlotRef::Backpack(0)).unwrap() = stack("bread", 4);
    assert_eq!(inv.remove_item("bread", 5), 5);
    assert!(inv.general_slots[3].is_none());
    assert_eq!(inv.backpack()[0], stack("bread", 2));
    assert_eq!(inv.remove_item("bread", 10), 2);
}

/// Moving merges same items up to the limit and swaps anything else.
#[test]
fn move_merges_or_swaps() {
    let data = GameData::default_test();
    let mut inv = Inventory::new();
    inv.general_slots[0] = stack("bread", 7);
    inv.general_slots[1] = stack("bread", 6);
    inv.general_slots[2] = stack("dagger", 1);

    inv.move_item(&data, SlotRef::General(0), SlotRef::General(1)).unwrap();
    assert_eq!(inv.general_slots[0], stack("bread", 3));
    assert_eq!(inv.general_slots[1], stack("bread", 10));

    inv.move_item(&data, SlotRef::General(0), SlotRef::General(2)).unwrap();
    assert_eq!(inv.general_slots[0], stack("dagger", 1));
    assert_eq!(inv.general_slots[2], stack("bread", 3));

    inv.move_item(&data, SlotRef::General(2), SlotRef::General(3)).unwrap();
    assert!(inv.general_slots[2].is_none());
    assert_eq!(inv.general_slots[3], stack("bread", 3));

    assert!(inv.move_item(&data, SlotRef::General(0), SlotRef::Backpack(0)).is_err(), "no bag equipped");
}

/// Hand and ring items fall back to their second slot.
#[test]
fn equip_uses_alternate_slot() {
    let data = GameData::default_test();
    let mut inv = Inventory::new();
    inv.general_slots[0] = stack("longsword", 1);
    inv.general_slots[1] = stack("dagger", 1);
    inv.general_slots[2] = stack("iron-ring", 1);

    assert_eq!(inv.equip(&data, SlotRef::General(0)).unwrap(), EquipmentSlot::Mainhand);
    assert_eq!(inv.equip(&data, SlotRef::General(1)).unwrap(), EquipmentSlot::Offhand);
    assert_eq!(inv.equip(&data, SlotRef::General(2)).unwrap(), EquipmentSlot::Ring1);
    assert!(inv.general_slots.iter().all(Option::is_none));
}

/// Equipping into an occupied slot hands the old item back.
#[test]
fn equip_swaps_previous_item() {
    let data = GameData::default_test();
    let mut inv = Inventory::new();
    inv.general_slots[0] = stack("leather-armor", 1);
    inv.equip(&data, SlotRef::General(0)).unwrap();
    inv.general_slots[1] = stack("leather-armor", 1);
    inv.gear_slots.get_mut(&EquipmentSlot::Chest).unwrap().item = "old-armor".into();

    inv.equip(&data, SlotRef::General(1)).unwrap();
    assert_eq!(inv.general_slots[1], stack("old-armor", 1));
    assert_eq!(inv.equipped(EquipmentSlot::Chest).unwrap().item, "leather-armor");
}

/// Items without a gear slot cannot be equipped.
#[test]
fn equip_rejects_plain_items() {
    let data = GameData::default_test();
    let mut inv = Inventory::new();
    inv.general_slots[0] = stack("bread", 1);
    assert!(matches!(
        inv.equip(&data, SlotRef::General(0)),
        Err(GameError::InvalidAction(_))
    ));
    assert_eq!(inv.general_slots[0], stack("bread", 1));
}

/// A bag with contents cannot be removed; an empty one can.
#[test]
fn bag_must_be_empty_to_unequip() {
    let data = GameData::default_test();
    let mut inv = with_bag(&data);
    assert_eq!(inv.backpack().len(), 20);

    inv.add_item(&data, "bread", 1).unwrap();
    assert!(inv.unequip(EquipmentSlot::Bag).is_err());

    inv.remove_item("bread", 1);
    assert_eq!(inv.unequip(EquipmentSlot::Bag).unwrap(), SlotRef::General(0));
    assert!(inv.backpack().is_empty());
}

/// Unequipped gear lands in the bag once the general slots are full.
#[test]
fn unequip_overflows_into_bag() {
    let data = GameData::default_test();
    let mut inv = with_bag(&data);
    inv.general_slots[0] = stack("dagger", 1);
    inv.equip(&data, SlotRef::General(0)).unwrap();
    for slot in inv.general_slots.iter_mut() {
        *slot = stack("longsword", 1);
    }
    assert_eq!(inv.unequip(EquipmentSlot::Mainhand).unwrap(), SlotRef::Backpack(0));
    assert_eq!(inv.backpack()[0], stack("dagger", 1));
}

/// Weight covers worn gear, the bag's contents and general slots; the
/// bag adds capacity.
#[test]
fn weight_and_capacity() {
    let data = GameData::default_test();
    let mut inv = with_bag(&data);
    inv.add_item(&data, "iron-ingot", 2).unwrap();
    inv.general_slots[0] = stack("leather-armor", 1);
    inv.equip(&data, SlotRef::General(0)).unwrap();
    inv.general_slots[1] = stack("bread", 2);

    // bag 2 + ingots 20 + armor 10 + bread 1
    assert!((inv.carried_weight(&data) - 33.0).abs() < 1e-9);
    assert_eq!(inv.capacity_bonus(&data), 20.0);
    assert_eq!(inv.count_item("leather-armor"), 1);
}

/// Splitting moves part of a stack into an empty slot; the source must
/// keep at least one unit.
#[test]
fn split_needs_empty_target_and_a_remainder() {
    let mut inv = Inventory::new();
    inv.general_slots[0] = stack("bread", 6);

    inv.split_item(SlotRef::General(0), SlotRef::General(3), 2).unwrap();
    assert_eq!(inv.general_slots[0], stack("bread", 4));
    assert_eq!(inv.general_slots[3], stack("bread", 2));

    assert!(inv.split_item(SlotRef::General(0), SlotRef::General(1), 4).is_err(), "whole stack");
    assert!(inv.split_item(SlotRef::General(0), SlotRef::General(1), 0).is_err());
    assert!(matches!(
        inv.split_item(SlotRef::General(0), SlotRef::General(3), 1),
        Err(GameError::InvalidSlot(_))
    ));
    assert!(inv.split_item(SlotRef::General(5), SlotRef::General(6), 1).is_err(), "empty source");
    assert_eq!(inv.count_item("bread"), 6);
}

/// Stacking tops up the target to the limit and never swaps.
#[test]
fn stack_tops_up_without_swapping() {
    let data = GameData::default_test();
    let mut inv = Inventory::new();
    inv.general_slots[0] = stack("bread", 7);
    inv.general_slots[1] = stack("bread", 6);
    inv.general_slots[2] = stack("dagger", 1);

    assert_eq!(inv.stack_item(&data, SlotRef::General(0), SlotRef::General(1)).unwrap(), 10);
    assert_eq!(inv.general_slots[0], stack("bread", 3));
    assert_eq!(inv.general_slots[1], stack("bread", 10));

    let full = inv.stack_item(&data, SlotRef::General(0), SlotRef::General(1));
    assert!(matches!(full, Err(GameError::InvalidAction(_))));
    assert!(inv.stack_item(&data, SlotRef::General(0), SlotRef::General(2)).is_err(), "mismatched items");
    assert!(inv.stack_item(&data, SlotRef::General(0), SlotRef::General(0)).is_err());
    assert!(inv.stack_item(&data, SlotRef::General(0), SlotRef::General(4)).is_err(), "empty target");
    assert_eq!(inv.general_slots[2], stack("dagger", 1));

    // Draining the source clears it.
    inv.general_slots[1] = stack("bread", 8);
    assert_eq!(inv.stack_item(&data, SlotRef::General(0), SlotRef::General(1)).unwrap(), 10);
    assert_eq!(inv.general_slots[0], stack("bread", 1));
    inv.general_slots[1] = stack("bread", 2);
    inv.stack_item(&data, SlotRef::General(0), SlotRef::General(1)).unwrap();
    assert!(inv.general_slots[0].is_none());
}
