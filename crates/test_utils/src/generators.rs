//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating ids and request data that
//! respect the platform's id rules.

use proptest::prelude::*;

use core_kernel::{EntityId, ItemId, SalesOrderId};

/// Strategy for raw internal id values
pub fn internal_id_value_strategy() -> impl Strategy<Value = u64> {
    1u64..10_000_000u64
}

/// Strategy for customer ids
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    internal_id_value_strategy().prop_filter_map("positive id", |v| EntityId::new(v).ok())
}

/// Strategy for sales order ids
pub fn sales_order_id_strategy() -> impl Strategy<Value = SalesOrderId> {
    internal_id_value_strategy().prop_filter_map("positive id", |v| SalesOrderId::new(v).ok())
}

/// Strategy for item ids
pub fn item_id_strategy() -> impl Strategy<Value = ItemId> {
    internal_id_value_strategy().prop_filter_map("positive id", |v| ItemId::new(v).ok())
}

/// Strategy for item lists of up to `max_lines` lines, including none
pub fn item_list_strategy(max_lines: usize) -> impl Strategy<Value = Vec<ItemId>> {
    prop::collection::vec(item_id_strategy(), 0..=max_lines)
}

/// Strategy for id strings that must be rejected at the boundary
pub fn invalid_id_text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("0".to_string()),
        Just(String::new()),
        "-[1-9][0-9]{0,6}",
        "[a-zA-Z][a-zA-Z0-9]{0,8}",
        "[0-9]{1,4}\\.[0-9]{1,3}",
    ]
}
