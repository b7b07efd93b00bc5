//! Deep merge of ordered source fragments.
//!
//! Responsibilities:
//! - Merge a later fragment into the working aggregate, later values winning.
//!
//! Invariants:
//! - Map/map collisions recurse; any other collision replaces wholesale,
//!   arrays included (no element-wise sequence merging).
//! - Merging always targets a fresh working aggregate, never the committed
//!   one, so concurrent readers keep a consistent view.

use serde_json::Value;
use serde_json::map::Entry;

use crate::value::Aggregate;

/// Merge `incoming` into `dest`, with `incoming` overriding on collisions.
pub fn deep_merge(dest: &mut Aggregate, incoming: Aggregate) {
    for (key, value) in incoming {
        match dest.entry(key) {
            Entry::Occupied(mut slot) => match (slot.get_mut(), value) {
                (Value::Object(existing), Value::Object(nested)) => {
                    deep_merge(existing, nested);
                }
                (existing, value) => {
                    *existing = value;
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
}
