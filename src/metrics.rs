//! Metrics collection.
//!
//! Thin wrappers over the `metrics` facade. With no recorder installed
//! every call is a no-op, so the library emits unconditionally and the
//! host decides whether anything listens.

use metrics::{counter, describe_counter};

use crate::models::CallDirection;

/// Number lookups, labeled by hit or miss
pub const LOOKUPS_TOTAL: &str = "callshield_lookups_total";
/// Call events appended to the history log, labeled by direction
pub const CALLS_RECORDED_TOTAL: &str = "callshield_calls_recorded_total";
/// Block list additions, labeled auto or manual
pub const BLOCKS_TOTAL: &str = "callshield_blocks_total";
/// Block list removals
pub const UNBLOCKS_TOTAL: &str = "callshield_unblocks_total";

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    describe_counter!(LOOKUPS_TOTAL, "Number lookups, labeled by hit or miss");
    describe_counter!(
        CALLS_RECORDED_TOTAL,
        "Call events appended to the history log, labeled by direction"
    );
    describe_counter!(BLOCKS_TOTAL, "Block list additions, labeled auto or manual");
    describe_counter!(UNBLOCKS_TOTAL, "Block list removals");
}

/// Count one lookup resolution.
pub fn record_lookup(found: bool) {
    let result = if found { "hit" } else { "miss" };
    counter!(LOOKUPS_TOTAL, "result" => result).increment(1);
}

/// Count one recorded call event.
pub fn record_call(direction: CallDirection) {
    counter!(CALLS_RECORDED_TOTAL, "direction" => direction.as_str()).increment(1);
}

/// Count one block list addition.
pub fn record_block(auto_blocked: bool) {
    let kind = if auto_blocked { "auto" } else { "manual" };
    counter!(BLOCKS_TOTAL, "kind" => kind).increment(1);
}

/// Count one block list removal.
pub fn record_unblock() {
    counter!(UNBLOCKS_TOTAL).increment(1);
}
