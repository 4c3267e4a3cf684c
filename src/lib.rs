//! counted-map: an associative container that keeps its own element count
//! next to native hashbrown storage, with convenience accessors in the style
//! of a scripting-language hash (get/put/remove/ensure/pop/update/...).
//!
//! Internal Design:
//!
//! Summary
//! - `CountedMap<K, V, S>` owns one `hashbrown::HashMap<K, V, S>` and one
//!   signed `length` counter. Every method that mutates the storage also
//!   updates the counter.
//! - Absence is `Option::None`; a stored value is never mistaken for an
//!   unset key.
//!
//! Counting rules
//! - `put` counts a key only when it was not present before the write.
//! - `remove`/`pop` decrement unconditionally. Removing a key that is not
//!   there therefore under-counts, and `len()` can go negative. This is
//!   observable, intended behavior.
//! - `empty` resets the counter to zero.
//! - `items_obj` hands out `&mut` to the storage; anything done through it
//!   is invisible to the counter. `check_len` reports drift and `resync`
//!   repairs it on request.
//!
//! Snapshots
//! - `keys`/`values`/`items` clone into fresh `Vec`s. Value identity is
//!   whatever `V: Clone` provides (`Rc<T>` keeps sharing).
//!
//! Logging
//! - Emits `tracing` events (absent-key removals at trace, `empty` at
//!   debug, `resync` corrections at warn). No subscriber is installed.
//!
//! Notes and non-goals
//! - No internal synchronization; wrap it yourself if sharing across
//!   threads.
//! - No serialization and no iteration-order guarantees.

mod counted_map;
mod counted_map_proptest;

// Public surface
pub use counted_map::{CountedMap, Iter, LengthMismatch};
