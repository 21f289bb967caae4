//! Flat C-callable binding for [`tickset::SegmentedBitset`].
//!
//! Instances live in a process-global registry keyed by opaque `u64` handles;
//! no pointer ever crosses the boundary, so a stale or fabricated handle is
//! inert (operations on it return `false`/`0`) rather than a use-after-free.
//! The registry mutex is also the serialization that the single-threaded core
//! requires of foreign callers.
//!
//! Every function mirrors one public operation of the core engine and
//! performs no logic beyond handle resolution.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use tickset::SegmentedBitset;

struct Registry {
    instances: HashMap<u64, SegmentedBitset>,
    next_handle: u64,
}

fn registry() -> &'static Mutex<Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        Mutex::new(Registry {
            instances: HashMap::new(),
            // Handle 0 is reserved as "never valid".
            next_handle: 1,
        })
    })
}

fn with_instance<R>(handle: u64, default: R, f: impl FnOnce(&mut SegmentedBitset) -> R) -> R {
    let mut registry = registry().lock().expect("tickset registry poisoned");
    match registry.instances.get_mut(&handle) {
        Some(instance) => f(instance),
        None => default,
    }
}

/// Creates a new empty bitset and returns its handle. Never returns 0.
#[unsafe(no_mangle)]
pub extern "C" fn tickset_create() -> u64 {
    let mut registry = registry().lock().expect("tickset registry poisoned");
    let handle = registry.next_handle;
    registry.next_handle += 1;
    registry.instances.insert(handle, SegmentedBitset::new());
    handle
}

/// Destroys the bitset behind `handle`. Returns `false` for unknown handles;
/// destroying a handle twice is an ordinary `false`, not an error.
#[unsafe(no_mangle)]
pub extern "C" fn tickset_destroy(handle: u64) -> bool {
    let mut registry = registry().lock().expect("tickset registry poisoned");
    registry.instances.remove(&handle).is_some()
}

/// Inserts `index`. No-op for unknown handles.
#[unsafe(no_mangle)]
pub extern "C" fn tickset_set(handle: u64, index: u64) {
    with_instance(handle, (), |set| set.set(index));
}

/// Removes `index`, returning whether it was present.
#[unsafe(no_mangle)]
pub extern "C" fn tickset_unset(handle: u64, index: u64) -> bool {
    with_instance(handle, false, |set| set.unset(index))
}

/// Tests membership of `index`.
#[unsafe(no_mangle)]
pub extern "C" fn tickset_get(handle: u64, index: u64) -> bool {
    with_instance(handle, false, |set| set.contains(index))
}

/// Pre-allocates segments covering `[0, max_index]`.
#[unsafe(no_mangle)]
pub extern "C" fn tickset_reserve(handle: u64, max_index: u64) {
    with_instance(handle, (), |set| set.reserve_for_max_index(max_index));
}

/// Returns whether the set holds no indices. Unknown handles read as empty.
#[unsafe(no_mangle)]
pub extern "C" fn tickset_empty(handle: u64) -> bool {
    with_instance(handle, true, |set| set.is_empty())
}

/// Returns the smallest set index, or 0 when empty.
#[unsafe(no_mangle)]
pub extern "C" fn tickset_head(handle: u64) -> u64 {
    with_instance(handle, 0, |set| set.head())
}

/// Returns one past the largest set index, or 0 when empty.
#[unsafe(no_mangle)]
pub extern "C" fn tickset_tail(handle: u64) -> u64 {
    with_instance(handle, 0, |set| set.tail())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_lifecycle() {
        let handle = tickset_create();
        assert_ne!(handle, 0);
        assert!(tickset_empty(handle));
        assert_eq!(tickset_head(handle), 0);
        assert_eq!(tickset_tail(handle), 0);

        tickset_set(handle, 3665);
        tickset_set(handle, 1832);
        assert!(!tickset_empty(handle));
        assert!(tickset_get(handle, 3665));
        assert!(!tickset_get(handle, 3666));
        assert_eq!(tickset_head(handle), 1832);
        assert_eq!(tickset_tail(handle), 3666);

        assert!(tickset_unset(handle, 1832));
        assert!(!tickset_unset(handle, 1832));
        assert_eq!(tickset_head(handle), 3665);

        assert!(tickset_destroy(handle));
        assert!(!tickset_destroy(handle));
    }

    #[test]
    fn stale_handle_is_inert() {
        let handle = tickset_create();
        tickset_set(handle, 10);
        assert!(tickset_destroy(handle));

        tickset_set(handle, 20);
        assert!(!tickset_get(handle, 10));
        assert!(!tickset_get(handle, 20));
        assert!(!tickset_unset(handle, 10));
        assert!(tickset_empty(handle));
        assert_eq!(tickset_head(handle), 0);
        assert_eq!(tickset_tail(handle), 0);
        tickset_reserve(handle, 1_000_000);
    }

    #[test]
    fn handles_are_independent() {
        let a = tickset_create();
        let b = tickset_create();
        assert_ne!(a, b);

        tickset_set(a, 5);
        tickset_set(b, 7);
        assert!(tickset_get(a, 5));
        assert!(!tickset_get(a, 7));
        assert!(tickset_get(b, 7));
        assert!(!tickset_get(b, 5));

        assert!(tickset_destroy(a));
        assert!(tickset_get(b, 7));
        assert!(tickset_destroy(b));
    }
}
