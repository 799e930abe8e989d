//! Run state slots - one instance per state type per competition context
//!
//! Replaces ambient per-config lookups with an explicit map that lives in
//! the [`crate::runner::CompetitionContext`]. Lookup-or-create is guarded
//! by a single mutex.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

type Slot = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct RunStateSlots {
    slots: Mutex<HashMap<TypeId, Slot>>,
}

impl RunStateSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the instance of `T`, creating it on first access.
    ///
    /// Every call on the same slots returns the same `Arc`.
    pub fn get_or_create<T>(&self) -> Arc<T>
    where
        T: Default + Send + Sync + 'static,
    {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Run state slot table poisoned, recovering");
                poisoned.into_inner()
            }
        };

        let entry = slots
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(T::default()) as Slot);

        match Arc::clone(entry).downcast::<T>() {
            Ok(state) => state,
            Err(_) => {
                let fresh = Arc::new(T::default());
                *entry = Arc::clone(&fresh) as Slot;
                fresh
            }
        }
    }

    /// Whether an instance of `T` has been created.
    pub fn contains<T: 'static>(&self) -> bool {
        self.slots
            .lock()
            .map(|slots| slots.contains_key(&TypeId::of::<T>()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RunStateSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStateSlots")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RunState;

    #[test]
    fn test_same_instance_per_type() {
        let slots = RunStateSlots::new();
        let a = slots.get_or_create::<RunState<u32>>();
        let b = slots.get_or_create::<RunState<u32>>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_distinct_types_get_distinct_slots() {
        let slots = RunStateSlots::new();
        slots.get_or_create::<RunState<u32>>();
        slots.get_or_create::<RunState<String>>();
        assert_eq!(slots.len(), 2);
        assert!(slots.contains::<RunState<String>>());
        assert!(!slots.contains::<RunState<()>>());
    }

    #[test]
    fn test_separate_slots_are_isolated() {
        let first = RunStateSlots::new();
        let second = RunStateSlots::new();
        let a = first.get_or_create::<RunState<()>>();
        let b = second.get_or_create::<RunState<()>>();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_concurrent_lookup_yields_one_instance() {
        let slots = Arc::new(RunStateSlots::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slots = Arc::clone(&slots);
                std::thread::spawn(move || slots.get_or_create::<RunState<()>>())
            })
            .collect();
        let states: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(states.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
