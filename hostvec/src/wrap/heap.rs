//! Generational slot storage for native instances

use super::{Handle, NativeClass};
use crate::error::{BindError, Result};
use crate::extract::Args;
use crate::value::ValueType;
use std::any::Any;

struct Entry {
    class: &'static str,
    instance: Box<dyn Any>,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Owner of every wrapped native instance
///
/// Slots are reused after release; the generation counter tells a reused
/// slot apart from the one a stale handle refers to.
#[derive(Default)]
pub struct ObjectHeap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Bind `instance` to a new handle
    pub fn bind<T: NativeClass>(&mut self, instance: T) -> Handle {
        let entry = Entry {
            class: T::CLASS_NAME,
            instance: Box::new(instance),
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            Handle::new(index, slot.generation, T::CLASS_NAME)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            Handle::new(index, 0, T::CLASS_NAME)
        }
    }

    /// Run `T`'s constructor and bind the result
    ///
    /// Only a construction call may produce an instance.
    pub fn construct<T: NativeClass>(&mut self, args: &Args<'_, T>) -> Result<Handle> {
        if !args.call().construct {
            return Err(BindError::InvalidConstructionUsage {
                class: T::CLASS_NAME.to_string(),
            });
        }
        args.check(T::CONSTRUCTOR)?;
        let instance = T::construct(args)?;
        Ok(self.bind(instance))
    }

    fn entry(&self, handle: Handle) -> Result<&Entry> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entry.as_ref())
            .ok_or_else(|| stale(handle))
    }

    fn entry_mut(&mut self, handle: Handle) -> Result<&mut Entry> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entry.as_mut())
            .ok_or_else(|| stale(handle))
    }

    /// Whether `handle` still refers to a bound instance
    pub fn is_live(&self, handle: Handle) -> bool {
        self.entry(handle).is_ok()
    }

    /// Class of the instance bound to `handle`
    pub fn class_of(&self, handle: Handle) -> Result<&'static str> {
        self.entry(handle).map(|e| e.class)
    }

    pub fn unwrap<T: NativeClass>(&self, handle: Handle) -> Result<&T> {
        let entry = self.entry(handle)?;
        let class = entry.class;
        entry
            .instance
            .downcast_ref::<T>()
            .ok_or_else(|| wrong_class::<T>(class))
    }

    pub fn unwrap_mut<T: NativeClass>(&mut self, handle: Handle) -> Result<&mut T> {
        let entry = self.entry_mut(handle)?;
        let class = entry.class;
        entry
            .instance
            .downcast_mut::<T>()
            .ok_or_else(|| wrong_class::<T>(class))
    }

    /// Replace the instance behind `handle`, handing the previous one back
    ///
    /// The handle keeps its identity; the caller owns (and must dispose of)
    /// the returned instance.
    #[must_use = "the previous instance is returned to the caller"]
    pub fn rebind<T: NativeClass>(&mut self, handle: Handle, instance: T) -> Result<T> {
        let slot = self.unwrap_mut::<T>(handle)?;
        Ok(std::mem::replace(slot, instance))
    }

    /// Drop the instance behind `handle`; returns its class name
    pub fn release(&mut self, handle: Handle) -> Result<&'static str> {
        self.entry(handle)?;
        let slot = &mut self.slots[handle.index() as usize];
        let class = slot.entry.take().map_or(handle.class(), |e| e.class);
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        self.live -= 1;
        Ok(class)
    }
}

fn stale(handle: Handle) -> BindError {
    BindError::StaleHandle {
        class: handle.class().to_string(),
        index: handle.index(),
        generation: handle.generation(),
    }
}

fn wrong_class<T: NativeClass>(got: &str) -> BindError {
    BindError::ArgumentTypeMismatch {
        position: 0,
        expected: ValueType::Instance(T::CLASS_NAME),
        got: got.to_string(),
    }
}
