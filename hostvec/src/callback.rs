//! Retained host callbacks
//!
//! A [`Callback`] captured from a call outlives that call. Callbacks are
//! retained per owning handle in a [`CallbackStore`]; notifications queued
//! while a call runs are delivered later, by the dispatch loop, once the call
//! has returned.

use crate::error::{BindError, Result};
use crate::value::HostValue;
use crate::wrap::Handle;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

/// Signature of a host function
pub type HostFn = dyn Fn(&[HostValue]) -> std::result::Result<HostValue, String>;

/// Reference-counted handle to an invocable host function
#[derive(Clone)]
pub struct Callback {
    name: Rc<str>,
    func: Rc<HostFn>,
}

impl Callback {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[HostValue]) -> std::result::Result<HostValue, String> + 'static,
    {
        Callback {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the function with `args`
    pub fn invoke(&self, args: &[HostValue]) -> Result<HostValue> {
        (self.func)(args).map_err(|message| BindError::CallbackFailed {
            name: self.name.to_string(),
            message,
        })
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }

    /// Number of live references to the underlying function
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.func)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("name", &self.name).finish()
    }
}

/// A notification waiting for the next turn of the dispatch loop
#[derive(Debug, Clone)]
pub struct Pending {
    pub owner: Handle,
    pub callback: Callback,
    pub args: Vec<HostValue>,
}

/// Callbacks retained per owning handle, plus the queue of deferred invocations
#[derive(Debug, Default)]
pub struct CallbackStore {
    retained: HashMap<Handle, Vec<Callback>>,
    pending: VecDeque<Pending>,
}

impl CallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `callback` alive for as long as `owner` is; returns the owner's listener count
    pub fn retain(&mut self, owner: Handle, callback: Callback) -> usize {
        let list = self.retained.entry(owner).or_default();
        list.push(callback);
        list.len()
    }

    pub fn retained_count(&self, owner: Handle) -> usize {
        self.retained.get(&owner).map_or(0, Vec::len)
    }

    /// Queue one invocation of every callback retained by `owner`
    pub fn notify(&mut self, owner: Handle, args: Vec<HostValue>) -> usize {
        let Some(list) = self.retained.get(&owner) else {
            return 0;
        };
        for callback in list {
            self.pending.push_back(Pending {
                owner,
                callback: callback.clone(),
                args: args.clone(),
            });
        }
        list.len()
    }

    /// Drop everything retained or queued for `owner`; returns the number of callbacks released
    pub fn release(&mut self, owner: Handle) -> usize {
        self.pending.retain(|p| p.owner != owner);
        self.retained.remove(&owner).map_or(0, |list| list.len())
    }

    /// Take the current queue; notifications queued while it runs wait for the next drain
    pub fn take_pending(&mut self) -> Vec<Pending> {
        self.pending.drain(..).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn handle(index: u32) -> Handle {
        Handle::new(index, 0, "TVec")
    }

    fn recorder() -> (Callback, Rc<RefCell<Vec<Vec<HostValue>>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let cb = Callback::new("record", move |args| {
            sink.borrow_mut().push(args.to_vec());
            Ok(HostValue::Undefined)
        });
        (cb, seen)
    }

    #[test]
    fn test_invoke_maps_error() {
        let cb = Callback::new("boom", |_| Err("bad input".to_string()));
        let err = cb.invoke(&[]).unwrap_err();
        assert_eq!(err.kind(), "CallbackFailed");
        assert!(err.to_string().contains("bad input"));
    }

    #[test]
    fn test_retain_keeps_reference_alive() {
        let (cb, _) = recorder();
        let mut store = CallbackStore::new();
        assert_eq!(cb.strong_count(), 1);
        assert_eq!(store.retain(handle(0), cb.clone()), 1);
        assert_eq!(cb.strong_count(), 2);
        assert_eq!(store.release(handle(0)), 1);
        assert_eq!(cb.strong_count(), 1);
    }

    #[test]
    fn test_notify_is_deferred() {
        let (cb, seen) = recorder();
        let mut store = CallbackStore::new();
        store.retain(handle(1), cb);
        assert_eq!(store.notify(handle(1), vec![HostValue::Number(1.0)]), 1);
        assert!(seen.borrow().is_empty());
        assert_eq!(store.pending_len(), 1);

        for pending in store.take_pending() {
            pending.callback.invoke(&pending.args).unwrap();
        }
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_notify_without_listeners() {
        let mut store = CallbackStore::new();
        assert_eq!(store.notify(handle(2), vec![]), 0);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_release_discards_pending() {
        let (cb, _) = recorder();
        let mut store = CallbackStore::new();
        store.retain(handle(3), cb.clone());
        store.retain(handle(4), cb);
        store.notify(handle(3), vec![]);
        store.notify(handle(4), vec![]);
        store.release(handle(3));
        let pending = store.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].owner, handle(4));
        assert_eq!(store.retained_count(handle(3)), 0);
    }
}
