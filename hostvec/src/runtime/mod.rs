//! Single-threaded dispatch loop
//!
//! The [`Runtime`] owns the object heap, the retained callbacks and the
//! class table. One call record is processed to completion before the next;
//! callbacks queued by a call only run from [`Runtime::run_pending`].

mod class;

pub use class::{ClassEntry, ClassTable, MemberInfo};

use crate::call::CallRecord;
use crate::callback::CallbackStore;
use crate::config::RuntimeConfig;
use crate::error::{BindError, Result};
use crate::extract::Args;
use crate::json::{from_json, to_json, JsonService, SerdeJson};
use crate::observe::{ObjectObserver, ObjectStats, StatsSnapshot};
use crate::value::HostValue;
use crate::wrap::{Handle, MethodBody, NativeClass, ObjectHeap};
use std::rc::Rc;
use tracing::{debug, warn};

/// Host-side dispatcher for native classes
pub struct Runtime {
    config: RuntimeConfig,
    classes: ClassTable,
    heap: ObjectHeap,
    callbacks: CallbackStore,
    json: Box<dyn JsonService>,
    observer: Rc<dyn ObjectObserver>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        let observer = Rc::new(ObjectStats::with_report_rate(config.stats_report_rate));
        Runtime {
            config,
            classes: ClassTable::standard(),
            heap: ObjectHeap::new(),
            callbacks: CallbackStore::new(),
            json: Box::new(SerdeJson),
            observer,
        }
    }

    /// Replace the object observer
    pub fn with_observer(mut self, observer: Rc<dyn ObjectObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the JSON service
    pub fn with_json(mut self, json: Box<dyn JsonService>) -> Self {
        self.json = json;
        self
    }

    pub fn register<T: NativeClass>(&mut self) {
        self.classes.register::<T>();
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.observer.snapshot()
    }

    /// Dispatch one call record
    ///
    /// A record with a receiver is a method call; otherwise the callee names
    /// a class and the record must be a construction call.
    pub fn call(&mut self, call: &CallRecord) -> Result<HostValue> {
        if self.config.trace_calls {
            debug!(
                callee = %call.callee,
                receiver = ?call.receiver,
                args = call.len(),
                construct = call.construct,
                "dispatch"
            );
        }
        match call.receiver {
            Some(receiver) => {
                let call_fn = self.classes.lookup(receiver.class())?.call;
                call_fn(self, call)
            }
            None => {
                let construct_fn = self.classes.lookup(&call.callee)?.construct;
                construct_fn(self, call).map(HostValue::Handle)
            }
        }
    }

    /// `new class(args)`
    pub fn construct(&mut self, class: &str, args: Vec<HostValue>) -> Result<Handle> {
        let value = self.call(&CallRecord::construct(class, args))?;
        value.as_handle().ok_or_else(|| BindError::UnknownClass {
            name: class.to_string(),
        })
    }

    /// `receiver.method(args)`
    pub fn invoke(&mut self, receiver: Handle, method: &str, args: Vec<HostValue>) -> Result<HostValue> {
        self.call(&CallRecord::method(receiver, method, args))
    }

    /// Read accessor `name` of the instance behind `handle`
    pub fn get_property(&self, handle: Handle, name: &str) -> Result<HostValue> {
        let property_fn = self.classes.lookup(handle.class())?.property;
        property_fn(self, handle, name)
    }

    /// Borrow the native instance behind `handle`
    pub fn unwrap<T: NativeClass>(&self, handle: Handle) -> Result<&T> {
        self.heap.unwrap(handle)
    }

    /// Drop the instance behind `handle` together with its callbacks
    pub fn release(&mut self, handle: Handle) -> Result<()> {
        let class = self.heap.release(handle)?;
        let released = self.callbacks.release(handle);
        self.observer.on_release(class);
        debug!(handle = %handle, callbacks = released, "released");
        Ok(())
    }

    /// Number of queued callback invocations
    pub fn pending(&self) -> usize {
        self.callbacks.pending_len()
    }

    /// Callbacks retained on `handle`
    pub fn listeners(&self, handle: Handle) -> usize {
        self.callbacks.retained_count(handle)
    }

    /// Deliver queued callback invocations
    ///
    /// Every queued invocation runs even if an earlier one fails; the first
    /// failure is returned. Invocations queued meanwhile wait for the next
    /// drain.
    pub fn run_pending(&mut self) -> Result<usize> {
        let batch = self.callbacks.take_pending();
        let count = batch.len();
        let mut first_error = None;
        for pending in batch {
            if let Err(e) = pending.callback.invoke(&pending.args) {
                warn!(owner = %pending.owner, error = %e, "callback failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    /// Serialize a host value through the JSON service
    pub fn to_json_text(&self, value: &HostValue) -> String {
        self.json.stringify(&to_json(value))
    }

    /// Parse JSON text into a host value
    pub fn parse_json_text(&self, text: &str) -> Result<HostValue> {
        self.json
            .parse(text)
            .map(|json| from_json(&json))
            .map_err(|_| BindError::JsonParseError {
                text: text.to_string(),
            })
    }
}

fn unknown_member<T: NativeClass>(name: &str) -> BindError {
    BindError::UnknownMember {
        class: T::CLASS_NAME.to_string(),
        name: name.to_string(),
    }
}

fn construct_as<T: NativeClass>(rt: &mut Runtime, call: &CallRecord) -> Result<Handle> {
    let args = Args::<T>::new(call, rt.json.as_ref()).strict_arity(rt.config.strict_arity);
    let handle = rt.heap.construct(&args)?;
    rt.observer.on_construct(T::CLASS_NAME);
    debug!(handle = %handle, "constructed");
    Ok(handle)
}

fn call_method_as<T: NativeClass>(rt: &mut Runtime, call: &CallRecord) -> Result<HostValue> {
    let args = Args::<T>::new(call, rt.json.as_ref()).strict_arity(rt.config.strict_arity);
    let receiver = args.receiver()?;
    let method = T::method(&call.callee).ok_or_else(|| unknown_member::<T>(&call.callee))?;
    let unsupported = || BindError::not_implemented(format!("{}.{}", T::CLASS_NAME, method.name));
    if let MethodBody::Unsupported = method.body {
        return Err(unsupported());
    }
    args.check(method.params)?;

    match &method.body {
        MethodBody::Query(f) => f(rt.heap.unwrap::<T>(receiver)?, &args),
        MethodBody::Mutate(f) => {
            let result = f(rt.heap.unwrap_mut::<T>(receiver)?, &args)?;
            let mut notification = Vec::with_capacity(call.len() + 1);
            notification.push(HostValue::Str(method.name.to_string()));
            notification.extend(call.args.iter().cloned());
            rt.callbacks.notify(receiver, notification);
            Ok(result)
        }
        MethodBody::Derive(f) => {
            let derived = f(rt.heap.unwrap::<T>(receiver)?, &args)?;
            let handle = rt.heap.bind(derived);
            rt.observer.on_construct(T::CLASS_NAME);
            Ok(HostValue::Handle(handle))
        }
        MethodBody::Listen => {
            rt.heap.unwrap::<T>(receiver)?;
            let callback = args.callback(0)?;
            let listeners = rt.callbacks.retain(receiver, callback);
            Ok(HostValue::Number(listeners as f64))
        }
        MethodBody::Unsupported => Err(unsupported()),
    }
}

fn property_as<T: NativeClass>(rt: &Runtime, handle: Handle, name: &str) -> Result<HostValue> {
    let accessor = T::accessor(name).ok_or_else(|| unknown_member::<T>(name))?;
    Ok((accessor.get)(rt.heap.unwrap::<T>(handle)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::Callback;
    use crate::vector::FltVec;
    use std::cell::RefCell;

    fn num(n: f64) -> HostValue {
        HostValue::Number(n)
    }

    fn recorder() -> (Callback, Rc<RefCell<Vec<Vec<HostValue>>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let cb = Callback::new("record", move |args| {
            sink.borrow_mut().push(args.to_vec());
            Ok(HostValue::Undefined)
        });
        (cb, log)
    }

    // ============================================
    // Construction
    // ============================================

    #[test]
    fn test_construct_and_property() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![HostValue::numbers([1.0, 2.0])]).unwrap();
        assert_eq!(rt.get_property(h, "length"), Ok(num(2.0)));
        assert_eq!(rt.stats().total, 1);
    }

    #[test]
    fn test_plain_call_of_class_fails() {
        let mut rt = Runtime::default();
        let err = rt.call(&CallRecord::plain("TVec", vec![])).unwrap_err();
        assert_eq!(err.kind(), "InvalidConstructionUsage");
        assert!(rt.heap().is_empty());
        assert_eq!(rt.stats().total, 0);
    }

    #[test]
    fn test_unknown_class() {
        let mut rt = Runtime::default();
        assert_eq!(rt.construct("TMat", vec![]).unwrap_err().kind(), "UnknownClass");
    }

    // ============================================
    // Method dispatch
    // ============================================

    #[test]
    fn test_query_and_mutate() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![]).unwrap();
        assert_eq!(rt.invoke(h, "push", vec![num(1.5)]), Ok(num(1.0)));
        assert_eq!(rt.invoke(h, "push", vec![num(2.5)]), Ok(num(2.0)));
        assert_eq!(rt.invoke(h, "put", vec![num(0.0), num(3.0)]), Ok(HostValue::Bool(true)));
        assert_eq!(rt.invoke(h, "sum", vec![]), Ok(num(5.5)));
        assert_eq!(rt.unwrap::<FltVec>(h).unwrap().values(), &[3.0, 2.5]);
    }

    #[test]
    fn test_failed_call_leaves_state() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![HostValue::numbers([1.0])]).unwrap();
        let err = rt.invoke(h, "put", vec![num(4.0), num(9.0)]).unwrap_err();
        assert_eq!(err, BindError::index_out_of_bounds(4, 1));
        let err = rt.invoke(h, "put", vec![num(0.0), HostValue::Str("x".into())]).unwrap_err();
        assert_eq!(err.position(), Some(1));
        assert_eq!(rt.unwrap::<FltVec>(h).unwrap().values(), &[1.0]);
    }

    #[test]
    fn test_sort_binds_new_handle() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![HostValue::numbers([3.0, 1.0, 2.0])]).unwrap();
        let sorted = rt.invoke(h, "sort", vec![]).unwrap().as_handle().unwrap();
        assert_ne!(sorted, h);
        assert_eq!(rt.unwrap::<FltVec>(sorted).unwrap().values(), &[1.0, 2.0, 3.0]);
        assert_eq!(rt.unwrap::<FltVec>(h).unwrap().values(), &[3.0, 1.0, 2.0]);
        assert_eq!(rt.stats().total, 2);
    }

    #[test]
    fn test_unsupported_methods() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![]).unwrap();
        assert_eq!(
            rt.invoke(h, "shuffle", vec![]),
            Err(BindError::not_implemented("TVec.shuffle"))
        );
        assert_eq!(rt.invoke(h, "trunc", vec![]).unwrap_err().kind(), "NotImplemented");
    }

    #[test]
    fn test_unknown_member() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![]).unwrap();
        assert_eq!(rt.invoke(h, "outer", vec![]).unwrap_err().kind(), "UnknownMember");
        assert_eq!(rt.get_property(h, "size").unwrap_err().kind(), "UnknownMember");
    }

    #[test]
    fn test_strict_arity() {
        let mut rt = Runtime::new(RuntimeConfig::new().strict_arity(true));
        let h = rt.construct("TVec", vec![]).unwrap();
        assert_eq!(
            rt.invoke(h, "push", vec![num(1.0), num(2.0)]),
            Err(BindError::TooManyArguments { expected: 1, got: 2 })
        );

        let mut lax = Runtime::default();
        let h = lax.construct("TVec", vec![]).unwrap();
        assert_eq!(lax.invoke(h, "push", vec![num(1.0), num(2.0)]), Ok(num(1.0)));
    }

    // ============================================
    // Release
    // ============================================

    #[test]
    fn test_release_makes_handle_stale() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![]).unwrap();
        rt.release(h).unwrap();
        assert_eq!(rt.invoke(h, "sum", vec![]).unwrap_err().kind(), "StaleHandle");
        assert_eq!(rt.get_property(h, "length").unwrap_err().kind(), "StaleHandle");
        assert_eq!(rt.release(h).unwrap_err().kind(), "StaleHandle");
        let stats = rt.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.classes["TVec"].released, 1);
    }

    // ============================================
    // Callbacks
    // ============================================

    #[test]
    fn test_callbacks_are_deferred() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![]).unwrap();
        let (cb, log) = recorder();
        assert_eq!(rt.invoke(h, "subscribe", vec![HostValue::Function(cb)]), Ok(num(1.0)));

        rt.invoke(h, "push", vec![num(4.0)]).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(rt.pending(), 1);

        assert_eq!(rt.run_pending(), Ok(1));
        assert_eq!(
            *log.borrow(),
            vec![vec![HostValue::Str("push".into()), num(4.0)]]
        );
        assert_eq!(rt.pending(), 0);
    }

    #[test]
    fn test_queries_do_not_notify() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![HostValue::numbers([1.0])]).unwrap();
        let (cb, _log) = recorder();
        rt.invoke(h, "subscribe", vec![HostValue::Function(cb)]).unwrap();
        rt.invoke(h, "sum", vec![]).unwrap();
        rt.invoke(h, "sort", vec![]).unwrap();
        assert!(rt.invoke(h, "put", vec![num(7.0), num(1.0)]).is_err());
        assert_eq!(rt.pending(), 0);
    }

    #[test]
    fn test_release_drops_callbacks() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![]).unwrap();
        let (cb, log) = recorder();
        rt.invoke(h, "subscribe", vec![HostValue::Function(cb.clone())]).unwrap();
        rt.invoke(h, "push", vec![num(1.0)]).unwrap();
        assert_eq!(cb.strong_count(), 3);

        rt.release(h).unwrap();
        assert_eq!(rt.pending(), 0);
        assert_eq!(rt.listeners(h), 0);
        assert_eq!(cb.strong_count(), 1);
        assert_eq!(rt.run_pending(), Ok(0));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_failing_callback_reports_first_error() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![]).unwrap();
        let failing = Callback::new("boom", |_| Err("exploded".to_string()));
        let (cb, log) = recorder();
        rt.invoke(h, "subscribe", vec![HostValue::Function(failing)]).unwrap();
        rt.invoke(h, "subscribe", vec![HostValue::Function(cb)]).unwrap();
        rt.invoke(h, "push", vec![num(1.0)]).unwrap();

        let err = rt.run_pending().unwrap_err();
        assert_eq!(
            err,
            BindError::CallbackFailed {
                name: "boom".to_string(),
                message: "exploded".to_string(),
            }
        );
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_subscribe_requires_function() {
        let mut rt = Runtime::default();
        let h = rt.construct("TVec", vec![]).unwrap();
        let err = rt.invoke(h, "subscribe", vec![num(1.0)]).unwrap_err();
        assert_eq!(err.kind(), "ArgumentTypeMismatch");
    }

    // ============================================
    // JSON and observers
    // ============================================

    #[test]
    fn test_json_text() {
        let rt = Runtime::default();
        let value = rt.parse_json_text(r#"{"vals":[1,2.5]}"#).unwrap();
        assert_eq!(rt.to_json_text(&value), r#"{"vals":[1,2.5]}"#);
        assert_eq!(
            rt.parse_json_text("{oops"),
            Err(BindError::JsonParseError {
                text: "{oops".to_string()
            })
        );
    }

    #[test]
    fn test_injected_observer() {
        let stats = Rc::new(ObjectStats::new());
        let mut rt = Runtime::default().with_observer(stats.clone());
        let h = rt.construct("TVec", vec![]).unwrap();
        rt.invoke(h, "sort", vec![]).unwrap();
        assert_eq!(stats.live("TVec"), 2);
        rt.release(h).unwrap();
        assert_eq!(stats.live("TVec"), 1);
    }
}
