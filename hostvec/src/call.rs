//! Call records

use crate::value::HostValue;
use crate::wrap::Handle;

/// One invocation arriving from the host
///
/// Immutable for the duration of the call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    /// Method name, or class name for constructor calls
    pub callee: String,
    /// Receiver handle for method calls
    pub receiver: Option<Handle>,
    /// Ordered, dynamically-typed arguments
    pub args: Vec<HostValue>,
    /// Set when the host invoked the callee with `new`
    pub construct: bool,
}

impl CallRecord {
    /// Ordinary call of a free callee (a class invoked without `new`)
    pub fn plain(callee: impl Into<String>, args: Vec<HostValue>) -> Self {
        CallRecord {
            callee: callee.into(),
            receiver: None,
            args,
            construct: false,
        }
    }

    /// Construction call, `new Class(args)`
    pub fn construct(class: impl Into<String>, args: Vec<HostValue>) -> Self {
        CallRecord {
            callee: class.into(),
            receiver: None,
            args,
            construct: true,
        }
    }

    /// Method call on a receiver, `receiver.method(args)`
    pub fn method(receiver: Handle, method: impl Into<String>, args: Vec<HostValue>) -> Self {
        CallRecord {
            callee: method.into(),
            receiver: Some(receiver),
            args,
            construct: false,
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn arg(&self, position: usize) -> Option<&HostValue> {
        self.args.get(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_flags() {
        let plain = CallRecord::plain("TVec", vec![]);
        assert!(!plain.construct);
        assert!(plain.receiver.is_none());

        let ctor = CallRecord::construct("TVec", vec![]);
        assert!(ctor.construct);

        let h = Handle::new(0, 0, "TVec");
        let call = CallRecord::method(h, "at", vec![HostValue::Number(0.0)]);
        assert_eq!(call.receiver, Some(h));
        assert_eq!(call.len(), 1);
        assert_eq!(call.arg(0), Some(&HostValue::Number(0.0)));
        assert_eq!(call.arg(1), None);
    }
}
