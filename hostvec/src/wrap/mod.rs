//! Native object wrapping
//!
//! A host-visible [`Handle`] never holds a pointer. It names a slot of the
//! [`ObjectHeap`] by index and generation; releasing the instance bumps the
//! generation, so every copy of the old handle goes stale instead of
//! dangling.
//!
//! Classes describe their callable surface with static tables. The kind of a
//! method is part of its table entry: a [`MethodBody::Derive`] method only
//! sees `&T` and its result is bound to a new handle, so a copy-producing
//! operation cannot change the receiver.

mod heap;

pub use heap::ObjectHeap;

use crate::error::Result;
use crate::extract::{Args, Signature};
use crate::value::HostValue;
use std::fmt;

/// Stable reference to a native instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
    class: &'static str,
}

impl Handle {
    pub fn new(index: u32, generation: u32, class: &'static str) -> Self {
        Handle {
            index,
            generation,
            class,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn class(&self) -> &'static str {
        self.class
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} #{}]", self.class, self.index)
    }
}

/// A native type exposed to the host
pub trait NativeClass: Sized + 'static {
    /// Name the host uses for the class
    const CLASS_NAME: &'static str;

    /// Constructor parameters
    const CONSTRUCTOR: Signature = &[];

    /// Callable members
    const METHODS: &'static [MethodDef<Self>];

    /// Read-only properties
    const ACCESSORS: &'static [AccessorDef<Self>] = &[];

    /// Build a new instance from constructor arguments
    fn construct(args: &Args<'_, Self>) -> Result<Self>;

    fn method(name: &str) -> Option<&'static MethodDef<Self>> {
        Self::METHODS.iter().find(|m| m.name == name)
    }

    fn accessor(name: &str) -> Option<&'static AccessorDef<Self>> {
        Self::ACCESSORS.iter().find(|a| a.name == name)
    }
}

/// Reads the receiver
pub type QueryFn<T> = fn(&T, &Args<'_, T>) -> Result<HostValue>;
/// Mutates the receiver in place
pub type MutateFn<T> = fn(&mut T, &Args<'_, T>) -> Result<HostValue>;
/// Produces a new instance from the receiver
pub type DeriveFn<T> = fn(&T, &Args<'_, T>) -> Result<T>;

/// What a method does with its receiver
pub enum MethodBody<T> {
    Query(QueryFn<T>),
    Mutate(MutateFn<T>),
    /// The result is bound to a freshly allocated handle
    Derive(DeriveFn<T>),
    /// Retains the callback at argument 0 on the receiver's handle
    Listen,
    /// Declared on the surface but not implemented
    Unsupported,
}

impl<T> MethodBody<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            MethodBody::Query(_) => "query",
            MethodBody::Mutate(_) => "mutate",
            MethodBody::Derive(_) => "derive",
            MethodBody::Listen => "listen",
            MethodBody::Unsupported => "unsupported",
        }
    }
}

/// Entry of a class's method table
pub struct MethodDef<T> {
    pub name: &'static str,
    pub params: Signature,
    pub body: MethodBody<T>,
}

/// Entry of a class's property table
pub struct AccessorDef<T> {
    pub name: &'static str,
    pub get: fn(&T) -> HostValue,
}
