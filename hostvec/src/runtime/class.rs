//! Class registration table

use super::{call_method_as, construct_as, property_as, Runtime};
use crate::call::CallRecord;
use crate::error::{BindError, Result};
use crate::extract::{describe, Signature};
use crate::value::HostValue;
use crate::vector::FltVec;
use crate::wrap::{Handle, NativeClass};

pub(super) type ConstructFn = fn(&mut Runtime, &CallRecord) -> Result<Handle>;
pub(super) type CallFn = fn(&mut Runtime, &CallRecord) -> Result<HostValue>;
pub(super) type PropertyFn = fn(&Runtime, Handle, &str) -> Result<HostValue>;

/// Public description of one method
#[derive(Debug, Clone, Copy)]
pub struct MemberInfo {
    pub name: &'static str,
    pub kind: &'static str,
    pub params: Signature,
}

impl MemberInfo {
    /// `name(params)`, as shown in help output
    pub fn render(&self) -> String {
        format!("{}{}", self.name, describe(self.params))
    }
}

/// A registered class with its type-erased entry points
#[derive(Debug)]
pub struct ClassEntry {
    pub name: &'static str,
    pub constructor: Signature,
    pub methods: Vec<MemberInfo>,
    pub accessors: Vec<&'static str>,
    pub(super) construct: ConstructFn,
    pub(super) call: CallFn,
    pub(super) property: PropertyFn,
}

impl ClassEntry {
    pub fn of<T: NativeClass>() -> Self {
        ClassEntry {
            name: T::CLASS_NAME,
            constructor: T::CONSTRUCTOR,
            methods: T::METHODS
                .iter()
                .map(|m| MemberInfo {
                    name: m.name,
                    kind: m.body.kind(),
                    params: m.params,
                })
                .collect(),
            accessors: T::ACCESSORS.iter().map(|a| a.name).collect(),
            construct: construct_as::<T>,
            call: call_method_as::<T>,
            property: property_as::<T>,
        }
    }
}

/// Every class the runtime can dispatch to
#[derive(Default)]
pub struct ClassTable {
    classes: Vec<ClassEntry>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in classes
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register::<FltVec>();
        table
    }

    /// Add `T`; a class registered twice keeps its first entry
    pub fn register<T: NativeClass>(&mut self) {
        if self.get(T::CLASS_NAME).is_none() {
            self.classes.push(ClassEntry::of::<T>());
        }
    }

    pub fn get(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub(super) fn lookup(&self, name: &str) -> Result<&ClassEntry> {
        self.get(name).ok_or_else(|| BindError::UnknownClass {
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.classes.iter().map(|c| c.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassEntry> {
        self.classes.iter()
    }
}
