//! JavaScript object representation
//!
//! Provides the core JSObject type with hidden class-based property storage.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use core_types::{ObjectId, Value};
use host_bridge::{DescriptorHandle, HostTypeId};

use crate::hidden_class::{PropertyLocation, ShapeId, StorageKind, INLINE_SLOT_COUNT};

/// Index into the realm's native function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

/// Wrapper state of an object bridged from the host.
pub struct HostData {
    /// Host type the wrapper was created for
    pub host_type: HostTypeId,
    /// The native instance
    pub instance: Box<dyn Any>,
    /// Bound methods attached by eager method binding, by member name
    pub attached: HashMap<String, ObjectId>,
}

impl fmt::Debug for HostData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostData")
            .field("host_type", &self.host_type)
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}

/// Internal kind of an object.
#[derive(Debug)]
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Array. Indices in `elements.len()..length` are holes.
    Array {
        /// Dense backing storage, never longer than `length`
        elements: Vec<Value>,
        /// The array's `length`
        length: u32,
    },
    /// Callable native function
    Function(FunctionId),
    /// Getter/setter pair stored in an accessor property's slot
    AccessorPair {
        /// Getter, `Undefined` if absent
        getter: Value,
        /// Setter, `Undefined` if absent
        setter: Value,
    },
    /// Wrapper around a host instance
    Host(HostData),
    /// Host method bound to its wrapper
    BoundMethod {
        /// The wrapper object the method runs against
        target: ObjectId,
        /// Method descriptor
        descriptor: DescriptorHandle,
    },
}

/// JavaScript object with hidden class-based property storage
#[derive(Debug)]
pub struct JSObject {
    class: ShapeId,
    inline: [Value; INLINE_SLOT_COUNT],
    member_data: Vec<Value>,
    /// Internal kind
    pub kind: ObjectKind,
}

impl JSObject {
    pub(crate) fn new(class: ShapeId, kind: ObjectKind) -> Self {
        JSObject {
            class,
            inline: std::array::from_fn(|_| Value::Undefined),
            member_data: Vec::new(),
            kind,
        }
    }

    /// Current hidden class.
    #[inline]
    pub fn class(&self) -> ShapeId {
        self.class
    }

    pub(crate) fn set_class(&mut self, class: ShapeId) {
        self.class = class;
    }

    /// Reads the value stored at `location`.
    ///
    /// Slots that were never written read as `undefined`.
    #[inline]
    pub fn read(&self, location: PropertyLocation) -> Value {
        let index = location.index as usize;
        match location.kind {
            StorageKind::Inline => self.inline.get(index).cloned(),
            StorageKind::Overflow => self.member_data.get(index).cloned(),
        }
        .unwrap_or(Value::Undefined)
    }

    /// Stores `value` at `location`, growing member data as needed.
    pub(crate) fn write(&mut self, location: PropertyLocation, value: Value) {
        let index = location.index as usize;
        match location.kind {
            StorageKind::Inline => {
                if let Some(slot) = self.inline.get_mut(index) {
                    *slot = value;
                }
            }
            StorageKind::Overflow => {
                if self.member_data.len() <= index {
                    self.member_data.resize(index + 1, Value::Undefined);
                }
                self.member_data[index] = value;
            }
        }
    }

    /// Number of overflow slots in use.
    pub fn member_data_len(&self) -> usize {
        self.member_data.len()
    }

    /// `true` for functions and bound methods.
    pub fn is_callable(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Function(_) | ObjectKind::BoundMethod { .. }
        )
    }

    /// Dense array elements, if this is an array.
    pub fn elements(&self) -> Option<&[Value]> {
        match &self.kind {
            ObjectKind::Array { elements, .. } => Some(elements),
            _ => None,
        }
    }

    /// Host wrapper state, if this wraps a host instance.
    pub fn host(&self) -> Option<&HostData> {
        match &self.kind {
            ObjectKind::Host(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable host wrapper state.
    pub fn host_mut(&mut self) -> Option<&mut HostData> {
        match &mut self.kind {
            ObjectKind::Host(data) => Some(data),
            _ => None,
        }
    }
}
