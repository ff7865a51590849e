//! Native property descriptors and the handles that co-own them.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use core_types::{JsResult, Value};

/// Identifier of a registered host type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostTypeId(pub u32);

/// Reads a plain native property from a host instance.
pub type NativeRead = fn(&dyn Any) -> Value;

/// Writes a plain native property on a host instance.
pub type NativeWrite = fn(&mut dyn Any, Value) -> JsResult<()>;

/// Invokes a native method on a host instance.
pub type NativeCall = fn(&mut dyn Any, &[Value]) -> JsResult<Value>;

/// What a native member is.
#[derive(Clone, Copy)]
pub enum NativeProperty {
    /// Plain value, optionally writable.
    Value {
        /// Getter
        read: NativeRead,
        /// Setter, `None` for read-only members
        write: Option<NativeWrite>,
    },
    /// Method surfaced as a bound callable.
    Method {
        /// Entry point
        call: NativeCall,
        /// Declared parameter count
        arity: u8,
    },
}

impl fmt::Debug for NativeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeProperty::Value { write, .. } => f
                .debug_struct("Value")
                .field("writable", &write.is_some())
                .finish(),
            NativeProperty::Method { arity, .. } => {
                f.debug_struct("Method").field("arity", arity).finish()
            }
        }
    }
}

/// A member of a host type as published by the directory.
///
/// Descriptors are shared: the directory keeps one reference, every cache
/// entry and bound method holds another. A descriptor stays valid until its
/// host type is unregistered or the member is redefined.
#[derive(Debug)]
pub struct NativeDescriptor {
    host_type: HostTypeId,
    name: String,
    property: NativeProperty,
    valid: AtomicBool,
}

impl NativeDescriptor {
    pub(crate) fn new(host_type: HostTypeId, name: String, property: NativeProperty) -> Self {
        NativeDescriptor {
            host_type,
            name,
            property,
            valid: AtomicBool::new(true),
        }
    }

    /// Owning host type.
    pub fn host_type(&self) -> HostTypeId {
        self.host_type
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member's kind and entry points.
    pub fn property(&self) -> NativeProperty {
        self.property
    }

    /// `true` for methods.
    pub fn is_method(&self) -> bool {
        matches!(self.property, NativeProperty::Method { .. })
    }

    /// `true` for plain values that accept writes.
    pub fn is_writable(&self) -> bool {
        matches!(self.property, NativeProperty::Value { write: Some(_), .. })
    }

    /// `false` once the owning type was unregistered or the member replaced.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub(crate) fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
    }
}

/// Reference-counted handle to a [`NativeDescriptor`].
///
/// Cloning acquires a reference, dropping releases it.
#[derive(Clone)]
pub struct DescriptorHandle(Arc<NativeDescriptor>);

impl DescriptorHandle {
    pub(crate) fn new(descriptor: NativeDescriptor) -> Self {
        DescriptorHandle(Arc::new(descriptor))
    }

    /// Whether two handles refer to the same descriptor.
    pub fn ptr_eq(&self, other: &DescriptorHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl Deref for DescriptorHandle {
    type Target = NativeDescriptor;

    fn deref(&self) -> &NativeDescriptor {
        &self.0
    }
}

impl fmt::Debug for DescriptorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DescriptorHandle")
            .field(&self.host_type)
            .field(&self.name)
            .finish()
    }
}
