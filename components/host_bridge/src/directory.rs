//! The native property directory.
//!
//! Maps (host type, member name) to descriptors. One directory may be shared
//! by several realms, so the tables sit behind a read-write lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;

use crate::descriptor::{
    DescriptorHandle, HostTypeId, NativeCall, NativeDescriptor, NativeProperty, NativeRead,
    NativeWrite,
};
use crate::BridgeError;

#[derive(Debug)]
struct HostTypeEntry {
    name: String,
    members: HashMap<String, DescriptorHandle>,
}

/// Directory of native members keyed by host type and name.
///
/// # Example
///
/// ```
/// use host_bridge::NativeDirectory;
/// use core_types::Value;
/// use std::any::Any;
///
/// fn width(instance: &dyn Any) -> Value {
///     Value::Smi(*instance.downcast_ref::<i32>().unwrap_or(&0))
/// }
///
/// let directory = NativeDirectory::new();
/// let rect = directory.register_type("Rect");
/// directory.define_property(rect, "width", width, None).unwrap();
///
/// let handle = directory.lookup_native_property(rect, "width").unwrap();
/// assert!(!handle.is_method());
/// assert!(directory.lookup_native_property(rect, "height").is_none());
/// ```
#[derive(Debug)]
pub struct NativeDirectory {
    types: RwLock<HashMap<HostTypeId, HostTypeEntry>>,
    next_type: AtomicU32,
}

impl NativeDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        NativeDirectory {
            types: RwLock::new(HashMap::new()),
            next_type: AtomicU32::new(1),
        }
    }

    /// Registers a host type and returns its id.
    pub fn register_type(&self, name: &str) -> HostTypeId {
        let id = HostTypeId(self.next_type.fetch_add(1, Ordering::Relaxed));
        self.types.write().insert(
            id,
            HostTypeEntry {
                name: name.to_string(),
                members: HashMap::new(),
            },
        );
        id
    }

    /// Whether `host_type` is currently registered.
    pub fn is_registered(&self, host_type: HostTypeId) -> bool {
        self.types.read().contains_key(&host_type)
    }

    /// Registered name of a host type.
    pub fn type_name(&self, host_type: HostTypeId) -> Option<String> {
        self.types.read().get(&host_type).map(|entry| entry.name.clone())
    }

    /// Publishes a plain value member.
    pub fn define_property(
        &self,
        host_type: HostTypeId,
        name: &str,
        read: NativeRead,
        write: Option<NativeWrite>,
    ) -> Result<(), BridgeError> {
        self.define(host_type, name, NativeProperty::Value { read, write })
    }

    /// Publishes a method member.
    pub fn define_method(
        &self,
        host_type: HostTypeId,
        name: &str,
        call: NativeCall,
        arity: u8,
    ) -> Result<(), BridgeError> {
        self.define(host_type, name, NativeProperty::Method { call, arity })
    }

    fn define(
        &self,
        host_type: HostTypeId,
        name: &str,
        property: NativeProperty,
    ) -> Result<(), BridgeError> {
        let mut types = self.types.write();
        let entry = types
            .get_mut(&host_type)
            .ok_or(BridgeError::UnknownHostType(host_type))?;
        let handle = DescriptorHandle::new(NativeDescriptor::new(
            host_type,
            name.to_string(),
            property,
        ));
        // A replaced member must stop serving cached lookups.
        if let Some(previous) = entry.members.insert(name.to_string(), handle) {
            previous.invalidate();
        }
        Ok(())
    }

    /// Looks up a member. The returned handle is an acquired reference.
    pub fn lookup_native_property(
        &self,
        host_type: HostTypeId,
        name: &str,
    ) -> Option<DescriptorHandle> {
        self.types
            .read()
            .get(&host_type)
            .and_then(|entry| entry.members.get(name))
            .cloned()
    }

    /// Unregisters a host type and invalidates every descriptor it owned.
    pub fn unregister_type(&self, host_type: HostTypeId) -> Result<(), BridgeError> {
        let entry = self
            .types
            .write()
            .remove(&host_type)
            .ok_or(BridgeError::UnknownHostType(host_type))?;
        for handle in entry.members.values() {
            handle.invalidate();
        }
        Ok(())
    }

    /// Number of handles held outside the directory for a member.
    pub fn handle_count(&self, host_type: HostTypeId, name: &str) -> Option<usize> {
        self.types
            .read()
            .get(&host_type)
            .and_then(|entry| entry.members.get(name))
            .map(|handle| handle.strong_count() - 1)
    }
}

impl Default for NativeDirectory {
    fn default() -> Self {
        Self::new()
    }
}
