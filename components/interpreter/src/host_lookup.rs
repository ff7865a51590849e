//! Host-object members.
//!
//! Host wrappers expose members through the native directory rather than
//! through shape slots. Plain members are read and written through the
//! descriptor's entry points; methods are surfaced as bound callables whose
//! identity depends on the realm's [`MethodBinding`].

use core_types::ObjectId;
use host_bridge::DescriptorHandle;
use memory_manager::ObjectKind;

use crate::config::{HostMethodPolicy, MethodBinding};
use crate::realm::Realm;

/// Produces the callable returned for a host method read.
///
/// Eager binding reuses the method attached to the wrapper when it was bound
/// from the same descriptor. Lazy binding and forced fallback build a fresh,
/// detached bound method.
pub(crate) fn surface_method(
    realm: &mut Realm,
    target: ObjectId,
    descriptor: &DescriptorHandle,
    policy: HostMethodPolicy,
) -> ObjectId {
    let eager = policy == HostMethodPolicy::AttachMethods
        && realm.config().method_binding == MethodBinding::Eager;
    if !eager {
        return realm.new_bound_method(target, descriptor.clone());
    }
    if let Some(existing) = attached_method(realm, target, descriptor) {
        return existing;
    }
    let method = realm.new_bound_method(target, descriptor.clone());
    if let Some(host) = realm.heap_mut().object_mut(target).host_mut() {
        host.attached.insert(descriptor.name().to_string(), method);
    }
    method
}

fn attached_method(
    realm: &Realm,
    target: ObjectId,
    descriptor: &DescriptorHandle,
) -> Option<ObjectId> {
    let heap = realm.heap();
    let method = *heap.object(target).host()?.attached.get(descriptor.name())?;
    match &heap.object(method).kind {
        ObjectKind::BoundMethod {
            descriptor: bound, ..
        } if bound.ptr_eq(descriptor) => Some(method),
        _ => None,
    }
}
