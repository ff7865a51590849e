//! Full property resolution (the cold path).
//!
//! Resolution walks the receiver's own shape and then its prototype chain and
//! reports where the property lives, in a form lookup sites can cache.

use core_types::{JsError, JsResult, ObjectId, Value};
use host_bridge::DescriptorHandle;
use memory_manager::{Heap, OwnProperty, PropertyLocation, ProtoId, ShapeId};

use crate::realm::Realm;

/// Outcome of resolving `receiver.key`.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Own property of an object receiver.
    Own {
        /// Receiver shape
        shape: ShapeId,
        /// Slot location
        location: PropertyLocation,
        /// Slot holds an accessor pair
        accessor: bool,
    },
    /// Property inherited through the prototype chain.
    Proto {
        /// Proto id of the chain root: the receiver's direct prototype, or
        /// the canonical prototype for primitive receivers
        proto_id: Option<ProtoId>,
        /// Receiver shape, `None` for primitives
        receiver_shape: Option<ShapeId>,
        /// Object holding the property
        holder: ObjectId,
        /// Slot location within the holder
        location: PropertyLocation,
        /// Slot holds an accessor pair
        accessor: bool,
    },
    /// `length` of a string receiver.
    StringLength,
    /// `length` of an array receiver.
    ArrayLength,
    /// Member published by the native directory for a host receiver.
    Native {
        /// Receiver shape
        shape: ShapeId,
        /// Acquired descriptor handle
        descriptor: DescriptorHandle,
    },
    /// Not found anywhere.
    Absent,
}

/// Resolves `receiver.key`.
///
/// `null` and `undefined` receivers raise a TypeError naming the property.
pub fn resolve(realm: &Realm, receiver: &Value, key: &str) -> JsResult<Resolution> {
    let heap = realm.heap();
    match receiver {
        Value::Undefined | Value::Null => Err(JsError::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            receiver, key
        ))),
        Value::HeapObject(object) => Ok(resolve_object(realm, *object, key)),
        Value::String(_) if key == "length" => Ok(Resolution::StringLength),
        _ => {
            let kind = match receiver.primitive_kind() {
                Some(kind) => kind,
                None => return Ok(Resolution::Absent),
            };
            let root = realm.canonical_prototype(kind);
            Ok(match find_in_chain(heap, Some(root), key) {
                Some((holder, property)) => Resolution::Proto {
                    proto_id: heap.object_proto_id(root),
                    receiver_shape: None,
                    holder,
                    location: property.location,
                    accessor: property.flags.is_accessor(),
                },
                None => Resolution::Absent,
            })
        }
    }
}

fn resolve_object(realm: &Realm, object: ObjectId, key: &str) -> Resolution {
    let heap = realm.heap();
    let shape = heap.shape_of(object);

    if key == "length" && heap.object(object).elements().is_some() {
        return Resolution::ArrayLength;
    }
    if let Some(host_type) = heap.shape(shape).host_type() {
        if let Some(descriptor) = realm.directory().lookup_native_property(host_type, key) {
            return Resolution::Native { shape, descriptor };
        }
    }
    if let Some(property) = heap.own_property(shape, key) {
        return Resolution::Own {
            shape,
            location: property.location,
            accessor: property.flags.is_accessor(),
        };
    }
    match find_in_chain(heap, heap.prototype_of(shape), key) {
        Some((holder, property)) => Resolution::Proto {
            proto_id: heap.proto_id(shape),
            receiver_shape: Some(shape),
            holder,
            location: property.location,
            accessor: property.flags.is_accessor(),
        },
        None => Resolution::Absent,
    }
}

/// First object on the chain starting at `start` with an own `key`.
pub(crate) fn find_in_chain(
    heap: &Heap,
    start: Option<ObjectId>,
    key: &str,
) -> Option<(ObjectId, OwnProperty)> {
    let mut current = start;
    while let Some(object) = current {
        let shape = heap.shape_of(object);
        if let Some(property) = heap.own_property(shape, key) {
            return Some((object, property));
        }
        current = heap.prototype_of(shape);
    }
    None
}
