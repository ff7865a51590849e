//! Lookups on boolean, number and string receivers.
//!
//! Primitives have no shape. Their properties come from the canonical
//! prototype of their kind, so a cached entry is keyed by the primitive kind
//! and the canonical prototype's proto id. String `length` is computed from
//! the string itself.

use core_types::{PrimitiveKind, Value};
use memory_manager::ProtoId;

use crate::realm::Realm;

/// `length` of a string receiver in UTF-16 code units.
///
/// Returns `None` for every other receiver.
pub fn string_length(receiver: &Value) -> Option<Value> {
    match receiver {
        Value::String(s) => Some(Value::number(s.encode_utf16().count() as f64)),
        _ => None,
    }
}

/// Whether `receiver` is a primitive of `kind` whose canonical prototype is
/// still in the state identified by `proto_id`.
pub(crate) fn proto_matches(
    realm: &Realm,
    receiver: &Value,
    kind: PrimitiveKind,
    proto_id: ProtoId,
) -> bool {
    receiver.primitive_kind() == Some(kind)
        && realm
            .heap()
            .object_proto_id(realm.canonical_prototype(kind))
            == Some(proto_id)
}
