//! Inline caching system for property reads
//!
//! A [`GetSite`] remembers where a property was found for the receivers it has
//! seen and serves later reads straight from that location while the
//! receiver's shape (or its prototype's proto id) still matches. Sites move
//! through uninitialized → monomorphic → polymorphic → generic states; the
//! generic state is terminal.

use std::cell::RefCell;

use arrayvec::ArrayVec;
use core_types::{JsError, JsResult, ObjectId, PrimitiveKind, Value};
use host_bridge::{DescriptorHandle, NativeProperty};
use memory_manager::{Heap, PropertyLocation, ProtoId, RootKind, ShapeId};

use crate::config::HostMethodPolicy;
use crate::host_lookup;
use crate::primitive;
use crate::realm::Realm;
use crate::resolver::{resolve, Resolution};
use crate::stats::IcState;

/// Number of entries a polymorphic cache holds.
pub const POLYMORPHIC_ENTRIES: usize = 2;

/// Cached inherited property of an object receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProtoEntry {
    pub(crate) proto_id: ProtoId,
    pub(crate) receiver_shape: ShapeId,
    pub(crate) holder: ObjectId,
    pub(crate) location: PropertyLocation,
}

type OwnEntries = ArrayVec<(ShapeId, PropertyLocation), POLYMORPHIC_ENTRIES>;
type ProtoEntries = ArrayVec<ProtoEntry, POLYMORPHIC_ENTRIES>;

/// Active strategy of a get site.
#[derive(Debug, Clone)]
pub(crate) enum GetStrategy {
    Uninitialized,
    OwnData {
        shape: ShapeId,
        location: PropertyLocation,
    },
    OwnAccessor {
        shape: ShapeId,
        location: PropertyLocation,
    },
    ProtoData(ProtoEntry),
    ProtoAccessor(ProtoEntry),
    PolyOwnData(OwnEntries),
    PolyProtoData(ProtoEntries),
    PolyProtoAccessor(ProtoEntries),
    PrimitiveProto {
        kind: PrimitiveKind,
        proto_id: ProtoId,
        holder: ObjectId,
        location: PropertyLocation,
        accessor: bool,
    },
    StringLength,
    ArrayLength,
    Native {
        shape: ShapeId,
        descriptor: DescriptorHandle,
    },
    NativeMethod {
        shape: ShapeId,
        descriptor: DescriptorHandle,
    },
    Generic,
}

impl GetStrategy {
    pub(crate) fn state(&self) -> IcState {
        match self {
            GetStrategy::Uninitialized => IcState::Uninitialized,
            GetStrategy::PolyOwnData(_)
            | GetStrategy::PolyProtoData(_)
            | GetStrategy::PolyProtoAccessor(_) => IcState::Polymorphic,
            GetStrategy::Generic => IcState::Generic,
            _ => IcState::Monomorphic,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            GetStrategy::Uninitialized => "Uninitialized",
            GetStrategy::OwnData { .. } => "OwnData",
            GetStrategy::OwnAccessor { .. } => "OwnAccessor",
            GetStrategy::ProtoData(_) => "ProtoData",
            GetStrategy::ProtoAccessor(_) => "ProtoAccessor",
            GetStrategy::PolyOwnData(_) => "PolyOwnData",
            GetStrategy::PolyProtoData(_) => "PolyProtoData",
            GetStrategy::PolyProtoAccessor(_) => "PolyProtoAccessor",
            GetStrategy::PrimitiveProto { .. } => "PrimitiveProto",
            GetStrategy::StringLength => "StringLength",
            GetStrategy::ArrayLength => "ArrayLength",
            GetStrategy::Native { .. } => "Native",
            GetStrategy::NativeMethod { .. } => "NativeMethod",
            GetStrategy::Generic => "Generic",
        }
    }

    fn descriptor(&self) -> Option<&DescriptorHandle> {
        match self {
            GetStrategy::Native { descriptor, .. }
            | GetStrategy::NativeMethod { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }
}

/// What a site reports when the property does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AbsentPolicy {
    Undefined,
    ReferenceError,
}

/// Per-call-site cache for `receiver.name` reads.
///
/// The strategy sits in a `RefCell` so a getter that re-enters the same site
/// sees a consistent value: the fast path works on a copy, and updates
/// replace the whole strategy.
///
/// # Example
///
/// ```
/// use interpreter::{GetSite, IcState, Realm};
/// use core_types::Value;
///
/// let mut realm = Realm::default();
/// let site = GetSite::new("a");
///
/// let first = realm.new_object();
/// realm.define(first, "a", Value::Smi(1));
/// let second = realm.new_object();
/// realm.define(second, "b", Value::Smi(0));
/// realm.define(second, "a", Value::Smi(2));
///
/// site.get_property(&mut realm, &Value::HeapObject(first)).unwrap();
/// assert_eq!(site.state(), IcState::Monomorphic);
/// site.get_property(&mut realm, &Value::HeapObject(second)).unwrap();
/// assert_eq!(site.state(), IcState::Polymorphic);
/// ```
#[derive(Debug)]
pub struct GetSite {
    name: String,
    host_methods: HostMethodPolicy,
    absent: AbsentPolicy,
    strategy: RefCell<GetStrategy>,
}

impl GetSite {
    /// Create an uninitialized site reading `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_host_methods(name, HostMethodPolicy::default())
    }

    /// Create a site with an explicit host method policy.
    pub fn with_host_methods(name: impl Into<String>, host_methods: HostMethodPolicy) -> Self {
        GetSite {
            name: name.into(),
            host_methods,
            absent: AbsentPolicy::Undefined,
            strategy: RefCell::new(GetStrategy::Uninitialized),
        }
    }

    pub(crate) fn for_global(name: impl Into<String>) -> Self {
        GetSite {
            absent: AbsentPolicy::ReferenceError,
            ..Self::new(name)
        }
    }

    /// Property name this site reads.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state.
    pub fn state(&self) -> IcState {
        self.strategy.borrow().state()
    }

    /// Name of the active strategy, for diagnostics.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.borrow().name()
    }

    /// Whether the site currently holds a native descriptor.
    pub fn holds_descriptor(&self) -> bool {
        self.strategy.borrow().descriptor().is_some()
    }

    /// Reads `receiver[name]`.
    pub fn get_property(&self, realm: &mut Realm, receiver: &Value) -> JsResult<Value> {
        let strategy = self.strategy.borrow().clone();
        if let Some(result) = self.probe(&strategy, realm, receiver) {
            realm.stats_mut().record_hit();
            return result;
        }
        realm.stats_mut().record_miss();
        self.miss(strategy, realm, receiver)
    }

    /// Serves the access from `strategy`, or returns `None` on a miss.
    fn probe(
        &self,
        strategy: &GetStrategy,
        realm: &mut Realm,
        receiver: &Value,
    ) -> Option<JsResult<Value>> {
        match strategy {
            GetStrategy::Uninitialized | GetStrategy::Generic => None,
            GetStrategy::OwnData { shape, location } => {
                let object = object_with_shape(realm.heap(), receiver, *shape)?;
                Some(Ok(realm.heap().read_slot(object, *location)))
            }
            GetStrategy::OwnAccessor { shape, location } => {
                let object = object_with_shape(realm.heap(), receiver, *shape)?;
                let pair = realm.heap().read_slot(object, *location);
                Some(realm.invoke_getter(&pair, receiver))
            }
            GetStrategy::ProtoData(entry) => {
                if !self.proto_hit(realm.heap(), receiver, entry) {
                    return None;
                }
                Some(Ok(realm.heap().read_slot(entry.holder, entry.location)))
            }
            GetStrategy::ProtoAccessor(entry) => {
                if !self.proto_hit(realm.heap(), receiver, entry) {
                    return None;
                }
                let pair = realm.heap().read_slot(entry.holder, entry.location);
                Some(realm.invoke_getter(&pair, receiver))
            }
            GetStrategy::PolyOwnData(entries) => {
                let object = receiver.as_object()?;
                let shape = realm.heap().shape_of(object);
                let (_, location) = entries.iter().find(|(cached, _)| *cached == shape)?;
                Some(Ok(realm.heap().read_slot(object, *location)))
            }
            GetStrategy::PolyProtoData(entries) => {
                let entry = entries
                    .iter()
                    .find(|entry| self.proto_hit(realm.heap(), receiver, entry))?;
                Some(Ok(realm.heap().read_slot(entry.holder, entry.location)))
            }
            GetStrategy::PolyProtoAccessor(entries) => {
                let entry = entries
                    .iter()
                    .find(|entry| self.proto_hit(realm.heap(), receiver, entry))?;
                let pair = realm.heap().read_slot(entry.holder, entry.location);
                Some(realm.invoke_getter(&pair, receiver))
            }
            GetStrategy::PrimitiveProto {
                kind,
                proto_id,
                holder,
                location,
                accessor,
            } => {
                if !primitive::proto_matches(realm, receiver, *kind, *proto_id) {
                    return None;
                }
                let slot = realm.heap().read_slot(*holder, *location);
                Some(if *accessor {
                    realm.invoke_getter(&slot, receiver)
                } else {
                    Ok(slot)
                })
            }
            GetStrategy::StringLength => primitive::string_length(receiver).map(Ok),
            GetStrategy::ArrayLength => {
                let length = realm.heap().array_length(receiver.as_object()?)?;
                Some(Ok(Value::number(f64::from(length))))
            }
            GetStrategy::Native { shape, descriptor } => {
                let object = object_with_shape(realm.heap(), receiver, *shape)?;
                if !descriptor.is_valid() {
                    return None;
                }
                Some(realm.read_native(object, descriptor))
            }
            GetStrategy::NativeMethod { shape, descriptor } => {
                let object = object_with_shape(realm.heap(), receiver, *shape)?;
                if !descriptor.is_valid() {
                    return None;
                }
                let method =
                    host_lookup::surface_method(realm, object, descriptor, self.host_methods);
                Some(Ok(Value::HeapObject(method)))
            }
        }
    }

    /// A proto entry applies when the receiver's prototype is in the cached
    /// state and the receiver does not shadow the key.
    fn proto_hit(&self, heap: &Heap, receiver: &Value, entry: &ProtoEntry) -> bool {
        let object = match receiver.as_object() {
            Some(object) => object,
            None => return false,
        };
        let shape = heap.shape_of(object);
        if heap.proto_id(shape) != Some(entry.proto_id) {
            return false;
        }
        shape == entry.receiver_shape || !self.shadows(heap, shape)
    }

    fn shadows(&self, heap: &Heap, shape: ShapeId) -> bool {
        match heap.shape(shape).root_kind() {
            RootKind::Host(_) => true,
            RootKind::Array if self.name == "length" => true,
            _ => heap.own_property(shape, &self.name).is_some(),
        }
    }

    fn miss(&self, current: GetStrategy, realm: &mut Realm, receiver: &Value) -> JsResult<Value> {
        let resolution = resolve(realm, receiver, &self.name)?;
        realm.stats_mut().record_resolution();

        let fresh = self.strategy_for(receiver, &resolution);
        if let Some(next) = transition(&current, fresh) {
            self.replace(realm, &current, next);
        }
        drop(current);
        self.load(realm, receiver, resolution)
    }

    /// Cacheable strategy for a fresh resolution, `None` if uncacheable.
    fn strategy_for(&self, receiver: &Value, resolution: &Resolution) -> Option<GetStrategy> {
        match resolution {
            Resolution::Own {
                shape,
                location,
                accessor: false,
            } => Some(GetStrategy::OwnData {
                shape: *shape,
                location: *location,
            }),
            Resolution::Own {
                shape,
                location,
                accessor: true,
            } => Some(GetStrategy::OwnAccessor {
                shape: *shape,
                location: *location,
            }),
            Resolution::Proto {
                proto_id: Some(proto_id),
                receiver_shape,
                holder,
                location,
                accessor,
            } => match (receiver_shape, receiver.primitive_kind()) {
                (Some(receiver_shape), _) => {
                    let entry = ProtoEntry {
                        proto_id: *proto_id,
                        receiver_shape: *receiver_shape,
                        holder: *holder,
                        location: *location,
                    };
                    Some(if *accessor {
                        GetStrategy::ProtoAccessor(entry)
                    } else {
                        GetStrategy::ProtoData(entry)
                    })
                }
                (None, Some(kind)) => Some(GetStrategy::PrimitiveProto {
                    kind,
                    proto_id: *proto_id,
                    holder: *holder,
                    location: *location,
                    accessor: *accessor,
                }),
                (None, None) => None,
            },
            Resolution::Proto { proto_id: None, .. } => None,
            Resolution::StringLength => Some(GetStrategy::StringLength),
            Resolution::ArrayLength => Some(GetStrategy::ArrayLength),
            Resolution::Native { shape, descriptor } => {
                if !descriptor.is_method() {
                    Some(GetStrategy::Native {
                        shape: *shape,
                        descriptor: descriptor.clone(),
                    })
                } else if self.host_methods == HostMethodPolicy::AttachMethods {
                    Some(GetStrategy::NativeMethod {
                        shape: *shape,
                        descriptor: descriptor.clone(),
                    })
                } else {
                    None
                }
            }
            Resolution::Absent => None,
        }
    }

    fn replace(&self, realm: &mut Realm, current: &GetStrategy, next: GetStrategy) {
        let released = match (current.descriptor(), next.descriptor()) {
            (Some(old), Some(new)) if old.ptr_eq(new) => 0,
            (Some(_), _) => 1,
            (None, _) => 0,
        };
        realm
            .stats_mut()
            .record_transition(current.state(), next.state(), released);
        // The previous strategy, and any handle it held, drops here.
        drop(self.strategy.replace(next));
    }

    /// Produces the value for a resolution computed on the slow path.
    fn load(&self, realm: &mut Realm, receiver: &Value, resolution: Resolution) -> JsResult<Value> {
        match resolution {
            Resolution::Own {
                location, accessor, ..
            } => {
                let object = receiver
                    .as_object()
                    .ok_or_else(|| JsError::type_error("own property on a primitive"))?;
                let slot = realm.heap().read_slot(object, location);
                if accessor {
                    realm.invoke_getter(&slot, receiver)
                } else {
                    Ok(slot)
                }
            }
            Resolution::Proto {
                holder,
                location,
                accessor,
                ..
            } => {
                let slot = realm.heap().read_slot(holder, location);
                if accessor {
                    realm.invoke_getter(&slot, receiver)
                } else {
                    Ok(slot)
                }
            }
            Resolution::StringLength => Ok(primitive::string_length(receiver).unwrap_or_default()),
            Resolution::ArrayLength => {
                let length = receiver
                    .as_object()
                    .and_then(|object| realm.heap().array_length(object))
                    .unwrap_or(0);
                Ok(Value::number(f64::from(length)))
            }
            Resolution::Native { descriptor, .. } => {
                let object = receiver
                    .as_object()
                    .ok_or_else(|| JsError::type_error("Illegal invocation"))?;
                match descriptor.property() {
                    NativeProperty::Value { .. } => realm.read_native(object, &descriptor),
                    NativeProperty::Method { .. } => {
                        let method = host_lookup::surface_method(
                            realm,
                            object,
                            &descriptor,
                            self.host_methods,
                        );
                        Ok(Value::HeapObject(method))
                    }
                }
            }
            Resolution::Absent => match self.absent {
                AbsentPolicy::Undefined => Ok(Value::Undefined),
                AbsentPolicy::ReferenceError => Err(JsError::reference_error(format!(
                    "{} is not defined",
                    self.name
                ))),
            },
        }
    }
}

/// Next strategy after a miss on `current`, `None` to keep it.
fn transition(current: &GetStrategy, fresh: Option<GetStrategy>) -> Option<GetStrategy> {
    match current {
        GetStrategy::Uninitialized => fresh,
        GetStrategy::Generic => None,
        _ => Some(merge(current, fresh)),
    }
}

/// Combines a monomorphic strategy with a fresh one. Only like kinds merge.
fn merge(current: &GetStrategy, fresh: Option<GetStrategy>) -> GetStrategy {
    match (current, fresh) {
        (
            GetStrategy::OwnData { shape, location },
            Some(GetStrategy::OwnData {
                shape: next_shape,
                location: next_location,
            }),
        ) => {
            let mut entries = OwnEntries::new();
            entries.push((*shape, *location));
            entries.push((next_shape, next_location));
            GetStrategy::PolyOwnData(entries)
        }
        (GetStrategy::ProtoData(first), Some(GetStrategy::ProtoData(second))) => {
            GetStrategy::PolyProtoData(pair(*first, second))
        }
        (GetStrategy::ProtoAccessor(first), Some(GetStrategy::ProtoAccessor(second))) => {
            GetStrategy::PolyProtoAccessor(pair(*first, second))
        }
        _ => GetStrategy::Generic,
    }
}

fn pair(first: ProtoEntry, second: ProtoEntry) -> ProtoEntries {
    let mut entries = ProtoEntries::new();
    entries.push(first);
    entries.push(second);
    entries
}

fn object_with_shape(heap: &Heap, receiver: &Value, shape: ShapeId) -> Option<ObjectId> {
    receiver
        .as_object()
        .filter(|&object| heap.shape_of(object) == shape)
}
