//! Inline caching for property writes
//!
//! A [`SetSite`] caches writes to existing writable data properties, writes
//! that add a new property (insertions), array `length` updates and native
//! plain members. Setters are always invoked through the slow path.

use std::cell::RefCell;

use arrayvec::ArrayVec;
use core_types::{JsError, JsResult, ObjectId, Value};
use host_bridge::DescriptorHandle;
use memory_manager::{PropertyLocation, ProtoId, ShapeId};

use crate::inline_cache::POLYMORPHIC_ENTRIES;
use crate::realm::Realm;
use crate::resolver::find_in_chain;
use crate::stats::IcState;

/// Cached property insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InsertEntry {
    pub(crate) old_shape: ShapeId,
    pub(crate) new_shape: ShapeId,
    pub(crate) location: PropertyLocation,
    /// Proto id of `old_shape`'s prototype when the insertion was cached
    pub(crate) proto_id: Option<ProtoId>,
}

#[derive(Debug, Clone)]
pub(crate) enum SetStrategy {
    Uninitialized,
    OwnData {
        shape: ShapeId,
        location: PropertyLocation,
    },
    PolyOwnData(ArrayVec<(ShapeId, PropertyLocation), POLYMORPHIC_ENTRIES>),
    Insert(InsertEntry),
    ArrayLength,
    Native {
        shape: ShapeId,
        descriptor: DescriptorHandle,
    },
    Generic,
}

impl SetStrategy {
    fn state(&self) -> IcState {
        match self {
            SetStrategy::Uninitialized => IcState::Uninitialized,
            SetStrategy::PolyOwnData(_) => IcState::Polymorphic,
            SetStrategy::Generic => IcState::Generic,
            _ => IcState::Monomorphic,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SetStrategy::Uninitialized => "Uninitialized",
            SetStrategy::OwnData { .. } => "OwnData",
            SetStrategy::PolyOwnData(_) => "PolyOwnData",
            SetStrategy::Insert(_) => "Insert",
            SetStrategy::ArrayLength => "ArrayLength",
            SetStrategy::Native { .. } => "Native",
            SetStrategy::Generic => "Generic",
        }
    }

    fn descriptor(&self) -> Option<&DescriptorHandle> {
        match self {
            SetStrategy::Native { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }
}

/// Result of the slow path: whether the write happened, and what to cache.
struct SlowWrite {
    outcome: Outcome,
    cache: Option<SetStrategy>,
}

enum Outcome {
    Done,
    Rejected(String),
}

impl SlowWrite {
    fn done(cache: Option<SetStrategy>) -> Self {
        SlowWrite {
            outcome: Outcome::Done,
            cache,
        }
    }

    fn rejected(reason: String) -> Self {
        SlowWrite {
            outcome: Outcome::Rejected(reason),
            cache: None,
        }
    }
}

/// Per-call-site cache for `receiver.name = value`.
///
/// Failed writes raise a TypeError on strict sites and report `false` on
/// sloppy ones.
///
/// # Example
///
/// ```
/// use interpreter::{Realm, SetSite};
/// use core_types::Value;
///
/// let mut realm = Realm::default();
/// let site = SetSite::new("k", true);
/// let object = realm.new_object();
///
/// assert!(site.set_property(&mut realm, &Value::HeapObject(object), Value::Smi(1)).unwrap());
/// assert_eq!(site.strategy_name(), "Insert");
/// assert_eq!(realm.heap().get_own(object, "k"), Some(Value::Smi(1)));
/// ```
#[derive(Debug)]
pub struct SetSite {
    name: String,
    strict: bool,
    strategy: RefCell<SetStrategy>,
}

impl SetSite {
    /// Create an uninitialized site writing `name`.
    pub fn new(name: impl Into<String>, strict: bool) -> Self {
        SetSite {
            name: name.into(),
            strict,
            strategy: RefCell::new(SetStrategy::Uninitialized),
        }
    }

    /// Property name this site writes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether failed writes throw.
    pub fn is_strict(&self) -> bool {
        self.strict
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

    /// Performs `receiver[name] = value`.
    ///
    /// Returns `Ok(false)` when a sloppy-mode write is rejected.
    pub fn set_property(
        &self,
        realm: &mut Realm,
        receiver: &Value,
        value: Value,
    ) -> JsResult<bool> {
        if receiver.is_nullish() {
            return Err(JsError::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                receiver, self.name
            )));
        }
        let strategy = self.strategy.borrow().clone();
        let value = match self.probe(&strategy, realm, receiver, value) {
            Ok(result) => {
                realm.stats_mut().record_hit();
                return result;
            }
            Err(value) => value,
        };
        realm.stats_mut().record_miss();

        let slow = self.write_slow(realm, receiver, value)?;
        realm.stats_mut().record_resolution();
        if let Some(next) = transition(&strategy, slow.cache) {
            let released = match (strategy.descriptor(), next.descriptor()) {
                (Some(old), Some(new)) if old.ptr_eq(new) => 0,
                (Some(_), _) => 1,
                (None, _) => 0,
            };
            realm
                .stats_mut()
                .record_transition(strategy.state(), next.state(), released);
            drop(self.strategy.replace(next));
        }
        match slow.outcome {
            Outcome::Done => Ok(true),
            Outcome::Rejected(reason) => self.reject(reason),
        }
    }

    /// Fast path. Hands the value back on a miss.
    fn probe(
        &self,
        strategy: &SetStrategy,
        realm: &mut Realm,
        receiver: &Value,
        value: Value,
    ) -> Result<JsResult<bool>, Value> {
        let object = match receiver.as_object() {
            Some(object) => object,
            None => return Err(value),
        };
        let shape = realm.heap().shape_of(object);
        match strategy {
            SetStrategy::OwnData {
                shape: cached,
                location,
            } if *cached == shape => {
                realm.heap_mut().write_slot(object, *location, value);
                Ok(Ok(true))
            }
            SetStrategy::PolyOwnData(entries) => {
                match entries.iter().find(|(cached, _)| *cached == shape) {
                    Some((_, location)) => {
                        realm.heap_mut().write_slot(object, *location, value);
                        Ok(Ok(true))
                    }
                    None => Err(value),
                }
            }
            SetStrategy::Insert(entry)
                if entry.old_shape == shape && realm.heap().proto_id(shape) == entry.proto_id =>
            {
                realm
                    .heap_mut()
                    .apply_insertion(object, entry.new_shape, entry.location, value);
                realm.stats_mut().record_insertion();
                Ok(Ok(true))
            }
            SetStrategy::ArrayLength if realm.heap().array_length(object).is_some() => {
                Ok(match set_array_length(realm, object, &value) {
                    Ok(false) => self.reject(read_only_length()),
                    result => result,
                })
            }
            SetStrategy::Native {
                shape: cached,
                descriptor,
            } if *cached == shape && descriptor.is_valid() => {
                Ok(realm.write_native(object, descriptor, value))
            }
            _ => Err(value),
        }
    }

    /// Full assignment algorithm.
    fn write_slow(&self, realm: &mut Realm, receiver: &Value, value: Value) -> JsResult<SlowWrite> {
        let object = match receiver {
            Value::HeapObject(object) => *object,
            _ => return self.write_primitive(realm, receiver, value),
        };
        let key = self.name.as_str();
        let shape = realm.heap().shape_of(object);

        if key == "length" && realm.heap().array_length(object).is_some() {
            return match set_array_length(realm, object, &value) {
                Ok(true) => Ok(SlowWrite::done(Some(SetStrategy::ArrayLength))),
                Ok(false) => Ok(SlowWrite::rejected(read_only_length())),
                Err(err) => Err(err),
            };
        }

        if let Some(host_type) = realm.heap().shape(shape).host_type() {
            if let Some(descriptor) = realm.directory().lookup_native_property(host_type, key) {
                if !descriptor.is_writable() {
                    return Ok(SlowWrite::rejected(format!(
                        "Cannot assign to read only property '{}' of {}",
                        key,
                        host_type_label(realm, host_type)
                    )));
                }
                realm.write_native(object, &descriptor, value)?;
                return Ok(SlowWrite::done(Some(SetStrategy::Native { shape, descriptor })));
            }
        }

        if let Some(property) = realm.heap().own_property(shape, key) {
            if property.flags.is_accessor() {
                let pair = realm.heap().read_slot(object, property.location);
                return self.call_setter(realm, &pair, receiver, value);
            }
            if !property.flags.is_writable_data() {
                return Ok(SlowWrite::rejected(format!(
                    "Cannot assign to read only property '{}' of object",
                    key
                )));
            }
            realm.heap_mut().write_slot(object, property.location, value);
            return Ok(SlowWrite::done(Some(SetStrategy::OwnData {
                shape,
                location: property.location,
            })));
        }

        let inherited = find_in_chain(realm.heap(), realm.heap().prototype_of(shape), key);
        if let Some((holder, property)) = inherited {
            if property.flags.is_accessor() {
                let pair = realm.heap().read_slot(holder, property.location);
                return self.call_setter(realm, &pair, receiver, value);
            }
            if !property.flags.is_writable_data() {
                return Ok(SlowWrite::rejected(format!(
                    "Cannot assign to read only property '{}' of object",
                    key
                )));
            }
        }

        if !realm.heap().is_extensible(object) {
            return Ok(SlowWrite::rejected(format!(
                "Cannot add property {}, object is not extensible",
                key
            )));
        }
        let proto_id = realm.heap().proto_id(shape);
        let insertion = realm.heap_mut().add_property(object, key, value);
        realm.stats_mut().record_insertion();
        Ok(SlowWrite::done(Some(SetStrategy::Insert(InsertEntry {
            old_shape: insertion.old_shape,
            new_shape: insertion.new_shape,
            location: insertion.location,
            proto_id,
        }))))
    }

    /// Primitives cannot hold properties; only inherited setters run.
    fn write_primitive(
        &self,
        realm: &mut Realm,
        receiver: &Value,
        value: Value,
    ) -> JsResult<SlowWrite> {
        if let Some(kind) = receiver.primitive_kind() {
            let root = realm.canonical_prototype(kind);
            if let Some((holder, property)) = find_in_chain(realm.heap(), Some(root), &self.name) {
                if property.flags.is_accessor() {
                    let pair = realm.heap().read_slot(holder, property.location);
                    return self.call_setter(realm, &pair, receiver, value);
                }
            }
        }
        Ok(SlowWrite::rejected(format!(
            "Cannot create property '{}' on {} '{}'",
            self.name,
            receiver.type_of(),
            receiver
        )))
    }

    fn call_setter(
        &self,
        realm: &mut Realm,
        pair: &Value,
        receiver: &Value,
        value: Value,
    ) -> JsResult<SlowWrite> {
        if realm.invoke_setter(pair, receiver, value)? {
            Ok(SlowWrite::done(None))
        } else {
            Ok(SlowWrite::rejected(format!(
                "Cannot set property {} which has only a getter",
                self.name
            )))
        }
    }

    fn reject(&self, reason: String) -> JsResult<bool> {
        if self.strict {
            Err(JsError::type_error(reason))
        } else {
            Ok(false)
        }
    }
}

/// Next strategy after a miss on `current`, `None` to keep it.
fn transition(current: &SetStrategy, fresh: Option<SetStrategy>) -> Option<SetStrategy> {
    match (current, fresh) {
        (SetStrategy::Uninitialized, fresh) => fresh,
        (SetStrategy::Generic, _) => None,
        (
            SetStrategy::OwnData { shape, location },
            Some(SetStrategy::OwnData {
                shape: next_shape,
                location: next_location,
            }),
        ) => {
            let mut entries = ArrayVec::new();
            entries.push((*shape, *location));
            entries.push((next_shape, next_location));
            Some(SetStrategy::PolyOwnData(entries))
        }
        _ => Some(SetStrategy::Generic),
    }
}

/// Applies `array.length = value`.
///
/// The new length must be an integer in `0..=u32::MAX`; otherwise a
/// RangeError is raised and the elements are left untouched. `Ok(false)`
/// means the array is frozen.
fn set_array_length(realm: &mut Realm, array: ObjectId, value: &Value) -> JsResult<bool> {
    let requested = value.to_number();
    if !(0.0..=f64::from(u32::MAX)).contains(&requested) || requested.fract() != 0.0 {
        return Err(JsError::range_error("Invalid array length"));
    }
    Ok(realm.heap_mut().set_array_length(array, requested as u32))
}

fn read_only_length() -> String {
    "Cannot assign to read only property 'length' of object '[object Array]'".to_string()
}

fn host_type_label(realm: &Realm, host_type: host_bridge::HostTypeId) -> String {
    realm
        .directory()
        .type_name(host_type)
        .unwrap_or_else(|| "host object".to_string())
}
