//! Unit tests for interpreter lookup sites

use std::any::Any;
use std::sync::Arc;

use core_types::{ErrorKind, JsError, JsResult, Value};
use host_bridge::{HostTypeId, NativeDirectory};
use interpreter::{
    CompiledLookup, GetSite, HostMethodPolicy, IcState, LookupConfig, LookupTable, MethodBinding,
    Realm, SetSite,
};

// ============================================================================
// Host fixtures
// ============================================================================

struct Counter {
    value: i32,
}

fn read_value(instance: &dyn Any) -> Value {
    Value::Smi(instance.downcast_ref::<Counter>().map(|c| c.value).unwrap_or(0))
}

fn write_value(instance: &mut dyn Any, value: Value) -> JsResult<()> {
    if let Some(counter) = instance.downcast_mut::<Counter>() {
        counter.value = value.to_number() as i32;
    }
    Ok(())
}

fn read_label(_: &dyn Any) -> Value {
    Value::from("counter")
}

fn increment(instance: &mut dyn Any, args: &[Value]) -> JsResult<Value> {
    let step = args.first().map(Value::to_number).unwrap_or(1.0) as i32;
    let counter = instance
        .downcast_mut::<Counter>()
        .ok_or_else(|| JsError::type_error("not a counter"))?;
    counter.value += step;
    Ok(Value::Smi(counter.value))
}

fn counter_realm(binding: MethodBinding) -> (Realm, HostTypeId) {
    let directory = Arc::new(NativeDirectory::new());
    let ty = directory.register_type("Counter");
    directory
        .define_property(ty, "value", read_value, Some(write_value))
        .unwrap();
    directory.define_property(ty, "label", read_label, None).unwrap();
    directory.define_method(ty, "increment", increment, 1).unwrap();
    let realm = Realm::with_config(
        directory,
        LookupConfig {
            method_binding: binding,
        },
    );
    (realm, ty)
}

fn new_counter(realm: &mut Realm, ty: HostTypeId, value: i32) -> Value {
    Value::HeapObject(realm.new_host_object(ty, Box::new(Counter { value })))
}

fn plain(realm: &mut Realm, props: &[(&str, i32)]) -> Value {
    let object = realm.new_object();
    for (key, value) in props {
        realm.define(object, key, Value::Smi(*value));
    }
    Value::HeapObject(object)
}

// ============================================================================
// Primitive receivers
// ============================================================================

#[test]
fn test_string_length_fast_path() {
    let mut realm = Realm::default();
    let site = GetSite::new("length");

    assert_eq!(site.get_property(&mut realm, &Value::from("abc")).unwrap(), Value::Smi(3));
    assert_eq!(site.strategy_name(), "StringLength");

    let resolutions = realm.stats().resolutions;
    let emoji = Value::from("h\u{e9}llo\u{1F600}");
    assert_eq!(site.get_property(&mut realm, &emoji).unwrap(), Value::Smi(7));
    assert_eq!(realm.stats().resolutions, resolutions);
}

#[test]
fn test_primitive_kinds_never_share_entry() {
    let mut realm = Realm::default();
    let number_proto = realm.intrinsics().number_prototype;
    let boolean_proto = realm.intrinsics().boolean_prototype;
    realm.define(number_proto, "kind", Value::from("number"));
    realm.define(boolean_proto, "kind", Value::from("boolean"));

    let site = GetSite::new("kind");
    assert_eq!(site.get_property(&mut realm, &Value::Smi(1)).unwrap(), Value::from("number"));
    assert_eq!(site.strategy_name(), "PrimitiveProto");
    assert_eq!(
        site.get_property(&mut realm, &Value::Double(2.5)).unwrap(),
        Value::from("number")
    );
    assert_eq!(site.state(), IcState::Monomorphic);

    assert_eq!(
        site.get_property(&mut realm, &Value::Boolean(true)).unwrap(),
        Value::from("boolean")
    );
    assert_eq!(site.state(), IcState::Generic);
}

#[test]
fn test_primitive_proto_reads_slot_live() {
    let mut realm = Realm::default();
    let string_proto = realm.intrinsics().string_prototype;
    realm.define(string_proto, "tag", Value::Smi(1));

    let site = GetSite::new("tag");
    site.get_property(&mut realm, &Value::from("a")).unwrap();

    realm.define(string_proto, "tag", Value::Smi(2));
    let resolutions = realm.stats().resolutions;
    assert_eq!(site.get_property(&mut realm, &Value::from("b")).unwrap(), Value::Smi(2));
    assert_eq!(realm.stats().resolutions, resolutions);
}

#[test]
fn test_primitive_proto_change_misses() {
    let mut realm = Realm::default();
    let string_proto = realm.intrinsics().string_prototype;
    realm.define(string_proto, "tag", Value::Smi(1));

    let site = GetSite::new("tag");
    site.get_property(&mut realm, &Value::from("a")).unwrap();
    realm.define(string_proto, "unrelated", Value::Null);

    let resolutions = realm.stats().resolutions;
    assert_eq!(site.get_property(&mut realm, &Value::from("a")).unwrap(), Value::Smi(1));
    assert_eq!(realm.stats().resolutions, resolutions + 1);
}

#[test]
fn test_primitive_getter_receives_primitive_this() {
    let mut realm = Realm::default();
    let getter = realm.define_function(|_, this, _| Ok(this.clone()));
    let number_proto = realm.intrinsics().number_prototype;
    realm.define_accessor(number_proto, "self", Value::HeapObject(getter), Value::Undefined);

    let site = GetSite::new("self");
    assert_eq!(site.get_property(&mut realm, &Value::Smi(5)).unwrap(), Value::Smi(5));
    assert_eq!(site.get_property(&mut realm, &Value::Smi(6)).unwrap(), Value::Smi(6));
    assert_eq!(site.strategy_name(), "PrimitiveProto");
}

// ============================================================================
// Prototype caches
// ============================================================================

#[test]
fn test_polymorphic_proto_data() {
    let mut realm = Realm::default();
    let first_proto = realm.new_object();
    realm.define(first_proto, "x", Value::Smi(1));
    let second_proto = realm.new_object();
    realm.define(second_proto, "x", Value::Smi(2));
    let a = Value::HeapObject(realm.new_object_with_prototype(Some(first_proto)));
    let b = Value::HeapObject(realm.new_object_with_prototype(Some(second_proto)));

    let site = GetSite::new("x");
    site.get_property(&mut realm, &a).unwrap();
    site.get_property(&mut realm, &b).unwrap();
    assert_eq!(site.strategy_name(), "PolyProtoData");

    let resolutions = realm.stats().resolutions;
    assert_eq!(site.get_property(&mut realm, &a).unwrap(), Value::Smi(1));
    assert_eq!(site.get_property(&mut realm, &b).unwrap(), Value::Smi(2));
    assert_eq!(realm.stats().resolutions, resolutions);
}

#[test]
fn test_polymorphic_proto_accessor() {
    let mut realm = Realm::default();
    let one = realm.define_function(|_, _, _| Ok(Value::Smi(1)));
    let two = realm.define_function(|_, _, _| Ok(Value::Smi(2)));
    let first_proto = realm.new_object();
    realm.define_accessor(first_proto, "g", Value::HeapObject(one), Value::Undefined);
    let second_proto = realm.new_object();
    realm.define_accessor(second_proto, "g", Value::HeapObject(two), Value::Undefined);
    let a = Value::HeapObject(realm.new_object_with_prototype(Some(first_proto)));
    let b = Value::HeapObject(realm.new_object_with_prototype(Some(second_proto)));

    let site = GetSite::new("g");
    assert_eq!(site.get_property(&mut realm, &a).unwrap(), Value::Smi(1));
    assert_eq!(site.get_property(&mut realm, &b).unwrap(), Value::Smi(2));
    assert_eq!(site.strategy_name(), "PolyProtoAccessor");
    assert_eq!(site.get_property(&mut realm, &a).unwrap(), Value::Smi(1));
}

#[test]
fn test_receiver_mutation_keeps_proto_cache() {
    let mut realm = Realm::default();
    let proto = realm.new_object();
    realm.define(proto, "shared", Value::Smi(10));
    let child = realm.new_object_with_prototype(Some(proto));
    let receiver = Value::HeapObject(child);

    let site = GetSite::new("shared");
    site.get_property(&mut realm, &receiver).unwrap();
    realm.define(child, "own", Value::Smi(1));

    let resolutions = realm.stats().resolutions;
    assert_eq!(site.get_property(&mut realm, &receiver).unwrap(), Value::Smi(10));
    assert_eq!(realm.stats().resolutions, resolutions);
    assert_eq!(site.strategy_name(), "ProtoData");
}

#[test]
fn test_ancestor_change_invalidates_proto_cache() {
    let mut realm = Realm::default();
    let grand = realm.new_object();
    realm.define(grand, "x", Value::Smi(1));
    let parent = realm.new_object_with_prototype(Some(grand));
    let child = Value::HeapObject(realm.new_object_with_prototype(Some(parent)));

    let site = GetSite::new("x");
    assert_eq!(site.get_property(&mut realm, &child).unwrap(), Value::Smi(1));
    realm.define(parent, "x", Value::Smi(2));
    assert_eq!(site.get_property(&mut realm, &child).unwrap(), Value::Smi(2));
}

#[test]
fn test_array_length_get() {
    let mut realm = Realm::default();
    let site = GetSite::new("length");
    let a = Value::HeapObject(realm.new_array(vec![Value::Smi(1), Value::Smi(2)]));
    let b = Value::HeapObject(realm.new_array(Vec::new()));
    assert_eq!(site.get_property(&mut realm, &a).unwrap(), Value::Smi(2));
    assert_eq!(site.strategy_name(), "ArrayLength");
    assert_eq!(site.get_property(&mut realm, &b).unwrap(), Value::Smi(0));
    assert_eq!(site.state(), IcState::Monomorphic);
}

#[test]
fn test_array_length_write_then_read() {
    let mut realm = Realm::default();
    let array = realm.new_array(vec![Value::Smi(1), Value::Smi(2), Value::Smi(3)]);
    let receiver = Value::HeapObject(array);
    let set = SetSite::new("length", true);
    let get = GetSite::new("length");

    assert!(set.set_property(&mut realm, &receiver, Value::Double(4294967295.0)).unwrap());
    assert_eq!(get.get_property(&mut realm, &receiver).unwrap().to_number(), 4294967295.0);

    assert!(set.set_property(&mut realm, &receiver, Value::Smi(1)).unwrap());
    assert_eq!(get.get_property(&mut realm, &receiver).unwrap(), Value::Smi(1));
    assert_eq!(realm.heap().object(array).elements(), Some(&[Value::Smi(1)][..]));
}

#[test]
fn test_frozen_array_length_write() {
    let mut realm = Realm::default();
    let array = realm.new_array(vec![Value::Smi(1), Value::Smi(2), Value::Smi(3)]);
    realm.heap_mut().freeze(array);
    let receiver = Value::HeapObject(array);

    let err = SetSite::new("length", true)
        .set_property(&mut realm, &receiver, Value::Smi(1))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(!SetSite::new("length", false)
        .set_property(&mut realm, &receiver, Value::Smi(1))
        .unwrap());
    assert_eq!(
        GetSite::new("length").get_property(&mut realm, &receiver).unwrap(),
        Value::Smi(3)
    );
}

// ============================================================================
// Set-side state machine
// ============================================================================

#[test]
fn test_set_site_polymorphic_bound() {
    let mut realm = Realm::default();
    let first = plain(&mut realm, &[("a", 0)]);
    let second = plain(&mut realm, &[("b", 0), ("a", 0)]);
    let third = plain(&mut realm, &[("c", 0), ("a", 0)]);
    let set = SetSite::new("a", false);
    let get = GetSite::new("a");

    set.set_property(&mut realm, &first, Value::Smi(1)).unwrap();
    set.set_property(&mut realm, &second, Value::Smi(2)).unwrap();
    assert_eq!(set.state(), IcState::Polymorphic);

    let resolutions = realm.stats().resolutions;
    for round in 0..3 {
        set.set_property(&mut realm, &first, Value::Smi(round)).unwrap();
        set.set_property(&mut realm, &second, Value::Smi(round + 10)).unwrap();
    }
    assert_eq!(realm.stats().resolutions, resolutions);
    assert_eq!(set.state(), IcState::Polymorphic);

    assert!(set.set_property(&mut realm, &third, Value::Smi(7)).unwrap());
    assert_eq!(set.state(), IcState::Generic);
    assert_eq!(get.get_property(&mut realm, &first).unwrap(), Value::Smi(2));
    assert_eq!(get.get_property(&mut realm, &second).unwrap(), Value::Smi(12));
    assert_eq!(get.get_property(&mut realm, &third).unwrap(), Value::Smi(7));
}

#[test]
fn test_set_site_insert_degrades_on_shape_mismatch() {
    let mut realm = Realm::default();
    let empty = plain(&mut realm, &[]);
    let seeded = plain(&mut realm, &[("seed", 0)]);
    let set = SetSite::new("added", true);

    set.set_property(&mut realm, &empty, Value::Smi(1)).unwrap();
    assert_eq!(set.strategy_name(), "Insert");
    set.set_property(&mut realm, &seeded, Value::Smi(2)).unwrap();
    assert_eq!(set.state(), IcState::Generic);
    assert_eq!(
        GetSite::new("added").get_property(&mut realm, &seeded).unwrap(),
        Value::Smi(2)
    );
}

#[test]
fn test_host_write_site_releases_descriptor_once() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let directory = realm.directory().clone();
    let counter = new_counter(&mut realm, ty, 0);
    let object = plain(&mut realm, &[("value", 0)]);
    let set = SetSite::new("value", true);

    set.set_property(&mut realm, &counter, Value::Smi(5)).unwrap();
    assert_eq!(set.strategy_name(), "Native");
    assert_eq!(directory.handle_count(ty, "value"), Some(1));

    set.set_property(&mut realm, &object, Value::Smi(6)).unwrap();
    assert_eq!(set.state(), IcState::Generic);
    assert_eq!(directory.handle_count(ty, "value"), Some(0));
    assert_eq!(realm.stats().descriptor_releases, 1);

    set.set_property(&mut realm, &counter, Value::Smi(7)).unwrap();
    assert_eq!(directory.handle_count(ty, "value"), Some(0));
    assert_eq!(realm.stats().descriptor_releases, 1);
    assert_eq!(
        GetSite::new("value").get_property(&mut realm, &counter).unwrap(),
        Value::Smi(7)
    );
}

// ============================================================================
// Host objects
// ============================================================================

#[test]
fn test_host_property_read_and_write() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let first = new_counter(&mut realm, ty, 3);
    let second = new_counter(&mut realm, ty, 4);

    let get = GetSite::new("value");
    assert_eq!(get.get_property(&mut realm, &first).unwrap(), Value::Smi(3));
    assert_eq!(get.strategy_name(), "Native");
    assert_eq!(get.get_property(&mut realm, &second).unwrap(), Value::Smi(4));

    let set = SetSite::new("value", true);
    assert!(set.set_property(&mut realm, &first, Value::Smi(9)).unwrap());
    assert_eq!(set.strategy_name(), "Native");
    assert!(set.set_property(&mut realm, &second, Value::Smi(8)).unwrap());
    assert_eq!(get.get_property(&mut realm, &first).unwrap(), Value::Smi(9));
    assert_eq!(get.get_property(&mut realm, &second).unwrap(), Value::Smi(8));
}

#[test]
fn test_host_read_only_member() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let counter = new_counter(&mut realm, ty, 0);

    let strict = SetSite::new("label", true);
    let err = strict
        .set_property(&mut realm, &counter, Value::from("x"))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("Counter"));

    let sloppy = SetSite::new("label", false);
    assert!(!sloppy.set_property(&mut realm, &counter, Value::from("x")).unwrap());
}

#[test]
fn test_host_expando_property() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let counter = new_counter(&mut realm, ty, 0);
    let set = SetSite::new("note", false);
    assert!(set.set_property(&mut realm, &counter, Value::from("hi")).unwrap());
    let get = GetSite::new("note");
    assert_eq!(get.get_property(&mut realm, &counter).unwrap(), Value::from("hi"));
}

#[test]
fn test_eager_method_identity() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let counter = new_counter(&mut realm, ty, 0);
    let site = GetSite::new("increment");

    let first = site.get_property(&mut realm, &counter).unwrap();
    assert_eq!(site.strategy_name(), "NativeMethod");
    let second = site.get_property(&mut realm, &counter).unwrap();
    assert_eq!(first, second);

    assert_eq!(realm.call(&first, &Value::Undefined, &[Value::Smi(5)]).unwrap(), Value::Smi(5));
    let value = GetSite::new("value").get_property(&mut realm, &counter).unwrap();
    assert_eq!(value, Value::Smi(5));
}

#[test]
fn test_lazy_method_identity() {
    let (mut realm, ty) = counter_realm(MethodBinding::Lazy);
    let counter = new_counter(&mut realm, ty, 0);
    let site = GetSite::new("increment");

    let first = site.get_property(&mut realm, &counter).unwrap();
    let second = site.get_property(&mut realm, &counter).unwrap();
    assert_ne!(first, second);
    assert_eq!(site.strategy_name(), "NativeMethod");
    realm.call(&second, &Value::Undefined, &[]).unwrap();
    assert_eq!(realm.call(&first, &Value::Undefined, &[]).unwrap(), Value::Smi(2));
}

#[test]
fn test_forced_fallback_never_caches_methods() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let counter = new_counter(&mut realm, ty, 0);
    let site = GetSite::with_host_methods("increment", HostMethodPolicy::ForceFallback);

    let first = site.get_property(&mut realm, &counter).unwrap();
    let second = site.get_property(&mut realm, &counter).unwrap();
    assert_ne!(first, second);
    assert_eq!(site.state(), IcState::Uninitialized);
    assert!(!site.holds_descriptor());
    assert!(realm.is_callable(&first));

    let wrapper = counter.as_object().unwrap();
    assert!(realm.heap().object(wrapper).host().unwrap().attached.is_empty());
}

// ============================================================================
// Descriptor ownership
// ============================================================================

#[test]
fn test_degrade_releases_descriptor_once() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let counter = new_counter(&mut realm, ty, 1);
    let other = plain(&mut realm, &[("value", 2)]);
    let directory = realm.directory().clone();

    let site = GetSite::new("value");
    site.get_property(&mut realm, &counter).unwrap();
    assert_eq!(directory.handle_count(ty, "value"), Some(1));

    assert_eq!(site.get_property(&mut realm, &other).unwrap(), Value::Smi(2));
    assert_eq!(site.state(), IcState::Generic);
    assert_eq!(directory.handle_count(ty, "value"), Some(0));
    assert_eq!(realm.stats().descriptor_releases, 1);

    // Generic reads through the wrapper do not retain the descriptor.
    site.get_property(&mut realm, &counter).unwrap();
    assert_eq!(directory.handle_count(ty, "value"), Some(0));
    assert_eq!(realm.stats().descriptor_releases, 1);
}

#[test]
fn test_invalidated_descriptor_degrades() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let counter = new_counter(&mut realm, ty, 1);
    let site = GetSite::new("value");
    site.get_property(&mut realm, &counter).unwrap();
    assert!(site.holds_descriptor());

    realm.directory().unregister_type(ty).unwrap();
    assert_eq!(site.get_property(&mut realm, &counter).unwrap(), Value::Undefined);
    assert_eq!(site.state(), IcState::Generic);
    assert!(!site.holds_descriptor());
}

#[test]
fn test_redefined_member_is_reresolved() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let counter = new_counter(&mut realm, ty, 1);
    let site = GetSite::new("label");
    assert_eq!(site.get_property(&mut realm, &counter).unwrap(), Value::from("counter"));

    realm
        .directory()
        .define_property(ty, "label", read_value, None)
        .unwrap();
    assert_eq!(site.get_property(&mut realm, &counter).unwrap(), Value::Smi(1));
}

#[test]
fn test_table_drop_releases_descriptors() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let counter = new_counter(&mut realm, ty, 1);
    let directory = realm.directory().clone();

    let table = LookupTable::from_compiled(&[
        CompiledLookup::getter("value"),
        CompiledLookup::setter("value", false),
    ]);
    table.getter(0).unwrap().get_property(&mut realm, &counter).unwrap();
    table
        .setter(1)
        .unwrap()
        .set_property(&mut realm, &counter, Value::Smi(3))
        .unwrap();
    assert_eq!(directory.handle_count(ty, "value"), Some(2));

    drop(table);
    assert_eq!(directory.handle_count(ty, "value"), Some(0));
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn test_stats_track_hits_and_transitions() {
    let mut realm = Realm::default();
    let site = GetSite::new("x");
    let a = plain(&mut realm, &[("x", 1)]);
    let b = plain(&mut realm, &[("y", 0), ("x", 2)]);
    let c = plain(&mut realm, &[("z", 0), ("x", 3)]);

    for receiver in [&a, &a, &b, &b, &c] {
        site.get_property(&mut realm, receiver).unwrap();
    }
    let stats = realm.stats().snapshot();
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.resolutions, 3);
    assert_eq!(stats.upgrades, 2);
    assert_eq!(stats.degradations, 1);
}

#[test]
fn test_bound_method_outlives_type() {
    let (mut realm, ty) = counter_realm(MethodBinding::Eager);
    let counter = new_counter(&mut realm, ty, 0);
    let method = GetSite::new("increment")
        .get_property(&mut realm, &counter)
        .unwrap();
    realm.directory().unregister_type(ty).unwrap();
    let err = realm.call(&method, &Value::Undefined, &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}
