//! Contract tests for interpreter API
//!
//! These tests verify the entry points an interpreter loop calls exist with
//! the expected signatures and observable behavior.

use core_types::{ErrorKind, JsResult, Value};
use interpreter::{
    resolve, CompiledLookup, GetSite, GlobalSite, IcState, LookupKind, LookupSite, LookupStats,
    LookupTable, Realm, Resolution, SetSite,
};

/// Test GetSite::get_property(realm, receiver) -> JsResult<Value>
#[test]
fn test_get_property_contract() {
    let mut realm = Realm::default();
    let object = realm.new_object();
    realm.define(object, "a", Value::Smi(1));

    let site = GetSite::new("a");
    let result: JsResult<Value> = site.get_property(&mut realm, &Value::HeapObject(object));
    assert_eq!(result.unwrap(), Value::Smi(1));
}

/// Test SetSite::set_property(realm, receiver, value) -> JsResult<bool>
#[test]
fn test_set_property_contract() {
    let mut realm = Realm::default();
    let object = Value::HeapObject(realm.new_object());
    let site = SetSite::new("a", false);
    let result: JsResult<bool> = site.set_property(&mut realm, &object, Value::Smi(2));
    assert!(result.unwrap());
}

/// Test GlobalSite::get_global(realm) -> JsResult<Value>
#[test]
fn test_get_global_contract() {
    let mut realm = Realm::default();
    realm.set_global("g", Value::Boolean(true));
    let site = GlobalSite::new("g");
    assert_eq!(site.get_global(&mut realm).unwrap(), Value::Boolean(true));
}

/// Test GlobalSite::get_global_as_call_target(realm) -> JsResult<Value>
#[test]
fn test_get_global_as_call_target_contract() {
    let mut realm = Realm::default();
    realm.set_global("notCallable", Value::Smi(1));
    let site = GlobalSite::new("notCallable");
    let err = site.get_global_as_call_target(&mut realm).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

/// Test global absence raises but property absence does not
#[test]
fn test_absence_contract() {
    let mut realm = Realm::default();
    let object = Value::HeapObject(realm.new_object());

    let property = GetSite::new("missing");
    assert_eq!(property.get_property(&mut realm, &object).unwrap(), Value::Undefined);

    let global = GlobalSite::new("missing");
    let err = global.get_global(&mut realm).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReferenceError);
}

/// Test resolve(realm, receiver, key) -> JsResult<Resolution>
#[test]
fn test_resolve_contract() {
    let mut realm = Realm::default();
    let object = realm.new_object();
    realm.define(object, "a", Value::Smi(1));
    let resolution = resolve(&realm, &Value::HeapObject(object), "a").unwrap();
    assert!(matches!(resolution, Resolution::Own { .. }));
    assert!(resolve(&realm, &Value::Undefined, "a").is_err());
}

/// Test LookupTable::from_compiled(&[CompiledLookup]) -> LookupTable
#[test]
fn test_lookup_table_contract() {
    let lookups = vec![
        CompiledLookup::getter("a"),
        CompiledLookup::setter("b", true),
        CompiledLookup::global("c"),
        CompiledLookup::invocation("d"),
    ];
    assert_eq!(lookups[2].kind, LookupKind::GlobalGetter);

    let table = LookupTable::from_compiled(&lookups);
    assert_eq!(table.len(), 4);
    assert!(matches!(table.site(0), Some(LookupSite::Get(_))));
    assert!(matches!(table.site(1), Some(LookupSite::Set(_))));
    assert!(matches!(table.site(2), Some(LookupSite::Global(_))));
    assert!(table
        .iter()
        .all(|site| site.state() == IcState::Uninitialized));
}

/// Test Realm::stats() -> &LookupStats
#[test]
fn test_stats_contract() {
    let mut realm = Realm::default();
    assert_eq!(*realm.stats(), LookupStats::default());
    let object = Value::HeapObject(realm.new_object());
    GetSite::new("x").get_property(&mut realm, &object).unwrap();
    assert_eq!(realm.stats().misses, 1);
    assert_eq!(realm.stats().resolutions, 1);
}
