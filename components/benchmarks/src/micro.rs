//! Micro-benchmarks for property lookup paths
//!
//! Each benchmark drives one lookup site through a workload that keeps it in
//! a particular state, so the numbers compare the cached fast paths with the
//! generic resolver.

use std::any::Any;

use crate::runner::{Benchmark, BenchmarkResult, Workload};
use core_types::Value;
use interpreter::{GetSite, GlobalSite, Realm, SetSite};

const ITERATIONS: usize = 10_000;

fn object_with(realm: &mut Realm, props: &[&str]) -> Value {
    let object = realm.new_object();
    for (i, key) in props.iter().enumerate() {
        realm.define(object, key, Value::Smi(i as i32));
    }
    Value::HeapObject(object)
}

fn cycle_reads(site: GetSite, receivers: Vec<Value>) -> Workload {
    let mut next = 0;
    Box::new(move |realm: &mut Realm| {
        let receiver = &receivers[next % receivers.len()];
        next += 1;
        site.get_property(realm, receiver).map(|_| ())
    })
}

fn monomorphic_own(realm: &mut Realm) -> Workload {
    let receiver = object_with(realm, &["x", "y", "z"]);
    cycle_reads(GetSite::new("x"), vec![receiver])
}

fn polymorphic_own(realm: &mut Realm) -> Workload {
    let receivers = vec![
        object_with(realm, &["a"]),
        object_with(realm, &["a", "b"]),
    ];
    cycle_reads(GetSite::new("a"), receivers)
}

fn generic_own(realm: &mut Realm) -> Workload {
    let receivers = vec![
        object_with(realm, &["a"]),
        object_with(realm, &["a", "b"]),
        object_with(realm, &["a", "c"]),
        object_with(realm, &["a", "d"]),
    ];
    cycle_reads(GetSite::new("a"), receivers)
}

fn prototype_load(realm: &mut Realm) -> Workload {
    let proto = realm.new_object();
    realm.define(proto, "shared", Value::Smi(7));
    let child = realm.new_object_with_prototype(Some(proto));
    cycle_reads(GetSite::new("shared"), vec![Value::HeapObject(child)])
}

fn string_length(_: &mut Realm) -> Workload {
    cycle_reads(
        GetSite::new("length"),
        vec![Value::from("hello"), Value::from("lookup")],
    )
}

fn array_length(realm: &mut Realm) -> Workload {
    let array = realm.new_array(vec![Value::Smi(1), Value::Smi(2), Value::Smi(3)]);
    cycle_reads(GetSite::new("length"), vec![Value::HeapObject(array)])
}

fn own_store(realm: &mut Realm) -> Workload {
    let receiver = object_with(realm, &["x"]);
    let site = SetSite::new("x", true);
    let mut counter = 0;
    Box::new(move |realm: &mut Realm| {
        counter += 1;
        site.set_property(realm, &receiver, Value::Smi(counter)).map(|_| ())
    })
}

fn property_insertion(_: &mut Realm) -> Workload {
    let site = SetSite::new("added", true);
    Box::new(move |realm: &mut Realm| {
        let receiver = Value::HeapObject(realm.new_object());
        site.set_property(realm, &receiver, Value::Null).map(|_| ())
    })
}

fn global_load(realm: &mut Realm) -> Workload {
    realm.set_global("answer", Value::Smi(42));
    let site = GlobalSite::new("answer");
    Box::new(move |realm: &mut Realm| site.get_global(realm).map(|_| ()))
}

struct Point {
    x: f64,
}

fn read_x(instance: &dyn Any) -> Value {
    Value::Double(instance.downcast_ref::<Point>().map(|p| p.x).unwrap_or(f64::NAN))
}

fn host_property(realm: &mut Realm) -> Workload {
    let directory = realm.directory().clone();
    let ty = directory.register_type("Point");
    let receiver = match directory.define_property(ty, "x", read_x, None) {
        Ok(()) => Value::HeapObject(realm.new_host_object(ty, Box::new(Point { x: 1.5 }))),
        Err(_) => Value::Undefined,
    };
    cycle_reads(GetSite::new("x"), vec![receiver])
}

fn bench(
    name: &str,
    description: &str,
    prepare: fn(&mut Realm) -> Workload,
) -> Benchmark {
    Benchmark {
        name: name.to_string(),
        description: description.to_string(),
        iterations: ITERATIONS,
        prepare,
    }
}

/// Create all micro-benchmarks
pub fn create_benchmarks() -> Vec<Benchmark> {
    vec![
        bench("monomorphic_own_load", "Own data read, one shape", monomorphic_own),
        bench("polymorphic_own_load", "Own data read, two shapes", polymorphic_own),
        bench("generic_own_load", "Own data read, four shapes", generic_own),
        bench("prototype_load", "Inherited data read", prototype_load),
        bench("string_length", "Length of string primitives", string_length),
        bench("array_length", "Length of an array", array_length),
        bench("own_store", "Write to an existing property", own_store),
        bench("property_insertion", "Add a property to fresh objects", property_insertion),
        bench("global_load", "Read a global binding", global_load),
        bench("host_property_load", "Read a native host member", host_property),
    ]
}

/// Run all micro-benchmarks, each in a fresh realm
pub fn run_all() -> Vec<BenchmarkResult> {
    create_benchmarks()
        .iter()
        .map(|bench| bench.run(&mut Realm::default()))
        .collect()
}
