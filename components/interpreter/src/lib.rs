//! Adaptive inline caches for property access
//!
//! This crate provides the lookup machinery an interpreter uses for
//! `object.property` reads and writes:
//! - A resolver implementing full property lookup (the cold path)
//! - Get, set and global sites that cache resolutions per call site
//! - Specializations for primitive receivers and host objects
//! - A realm tying the heap, intrinsics and native directory together
//! - Lookup counters for profiling cache behavior
//!
//! # Example
//!
//! ```
//! use interpreter::{CompiledLookup, IcState, LookupTable, Realm};
//! use core_types::Value;
//!
//! let mut realm = Realm::default();
//! let table = LookupTable::from_compiled(&[
//!     CompiledLookup::setter("count", true),
//!     CompiledLookup::getter("count"),
//! ]);
//! let object = Value::HeapObject(realm.new_object());
//!
//! let set = table.setter(0).unwrap();
//! let get = table.getter(1).unwrap();
//! set.set_property(&mut realm, &object, Value::Smi(1)).unwrap();
//! assert_eq!(get.get_property(&mut realm, &object).unwrap(), Value::Smi(1));
//! assert_eq!(get.state(), IcState::Monomorphic);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod global;
mod host_lookup;
pub mod inline_cache;
pub mod lookup_table;
pub mod primitive;
pub mod realm;
pub mod resolver;
pub mod set_cache;
pub mod stats;

// Re-export main types at crate root
pub use config::{HostMethodPolicy, LookupConfig, MethodBinding};
pub use global::GlobalSite;
pub use inline_cache::{GetSite, POLYMORPHIC_ENTRIES};
pub use lookup_table::{CompiledLookup, LookupKind, LookupSite, LookupTable};
pub use realm::{Intrinsics, NativeFn, Realm};
pub use resolver::{resolve, Resolution};
pub use set_cache::SetSite;
pub use stats::{IcState, LookupStats};
