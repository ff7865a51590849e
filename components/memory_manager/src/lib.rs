//! Memory Manager - hidden classes and the object heap
//!
//! This component provides:
//! - Hidden classes (shapes) with memoized transitions
//! - Inline and overflow property storage
//! - The object heap and prototype identity tracking
//!
//! Shapes and objects are arena-allocated and addressed by index; nothing is
//! collected while the heap lives.

#![deny(unsafe_code)]

pub mod heap;
pub mod hidden_class;
pub mod object;

// Re-export main types
pub use heap::{Heap, Insertion};
pub use hidden_class::{
    HiddenClass, OwnProperty, PropertyDescriptor, PropertyFlags, PropertyLocation, ProtoId,
    RootKind, ShapeId, ShapeTable, StorageKind, INLINE_SLOT_COUNT,
};
pub use object::{FunctionId, HostData, JSObject, ObjectKind};
