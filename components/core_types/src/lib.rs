//! Core JavaScript value types and error handling.
//!
//! This crate provides the foundational types shared by the object model and
//! the property lookup caches.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`ObjectId`] - Heap index of an object
//! - [`PrimitiveKind`] - Receiver kinds resolved through canonical prototypes
//! - [`JsError`] - JavaScript errors raised by lookups
//! - [`ErrorKind`] - Types of JavaScript errors
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, Value};
//!
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of(), "number");
//!
//! let error = JsError::reference_error("x is not defined");
//! assert_eq!(error.kind, ErrorKind::ReferenceError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod value;

pub use error::{ErrorKind, JsError, JsResult};
pub use value::{ObjectId, PrimitiveKind, Value};
