//! Host-object bridge: the native property directory.
//!
//! Host objects (native instances wrapped for script access) expose their
//! members through this directory instead of through shapes. Lookup caches
//! hold [`DescriptorHandle`]s, which are reference counted; a cache releases
//! its handle by dropping it.
//!
//! # Overview
//!
//! - [`NativeDirectory`] - registry keyed by (host type, member name)
//! - [`NativeDescriptor`] - plain value or method, with validity flag
//! - [`DescriptorHandle`] - acquired reference to a descriptor

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod descriptor;
mod directory;

pub use descriptor::{
    DescriptorHandle, HostTypeId, NativeCall, NativeDescriptor, NativeProperty, NativeRead,
    NativeWrite,
};
pub use directory::NativeDirectory;

use thiserror::Error;

/// Errors raised while publishing members.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The host type was never registered or was unregistered.
    #[error("unknown host type {0:?}")]
    UnknownHostType(HostTypeId),
}
