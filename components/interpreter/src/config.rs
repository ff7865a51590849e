//! Lookup configuration.
//!
//! Realm-wide options live in [`LookupConfig`]; per-site options are passed
//! when a site is created.

/// How host methods found through a cache are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodBinding {
    /// Materialize the bound method once, attach it to the wrapper and return
    /// the same object on every hit.
    #[default]
    Eager,
    /// Build a fresh bound method on every hit.
    Lazy,
}

/// Site-level treatment of host methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostMethodPolicy {
    /// Cache method descriptors like any other native member.
    #[default]
    AttachMethods,
    /// Never cache methods; resolve by name and return a detached callable.
    /// Used by invocation sites.
    ForceFallback,
}

/// Realm-wide lookup options.
///
/// # Example
///
/// ```
/// use interpreter::{LookupConfig, MethodBinding};
///
/// let config = LookupConfig {
///     method_binding: MethodBinding::Lazy,
/// };
/// assert_ne!(config, LookupConfig::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LookupConfig {
    /// Host method binding policy
    pub method_binding: MethodBinding,
}
