//! Unqualified identifier reads against the global object.

use core_types::{JsError, JsResult, Value};

use crate::inline_cache::GetSite;
use crate::realm::Realm;
use crate::stats::IcState;

/// Cache for reading a global binding.
///
/// Behaves like a [`GetSite`] on the global object except that an unbound
/// name raises a ReferenceError. Each distinct shape the global object is
/// observed in takes one cache entry, so a third shape degrades the site to
/// generic lookups.
#[derive(Debug)]
pub struct GlobalSite {
    site: GetSite,
}

impl GlobalSite {
    /// Create an uninitialized site for the identifier `name`.
    pub fn new(name: impl Into<String>) -> Self {
        GlobalSite {
            site: GetSite::for_global(name),
        }
    }

    /// Identifier this site reads.
    pub fn name(&self) -> &str {
        self.site.name()
    }

    /// Current state.
    pub fn state(&self) -> IcState {
        self.site.state()
    }

    /// Name of the active strategy, for diagnostics.
    pub fn strategy_name(&self) -> &'static str {
        self.site.strategy_name()
    }

    /// Reads the binding.
    pub fn get_global(&self, realm: &mut Realm) -> JsResult<Value> {
        let global = Value::HeapObject(realm.intrinsics().global);
        self.site.get_property(realm, &global)
    }

    /// Reads the binding for use as a call target.
    ///
    /// Raises a TypeError if the bound value cannot be called.
    pub fn get_global_as_call_target(&self, realm: &mut Realm) -> JsResult<Value> {
        let value = self.get_global(realm)?;
        if realm.is_callable(&value) {
            Ok(value)
        } else {
            Err(JsError::type_error(format!(
                "{} is not a function",
                self.name()
            )))
        }
    }
}
