//! Per-unit table of lookup sites.
//!
//! A compiled unit describes each property access it contains; the table
//! creates one uninitialized site per description. Dropping the table drops
//! every site and releases any native descriptor they still hold.

use crate::config::HostMethodPolicy;
use crate::global::GlobalSite;
use crate::inline_cache::GetSite;
use crate::set_cache::SetSite;
use crate::stats::IcState;

/// Kind of access a compiled lookup performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// `receiver.name`
    Getter,
    /// `receiver.name = value`
    Setter,
    /// Bare identifier
    GlobalGetter,
}

/// Compiled description of one access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledLookup {
    /// Access kind
    pub kind: LookupKind,
    /// Property or identifier name
    pub name: String,
    /// Strict-mode code (setters only)
    pub strict: bool,
    /// Host method treatment (getters only)
    pub host_methods: HostMethodPolicy,
}

impl CompiledLookup {
    /// A property read.
    pub fn getter(name: &str) -> Self {
        CompiledLookup {
            kind: LookupKind::Getter,
            name: name.to_string(),
            strict: false,
            host_methods: HostMethodPolicy::AttachMethods,
        }
    }

    /// A property read whose result is immediately called.
    pub fn invocation(name: &str) -> Self {
        CompiledLookup {
            host_methods: HostMethodPolicy::ForceFallback,
            ..Self::getter(name)
        }
    }

    /// A property write.
    pub fn setter(name: &str, strict: bool) -> Self {
        CompiledLookup {
            kind: LookupKind::Setter,
            strict,
            ..Self::getter(name)
        }
    }

    /// A global identifier read.
    pub fn global(name: &str) -> Self {
        CompiledLookup {
            kind: LookupKind::GlobalGetter,
            ..Self::getter(name)
        }
    }
}

/// A site of any kind.
#[derive(Debug)]
pub enum LookupSite {
    /// Property read
    Get(GetSite),
    /// Property write
    Set(SetSite),
    /// Global identifier read
    Global(GlobalSite),
}

impl LookupSite {
    /// Current state of the site.
    pub fn state(&self) -> IcState {
        match self {
            LookupSite::Get(site) => site.state(),
            LookupSite::Set(site) => site.state(),
            LookupSite::Global(site) => site.state(),
        }
    }
}

/// Sites of one compiled unit, in compilation order.
///
/// # Example
///
/// ```
/// use interpreter::{CompiledLookup, IcState, LookupTable};
///
/// let table = LookupTable::from_compiled(&[
///     CompiledLookup::getter("x"),
///     CompiledLookup::setter("y", true),
///     CompiledLookup::global("console"),
/// ]);
/// assert_eq!(table.len(), 3);
/// assert!(table.getter(0).is_some());
/// assert!(table.getter(1).is_none());
/// assert!(table.iter().all(|site| site.state() == IcState::Uninitialized));
/// ```
#[derive(Debug, Default)]
pub struct LookupTable {
    sites: Vec<LookupSite>,
}

impl LookupTable {
    /// Creates one uninitialized site per compiled lookup.
    pub fn from_compiled(lookups: &[CompiledLookup]) -> Self {
        let sites = lookups
            .iter()
            .map(|lookup| match lookup.kind {
                LookupKind::Getter => LookupSite::Get(GetSite::with_host_methods(
                    lookup.name.clone(),
                    lookup.host_methods,
                )),
                LookupKind::Setter => {
                    LookupSite::Set(SetSite::new(lookup.name.clone(), lookup.strict))
                }
                LookupKind::GlobalGetter => {
                    LookupSite::Global(GlobalSite::new(lookup.name.clone()))
                }
            })
            .collect();
        LookupTable { sites }
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// `true` if the unit has no property accesses.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Site at `index`.
    pub fn site(&self, index: usize) -> Option<&LookupSite> {
        self.sites.get(index)
    }

    /// Read site at `index`.
    pub fn getter(&self, index: usize) -> Option<&GetSite> {
        match self.sites.get(index)? {
            LookupSite::Get(site) => Some(site),
            _ => None,
        }
    }

    /// Write site at `index`.
    pub fn setter(&self, index: usize) -> Option<&SetSite> {
        match self.sites.get(index)? {
            LookupSite::Set(site) => Some(site),
            _ => None,
        }
    }

    /// Global site at `index`.
    pub fn global(&self, index: usize) -> Option<&GlobalSite> {
        match self.sites.get(index)? {
            LookupSite::Global(site) => Some(site),
            _ => None,
        }
    }

    /// All sites in order.
    pub fn iter(&self) -> impl Iterator<Item = &LookupSite> {
        self.sites.iter()
    }
}
