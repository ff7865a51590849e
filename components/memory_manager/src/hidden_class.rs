//! Hidden class system for optimizing JavaScript object property access.
//!
//! Hidden classes (shapes) enable fast property access by tracking object
//! layout and using location-based reads instead of hash table lookups.
//! Shapes are immutable once created and live in a [`ShapeTable`] arena;
//! caches refer to them by [`ShapeId`].

use std::collections::HashMap;

use bitflags::bitflags;
use core_types::ObjectId;
use host_bridge::HostTypeId;

/// Number of property slots embedded in every object header.
pub const INLINE_SLOT_COUNT: usize = 4;

/// Index of a hidden class in the shape table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u32);

/// Identity of a prototype object in its current state.
///
/// An object receives a proto id when it first serves as a prototype. The id
/// is replaced whenever the object, or anything on its own prototype chain,
/// changes shape, so equal ids mean an unchanged chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtoId(pub u32);

bitflags! {
    /// Property attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        /// Value can be changed (data properties only).
        const WRITABLE = 1 << 0;
        /// Property appears in enumeration.
        const ENUMERABLE = 1 << 1;
        /// Property can be deleted or reconfigured.
        const CONFIGURABLE = 1 << 2;
        /// Slot holds an accessor pair instead of a value.
        const ACCESSOR = 1 << 3;
    }
}

impl Default for PropertyFlags {
    /// Attributes of a property created by plain assignment.
    fn default() -> Self {
        Self::WRITABLE | Self::ENUMERABLE | Self::CONFIGURABLE
    }
}

impl PropertyFlags {
    /// Attributes of an accessor property created by a definition.
    pub const fn accessor() -> Self {
        Self::ACCESSOR.union(Self::ENUMERABLE).union(Self::CONFIGURABLE)
    }

    /// `true` for accessor properties.
    #[inline]
    pub fn is_accessor(self) -> bool {
        self.contains(Self::ACCESSOR)
    }

    /// `true` for writable data properties.
    #[inline]
    pub fn is_writable_data(self) -> bool {
        !self.is_accessor() && self.contains(Self::WRITABLE)
    }
}

/// Where a property value physically lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// One of the [`INLINE_SLOT_COUNT`] header slots.
    Inline,
    /// The overflow vector ("member data").
    Overflow,
}

/// A storage kind plus an index within that storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyLocation {
    /// Inline or overflow storage
    pub kind: StorageKind,
    /// Index within the chosen storage
    pub index: u32,
}

impl PropertyLocation {
    /// Maps the n-th allocated slot of a shape to its location.
    ///
    /// ```
    /// use memory_manager::{PropertyLocation, StorageKind, INLINE_SLOT_COUNT};
    ///
    /// assert_eq!(PropertyLocation::for_slot(0).kind, StorageKind::Inline);
    /// let spilled = PropertyLocation::for_slot(INLINE_SLOT_COUNT as u32);
    /// assert_eq!(spilled.kind, StorageKind::Overflow);
    /// assert_eq!(spilled.index, 0);
    /// ```
    pub fn for_slot(slot: u32) -> Self {
        let inline = INLINE_SLOT_COUNT as u32;
        if slot < inline {
            PropertyLocation {
                kind: StorageKind::Inline,
                index: slot,
            }
        } else {
            PropertyLocation {
                kind: StorageKind::Overflow,
                index: slot - inline,
            }
        }
    }
}

/// A property descriptor for a hidden class.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Name of the property
    pub name: String,
    /// Attributes
    pub flags: PropertyFlags,
    /// Storage location
    pub location: PropertyLocation,
}

/// Result of an own-property query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnProperty {
    /// Attributes
    pub flags: PropertyFlags,
    /// Storage location
    pub location: PropertyLocation,
}

/// Object class a root shape was created for.
///
/// Objects of different root kinds never share a shape, even when their
/// prototype and properties agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKind {
    /// Plain objects, functions and other non-exotic objects
    Ordinary,
    /// Arrays, whose `length` is not a shape property
    Array,
    /// Host wrappers of one host type
    Host(HostTypeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Transition {
    Add(String, PropertyFlags),
    Reconfigure(String, PropertyFlags),
    Remove(String),
    Prototype(Option<ObjectId>),
    PreventExtensions,
    Freeze,
}

/// Hidden class for JavaScript objects.
///
/// Objects with the same properties, attributes, prototype and extensibility
/// share a hidden class.
#[derive(Debug, Clone)]
pub struct HiddenClass {
    properties: Vec<PropertyDescriptor>,
    index: HashMap<String, usize>,
    prototype: Option<ObjectId>,
    root_kind: RootKind,
    extensible: bool,
    length_writable: bool,
    slot_count: u32,
}

impl HiddenClass {
    fn root(prototype: Option<ObjectId>, root_kind: RootKind) -> Self {
        HiddenClass {
            properties: Vec::new(),
            index: HashMap::new(),
            prototype,
            root_kind,
            extensible: true,
            length_writable: true,
            slot_count: 0,
        }
    }

    /// Looks up a property by name.
    ///
    /// ```
    /// use memory_manager::{PropertyFlags, RootKind, ShapeTable};
    ///
    /// let mut table = ShapeTable::new();
    /// let empty = table.root(None, RootKind::Ordinary);
    /// let with_x = table.add_property(empty, "x", PropertyFlags::default());
    /// assert!(table.get(with_x).lookup_property("x").is_some());
    /// assert!(table.get(with_x).lookup_property("y").is_none());
    /// ```
    pub fn lookup_property(&self, name: &str) -> Option<OwnProperty> {
        self.index.get(name).map(|&i| {
            let descriptor = &self.properties[i];
            OwnProperty {
                flags: descriptor.flags,
                location: descriptor.location,
            }
        })
    }

    /// Properties in definition order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Prototype object shared by all objects of this class.
    pub fn prototype(&self) -> Option<ObjectId> {
        self.prototype
    }

    /// Object class of the root this shape descends from.
    pub fn root_kind(&self) -> RootKind {
        self.root_kind
    }

    /// Host type for wrapper objects.
    pub fn host_type(&self) -> Option<HostTypeId> {
        match self.root_kind {
            RootKind::Host(host_type) => Some(host_type),
            _ => None,
        }
    }

    /// `true` for array shapes.
    pub fn is_array(&self) -> bool {
        self.root_kind == RootKind::Array
    }

    /// Whether new properties may be added.
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// Whether an array of this class may change its length. Cleared by
    /// freezing.
    pub fn is_length_writable(&self) -> bool {
        self.length_writable
    }

    /// Number of storage slots the class has allocated.
    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
    }
}

/// Arena owning every hidden class.
///
/// Transitions are memoized: the same mutation applied to the same class
/// always yields the same [`ShapeId`].
#[derive(Debug, Default)]
pub struct ShapeTable {
    classes: Vec<HiddenClass>,
    transitions: HashMap<(ShapeId, Transition), ShapeId>,
    roots: HashMap<(Option<ObjectId>, RootKind), ShapeId>,
}

impl ShapeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the class for `id`.
    ///
    /// Ids are only minted by this table and never freed.
    pub fn get(&self, id: ShapeId) -> &HiddenClass {
        &self.classes[id.0 as usize]
    }

    /// Number of classes created so far.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// `true` if no class has been created.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The empty class for a prototype and root kind.
    pub fn root(&mut self, prototype: Option<ObjectId>, root_kind: RootKind) -> ShapeId {
        if let Some(&id) = self.roots.get(&(prototype, root_kind)) {
            return id;
        }
        let id = self.push(HiddenClass::root(prototype, root_kind));
        self.roots.insert((prototype, root_kind), id);
        id
    }

    /// Adds a property in the next free slot.
    pub fn add_property(&mut self, from: ShapeId, name: &str, flags: PropertyFlags) -> ShapeId {
        self.transition(from, Transition::Add(name.to_string(), flags), |class| {
            let mut next = class.clone();
            let location = PropertyLocation::for_slot(next.slot_count);
            next.slot_count += 1;
            next.index.insert(name.to_string(), next.properties.len());
            next.properties.push(PropertyDescriptor {
                name: name.to_string(),
                flags,
                location,
            });
            next
        })
    }

    /// Changes the attributes of an existing property, keeping its location.
    pub fn reconfigure(&mut self, from: ShapeId, name: &str, flags: PropertyFlags) -> ShapeId {
        self.transition(
            from,
            Transition::Reconfigure(name.to_string(), flags),
            |class| {
                let mut next = class.clone();
                if let Some(&i) = next.index.get(name) {
                    next.properties[i].flags = flags;
                }
                next
            },
        )
    }

    /// Removes a property. Its slot is left unused.
    pub fn remove_property(&mut self, from: ShapeId, name: &str) -> ShapeId {
        self.transition(from, Transition::Remove(name.to_string()), |class| {
            let mut next = class.clone();
            next.properties.retain(|p| p.name != name);
            next.rebuild_index();
            next
        })
    }

    /// Same layout with a different prototype.
    pub fn with_prototype(&mut self, from: ShapeId, prototype: Option<ObjectId>) -> ShapeId {
        self.transition(from, Transition::Prototype(prototype), |class| {
            let mut next = class.clone();
            next.prototype = prototype;
            next
        })
    }

    /// Same layout, no further additions.
    pub fn prevent_extensions(&mut self, from: ShapeId) -> ShapeId {
        self.transition(from, Transition::PreventExtensions, |class| {
            let mut next = class.clone();
            next.extensible = false;
            next
        })
    }

    /// Non-extensible, every property non-configurable and data properties read-only.
    pub fn freeze(&mut self, from: ShapeId) -> ShapeId {
        self.transition(from, Transition::Freeze, |class| {
            let mut next = class.clone();
            next.extensible = false;
            next.length_writable = false;
            for property in &mut next.properties {
                property.flags.remove(PropertyFlags::CONFIGURABLE);
                if !property.flags.is_accessor() {
                    property.flags.remove(PropertyFlags::WRITABLE);
                }
            }
            next
        })
    }

    fn transition(
        &mut self,
        from: ShapeId,
        key: Transition,
        build: impl FnOnce(&HiddenClass) -> HiddenClass,
    ) -> ShapeId {
        if let Some(&existing) = self.transitions.get(&(from, key.clone())) {
            return existing;
        }
        let next = build(self.get(from));
        let id = self.push(next);
        self.transitions.insert((from, key), id);
        id
    }

    fn push(&mut self, class: HiddenClass) -> ShapeId {
        let id = ShapeId(self.classes.len() as u32);
        self.classes.push(class);
        id
    }
}
