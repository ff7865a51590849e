//! Object heap.
//!
//! The heap owns every object and the shape table. Objects are addressed by
//! [`ObjectId`] and are never freed while the heap lives, so ids held by
//! caches stay meaningful. All shape changes go through the heap, which keeps
//! prototype ids current.

use std::any::Any;
use std::collections::HashMap;

use core_types::{ObjectId, Value};
use host_bridge::{DescriptorHandle, HostTypeId};

use crate::hidden_class::{
    HiddenClass, OwnProperty, PropertyFlags, PropertyLocation, ProtoId, RootKind, ShapeId,
    ShapeTable,
};
use crate::object::{FunctionId, HostData, JSObject, ObjectKind};

/// Shape change performed by a property insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Shape before the write
    pub old_shape: ShapeId,
    /// Shape after the write
    pub new_shape: ShapeId,
    /// Where the new property lives
    pub location: PropertyLocation,
}

/// Object heap with hidden class management.
///
/// # Panics
///
/// Methods taking an [`ObjectId`] index the object arena directly and panic
/// on ids that were not minted by this heap.
#[derive(Debug)]
pub struct Heap {
    objects: Vec<JSObject>,
    shapes: ShapeTable,
    proto_ids: HashMap<ObjectId, ProtoId>,
    next_proto_id: u32,
}

impl Heap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Heap {
            objects: Vec::new(),
            shapes: ShapeTable::new(),
            proto_ids: HashMap::new(),
            next_proto_id: 1,
        }
    }

    // ----- allocation -----

    /// Allocates an empty ordinary object.
    pub fn alloc_object(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        self.allocate(prototype, RootKind::Ordinary, ObjectKind::Ordinary)
    }

    /// Allocates an array holding `elements`.
    pub fn alloc_array(&mut self, prototype: Option<ObjectId>, elements: Vec<Value>) -> ObjectId {
        let mut elements = elements;
        let length = u32::try_from(elements.len()).unwrap_or(u32::MAX);
        elements.truncate(length as usize);
        self.allocate(
            prototype,
            RootKind::Array,
            ObjectKind::Array { elements, length },
        )
    }

    /// Allocates a callable backed by a realm function.
    pub fn alloc_function(
        &mut self,
        prototype: Option<ObjectId>,
        function: FunctionId,
    ) -> ObjectId {
        self.allocate(prototype, RootKind::Ordinary, ObjectKind::Function(function))
    }

    /// Allocates the getter/setter pair stored in an accessor slot.
    pub fn alloc_accessor_pair(&mut self, getter: Value, setter: Value) -> ObjectId {
        self.allocate(
            None,
            RootKind::Ordinary,
            ObjectKind::AccessorPair { getter, setter },
        )
    }

    /// Allocates a wrapper for a host instance.
    ///
    /// Wrappers of one host type share a root shape distinct from ordinary
    /// objects.
    pub fn alloc_host(
        &mut self,
        prototype: Option<ObjectId>,
        host_type: HostTypeId,
        instance: Box<dyn Any>,
    ) -> ObjectId {
        let data = HostData {
            host_type,
            instance,
            attached: HashMap::new(),
        };
        self.allocate(prototype, RootKind::Host(host_type), ObjectKind::Host(data))
    }

    /// Allocates a host method bound to `target`.
    pub fn alloc_bound_method(
        &mut self,
        prototype: Option<ObjectId>,
        target: ObjectId,
        descriptor: DescriptorHandle,
    ) -> ObjectId {
        self.allocate(
            prototype,
            RootKind::Ordinary,
            ObjectKind::BoundMethod { target, descriptor },
        )
    }

    fn allocate(
        &mut self,
        prototype: Option<ObjectId>,
        root_kind: RootKind,
        kind: ObjectKind,
    ) -> ObjectId {
        if let Some(proto) = prototype {
            self.register_prototype(proto);
        }
        let class = self.shapes.root(prototype, root_kind);
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(JSObject::new(class, kind));
        id
    }

    // ----- queries -----

    /// Borrows an object.
    pub fn object(&self, id: ObjectId) -> &JSObject {
        &self.objects[id.index()]
    }

    /// Mutably borrows an object. Its shape can only change through the heap.
    pub fn object_mut(&mut self, id: ObjectId) -> &mut JSObject {
        &mut self.objects[id.index()]
    }

    /// Current shape of an object.
    #[inline]
    pub fn shape_of(&self, id: ObjectId) -> ShapeId {
        self.objects[id.index()].class()
    }

    /// Borrows a hidden class.
    pub fn shape(&self, shape: ShapeId) -> &HiddenClass {
        self.shapes.get(shape)
    }

    /// Own property of `shape` named `key`.
    #[inline]
    pub fn own_property(&self, shape: ShapeId, key: &str) -> Option<OwnProperty> {
        self.shapes.get(shape).lookup_property(key)
    }

    /// Prototype of objects with `shape`.
    #[inline]
    pub fn prototype_of(&self, shape: ShapeId) -> Option<ObjectId> {
        self.shapes.get(shape).prototype()
    }

    /// Proto id of the prototype of objects with `shape`.
    #[inline]
    pub fn proto_id(&self, shape: ShapeId) -> Option<ProtoId> {
        self.prototype_of(shape)
            .and_then(|proto| self.proto_ids.get(&proto).copied())
    }

    /// Proto id `id` carries as a prototype, if it is one.
    pub fn object_proto_id(&self, id: ObjectId) -> Option<ProtoId> {
        self.proto_ids.get(&id).copied()
    }

    /// Whether new properties may be added to the object.
    pub fn is_extensible(&self, id: ObjectId) -> bool {
        self.shape(self.shape_of(id)).is_extensible()
    }

    /// Host type of a wrapper object.
    pub fn host_type_of(&self, id: ObjectId) -> Option<HostTypeId> {
        self.shape(self.shape_of(id)).host_type()
    }

    /// Reads a slot without consulting the shape.
    #[inline]
    pub fn read_slot(&self, id: ObjectId, location: PropertyLocation) -> Value {
        self.objects[id.index()].read(location)
    }

    /// Writes a slot without consulting the shape.
    #[inline]
    pub fn write_slot(&mut self, id: ObjectId, location: PropertyLocation, value: Value) {
        self.objects[id.index()].write(location, value);
    }

    /// Raw slot contents of an own property.
    ///
    /// For accessor properties this is the accessor pair object.
    pub fn get_own(&self, id: ObjectId, key: &str) -> Option<Value> {
        self.own_property(self.shape_of(id), key)
            .map(|property| self.read_slot(id, property.location))
    }

    /// Number of allocated objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of hidden classes created.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    // ----- mutation -----

    /// Defines or redefines a data property.
    ///
    /// Extensibility is not checked; this is the setup path used by realms
    /// and tests, not the assignment path.
    pub fn define_property(
        &mut self,
        id: ObjectId,
        key: &str,
        value: Value,
        flags: PropertyFlags,
    ) -> PropertyLocation {
        let shape = self.shape_of(id);
        let location = match self.own_property(shape, key) {
            Some(existing) => {
                if existing.flags != flags {
                    let next = self.shapes.reconfigure(shape, key, flags);
                    self.change_shape(id, next);
                }
                existing.location
            }
            None => {
                let location = PropertyLocation::for_slot(self.shape(shape).slot_count());
                let next = self.shapes.add_property(shape, key, flags);
                self.change_shape(id, next);
                location
            }
        };
        self.write_slot(id, location, value);
        location
    }

    /// Defines an accessor property with the given getter and setter.
    pub fn define_accessor(
        &mut self,
        id: ObjectId,
        key: &str,
        getter: Value,
        setter: Value,
    ) -> PropertyLocation {
        let pair = self.alloc_accessor_pair(getter, setter);
        self.define_property(id, key, Value::HeapObject(pair), PropertyFlags::accessor())
    }

    /// Adds a plain writable property that the object does not have yet.
    ///
    /// Callers check absence and extensibility.
    pub fn add_property(&mut self, id: ObjectId, key: &str, value: Value) -> Insertion {
        let old_shape = self.shape_of(id);
        let new_shape = self
            .shapes
            .add_property(old_shape, key, PropertyFlags::default());
        let location = PropertyLocation::for_slot(self.shape(old_shape).slot_count());
        self.change_shape(id, new_shape);
        self.write_slot(id, location, value);
        Insertion {
            old_shape,
            new_shape,
            location,
        }
    }

    /// Replays a cached insertion: switches the shape and stores the value.
    ///
    /// The caller has verified that the object has the insertion's old shape.
    pub fn apply_insertion(
        &mut self,
        id: ObjectId,
        new_shape: ShapeId,
        location: PropertyLocation,
        value: Value,
    ) {
        self.change_shape(id, new_shape);
        self.write_slot(id, location, value);
    }

    /// Deletes an own property. Returns `false` if it is non-configurable.
    pub fn delete_property(&mut self, id: ObjectId, key: &str) -> bool {
        let shape = self.shape_of(id);
        match self.own_property(shape, key) {
            None => true,
            Some(property) if !property.flags.contains(PropertyFlags::CONFIGURABLE) => false,
            Some(property) => {
                self.write_slot(id, property.location, Value::Undefined);
                let next = self.shapes.remove_property(shape, key);
                self.change_shape(id, next);
                true
            }
        }
    }

    /// Replaces the prototype. Returns `false` if that would create a cycle.
    pub fn set_prototype(&mut self, id: ObjectId, prototype: Option<ObjectId>) -> bool {
        if let Some(proto) = prototype {
            if self.chain_contains(proto, id) {
                return false;
            }
            self.register_prototype(proto);
        }
        let next = self.shapes.with_prototype(self.shape_of(id), prototype);
        self.change_shape(id, next);
        true
    }

    /// Forbids further property additions.
    pub fn prevent_extensions(&mut self, id: ObjectId) {
        let next = self.shapes.prevent_extensions(self.shape_of(id));
        self.change_shape(id, next);
    }

    /// Freezes the object.
    pub fn freeze(&mut self, id: ObjectId) {
        let next = self.shapes.freeze(self.shape_of(id));
        self.change_shape(id, next);
    }

    // ----- arrays -----

    /// Length of an array object.
    pub fn array_length(&self, id: ObjectId) -> Option<u32> {
        match &self.object(id).kind {
            ObjectKind::Array { length, .. } => Some(*length),
            _ => None,
        }
    }

    /// Sets an array's length. Growing only leaves holes; truncating drops
    /// elements. Returns `false` for non-arrays and frozen arrays.
    pub fn set_array_length(&mut self, id: ObjectId, length: u32) -> bool {
        let writable = self.shape(self.shape_of(id)).is_length_writable();
        match &mut self.object_mut(id).kind {
            ObjectKind::Array {
                elements,
                length: current,
            } if writable => {
                elements.truncate(length as usize);
                *current = length;
                true
            }
            _ => false,
        }
    }

    // ----- prototype ids -----

    /// Marks an object as a prototype and returns its current proto id.
    ///
    /// Objects become prototypes implicitly when allocated as one or linked
    /// through [`Heap::set_prototype`]; realms call this for prototypes that
    /// are only reached from primitive receivers.
    pub fn register_prototype(&mut self, proto: ObjectId) -> ProtoId {
        if let Some(&existing) = self.proto_ids.get(&proto) {
            return existing;
        }
        let fresh = self.fresh_proto_id();
        self.proto_ids.insert(proto, fresh);
        fresh
    }

    fn fresh_proto_id(&mut self) -> ProtoId {
        let id = ProtoId(self.next_proto_id);
        self.next_proto_id += 1;
        id
    }

    fn change_shape(&mut self, id: ObjectId, shape: ShapeId) {
        if self.shape_of(id) == shape {
            return;
        }
        self.objects[id.index()].set_class(shape);
        if self.proto_ids.contains_key(&id) {
            self.renumber_dependents(id);
        }
    }

    /// Gives `changed` and every prototype whose chain passes through it a
    /// fresh proto id.
    fn renumber_dependents(&mut self, changed: ObjectId) {
        let affected: Vec<ObjectId> = self
            .proto_ids
            .keys()
            .copied()
            .filter(|&proto| self.chain_contains(proto, changed))
            .collect();
        for proto in affected {
            let fresh = self.fresh_proto_id();
            self.proto_ids.insert(proto, fresh);
        }
    }

    /// Whether `target` is `start` or on its prototype chain.
    fn chain_contains(&self, start: ObjectId, target: ObjectId) -> bool {
        let mut current = Some(start);
        while let Some(object) = current {
            if object == target {
                return true;
            }
            current = self.prototype_of(self.shape_of(object));
        }
        false
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
