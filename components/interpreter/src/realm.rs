//! Realm: the heap, intrinsic objects and native functions lookups run against.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use core_types::{JsError, JsResult, ObjectId, PrimitiveKind, Value};
use host_bridge::{DescriptorHandle, HostTypeId, NativeDirectory, NativeProperty};
use memory_manager::{FunctionId, Heap, ObjectKind, PropertyFlags};

use crate::config::LookupConfig;
use crate::stats::LookupStats;

/// A function callable from lookups (getters, setters, plain callables).
///
/// Receives the realm, `this` and the arguments.
pub type NativeFn = Rc<dyn Fn(&mut Realm, &Value, &[Value]) -> JsResult<Value>>;

/// Objects every realm creates up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intrinsics {
    /// `Object.prototype`
    pub object_prototype: ObjectId,
    /// `Function.prototype`
    pub function_prototype: ObjectId,
    /// `Array.prototype`
    pub array_prototype: ObjectId,
    /// `Boolean.prototype`
    pub boolean_prototype: ObjectId,
    /// `Number.prototype`
    pub number_prototype: ObjectId,
    /// `String.prototype`
    pub string_prototype: ObjectId,
    /// The global object
    pub global: ObjectId,
}

/// Execution environment for lookup sites.
///
/// # Example
///
/// ```
/// use interpreter::{GetSite, Realm};
/// use core_types::Value;
///
/// let mut realm = Realm::default();
/// let point = realm.new_object();
/// realm.define(point, "x", Value::Smi(3));
///
/// let site = GetSite::new("x");
/// let receiver = Value::HeapObject(point);
/// assert_eq!(site.get_property(&mut realm, &receiver).unwrap(), Value::Smi(3));
/// ```
pub struct Realm {
    heap: Heap,
    intrinsics: Intrinsics,
    functions: Vec<NativeFn>,
    directory: Arc<NativeDirectory>,
    config: LookupConfig,
    stats: LookupStats,
}

impl Realm {
    /// Create a realm sharing `directory`, with default configuration.
    pub fn new(directory: Arc<NativeDirectory>) -> Self {
        Self::with_config(directory, LookupConfig::default())
    }

    /// Create a realm with explicit configuration.
    pub fn with_config(directory: Arc<NativeDirectory>, config: LookupConfig) -> Self {
        let mut heap = Heap::new();
        let object_prototype = heap.alloc_object(None);
        let function_prototype = heap.alloc_object(Some(object_prototype));
        let array_prototype = heap.alloc_object(Some(object_prototype));
        let boolean_prototype = heap.alloc_object(Some(object_prototype));
        let number_prototype = heap.alloc_object(Some(object_prototype));
        let string_prototype = heap.alloc_object(Some(object_prototype));
        let global = heap.alloc_object(Some(object_prototype));

        // Primitive receivers reach these without any object linking to them.
        for proto in [boolean_prototype, number_prototype, string_prototype] {
            heap.register_prototype(proto);
        }

        Realm {
            heap,
            intrinsics: Intrinsics {
                object_prototype,
                function_prototype,
                array_prototype,
                boolean_prototype,
                number_prototype,
                string_prototype,
                global,
            },
            functions: Vec::new(),
            directory,
            config,
            stats: LookupStats::new(),
        }
    }

    /// The object heap.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Mutable access to the object heap.
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// Intrinsic objects.
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// The shared native directory.
    pub fn directory(&self) -> &Arc<NativeDirectory> {
        &self.directory
    }

    /// Lookup configuration.
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Lookup counters.
    pub fn stats(&self) -> &LookupStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut LookupStats {
        &mut self.stats
    }

    /// Canonical prototype used as chain root for a primitive kind.
    pub fn canonical_prototype(&self, kind: PrimitiveKind) -> ObjectId {
        match kind {
            PrimitiveKind::Boolean => self.intrinsics.boolean_prototype,
            PrimitiveKind::Number => self.intrinsics.number_prototype,
            PrimitiveKind::String => self.intrinsics.string_prototype,
        }
    }

    // ----- object creation -----

    /// New empty object inheriting from `Object.prototype`.
    pub fn new_object(&mut self) -> ObjectId {
        self.heap.alloc_object(Some(self.intrinsics.object_prototype))
    }

    /// New object inheriting from `prototype`.
    pub fn new_object_with_prototype(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        self.heap.alloc_object(prototype)
    }

    /// New array inheriting from `Array.prototype`.
    pub fn new_array(&mut self, elements: Vec<Value>) -> ObjectId {
        self.heap
            .alloc_array(Some(self.intrinsics.array_prototype), elements)
    }

    /// New wrapper for a host instance.
    pub fn new_host_object(&mut self, host_type: HostTypeId, instance: Box<dyn Any>) -> ObjectId {
        self.heap
            .alloc_host(Some(self.intrinsics.object_prototype), host_type, instance)
    }

    /// Registers a native function and returns its callable object.
    pub fn define_function<F>(&mut self, function: F) -> ObjectId
    where
        F: Fn(&mut Realm, &Value, &[Value]) -> JsResult<Value> + 'static,
    {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(Rc::new(function));
        self.heap
            .alloc_function(Some(self.intrinsics.function_prototype), id)
    }

    /// Defines a plain writable data property.
    pub fn define(&mut self, object: ObjectId, key: &str, value: Value) {
        self.heap
            .define_property(object, key, value, PropertyFlags::default());
    }

    /// Defines an accessor property; `Undefined` leaves a half absent.
    pub fn define_accessor(&mut self, object: ObjectId, key: &str, getter: Value, setter: Value) {
        self.heap.define_accessor(object, key, getter, setter);
    }

    /// Binds a global variable.
    pub fn set_global(&mut self, name: &str, value: Value) {
        let global = self.intrinsics.global;
        self.define(global, name, value);
    }

    pub(crate) fn new_bound_method(
        &mut self,
        target: ObjectId,
        descriptor: DescriptorHandle,
    ) -> ObjectId {
        self.heap.alloc_bound_method(
            Some(self.intrinsics.function_prototype),
            target,
            descriptor,
        )
    }

    // ----- calls -----

    /// Whether `value` can be called.
    pub fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .map(|id| self.heap.object(id).is_callable())
            .unwrap_or(false)
    }

    /// `typeof` including the function case.
    pub fn type_of(&self, value: &Value) -> &'static str {
        if self.is_callable(value) {
            "function"
        } else {
            value.type_of()
        }
    }

    /// Calls `callee` with `this` and `args`.
    pub fn call(&mut self, callee: &Value, this: &Value, args: &[Value]) -> JsResult<Value> {
        let id = match callee.as_object() {
            Some(id) => id,
            None => return Err(not_a_function(callee)),
        };
        match &self.heap.object(id).kind {
            ObjectKind::Function(function) => {
                let function = self
                    .functions
                    .get(function.0 as usize)
                    .cloned()
                    .ok_or_else(|| not_a_function(callee))?;
                function(self, this, args)
            }
            ObjectKind::BoundMethod { target, descriptor } => {
                let (target, descriptor) = (*target, descriptor.clone());
                self.invoke_native_method(target, &descriptor, args)
            }
            _ => Err(not_a_function(callee)),
        }
    }

    /// Runs the getter of an accessor pair with `receiver` as `this`.
    ///
    /// A missing or non-callable getter yields `undefined`.
    pub(crate) fn invoke_getter(&mut self, pair: &Value, receiver: &Value) -> JsResult<Value> {
        let getter = match self.accessor_half(pair, true) {
            Some(getter) if self.is_callable(&getter) => getter,
            _ => return Ok(Value::Undefined),
        };
        self.call(&getter, receiver, &[])
    }

    /// Runs the setter of an accessor pair. Returns `false` if there is none.
    pub(crate) fn invoke_setter(
        &mut self,
        pair: &Value,
        receiver: &Value,
        value: Value,
    ) -> JsResult<bool> {
        let setter = match self.accessor_half(pair, false) {
            Some(setter) if self.is_callable(&setter) => setter,
            _ => return Ok(false),
        };
        self.call(&setter, receiver, &[value])?;
        Ok(true)
    }

    fn accessor_half(&self, pair: &Value, getter_half: bool) -> Option<Value> {
        let id = pair.as_object()?;
        match &self.heap.object(id).kind {
            ObjectKind::AccessorPair { getter, setter } => Some(if getter_half {
                getter.clone()
            } else {
                setter.clone()
            }),
            _ => None,
        }
    }

    // ----- host instances -----

    /// Reads a native plain property of a wrapper.
    pub(crate) fn read_native(
        &self,
        target: ObjectId,
        descriptor: &DescriptorHandle,
    ) -> JsResult<Value> {
        let host = self
            .heap
            .object(target)
            .host()
            .ok_or_else(|| JsError::type_error("Illegal invocation"))?;
        match descriptor.property() {
            NativeProperty::Value { read, .. } => Ok(read(host.instance.as_ref())),
            NativeProperty::Method { .. } => Err(JsError::type_error(format!(
                "{} is a method",
                descriptor.name()
            ))),
        }
    }

    /// Writes a native plain property. Returns `false` for read-only members.
    pub(crate) fn write_native(
        &mut self,
        target: ObjectId,
        descriptor: &DescriptorHandle,
        value: Value,
    ) -> JsResult<bool> {
        let write = match descriptor.property() {
            NativeProperty::Value {
                write: Some(write), ..
            } => write,
            _ => return Ok(false),
        };
        let host = self
            .heap
            .object_mut(target)
            .host_mut()
            .ok_or_else(|| JsError::type_error("Illegal invocation"))?;
        write(host.instance.as_mut(), value)?;
        Ok(true)
    }

    /// Invokes a native method against a wrapper.
    pub(crate) fn invoke_native_method(
        &mut self,
        target: ObjectId,
        descriptor: &DescriptorHandle,
        args: &[Value],
    ) -> JsResult<Value> {
        if !descriptor.is_valid() {
            return Err(JsError::type_error(format!(
                "{} is no longer available",
                descriptor.name()
            )));
        }
        let call = match descriptor.property() {
            NativeProperty::Method { call, .. } => call,
            NativeProperty::Value { .. } => {
                return Err(JsError::type_error(format!(
                    "{} is not a function",
                    descriptor.name()
                )))
            }
        };
        let host = self
            .heap
            .object_mut(target)
            .host_mut()
            .ok_or_else(|| JsError::type_error("Illegal invocation"))?;
        call(host.instance.as_mut(), args)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new(Arc::new(NativeDirectory::new()))
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("intrinsics", &self.intrinsics)
            .field("functions", &self.functions.len())
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn not_a_function(value: &Value) -> JsError {
    JsError::type_error(format!("{} is not a function", value))
}
