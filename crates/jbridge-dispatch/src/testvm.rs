//! Scripted in-memory runtime for dispatch tests.
//!
//! `FakeVm` serves canned reflection records, allocates tracked handles for
//! strings/boxes/arrays, records every native call, and can be scripted to
//! return results, raise pending exceptions, or fail an allocation so the
//! rollback paths can be observed. Class handles are derived from the class
//! name hash so fixtures stay deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use jbridge_core::vm::{
    ClassProvider, ExceptionInfo, FieldId, MethodId, RawClass, RawField, RawKind, RawMethod,
    RawNesting, Vm,
};
use jbridge_core::{BridgeError, ClassId, Handle, PrimitiveKind, RawValue, Result};
use jbridge_registry::TypeRegistry;

pub struct ArrayState {
    pub kind: Option<PrimitiveKind>,
    pub elems: Vec<RawValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Instance,
    Static,
    Construct,
}

pub struct CallRecord {
    pub kind: CallKind,
    pub target: Handle,
    pub method: MethodId,
    pub args: Vec<RawValue>,
}

#[derive(Default)]
pub struct FakeVm {
    classes: Mutex<FxHashMap<String, RawClass>>,
    live: Mutex<FxHashSet<u64>>,
    released: Mutex<Vec<Handle>>,
    next: AtomicU64,
    strings: Mutex<FxHashMap<u64, String>>,
    boxed: Mutex<FxHashMap<u64, (PrimitiveKind, RawValue)>>,
    arrays: Mutex<FxHashMap<u64, ArrayState>>,
    objects: Mutex<FxHashMap<u64, String>>,
    invoke_results: Mutex<FxHashMap<u64, RawValue>>,
    pub calls: Mutex<Vec<CallRecord>>,
    statics: Mutex<FxHashMap<(u64, u64), RawValue>>,
    fields: Mutex<FxHashMap<(u64, u64), RawValue>>,
    pending: Mutex<Option<ExceptionInfo>>,
}

/// Deterministic handle for the class object of `name`.
pub fn class_handle(name: &str) -> Handle {
    Handle(ClassId::from_name(name).0 | 1)
}

impl FakeVm {
    pub fn new(classes: Vec<RawClass>) -> Arc<Self> {
        let vm = FakeVm {
            next: AtomicU64::new(0x1000),
            ..FakeVm::default()
        };
        for class in classes {
            vm.live.lock().insert(class.handle.0);
            vm.classes.lock().insert(class.name.clone(), class);
        }
        Arc::new(vm)
    }

    pub fn add_class(&self, class: RawClass) {
        self.live.lock().insert(class.handle.0);
        self.classes.lock().insert(class.name.clone(), class);
    }

    fn alloc(&self) -> Handle {
        let h = Handle(self.next.fetch_add(2, Ordering::SeqCst));
        self.live.lock().insert(h.0);
        h
    }

    /// Create a live object of the given class, as if it came from the
    /// runtime.
    pub fn seed_object(&self, class_name: &str) -> Handle {
        let h = Handle(self.next.fetch_add(2, Ordering::SeqCst));
        self.live.lock().insert(h.0);
        self.objects.lock().insert(h.0, class_name.to_string());
        h
    }

    /// Seed the value of a static field.
    pub fn seed_static(&self, class_name: &str, field: FieldId, value: RawValue) {
        self.statics
            .lock()
            .insert((class_handle(class_name).0, field.0), value);
    }

    pub fn script_invoke_result(&self, method: MethodId, result: RawValue) {
        self.invoke_results.lock().insert(method.0, result);
    }

    pub fn script_pending_exception(&self, class: &str, message: &str) {
        *self.pending.lock() = Some(ExceptionInfo {
            class: class.to_string(),
            message: message.to_string(),
        });
    }

    pub fn released(&self) -> Vec<Handle> {
        self.released.lock().clone()
    }

    pub fn is_live(&self, h: Handle) -> bool {
        self.live.lock().contains(&h.0)
    }

    pub fn string_text(&self, h: Handle) -> Option<String> {
        self.strings.lock().get(&h.0).cloned()
    }

    pub fn array_state(&self, h: Handle) -> Option<(Option<PrimitiveKind>, Vec<RawValue>)> {
        self.arrays
            .lock()
            .get(&h.0)
            .map(|a| (a.kind, a.elems.clone()))
    }

    pub fn field_value(&self, target: Handle, field: FieldId) -> Option<RawValue> {
        self.fields.lock().get(&(target.0, field.0)).cloned()
    }
}

impl ClassProvider for FakeVm {
    fn describe(&self, name: &str) -> Result<RawClass> {
        self.classes
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| BridgeError::not_found(name))
    }
}

impl Vm for FakeVm {
    fn attach_thread(&self) -> Result<()> {
        Ok(())
    }

    fn detach_thread(&self) {}

    fn acquire_handle(&self, handle: Handle) -> Handle {
        handle
    }

    fn release_handle(&self, handle: Handle) {
        let mut live = self.live.lock();
        assert!(
            live.remove(&handle.0),
            "double release or unknown handle {handle:?}"
        );
        self.released.lock().push(handle);
    }

    fn invoke(&self, target: Handle, method: MethodId, args: &[RawValue]) -> Result<RawValue> {
        self.calls.lock().push(CallRecord {
            kind: CallKind::Instance,
            target,
            method,
            args: args.to_vec(),
        });
        Ok(self
            .invoke_results
            .lock()
            .get(&method.0)
            .cloned()
            .unwrap_or(RawValue::Void))
    }

    fn invoke_static(
        &self,
        class: Handle,
        method: MethodId,
        args: &[RawValue],
    ) -> Result<RawValue> {
        self.calls.lock().push(CallRecord {
            kind: CallKind::Static,
            target: class,
            method,
            args: args.to_vec(),
        });
        Ok(self
            .invoke_results
            .lock()
            .get(&method.0)
            .cloned()
            .unwrap_or(RawValue::Void))
    }

    fn construct(&self, class: Handle, ctor: MethodId, args: &[RawValue]) -> Result<Handle> {
        self.calls.lock().push(CallRecord {
            kind: CallKind::Construct,
            target: class,
            method: ctor,
            args: args.to_vec(),
        });
        let name = self
            .classes
            .lock()
            .values()
            .find(|c| c.handle == class)
            .map(|c| c.name.clone())
            .ok_or_else(|| BridgeError::Internal {
                message: "construct on unknown class handle".into(),
            })?;
        let h = self.alloc();
        self.objects.lock().insert(h.0, name);
        Ok(h)
    }

    fn new_object_array(&self, component: Handle, len: usize) -> Result<Handle> {
        let _ = component;
        let h = self.alloc();
        self.arrays.lock().insert(
            h.0,
            ArrayState {
                kind: None,
                elems: vec![RawValue::Object(None); len],
            },
        );
        Ok(h)
    }

    fn set_object_array_element(
        &self,
        array: Handle,
        index: usize,
        value: Option<Handle>,
    ) -> Result<()> {
        let mut arrays = self.arrays.lock();
        let state = arrays.get_mut(&array.0).ok_or_else(|| BridgeError::Internal {
            message: "set element on unknown array".into(),
        })?;
        state.elems[index] = RawValue::Object(value);
        Ok(())
    }

    fn new_primitive_array(&self, kind: PrimitiveKind, elems: &[RawValue]) -> Result<Handle> {
        let h = self.alloc();
        self.arrays.lock().insert(
            h.0,
            ArrayState {
                kind: Some(kind),
                elems: elems.to_vec(),
            },
        );
        Ok(h)
    }

    fn new_string(&self, text: &str) -> Result<Handle> {
        let h = self.alloc();
        self.strings.lock().insert(h.0, text.to_string());
        Ok(h)
    }

    fn box_primitive(&self, kind: PrimitiveKind, value: RawValue) -> Result<Handle> {
        let h = self.alloc();
        self.boxed.lock().insert(h.0, (kind, value));
        Ok(h)
    }

    fn unbox(&self, object: Handle) -> Result<Option<RawValue>> {
        Ok(self.boxed.lock().get(&object.0).map(|(_, v)| *v))
    }

    fn get_field(&self, target: Handle, field: FieldId) -> Result<RawValue> {
        self.fields
            .lock()
            .get(&(target.0, field.0))
            .cloned()
            .ok_or_else(|| BridgeError::Internal {
                message: "unseeded field read".into(),
            })
    }

    fn set_field(&self, target: Handle, field: FieldId, value: RawValue) -> Result<()> {
        self.fields.lock().insert((target.0, field.0), value);
        Ok(())
    }

    fn get_static_field(&self, class: Handle, field: FieldId) -> Result<RawValue> {
        self.statics
            .lock()
            .get(&(class.0, field.0))
            .cloned()
            .ok_or_else(|| BridgeError::Internal {
                message: "unseeded static field read".into(),
            })
    }

    fn set_static_field(&self, class: Handle, field: FieldId, value: RawValue) -> Result<()> {
        self.statics.lock().insert((class.0, field.0), value);
        Ok(())
    }

    fn class_of(&self, object: Handle) -> Result<String> {
        if let Some(name) = self.objects.lock().get(&object.0) {
            return Ok(name.clone());
        }
        if self.strings.lock().contains_key(&object.0) {
            return Ok("java.lang.String".to_string());
        }
        if let Some((kind, _)) = self.boxed.lock().get(&object.0) {
            return Ok(kind.box_class().to_string());
        }
        Err(BridgeError::Internal {
            message: format!("class_of unknown handle {object:?}"),
        })
    }

    fn take_pending_exception(&self) -> Option<ExceptionInfo> {
        self.pending.lock().take()
    }
}

// === fixture builders ===

pub fn prim(kind: PrimitiveKind) -> RawClass {
    RawClass {
        name: kind.java_name().to_string(),
        access: 0x0011,
        kind: RawKind::Primitive(kind),
        nesting: RawNesting::TopLevel,
        superclass: None,
        interfaces: vec![],
        declaring: None,
        fields: vec![],
        methods: vec![],
        constructors: vec![],
        nested: vec![],
        handle: class_handle(kind.java_name()),
    }
}

pub fn cls(name: &str, superclass: Option<&str>) -> RawClass {
    RawClass {
        name: name.to_string(),
        access: 0x0001,
        kind: RawKind::Ordinary,
        nesting: RawNesting::TopLevel,
        superclass: superclass.map(Into::into),
        interfaces: vec![],
        declaring: None,
        fields: vec![],
        methods: vec![],
        constructors: vec![],
        nested: vec![],
        handle: class_handle(name),
    }
}

pub fn iface(name: &str) -> RawClass {
    RawClass {
        access: 0x0601,
        kind: RawKind::Interface,
        ..cls(name, None)
    }
}

pub fn array_cls(component: &str) -> RawClass {
    let name = jbridge_core::array_name_of(component);
    RawClass {
        kind: RawKind::Array {
            component: component.to_string(),
        },
        ..cls(&name, Some("java.lang.Object"))
    }
}

pub fn enum_cls(name: &str, constants: &[&str], first_field_id: u64) -> RawClass {
    let mut class = cls(name, Some("java.lang.Object"));
    class.kind = RawKind::Enum;
    class.access |= 0x4000;
    for (i, constant) in constants.iter().enumerate() {
        class.fields.push(RawField {
            name: (*constant).to_string(),
            access: 0x4019, // public static final enum
            ty: name.to_string(),
            id: FieldId(first_field_id + i as u64),
        });
    }
    class
}

pub fn method(name: &str, access: u32, params: &[&str], ret: &str, id: u64) -> RawMethod {
    RawMethod {
        name: name.to_string(),
        access,
        params: params.iter().map(|p| (*p).to_string()).collect(),
        ret: Some(ret.to_string()),
        varargs: false,
        id: MethodId(id),
    }
}

pub fn vararg_method(name: &str, access: u32, params: &[&str], ret: &str, id: u64) -> RawMethod {
    RawMethod {
        varargs: true,
        ..method(name, access, params, ret, id)
    }
}

pub fn ctor(params: &[&str], id: u64) -> RawMethod {
    RawMethod {
        name: "<init>".to_string(),
        access: 0x0001,
        params: params.iter().map(|p| (*p).to_string()).collect(),
        ret: None,
        varargs: false,
        id: MethodId(id),
    }
}

/// The classes almost every test needs: primitives, the core of java.lang,
/// a few array classes, and an enum with three constants.
pub fn standard_classes() -> Vec<RawClass> {
    let mut out: Vec<RawClass> = PrimitiveKind::ALL.into_iter().map(prim).collect();
    out.push(cls("java.lang.Object", None));
    out.push(iface("java.lang.CharSequence"));
    let mut string = cls("java.lang.String", Some("java.lang.Object"));
    string.interfaces = vec!["java.lang.CharSequence".to_string()];
    out.push(string);
    out.push(cls("java.lang.Number", Some("java.lang.Object")));
    for boxed in ["Byte", "Short", "Integer", "Long", "Float", "Double"] {
        out.push(cls(
            &format!("java.lang.{boxed}"),
            Some("java.lang.Number"),
        ));
    }
    out.push(cls("java.lang.Boolean", Some("java.lang.Object")));
    out.push(cls("java.lang.Character", Some("java.lang.Object")));
    for component in ["int", "long", "byte", "double", "java.lang.String", "java.lang.Object"] {
        out.push(array_cls(component));
    }
    out.push(enum_cls("demo.Color", &["RED", "GREEN", "BLUE"], 9000));
    out
}

/// A vm with the standard classes plus the given extras, and the enum
/// constants of `demo.Color` seeded as live objects.
pub fn standard_vm(extra: Vec<RawClass>) -> Arc<FakeVm> {
    let vm = FakeVm::new(standard_classes());
    for class in extra {
        vm.add_class(class);
    }
    for (i, _) in ["RED", "GREEN", "BLUE"].iter().enumerate() {
        let constant = vm.seed_object("demo.Color");
        vm.seed_static(
            "demo.Color",
            FieldId(9000 + i as u64),
            RawValue::Object(Some(constant)),
        );
    }
    vm
}

pub fn registry_over(vm: &Arc<FakeVm>) -> TypeRegistry {
    TypeRegistry::new(vm.clone())
}
