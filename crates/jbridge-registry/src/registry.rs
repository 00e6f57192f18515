//! The process-wide class cache and its recursive population.
//!
//! `TypeRegistry::resolve` is idempotent and memoized by class identity.
//! Population is recursive: building a descriptor resolves its superclass,
//! interfaces, component type, and every member's parameter/field types.
//! Before members are resolved the half-built descriptor is registered in a
//! build-local pending table, so a class referring to itself (directly or
//! through a member type) terminates instead of recursing forever.
//!
//! Concurrency: the cache is read by many threads; population of a cold class
//! is serialized behind a build mutex, and the pending table commits to the
//! shared cache only when the whole build succeeds. Readers therefore never
//! observe a partially built descriptor, and exactly one descriptor exists
//! per class identity. A failed build releases every class handle it acquired
//! and leaves no stub behind.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use jbridge_core::vm::{RawClass, RawKind, RawMethod, RawNesting, Vm};
use jbridge_core::{BridgeError, ClassId, Result};

use crate::descriptor::{ClassDescriptor, ClassKind, ClassLinks, ClassMembers, Nesting};
use crate::member::{FieldDescriptor, MethodDescriptor, MethodGroup};
use crate::modifiers::Modifiers;

/// Process-wide registry of mirrored foreign classes.
pub struct TypeRegistry {
    vm: Arc<dyn Vm>,
    cache: RwLock<FxHashMap<ClassId, Arc<ClassDescriptor>>>,
    build_lock: Mutex<()>,
    shut_down: AtomicBool,
}

impl TypeRegistry {
    /// Create a registry over the given runtime.
    pub fn new(vm: Arc<dyn Vm>) -> Self {
        TypeRegistry {
            vm,
            cache: RwLock::new(FxHashMap::default()),
            build_lock: Mutex::new(()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// The runtime this registry reads from.
    pub fn vm(&self) -> &Arc<dyn Vm> {
        &self.vm
    }

    /// Resolve a class by qualified name, building and caching its mirror on
    /// first reference.
    pub fn resolve(&self, name: &str) -> Result<Arc<ClassDescriptor>> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(BridgeError::ShutDown);
        }
        let id = ClassId::from_name(name);
        if let Some(found) = self.cache.read().get(&id) {
            return Ok(found.clone());
        }

        let _build = self.build_lock.lock();
        // Another thread may have finished this class while we waited.
        if let Some(found) = self.cache.read().get(&id) {
            return Ok(found.clone());
        }

        let mut pending = FxHashMap::default();
        match self.build(name, &mut pending) {
            Ok(descriptor) => {
                let mut cache = self.cache.write();
                for (id, built) in pending {
                    cache.entry(id).or_insert(built);
                }
                Ok(descriptor)
            }
            Err(err) => {
                // Nothing from this build is reachable; give the handles back.
                for built in pending.values() {
                    self.vm.release_handle(built.handle());
                }
                Err(err)
            }
        }
    }

    /// Get an already-resolved descriptor by id.
    pub fn get(&self, id: ClassId) -> Option<Arc<ClassDescriptor>> {
        self.cache.read().get(&id).cloned()
    }

    /// Qualified name of an already-resolved class, for diagnostics.
    pub fn name_of(&self, id: ClassId) -> String {
        match self.get(id) {
            Some(d) => d.name().to_string(),
            None => id.to_string(),
        }
    }

    fn build(
        &self,
        name: &str,
        pending: &mut FxHashMap<ClassId, Arc<ClassDescriptor>>,
    ) -> Result<Arc<ClassDescriptor>> {
        let id = ClassId::from_name(name);
        if let Some(found) = pending.get(&id) {
            return Ok(found.clone());
        }
        if let Some(found) = self.cache.read().get(&id) {
            return Ok(found.clone());
        }

        let raw = self.vm.describe(name)?;
        let modifiers = Modifiers::from_bits_truncate(raw.access);
        let kind = match raw.kind {
            RawKind::Primitive(p) => ClassKind::Primitive(p),
            RawKind::Interface => ClassKind::Interface,
            RawKind::Array { .. } => ClassKind::Array,
            RawKind::Enum => ClassKind::Enum,
            RawKind::Ordinary => ClassKind::Ordinary,
        };
        let nesting = nesting_of(raw.nesting);

        let descriptor = Arc::new(ClassDescriptor::shell(
            name.to_string(),
            kind,
            modifiers,
            nesting,
            raw.handle,
        ));
        // Registered before member resolution so self-reference terminates.
        pending.insert(id, descriptor.clone());

        let links = self.build_links(&raw, pending)?;
        descriptor.install_links(links);

        let members = self.build_members(id, &raw, pending)?;
        descriptor.install_members(members);

        Ok(descriptor)
    }

    fn build_links(
        &self,
        raw: &RawClass,
        pending: &mut FxHashMap<ClassId, Arc<ClassDescriptor>>,
    ) -> Result<ClassLinks> {
        let superclass = match &raw.superclass {
            Some(n) => Some(self.build(n, pending)?.id()),
            None => None,
        };
        let mut interfaces = Vec::with_capacity(raw.interfaces.len());
        for n in &raw.interfaces {
            interfaces.push(self.build(n, pending)?.id());
        }
        let component = match &raw.kind {
            RawKind::Array { component } => Some(self.build(component, pending)?.id()),
            _ => None,
        };
        let declaring = match &raw.declaring {
            Some(n) => Some(self.build(n, pending)?.id()),
            None => None,
        };
        // Anonymous and local classes are not addressable by name; only
        // member classes enter the nested table. Ids are derived from names
        // without building the nested classes themselves.
        let nested = raw
            .nested
            .iter()
            .filter(|n| n.nesting == RawNesting::Member)
            .map(|n| ClassId::from_name(&n.name))
            .collect();

        Ok(ClassLinks {
            superclass,
            interfaces,
            component,
            declaring,
            nested,
        })
    }

    fn build_members(
        &self,
        declared_in: ClassId,
        raw: &RawClass,
        pending: &mut FxHashMap<ClassId, Arc<ClassDescriptor>>,
    ) -> Result<ClassMembers> {
        let mut members = ClassMembers::default();

        for f in &raw.fields {
            let ty = self.build(&f.ty, pending)?.id();
            let modifiers = Modifiers::from_bits_truncate(f.access);
            let field = Arc::new(FieldDescriptor {
                name: f.name.clone(),
                modifiers,
                ty,
                id: f.id,
                declared_in,
            });
            if modifiers.is_static() {
                members.static_fields.insert(f.name.clone(), field);
            } else {
                members.fields.insert(f.name.clone(), field);
            }
        }

        for m in &raw.methods {
            let method = self.build_method(declared_in, m, pending)?;
            let table = if method.is_static() {
                &mut members.static_methods
            } else {
                &mut members.methods
            };
            table
                .entry(m.name.clone())
                .or_insert_with(|| MethodGroup::new(m.name.clone()))
                .overloads
                .push(method);
        }

        members.constructors = MethodGroup::new("<init>");
        for c in &raw.constructors {
            let ctor = self.build_method(declared_in, c, pending)?;
            members.constructors.overloads.push(ctor);
        }

        Ok(members)
    }

    fn build_method(
        &self,
        declared_in: ClassId,
        raw: &RawMethod,
        pending: &mut FxHashMap<ClassId, Arc<ClassDescriptor>>,
    ) -> Result<Arc<MethodDescriptor>> {
        let mut params = Vec::with_capacity(raw.params.len());
        for p in &raw.params {
            params.push(self.build(p, pending)?.id());
        }
        let ret = match &raw.ret {
            Some(r) => Some(self.build(r, pending)?.id()),
            None => None,
        };
        let modifiers = Modifiers::from_bits_truncate(raw.access);
        Ok(Arc::new(MethodDescriptor {
            name: raw.name.clone(),
            modifiers,
            params,
            ret,
            variadic: raw.varargs || modifiers.contains(Modifiers::VARARGS),
            id: raw.id,
            declared_in,
        }))
    }

    /// Instance method lookup: walks the superclass chain and merges the
    /// name group, closest declaration first (an override shadows the
    /// superclass signature it redeclares).
    pub fn lookup_methods(&self, class: &ClassDescriptor, name: &str) -> Result<MethodGroup> {
        let mut merged = MethodGroup::new(name);
        let mut current = Some(class.id());
        while let Some(id) = current {
            let Some(d) = self.get(id) else { break };
            if let Some(group) = d.method_group(name) {
                for m in group.overloads {
                    merged.push_unshadowed(m);
                }
            }
            current = d.superclass();
        }
        if merged.is_empty() {
            return Err(BridgeError::not_found(format!("{}.{name}", class.name())));
        }
        Ok(merged)
    }

    /// Static method lookup. Statics do not participate in inheritance: they
    /// are visible only on the exact declaring class, because foreign static
    /// dispatch never goes through subtype polymorphism.
    pub fn lookup_static_methods(
        &self,
        class: &ClassDescriptor,
        name: &str,
    ) -> Result<MethodGroup> {
        class
            .static_method_group(name)
            .ok_or_else(|| BridgeError::not_found(format!("static {}.{name}", class.name())))
    }

    /// Instance field lookup through the superclass chain.
    pub fn lookup_field(
        &self,
        class: &ClassDescriptor,
        name: &str,
    ) -> Result<Arc<FieldDescriptor>> {
        let mut current = Some(class.id());
        while let Some(id) = current {
            let Some(d) = self.get(id) else { break };
            if let Some(field) = d.field(name) {
                return Ok(field);
            }
            current = d.superclass();
        }
        Err(BridgeError::not_found(format!("{}.{name}", class.name())))
    }

    /// Static field lookup on the exact class only.
    pub fn lookup_static_field(
        &self,
        class: &ClassDescriptor,
        name: &str,
    ) -> Result<Arc<FieldDescriptor>> {
        class
            .static_field(name)
            .ok_or_else(|| BridgeError::not_found(format!("static {}.{name}", class.name())))
    }

    /// Whether a value of class `from` is assignable to `to` (identity,
    /// superclass chain, or transitively implemented interface).
    pub fn is_assignable(&self, from: ClassId, to: ClassId) -> bool {
        if from == to {
            return true;
        }
        // Every reference type is assignable to the root type.
        if to == ClassId::from_name("java.lang.Object") {
            return self.get(from).is_some_and(|d| d.is_reference());
        }
        let mut work = vec![from];
        let mut seen = rustc_hash::FxHashSet::default();
        while let Some(id) = work.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(d) = self.get(id) else { continue };
            if let Some(sup) = d.superclass() {
                if sup == to {
                    return true;
                }
                work.push(sup);
            }
            for iface in d.interfaces() {
                if iface == to {
                    return true;
                }
                work.push(iface);
            }
        }
        false
    }

    /// Tear the registry down before runtime shutdown: break every
    /// descriptor's links and give each class handle back to the runtime.
    /// After this, every operation fails with [`BridgeError::ShutDown`].
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        let _build = self.build_lock.lock();
        let mut cache = self.cache.write();
        for (_, descriptor) in cache.drain() {
            descriptor.dissolve();
            self.vm.release_handle(descriptor.handle());
        }
    }
}

fn nesting_of(raw: RawNesting) -> Nesting {
    match raw {
        RawNesting::TopLevel => Nesting::TopLevel,
        RawNesting::Member => Nesting::Member,
        RawNesting::Local => Nesting::Local,
        RawNesting::Anonymous => Nesting::Anonymous,
    }
}
