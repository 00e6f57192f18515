//! The bridge facade: registry + catalog + marshaller over one runtime.

use std::sync::Arc;

use jbridge_core::vm::{HostLock, NoHostLock, Vm};
use jbridge_core::{BridgeError, ObjectRef, Result, Value};
use jbridge_dispatch::convert::{
    Conversion, ConversionCatalog, CustomConvertFn, ProbeCtx, Quality, SourceFilter, TargetFilter,
};
use jbridge_dispatch::marshal::{
    self, CallOptions, CallTarget, marshal_and_invoke,
};
use jbridge_dispatch::overload::{CandidateMatch, DispatchCtx, resolve_overload};
use jbridge_registry::{ClassDescriptor, MethodGroup, TypeRegistry};

/// One process-wide bridge into one foreign runtime.
///
/// Every thread using the bridge must already be attached to the runtime
/// (the `Vm` collaborator's responsibility). All methods are callable from
/// any attached thread; the registry cache and conversion catalog are shared
/// state with interior locking.
pub struct Bridge {
    host_lock: Arc<dyn HostLock>,
    registry: TypeRegistry,
    catalog: ConversionCatalog,
}

impl Bridge {
    /// Create a bridge over a runtime, with no host-side lock to release.
    pub fn new(vm: Arc<dyn Vm>) -> Self {
        Self::with_host_lock(vm, Arc::new(NoHostLock))
    }

    /// Create a bridge whose long native calls can release the host lock.
    pub fn with_host_lock(vm: Arc<dyn Vm>, host_lock: Arc<dyn HostLock>) -> Self {
        Bridge {
            host_lock,
            registry: TypeRegistry::new(vm),
            catalog: ConversionCatalog::new(),
        }
    }

    /// The type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The conversion catalog.
    pub fn catalog(&self) -> &ConversionCatalog {
        &self.catalog
    }

    fn ctx(&self) -> DispatchCtx<'_> {
        DispatchCtx {
            registry: &self.registry,
            catalog: &self.catalog,
        }
    }

    /// Resolve a class by qualified name, mirroring it on first reference.
    pub fn resolve_type(&self, name: &str) -> Result<Arc<ClassDescriptor>> {
        self.registry.resolve(name)
    }

    /// Instance method group for `name`, merged through the superclass chain.
    pub fn lookup_methods(&self, class: &ClassDescriptor, name: &str) -> Result<MethodGroup> {
        self.registry.lookup_methods(class, name)
    }

    /// Best conversion from a host value to a target class.
    pub fn best_conversion(&self, value: &Value, target: &ClassDescriptor) -> Conversion {
        self.catalog.best_conversion(
            value,
            target,
            &ProbeCtx {
                registry: &self.registry,
            },
        )
    }

    /// Resolve a call against a method group without invoking it.
    pub fn resolve_overload(
        &self,
        group: &MethodGroup,
        args: &[Value],
    ) -> Result<CandidateMatch> {
        resolve_overload(group, args, &self.ctx())
    }

    /// Invoke an instance method with ranked overload resolution.
    pub fn call(&self, obj: &ObjectRef, name: &str, args: &[Value]) -> Result<Value> {
        self.call_with(obj, name, args, CallOptions::default())
    }

    /// [`Bridge::call`] with per-call options.
    pub fn call_with(
        &self,
        obj: &ObjectRef,
        name: &str,
        args: &[Value],
        options: CallOptions,
    ) -> Result<Value> {
        let class = self
            .registry
            .get(obj.class)
            .ok_or_else(|| BridgeError::not_found(format!("class of {}", obj.class)))?;
        let group = self.registry.lookup_methods(&class, name)?;
        let ctx = self.ctx();
        let candidate = resolve_overload(&group, args, &ctx)?;
        marshal_and_invoke(
            &candidate,
            args,
            CallTarget::Instance(obj),
            &ctx,
            self.host_lock.as_ref(),
            options,
        )
    }

    /// Invoke a static method on its exact declaring class.
    pub fn call_static(&self, class_name: &str, name: &str, args: &[Value]) -> Result<Value> {
        self.call_static_with(class_name, name, args, CallOptions::default())
    }

    /// [`Bridge::call_static`] with per-call options.
    pub fn call_static_with(
        &self,
        class_name: &str,
        name: &str,
        args: &[Value],
        options: CallOptions,
    ) -> Result<Value> {
        let class = self.registry.resolve(class_name)?;
        let group = self.registry.lookup_static_methods(&class, name)?;
        let ctx = self.ctx();
        let candidate = resolve_overload(&group, args, &ctx)?;
        marshal_and_invoke(
            &candidate,
            args,
            CallTarget::Static(&class),
            &ctx,
            self.host_lock.as_ref(),
            options,
        )
    }

    /// Construct an instance, resolving among the declared constructors.
    pub fn construct(&self, class_name: &str, args: &[Value]) -> Result<Value> {
        self.construct_with(class_name, args, CallOptions::default())
    }

    /// [`Bridge::construct`] with per-call options.
    pub fn construct_with(
        &self,
        class_name: &str,
        args: &[Value],
        options: CallOptions,
    ) -> Result<Value> {
        let class = self.registry.resolve(class_name)?;
        let group = class.constructors();
        let ctx = self.ctx();
        let candidate = resolve_overload(&group, args, &ctx)?;
        marshal_and_invoke(
            &candidate,
            args,
            CallTarget::Constructor(&class),
            &ctx,
            self.host_lock.as_ref(),
            options,
        )
    }

    /// Read an instance field (inherited fields are visible).
    pub fn get_field(&self, obj: &ObjectRef, name: &str) -> Result<Value> {
        let class = self
            .registry
            .get(obj.class)
            .ok_or_else(|| BridgeError::not_found(format!("class of {}", obj.class)))?;
        let field = self.registry.lookup_field(&class, name)?;
        marshal::read_field(obj, &field, &self.ctx())
    }

    /// Write an instance field, converting through the catalog.
    pub fn set_field(&self, obj: &ObjectRef, name: &str, value: &Value) -> Result<()> {
        let class = self
            .registry
            .get(obj.class)
            .ok_or_else(|| BridgeError::not_found(format!("class of {}", obj.class)))?;
        let field = self.registry.lookup_field(&class, name)?;
        marshal::write_field(obj, &field, value, &self.ctx())
    }

    /// Read a static field on its exact declaring class.
    pub fn get_static_field(&self, class_name: &str, name: &str) -> Result<Value> {
        let class = self.registry.resolve(class_name)?;
        let field = self.registry.lookup_static_field(&class, name)?;
        marshal::read_static_field(&field, &self.ctx())
    }

    /// Write a static field on its exact declaring class.
    pub fn set_static_field(&self, class_name: &str, name: &str, value: &Value) -> Result<()> {
        let class = self.registry.resolve(class_name)?;
        let field = self.registry.lookup_static_field(&class, name)?;
        marshal::write_static_field(&field, value, &self.ctx())
    }

    /// Unwrap a boxed primitive; a non-box passes through unchanged.
    pub fn unbox(&self, obj: &ObjectRef) -> Result<Value> {
        marshal::unbox(obj, &self.ctx())
    }

    /// Register a custom conversion rule. Safe at any time: probe decisions
    /// are never cached, so the rule applies to every later resolution.
    pub fn register_rule(
        &self,
        source: SourceFilter,
        target: TargetFilter,
        probe: impl Fn(&Value, &ClassDescriptor) -> Option<(Quality, Arc<CustomConvertFn>)>
        + Send
        + Sync
        + 'static,
    ) {
        self.catalog.register_rule(source, target, probe);
    }

    /// Tear down the registry before runtime shutdown: break descriptor
    /// links and release every class handle. Further bridge operations fail
    /// with [`BridgeError::ShutDown`].
    pub fn shutdown(&self) {
        self.registry.shutdown();
    }
}
