//! Fluent registration of classes and records.

use morph_ir::{EvalResult, HostFn, TypeId, Value};

use crate::entry::{ClassDef, GenericInstance, TypeKind};
use crate::member::{AccessModifier, Annotation, ConstructorModel, MemberModel, MethodModel};
use crate::registry::{RegistryError, TypeRegistry};

/// Builder returned by [`TypeRegistry::class`].
///
/// ```ignore
/// let person = registry
///     .class("Person")
///     .property("Name", TypeId::STR)
///     .readonly("Age", TypeId::INT)
///     .register()?;
/// ```
#[must_use = "call `register` to add the type"]
pub struct ClassBuilder<'r> {
    registry: &'r mut TypeRegistry,
    name: String,
    base: Option<TypeId>,
    interfaces: Vec<TypeId>,
    generic: Option<GenericInstance>,
    annotations: Vec<Annotation>,
    def: ClassDef,
}

impl<'r> ClassBuilder<'r> {
    pub(crate) fn new(registry: &'r mut TypeRegistry, name: &str) -> Self {
        ClassBuilder {
            registry,
            name: name.to_owned(),
            base: None,
            interfaces: Vec::new(),
            generic: None,
            annotations: Vec::new(),
            def: ClassDef::default(),
        }
    }

    pub fn base(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    pub fn implements(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Mark as an instantiation of an open generic definition.
    pub fn generic(mut self, definition: TypeId, args: Vec<TypeId>) -> Self {
        self.generic = Some(GenericInstance { definition, args });
        self
    }

    /// Value types default to a zeroed instance rather than null.
    pub fn value_type(mut self) -> Self {
        self.def.value_type = true;
        self
    }

    pub fn member(mut self, member: MemberModel) -> Self {
        self.def.members.push(member);
        self
    }

    pub fn field(self, name: &str, ty: TypeId) -> Self {
        let name = self.registry.name(name);
        self.member(MemberModel::field(name, ty))
    }

    pub fn property(self, name: &str, ty: TypeId) -> Self {
        let name = self.registry.name(name);
        self.member(MemberModel::property(name, ty))
    }

    pub fn readonly(self, name: &str, ty: TypeId) -> Self {
        let name = self.registry.name(name);
        self.member(MemberModel::readonly(name, ty))
    }

    pub fn private_field(self, name: &str, ty: TypeId) -> Self {
        let name = self.registry.name(name);
        self.member(MemberModel::field(name, ty).with_access(AccessModifier::Private))
    }

    /// Attach an annotation to the most recently added member.
    pub fn annotate_member(mut self, annotation: Annotation) -> Self {
        if let Some(last) = self.def.members.last_mut() {
            last.annotations.push(annotation);
        }
        self
    }

    /// Attach an annotation to the type.
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Declare a constructor taking the given parameters.
    pub fn constructor(mut self, params: &[(&str, TypeId)]) -> Self {
        let params = params
            .iter()
            .map(|&(name, ty)| MemberModel::param(self.registry.name(name), ty))
            .collect();
        self.def.constructors.push(ConstructorModel { params });
        self
    }

    /// Declare an explicit parameterless constructor.
    pub fn default_constructor(mut self) -> Self {
        self.def.constructors.push(ConstructorModel::default());
        self
    }

    /// Declare a zero-argument method. `func` receives the receiver as its
    /// only argument.
    pub fn method(
        mut self,
        name: &str,
        returns: TypeId,
        func: impl Fn(&Value) -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        let label = format!("{}.{name}", self.name);
        let host = HostFn::new(label, returns, move |args: &[Value]| {
            match args.first() {
                Some(receiver) => func(receiver),
                None => func(&Value::Null),
            }
        });
        self.def.methods.push(MethodModel {
            name: self.registry.name(name),
            returns,
            func: host,
        });
        self
    }

    pub fn register(self) -> Result<TypeId, RegistryError> {
        self.registry.register_annotated(
            &self.name,
            TypeKind::Class(self.def),
            self.base,
            self.interfaces,
            self.generic,
            self.annotations,
        )
    }
}
