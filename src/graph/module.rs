//! The module graph: the in-memory object model a caller builds up and hands to
//! [crate::metadata::build] to assemble into table rows and heap blobs.
//!
//! Nodes are `Rc`-shared so the same `Rc<TypeRef>` (for example) can be pointed at from many
//! places without cloning data; back-references (a `Field`'s owning `TypeDef`) use `Weak` to avoid
//! reference cycles. Collections that grow as the graph is built (a type's fields, a module's
//! types) are `RefCell<Vec<_>>`.

use crate::graph::reference::{
  ImplementationEntity, MemberRefParentEntity, MethodDefOrRefEntity, ResolutionScopeEntity,
  TypeDefOrRefEntity, TypeOrMethodDefEntity,
};
use crate::graph::signature::{FieldSig, MethodSig, PropertySig, TypeSig};
use crate::metadata::streams::tables::flags::{
  AssemblyFlags, AssemblyHashAlgorithm, ElementType, EventAttributes, FieldAttributes,
  FileAttributes, GenericParamAttributes, ManifestResourceAttributes, MethodAttributes,
  MethodImplAttributes, ParamAttributes, PropertyAttributes, TypeAttributes,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// The root of a module graph: one managed module, its type system, and everything it references.
#[derive(Debug, Default)]
pub struct Module {
  pub name: std::string::String,
  pub mvid: [u8; 16],
  /// The `Module` row's RID in a source module this graph was loaded from, consulted only by
  /// [crate::metadata::build::preserving].
  pub original_rid: Cell<Option<u32>>,
  pub assembly: RefCell<Option<Rc<Assembly>>>,
  pub type_defs: RefCell<std::vec::Vec<Rc<TypeDef>>>,
  pub type_refs: RefCell<std::vec::Vec<Rc<TypeRef>>>,
  pub module_refs: RefCell<std::vec::Vec<Rc<ModuleRef>>>,
  pub assembly_refs: RefCell<std::vec::Vec<Rc<AssemblyRef>>>,
  pub member_refs: RefCell<std::vec::Vec<Rc<MemberRef>>>,
  pub stand_alone_sigs: RefCell<std::vec::Vec<Rc<StandAloneSig>>>,
  pub type_specs: RefCell<std::vec::Vec<Rc<TypeSpec>>>,
  pub method_specs: RefCell<std::vec::Vec<Rc<MethodSpec>>>,
  pub files: RefCell<std::vec::Vec<Rc<FileDef>>>,
  pub exported_types: RefCell<std::vec::Vec<Rc<ExportedType>>>,
  pub resources: RefCell<std::vec::Vec<Rc<ManifestResource>>>,
}

/// A `.assembly` declaration (ECMA-335 §II.22.2); at most one per module.
#[derive(Debug, Default)]
pub struct Assembly {
  pub name: std::string::String,
  pub culture: std::string::String,
  pub major_version: u16,
  pub minor_version: u16,
  pub build_number: u16,
  pub revision_number: u16,
  pub flags: AssemblyFlags,
  pub hash_algorithm: AssemblyHashAlgorithm,
  pub public_key: std::vec::Vec<u8>,
  pub custom_attributes: RefCell<std::vec::Vec<CustomAttribute>>,
  pub security: RefCell<std::vec::Vec<DeclSecurity>>,
}

/// A type defined in this module (ECMA-335 §II.22.37).
#[derive(Debug, Default)]
pub struct TypeDef {
  pub name: std::string::String,
  pub namespace: std::string::String,
  pub flags: TypeAttributes,
  /// This type's `TypeDef` RID in a source module, consulted only by
  /// [crate::metadata::build::preserving].
  pub original_rid: Cell<Option<u32>>,
  pub extends: RefCell<Option<TypeDefOrRefEntity>>,
  pub enclosing_class: RefCell<Option<Weak<TypeDef>>>,
  pub fields: RefCell<std::vec::Vec<Rc<Field>>>,
  pub methods: RefCell<std::vec::Vec<Rc<Method>>>,
  pub interface_impls: RefCell<std::vec::Vec<Rc<InterfaceImpl>>>,
  pub generic_params: RefCell<std::vec::Vec<Rc<GenericParam>>>,
  pub events: RefCell<std::vec::Vec<Rc<Event>>>,
  pub properties: RefCell<std::vec::Vec<Rc<Property>>>,
  pub custom_attributes: RefCell<std::vec::Vec<CustomAttribute>>,
  pub security: RefCell<std::vec::Vec<DeclSecurity>>,
  /// Explicit/sequential layout size and packing; `None` means auto layout.
  pub class_layout: RefCell<Option<ClassLayout>>,
}

/// `ClassLayout` (ECMA-335 §II.22.8), attached to a [TypeDef] with explicit or sequential layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassLayout {
  pub packing_size: u16,
  pub class_size: u32,
}

/// One row of `InterfaceImpl` (ECMA-335 §II.22.23): `class` implements `interface`.
#[derive(Debug)]
pub struct InterfaceImpl {
  pub class: Weak<TypeDef>,
  pub interface: TypeDefOrRefEntity,
  pub custom_attributes: RefCell<std::vec::Vec<CustomAttribute>>,
}

/// A field defined on a [TypeDef] (ECMA-335 §II.22.15).
#[derive(Debug)]
pub struct Field {
  pub name: std::string::String,
  pub flags: FieldAttributes,
  pub signature: FieldSig,
  pub declaring_type: Weak<TypeDef>,
  /// This field's `Field` RID in a source module, consulted only by
  /// [crate::metadata::build::preserving].
  pub original_rid: Cell<Option<u32>>,
  pub constant: RefCell<Option<Constant>>,
  pub marshal: RefCell<Option<std::vec::Vec<u8>>>,
  pub rva: RefCell<Option<u32>>,
  pub layout_offset: RefCell<Option<u32>>,
  pub custom_attributes: RefCell<std::vec::Vec<CustomAttribute>>,
}

/// A method defined on a [TypeDef] (ECMA-335 §II.22.26).
#[derive(Debug)]
pub struct Method {
  pub name: std::string::String,
  pub flags: MethodAttributes,
  pub impl_flags: MethodImplAttributes,
  pub signature: MethodSig,
  pub declaring_type: Weak<TypeDef>,
  /// This method's `MethodDef` RID in a source module, consulted only by
  /// [crate::metadata::build::preserving].
  pub original_rid: Cell<Option<u32>>,
  pub params: RefCell<std::vec::Vec<Rc<Param>>>,
  pub generic_params: RefCell<std::vec::Vec<Rc<GenericParam>>>,
  /// The method's IL body offset once laid out by the caller, or `None` for `abstract`/`pinvoke`
  /// methods with no body. This crate does not assemble IL bodies; it only records the RVA a
  /// caller already computed.
  pub rva: RefCell<Option<u32>>,
  pub pinvoke: RefCell<Option<PInvokeMap>>,
  pub overrides: RefCell<std::vec::Vec<MethodDefOrRefEntity>>,
  pub custom_attributes: RefCell<std::vec::Vec<CustomAttribute>>,
  pub security: RefCell<std::vec::Vec<DeclSecurity>>,
}

/// `ImplMap` (ECMA-335 §II.22.22): a PInvoke mapping for a method or forwarded field.
#[derive(Debug, Clone)]
pub struct PInvokeMap {
  pub flags: crate::metadata::streams::tables::flags::PInvokeAttributes,
  pub import_name: std::string::String,
  pub import_scope: Rc<ModuleRef>,
}

/// A parameter of a [Method] (ECMA-335 §II.22.33), including the implicit return-value slot at
/// sequence `0`.
#[derive(Debug)]
pub struct Param {
  pub name: std::string::String,
  pub sequence: u16,
  pub flags: ParamAttributes,
  /// This parameter's `Param` RID in a source module, consulted only by
  /// [crate::metadata::build::preserving].
  pub original_rid: Cell<Option<u32>>,
  pub constant: RefCell<Option<Constant>>,
  pub marshal: RefCell<Option<std::vec::Vec<u8>>>,
  pub custom_attributes: RefCell<std::vec::Vec<CustomAttribute>>,
}

/// An event defined on a [TypeDef] (ECMA-335 §II.22.13).
#[derive(Debug)]
pub struct Event {
  pub name: std::string::String,
  pub flags: EventAttributes,
  pub event_type: TypeDefOrRefEntity,
  /// This event's `Event` RID in a source module, consulted only by
  /// [crate::metadata::build::preserving].
  pub original_rid: Cell<Option<u32>>,
  pub add_method: RefCell<Option<Rc<Method>>>,
  pub remove_method: RefCell<Option<Rc<Method>>>,
  pub fire_method: RefCell<Option<Rc<Method>>>,
  pub other_methods: RefCell<std::vec::Vec<Rc<Method>>>,
  pub custom_attributes: RefCell<std::vec::Vec<CustomAttribute>>,
}

/// A property defined on a [TypeDef] (ECMA-335 §II.22.34).
#[derive(Debug)]
pub struct Property {
  pub name: std::string::String,
  pub flags: PropertyAttributes,
  pub signature: PropertySig,
  /// This property's `Property` RID in a source module, consulted only by
  /// [crate::metadata::build::preserving].
  pub original_rid: Cell<Option<u32>>,
  pub constant: RefCell<Option<Constant>>,
  pub getter: RefCell<Option<Rc<Method>>>,
  pub setter: RefCell<Option<Rc<Method>>>,
  pub other_methods: RefCell<std::vec::Vec<Rc<Method>>>,
  pub custom_attributes: RefCell<std::vec::Vec<CustomAttribute>>,
}

/// A generic parameter on a [TypeDef] or [Method] (ECMA-335 §II.22.20).
#[derive(Debug)]
pub struct GenericParam {
  pub name: std::string::String,
  pub number: u16,
  pub flags: GenericParamAttributes,
  pub owner: TypeOrMethodDefEntity,
  pub constraints: RefCell<std::vec::Vec<TypeDefOrRefEntity>>,
  pub custom_attributes: RefCell<std::vec::Vec<CustomAttribute>>,
}

/// A reference to a type defined outside this module (ECMA-335 §II.22.38).
#[derive(Debug)]
pub struct TypeRef {
  pub name: std::string::String,
  pub namespace: std::string::String,
  pub resolution_scope: RefCell<Option<ResolutionScopeEntity>>,
}

/// A reference to a member (field or method) of a type outside this module (ECMA-335 §II.22.25).
#[derive(Debug)]
pub struct MemberRef {
  pub name: std::string::String,
  pub parent: MemberRefParentEntity,
  pub signature: MemberRefSig,
}

/// The two shapes a `MemberRef` signature can take.
#[derive(Debug, Clone)]
pub enum MemberRefSig {
  Field(FieldSig),
  Method(MethodSig),
}

/// A reference to another module in the same assembly (ECMA-335 §II.22.31).
#[derive(Debug)]
pub struct ModuleRef {
  pub name: std::string::String,
}

/// A reference to an external assembly (ECMA-335 §II.22.5).
#[derive(Debug, Default)]
pub struct AssemblyRef {
  pub name: std::string::String,
  pub culture: std::string::String,
  pub major_version: u16,
  pub minor_version: u16,
  pub build_number: u16,
  pub revision_number: u16,
  pub flags: AssemblyFlags,
  pub public_key_or_token: std::vec::Vec<u8>,
  pub hash_value: std::vec::Vec<u8>,
}

/// A signature with no owning row of its own, referenced by RVA-less metadata tokens such as
/// `ldtoken` or `calli` sites (ECMA-335 §II.22.36).
#[derive(Debug)]
pub struct StandAloneSig {
  pub signature: MethodSig,
}

/// A constructed generic type, referenced where a bare `TypeDef`/`TypeRef` can't express
/// instantiation (ECMA-335 §II.22.39).
#[derive(Debug)]
pub struct TypeSpec {
  pub signature: TypeSig,
}

/// A constructed generic method (ECMA-335 §II.22.29).
#[derive(Debug)]
pub struct MethodSpec {
  pub method: MethodDefOrRefEntity,
  pub generic_args: std::vec::Vec<TypeSig>,
}

/// A file this module's assembly manifest references (ECMA-335 §II.22.19).
#[derive(Debug)]
pub struct FileDef {
  pub name: std::string::String,
  pub flags: FileAttributes,
  pub hash_value: std::vec::Vec<u8>,
}

/// A type exported from this assembly but defined in another module of the same assembly, or
/// forwarded to another assembly entirely (ECMA-335 §II.22.14).
#[derive(Debug)]
pub struct ExportedType {
  pub name: std::string::String,
  pub namespace: std::string::String,
  pub flags: TypeAttributes,
  /// The `TypeDef` row id this type has in the module it's actually defined in. Not verifiable
  /// against anything in this graph when the implementation lives in a different module; callers
  /// are responsible for supplying the right value.
  pub type_def_id: u32,
  pub implementation: ImplementationEntity,
}

/// An embedded or linked resource (ECMA-335 §II.22.24).
#[derive(Debug)]
pub struct ManifestResource {
  pub name: std::string::String,
  pub flags: ManifestResourceAttributes,
  pub data: ResourceData,
}

/// Where a [ManifestResource]'s bytes actually live.
#[derive(Debug)]
pub enum ResourceData {
  /// Embedded in this module's `#Resources` section at the given byte offset, set by
  /// [crate::metadata::build::resource].
  Embedded(std::vec::Vec<u8>),
  /// Defined in another file of this assembly.
  File(Rc<FileDef>),
  /// Defined in another assembly entirely.
  AssemblyRef(Rc<AssemblyRef>),
}

/// A custom attribute attached to some entity in the graph (ECMA-335 §II.22.10).
#[derive(Debug, Clone)]
pub struct CustomAttribute {
  pub constructor: crate::graph::reference::CustomAttributeTypeEntity,
  pub value: std::vec::Vec<u8>,
}

/// A declarative security permission set attached to a [TypeDef], [Method], or [Assembly]
/// (ECMA-335 §II.22.11).
#[derive(Debug, Clone)]
pub struct DeclSecurity {
  pub action: u16,
  pub permission_set: std::vec::Vec<u8>,
}

/// A literal default value attached to a [Field], [Param], or [Property] (ECMA-335 §II.22.9).
///
/// `declared_type` is the `Constant.Type` column as the graph states it. It usually agrees with
/// `value`'s own discriminant, but nothing enforces that (a caller can, for instance, declare
/// `ElementType::I4` while handing over a [ConstantValue::Boolean]); [crate::metadata::build::constant]
/// surfaces a non-fatal warning when the two diverge.
#[derive(Debug, Clone)]
pub struct Constant {
  pub declared_type: ElementType,
  pub value: ConstantValue,
}

/// A literal default value, stored pre-encoded the way `Constant.Value` wants it (ECMA-335
/// §II.23.1.16).
#[derive(Debug, Clone)]
pub enum ConstantValue {
  Boolean(bool),
  Char(u16),
  I1(i8),
  U1(u8),
  I2(i16),
  U2(u16),
  I4(i32),
  U4(u32),
  I8(i64),
  U8(u64),
  R4(f32),
  R8(f64),
  String(std::string::String),
  /// The only legal default for a reference type: a null reference.
  Null,
}
