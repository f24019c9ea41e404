//! Narrow coded-reference enums.
//!
//! ECMA-335 packs a handful of distinct "this row refers to a row in one of N tables" columns
//! into bit-packed coded tokens (ECMA-335 §II.24.2.6). [crate::metadata::streams::tables::id]
//! mirrors that with one Rust enum per coded-token *kind*, each variant holding a `RowId` into the
//! physical table it names. These `*Entity` enums are the pre-build counterpart: the module graph
//! holds `Rc`s to the actual graph nodes a reference points at, and the token service
//! ([crate::metadata::build::token]) resolves each variant to the coded id once the node has been
//! assigned a RID.

use crate::graph::module::{
  Assembly, AssemblyRef, Event, Field, FileDef, Method, MethodSpec, Module, ModuleRef, Param,
  Property, StandAloneSig, TypeDef, TypeRef, TypeSpec,
};
use std::rc::Rc;

/// `TypeDefOrRef` (ECMA-335 §II.24.2.6): a type reference naming a `TypeDef`, `TypeRef`, or
/// `TypeSpec`.
#[derive(Debug, Clone)]
pub enum TypeDefOrRefEntity {
  TypeDef(Rc<TypeDef>),
  TypeRef(Rc<TypeRef>),
  TypeSpec(Rc<TypeSpec>),
}

/// `HasConstant`: the row a `Constant` table entry attaches a default value to.
#[derive(Debug, Clone)]
pub enum HasConstantEntity {
  Field(Rc<Field>),
  Param(Rc<Param>),
  Property(Rc<Property>),
}

/// `HasFieldMarshal`: the row a marshalling descriptor attaches to.
#[derive(Debug, Clone)]
pub enum HasFieldMarshalEntity {
  Field(Rc<Field>),
  Param(Rc<Param>),
}

/// `HasDeclSecurity`: the row a declarative security set attaches to.
#[derive(Debug, Clone)]
pub enum HasDeclSecurityEntity {
  TypeDef(Rc<TypeDef>),
  Method(Rc<Method>),
  Assembly(Rc<Assembly>),
}

/// `MemberRefParent`: the owner of a referenced member.
#[derive(Debug, Clone)]
pub enum MemberRefParentEntity {
  TypeDef(Rc<TypeDef>),
  TypeRef(Rc<TypeRef>),
  ModuleRef(Rc<ModuleRef>),
  Method(Rc<Method>),
  TypeSpec(Rc<TypeSpec>),
}

/// `HasSemantics`: the event or property a method-semantics wiring is attached to.
#[derive(Debug, Clone)]
pub enum HasSemanticsEntity {
  Event(Rc<Event>),
  Property(Rc<Property>),
}

/// `MethodDefOrRef`: a callable named either locally (`MethodDef`) or externally (`MemberRef`).
#[derive(Debug, Clone)]
pub enum MethodDefOrRefEntity {
  Method(Rc<Method>),
  MemberRef(Rc<crate::graph::module::MemberRef>),
}

/// `MemberForwarded`: the field or method a PInvoke mapping is declared for.
#[derive(Debug, Clone)]
pub enum MemberForwardedEntity {
  Field(Rc<Field>),
  Method(Rc<Method>),
}

/// `Implementation`: the file, external assembly, or forwarded type backing something.
#[derive(Debug, Clone)]
pub enum ImplementationEntity {
  File(Rc<FileDef>),
  AssemblyRef(Rc<AssemblyRef>),
  ExportedType(Rc<crate::graph::module::ExportedType>),
}

/// `CustomAttributeType`: the constructor a custom attribute blob was built with.
#[derive(Debug, Clone)]
pub enum CustomAttributeTypeEntity {
  Method(Rc<Method>),
  MemberRef(Rc<crate::graph::module::MemberRef>),
}

/// `ResolutionScope`: where a `TypeRef` should be resolved from.
#[derive(Debug, Clone)]
pub enum ResolutionScopeEntity {
  Module(Rc<Module>),
  ModuleRef(Rc<ModuleRef>),
  AssemblyRef(Rc<AssemblyRef>),
  TypeRef(Rc<TypeRef>),
}

/// `TypeOrMethodDef`: the owner of a generic parameter.
#[derive(Debug, Clone)]
pub enum TypeOrMethodDefEntity {
  TypeDef(Rc<TypeDef>),
  Method(Rc<Method>),
}

/// `HasCustomAttribute`: any of the 22 table kinds a custom attribute can be attached to.
///
/// Also reused, per [crate::metadata::build::token], as the argument type for token resolution in
/// general: every primary entity in the graph is one of these variants, so `TokenService::get_token`
/// can be generic over "any referenceable row" without a second, near-identical enum.
#[derive(Debug, Clone)]
pub enum HasCustomAttributeEntity {
  Method(Rc<Method>),
  Field(Rc<Field>),
  TypeRef(Rc<TypeRef>),
  TypeDef(Rc<TypeDef>),
  Param(Rc<Param>),
  InterfaceImpl(Rc<crate::graph::module::InterfaceImpl>),
  MemberRef(Rc<crate::graph::module::MemberRef>),
  Module(Rc<Module>),
  DeclSecurity(HasDeclSecurityEntity),
  Property(Rc<Property>),
  Event(Rc<Event>),
  StandAloneSig(Rc<StandAloneSig>),
  ModuleRef(Rc<ModuleRef>),
  TypeSpec(Rc<TypeSpec>),
  Assembly(Rc<Assembly>),
  AssemblyRef(Rc<AssemblyRef>),
  File(Rc<FileDef>),
  ExportedType(Rc<crate::graph::module::ExportedType>),
  ManifestResource(Rc<crate::graph::module::ManifestResource>),
  GenericParam(Rc<crate::graph::module::GenericParam>),
  MethodSpec(Rc<MethodSpec>),
  /// A reference the token service cannot resolve to a real row; callers asking for its token get
  /// back the ECMA "nil" sentinel token `0xFF00FFFF` instead of a build failure.
  Unsupported,
}
