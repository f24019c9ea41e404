//! Resolves graph references to the coded ids and 4-byte metadata tokens tables actually store,
//! once every referenced node has been assigned a RID (ECMA-335 §II.22.2, §II.24.2.6).
//!
//! A [TokenService] is threaded through the whole walk in [crate::metadata::build::normal]: each
//! pass records the RID a node was just assigned, and later passes call back into it to encode the
//! coded ids their own rows need. Because the graph can describe references the build never ends
//! up emitting a row for (an attribute constructor pruned for some other reason, say), every
//! resolver degrades to the nil token rather than panicking; [crate::metadata::build::errors::Warning::DroppedCustomAttribute]
//! is how a caller finds out that happened.

use crate::graph::module::*;
use crate::graph::reference::*;
use crate::metadata::build::rid_registry::RidRegistry;
use crate::metadata::streams::tables::id::*;
use crate::metadata::streams::tables::rows::*;
use crate::metadata::streams::tables::table::Row;
use crate::metadata::streams::user_strings::UserStringsHeapBuilder;

/// The metadata token ECMA-335 uses to mean "no reference": the nil `TypeDefOrRef` (ECMA-335
/// §II.24.2.6), reused here as the sentinel for any unresolved token request.
pub const NIL_TOKEN: u32 = 0xFF00_FFFF;

/// The `#US` heap's pseudo-table tag (ECMA-335 §II.24.2.6): not a real metadata table, but tokens
/// naming a `ldstr` operand's `#US` offset use it the same way a real table's id is used.
const USER_STRING_TAG: u32 = 0x70;

/// What [TokenService::get_token] should resolve.
///
/// Mirrors [HasCustomAttribute]'s 22-table union for the entity case, and adds the one kind of
/// reference that union can't express: a string literal, which resolves by inserting into `#US`
/// rather than by looking up a row already written to some other table.
pub enum TokenRequest {
  /// Resolve to the entity's own 4-byte token, same as the old entity-only `get_token`.
  Entity(HasCustomAttributeEntity),
  /// Insert (or find) `s` in `#US` and resolve to its `(0x70, offset)` token.
  String(std::string::String),
  /// A host holds some other object kind outside both unions; resolves to [NIL_TOKEN].
  Unsupported,
}

/// Per-table-kind RID bookkeeping plus the reference resolvers built on top of it.
#[derive(Default)]
pub struct TokenService {
  pub module: RidRegistry<Module>,
  pub assembly: RidRegistry<Assembly>,
  pub type_defs: RidRegistry<TypeDef>,
  pub type_refs: RidRegistry<TypeRef>,
  pub type_specs: RidRegistry<TypeSpec>,
  pub fields: RidRegistry<Field>,
  pub methods: RidRegistry<Method>,
  pub params: RidRegistry<Param>,
  pub properties: RidRegistry<Property>,
  pub events: RidRegistry<Event>,
  pub member_refs: RidRegistry<MemberRef>,
  pub module_refs: RidRegistry<ModuleRef>,
  pub assembly_refs: RidRegistry<AssemblyRef>,
  pub files: RidRegistry<FileDef>,
  pub exported_types: RidRegistry<ExportedType>,
  pub stand_alone_sigs: RidRegistry<StandAloneSig>,
  pub generic_params: RidRegistry<GenericParam>,
  pub method_specs: RidRegistry<MethodSpec>,
  pub manifest_resources: RidRegistry<ManifestResource>,
  pub interface_impls: RidRegistry<InterfaceImpl>,
}

impl TokenService {
  pub fn type_def_or_ref(&self, entity: &TypeDefOrRefEntity) -> TypeDefOrRef {
    match entity {
      TypeDefOrRefEntity::TypeDef(n) => {
        TypeDefOrRef::TypeDef(RowId::from_rid(self.type_defs.try_get(n).unwrap_or(0)))
      }
      TypeDefOrRefEntity::TypeRef(n) => {
        TypeDefOrRef::TypeRef(RowId::from_rid(self.type_refs.try_get(n).unwrap_or(0)))
      }
      TypeDefOrRefEntity::TypeSpec(n) => {
        TypeDefOrRef::TypeSpec(RowId::from_rid(self.type_specs.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn has_constant(&self, entity: &HasConstantEntity) -> HasConstant {
    match entity {
      HasConstantEntity::Field(n) => {
        HasConstant::Field(RowId::from_rid(self.fields.try_get(n).unwrap_or(0)))
      }
      HasConstantEntity::Param(n) => {
        HasConstant::Param(RowId::from_rid(self.params.try_get(n).unwrap_or(0)))
      }
      HasConstantEntity::Property(n) => {
        HasConstant::Property(RowId::from_rid(self.properties.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn has_field_marshal(&self, entity: &HasFieldMarshalEntity) -> HasFieldMarshal {
    match entity {
      HasFieldMarshalEntity::Field(n) => {
        HasFieldMarshal::Field(RowId::from_rid(self.fields.try_get(n).unwrap_or(0)))
      }
      HasFieldMarshalEntity::Param(n) => {
        HasFieldMarshal::Param(RowId::from_rid(self.params.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn has_decl_security(&self, entity: &HasDeclSecurityEntity) -> HasDeclSecurity {
    match entity {
      HasDeclSecurityEntity::TypeDef(n) => {
        HasDeclSecurity::TypeDef(RowId::from_rid(self.type_defs.try_get(n).unwrap_or(0)))
      }
      HasDeclSecurityEntity::Method(n) => {
        HasDeclSecurity::MethodDef(RowId::from_rid(self.methods.try_get(n).unwrap_or(0)))
      }
      HasDeclSecurityEntity::Assembly(n) => {
        HasDeclSecurity::Assembly(RowId::from_rid(self.assembly.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn member_ref_parent(&self, entity: &MemberRefParentEntity) -> MemberRefParent {
    match entity {
      MemberRefParentEntity::TypeDef(n) => {
        MemberRefParent::TypeDef(RowId::from_rid(self.type_defs.try_get(n).unwrap_or(0)))
      }
      MemberRefParentEntity::TypeRef(n) => {
        MemberRefParent::TypeRef(RowId::from_rid(self.type_refs.try_get(n).unwrap_or(0)))
      }
      MemberRefParentEntity::ModuleRef(n) => {
        MemberRefParent::ModuleRef(RowId::from_rid(self.module_refs.try_get(n).unwrap_or(0)))
      }
      MemberRefParentEntity::Method(n) => {
        MemberRefParent::MethodDef(RowId::from_rid(self.methods.try_get(n).unwrap_or(0)))
      }
      MemberRefParentEntity::TypeSpec(n) => {
        MemberRefParent::TypeSpec(RowId::from_rid(self.type_specs.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn has_semantics(&self, entity: &HasSemanticsEntity) -> HasSemantics {
    match entity {
      HasSemanticsEntity::Event(n) => {
        HasSemantics::Event(RowId::from_rid(self.events.try_get(n).unwrap_or(0)))
      }
      HasSemanticsEntity::Property(n) => {
        HasSemantics::Property(RowId::from_rid(self.properties.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn method_def_or_ref(&self, entity: &MethodDefOrRefEntity) -> MethodDefOrRef {
    match entity {
      MethodDefOrRefEntity::Method(n) => {
        MethodDefOrRef::MethodDef(RowId::from_rid(self.methods.try_get(n).unwrap_or(0)))
      }
      MethodDefOrRefEntity::MemberRef(n) => {
        MethodDefOrRef::MemberRef(RowId::from_rid(self.member_refs.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn member_forwarded(&self, entity: &MemberForwardedEntity) -> MemberForwarded {
    match entity {
      MemberForwardedEntity::Field(n) => {
        MemberForwarded::Field(RowId::from_rid(self.fields.try_get(n).unwrap_or(0)))
      }
      MemberForwardedEntity::Method(n) => {
        MemberForwarded::MethodDef(RowId::from_rid(self.methods.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn implementation(&self, entity: &ImplementationEntity) -> Implementation {
    match entity {
      ImplementationEntity::File(n) => {
        Implementation::File(RowId::from_rid(self.files.try_get(n).unwrap_or(0)))
      }
      ImplementationEntity::AssemblyRef(n) => {
        Implementation::AssemblyRef(RowId::from_rid(self.assembly_refs.try_get(n).unwrap_or(0)))
      }
      ImplementationEntity::ExportedType(n) => {
        Implementation::ExportedType(RowId::from_rid(
          self.exported_types.try_get(n).unwrap_or(0),
        ))
      }
    }
  }

  pub fn custom_attribute_type(&self, entity: &CustomAttributeTypeEntity) -> CustomAttributeType {
    match entity {
      CustomAttributeTypeEntity::Method(n) => {
        CustomAttributeType::MethodDef(RowId::from_rid(self.methods.try_get(n).unwrap_or(0)))
      }
      CustomAttributeTypeEntity::MemberRef(n) => {
        CustomAttributeType::MemberRef(RowId::from_rid(self.member_refs.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn resolution_scope(&self, entity: &ResolutionScopeEntity) -> ResolutionScope {
    match entity {
      ResolutionScopeEntity::Module(n) => {
        ResolutionScope::Module(RowId::from_rid(self.module.try_get(n).unwrap_or(0)))
      }
      ResolutionScopeEntity::ModuleRef(n) => {
        ResolutionScope::ModuleRef(RowId::from_rid(self.module_refs.try_get(n).unwrap_or(0)))
      }
      ResolutionScopeEntity::AssemblyRef(n) => {
        ResolutionScope::AssemblyRef(RowId::from_rid(self.assembly_refs.try_get(n).unwrap_or(0)))
      }
      ResolutionScopeEntity::TypeRef(n) => {
        ResolutionScope::TypeRef(RowId::from_rid(self.type_refs.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn type_or_method_def(&self, entity: &TypeOrMethodDefEntity) -> TypeOrMethodDef {
    match entity {
      TypeOrMethodDefEntity::TypeDef(n) => {
        TypeOrMethodDef::TypeDef(RowId::from_rid(self.type_defs.try_get(n).unwrap_or(0)))
      }
      TypeOrMethodDefEntity::Method(n) => {
        TypeOrMethodDef::MethodDef(RowId::from_rid(self.methods.try_get(n).unwrap_or(0)))
      }
    }
  }

  pub fn has_custom_attribute(&self, entity: &HasCustomAttributeEntity) -> HasCustomAttribute {
    match entity {
      HasCustomAttributeEntity::Method(n) => {
        HasCustomAttribute::MethodDef(RowId::from_rid(self.methods.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::Field(n) => {
        HasCustomAttribute::Field(RowId::from_rid(self.fields.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::TypeRef(n) => {
        HasCustomAttribute::TypeRef(RowId::from_rid(self.type_refs.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::TypeDef(n) => {
        HasCustomAttribute::TypeDef(RowId::from_rid(self.type_defs.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::Param(n) => {
        HasCustomAttribute::Param(RowId::from_rid(self.params.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::InterfaceImpl(n) => HasCustomAttribute::InterfaceImpl(
        RowId::from_rid(self.interface_impls.try_get(n).unwrap_or(0)),
      ),
      HasCustomAttributeEntity::MemberRef(n) => {
        HasCustomAttribute::MemberRef(RowId::from_rid(self.member_refs.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::Module(n) => {
        HasCustomAttribute::Module(RowId::from_rid(self.module.try_get(n).unwrap_or(0)))
      }
      // Attaching a custom attribute to a DeclSecurity row itself isn't representable in the
      // graph (DeclSecurity has no identity of its own, just inline data on its owner), so this
      // always resolves to the nil row; `get_token` surfaces the same placeholder.
      HasCustomAttributeEntity::DeclSecurity(_) => HasCustomAttribute::DeclSecurity(RowId::new(0)),
      HasCustomAttributeEntity::Property(n) => {
        HasCustomAttribute::Property(RowId::from_rid(self.properties.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::Event(n) => {
        HasCustomAttribute::Event(RowId::from_rid(self.events.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::StandAloneSig(n) => HasCustomAttribute::StandAloneSig(
        RowId::from_rid(self.stand_alone_sigs.try_get(n).unwrap_or(0)),
      ),
      HasCustomAttributeEntity::ModuleRef(n) => {
        HasCustomAttribute::ModuleRef(RowId::from_rid(self.module_refs.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::TypeSpec(n) => {
        HasCustomAttribute::TypeSpec(RowId::from_rid(self.type_specs.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::Assembly(n) => {
        HasCustomAttribute::Assembly(RowId::from_rid(self.assembly.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::AssemblyRef(n) => HasCustomAttribute::AssemblyRef(RowId::from_rid(
        self.assembly_refs.try_get(n).unwrap_or(0),
      )),
      HasCustomAttributeEntity::File(n) => {
        HasCustomAttribute::File(RowId::from_rid(self.files.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::ExportedType(n) => HasCustomAttribute::ExportedType(
        RowId::from_rid(self.exported_types.try_get(n).unwrap_or(0)),
      ),
      HasCustomAttributeEntity::ManifestResource(n) => HasCustomAttribute::ManifestResource(
        RowId::from_rid(self.manifest_resources.try_get(n).unwrap_or(0)),
      ),
      HasCustomAttributeEntity::GenericParam(n) => HasCustomAttribute::GenericParam(
        RowId::from_rid(self.generic_params.try_get(n).unwrap_or(0)),
      ),
      HasCustomAttributeEntity::MethodSpec(n) => {
        HasCustomAttribute::MethodSpec(RowId::from_rid(self.method_specs.try_get(n).unwrap_or(0)))
      }
      HasCustomAttributeEntity::Unsupported => HasCustomAttribute::MethodDef(RowId::new(0)),
    }
  }

  /// Resolves `request` to its plain 4-byte metadata token.
  ///
  /// An entity resolves to `table << 24 | rid`, falling back to [NIL_TOKEN] for anything this
  /// build never assigned a row; a string is inserted into `user_strings` (deduplicated the same
  /// as any other `#US` entry) and resolves to `0x70 << 24 | offset`.
  pub fn get_token(&self, request: TokenRequest, user_strings: &mut UserStringsHeapBuilder) -> u32 {
    match request {
      TokenRequest::Entity(entity) => self.token_for_entity(&entity),
      TokenRequest::String(s) => USER_STRING_TAG << 24 | user_strings.add(&s).offset(),
      TokenRequest::Unsupported => NIL_TOKEN,
    }
  }

  fn token_for_entity(&self, entity: &HasCustomAttributeEntity) -> u32 {
    macro_rules! token {
      ($table:ty, $rid:expr) => {
        match $rid {
          0 => NIL_TOKEN,
          rid => (<$table>::ID as u32) << 24 | rid,
        }
      };
    }

    match entity {
      HasCustomAttributeEntity::Method(n) => {
        token!(MethodDefRow, self.methods.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::Field(n) => token!(FieldRow, self.fields.try_get(n).unwrap_or(0)),
      HasCustomAttributeEntity::TypeRef(n) => {
        token!(TypeRefRow, self.type_refs.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::TypeDef(n) => {
        token!(TypeDefRow, self.type_defs.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::Param(n) => token!(ParamRow, self.params.try_get(n).unwrap_or(0)),
      HasCustomAttributeEntity::InterfaceImpl(n) => {
        token!(InterfaceImplRow, self.interface_impls.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::MemberRef(n) => {
        token!(MemberRefRow, self.member_refs.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::Module(n) => token!(ModuleRow, self.module.try_get(n).unwrap_or(0)),
      HasCustomAttributeEntity::DeclSecurity(_) => NIL_TOKEN,
      HasCustomAttributeEntity::Property(n) => {
        token!(PropertyRow, self.properties.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::Event(n) => token!(EventRow, self.events.try_get(n).unwrap_or(0)),
      HasCustomAttributeEntity::StandAloneSig(n) => token!(
        StandAloneSigRow,
        self.stand_alone_sigs.try_get(n).unwrap_or(0)
      ),
      HasCustomAttributeEntity::ModuleRef(n) => {
        token!(ModuleRefRow, self.module_refs.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::TypeSpec(n) => {
        token!(TypeSpecRow, self.type_specs.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::Assembly(n) => {
        token!(AssemblyRow, self.assembly.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::AssemblyRef(n) => {
        token!(AssemblyRefRow, self.assembly_refs.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::File(n) => token!(FileRow, self.files.try_get(n).unwrap_or(0)),
      HasCustomAttributeEntity::ExportedType(n) => {
        token!(ExportedTypeRow, self.exported_types.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::ManifestResource(n) => token!(
        ManifestResourceRow,
        self.manifest_resources.try_get(n).unwrap_or(0)
      ),
      HasCustomAttributeEntity::GenericParam(n) => {
        token!(GenericParamRow, self.generic_params.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::MethodSpec(n) => {
        token!(MethodSpecRow, self.method_specs.try_get(n).unwrap_or(0))
      }
      HasCustomAttributeEntity::Unsupported => NIL_TOKEN,
    }
  }
}
