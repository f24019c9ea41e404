//! Walks a module graph and emits a brand new set of metadata tables and heaps, assigning every
//! row the next sequential RID in its table (ECMA-335 §II.22).
//!
//! [crate::metadata::build::preserving::PreservingTablesBuilder] reuses this same walk; the only
//! difference between a normal and a preserving build is whether a node's `original_rid` hint is
//! honored when its row is pushed (see [push_hinted]). A normal build never looks at the hint, so
//! every row lands wherever the walk would have put it anyway.
//!
//! Reference tables a builder can't know the full extent of up front (`TypeRef`, `TypeSpec`,
//! `MemberRef`, `MethodSpec`, `StandAloneSig`, `ExportedType`) are materialized lazily, the first
//! time something resolves a reference to them, via the matching [super::rid_registry::RidRegistry].
//! `TypeDef` RIDs are the one exception: since a type's final RID is fully determined by its
//! position in [sorted_types] alone, every `TypeDef` is pre-registered before any row is written,
//! so a signature built while walking type `N` can freely reference type `N + 1`. No such
//! pre-registration is done for fields, methods, params, events, properties, or generic
//! parameters; a reference to one of these that hasn't been emitted yet resolves to the nil coded
//! id, the same degradation [crate::metadata::build::token] uses for unresolvable custom attribute
//! constructors.

use crate::graph::module::*;
use crate::graph::reference::*;
use crate::metadata::build::constant;
use crate::metadata::build::errors::{BuildError, Warning};
use crate::metadata::build::resource::{offset_for, ResourceSectionBuilder, ResourceSink};
use crate::metadata::build::token::TokenService;
use crate::metadata::streams::blobs::{BlobId, BlobsHeapBuilder};
use crate::metadata::streams::guids::GuidId;
use crate::metadata::streams::guids::GuidsHeapBuilder;
use crate::metadata::streams::strings::{StringId, StringsHeapBuilder};
use crate::metadata::streams::tables::flags::*;
use crate::metadata::streams::tables::id::*;
use crate::metadata::streams::tables::rows::*;
use crate::metadata::streams::tables::signatures::{
  encode_field_sig, encode_method_sig, encode_property_sig, encode_type,
};
use crate::metadata::streams::tables::TablesStoreSet;
use crate::metadata::streams::user_strings::UserStringsHeapBuilder;
use std::collections::HashMap;
use std::rc::Rc;
use std::vec::Vec;

/// Finished output of a build: populated tables and heaps, plus anything worth telling the
/// caller about.
pub struct BuiltTables {
  pub tables: TablesStoreSet,
  pub strings: StringsHeapBuilder,
  pub user_strings: UserStringsHeapBuilder,
  pub guids: GuidsHeapBuilder,
  pub blobs: BlobsHeapBuilder,
  pub resources: Vec<u8>,
  pub tokens: TokenService,
  pub warnings: Vec<Warning>,
}

/// Pushes `row` into `store`, honoring `hint` when [crate::metadata::build::preserving] supplies
/// one.
///
/// When `hint` is `None` (always true for [NormalTablesBuilder]) this is just `store.push(row)`.
/// When `hint` names a target RID past the table's current length, `zero` is used to fill the gap
/// with placeholder rows first; if the table has already grown past the target (the preserved
/// module had fewer rows in this slot than this build does), [Warning::PreservedRowsExceededGap]
/// is recorded and the row is appended after whatever is already there.
pub(crate) fn push_hinted<R: crate::metadata::streams::tables::table::RowWrite>(
  store: &mut crate::metadata::streams::tables::table::TableStore<R>,
  hint: Option<u32>,
  zero: impl Fn() -> R,
  row: R,
  table: &'static str,
  warnings: &mut Vec<Warning>,
) -> u32 {
  match hint {
    None | Some(0) => store.push(row),
    Some(target) => {
      if (store.len() as u32) + 1 > target {
        warnings.push(Warning::PreservedRowsExceededGap { table });
      } else {
        while (store.len() as u32) + 1 < target {
          store.push(zero());
        }
      }

      store.push(row)
    }
  }
}

/// Builds a fresh metadata image, assigning every row a brand new RID.
pub struct NormalTablesBuilder;

impl NormalTablesBuilder {
  /// Assembles `module` into tables and heaps, discarding `original_rid` hints entirely.
  pub fn build(module: &Rc<Module>) -> Result<BuiltTables, BuildError> {
    Walker::new(false).run(module)
  }
}

/// Orders a module's types the way the `TypeDef` table must be laid out: the declaration order of
/// top level types, with each type's nested types spliced in immediately after it, depth first
/// (ECMA-335 §II.22.37 note on `TypeDef` ordering).
pub(crate) fn sorted_types(module: &Module) -> Vec<Rc<TypeDef>> {
  let all = module.type_defs.borrow();
  let mut children: HashMap<*const TypeDef, Vec<Rc<TypeDef>>> = HashMap::new();
  let mut roots = Vec::new();

  for t in all.iter() {
    match t.enclosing_class.borrow().as_ref().and_then(|w| w.upgrade()) {
      Some(parent) => children
        .entry(Rc::as_ptr(&parent))
        .or_default()
        .push(t.clone()),
      None => roots.push(t.clone()),
    }
  }

  fn visit(
    t: &Rc<TypeDef>,
    children: &HashMap<*const TypeDef, Vec<Rc<TypeDef>>>,
    out: &mut Vec<Rc<TypeDef>>,
  ) {
    out.push(t.clone());

    if let Some(kids) = children.get(&Rc::as_ptr(t)) {
      for kid in kids {
        visit(kid, children, out);
      }
    }
  }

  let mut out = Vec::with_capacity(all.len());

  for root in &roots {
    visit(root, &children, &mut out);
  }

  out
}

/// Walks a module graph once, in either normal or preserving mode.
///
/// Shared by [NormalTablesBuilder] and [crate::metadata::build::preserving::PreservingTablesBuilder];
/// `preserve` gates whether [push_hinted] consults a node's `original_rid`.
pub(crate) struct Walker {
  preserve: bool,
  tables: TablesStoreSet,
  strings: StringsHeapBuilder,
  user_strings: UserStringsHeapBuilder,
  guids: GuidsHeapBuilder,
  blobs: BlobsHeapBuilder,
  resources: ResourceSectionBuilder,
  tokens: TokenService,
  warnings: Vec<Warning>,
  generic_params_pending: Vec<(TypeOrMethodDefEntity, Rc<GenericParam>)>,
  interface_impl_pending: Vec<(RowId<TypeDefRow>, TypeDefOrRef, Rc<InterfaceImpl>)>,
  decl_security_pending: Vec<(HasDeclSecurityEntity, DeclSecurity)>,
  method_semantics_pending: Vec<(HasSemanticsEntity, MethodSemanticsAttributes, Rc<Method>)>,
  field_marshal_pending: Vec<(HasFieldMarshalEntity, Vec<u8>)>,
  constant_pending: Vec<(HasConstantEntity, Constant)>,
  impl_map_pending: Vec<(MemberForwardedEntity, PInvokeMap)>,
  custom_attributes_pending: Vec<HasCustomAttributeEntity>,
}

impl Walker {
  pub(crate) fn new(preserve: bool) -> Self {
    Self {
      preserve,
      tables: TablesStoreSet::default(),
      strings: StringsHeapBuilder::default(),
      user_strings: UserStringsHeapBuilder::default(),
      guids: GuidsHeapBuilder::default(),
      blobs: BlobsHeapBuilder::default(),
      resources: ResourceSectionBuilder::default(),
      tokens: TokenService::default(),
      warnings: Vec::new(),
      generic_params_pending: Vec::new(),
      interface_impl_pending: Vec::new(),
      decl_security_pending: Vec::new(),
      method_semantics_pending: Vec::new(),
      field_marshal_pending: Vec::new(),
      constant_pending: Vec::new(),
      impl_map_pending: Vec::new(),
      custom_attributes_pending: Vec::new(),
    }
  }

  pub(crate) fn seed_heaps(
    &mut self,
    strings: StringsHeapBuilder,
    user_strings: UserStringsHeapBuilder,
    guids: GuidsHeapBuilder,
    blobs: BlobsHeapBuilder,
  ) {
    self.strings = strings;
    self.user_strings = user_strings;
    self.guids = guids;
    self.blobs = blobs;
  }

  pub(crate) fn run(mut self, module: &Rc<Module>) -> Result<BuiltTables, BuildError> {
    let types = sorted_types(module);

    // TypeDef RIDs are fully determined by position; pre-register them so a signature resolved
    // while walking type `N` can reference any other type regardless of where it sits.
    for (i, t) in types.iter().enumerate() {
      self.tokens.type_defs.set(t, i as u32 + 2);
    }

    self.push_module(module)?;

    if let Some(assembly) = module.assembly.borrow().as_ref() {
      self.push_assembly(assembly);
    }

    for module_ref in module.module_refs.borrow().iter() {
      let rid = self
        .tables
        .module_refs
        .push(ModuleRefRow::new(RowId::from_rid(0), self.strings.add(&module_ref.name)));
      self.tokens.module_refs.set(module_ref, rid);
    }

    for assembly_ref in module.assembly_refs.borrow().iter() {
      let rid = self.push_assembly_ref(assembly_ref);
      self.tokens.assembly_refs.set(assembly_ref, rid);
    }

    for file in module.files.borrow().iter() {
      self.materialize_file(file);
    }

    // `<Module>` is always the first TypeDef row (ECMA-335 §II.22.37, invariant that RID 1 names
    // the pseudo class holding module level fields/methods); this graph never models it as a node
    // of its own, so it's synthesized here.
    let module_type_rid = self.tables.type_defs.push(TypeDefRow::new(
      RowId::from_rid(0),
      TypeAttributes::empty(),
      self.strings.add("<Module>"),
      self.strings.add(""),
      TypeDefOrRef::none(),
      RowId::from_rid(self.tables.fields.len() as u32 + 1),
      RowId::from_rid(self.tables.method_defs.len() as u32 + 1),
    ));
    debug_assert_eq!(module_type_rid, 1);

    for t in &types {
      self.push_type(t)?;
    }

    self.flush_generic_params();
    self.flush_interface_impls();
    self.flush_decl_security();
    self.flush_method_semantics();
    self.flush_field_marshals();
    self.flush_constants();
    self.flush_impl_maps();

    for sig in module.stand_alone_sigs.borrow().iter() {
      self.materialize_stand_alone_sig(sig);
    }

    for spec in module.method_specs.borrow().iter() {
      self.materialize_method_spec(spec);
    }

    for exported in module.exported_types.borrow().iter() {
      self.materialize_exported_type(exported);
    }

    for resource in module.resources.borrow().iter() {
      self.push_manifest_resource(resource);
    }

    // Custom attributes are resolved dead last: by now every entity they could possibly name has
    // been assigned its final RID.
    self.flush_custom_attributes();

    Ok(BuiltTables {
      tables: self.tables,
      strings: self.strings,
      user_strings: self.user_strings,
      guids: self.guids,
      blobs: self.blobs,
      resources: self.resources.into_bytes(),
      tokens: self.tokens,
      warnings: self.warnings,
    })
  }

  fn push_module(&mut self, module: &Rc<Module>) -> Result<(), BuildError> {
    let name = self.strings.add(&module.name);
    let mvid = self.guids.add(module.mvid);
    let row = ModuleRow::new(RowId::from_rid(0), 0, name, mvid, GuidId::none(), GuidId::none());
    let hint = if self.preserve { module.original_rid.get() } else { None };
    let rid = push_hinted(
      &mut self.tables.modules,
      hint,
      || ModuleRow::new(RowId::from_rid(0), 0, StringId::none(), GuidId::none(), GuidId::none(), GuidId::none()),
      row,
      "Module",
      &mut self.warnings,
    );

    if rid != 1 {
      return Err(BuildError::MultipleModules);
    }

    self.tokens.module.set(module, rid);

    Ok(())
  }

  fn push_assembly(&mut self, assembly: &Rc<Assembly>) {
    let public_key = self.blobs.add(&assembly.public_key);
    let name = self.strings.add(&assembly.name);
    let culture = self.strings.add(&assembly.culture);
    let row = AssemblyRow::new(
      RowId::from_rid(0),
      assembly.hash_algorithm,
      assembly.major_version,
      assembly.minor_version,
      assembly.build_number,
      assembly.revision_number,
      assembly.flags,
      public_key,
      name,
      culture,
    );
    let rid = self.tables.assemblies.push(row);

    self.tokens.assembly.set(assembly, rid);

    for security in assembly.security.borrow().iter() {
      self
        .decl_security_pending
        .push((HasDeclSecurityEntity::Assembly(assembly.clone()), security.clone()));
    }

    for ca in assembly.custom_attributes.borrow().iter() {
      self.queue_custom_attribute(HasCustomAttributeEntity::Assembly(assembly.clone()), ca);
    }
  }

  fn push_assembly_ref(&mut self, assembly_ref: &Rc<AssemblyRef>) -> u32 {
    let public_key_or_token = self.blobs.add(&assembly_ref.public_key_or_token);
    let name = self.strings.add(&assembly_ref.name);
    let culture = self.strings.add(&assembly_ref.culture);
    let hash_value = self.blobs.add(&assembly_ref.hash_value);

    self.tables.assembly_refs.push(AssemblyRefRow::new(
      RowId::from_rid(0),
      assembly_ref.major_version,
      assembly_ref.minor_version,
      assembly_ref.build_number,
      assembly_ref.revision_number,
      assembly_ref.flags,
      public_key_or_token,
      name,
      culture,
      hash_value,
    ))
  }

  fn materialize_file(&mut self, file: &Rc<FileDef>) -> u32 {
    if let Some(rid) = self.tokens.files.try_get(file) {
      return rid;
    }

    let name = self.strings.add(&file.name);
    let hash_value = self.blobs.add(&file.hash_value);
    let rid = self
      .tables
      .files
      .push(FileRow::new(RowId::from_rid(0), file.flags, name, hash_value));

    self.tokens.files.set(file, rid);

    rid
  }

  fn push_type(&mut self, t: &Rc<TypeDef>) -> Result<(), BuildError> {
    let name = self.strings.add(&t.name);
    let namespace = self.strings.add(&t.namespace);
    let extends = match t.extends.borrow().as_ref() {
      Some(e) => self.resolve_type_def_or_ref(e),
      None => TypeDefOrRef::none(),
    };
    let field_list = RowId::from_rid(self.tables.fields.len() as u32 + 1);
    let method_list = RowId::from_rid(self.tables.method_defs.len() as u32 + 1);
    let row = TypeDefRow::new(RowId::from_rid(0), t.flags, name, namespace, extends, field_list, method_list);
    let hint = if self.preserve { t.original_rid.get() } else { None };
    let rid = push_hinted(
      &mut self.tables.type_defs,
      hint,
      zero_type_def_row,
      row,
      "TypeDef",
      &mut self.warnings,
    );

    self.tokens.type_defs.set(t, rid);

    for field in t.fields.borrow().iter() {
      self.push_field(field);
    }

    for method in t.methods.borrow().iter() {
      self.push_method(method, t);
    }

    if let Some(parent) = t.enclosing_class.borrow().as_ref().and_then(|w| w.upgrade()) {
      let enclosing_rid = self.tokens.type_defs.try_get(&parent).unwrap_or(0);
      self.tables.nested_classes.push(NestedClassRow::new(
        RowId::from_rid(0),
        RowId::from_rid(rid),
        RowId::from_rid(enclosing_rid),
      ));
    }

    for impl_ in t.interface_impls.borrow().iter() {
      let interface = self.resolve_type_def_or_ref(&impl_.interface);

      self
        .interface_impl_pending
        .push((RowId::from_rid(rid), interface, impl_.clone()));
    }

    if let Some(layout) = *t.class_layout.borrow() {
      self.tables.class_layouts.push(ClassLayoutRow::new(
        RowId::from_rid(0),
        layout.packing_size,
        layout.class_size,
        RowId::from_rid(rid),
      ));
    }

    for gp in t.generic_params.borrow().iter() {
      self.generic_params_pending.push((gp.owner.clone(), gp.clone()));
    }

    for security in t.security.borrow().iter() {
      self
        .decl_security_pending
        .push((HasDeclSecurityEntity::TypeDef(t.clone()), security.clone()));
    }

    if !t.events.borrow().is_empty() {
      self.tables.event_maps.push(EventMapRow::new(
        RowId::from_rid(0),
        RowId::from_rid(rid),
        RowId::from_rid(self.tables.events.len() as u32 + 1),
      ));

      for event in t.events.borrow().iter() {
        self.push_event(event);
      }
    }

    if !t.properties.borrow().is_empty() {
      self.tables.property_maps.push(PropertyMapRow::new(
        RowId::from_rid(0),
        RowId::from_rid(rid),
        RowId::from_rid(self.tables.properties.len() as u32 + 1),
      ));

      for property in t.properties.borrow().iter() {
        self.push_property(property);
      }
    }

    for ca in t.custom_attributes.borrow().iter() {
      self.queue_custom_attribute(HasCustomAttributeEntity::TypeDef(t.clone()), ca);
    }

    Ok(())
  }

  fn push_field(&mut self, field: &Rc<Field>) {
    let name = self.strings.add(&field.name);
    let resolve = |s: &mut Self, e: &TypeDefOrRefEntity| s.resolve_type_def_or_ref(e).encode();
    let mut sig_bytes = Vec::new();

    encode_field_sig_with(self, &field.signature, &mut sig_bytes, &resolve);

    let signature = self.blobs.add(&sig_bytes);
    let row = FieldRow::new(RowId::from_rid(0), field.flags, name, signature);
    let hint = if self.preserve { field.original_rid.get() } else { None };
    let rid = push_hinted(
      &mut self.tables.fields,
      hint,
      zero_field_row,
      row,
      "Field",
      &mut self.warnings,
    );

    self.tokens.fields.set(field, rid);

    if let Some(value) = field.constant.borrow().as_ref() {
      self
        .constant_pending
        .push((HasConstantEntity::Field(field.clone()), value.clone()));
    }

    if let Some(marshal) = field.marshal.borrow().as_ref() {
      self
        .field_marshal_pending
        .push((HasFieldMarshalEntity::Field(field.clone()), marshal.clone()));
    }

    if let Some(rva) = *field.rva.borrow() {
      self
        .tables
        .field_rvas
        .push(FieldRvaRow::new(RowId::from_rid(0), rva, RowId::from_rid(rid)));
    }

    if let Some(offset) = *field.layout_offset.borrow() {
      self
        .tables
        .field_layouts
        .push(FieldLayoutRow::new(RowId::from_rid(0), offset, RowId::from_rid(rid)));
    }

    for ca in field.custom_attributes.borrow().iter() {
      self.queue_custom_attribute(HasCustomAttributeEntity::Field(field.clone()), ca);
    }
  }

  fn push_method(&mut self, method: &Rc<Method>, owner: &Rc<TypeDef>) {
    let name = self.strings.add(&method.name);
    let mut sig_bytes = Vec::new();

    encode_method_sig_with(self, &method.signature, &mut sig_bytes);

    let signature = self.blobs.add(&sig_bytes);
    let rva = method.rva.borrow().unwrap_or(0);
    let param_list = RowId::from_rid(self.tables.params.len() as u32 + 1);
    let row = MethodDefRow::new(
      RowId::from_rid(0),
      rva,
      method.impl_flags,
      method.flags,
      name,
      signature,
      param_list,
    );
    let hint = if self.preserve { method.original_rid.get() } else { None };
    let rid = push_hinted(
      &mut self.tables.method_defs,
      hint,
      zero_method_def_row,
      row,
      "MethodDef",
      &mut self.warnings,
    );

    self.tokens.methods.set(method, rid);

    for param in method.params.borrow().iter() {
      self.push_param(param);
    }

    if let Some(pinvoke) = method.pinvoke.borrow().as_ref() {
      self
        .impl_map_pending
        .push((MemberForwardedEntity::Method(method.clone()), pinvoke.clone()));
    }

    for overridden in method.overrides.borrow().iter() {
      let method_body = MethodDefOrRef::MethodDef(RowId::from_rid(rid));
      let method_declaration = self.resolve_method_def_or_ref(overridden);

      self.tables.method_impls.push(MethodImplRow::new(
        RowId::from_rid(0),
        RowId::from_rid(self.tokens.type_defs.try_get(owner).unwrap_or(0)),
        method_body,
        method_declaration,
      ));
    }

    for security in method.security.borrow().iter() {
      self
        .decl_security_pending
        .push((HasDeclSecurityEntity::Method(method.clone()), security.clone()));
    }

    for gp in method.generic_params.borrow().iter() {
      self.generic_params_pending.push((gp.owner.clone(), gp.clone()));
    }

    for ca in method.custom_attributes.borrow().iter() {
      self.queue_custom_attribute(HasCustomAttributeEntity::Method(method.clone()), ca);
    }
  }

  fn push_param(&mut self, param: &Rc<Param>) {
    let name = self.strings.add(&param.name);
    let row = ParamRow::new(RowId::from_rid(0), param.flags, param.sequence, name);
    let hint = if self.preserve { param.original_rid.get() } else { None };
    let rid = push_hinted(
      &mut self.tables.params,
      hint,
      zero_param_row,
      row,
      "Param",
      &mut self.warnings,
    );

    self.tokens.params.set(param, rid);

    if let Some(value) = param.constant.borrow().as_ref() {
      self
        .constant_pending
        .push((HasConstantEntity::Param(param.clone()), value.clone()));
    }

    if let Some(marshal) = param.marshal.borrow().as_ref() {
      self
        .field_marshal_pending
        .push((HasFieldMarshalEntity::Param(param.clone()), marshal.clone()));
    }

    for ca in param.custom_attributes.borrow().iter() {
      self.queue_custom_attribute(HasCustomAttributeEntity::Param(param.clone()), ca);
    }
  }

  fn push_event(&mut self, event: &Rc<Event>) {
    let name = self.strings.add(&event.name);
    let event_type = self.resolve_type_def_or_ref(&event.event_type);
    let row = EventRow::new(RowId::from_rid(0), event.flags, name, event_type);
    let hint = if self.preserve { event.original_rid.get() } else { None };
    let rid = push_hinted(
      &mut self.tables.events,
      hint,
      zero_event_row,
      row,
      "Event",
      &mut self.warnings,
    );

    self.tokens.events.set(event, rid);

    if let Some(m) = event.add_method.borrow().as_ref() {
      self
        .method_semantics_pending
        .push((HasSemanticsEntity::Event(event.clone()), MethodSemanticsAttributes::ADD_ON, m.clone()));
    }

    if let Some(m) = event.remove_method.borrow().as_ref() {
      self.method_semantics_pending.push((
        HasSemanticsEntity::Event(event.clone()),
        MethodSemanticsAttributes::REMOVE_ON,
        m.clone(),
      ));
    }

    if let Some(m) = event.fire_method.borrow().as_ref() {
      self
        .method_semantics_pending
        .push((HasSemanticsEntity::Event(event.clone()), MethodSemanticsAttributes::FIRE, m.clone()));
    }

    for m in event.other_methods.borrow().iter() {
      self
        .method_semantics_pending
        .push((HasSemanticsEntity::Event(event.clone()), MethodSemanticsAttributes::OTHER, m.clone()));
    }

    for ca in event.custom_attributes.borrow().iter() {
      self.queue_custom_attribute(HasCustomAttributeEntity::Event(event.clone()), ca);
    }
  }

  fn push_property(&mut self, property: &Rc<Property>) {
    let name = self.strings.add(&property.name);
    let resolve = |s: &mut Self, e: &TypeDefOrRefEntity| s.resolve_type_def_or_ref(e).encode();
    let mut sig_bytes = Vec::new();

    encode_property_sig_with(self, &property.signature, &mut sig_bytes, &resolve);

    let signature = self.blobs.add(&sig_bytes);
    let row = PropertyRow::new(RowId::from_rid(0), property.flags, name, signature);
    let hint = if self.preserve { property.original_rid.get() } else { None };
    let rid = push_hinted(
      &mut self.tables.properties,
      hint,
      zero_property_row,
      row,
      "Property",
      &mut self.warnings,
    );

    self.tokens.properties.set(property, rid);

    if let Some(value) = property.constant.borrow().as_ref() {
      self
        .constant_pending
        .push((HasConstantEntity::Property(property.clone()), value.clone()));
    }

    if let Some(m) = property.getter.borrow().as_ref() {
      self.method_semantics_pending.push((
        HasSemanticsEntity::Property(property.clone()),
        MethodSemanticsAttributes::GETTER,
        m.clone(),
      ));
    }

    if let Some(m) = property.setter.borrow().as_ref() {
      self.method_semantics_pending.push((
        HasSemanticsEntity::Property(property.clone()),
        MethodSemanticsAttributes::SETTER,
        m.clone(),
      ));
    }

    for m in property.other_methods.borrow().iter() {
      self.method_semantics_pending.push((
        HasSemanticsEntity::Property(property.clone()),
        MethodSemanticsAttributes::OTHER,
        m.clone(),
      ));
    }

    for ca in property.custom_attributes.borrow().iter() {
      self.queue_custom_attribute(HasCustomAttributeEntity::Property(property.clone()), ca);
    }
  }

  fn push_manifest_resource(&mut self, resource: &Rc<ManifestResource>) {
    let offset = offset_for(&resource.data, &mut self.resources);
    let implementation = match &resource.data {
      ResourceData::Embedded(_) => Implementation::none(),
      ResourceData::File(f) => Implementation::File(RowId::from_rid(self.materialize_file(f))),
      ResourceData::AssemblyRef(a) => {
        Implementation::AssemblyRef(RowId::from_rid(self.tokens.assembly_refs.try_get(a).unwrap_or(0)))
      }
    };
    let name = self.strings.add(&resource.name);
    let rid = self.tables.manifest_resources.push(ManifestResourceRow::new(
      RowId::from_rid(0),
      offset,
      resource.flags,
      name,
      implementation,
    ));

    self.tokens.manifest_resources.set(resource, rid);
  }

  fn materialize_stand_alone_sig(&mut self, sig: &Rc<StandAloneSig>) -> u32 {
    if let Some(rid) = self.tokens.stand_alone_sigs.try_get(sig) {
      return rid;
    }

    let mut bytes = Vec::new();

    encode_method_sig_with(self, &sig.signature, &mut bytes);

    let signature = self.blobs.add(&bytes);
    let rid = self
      .tables
      .stand_alone_sigs
      .push(StandAloneSigRow::new(RowId::from_rid(0), signature));

    self.tokens.stand_alone_sigs.set(sig, rid);

    rid
  }

  fn materialize_method_spec(&mut self, spec: &Rc<MethodSpec>) -> u32 {
    if let Some(rid) = self.tokens.method_specs.try_get(spec) {
      return rid;
    }

    let method = self.resolve_method_def_or_ref(&spec.method);
    let resolve = |s: &mut Self, e: &TypeDefOrRefEntity| s.resolve_type_def_or_ref(e).encode();
    let mut bytes = std::vec![0x0a];

    crate::bytes::write_compressed_u32(&mut bytes, spec.generic_args.len() as u32);

    for arg in &spec.generic_args {
      encode_type_with(self, arg, &mut bytes, &resolve);
    }

    let instantiation = self.blobs.add(&bytes);
    let rid = self
      .tables
      .method_specs
      .push(MethodSpecRow::new(RowId::from_rid(0), method, instantiation));

    self.tokens.method_specs.set(spec, rid);

    rid
  }

  fn materialize_exported_type(&mut self, exported: &Rc<ExportedType>) -> u32 {
    if let Some(rid) = self.tokens.exported_types.try_get(exported) {
      return rid;
    }

    let implementation = match &exported.implementation {
      ImplementationEntity::File(f) => Implementation::File(RowId::from_rid(self.materialize_file(f))),
      ImplementationEntity::AssemblyRef(a) => {
        Implementation::AssemblyRef(RowId::from_rid(self.tokens.assembly_refs.try_get(a).unwrap_or(0)))
      }
      ImplementationEntity::ExportedType(e) => {
        Implementation::ExportedType(RowId::from_rid(self.materialize_exported_type(e)))
      }
    };
    let type_name = self.strings.add(&exported.name);
    let type_namespace = self.strings.add(&exported.namespace);
    let rid = self.tables.exported_types.push(ExportedTypeRow::new(
      RowId::from_rid(0),
      exported.flags,
      RowId::from_rid(exported.type_def_id),
      type_name,
      type_namespace,
      implementation,
    ));

    self.tokens.exported_types.set(exported, rid);

    rid
  }

  fn materialize_type_ref(&mut self, n: &Rc<TypeRef>) -> u32 {
    if let Some(rid) = self.tokens.type_refs.try_get(n) {
      return rid;
    }

    let resolution_scope = match n.resolution_scope.borrow().as_ref() {
      Some(e) => self.resolve_resolution_scope(e),
      None => ResolutionScope::none(),
    };
    let name = self.strings.add(&n.name);
    let namespace = self.strings.add(&n.namespace);
    let rid = self
      .tables
      .type_refs
      .push(TypeRefRow::new(RowId::from_rid(0), resolution_scope, name, namespace));

    self.tokens.type_refs.set(n, rid);

    rid
  }

  fn materialize_type_spec(&mut self, n: &Rc<TypeSpec>) -> u32 {
    if let Some(rid) = self.tokens.type_specs.try_get(n) {
      return rid;
    }

    let resolve = |s: &mut Self, e: &TypeDefOrRefEntity| s.resolve_type_def_or_ref(e).encode();
    let mut bytes = Vec::new();

    encode_type_with(self, &n.signature, &mut bytes, &resolve);

    let signature = self.blobs.add(&bytes);
    let rid = self
      .tables
      .type_specs
      .push(TypeSpecRow::new(RowId::from_rid(0), signature));

    self.tokens.type_specs.set(n, rid);

    rid
  }

  fn materialize_member_ref(&mut self, n: &Rc<MemberRef>) -> u32 {
    if let Some(rid) = self.tokens.member_refs.try_get(n) {
      return rid;
    }

    let class = self.resolve_member_ref_parent(&n.parent);
    let name = self.strings.add(&n.name);
    let resolve = |s: &mut Self, e: &TypeDefOrRefEntity| s.resolve_type_def_or_ref(e).encode();
    let mut bytes = Vec::new();

    match &n.signature {
      MemberRefSig::Field(sig) => encode_field_sig_with(self, sig, &mut bytes, &resolve),
      MemberRefSig::Method(sig) => encode_method_sig_with(self, sig, &mut bytes),
    }

    let signature = self.blobs.add(&bytes);
    let rid = self
      .tables
      .member_refs
      .push(MemberRefRow::new(RowId::from_rid(0), class, name, signature));

    self.tokens.member_refs.set(n, rid);

    rid
  }

  fn resolve_type_def_or_ref(&mut self, e: &TypeDefOrRefEntity) -> TypeDefOrRef {
    match e {
      TypeDefOrRefEntity::TypeDef(n) => {
        TypeDefOrRef::TypeDef(RowId::from_rid(self.tokens.type_defs.try_get(n).unwrap_or(0)))
      }
      TypeDefOrRefEntity::TypeRef(n) => TypeDefOrRef::TypeRef(RowId::from_rid(self.materialize_type_ref(n))),
      TypeDefOrRefEntity::TypeSpec(n) => TypeDefOrRef::TypeSpec(RowId::from_rid(self.materialize_type_spec(n))),
    }
  }

  fn resolve_resolution_scope(&mut self, e: &ResolutionScopeEntity) -> ResolutionScope {
    match e {
      ResolutionScopeEntity::Module(n) => {
        ResolutionScope::Module(RowId::from_rid(self.tokens.module.try_get(n).unwrap_or(0)))
      }
      ResolutionScopeEntity::ModuleRef(n) => {
        ResolutionScope::ModuleRef(RowId::from_rid(self.tokens.module_refs.try_get(n).unwrap_or(0)))
      }
      ResolutionScopeEntity::AssemblyRef(n) => {
        ResolutionScope::AssemblyRef(RowId::from_rid(self.tokens.assembly_refs.try_get(n).unwrap_or(0)))
      }
      ResolutionScopeEntity::TypeRef(n) => ResolutionScope::TypeRef(RowId::from_rid(self.materialize_type_ref(n))),
    }
  }

  fn resolve_member_ref_parent(&mut self, e: &MemberRefParentEntity) -> MemberRefParent {
    match e {
      MemberRefParentEntity::TypeDef(n) => {
        MemberRefParent::TypeDef(RowId::from_rid(self.tokens.type_defs.try_get(n).unwrap_or(0)))
      }
      MemberRefParentEntity::TypeRef(n) => MemberRefParent::TypeRef(RowId::from_rid(self.materialize_type_ref(n))),
      MemberRefParentEntity::ModuleRef(n) => {
        MemberRefParent::ModuleRef(RowId::from_rid(self.tokens.module_refs.try_get(n).unwrap_or(0)))
      }
      MemberRefParentEntity::Method(n) => {
        MemberRefParent::MethodDef(RowId::from_rid(self.tokens.methods.try_get(n).unwrap_or(0)))
      }
      MemberRefParentEntity::TypeSpec(n) => {
        MemberRefParent::TypeSpec(RowId::from_rid(self.materialize_type_spec(n)))
      }
    }
  }

  fn resolve_method_def_or_ref(&mut self, e: &MethodDefOrRefEntity) -> MethodDefOrRef {
    match e {
      MethodDefOrRefEntity::Method(n) => {
        MethodDefOrRef::MethodDef(RowId::from_rid(self.tokens.methods.try_get(n).unwrap_or(0)))
      }
      MethodDefOrRefEntity::MemberRef(n) => {
        MethodDefOrRef::MemberRef(RowId::from_rid(self.materialize_member_ref(n)))
      }
    }
  }

  fn queue_custom_attribute(&mut self, owner: HasCustomAttributeEntity, ca: &CustomAttribute) {
    let constructor = self.resolve_custom_attribute_type(&ca.constructor);
    let value = self.blobs.add(&ca.value);

    // `parent` is a throwaway nil coded id; the real value and final table position are assigned
    // in `flush_custom_attributes` once every other table has settled.
    self
      .tables
      .custom_attributes
      .push(CustomAttributeRow::new(RowId::from_rid(0), HasCustomAttribute::none(), constructor, value));
    self.custom_attributes_pending.push(owner);
  }

  fn resolve_custom_attribute_type(&mut self, e: &CustomAttributeTypeEntity) -> CustomAttributeType {
    match e {
      CustomAttributeTypeEntity::Method(n) => {
        let rid = self.tokens.methods.try_get(n).unwrap_or_else(|| {
          self.warnings.push(Warning::DroppedCustomAttribute);
          0
        });

        CustomAttributeType::MethodDef(RowId::from_rid(rid))
      }
      CustomAttributeTypeEntity::MemberRef(n) => {
        CustomAttributeType::MemberRef(RowId::from_rid(self.materialize_member_ref(n)))
      }
    }
  }

  fn flush_generic_params(&mut self) {
    let mut pending = std::mem::take(&mut self.generic_params_pending);

    pending.sort_by_key(|(owner, _)| self.tokens.type_or_method_def(owner).encode());

    for (owner, gp) in pending {
      let coded_owner = self.tokens.type_or_method_def(&owner);
      let name = self.strings.add(&gp.name);
      let rid = self.tables.generic_params.push(GenericParamRow::new(
        RowId::from_rid(0),
        gp.number,
        gp.flags,
        coded_owner,
        name,
      ));

      self.tokens.generic_params.set(&gp, rid);

      for constraint in gp.constraints.borrow().iter() {
        let constraint = self.resolve_type_def_or_ref(constraint);

        self.tables.generic_param_constraints.push(GenericParamConstraintRow::new(
          RowId::from_rid(0),
          RowId::from_rid(rid),
          constraint,
        ));
      }

      for ca in gp.custom_attributes.borrow().iter() {
        self.queue_custom_attribute(HasCustomAttributeEntity::GenericParam(gp.clone()), ca);
      }
    }
  }

  /// `InterfaceImpl` is sorted by `(Class, Interface)` (ECMA-335 §II.22.23): a type's own rid
  /// pins its rows together, and the coded `Interface` tiebreaks between a type's several
  /// interfaces.
  fn flush_interface_impls(&mut self) {
    let mut pending = std::mem::take(&mut self.interface_impl_pending);

    pending.sort_by_key(|(class, interface, _)| (class.rid(), interface.encode()));

    for (class, interface, impl_) in pending {
      let impl_rid = self
        .tables
        .interface_impls
        .push(InterfaceImplRow::new(RowId::from_rid(0), class, interface));

      self.tokens.interface_impls.set(&impl_, impl_rid);

      for ca in impl_.custom_attributes.borrow().iter() {
        self.queue_custom_attribute(HasCustomAttributeEntity::InterfaceImpl(impl_.clone()), ca);
      }
    }
  }

  fn flush_decl_security(&mut self) {
    let mut pending = std::mem::take(&mut self.decl_security_pending);

    pending.sort_by_key(|(owner, _)| self.tokens.has_decl_security(owner).encode());

    for (owner, security) in pending {
      let parent = self.tokens.has_decl_security(&owner);
      let permission_set = self.blobs.add(&security.permission_set);

      self
        .tables
        .decl_securities
        .push(DeclSecurityRow::new(RowId::from_rid(0), security.action, parent, permission_set));
    }
  }

  fn flush_method_semantics(&mut self) {
    let mut pending = std::mem::take(&mut self.method_semantics_pending);

    pending.sort_by_key(|(owner, _, _)| self.tokens.has_semantics(owner).encode());

    for (owner, semantics, method) in pending {
      let association = self.tokens.has_semantics(&owner);
      let method_rid = RowId::from_rid(self.tokens.methods.try_get(&method).unwrap_or(0));

      self
        .tables
        .method_semantics
        .push(MethodSemanticsRow::new(RowId::from_rid(0), semantics, method_rid, association));
    }
  }

  fn flush_field_marshals(&mut self) {
    let mut pending = std::mem::take(&mut self.field_marshal_pending);

    pending.sort_by_key(|(owner, _)| self.tokens.has_field_marshal(owner).encode());

    for (owner, blob) in pending {
      let parent = self.tokens.has_field_marshal(&owner);
      let native_type = self.blobs.add(&blob);

      self
        .tables
        .field_marshals
        .push(FieldMarshalRow::new(RowId::from_rid(0), parent, native_type));
    }
  }

  fn flush_constants(&mut self) {
    let mut pending = std::mem::take(&mut self.constant_pending);

    pending.sort_by_key(|(owner, _)| self.tokens.has_constant(owner).encode());

    for (owner, constant) in pending {
      let parent = self.tokens.has_constant(&owner);
      let (kind, blob, warning) = constant::encode(&constant, &mut self.blobs);

      if let Some(warning) = warning {
        self.warnings.push(warning);
      }

      self
        .tables
        .constants
        .push(ConstantRow::new(RowId::from_rid(0), kind, 0, parent, blob));
    }
  }

  fn flush_impl_maps(&mut self) {
    let mut pending = std::mem::take(&mut self.impl_map_pending);

    pending.sort_by_key(|(owner, _)| self.tokens.member_forwarded(owner).encode());

    for (owner, pinvoke) in pending {
      let member_forwarded = self.tokens.member_forwarded(&owner);
      let import_name = self.strings.add(&pinvoke.import_name);
      let import_scope = RowId::from_rid(self.tokens.module_refs.try_get(&pinvoke.import_scope).unwrap_or(0));

      self.tables.impl_maps.push(ImplMapRow::new(
        RowId::from_rid(0),
        pinvoke.flags,
        member_forwarded,
        import_name,
        import_scope,
      ));
    }
  }

  fn flush_custom_attributes(&mut self) {
    let owners = std::mem::take(&mut self.custom_attributes_pending);
    let mut parents: Vec<HasCustomAttribute> = owners
      .iter()
      .map(|owner| self.tokens.has_custom_attribute(owner))
      .collect();

    let rows = self.tables.custom_attributes.rows_mut();

    for (row, parent) in rows.iter_mut().zip(parents.drain(..)) {
      *row = CustomAttributeRow::new(RowId::from_rid(0), parent, row.attribute_type(), row.value());
    }

    rows.sort_by_key(|row| row.parent().encode());
  }
}

fn zero_type_def_row() -> TypeDefRow {
  TypeDefRow::new(
    RowId::from_rid(0),
    TypeAttributes::empty(),
    StringId::none(),
    StringId::none(),
    TypeDefOrRef::none(),
    RowId::from_rid(0),
    RowId::from_rid(0),
  )
}

fn zero_field_row() -> FieldRow {
  FieldRow::new(RowId::from_rid(0), FieldAttributes::empty(), StringId::none(), BlobId::none())
}

fn zero_method_def_row() -> MethodDefRow {
  MethodDefRow::new(
    RowId::from_rid(0),
    0,
    MethodImplAttributes::empty(),
    MethodAttributes::empty(),
    StringId::none(),
    BlobId::none(),
    RowId::from_rid(0),
  )
}

fn zero_param_row() -> ParamRow {
  ParamRow::new(RowId::from_rid(0), ParamAttributes::empty(), 0, StringId::none())
}

fn zero_event_row() -> EventRow {
  EventRow::new(RowId::from_rid(0), EventAttributes::empty(), StringId::none(), TypeDefOrRef::none())
}

fn zero_property_row() -> PropertyRow {
  PropertyRow::new(RowId::from_rid(0), PropertyAttributes::empty(), StringId::none(), BlobId::none())
}

fn encode_type_with(
  walker: &mut Walker,
  ty: &crate::graph::signature::TypeSig,
  out: &mut Vec<u8>,
  resolve: &impl Fn(&mut Walker, &TypeDefOrRefEntity) -> u32,
) {
  // `encode_type` wants a plain `Fn(&Entity) -> u32`; since resolving can materialize new rows
  // (mutating `walker`), references that only live behind shared borrows are resolved eagerly
  // into a side table first, then the signature is re-encoded against that table.
  let mut cache: HashMap<*const (), u32> = HashMap::new();

  collect_type_refs(ty, &mut cache, walker, resolve);

  let lookup = |e: &TypeDefOrRefEntity| *cache.get(&entity_ptr(e)).unwrap_or(&0);

  encode_type(out, ty, &lookup);
}

fn entity_ptr(e: &TypeDefOrRefEntity) -> *const () {
  match e {
    TypeDefOrRefEntity::TypeDef(n) => Rc::as_ptr(n) as *const (),
    TypeDefOrRefEntity::TypeRef(n) => Rc::as_ptr(n) as *const (),
    TypeDefOrRefEntity::TypeSpec(n) => Rc::as_ptr(n) as *const (),
  }
}

fn collect_type_refs(
  ty: &crate::graph::signature::TypeSig,
  cache: &mut HashMap<*const (), u32>,
  walker: &mut Walker,
  resolve: &impl Fn(&mut Walker, &TypeDefOrRefEntity) -> u32,
) {
  use crate::graph::signature::TypeSig;

  match ty {
    TypeSig::ValueType(e) | TypeSig::Class(e) => {
      cache.entry(entity_ptr(e)).or_insert_with(|| resolve(walker, e));
    }
    TypeSig::SzArray(inner) | TypeSig::ByRef(inner) | TypeSig::Ptr(inner) => {
      collect_type_refs(inner, cache, walker, resolve);
    }
    TypeSig::GenericInst {
      generic_type, args, ..
    } => {
      cache
        .entry(entity_ptr(generic_type))
        .or_insert_with(|| resolve(walker, generic_type));

      for arg in args {
        collect_type_refs(arg, cache, walker, resolve);
      }
    }
    _ => {}
  }
}

fn encode_field_sig_with(
  walker: &mut Walker,
  sig: &crate::graph::signature::FieldSig,
  out: &mut Vec<u8>,
  resolve: &impl Fn(&mut Walker, &TypeDefOrRefEntity) -> u32,
) {
  let mut cache: HashMap<*const (), u32> = HashMap::new();

  collect_type_refs(&sig.ty, &mut cache, walker, resolve);

  let lookup = |e: &TypeDefOrRefEntity| *cache.get(&entity_ptr(e)).unwrap_or(&0);
  let bytes = encode_field_sig(sig, &lookup);

  out.extend_from_slice(&bytes);
}

fn encode_property_sig_with(
  walker: &mut Walker,
  sig: &crate::graph::signature::PropertySig,
  out: &mut Vec<u8>,
  resolve: &impl Fn(&mut Walker, &TypeDefOrRefEntity) -> u32,
) {
  let mut cache: HashMap<*const (), u32> = HashMap::new();

  collect_type_refs(&sig.ty, &mut cache, walker, resolve);

  for param in &sig.params {
    collect_type_refs(param, &mut cache, walker, resolve);
  }

  let lookup = |e: &TypeDefOrRefEntity| *cache.get(&entity_ptr(e)).unwrap_or(&0);
  let bytes = encode_property_sig(sig, &lookup);

  out.extend_from_slice(&bytes);
}

fn encode_method_sig_with(walker: &mut Walker, sig: &crate::graph::signature::MethodSig, out: &mut Vec<u8>) {
  let resolve = |s: &mut Walker, e: &TypeDefOrRefEntity| s.resolve_type_def_or_ref(e).encode();
  let mut cache: HashMap<*const (), u32> = HashMap::new();

  collect_type_refs(&sig.ret, &mut cache, walker, &resolve);

  for param in &sig.params {
    collect_type_refs(param, &mut cache, walker, &resolve);
  }

  let lookup = |e: &TypeDefOrRefEntity| *cache.get(&entity_ptr(e)).unwrap_or(&0);
  let bytes = encode_method_sig(sig, &lookup);

  out.extend_from_slice(&bytes);
}
