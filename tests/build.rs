use metacore::graph::module::{
  ClassLayout, Field, Method, Module, TypeDef,
};
use metacore::graph::signature::{CallingConvention, FieldSig, MethodSig, TypeSig};
use metacore::metadata::build::{self, BuildOptions};
use metacore::metadata::streams::tables::flags::{FieldAttributes, MethodAttributes, TypeAttributes};
use metacore::metadata::MetadataReader;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn empty_field(name: &str, declaring_type: &Rc<TypeDef>) -> Rc<Field> {
  Rc::new(Field {
    name: name.into(),
    flags: FieldAttributes::PRIVATE,
    signature: FieldSig { ty: TypeSig::I4 },
    declaring_type: Rc::downgrade(declaring_type),
    original_rid: Cell::new(None),
    constant: RefCell::new(None),
    marshal: RefCell::new(None),
    rva: RefCell::new(None),
    layout_offset: RefCell::new(None),
    custom_attributes: RefCell::new(Vec::new()),
  })
}

fn empty_method(name: &str, declaring_type: &Rc<TypeDef>) -> Rc<Method> {
  Rc::new(Method {
    name: name.into(),
    flags: MethodAttributes::PUBLIC,
    impl_flags: Default::default(),
    signature: MethodSig {
      has_this: true,
      explicit_this: false,
      calling_convention: CallingConvention::Default,
      generic_param_count: 0,
      params: Vec::new(),
      ret: TypeSig::Void,
    },
    declaring_type: Rc::downgrade(declaring_type),
    original_rid: Cell::new(None),
    params: RefCell::new(Vec::new()),
    generic_params: RefCell::new(Vec::new()),
    rva: RefCell::new(None),
    pinvoke: RefCell::new(None),
    overrides: RefCell::new(Vec::new()),
    custom_attributes: RefCell::new(Vec::new()),
    security: RefCell::new(Vec::new()),
  })
}

#[test]
fn empty_module_has_only_the_synthesized_module_type() {
  let module = Rc::new(Module {
    name: "Empty.dll".into(),
    ..Default::default()
  });

  let built = build::build(&module).unwrap();

  assert_eq!(built.tables().modules.len(), 1);
  assert_eq!(built.tables().type_defs.len(), 1);
  assert!(built.tables().fields.is_empty());
  assert!(built.tables().method_defs.is_empty());
  assert!(built.warnings().is_empty());
}

#[test]
fn types_fields_and_methods_get_contiguous_rids() {
  let module = Rc::new(Module {
    name: "Contiguous.dll".into(),
    ..Default::default()
  });

  let a = Rc::new(TypeDef {
    name: "A".into(),
    namespace: "N".into(),
    flags: TypeAttributes::PUBLIC,
    ..Default::default()
  });
  let a_field = empty_field("x", &a);
  let a_method = empty_method("M", &a);
  a.fields.borrow_mut().push(a_field.clone());
  a.methods.borrow_mut().push(a_method.clone());

  let b = Rc::new(TypeDef {
    name: "B".into(),
    namespace: "N".into(),
    flags: TypeAttributes::PUBLIC,
    ..Default::default()
  });
  let b_field = empty_field("y", &b);
  b.fields.borrow_mut().push(b_field.clone());

  module.type_defs.borrow_mut().push(a.clone());
  module.type_defs.borrow_mut().push(b.clone());

  let built = build::build(&module).unwrap();

  // RID 1 is the synthesized `<Module>` pseudo-type; `A` and `B` follow in declaration order.
  assert_eq!(built.tables().type_defs.len(), 3);
  assert_eq!(built.tokens().type_defs.try_get(&a), Some(2));
  assert_eq!(built.tokens().type_defs.try_get(&b), Some(3));

  assert_eq!(built.tables().fields.len(), 2);
  assert_eq!(built.tokens().fields.try_get(&a_field), Some(1));
  assert_eq!(built.tokens().fields.try_get(&b_field), Some(2));

  assert_eq!(built.tables().method_defs.len(), 1);
  assert_eq!(built.tokens().methods.try_get(&a_method), Some(1));
}

#[test]
fn nested_types_are_spliced_depth_first_after_their_enclosing_type() {
  let module = Rc::new(Module {
    name: "Nested.dll".into(),
    ..Default::default()
  });

  let outer = Rc::new(TypeDef {
    name: "Outer".into(),
    namespace: "N".into(),
    flags: TypeAttributes::PUBLIC,
    ..Default::default()
  });
  let sibling = Rc::new(TypeDef {
    name: "Sibling".into(),
    namespace: "N".into(),
    flags: TypeAttributes::PUBLIC,
    ..Default::default()
  });
  let inner = Rc::new(TypeDef {
    name: "Inner".into(),
    namespace: "N".into(),
    flags: TypeAttributes::NESTED_PUBLIC,
    enclosing_class: RefCell::new(Some(Rc::downgrade(&outer))),
    ..Default::default()
  });

  // Declared out of nesting order: `Inner` is pushed before its enclosing `Outer` is even in the
  // module, and `Sibling` (a root type) comes in between them.
  module.type_defs.borrow_mut().push(inner.clone());
  module.type_defs.borrow_mut().push(outer.clone());
  module.type_defs.borrow_mut().push(sibling.clone());

  let built = build::build(&module).unwrap();

  let outer_rid = built.tokens().type_defs.try_get(&outer).unwrap();
  let inner_rid = built.tokens().type_defs.try_get(&inner).unwrap();
  let sibling_rid = built.tokens().type_defs.try_get(&sibling).unwrap();

  // `Outer`'s roots are visited in declaration order (`Inner`'s root is `Outer`... no, `Inner` is
  // not a root; roots here are `Outer` then `Sibling`), and `Inner` is spliced in immediately
  // after `Outer`.
  assert_eq!(outer_rid + 1, inner_rid);
  assert!(sibling_rid > inner_rid);
}

#[test]
fn patch_method_rva_rewrites_only_the_rva_column() {
  let module = Rc::new(Module {
    name: "Patch.dll".into(),
    ..Default::default()
  });
  let ty = Rc::new(TypeDef {
    name: "T".into(),
    namespace: "N".into(),
    flags: TypeAttributes::PUBLIC,
    ..Default::default()
  });
  let method = empty_method("Run", &ty);
  ty.methods.borrow_mut().push(method.clone());
  module.type_defs.borrow_mut().push(ty);

  let mut built = build::build(&module).unwrap();
  let rid = built.tokens().methods.try_get(&method).unwrap();

  built.patch_method_rva(rid, 0x2050).unwrap();

  let row = built
    .tables()
    .method_defs
    .rows()
    .get(rid as usize - 1)
    .unwrap();
  assert_eq!(row.rva(), 0x2050);
  assert_eq!(row.name(), built.tables().method_defs.rows()[0].name());
}

#[test]
fn patch_method_rva_rejects_an_out_of_range_rid() {
  let module = Rc::new(Module {
    name: "Patch.dll".into(),
    ..Default::default()
  });
  let mut built = build::build(&module).unwrap();

  assert!(built.patch_method_rva(1, 0x1000).is_err());
  assert!(built.patch_method_rva(0, 0x1000).is_err());
}

#[test]
fn patch_field_rva_inserts_in_field_column_order() {
  let module = Rc::new(Module {
    name: "Patch.dll".into(),
    ..Default::default()
  });
  let ty = Rc::new(TypeDef {
    name: "T".into(),
    namespace: "N".into(),
    flags: TypeAttributes::PUBLIC,
    class_layout: RefCell::new(Some(ClassLayout {
      packing_size: 0,
      class_size: 0,
    })),
    ..Default::default()
  });
  let first = empty_field("a", &ty);
  let second = empty_field("b", &ty);
  ty.fields.borrow_mut().push(first.clone());
  ty.fields.borrow_mut().push(second.clone());
  module.type_defs.borrow_mut().push(ty);

  let mut built = build::build(&module).unwrap();
  let first_rid = built.tokens().fields.try_get(&first).unwrap();
  let second_rid = built.tokens().fields.try_get(&second).unwrap();

  // Patch in reverse order; the table must still come out sorted by `Field`.
  built.patch_field_rva(second_rid, 0x400).unwrap();
  built.patch_field_rva(first_rid, 0x300).unwrap();

  let rvas: Vec<u32> = built
    .tables()
    .field_rvas
    .rows()
    .iter()
    .map(|row| row.field().index() as u32)
    .collect();
  assert!(rvas.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn build_preserving_with_preserve_tokens_honors_original_rids() {
  let module = Rc::new(Module {
    name: "Preserved.dll".into(),
    original_rid: Cell::new(Some(1)),
    ..Default::default()
  });

  let kept = Rc::new(TypeDef {
    name: "Kept".into(),
    namespace: "N".into(),
    flags: TypeAttributes::PUBLIC,
    original_rid: Cell::new(Some(5)),
    ..Default::default()
  });
  module.type_defs.borrow_mut().push(kept.clone());

  let built = build::build_preserving(
    &module,
    BuildOptions::PRESERVE_TOKENS,
    Default::default(),
  )
  .unwrap();

  // `<Module>` always takes RID 1 regardless of preservation; `Kept`'s hint of 5 leaves three
  // placeholder rows ahead of it in the `TypeDef` table.
  assert_eq!(built.tables().type_defs.len(), 5);
  assert_eq!(built.tokens().type_defs.try_get(&kept), Some(5));
}

#[test]
fn into_bytes_round_trips_through_the_public_read_api() {
  let module = Rc::new(Module {
    name: "RoundTrip.dll".into(),
    ..Default::default()
  });
  let ty = Rc::new(TypeDef {
    name: "Widget".into(),
    namespace: "Acme".into(),
    flags: TypeAttributes::PUBLIC,
    ..Default::default()
  });
  module.type_defs.borrow_mut().push(ty);

  let built = build::build(&module).unwrap();
  let bytes = built.into_bytes("v4.0.30319");

  let reader = MetadataReader::from_bytes(&bytes).unwrap();
  let mut tables = None;
  let mut strings = None;

  for stream in reader.streams() {
    let stream = stream.unwrap();
    if let Some(t) = stream.as_tables() {
      tables = Some(t);
    }
    if let Some(s) = stream.as_strings() {
      strings = Some(s);
    }
  }

  let tables = tables.expect("metadata must carry a #~ stream");
  let strings = strings.expect("metadata must carry a #Strings stream");

  let names: Vec<_> = tables
    .type_defs()
    .into_iter()
    .map(|row| strings.get(row.name()).unwrap().to_str().unwrap().to_owned())
    .collect();

  assert_eq!(names, vec!["<Module>", "Widget"]);
}
