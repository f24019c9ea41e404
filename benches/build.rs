use criterion::{criterion_group, criterion_main, Criterion};
use metacore::graph::module::{Field, Method, Module, TypeDef};
use metacore::graph::signature::{CallingConvention, FieldSig, MethodSig, TypeSig};
use metacore::metadata::build;
use metacore::metadata::streams::tables::flags::{FieldAttributes, MethodAttributes, TypeAttributes};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A module with `count` types, each carrying one field and one parameterless method, roughly the
/// shape of a small generated assembly.
fn module_with_types(count: usize) -> Rc<Module> {
  let module = Rc::new(Module {
    name: "Bench.dll".into(),
    ..Default::default()
  });

  for i in 0..count {
    let ty = Rc::new(TypeDef {
      name: format!("Type{i}"),
      namespace: "Bench".into(),
      flags: TypeAttributes::PUBLIC,
      ..Default::default()
    });

    ty.fields.borrow_mut().push(Rc::new(Field {
      name: "value".into(),
      flags: FieldAttributes::PRIVATE,
      signature: FieldSig { ty: TypeSig::I4 },
      declaring_type: Rc::downgrade(&ty),
      original_rid: Cell::new(None),
      constant: RefCell::new(None),
      marshal: RefCell::new(None),
      rva: RefCell::new(None),
      layout_offset: RefCell::new(None),
      custom_attributes: RefCell::new(Vec::new()),
    }));

    ty.methods.borrow_mut().push(Rc::new(Method {
      name: "GetValue".into(),
      flags: MethodAttributes::PUBLIC,
      impl_flags: Default::default(),
      signature: MethodSig {
        has_this: true,
        explicit_this: false,
        calling_convention: CallingConvention::Default,
        generic_param_count: 0,
        params: Vec::new(),
        ret: TypeSig::I4,
      },
      declaring_type: Rc::downgrade(&ty),
      original_rid: Cell::new(None),
      params: RefCell::new(Vec::new()),
      generic_params: RefCell::new(Vec::new()),
      rva: RefCell::new(None),
      pinvoke: RefCell::new(None),
      overrides: RefCell::new(Vec::new()),
      custom_attributes: RefCell::new(Vec::new()),
      security: RefCell::new(Vec::new()),
    }));

    module.type_defs.borrow_mut().push(ty);
  }

  module
}

fn bench_build(c: &mut Criterion) {
  let small = module_with_types(8);
  let large = module_with_types(512);

  c.bench_function("build 8 types", |b| b.iter(|| build::build(&small).unwrap()));
  c.bench_function("build 512 types", |b| b.iter(|| build::build(&large).unwrap()));
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
