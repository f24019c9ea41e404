//! Signature data for fields, methods, and type specs (ECMA-335 §II.23.2).
//!
//! These types describe a signature the way a caller building a module graph thinks about it;
//! [crate::metadata::streams::tables::signatures] turns them into the compressed blob bytes ECMA
//! actually stores.

use crate::graph::reference::TypeDefOrRefEntity;

/// A type as it appears inside a signature blob (ECMA-335 §II.23.2.12, `Type`).
#[derive(Debug, Clone)]
pub enum TypeSig {
  Void,
  Boolean,
  Char,
  I1,
  U1,
  I2,
  U2,
  I4,
  U4,
  I8,
  U8,
  R4,
  R8,
  String,
  Object,
  IntPtr,
  UIntPtr,
  /// A reference to a value type (`ELEMENT_TYPE_VALUETYPE` followed by a coded `TypeDefOrRef`).
  ValueType(TypeDefOrRefEntity),
  /// A reference to a reference type (`ELEMENT_TYPE_CLASS` followed by a coded `TypeDefOrRef`).
  Class(TypeDefOrRefEntity),
  SzArray(Box<TypeSig>),
  ByRef(Box<TypeSig>),
  Ptr(Box<TypeSig>),
  /// A reference to the `n`th generic parameter of the enclosing type (`ELEMENT_TYPE_VAR`).
  Var(u32),
  /// A reference to the `n`th generic parameter of the enclosing method (`ELEMENT_TYPE_MVAR`).
  MVar(u32),
  /// An instantiation of a generic type with the given arguments (`ELEMENT_TYPE_GENERICINST`).
  GenericInst {
    is_value_type: bool,
    generic_type: TypeDefOrRefEntity,
    args: std::vec::Vec<TypeSig>,
  },
}

/// The calling convention bits of a method signature (ECMA-335 §II.23.2.1/§II.15.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
  Default,
  VarArg,
  /// Signature carries a leading generic parameter count (`GENERICINST`).
  Generic,
}

/// A `MethodDefSig` or `MethodRefSig` (ECMA-335 §II.23.2.1/§II.23.2.2).
#[derive(Debug, Clone)]
pub struct MethodSig {
  pub has_this: bool,
  pub explicit_this: bool,
  pub calling_convention: CallingConvention,
  /// Count of generic parameters; only meaningful when `calling_convention` is `Generic`.
  pub generic_param_count: u32,
  pub params: std::vec::Vec<TypeSig>,
  pub ret: TypeSig,
}

/// A `FieldSig` (ECMA-335 §II.23.2.4): just the field's type, prefixed by `0x06` on the wire.
#[derive(Debug, Clone)]
pub struct FieldSig {
  pub ty: TypeSig,
}

/// A `PropertySig` (ECMA-335 §II.23.2.5).
#[derive(Debug, Clone)]
pub struct PropertySig {
  pub has_this: bool,
  pub params: std::vec::Vec<TypeSig>,
  pub ty: TypeSig,
}
