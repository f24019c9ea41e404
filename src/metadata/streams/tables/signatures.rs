//! Encodes [crate::graph::signature] types into the compressed signature blobs tables store
//! (ECMA-335 §II.23.2).

#[cfg(feature = "read")]
#[doc(inline)]
pub use read::*;
#[cfg(feature = "write")]
#[doc(inline)]
pub use write::*;

#[cfg(feature = "read")]
#[doc(hidden)]
mod read {}

#[cfg(feature = "write")]
#[doc(hidden)]
mod write {
  use crate::bytes::write_compressed_u32;
  use crate::graph::reference::TypeDefOrRefEntity;
  use crate::graph::signature::{CallingConvention, FieldSig, MethodSig, PropertySig, TypeSig};
  use crate::metadata::streams::tables::flags::ElementType;
  use std::vec::Vec;

  /// `PROPERTY` (ECMA-335 §II.23.2.5), OR'd with `HASTHIS` for an instance property.
  const PROPERTY: u8 = 0x08;
  const HAS_THIS: u8 = 0x20;
  const EXPLICIT_THIS: u8 = 0x40;
  const GENERIC: u8 = 0x10;
  const VAR_ARG: u8 = 0x05;

  fn push(out: &mut Vec<u8>, ty: ElementType) {
    out.push(ty as u8);
  }

  /// Appends the compressed encoding of `ty` to `out`, resolving any embedded `TypeDefOrRef` with
  /// `resolve`.
  pub fn encode_type(
    out: &mut Vec<u8>,
    ty: &TypeSig,
    resolve: &impl Fn(&TypeDefOrRefEntity) -> u32,
  ) {
    match ty {
      TypeSig::Void => push(out, ElementType::Void),
      TypeSig::Boolean => push(out, ElementType::Boolean),
      TypeSig::Char => push(out, ElementType::Char),
      TypeSig::I1 => push(out, ElementType::I1),
      TypeSig::U1 => push(out, ElementType::U1),
      TypeSig::I2 => push(out, ElementType::I2),
      TypeSig::U2 => push(out, ElementType::U2),
      TypeSig::I4 => push(out, ElementType::I4),
      TypeSig::U4 => push(out, ElementType::U4),
      TypeSig::I8 => push(out, ElementType::I8),
      TypeSig::U8 => push(out, ElementType::U8),
      TypeSig::R4 => push(out, ElementType::R4),
      TypeSig::R8 => push(out, ElementType::R8),
      TypeSig::String => push(out, ElementType::String),
      TypeSig::Object => push(out, ElementType::Object),
      TypeSig::IntPtr => push(out, ElementType::I),
      TypeSig::UIntPtr => push(out, ElementType::U),
      TypeSig::ValueType(entity) => {
        push(out, ElementType::ValueType);
        write_compressed_u32(out, resolve(entity));
      }
      TypeSig::Class(entity) => {
        push(out, ElementType::Class);
        write_compressed_u32(out, resolve(entity));
      }
      TypeSig::SzArray(elem) => {
        push(out, ElementType::SzArray);
        encode_type(out, elem, resolve);
      }
      TypeSig::ByRef(elem) => {
        push(out, ElementType::ByRef);
        encode_type(out, elem, resolve);
      }
      TypeSig::Ptr(elem) => {
        push(out, ElementType::Ptr);
        encode_type(out, elem, resolve);
      }
      TypeSig::Var(n) => {
        push(out, ElementType::Var);
        write_compressed_u32(out, *n);
      }
      TypeSig::MVar(n) => {
        push(out, ElementType::MVar);
        write_compressed_u32(out, *n);
      }
      TypeSig::GenericInst {
        is_value_type,
        generic_type,
        args,
      } => {
        push(out, ElementType::GenericInst);
        push(
          out,
          if *is_value_type {
            ElementType::ValueType
          } else {
            ElementType::Class
          },
        );
        write_compressed_u32(out, resolve(generic_type));
        write_compressed_u32(out, args.len() as u32);

        for arg in args {
          encode_type(out, arg, resolve);
        }
      }
    }
  }

  /// Encodes a `MethodDefSig`/`MethodRefSig` (ECMA-335 §II.23.2.1/§II.23.2.2).
  pub fn encode_method_sig(
    sig: &MethodSig,
    resolve: &impl Fn(&TypeDefOrRefEntity) -> u32,
  ) -> Vec<u8> {
    let mut out = Vec::new();

    let mut conv = match sig.calling_convention {
      CallingConvention::Default => 0,
      CallingConvention::VarArg => VAR_ARG,
      CallingConvention::Generic => GENERIC,
    };

    if sig.has_this {
      conv |= HAS_THIS;
    }

    if sig.explicit_this {
      conv |= EXPLICIT_THIS;
    }

    out.push(conv);

    if sig.calling_convention == CallingConvention::Generic {
      write_compressed_u32(&mut out, sig.generic_param_count);
    }

    write_compressed_u32(&mut out, sig.params.len() as u32);
    encode_type(&mut out, &sig.ret, resolve);

    for param in &sig.params {
      encode_type(&mut out, param, resolve);
    }

    out
  }

  /// Encodes a `FieldSig` (ECMA-335 §II.23.2.4).
  pub fn encode_field_sig(
    sig: &FieldSig,
    resolve: &impl Fn(&TypeDefOrRefEntity) -> u32,
  ) -> Vec<u8> {
    let mut out = std::vec![0x06];

    encode_type(&mut out, &sig.ty, resolve);

    out
  }

  /// Encodes a `PropertySig` (ECMA-335 §II.23.2.5).
  pub fn encode_property_sig(
    sig: &PropertySig,
    resolve: &impl Fn(&TypeDefOrRefEntity) -> u32,
  ) -> Vec<u8> {
    let mut out = Vec::new();
    let mut header = PROPERTY;

    if sig.has_this {
      header |= HAS_THIS;
    }

    out.push(header);
    write_compressed_u32(&mut out, sig.params.len() as u32);
    encode_type(&mut out, &sig.ty, resolve);

    for param in &sig.params {
      encode_type(&mut out, param, resolve);
    }

    out
  }
}
