//! Encodes a [Constant] into the `(ElementType, blob)` pair `Constant` rows store (ECMA-335
//! §II.22.9).

use crate::bytes::ToBytes;
use crate::graph::module::{Constant, ConstantValue};
use crate::metadata::build::errors::Warning;
use crate::metadata::streams::blobs::{BlobId, BlobsHeapBuilder};
use crate::metadata::streams::tables::flags::ElementType;

/// Encodes `constant`, interning its blob into `blobs`.
///
/// `ElementType::Class` with a zero-length blob is how ECMA spells "the default value of a
/// reference type is null" (ECMA-335 §II.22.9 note); [ConstantValue::Null] produces exactly that.
///
/// The row is always written using `constant.value`'s own kind, since that's what a reader will
/// actually decode; `constant.declared_type` only ever affects whether a [Warning] comes back,
/// except when it names an `ElementType` this function cannot recognize at all (one that is
/// neither one of the twelve primitive kinds nor `Class`), in which case the row falls back to 8
/// zero bytes under the declared type verbatim, since there is no value kind to fall back to.
pub fn encode(
  constant: &Constant,
  blobs: &mut BlobsHeapBuilder,
) -> (ElementType, BlobId, Option<Warning>) {
  let value = &constant.value;
  let warning = mismatch_warning(constant.declared_type, value);

  if !is_recognized(constant.declared_type) {
    return (
      constant.declared_type,
      blobs.add(&[0u8; 8]),
      Some(Warning::ConstantTypeMismatch {
        declared: constant.declared_type,
      }),
    );
  }

  let mut bytes = std::vec::Vec::new();

  let kind = match value {
    ConstantValue::Boolean(v) => {
      (*v as u8).to_bytes(&mut bytes, ());
      ElementType::Boolean
    }
    ConstantValue::Char(v) => {
      v.to_bytes(&mut bytes, ());
      ElementType::Char
    }
    ConstantValue::I1(v) => {
      v.to_bytes(&mut bytes, ());
      ElementType::I1
    }
    ConstantValue::U1(v) => {
      v.to_bytes(&mut bytes, ());
      ElementType::U1
    }
    ConstantValue::I2(v) => {
      v.to_bytes(&mut bytes, ());
      ElementType::I2
    }
    ConstantValue::U2(v) => {
      v.to_bytes(&mut bytes, ());
      ElementType::U2
    }
    ConstantValue::I4(v) => {
      v.to_bytes(&mut bytes, ());
      ElementType::I4
    }
    ConstantValue::U4(v) => {
      v.to_bytes(&mut bytes, ());
      ElementType::U4
    }
    ConstantValue::I8(v) => {
      v.to_bytes(&mut bytes, ());
      ElementType::I8
    }
    ConstantValue::U8(v) => {
      v.to_bytes(&mut bytes, ());
      ElementType::U8
    }
    ConstantValue::R4(v) => {
      bytes.extend_from_slice(&v.to_le_bits().to_le_bytes());
      ElementType::R4
    }
    ConstantValue::R8(v) => {
      bytes.extend_from_slice(&v.to_le_bits().to_le_bytes());
      ElementType::R8
    }
    ConstantValue::String(s) => {
      for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
      }

      ElementType::String
    }
    ConstantValue::Null => ElementType::Class,
  };

  (kind, blobs.add(&bytes), warning)
}

/// `None` when `declared` agrees with `value`'s own kind, `Some` otherwise.
///
/// Only called once [is_recognized] has already confirmed `declared` is one of the kinds worth
/// comparing at all.
fn mismatch_warning(declared: ElementType, value: &ConstantValue) -> Option<Warning> {
  let matches = matches!(
    (declared, value),
    (ElementType::Boolean, ConstantValue::Boolean(_))
      | (ElementType::Char, ConstantValue::Char(_))
      | (ElementType::I1, ConstantValue::I1(_))
      | (ElementType::U1, ConstantValue::U1(_))
      | (ElementType::I2, ConstantValue::I2(_))
      | (ElementType::U2, ConstantValue::U2(_))
      | (ElementType::I4, ConstantValue::I4(_))
      | (ElementType::U4, ConstantValue::U4(_))
      | (ElementType::I8, ConstantValue::I8(_))
      | (ElementType::U8, ConstantValue::U8(_))
      | (ElementType::R4, ConstantValue::R4(_))
      | (ElementType::R8, ConstantValue::R8(_))
      | (ElementType::String, ConstantValue::String(_))
      | (ElementType::Class, ConstantValue::Null)
  );

  if matches {
    None
  } else {
    Some(Warning::ConstantTypeMismatch { declared })
  }
}

/// Whether `declared` is one of the twelve primitive kinds plus `String` and `Class`, the only
/// `ElementType`s a `Constant` row can actually carry (ECMA-335 §II.22.9).
fn is_recognized(declared: ElementType) -> bool {
  matches!(
    declared,
    ElementType::Boolean
      | ElementType::Char
      | ElementType::I1
      | ElementType::U1
      | ElementType::I2
      | ElementType::U2
      | ElementType::I4
      | ElementType::U4
      | ElementType::I8
      | ElementType::U8
      | ElementType::R4
      | ElementType::R8
      | ElementType::String
      | ElementType::Class
  )
}

trait ToLeBits {
  type Bits;
  fn to_le_bits(self) -> Self::Bits;
}

impl ToLeBits for f32 {
  type Bits = u32;
  fn to_le_bits(self) -> u32 {
    self.to_bits()
  }
}

impl ToLeBits for f64 {
  type Bits = u64;
  fn to_le_bits(self) -> u64 {
    self.to_bits()
  }
}
