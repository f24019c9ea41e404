//! Bit flags and enumerations used by columns of the `#~` tables (ECMA-335 §II.23.1).

use crate::bytes::bitflags;

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `TypeDef.Flags` (ECMA-335 §II.23.1.15).
  pub struct TypeAttributes: u32 {
    const VISIBILITY_MASK = 0x0000_0007;
    const NOT_PUBLIC = 0x0000_0000;
    const PUBLIC = 0x0000_0001;
    const NESTED_PUBLIC = 0x0000_0002;
    const NESTED_PRIVATE = 0x0000_0003;
    const NESTED_FAMILY = 0x0000_0004;
    const NESTED_ASSEMBLY = 0x0000_0005;
    const NESTED_FAM_AND_ASSEM = 0x0000_0006;
    const NESTED_FAM_OR_ASSEM = 0x0000_0007;

    const LAYOUT_MASK = 0x0000_0018;
    const AUTO_LAYOUT = 0x0000_0000;
    const SEQUENTIAL_LAYOUT = 0x0000_0008;
    const EXPLICIT_LAYOUT = 0x0000_0010;

    const CLASS_SEMANTICS_MASK = 0x0000_0020;
    const CLASS = 0x0000_0000;
    const INTERFACE = 0x0000_0020;

    const ABSTRACT = 0x0000_0080;
    const SEALED = 0x0000_0100;
    const SPECIAL_NAME = 0x0000_0400;

    const IMPORT = 0x0000_1000;
    const SERIALIZABLE = 0x0000_2000;

    const STRING_FORMAT_MASK = 0x0003_0000;
    const ANSI_CLASS = 0x0000_0000;
    const UNICODE_CLASS = 0x0001_0000;
    const AUTO_CLASS = 0x0002_0000;
    const CUSTOM_FORMAT_CLASS = 0x0003_0000;
    const CUSTOM_STRING_FORMAT_MASK = 0x00c0_0000;

    const BEFORE_FIELD_INIT = 0x0010_0000;

    const RT_SPECIAL_NAME = 0x0000_0800;
    const HAS_SECURITY = 0x0004_0000;
    const IS_TYPE_FORWARDER = 0x0020_0000;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `Field.Flags` (ECMA-335 §II.23.1.5).
  pub struct FieldAttributes: u16 {
    const FIELD_ACCESS_MASK = 0x0007;
    const COMPILER_CONTROLLED = 0x0000;
    const PRIVATE = 0x0001;
    const FAM_AND_ASSEM = 0x0002;
    const ASSEMBLY = 0x0003;
    const FAMILY = 0x0004;
    const FAM_OR_ASSEM = 0x0005;
    const PUBLIC = 0x0006;

    const STATIC = 0x0010;
    const INIT_ONLY = 0x0020;
    const LITERAL = 0x0040;
    const NOT_SERIALIZED = 0x0080;
    const SPECIAL_NAME = 0x0200;

    const PINVOKE_IMPL = 0x2000;

    const RT_SPECIAL_NAME = 0x0400;
    const HAS_FIELD_MARSHAL = 0x1000;
    const HAS_DEFAULT = 0x8000;
    const HAS_FIELD_RVA = 0x0100;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `MethodDef.Flags` (ECMA-335 §II.23.1.10).
  pub struct MethodAttributes: u16 {
    const MEMBER_ACCESS_MASK = 0x0007;
    const COMPILER_CONTROLLED = 0x0000;
    const PRIVATE = 0x0001;
    const FAM_AND_ASSEM = 0x0002;
    const ASSEM = 0x0003;
    const FAMILY = 0x0004;
    const FAM_OR_ASSEM = 0x0005;
    const PUBLIC = 0x0006;

    const STATIC = 0x0010;
    const FINAL = 0x0020;
    const VIRTUAL = 0x0040;
    const HIDE_BY_SIG = 0x0080;

    const VTABLE_LAYOUT_MASK = 0x0100;
    const REUSE_SLOT = 0x0000;
    const NEW_SLOT = 0x0100;

    const STRICT = 0x0200;
    const ABSTRACT = 0x0400;
    const SPECIAL_NAME = 0x0800;

    const PINVOKE_IMPL = 0x2000;
    const UNMANAGED_EXPORT = 0x0008;

    const RT_SPECIAL_NAME = 0x1000;
    const HAS_SECURITY = 0x4000;
    const REQUIRE_SEC_OBJECT = 0x8000;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `MethodDef.ImplFlags` (ECMA-335 §II.23.1.10).
  pub struct MethodImplAttributes: u16 {
    const CODE_TYPE_MASK = 0x0003;
    const IL = 0x0000;
    const NATIVE = 0x0001;
    const OPTIL = 0x0002;
    const RUNTIME = 0x0003;

    const MANAGED_MASK = 0x0004;
    const UNMANAGED = 0x0004;
    const MANAGED = 0x0000;

    const FORWARD_REF = 0x0010;
    const PRESERVE_SIG = 0x0080;
    const INTERNAL_CALL = 0x1000;
    const SYNCHRONIZED = 0x0020;
    const NO_INLINING = 0x0008;
    const MAX_METHOD_IMPL_VAL = 0xffff;
    const NO_OPTIMIZATION = 0x0040;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `Param.Flags` (ECMA-335 §II.23.1.13).
  pub struct ParamAttributes: u16 {
    const IN = 0x0001;
    const OUT = 0x0002;
    const OPTIONAL = 0x0010;
    const HAS_DEFAULT = 0x1000;
    const HAS_FIELD_MARSHAL = 0x2000;
    const UNUSED = 0xcfe0;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `Event.EventFlags` (ECMA-335 §II.23.1.4).
  pub struct EventAttributes: u16 {
    const SPECIAL_NAME = 0x0200;
    const RT_SPECIAL_NAME = 0x0400;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `Property.Flags` (ECMA-335 §II.23.1.14).
  pub struct PropertyAttributes: u16 {
    const SPECIAL_NAME = 0x0200;
    const RT_SPECIAL_NAME = 0x0400;
    const HAS_DEFAULT = 0x1000;
    const UNUSED = 0xe9ff;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `ImplMap.MappingFlags` (ECMA-335 §II.23.1.8).
  pub struct PInvokeAttributes: u16 {
    const NO_MANGLE = 0x0001;

    const CHAR_SET_MASK = 0x0006;
    const CHAR_SET_NOT_SPEC = 0x0000;
    const CHAR_SET_ANSI = 0x0002;
    const CHAR_SET_UNICODE = 0x0004;
    const CHAR_SET_AUTO = 0x0006;

    const SUPPORTS_LAST_ERROR = 0x0040;

    const CALL_CONV_MASK = 0x0700;
    const CALL_CONV_WINAPI = 0x0100;
    const CALL_CONV_CDECL = 0x0200;
    const CALL_CONV_STDCALL = 0x0300;
    const CALL_CONV_THISCALL = 0x0400;
    const CALL_CONV_FASTCALL = 0x0500;

    const BEST_FIT_MASK = 0x0030;
    const BEST_FIT_ENABLED = 0x0010;
    const BEST_FIT_DISABLED = 0x0020;

    const THROW_ON_UNMAPPABLE_MASK = 0x3000;
    const THROW_ON_UNMAPPABLE_ENABLED = 0x1000;
    const THROW_ON_UNMAPPABLE_DISABLED = 0x2000;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `ManifestResource.Flags` (ECMA-335 §II.23.1.9).
  pub struct ManifestResourceAttributes: u32 {
    const VISIBILITY_MASK = 0x0000_0007;
    const PUBLIC = 0x0000_0001;
    const PRIVATE = 0x0000_0002;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `GenericParam.Flags` (ECMA-335 §II.23.1.7).
  pub struct GenericParamAttributes: u16 {
    const VARIANCE_MASK = 0x0003;
    const NONE = 0x0000;
    const COVARIANT = 0x0001;
    const CONTRAVARIANT = 0x0002;

    const SPECIAL_CONSTRAINT_MASK = 0x001c;
    const REFERENCE_TYPE_CONSTRAINT = 0x0004;
    const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT = 0x0008;
    const DEFAULT_CONSTRUCTOR_CONSTRAINT = 0x0010;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `MethodSemantics.Semantics` (ECMA-335 §II.23.1.12).
  pub struct MethodSemanticsAttributes: u16 {
    const SETTER = 0x0001;
    const GETTER = 0x0002;
    const OTHER = 0x0004;
    const ADD_ON = 0x0008;
    const REMOVE_ON = 0x0010;
    const FIRE = 0x0020;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `File.Flags` (ECMA-335 §II.23.1.6).
  pub struct FileAttributes: u32 {
    const CONTAINS_METADATA = 0x0000_0000;
    const CONTAINS_NO_METADATA = 0x0000_0001;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// `Assembly.Flags` (ECMA-335 §II.23.1.2).
  pub struct AssemblyFlags: u32 {
    const PUBLIC_KEY = 0x0000_0001;
    const RETARGETABLE = 0x0000_0100;
    const DISABLE_JIT_COMPILE_OPTIMIZER = 0x0000_4000;
    const ENABLE_JIT_COMPILE_TRACKING = 0x0000_8000;
  }
}

/// `Assembly.HashAlgId` (ECMA-335 §II.23.1.1).
///
/// Not a bit flag; it's a closed set of algorithm identifiers, so this is a plain enum instead of
/// going through the [bitflags] macro.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyHashAlgorithm {
  None = 0x0000_0000,
  Md5 = 0x0000_8003,
  Sha1 = 0x0000_8004,
}

impl Default for AssemblyHashAlgorithm {
  fn default() -> Self {
    Self::None
  }
}

impl AssemblyHashAlgorithm {
  fn from_u32(val: u32) -> Option<Self> {
    match val {
      0x0000_0000 => Some(Self::None),
      0x0000_8003 => Some(Self::Md5),
      0x0000_8004 => Some(Self::Sha1),
      _ => None,
    }
  }
}

#[cfg(feature = "read")]
impl crate::bytes::FromBytes<'_, ()> for AssemblyHashAlgorithm {
  fn from_bytes(buf: &[u8], offset: &mut usize, _: ()) -> Option<Self> {
    use crate::bytes::ByteSliceExt;

    Self::from_u32(buf.read::<u32>(offset)?)
  }
}

impl crate::bytes::ByteSize<()> for AssemblyHashAlgorithm {
  fn byte_size(_: ()) -> usize {
    core::mem::size_of::<u32>()
  }
}

#[cfg(feature = "write")]
impl crate::bytes::ToBytes<()> for AssemblyHashAlgorithm {
  fn to_bytes(&self, out: &mut std::vec::Vec<u8>, _: ()) {
    use crate::bytes::ToBytes;

    (*self as u32).to_bytes(out, ());
  }
}

/// The `ELEMENT_TYPE_*` constants used by signature blobs and `Constant.Type` (ECMA-335 §II.23.1.16).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
  End = 0x00,
  Void = 0x01,
  Boolean = 0x02,
  Char = 0x03,
  I1 = 0x04,
  U1 = 0x05,
  I2 = 0x06,
  U2 = 0x07,
  I4 = 0x08,
  U4 = 0x09,
  I8 = 0x0a,
  U8 = 0x0b,
  R4 = 0x0c,
  R8 = 0x0d,
  String = 0x0e,
  Ptr = 0x0f,
  ByRef = 0x10,
  ValueType = 0x11,
  Class = 0x12,
  Var = 0x13,
  Array = 0x14,
  GenericInst = 0x15,
  TypedByRef = 0x16,
  I = 0x18,
  U = 0x19,
  FnPtr = 0x1b,
  Object = 0x1c,
  SzArray = 0x1d,
  MVar = 0x1e,
  CModReqd = 0x1f,
  CModOpt = 0x20,
  Internal = 0x21,
  Modifier = 0x40,
  Sentinel = 0x41,
  Pinned = 0x45,
}

impl ElementType {
  fn from_u8(val: u8) -> Option<Self> {
    match val {
      0x00 => Some(Self::End),
      0x01 => Some(Self::Void),
      0x02 => Some(Self::Boolean),
      0x03 => Some(Self::Char),
      0x04 => Some(Self::I1),
      0x05 => Some(Self::U1),
      0x06 => Some(Self::I2),
      0x07 => Some(Self::U2),
      0x08 => Some(Self::I4),
      0x09 => Some(Self::U4),
      0x0a => Some(Self::I8),
      0x0b => Some(Self::U8),
      0x0c => Some(Self::R4),
      0x0d => Some(Self::R8),
      0x0e => Some(Self::String),
      0x0f => Some(Self::Ptr),
      0x10 => Some(Self::ByRef),
      0x11 => Some(Self::ValueType),
      0x12 => Some(Self::Class),
      0x13 => Some(Self::Var),
      0x14 => Some(Self::Array),
      0x15 => Some(Self::GenericInst),
      0x16 => Some(Self::TypedByRef),
      0x18 => Some(Self::I),
      0x19 => Some(Self::U),
      0x1b => Some(Self::FnPtr),
      0x1c => Some(Self::Object),
      0x1d => Some(Self::SzArray),
      0x1e => Some(Self::MVar),
      0x1f => Some(Self::CModReqd),
      0x20 => Some(Self::CModOpt),
      0x21 => Some(Self::Internal),
      0x40 => Some(Self::Modifier),
      0x41 => Some(Self::Sentinel),
      0x45 => Some(Self::Pinned),
      _ => None,
    }
  }
}

#[cfg(feature = "read")]
impl crate::bytes::FromBytes<'_, ()> for ElementType {
  fn from_bytes(buf: &[u8], offset: &mut usize, _: ()) -> Option<Self> {
    use crate::bytes::ByteSliceExt;

    Self::from_u8(buf.read::<u8>(offset)?)
  }
}

impl crate::bytes::ByteSize<()> for ElementType {
  fn byte_size(_: ()) -> usize {
    core::mem::size_of::<u8>()
  }
}

#[cfg(feature = "write")]
impl crate::bytes::ToBytes<()> for ElementType {
  fn to_bytes(&self, out: &mut std::vec::Vec<u8>, _: ()) {
    use crate::bytes::ToBytes;

    (*self as u8).to_bytes(out, ());
  }
}
