use super::rows::*;
use super::table::Row;
use crate::bytes::ByteSize;
use crate::metadata::headers::MetadataTablesHeader;
use core::fmt;
use core::marker::PhantomData;
#[cfg(feature = "read")]
#[doc(inline)]
pub use read::*;
#[cfg(feature = "write")]
#[doc(inline)]
pub use write::*;

/// A handle to a row in a table with the given row type.
#[repr(transparent)]
pub struct RowId<R> {
  row: PhantomData<R>,
  index: usize,
}

impl<R> RowId<R> {
  /// Creates a new [RowId] with the given index.
  #[inline]
  pub(crate) fn new(index: usize) -> Self {
    Self {
      row: PhantomData,
      index,
    }
  }

  /// Returns the index of the row.
  #[inline]
  pub fn index(self) -> usize {
    self.index
  }

  /// Returns the next row id.
  #[inline]
  pub fn next(self) -> Self {
    Self::new(self.index.saturating_add(1))
  }

  /// Creates a [RowId] holding the given 1-based RID, or `0` meaning "none".
  ///
  /// This is the constructor table builders use: the stored `index` becomes the literal on-disk
  /// column value, matching ECMA-335's own 1-based-RID-with-zero-meaning-none convention.
  #[cfg(feature = "write")]
  pub(crate) fn from_rid(rid: u32) -> Self {
    Self::new(rid as usize)
  }

  /// Returns the RID this id holds, or `0` if it is the null id.
  #[cfg(feature = "write")]
  pub(crate) fn rid(self) -> u32 {
    self.index as u32
  }
}

impl<R> Clone for RowId<R> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<R> Copy for RowId<R> {}

impl<R> fmt::Debug for RowId<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("RowId").field(&self.index).finish()
  }
}

impl<R> PartialEq for RowId<R> {
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    self.index == other.index
  }
}

impl<R> Eq for RowId<R> {}

/// Defines a metadata coded id type.
macro_rules! coded_id {
  (
    $(#[$attr:meta])*
    enum $name:ident : $bits:literal {
      $(#[$first_variant_attr:meta])*
      $first_variant:ident($first_table:ident) = $first_tag:literal
      $(
        ,
        $(#[$variant_attr:meta])*
        $variant:ident($table:ident) = $tag:literal
      )* $(,)?
    }
  ) => {
    $(#[$attr])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum $name {
      $(#[$first_variant_attr])*
      $first_variant(RowId<$first_table>),
      $(
        $(#[$variant_attr])*
        $variant(RowId<$table>)
      ),*
    }

    impl $name {
      /// Creates a coded id from the given coded id value and [MetadataTablesHeader].
      ///
      /// Returns `None` if the index is out of bounds.
      #[inline]
      pub fn from_tag(val: usize) -> Option<Self> {
        let tag = val & ((1 << $bits) - 1);
        let index = val >> $bits;

        match tag {
          $first_tag => Some(Self::$first_variant(RowId::new(index))),
          $(
            $tag => Some(Self::$variant(RowId::new(index))),
          )*
          _ => None
        }
      }

      /// Packs this coded id into its `(rid << tag_bits) | tag` wire representation.
      #[cfg(feature = "write")]
      pub(crate) fn encode(self) -> u32 {
        match self {
          Self::$first_variant(id) => (id.rid() << $bits) | $first_tag,
          $(
            Self::$variant(id) => (id.rid() << $bits) | $tag,
          )*
        }
      }

      /// Returns the coded id representing "no reference" (rid `0`, tag of the first variant).
      ///
      /// Used as a placeholder when filling gaps in preserving builds; which tag is used doesn't
      /// matter since a `0` rid is never a valid reference regardless of which table it names.
      #[cfg(feature = "write")]
      pub(crate) fn none() -> Self {
        Self::$first_variant(RowId::new(0))
      }
    }

    impl $crate::bytes::ByteSize<&$crate::metadata::headers::MetadataTablesHeader> for $name {
      fn byte_size(header: &$crate::metadata::headers::MetadataTablesHeader) -> usize {
        use $crate::metadata::streams::tables::table::Row;

        if header.rows[$first_table::ID] as u32 >= (1u32 << (16 - $bits)) {
          return 4;
        }

        $(
          if header.rows[$table::ID] as u32 >= (1u32 << (16 - $bits)) {
            return 4;
          }
        )*

        2
      }
    }

    #[cfg(feature = "read")]
    impl $crate::bytes::FromBytes<'_, &$crate::metadata::headers::MetadataTablesHeader> for $name {
      fn from_bytes(buf: &[u8], offset: &mut usize, header: &$crate::metadata::headers::MetadataTablesHeader) -> Option<Self> {
        use $crate::bytes::{ByteSize, ByteSliceExt};

        let tag = match Self::byte_size(header) {
          4 => buf.read::<u32>(offset)? as usize,
          2 => buf.read::<u16>(offset)? as usize,
          _ => unreachable!(),
        };

        Self::from_tag(tag)
      }
    }

    #[cfg(feature = "write")]
    impl $crate::bytes::ToBytes<&$crate::metadata::headers::MetadataTablesHeader> for $name {
      fn to_bytes(&self, out: &mut std::vec::Vec<u8>, header: &$crate::metadata::headers::MetadataTablesHeader) {
        use $crate::bytes::ByteSize;

        match Self::byte_size(header) {
          4 => (self.encode()).to_bytes(out, ()),
          2 => (self.encode() as u16).to_bytes(out, ()),
          _ => unreachable!(),
        }
      }
    }
  };
}

coded_id! {
  enum TypeDefOrRef : 2 {
    TypeDef(TypeDefRow) = 0,
    TypeRef(TypeRefRow) = 1,
    TypeSpec(TypeSpecRow) = 2
  }
}

coded_id! {
  enum HasConstant : 2 {
    Field(FieldRow) = 0,
    Param(ParamRow) = 1,
    Property(PropertyRow) = 2
  }
}

coded_id! {
  enum HasCustomAttribute : 5 {
    MethodDef(MethodDefRow) = 0,
    Field(FieldRow) = 1,
    TypeRef(TypeRefRow) = 2,
    TypeDef(TypeDefRow) = 3,
    Param(ParamRow) = 4,
    InterfaceImpl(InterfaceImplRow) = 5,
    MemberRef(MemberRefRow) = 6,
    Module(ModuleRow) = 7,
    DeclSecurity(DeclSecurityRow) = 8,
    Property(PropertyRow) = 9,
    Event(EventRow) = 10,
    StandAloneSig(StandAloneSigRow) = 11,
    ModuleRef(ModuleRefRow) = 12,
    TypeSpec(TypeSpecRow) = 13,
    Assembly(AssemblyRow) = 14,
    AssemblyRef(AssemblyRefRow) = 15,
    File(FileRow) = 16,
    ExportedType(ExportedTypeRow) = 17,
    ManifestResource(ManifestResourceRow) = 18,
    GenericParam(GenericParamRow) = 19,
    GenericParamConstraint(GenericParamConstraintRow) = 20,
    MethodSpec(MethodSpecRow) = 21
  }
}

coded_id! {
  enum HasFieldMarshal : 1 {
    Field(FieldRow) = 0,
    Param(ParamRow) = 1
  }
}

coded_id! {
  enum HasDeclSecurity : 2 {
    TypeDef(TypeDefRow) = 0,
    MethodDef(MethodDefRow) = 1,
    Assembly(AssemblyRow) = 2
  }
}

coded_id! {
  enum MemberRefParent : 3 {
    TypeDef(TypeDefRow) = 0,
    TypeRef(TypeRefRow) = 1,
    ModuleRef(ModuleRefRow) = 2,
    MethodDef(MethodDefRow) = 3,
    TypeSpec(TypeSpecRow) = 4
  }
}

coded_id! {
  enum HasSemantics : 1 {
    Event(EventRow) = 0,
    Property(PropertyRow) = 1
  }
}

coded_id! {
  enum MethodDefOrRef : 1 {
    MethodDef(MethodDefRow) = 0,
    MemberRef(MemberRefRow) = 1
  }
}

coded_id! {
  enum MemberForwarded : 1 {
    Field(FieldRow) = 0,
    MethodDef(MethodDefRow) = 1
  }
}

coded_id! {
  enum Implementation : 2 {
    File(FileRow) = 0,
    AssemblyRef(AssemblyRefRow) = 1,
    ExportedType(ExportedTypeRow) = 2
  }
}

coded_id! {
  enum CustomAttributeType : 3 {
    MethodDef(MethodDefRow) = 2,
    MemberRef(MemberRefRow) = 3
  }
}

coded_id! {
  enum ResolutionScope : 2 {
    Module(ModuleRow) = 0,
    ModuleRef(ModuleRefRow) = 1,
    AssemblyRef(AssemblyRefRow) = 2,
    TypeRef(TypeRefRow) = 3
  }
}

coded_id! {
  enum TypeOrMethodDef : 1 {
    TypeDef(TypeDefRow) = 0,
    MethodDef(MethodDefRow) = 1
  }
}

impl<R: Row> ByteSize<&MetadataTablesHeader> for RowId<R> {
  fn byte_size(header: &MetadataTablesHeader) -> usize {
    match (header.rows[R::ID] as usize) < (1 << 16) {
      true => 2,
      false => 4,
    }
  }
}

#[cfg(feature = "read")]
#[doc(hidden)]
mod read {
  use super::RowId;
  use crate::bytes::{ByteSize, ByteSliceExt, FromBytes};
  use crate::metadata::headers::MetadataTablesHeader;
  use crate::metadata::streams::tables::table::Row;

  impl<R: Row> FromBytes<'_, &MetadataTablesHeader> for RowId<R> {
    fn from_bytes(buf: &[u8], offset: &mut usize, header: &MetadataTablesHeader) -> Option<Self> {
      Some(Self::new(match Self::byte_size(header) {
        2 => buf.read::<u16>(offset)? as usize,
        4 => buf.read::<u32>(offset)? as usize,
        _ => unreachable!(),
      }))
    }
  }
}

#[cfg(feature = "write")]
#[doc(hidden)]
mod write {
  use super::RowId;
  use crate::bytes::{ByteSize, ToBytes};
  use crate::metadata::headers::MetadataTablesHeader;
  use crate::metadata::streams::tables::table::Row;

  impl<R: Row> ToBytes<&MetadataTablesHeader> for RowId<R> {
    fn to_bytes(&self, out: &mut std::vec::Vec<u8>, header: &MetadataTablesHeader) {
      match Self::byte_size(header) {
        2 => (self.index as u16).to_bytes(out, ()),
        4 => (self.index as u32).to_bytes(out, ()),
        _ => unreachable!(),
      }
    }
  }
}
