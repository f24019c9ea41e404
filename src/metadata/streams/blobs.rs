//! The `#Blob` metadata stream.

#[cfg(feature = "read")]
#[doc(inline)]
pub use read::*;
#[cfg(feature = "write")]
#[doc(inline)]
pub use write::*;

/// A handle to a blob of bytes in the `#Blob` metadata stream.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobId(usize);

impl BlobId {
  /// The id meaning "no blob", used when synthesizing placeholder rows.
  #[cfg(feature = "write")]
  pub(crate) fn none() -> Self {
    Self(0)
  }
}

impl crate::bytes::ByteSize<crate::metadata::headers::HeapSizes> for BlobId {
  #[inline]
  fn byte_size(heap_sizes: crate::metadata::headers::HeapSizes) -> usize {
    match heap_sizes.contains(crate::metadata::headers::HeapSizes::WIDE_BLOB_HEAP) {
      true => 4,
      false => 2,
    }
  }
}

#[cfg(feature = "read")]
#[doc(hidden)]
mod read {
  use super::BlobId;
  use crate::bytes::{ByteSize, ByteSliceExt, CompressedLength, FromBytes};
  use crate::metadata::headers::HeapSizes;
  use core::fmt;

  /// The `#Blob` heap.
  ///
  /// Contains blobs of bytes prefixed with a variable length integer indicating the length of the
  /// blob.
  #[repr(transparent)]
  #[derive(Default, Clone, Copy)]
  pub struct BlobsHeap<'a>(pub(crate) &'a [u8]);

  impl<'a> BlobsHeap<'a> {
    /// Returns the guid at the given [BlobId].
    ///
    /// Will return `None` if the given id is out of bounds.
    pub fn get(&self, id: BlobId) -> Option<&'a [u8]> {
      let mut offset = id.0;

      let len = self.0.read_with(&mut offset, CompressedLength)?;
      let data = self.0.read_with(&mut offset, len)?;

      Some(data)
    }
  }

  impl fmt::Debug for BlobsHeap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple("BlobsHeap").finish()
    }
  }

  impl FromBytes<'_, HeapSizes> for BlobId {
    #[inline]
    fn from_bytes(buf: &[u8], offset: &mut usize, heap_sizes: HeapSizes) -> Option<Self> {
      Some(Self(match Self::byte_size(heap_sizes) {
        4 => buf.read::<u32>(offset)? as _,
        2 => buf.read::<u16>(offset)? as _,
        _ => unreachable!(),
      }))
    }
  }
}

#[cfg(feature = "write")]
#[doc(hidden)]
mod write {
  use super::BlobId;
  use crate::bytes::{write_compressed_u32, ByteSize, ToBytes};
  use crate::metadata::headers::HeapSizes;
  use std::collections::HashMap;
  use std::vec::Vec;

  impl ToBytes<HeapSizes> for BlobId {
    fn to_bytes(&self, out: &mut Vec<u8>, heap_sizes: HeapSizes) {
      match Self::byte_size(heap_sizes) {
        2 => (self.0 as u16).to_bytes(out, ()),
        4 => (self.0 as u32).to_bytes(out, ()),
        _ => unreachable!(),
      }
    }
  }

  /// Builds a `#Blob` heap.
  ///
  /// Byte `0` is always the zero-length blob, matching the convention that a `BlobId` of `0` means
  /// "no blob". Identical blobs are deduplicated against everything added through this builder,
  /// the same way the `#Strings` heap builder interns identical strings.
  pub struct BlobsHeapBuilder {
    bytes: Vec<u8>,
    interned: HashMap<Vec<u8>, BlobId>,
  }

  impl Default for BlobsHeapBuilder {
    fn default() -> Self {
      Self {
        bytes: std::vec![0],
        interned: HashMap::new(),
      }
    }
  }

  impl BlobsHeapBuilder {
    /// Seeds this builder from the raw bytes of a preserved `#Blob` heap.
    ///
    /// New blobs are appended after `preserved` verbatim; unlike the `#Strings` heap builder, no
    /// attempt is made to match new `add` calls against blobs already present in `preserved`,
    /// since a preserved heap's compressed-length prefixes would need to be re-parsed to recover
    /// blob boundaries.
    pub fn with_preserved(preserved: &[u8]) -> Self {
      Self {
        bytes: preserved.to_vec(),
        interned: HashMap::new(),
      }
    }

    /// Appends `data`, prefixed with its ECMA §II.23.2 compressed length, returning its id.
    ///
    /// Returns `BlobId(0)` for empty data without touching the heap. Returns the existing id if
    /// `data` was already added through this builder.
    pub fn add(&mut self, data: &[u8]) -> BlobId {
      if data.is_empty() {
        return BlobId(0);
      }

      if let Some(id) = self.interned.get(data) {
        return *id;
      }

      let id = BlobId(self.bytes.len());

      write_compressed_u32(&mut self.bytes, data.len() as u32);
      self.bytes.extend_from_slice(data);
      self.interned.insert(data.to_vec(), id);

      id
    }

    /// The number of bytes the heap currently occupies.
    pub fn len(&self) -> usize {
      self.bytes.len()
    }

    /// Whether the heap contains nothing but the mandatory leading nul.
    pub fn is_empty(&self) -> bool {
      self.bytes.len() <= 1
    }

    /// Consumes the builder, returning the final heap bytes.
    pub fn into_bytes(self) -> Vec<u8> {
      self.bytes
    }
  }
}
