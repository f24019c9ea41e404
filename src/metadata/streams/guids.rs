//! The `#GUID` metadata stream.

#[cfg(feature = "read")]
#[doc(inline)]
pub use read::*;
#[cfg(feature = "write")]
#[doc(inline)]
pub use write::*;

/// A handle to a guid in the `#GUID` metadata stream.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GuidId(usize);

impl GuidId {
  /// The id meaning "no guid", used for `ModuleRow::enc_id`/`enc_base_id` and placeholder rows.
  #[cfg(feature = "write")]
  pub(crate) fn none() -> Self {
    Self(0)
  }
}

impl crate::bytes::ByteSize<crate::metadata::headers::HeapSizes> for GuidId {
  #[inline]
  fn byte_size(heap_sizes: crate::metadata::headers::HeapSizes) -> usize {
    match heap_sizes.contains(crate::metadata::headers::HeapSizes::WIDE_GUID_HEAP) {
      true => 4,
      false => 2,
    }
  }
}

#[cfg(feature = "read")]
#[doc(hidden)]
mod read {
  use super::GuidId;
  use crate::bytes::{ByteSize, ByteSliceExt, FromBytes};
  use crate::metadata::headers::HeapSizes;
  use core::fmt;

  /// A `#GUID` heap.
  ///
  /// Contains 16-byte GUIDs at offsets relative to the start of the heap.  The heap can contain
  /// unreachable garbage data.
  #[repr(transparent)]
  #[derive(Default, Clone, Copy)]
  pub struct GuidsHeap<'a>(pub(crate) &'a [u8]);

  impl<'a> GuidsHeap<'a> {
    /// Returns the guid from the given [GuidId].
    ///
    /// Will return `None` if the given id is out of bounds.
    pub fn get(&self, id: GuidId) -> Option<[u8; 16]> {
      let beg = id.0;
      let end = beg + 16;

      self.0.get(beg..end).and_then(|b| b.try_into().ok())
    }
  }

  impl fmt::Debug for GuidsHeap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple("GuidsHeap").finish()
    }
  }

  impl FromBytes<'_, HeapSizes> for GuidId {
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
  use super::GuidId;
  use crate::bytes::{ByteSize, ToBytes};
  use crate::metadata::headers::HeapSizes;
  use std::collections::HashMap;
  use std::vec::Vec;

  impl ToBytes<HeapSizes> for GuidId {
    fn to_bytes(&self, out: &mut Vec<u8>, heap_sizes: HeapSizes) {
      match Self::byte_size(heap_sizes) {
        2 => (self.0 as u16).to_bytes(out, ()),
        4 => (self.0 as u32).to_bytes(out, ()),
        _ => unreachable!(),
      }
    }
  }

  /// Builds a `#GUID` heap.
  ///
  /// Unlike the other heaps, `#GUID` entries are addressed by a 1-based sequence number rather
  /// than a byte offset (ECMA-335 §II.24.2.3): the first guid added is id `1`, the second `2`, and
  /// so on, with `0` reserved to mean "no guid". [GuidId::0] therefore holds that sequence number
  /// directly rather than a byte offset into [GuidsHeapBuilder::into_bytes]. Identical guids are
  /// deduplicated against everything added through this builder, returning the prior id.
  #[derive(Default)]
  pub struct GuidsHeapBuilder {
    bytes: Vec<u8>,
    interned: HashMap<[u8; 16], GuidId>,
  }

  impl GuidsHeapBuilder {
    /// Seeds this builder from the raw bytes of a preserved `#GUID` heap.
    ///
    /// New guids are appended after `preserved` verbatim; `preserved`'s own content is registered
    /// for dedup so a later `add` of a guid already present reuses its existing id.
    pub fn with_preserved(preserved: &[u8]) -> Self {
      let mut interned = HashMap::new();

      for (i, chunk) in preserved.chunks_exact(16).enumerate() {
        let guid: [u8; 16] = chunk.try_into().unwrap();

        interned.entry(guid).or_insert(GuidId(i + 1));
      }

      Self {
        bytes: preserved.to_vec(),
        interned,
      }
    }

    /// Appends `guid`, returning the 1-based id it was assigned, or the id it was already
    /// assigned if it was added before.
    pub fn add(&mut self, guid: [u8; 16]) -> GuidId {
      if let Some(id) = self.interned.get(&guid) {
        return *id;
      }

      self.bytes.extend_from_slice(&guid);

      let id = GuidId(self.bytes.len() / 16);

      self.interned.insert(guid, id);

      id
    }

    /// The number of guids currently in the heap.
    pub fn len(&self) -> usize {
      self.bytes.len() / 16
    }

    /// Whether the heap has no guids.
    pub fn is_empty(&self) -> bool {
      self.bytes.is_empty()
    }

    /// Consumes the builder, returning the final heap bytes.
    pub fn into_bytes(self) -> Vec<u8> {
      self.bytes
    }
  }
}
