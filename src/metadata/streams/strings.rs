//! The `#Strings` metadata stream.

#[cfg(feature = "read")]
#[doc(inline)]
pub use read::*;
#[cfg(feature = "write")]
#[doc(inline)]
pub use write::*;

/// A handle to a string in the `#Strings` metadata stream.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringId(usize);

impl StringId {
  /// The id meaning "no name", used when synthesizing placeholder rows.
  #[cfg(feature = "write")]
  pub(crate) fn none() -> Self {
    Self(0)
  }
}

impl crate::bytes::ByteSize<crate::metadata::headers::HeapSizes> for StringId {
  #[inline]
  fn byte_size(heap_sizes: crate::metadata::headers::HeapSizes) -> usize {
    match heap_sizes.contains(crate::metadata::headers::HeapSizes::WIDE_STRING_HEAP) {
      true => 4,
      false => 2,
    }
  }
}

#[cfg(feature = "read")]
#[doc(hidden)]
mod read {
  use super::StringId;
  use crate::bytes::{ByteSize, ByteSliceExt, FromBytes};
  use crate::metadata::headers::HeapSizes;
  use core::ffi::CStr;
  use core::fmt;

  /// A `#Strings` heap.
  ///
  /// Contains utf8 encoded, nul-terminated strings at offsets relative to the start of the heap.  
  /// The heap can contain garbage data provided it is not part of content reachable from any of the
  /// tables.
  #[repr(transparent)]
  #[derive(Default, Clone, Copy)]
  pub struct StringsHeap<'a>(pub(crate) &'a [u8]);

  impl<'a> StringsHeap<'a> {
    /// Returns the string for the given [StringId].
    ///
    /// Will return `None` if the given id is out of bounds.  Performs a scan for a `nul` byte to
    /// determine the length of the string.
    pub fn get(&self, id: StringId) -> Option<&'a CStr> {
      CStr::from_bytes_until_nul(self.0.get(id.0..)?).ok()
    }
  }

  impl<'a> IntoIterator for StringsHeap<'a> {
    type Item = &'a CStr;
    type IntoIter = StringsHeapIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
      StringsHeapIter {
        data: self.0,
        index: 0,
      }
    }
  }

  impl fmt::Debug for StringsHeap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple("StringsHeap").finish()
    }
  }

  /// An iterator over strings in the [StringsHeap].
  ///
  /// In reality this method for iterating strings in the heap isn't entirely accurate as garbage
  /// data can be present in the heap.  However, this iterator is useful for testing purposes.
  #[derive(Clone, Copy)]
  pub struct StringsHeapIter<'a> {
    data: &'a [u8],
    index: usize,
  }

  impl<'a> Iterator for StringsHeapIter<'a> {
    type Item = &'a CStr;

    fn next(&mut self) -> Option<Self::Item> {
      let data = self.data.get(self.index..)?;
      let next = CStr::from_bytes_until_nul(data).ok()?;

      self.index += next.to_bytes_with_nul().len();

      Some(next)
    }
  }

  impl FromBytes<'_, HeapSizes> for StringId {
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
  use super::StringId;
  use crate::bytes::{ByteSize, ToBytes};
  use crate::metadata::headers::HeapSizes;
  use std::collections::HashMap;
  use std::vec::Vec;

  impl ToBytes<HeapSizes> for StringId {
    fn to_bytes(&self, out: &mut Vec<u8>, heap_sizes: HeapSizes) {
      match Self::byte_size(heap_sizes) {
        2 => (self.0 as u16).to_bytes(out, ()),
        4 => (self.0 as u32).to_bytes(out, ()),
        _ => unreachable!(),
      }
    }
  }

  /// Builds a `#Strings` heap.
  ///
  /// Byte `0` is always the empty string, matching the convention that a `StringId` of `0` means
  /// "no name". Identical strings are deduplicated against everything added through this builder,
  /// and, when seeded from a preserved heap, against its content too.
  pub struct StringsHeapBuilder {
    bytes: Vec<u8>,
    interned: HashMap<std::string::String, StringId>,
  }

  impl Default for StringsHeapBuilder {
    fn default() -> Self {
      Self {
        bytes: std::vec![0],
        interned: HashMap::new(),
      }
    }
  }

  impl StringsHeapBuilder {
    /// Seeds this builder from a preserved `#Strings` heap.
    ///
    /// Every string already present in `preserved` is registered so later `add` calls referring to
    /// the same text reuse its existing [StringId] rather than appending a duplicate.
    #[cfg(feature = "read")]
    pub fn with_preserved(preserved: super::read::StringsHeap<'_>) -> Self {
      let bytes = preserved.0.to_vec();
      let mut interned = HashMap::new();
      let mut offset = 0usize;

      for s in preserved {
        if let Ok(s) = s.to_str() {
          interned.entry(s.to_string()).or_insert(StringId(offset));
        }

        offset += s.to_bytes_with_nul().len();
      }

      Self { bytes, interned }
    }

    /// Interns `s`, returning its existing id if already present, or appending it.
    ///
    /// Returns `StringId(0)` for an empty string without touching the heap.
    pub fn add(&mut self, s: &str) -> StringId {
      if s.is_empty() {
        return StringId(0);
      }

      if let Some(id) = self.interned.get(s) {
        return *id;
      }

      let id = StringId(self.bytes.len());

      self.bytes.extend_from_slice(s.as_bytes());
      self.bytes.push(0);
      self.interned.insert(s.to_string(), id);

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
