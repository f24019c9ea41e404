//! Assembles a module graph into ECMA-335 metadata tables and heaps.
//!
//! [NormalTablesBuilder] and [PreservingTablesBuilder] are the two underlying strategies; [build]
//! and [build_preserving] are the entry points most callers want, since they let a PE writer pick
//! token and per-heap offset stability independently via [BuildOptions] rather than committing to
//! one of the two strategies' all-or-nothing defaults.

mod built;
mod constant;
pub mod errors;
mod normal;
#[cfg(feature = "read")]
mod preserving;
mod resource;
mod rid_registry;
mod token;

pub use built::BuiltMetadata;
pub use errors::{BuildError, Warning, WarningSink};
pub use normal::{BuiltTables, NormalTablesBuilder};
#[cfg(feature = "read")]
pub use preserving::{PreservedHeaps, PreservingTablesBuilder};
pub use resource::{ResourceSectionBuilder, ResourceSink};
pub use token::{TokenRequest, TokenService};

use crate::bytes::bitflags;
use crate::graph::module::Module;
use crate::metadata::streams::blobs::BlobsHeapBuilder;
use crate::metadata::streams::guids::GuidsHeapBuilder;
use crate::metadata::streams::strings::StringsHeapBuilder;
use crate::metadata::streams::user_strings::UserStringsHeapBuilder;
use normal::Walker;
use std::rc::Rc;

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  /// Which parts of a source module's identity [build_preserving] should try to keep stable.
  ///
  /// The bits are independent: a caller can ask to keep RIDs stable while letting heaps compact,
  /// or the reverse. Setting a bit only has an effect when the matching preserved heap/hint is
  /// actually supplied; see [build_preserving].
  pub struct BuildOptions: u8 {
    /// Honor every sequentially-assigned row's `original_rid` hint instead of renumbering from
    /// scratch: `Module`, `TypeDef`, `Field`, `MethodDef`, `Param`, `Event`, `Property`.
    const PRESERVE_TOKENS = 0x01;
    /// Seed the `#Strings` heap from the source module, so a string already present there keeps
    /// its original offset.
    const PRESERVE_STRINGS_OFFSETS = 0x02;
    /// Seed the `#US` heap from the source module, so a user string already present there keeps
    /// its original offset.
    const PRESERVE_US_OFFSETS = 0x04;
    /// Seed the `#Blob` heap from the source module, so a blob already present there keeps its
    /// original offset.
    const PRESERVE_BLOB_OFFSETS = 0x08;
  }
}

/// Builds `module` from scratch: every row gets a freshly assigned RID, every heap starts empty.
///
/// Equivalent to `build_preserving(module, BuildOptions::empty(), PreservedHeaps::default())` but
/// doesn't require the caller to have a source module to preserve from.
pub fn build(module: &Rc<Module>) -> Result<BuiltMetadata, BuildError> {
  NormalTablesBuilder::build(module).map(BuiltMetadata::from)
}

/// Builds `module`, honoring whichever [BuildOptions] bits are set against `preserved`.
///
/// A bit set in `options` with no matching data in `preserved` (e.g. `PRESERVE_US_OFFSETS` with
/// `preserved.user_strings` left `None`) behaves as if that bit were never set for that one heap;
/// it is not an error, since a module with no source `#US` heap to preserve is a perfectly normal
/// input.
#[cfg(feature = "read")]
pub fn build_preserving(
  module: &Rc<Module>,
  options: BuildOptions,
  preserved: PreservedHeaps<'_>,
) -> Result<BuiltMetadata, BuildError> {
  let mut walker = Walker::new(options.contains(BuildOptions::PRESERVE_TOKENS));

  let strings = match preserved.strings.filter(|_| options.contains(BuildOptions::PRESERVE_STRINGS_OFFSETS)) {
    Some(heap) => StringsHeapBuilder::with_preserved(heap),
    None => StringsHeapBuilder::default(),
  };
  let user_strings = match preserved.user_strings.filter(|_| options.contains(BuildOptions::PRESERVE_US_OFFSETS)) {
    Some(bytes) => UserStringsHeapBuilder::with_preserved(bytes),
    None => UserStringsHeapBuilder::default(),
  };
  let blobs = match preserved.blobs.filter(|_| options.contains(BuildOptions::PRESERVE_BLOB_OFFSETS)) {
    Some(bytes) => BlobsHeapBuilder::with_preserved(bytes),
    None => BlobsHeapBuilder::default(),
  };
  // The `#GUID` heap has no dedicated preservation bit: guids are addressed by sequence number
  // rather than byte offset, so there is nothing for a `PreserveGuidOffsets` bit to protect that
  // `PreserveTokens` doesn't already cover via the `Module` row's `Mvid` column.
  let guids = match preserved.guids {
    Some(bytes) => GuidsHeapBuilder::with_preserved(bytes),
    None => GuidsHeapBuilder::default(),
  };

  walker.seed_heaps(strings, user_strings, guids, blobs);
  walker.run(module).map(BuiltMetadata::from)
}
