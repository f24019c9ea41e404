//! Rebuilds metadata tables and heaps while keeping token and offset stability for rows a caller
//! marked with an `original_rid` hint.
//!
//! Shares [super::normal::Walker] with [super::normal::NormalTablesBuilder] entirely; the only
//! difference is `preserve: true`, which makes [super::normal::push_hinted] gap-fill each of the
//! seven sequentially-assigned primary tables (`Module`, `TypeDef`, `Field`, `MethodDef`, `Param`,
//! `Event`, `Property`) up to a row's `original_rid` before pushing it, and heaps seeded from a
//! source module's preserved bytes so offsets already handed out to unrelated tools keep meaning
//! the same thing.

use crate::graph::module::Module;
use crate::metadata::build::errors::BuildError;
use crate::metadata::build::normal::{BuiltTables, Walker};
use crate::metadata::streams::blobs::BlobsHeapBuilder;
use crate::metadata::streams::guids::GuidsHeapBuilder;
use crate::metadata::streams::strings::StringsHeapBuilder;
use crate::metadata::streams::user_strings::UserStringsHeapBuilder;
use std::rc::Rc;

/// The preserved heap bytes a [PreservingTablesBuilder] seeds its new heaps from, read out of
/// whatever module this graph was originally loaded from.
///
/// Only available when both `read` and `write` are enabled: preserving a build only makes sense
/// starting from a module this crate itself parsed.
#[derive(Default)]
pub struct PreservedHeaps<'a> {
  pub strings: Option<crate::metadata::streams::strings::StringsHeap<'a>>,
  pub user_strings: Option<&'a [u8]>,
  pub guids: Option<&'a [u8]>,
  pub blobs: Option<&'a [u8]>,
}

/// Rebuilds a module graph's tables and heaps, honoring every node's `original_rid` hint and
/// appending new content after preserved heap bytes rather than starting the heaps over.
pub struct PreservingTablesBuilder;

impl PreservingTablesBuilder {
  /// Assembles `module`, gap-filling the seven sequentially-assigned tables up to each row's
  /// `original_rid` and seeding heaps from `preserved`.
  ///
  /// A row whose table has already grown past its own `original_rid` (the graph gained rows ahead
  /// of a position a caller expected to stay fixed) degrades to an ordinary append, recorded as
  /// [crate::metadata::build::errors::Warning::PreservedRowsExceededGap] rather than failing the
  /// build outright.
  pub fn build(module: &Rc<Module>, preserved: PreservedHeaps<'_>) -> Result<BuiltTables, BuildError> {
    let mut walker = Walker::new(true);
    let strings = match preserved.strings {
      Some(heap) => StringsHeapBuilder::with_preserved(heap),
      None => StringsHeapBuilder::default(),
    };
    let user_strings = match preserved.user_strings {
      Some(bytes) => UserStringsHeapBuilder::with_preserved(bytes),
      None => UserStringsHeapBuilder::default(),
    };
    let guids = match preserved.guids {
      Some(bytes) => GuidsHeapBuilder::with_preserved(bytes),
      None => GuidsHeapBuilder::default(),
    };
    let blobs = match preserved.blobs {
      Some(bytes) => BlobsHeapBuilder::with_preserved(bytes),
      None => BlobsHeapBuilder::default(),
    };

    walker.seed_heaps(strings, user_strings, guids, blobs);
    walker.run(module)
  }
}
