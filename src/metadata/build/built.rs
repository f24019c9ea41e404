//! The finished output of a build: tables, heaps, and the two narrow points where a caller may
//! still touch a row after construction.

use crate::metadata::build::errors::BuildError;
use crate::metadata::build::normal::BuiltTables;
use crate::metadata::build::token::{TokenRequest, TokenService};
use crate::metadata::headers::{write_metadata_header, write_stream_header};
use crate::metadata::streams::blobs::BlobsHeapBuilder;
use crate::metadata::streams::guids::GuidsHeapBuilder;
use crate::metadata::streams::strings::StringsHeapBuilder;
use crate::metadata::streams::tables::id::RowId;
use crate::metadata::streams::tables::rows::{FieldRvaRow, MethodDefRow};
use crate::metadata::streams::tables::TablesStoreSet;
use crate::metadata::streams::user_strings::UserStringsHeapBuilder;
use std::vec::Vec;

/// Populated tables and heaps ready to hand to a PE writer.
///
/// Every column is final once a build returns, with two exceptions: [Self::patch_method_rva] and
/// [Self::patch_field_rva]. A PE writer doesn't know where a method body or field-with-rva's
/// initial data will land in the image until it has laid out sections, which happens strictly
/// after metadata has been built; these two methods are the only way back in to record that
/// address once it's known.
pub struct BuiltMetadata {
  tables: TablesStoreSet,
  strings: StringsHeapBuilder,
  user_strings: UserStringsHeapBuilder,
  guids: GuidsHeapBuilder,
  blobs: BlobsHeapBuilder,
  resources: Vec<u8>,
  tokens: TokenService,
  warnings: Vec<crate::metadata::build::errors::Warning>,
}

impl From<BuiltTables> for BuiltMetadata {
  fn from(built: BuiltTables) -> Self {
    Self {
      tables: built.tables,
      strings: built.strings,
      user_strings: built.user_strings,
      guids: built.guids,
      blobs: built.blobs,
      resources: built.resources,
      tokens: built.tokens,
      warnings: built.warnings,
    }
  }
}

impl BuiltMetadata {
  /// The populated tables, for a PE writer that wants final row counts without consuming this
  /// value.
  pub fn tables(&self) -> &TablesStoreSet {
    &self.tables
  }

  /// The resolved token for every entity this build assigned one, for a PE writer emitting debug
  /// symbols or a `.pdb` against the same graph.
  pub fn tokens(&self) -> &TokenService {
    &self.tokens
  }

  /// Non-fatal conditions recorded while building.
  pub fn warnings(&self) -> &[crate::metadata::build::errors::Warning] {
    &self.warnings
  }

  /// Resolves `request` to its 4-byte metadata token, same as [TokenService::get_token], inserting
  /// into `#US` first if `request` names a string.
  ///
  /// A third narrow post-build touch point alongside [Self::patch_method_rva] and
  /// [Self::patch_field_rva]: a host emitting IL against this graph (e.g. a method body
  /// referencing a string literal via `ldstr`) doesn't know it needs a `#US` token until it is
  /// already walking that method's instructions, well after the rest of the graph has been built.
  pub fn get_token(&mut self, request: TokenRequest) -> u32 {
    self.tokens.get_token(request, &mut self.user_strings)
  }

  /// The accumulated net-resources section bytes (ECMA-335 §II.24.2.5), for embedding verbatim in
  /// the image's resources directory.
  pub fn resources(&self) -> &[u8] {
    &self.resources
  }

  /// Rewrites the `Rva` column of the `MethodDef` row with RID `method_rid`.
  ///
  /// A method body's final address is only known once a PE writer has laid out sections, which
  /// happens after tables are built; this is the one column a caller may still set afterward.
  /// Returns [BuildError::UnresolvedReference] if `method_rid` names a row past the end of the
  /// `MethodDef` table.
  pub fn patch_method_rva(&mut self, method_rid: u32, rva: u32) -> Result<(), BuildError> {
    let index = (method_rid as usize)
      .checked_sub(1)
      .ok_or(BuildError::UnresolvedReference { what: "MethodDef" })?;
    let row = self
      .tables
      .method_defs
      .rows_mut()
      .get_mut(index)
      .ok_or(BuildError::UnresolvedReference { what: "MethodDef" })?;

    *row = MethodDefRow::new(
      row.id(),
      rva,
      row.impl_flags(),
      row.flags(),
      row.name(),
      row.signature(),
      row.param_list(),
    );

    Ok(())
  }

  /// Rewrites (or, if the field had no rva at build time, inserts) the `FieldRva` row for the
  /// `Field` row with RID `field_rid`.
  ///
  /// `FieldRva` is sorted by its `Field` column (ECMA-335 §II.22.18); an insert keeps that order
  /// rather than appending, since nothing re-sorts the table after a build completes.
  pub fn patch_field_rva(&mut self, field_rid: u32, rva: u32) -> Result<(), BuildError> {
    if field_rid == 0 || field_rid as usize > self.tables.fields.len() {
      return Err(BuildError::UnresolvedReference { what: "Field" });
    }

    let field = RowId::from_rid(field_rid);
    let rows = self.tables.field_rvas.rows_mut();

    match rows.binary_search_by_key(&field_rid, |row| row.field().rid()) {
      Ok(at) => {
        let row = rows[at];

        rows[at] = FieldRvaRow::new(row.id(), rva, field);
      }
      Err(at) => rows.insert(at, FieldRvaRow::new(RowId::from_rid(0), rva, field)),
    }

    Ok(())
  }

  /// Assembles a complete metadata image: the CLI metadata root header, stream directory, and the
  /// five stream bodies (`#~`, `#Strings`, `#US`, `#GUID`, `#Blob`), laid out and 4-byte padded per
  /// ECMA-335 §II.24.2.
  ///
  /// Table and heap data is this crate's whole job; the root header and stream directory are
  /// normally a PE writer's responsibility, not this crate's (see the module's external interface
  /// notes). This is a convenience for a host that doesn't want to reassemble that layout itself,
  /// the same spirit as [crate::metadata::build::resource::ResourceSectionBuilder]'s default
  /// `ResourceSink`.
  pub fn into_bytes(self, version: &str) -> Vec<u8> {
    let strings_len = self.strings.len();
    let guids_len = self.guids.len();
    let blobs_len = self.blobs.len();
    let header = self.tables.header(strings_len, guids_len, blobs_len);

    let mut tables_bytes = Vec::new();
    header.write_bytes(&mut tables_bytes);
    self.tables.write_bytes(&mut tables_bytes, &header);
    pad4(&mut tables_bytes);

    let mut strings_bytes = self.strings.into_bytes();
    pad4(&mut strings_bytes);

    let mut user_strings_bytes = self.user_strings.into_bytes();
    pad4(&mut user_strings_bytes);

    let mut guids_bytes = self.guids.into_bytes();
    pad4(&mut guids_bytes);

    let mut blobs_bytes = self.blobs.into_bytes();
    pad4(&mut blobs_bytes);

    let streams: [(&str, &[u8]); 5] = [
      ("#~", &tables_bytes),
      ("#Strings", &strings_bytes),
      ("#US", &user_strings_bytes),
      ("#GUID", &guids_bytes),
      ("#Blob", &blobs_bytes),
    ];

    let mut root_header = Vec::new();
    write_metadata_header(&mut root_header, version, streams.len() as u16);

    let mut directory = Vec::new();
    let directory_entry_len: usize = streams.iter().map(|(name, _)| 8 + padded_len(name)).sum();
    let mut body_offset = (root_header.len() + directory_entry_len) as u32;

    for (name, bytes) in streams.iter() {
      write_stream_header(&mut directory, body_offset, bytes.len() as u32, name);
      body_offset += bytes.len() as u32;
    }

    let mut out = root_header;
    out.extend_from_slice(&directory);

    for (_, bytes) in streams.iter() {
      out.extend_from_slice(bytes);
    }

    out
  }
}

fn pad4(bytes: &mut Vec<u8>) {
  while bytes.len() % 4 != 0 {
    bytes.push(0);
  }
}

fn padded_len(name: &str) -> usize {
  let mut len = name.len() + 1;

  while len % 4 != 0 {
    len += 1;
  }

  len
}
