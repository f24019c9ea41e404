//! Accumulates embedded resource bytes into the `#Resources`-equivalent net-resources section
//! (ECMA-335 §II.24.2.5), the blob a PE writer later embeds into the `.text` section verbatim.

use crate::graph::module::ResourceData;

/// Where embedded resource bytes get collected during a build.
///
/// A `ManifestResource` row only ever stores an `offset` into this section when its data is
/// [ResourceData::Embedded]; `File`- and `AssemblyRef`-backed resources live elsewhere and their
/// offset column is ignored by every known consumer (ECMA-335 §II.22.24).
pub trait ResourceSink {
  /// Appends `data`, length-prefixed per ECMA-335 §II.24.2.5, returning the byte offset of the
  /// entry's own length prefix.
  fn append(&mut self, data: &[u8]) -> u32;
}

/// The default [ResourceSink]: an in-memory buffer matching the bytes a PE writer would place in
/// the `.text` section's resources directory.
#[derive(Default)]
pub struct ResourceSectionBuilder {
  bytes: std::vec::Vec<u8>,
}

impl ResourceSectionBuilder {
  /// Consumes the builder, returning the finished section bytes.
  pub fn into_bytes(self) -> std::vec::Vec<u8> {
    self.bytes
  }
}

impl ResourceSink for ResourceSectionBuilder {
  fn append(&mut self, data: &[u8]) -> u32 {
    let offset = self.bytes.len() as u32;

    self.bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    self.bytes.extend_from_slice(data);

    offset
  }
}

/// Computes the `ManifestResourceRow::offset` value for `data`, appending to `resources` when it
/// is [ResourceData::Embedded].
pub fn offset_for(data: &ResourceData, resources: &mut impl ResourceSink) -> u32 {
  match data {
    ResourceData::Embedded(bytes) => resources.append(bytes),
    ResourceData::File(_) | ResourceData::AssemblyRef(_) => 0,
  }
}
