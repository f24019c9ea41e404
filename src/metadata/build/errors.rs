//! Errors and warnings raised while assembling a module graph into metadata tables and heaps.

use core::fmt;

/// A fatal condition that stops the build; the graph cannot be represented as valid ECMA-335
/// metadata without fixing it first.
#[derive(Debug)]
pub enum BuildError {
  /// A module has more than one `Module` row; exactly one is required (ECMA-335 §II.22.30).
  MultipleModules,
  /// No `Module` row was supplied at all.
  MissingModule,
  /// A blob too large to be addressed by a compressed length (ECMA-335 §II.23.2, max `0x1fffffff`
  /// bytes) was handed to a heap builder.
  BlobTooLarge {
    /// The oversized blob's length in bytes.
    len: usize,
  },
  /// A table grew past `0xffff_ffff` rows, which no coded token or row id can address.
  TableOverflow {
    /// The name of the table that overflowed.
    table: &'static str,
  },
  /// A `TypeDef`'s generic parameter list referenced a constraint or owner this build does not
  /// know how to resolve to a row.
  UnresolvedReference {
    /// A human readable description of what could not be resolved.
    what: &'static str,
  },
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MultipleModules => write!(f, "a module graph may declare at most one Module row"),
      Self::MissingModule => write!(f, "a module graph must declare exactly one Module row"),
      Self::BlobTooLarge { len } => {
        write!(f, "blob of {len} bytes exceeds the compressed length limit")
      }
      Self::TableOverflow { table } => write!(f, "table `{table}` overflowed its row id space"),
      Self::UnresolvedReference { what } => write!(f, "could not resolve reference to {what}"),
    }
  }
}

#[cfg(any(feature = "std", test))]
impl std::error::Error for BuildError {}

/// A non-fatal condition worth surfacing to the caller; the build proceeds, producing metadata
/// that is still valid but may not be what the caller intended.
#[derive(Debug)]
pub enum Warning {
  /// A preserved table's row count exceeded what [crate::metadata::build::preserving] expected to
  /// gap-fill; the surplus rows were appended after the new ones instead.
  PreservedRowsExceededGap {
    /// The name of the table affected.
    table: &'static str,
  },
  /// A custom attribute's constructor could not be resolved to a `MethodDef` or `MemberRef`; the
  /// attribute was dropped rather than failing the whole build.
  DroppedCustomAttribute,
  /// A `Constant`'s declared `ElementType` didn't match its value's own kind; the row was still
  /// written using the value's kind, since that's what a reader will actually decode.
  ConstantTypeMismatch {
    /// The declared type that didn't match.
    declared: crate::metadata::streams::tables::flags::ElementType,
  },
}

impl fmt::Display for Warning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::PreservedRowsExceededGap { table } => {
        write!(f, "preserved rows in `{table}` exceeded the reserved gap")
      }
      Self::DroppedCustomAttribute => {
        write!(f, "dropped a custom attribute with an unresolvable constructor")
      }
      Self::ConstantTypeMismatch { declared } => {
        write!(f, "constant's declared type {declared:?} did not match its value's own kind")
      }
    }
  }
}

/// Where a build's non-fatal [Warning]s go.
///
/// A build never fails because of a warning, so it has nowhere else to put one; this trait lets a
/// caller plug in their own collection, logging, or counting behavior instead of the default
/// [Vec<Warning>].
#[cfg(feature = "write")]
pub trait WarningSink {
  /// Records `warning`.
  fn warn(&mut self, warning: Warning);
}

#[cfg(feature = "write")]
impl WarningSink for std::vec::Vec<Warning> {
  fn warn(&mut self, warning: Warning) {
    self.push(warning);
  }
}
