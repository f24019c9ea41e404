//! The module graph: the object model callers build up to describe a managed module before
//! handing it to [crate::metadata::build] to assemble into physical metadata.
//!
//! Nothing in this module reads or writes bytes; it exists purely to give callers a typed,
//! `Rc`-shared way to describe types, members, and the references between them without having to
//! think about table row ids or heap offsets.

pub mod module;
pub mod reference;
pub mod signature;
