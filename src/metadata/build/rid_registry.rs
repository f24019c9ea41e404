//! Tracks the RID a graph node has been assigned in its table, keyed by object identity rather
//! than by value — two distinct `Rc<TypeRef>` nodes that happen to name the same type are still
//! distinct rows, matching how a real compiler's emitter treats the nodes it was handed.

use std::collections::HashMap;
use std::rc::Rc;

/// Maps `Rc<T>` nodes to the RID they were assigned in their table.
///
/// Identity is `Rc::as_ptr`, not `T`'s `PartialEq`: two `Rc`s pointing at the same allocation map
/// to the same RID; two allocations with equal contents do not, even if `T: PartialEq`.
pub struct RidRegistry<T> {
  rids: HashMap<*const T, u32>,
}

impl<T> Default for RidRegistry<T> {
  fn default() -> Self {
    Self {
      rids: HashMap::new(),
    }
  }
}

impl<T> RidRegistry<T> {
  /// Returns the RID already assigned to `node`, if any.
  pub fn try_get(&self, node: &Rc<T>) -> Option<u32> {
    self.rids.get(&Rc::as_ptr(node)).copied()
  }

  /// Records that `node` was assigned `rid`.
  ///
  /// Overwrites any prior mapping for `node`; callers that must not redefine a RID should check
  /// [RidRegistry::try_get] first.
  pub fn set(&mut self, node: &Rc<T>, rid: u32) {
    self.rids.insert(Rc::as_ptr(node), rid);
  }

  /// Returns the RID for `node`, invoking `insert` to emit the row and assign the RID on first
  /// request.
  pub fn try_get_or_insert(&mut self, node: &Rc<T>, insert: impl FnOnce() -> u32) -> u32 {
    if let Some(rid) = self.try_get(node) {
      return rid;
    }

    let rid = insert();

    self.set(node, rid);

    rid
  }
}
