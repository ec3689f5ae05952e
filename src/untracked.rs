//! Nodes reclaimed by reference counting alone.
//!
//! The untracked variant carries no collection bookkeeping, so it is the
//! smaller of the two layouts. Reclamation is deterministic and eager: when
//! the last handle on a node is released, the node walks its chain and
//! releases each exclusively owned successor in turn. The cost of that
//! determinism is cycles — a cyclic list built from untracked nodes is
//! unreachable to the caller but never freed.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::Link;
use crate::ValueConversionError;

/// A singly linked list node without cycle-collection bookkeeping.

pub struct UntrackedNode {
  value: i64,
  next: RefCell<Option<Rc<UntrackedNode>>>,
}

impl UntrackedNode {
  /// Constructs a node holding `value`, linked to the given successor.
  ///
  /// The node acquires a strong reference to its successor; successors may
  /// be shared between lists.

  pub fn new(value: i64, next: Option<Rc<UntrackedNode>>) -> Rc<UntrackedNode> {
    Rc::new(UntrackedNode { value, next: RefCell::new(next) })
  }

  /// Constructs a node from any integral value that fits the node's storage.
  ///
  /// # Errors
  ///
  /// An error is returned if `value` is not representable as an `i64`. No
  /// node is produced.

  pub fn try_new<V>(value: V, next: Option<Rc<UntrackedNode>>) -> Result<Rc<UntrackedNode>, ValueConversionError>
  where
    V: TryInto<i64>
  {
    let Ok(value) = value.try_into() else { return Err(ValueConversionError); };
    Ok(Self::new(value, next))
  }

  /// The value stored in this node.

  #[inline(always)]
  pub fn value(&self) -> i64 {
    self.value
  }

  /// A new strong handle on the successor, or `None` at the end of the list.

  #[inline(always)]
  pub fn next(&self) -> Option<Rc<UntrackedNode>> {
    self.next.borrow().clone()
  }

  /// Replaces the successor.
  ///
  /// This is a shared-ownership handoff: the old successor's reference is
  /// released and the new one's acquired. Nothing prevents linking a node
  /// into a cycle here; a cyclic untracked list leaks.

  pub fn set_next(&self, next: Option<Rc<UntrackedNode>>) {
    *self.next.borrow_mut() = next;
  }
}

impl Link for UntrackedNode {
  #[inline(always)]
  fn value(&self) -> i64 {
    UntrackedNode::value(self)
  }

  #[inline(always)]
  fn next(&self) -> Option<Rc<UntrackedNode>> {
    UntrackedNode::next(self)
  }
}

impl Drop for UntrackedNode {
  fn drop(&mut self) {
    // Chain-release iteratively. A node that is still shared stops the walk;
    // the remainder of the chain belongs to whoever else holds it. Each
    // unwrapped node has its successor taken before it is itself dropped, so
    // the nested drop never recurses.

    let mut next = self.next.get_mut().take();

    while let Some(node) = next {
      next =
        match Rc::try_unwrap(node) {
          Ok(node) => node.next.borrow_mut().take(),
          Err(_) => None,
        };
    }
  }
}

impl fmt::Debug for UntrackedNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("UntrackedNode").field(&self.value).finish()
  }
}
