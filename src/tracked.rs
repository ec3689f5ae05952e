//! Nodes registered with a cycle collector.
//!
//! The tracked variant is reference counted like the untracked one, but every
//! node additionally carries a GC header and registers itself with a
//! [`Collector`] at construction. [`Collector::collect`] then reclaims groups
//! of nodes that keep each other alive through reference cycles, which plain
//! reference counting never frees.
//!
//! The header plus the registration record are the per-object cost under
//! test: a tracked node is strictly larger than an untracked one.

use alloc::rc::Rc;
use alloc::rc::Weak;
use alloc::vec::Vec;
use core::cell::Cell;
use core::cell::RefCell;
use core::fmt;

use crate::Link;
use crate::ValueConversionError;

const MARK: u8 = 1;

/// Collection bookkeeping carried by every tracked node.
///
/// `flags` holds the mark bit. `refs` is scratch space for the collector's
/// trial-deletion pass and is meaningless between collections.

struct GcHeader {
  flags: Cell<u8>,
  refs: Cell<usize>,
}

/// A singly linked list node that participates in cycle collection.

pub struct TrackedNode {
  header: GcHeader,
  value: i64,
  next: RefCell<Option<Rc<TrackedNode>>>,
}

/// Registry of live tracked nodes, with the ability to reclaim reference
/// cycles among them.
///
/// All nodes of one list must be registered with the same collector; linking
/// nodes across collectors is a contract violation and leaves the foreign
/// node invisible to `collect`.

pub struct Collector {
  nodes: RefCell<Vec<Weak<TrackedNode>>>,
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// GcHeader                                                                   //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

impl GcHeader {
  fn new() -> Self {
    Self { flags: Cell::new(0), refs: Cell::new(0) }
  }

  #[inline(always)]
  fn marked(&self) -> bool {
    self.flags.get() & MARK != 0
  }

  #[inline(always)]
  fn set_marked(&self, marked: bool) {
    if marked {
      self.flags.set(self.flags.get() | MARK);
    } else {
      self.flags.set(self.flags.get() & ! MARK);
    }
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// TrackedNode                                                                //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

impl TrackedNode {
  /// Constructs a node holding `value`, linked to the given successor and
  /// registered with `collector`.
  ///
  /// The node acquires a strong reference to its successor; successors may
  /// be shared between lists.

  pub fn new_in(collector: &Collector, value: i64, next: Option<Rc<TrackedNode>>) -> Rc<TrackedNode> {
    let node = Rc::new(TrackedNode {
      header: GcHeader::new(),
      value,
      next: RefCell::new(next),
    });

    collector.nodes.borrow_mut().push(Rc::downgrade(&node));

    node
  }

  /// Constructs a node from any integral value that fits the node's storage.
  ///
  /// # Errors
  ///
  /// An error is returned if `value` is not representable as an `i64`. No
  /// node is produced and nothing is registered.

  pub fn try_new_in<V>(collector: &Collector, value: V, next: Option<Rc<TrackedNode>>) -> Result<Rc<TrackedNode>, ValueConversionError>
  where
    V: TryInto<i64>
  {
    let Ok(value) = value.try_into() else { return Err(ValueConversionError); };
    Ok(Self::new_in(collector, value, next))
  }

  /// The value stored in this node.

  #[inline(always)]
  pub fn value(&self) -> i64 {
    self.value
  }

  /// A new strong handle on the successor, or `None` at the end of the list.

  #[inline(always)]
  pub fn next(&self) -> Option<Rc<TrackedNode>> {
    self.next.borrow().clone()
  }

  /// Replaces the successor.
  ///
  /// This is a shared-ownership handoff: the old successor's reference is
  /// released and the new one's acquired. Linking a node into a cycle is
  /// permitted; the cycle is reclaimable by [`Collector::collect`] once no
  /// outside handles remain.

  pub fn set_next(&self, next: Option<Rc<TrackedNode>>) {
    *self.next.borrow_mut() = next;
  }
}

impl Link for TrackedNode {
  #[inline(always)]
  fn value(&self) -> i64 {
    TrackedNode::value(self)
  }

  #[inline(always)]
  fn next(&self) -> Option<Rc<TrackedNode>> {
    TrackedNode::next(self)
  }
}

impl Drop for TrackedNode {
  fn drop(&mut self) {
    // Same iterative chain-release as the untracked variant. Nodes unlinked
    // by the collector have no successor left, so the walk is trivial there.

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

impl fmt::Debug for TrackedNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("TrackedNode").field(&self.value).finish()
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// Collector                                                                  //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

impl Collector {
  /// An empty collector.

  pub fn new() -> Self {
    Self { nodes: RefCell::new(Vec::new()) }
  }

  /// The number of registered nodes still alive. Registrations of nodes
  /// that have already been freed are pruned.

  pub fn tracked(&self) -> usize {
    let mut nodes = self.nodes.borrow_mut();
    nodes.retain(|node| node.strong_count() > 0);
    nodes.len()
  }

  /// Reclaims every group of registered nodes that is kept alive only by
  /// reference cycles among tracked nodes. Returns the number of nodes
  /// reclaimed.
  ///
  /// This is trial deletion over the registry: snapshot each node's strong
  /// count, cancel out the `next` edges between tracked nodes, and whatever
  /// remains positive is referenced from outside the tracked graph. Nodes
  /// reachable from such a root survive; the rest have their `next` edge
  /// unlinked, after which reference counting frees them, cycles included.
  ///
  /// Acyclic garbage never reaches this point — it is freed eagerly when its
  /// last handle is released, same as the untracked variant.

  pub fn collect(&self) -> usize {
    let mut nodes = self.nodes.borrow_mut();

    nodes.retain(|node| node.strong_count() > 0);

    let live: Vec<Rc<TrackedNode>> = nodes.iter().filter_map(Weak::upgrade).collect();

    // Snapshot, excluding the handle held by `live` itself.
    for node in &live {
      node.header.refs.set(Rc::strong_count(node) - 1);
    }

    // Cancel internal edges. The snapshots above are unaffected by the
    // transient handle `next()` returns here.
    for node in &live {
      if let Some(next) = node.next() {
        next.header.refs.set(next.header.refs.get() - 1);
      }
    }

    // Mark everything reachable from an externally referenced node. The out
    // degree is one, so marking is a chain walk, not a graph search.
    for node in &live {
      if node.header.refs.get() > 0 {
        let mut current = Some(Rc::clone(node));

        while let Some(node) = current {
          if node.header.marked() { break; }
          node.header.set_marked(true);
          current = node.next();
        }
      }
    }

    // Sweep: unlink the unreachable, clear the marks of the survivors.
    let mut reclaimed = 0;

    for node in &live {
      if node.header.marked() {
        node.header.set_marked(false);
      } else {
        let _ = node.next.borrow_mut().take();
        reclaimed += 1;
      }
    }

    drop(live);

    nodes.retain(|node| node.strong_count() > 0);

    reclaimed
  }
}

impl fmt::Debug for Collector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Collector").field(&self.nodes.borrow().len()).finish()
  }
}
