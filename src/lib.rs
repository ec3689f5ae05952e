#![doc = include_str!("../README.md")]
#![no_std]

extern crate alloc;

use alloc::rc::Rc;
use core::any::Any;
use core::fmt;

/// The supplied value cannot be represented in a node's integer storage.
///
/// Surfaced at construction time; fatal to that construction call only, and
/// no node is produced.

#[derive(Clone, Copy)]
pub struct ValueConversionError;

/// A non-empty head of the wrong node variant reached a dynamic traversal
/// boundary.
///
/// Surfaced before any traversal begins; no partial sum is computed.

#[derive(Clone, Copy)]
pub struct TypeMismatchError;

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// SUBMODULES                                                                 //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

pub mod tracked;

pub mod untracked;

pub use tracked::Collector;
pub use tracked::TrackedNode;
pub use untracked::UntrackedNode;

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// PUBLIC TYPE AND TRAIT DEFINITIONS                                          //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

/// A singly linked list node: a value and an optional successor.
///
/// Both node variants implement this trait, so traversal code is written once
/// and the variants differ only in lifetime management and footprint.

pub trait Link: Sized {
  /// The value stored in this node.

  fn value(&self) -> i64;

  /// A new strong handle on the successor, or `None` at the end of the list.

  fn next(&self) -> Option<Rc<Self>>;
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// SUM TRAVERSAL                                                              //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

/// Sums the values of the list starting at `head`. An empty list sums to
/// zero.
///
/// Addition wraps at the width of the value field, matching native signed
/// arithmetic in the reference implementations. The list is only read;
/// traversal takes a strong handle on each node in turn and releases it on
/// advancing.
///
/// Given a cyclic list this function does not terminate. Cycle detection is
/// deliberately absent; it would change the traversal cost under measurement.

pub fn sum_list<T: Link>(head: Option<&Rc<T>>) -> i64 {
  let mut total: i64 = 0;
  let mut current = head.map(Rc::clone);

  while let Some(node) = current {
    total = total.wrapping_add(node.value());
    current = node.next();
  }

  total
}

/// Sums a list received through a type-erased handle.
///
/// This is the dynamic entry point for callers that cannot name the variant
/// statically (interoperability harnesses). The head is checked against the
/// expected variant exactly once, at entry; every subsequent element is of
/// the same variant by construction, so the body is the statically typed
/// [`sum_list`].
///
/// # Errors
///
/// A non-empty head that is not a `T` fails with [`TypeMismatchError`]
/// before any element is visited.

pub fn sum_list_dyn<T>(head: Option<Rc<dyn Any>>) -> Result<i64, TypeMismatchError>
where
  T: Link + 'static
{
  let Some(head) = head else { return Ok(0); };

  let Ok(head) = head.downcast::<T>() else {
    return Err(TypeMismatchError);
  };

  Ok(sum_list(Some(&head)))
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// ValueConversionError                                                       //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

impl fmt::Debug for ValueConversionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("ValueConversionError")
  }
}

impl fmt::Display for ValueConversionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("value does not fit the node's integer storage")
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// TypeMismatchError                                                          //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

impl fmt::Debug for TypeMismatchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("TypeMismatchError")
  }
}

impl fmt::Display for TypeMismatchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("head is not a node of the expected variant")
  }
}
