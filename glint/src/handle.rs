//! Shared ownership of resources.
//!
//! Every resource created by a [`Device`](crate::Device) is handed back wrapped in a [`Handle`]. A
//! handle is a non-atomic reference counted pointer: cloning it adds an owner, dropping it removes
//! one. When the last owner goes away, the resource is destroyed, which frees its backend object and
//! notifies the device cache.
//!
//! The device itself keeps handles to everything referenced by its pending state, so a resource
//! that is still scheduled for the next draw cannot vanish under its feet.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// A resource owning exactly one backend object.
pub trait Resource {
  /// The backend name of the object.
  ///
  /// The name is only meaningful while the resource is alive; backends are free to recycle it
  /// once the resource is dropped.
  fn name(&self) -> u32;
}

/// Reference counted handle to a resource.
///
/// Handles are `!Send` and `!Sync`: all owners live on the thread owning the graphics context.
pub struct Handle<T>(Rc<T>);

impl<T> Handle<T> {
  /// Wrap a freshly created resource.
  pub fn new(resource: T) -> Self {
    Handle(Rc::new(resource))
  }

  /// Number of live handles to the same resource.
  pub fn ref_count(this: &Self) -> usize {
    Rc::strong_count(&this.0)
  }

  /// Whether two handles point to the very same resource.
  pub fn ptr_eq(a: &Self, b: &Self) -> bool {
    Rc::ptr_eq(&a.0, &b.0)
  }
}

impl<T> Clone for Handle<T> {
  fn clone(&self) -> Self {
    Handle(self.0.clone())
  }
}

impl<T> Deref for Handle<T> {
  type Target = T;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl<T> fmt::Debug for Handle<T>
where
  T: fmt::Debug,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    self.0.fmt(f)
  }
}

impl<T> Resource for Handle<T>
where
  T: Resource,
{
  fn name(&self) -> u32 {
    self.0.name()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;

  struct Probe<'a> {
    dropped: &'a Cell<u32>,
  }

  impl Drop for Probe<'_> {
    fn drop(&mut self) {
      self.dropped.set(self.dropped.get() + 1);
    }
  }

  #[test]
  fn last_owner_destroys() {
    let dropped = Cell::new(0);
    let a = Handle::new(Probe { dropped: &dropped });
    let b = a.clone();

    assert_eq!(Handle::ref_count(&a), 2);
    assert!(Handle::ptr_eq(&a, &b));

    drop(a);
    assert_eq!(dropped.get(), 0);
    assert_eq!(Handle::ref_count(&b), 1);

    drop(b);
    assert_eq!(dropped.get(), 1);
  }

  #[test]
  fn distinct_resources_are_not_equal() {
    let dropped = Cell::new(0);
    let a = Handle::new(Probe { dropped: &dropped });
    let b = Handle::new(Probe { dropped: &dropped });

    assert!(!Handle::ptr_eq(&a, &b));
  }
}
