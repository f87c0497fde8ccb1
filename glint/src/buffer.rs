//! Vertex and index buffers.
//!
//! Both kinds of buffers share the same implementation, [`RawBuffer`], and only differ by the
//! binding point they use. Buffers can be locked to access their contents from the CPU; only one
//! lock can be outstanding at a time.

use std::cell::{Cell, RefCell};
use std::error;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use std::slice;

use bytemuck::Pod;

use crate::backend::{Backend, BufferTarget, IndexType};
use crate::handle::Resource;
use crate::state::GfxState;

/// Buffer usage hint.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferUsage {
  StaticDraw,
  StaticRead,
  StaticCopy,
  DynamicDraw,
  DynamicRead,
  DynamicCopy,
  StreamDraw,
  StreamRead,
  StreamCopy,
}

impl Default for BufferUsage {
  /// Data is uploaded once and drawn many times.
  fn default() -> Self {
    BufferUsage::StaticDraw
  }
}

/// Access requested when locking a buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LockAccess {
  /// Read the contents.
  ReadOnly,
  /// Overwrite the contents; what was there before is not read.
  WriteDiscard,
  /// Read and write the contents.
  ReadWrite,
}

/// Kind of a buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferKind {
  Vertex,
  Index,
}

impl BufferKind {
  /// Binding point of this kind of buffer.
  pub fn target(self) -> BufferTarget {
    match self {
      BufferKind::Vertex => BufferTarget::Array,
      BufferKind::Index => BufferTarget::ElementArray,
    }
  }
}

#[derive(Debug, Eq, PartialEq)]
pub enum BufferLockError {
  /// Buffer mapping failed.
  MapFailed,
}

impl fmt::Display for BufferLockError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match self {
      BufferLockError::MapFailed => f.write_str("buffer mapping failed"),
    }
  }
}

impl error::Error for BufferLockError {}

/// A buffer owning a single backend buffer.
pub struct RawBuffer<B>
where
  B: Backend,
{
  name: u32,
  kind: BufferKind,
  size: usize,
  usage: BufferUsage,
  locked: Cell<bool>,
  state: Rc<RefCell<GfxState<B>>>,
}

impl<B> RawBuffer<B>
where
  B: Backend,
{
  pub(crate) fn new(
    state: &Rc<RefCell<GfxState<B>>>,
    kind: BufferKind,
    size: usize,
    data: Option<&[u8]>,
    usage: BufferUsage,
  ) -> Self {
    if let Some(data) = data {
      assert_eq!(
        data.len(),
        size,
        "initial data doesn’t match the size of the buffer"
      );
    }

    let target = kind.target();
    let mut st = state.borrow_mut();
    let name = st.call(|b| b.gen_buffer());
    st.bind_buffer(target, name);
    st.call(|b| b.buffer_data(target, size, data, usage));

    log::trace!("created {:?} buffer {} ({} bytes)", kind, name, size);

    RawBuffer {
      name,
      kind,
      size,
      usage,
      locked: Cell::new(false),
      state: state.clone(),
    }
  }

  pub fn kind(&self) -> BufferKind {
    self.kind
  }

  /// Size in bytes.
  pub fn size(&self) -> usize {
    self.size
  }

  pub fn usage(&self) -> BufferUsage {
    self.usage
  }

  pub fn is_locked(&self) -> bool {
    self.locked.get()
  }

  /// Whether the backend still knows this buffer.
  pub fn is_valid(&self) -> bool {
    self.state.borrow().backend().is_buffer(self.name)
  }

  /// Lock a region of the buffer.
  ///
  /// The region is unlocked when the returned [`BufferLock`] is dropped.
  ///
  /// # Panics
  ///
  /// Panics if the buffer is already locked or if the region lies outside of the buffer.
  pub fn lock(
    &self,
    offset: usize,
    len: usize,
    access: LockAccess,
  ) -> Result<BufferLock<B>, BufferLockError> {
    assert!(!self.locked.get(), "buffer {} is already locked", self.name);
    let end = offset.checked_add(len).filter(|&end| end <= self.size);
    assert!(
      end.is_some(),
      "lock region {}+{} out of buffer bounds ({} bytes)",
      offset,
      len,
      self.size
    );

    let target = self.kind.target();
    let mut st = self.state.borrow_mut();
    st.bind_buffer(target, self.name);
    let ptr = st.call(|b| b.map_buffer_range(target, offset, len, access));

    if ptr.is_null() {
      return Err(BufferLockError::MapFailed);
    }

    self.locked.set(true);

    Ok(BufferLock {
      buffer: self,
      ptr,
      len,
      access,
    })
  }

  /// Overwrite a region of the buffer.
  pub fn update(&self, offset: usize, bytes: &[u8]) -> Result<(), BufferLockError> {
    let mut lock = self.lock(offset, bytes.len(), LockAccess::WriteDiscard)?;
    lock.as_mut_slice::<u8>().copy_from_slice(bytes);
    Ok(())
  }
}

impl<B> Resource for RawBuffer<B>
where
  B: Backend,
{
  fn name(&self) -> u32 {
    self.name
  }
}

impl<B> fmt::Debug for RawBuffer<B>
where
  B: Backend,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("RawBuffer")
      .field("name", &self.name)
      .field("kind", &self.kind)
      .field("size", &self.size)
      .field("usage", &self.usage)
      .field("locked", &self.locked.get())
      .finish()
  }
}

impl<B> Drop for RawBuffer<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    let name = self.name;
    let mut st = self.state.borrow_mut();

    st.on_delete_buffer(name);
    st.call(|b| b.delete_buffer(name));

    log::trace!("deleted {:?} buffer {}", self.kind, name);
  }
}

/// Locked region of a buffer.
///
/// Dropping the lock unmaps the region.
pub struct BufferLock<'a, B>
where
  B: Backend,
{
  buffer: &'a RawBuffer<B>,
  ptr: *mut u8,
  len: usize,
  access: LockAccess,
}

impl<'a, B> BufferLock<'a, B>
where
  B: Backend,
{
  pub fn access(&self) -> LockAccess {
    self.access
  }

  /// Length of the region in bytes.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn as_ptr(&self) -> *const u8 {
    self.ptr
  }

  pub fn as_mut_ptr(&mut self) -> *mut u8 {
    self.ptr
  }

  /// View the region as a slice of `T`.
  ///
  /// # Panics
  ///
  /// Panics if the region is not a whole number of correctly aligned `T`.
  pub fn as_slice<T>(&self) -> &[T]
  where
    T: Pod,
  {
    let bytes = unsafe { slice::from_raw_parts(self.ptr, self.len) };
    bytemuck::cast_slice(bytes)
  }

  /// View the region as a mutable slice of `T`.
  ///
  /// # Panics
  ///
  /// Panics on a read-only lock, and if the region is not a whole number of correctly aligned `T`.
  pub fn as_mut_slice<T>(&mut self) -> &mut [T]
  where
    T: Pod,
  {
    assert_ne!(
      self.access,
      LockAccess::ReadOnly,
      "cannot write through a read-only lock"
    );

    let bytes = unsafe { slice::from_raw_parts_mut(self.ptr, self.len) };
    bytemuck::cast_slice_mut(bytes)
  }
}

impl<'a, B> Drop for BufferLock<'a, B>
where
  B: Backend,
{
  fn drop(&mut self) {
    let buffer = self.buffer;
    let target = buffer.kind.target();
    let mut st = buffer.state.borrow_mut();

    st.bind_buffer(target, buffer.name);

    if !st.call(|b| b.unmap_buffer(target)) {
      log::warn!("contents of buffer {} got corrupted while locked", buffer.name);
    }

    buffer.locked.set(false);
  }
}

/// Buffer of vertices.
#[derive(Debug)]
pub struct VertexBuffer<B>(RawBuffer<B>)
where
  B: Backend;

impl<B> VertexBuffer<B>
where
  B: Backend,
{
  pub(crate) fn new(
    state: &Rc<RefCell<GfxState<B>>>,
    size: usize,
    data: Option<&[u8]>,
    usage: BufferUsage,
  ) -> Self {
    VertexBuffer(RawBuffer::new(state, BufferKind::Vertex, size, data, usage))
  }
}

impl<B> Deref for VertexBuffer<B>
where
  B: Backend,
{
  type Target = RawBuffer<B>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl<B> Resource for VertexBuffer<B>
where
  B: Backend,
{
  fn name(&self) -> u32 {
    self.0.name
  }
}

/// Buffer of 16-bit or 32-bit indices.
#[derive(Debug)]
pub struct IndexBuffer<B>
where
  B: Backend,
{
  raw: RawBuffer<B>,
  stride: usize,
}

impl<B> IndexBuffer<B>
where
  B: Backend,
{
  /// # Panics
  ///
  /// Panics if `stride` is neither 2 nor 4.
  pub(crate) fn new(
    state: &Rc<RefCell<GfxState<B>>>,
    size: usize,
    data: Option<&[u8]>,
    stride: usize,
    usage: BufferUsage,
  ) -> Self {
    assert!(
      stride == 2 || stride == 4,
      "index stride must be 2 or 4 bytes, got {}",
      stride
    );

    let raw = RawBuffer::new(state, BufferKind::Index, size, data, usage);
    IndexBuffer { raw, stride }
  }

  /// Size in bytes of a single index.
  pub fn stride(&self) -> usize {
    self.stride
  }

  /// Width of the indices, derived from the stride.
  pub fn index_type(&self) -> IndexType {
    if self.stride == 2 {
      IndexType::U16
    } else {
      IndexType::U32
    }
  }

  /// Number of indices.
  pub fn len(&self) -> usize {
    self.raw.size / self.stride
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<B> Deref for IndexBuffer<B>
where
  B: Backend,
{
  type Target = RawBuffer<B>;

  fn deref(&self) -> &Self::Target {
    &self.raw
  }
}

impl<B> Resource for IndexBuffer<B>
where
  B: Backend,
{
  fn name(&self) -> u32 {
    self.raw.name
  }
}
