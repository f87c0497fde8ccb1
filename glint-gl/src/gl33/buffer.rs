use gl::types::*;
use std::os::raw::c_void;
use std::ptr;

use glint::backend::BufferTarget;
use glint::{BufferUsage, LockAccess};

pub(crate) fn opengl_target(target: BufferTarget) -> GLenum {
  match target {
    BufferTarget::Array => gl::ARRAY_BUFFER,
    BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
  }
}

fn opengl_usage(usage: BufferUsage) -> GLenum {
  match usage {
    BufferUsage::StaticDraw => gl::STATIC_DRAW,
    BufferUsage::StaticRead => gl::STATIC_READ,
    BufferUsage::StaticCopy => gl::STATIC_COPY,
    BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
    BufferUsage::DynamicRead => gl::DYNAMIC_READ,
    BufferUsage::DynamicCopy => gl::DYNAMIC_COPY,
    BufferUsage::StreamDraw => gl::STREAM_DRAW,
    BufferUsage::StreamRead => gl::STREAM_READ,
    BufferUsage::StreamCopy => gl::STREAM_COPY,
  }
}

fn opengl_access(access: LockAccess) -> GLbitfield {
  match access {
    LockAccess::ReadOnly => gl::MAP_READ_BIT,
    LockAccess::WriteDiscard => gl::MAP_WRITE_BIT | gl::MAP_INVALIDATE_RANGE_BIT,
    LockAccess::ReadWrite => gl::MAP_READ_BIT | gl::MAP_WRITE_BIT,
  }
}

pub(crate) unsafe fn buffer_data(
  target: BufferTarget,
  size: usize,
  data: Option<&[u8]>,
  usage: BufferUsage,
) {
  let data = data.map_or(ptr::null(), |data| data.as_ptr() as *const c_void);

  gl::BufferData(
    opengl_target(target),
    size as GLsizeiptr,
    data,
    opengl_usage(usage),
  );
}

pub(crate) unsafe fn map_buffer_range(
  target: BufferTarget,
  offset: usize,
  len: usize,
  access: LockAccess,
) -> *mut u8 {
  gl::MapBufferRange(
    opengl_target(target),
    offset as GLintptr,
    len as GLsizeiptr,
    opengl_access(access),
  ) as *mut u8
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lock_access_bits() {
    assert_eq!(opengl_access(LockAccess::ReadOnly), gl::MAP_READ_BIT);
    assert_eq!(
      opengl_access(LockAccess::WriteDiscard) & gl::MAP_READ_BIT,
      0
    );
    assert_eq!(
      opengl_access(LockAccess::ReadWrite),
      gl::MAP_READ_BIT | gl::MAP_WRITE_BIT
    );
  }
}
