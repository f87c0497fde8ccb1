use gl::types::*;
use std::os::raw::c_void;

use glint::backend::IndexType;
use glint::vertex::{AttribFormat, AttribType};
use glint::Primitive;

fn opengl_attrib_type(ty: AttribType) -> GLenum {
  match ty {
    AttribType::UnsignedByte => gl::UNSIGNED_BYTE,
    AttribType::Short => gl::SHORT,
    AttribType::UnsignedShort => gl::UNSIGNED_SHORT,
    AttribType::HalfFloat => gl::HALF_FLOAT,
    AttribType::Float => gl::FLOAT,
    AttribType::UnsignedInt2101010Rev => gl::UNSIGNED_INT_2_10_10_10_REV,
  }
}

pub(crate) fn opengl_primitive(mode: Primitive) -> GLenum {
  match mode {
    Primitive::Points => gl::POINTS,
    Primitive::Lines => gl::LINES,
    Primitive::LineStrip => gl::LINE_STRIP,
    Primitive::LineLoop => gl::LINE_LOOP,
    Primitive::Triangles => gl::TRIANGLES,
    Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
    Primitive::TriangleFan => gl::TRIANGLE_FAN,
  }
}

pub(crate) fn opengl_index_type(ty: IndexType) -> GLenum {
  match ty {
    IndexType::U16 => gl::UNSIGNED_SHORT,
    IndexType::U32 => gl::UNSIGNED_INT,
  }
}

pub(crate) unsafe fn vertex_attrib_pointer(
  index: u32,
  format: AttribFormat,
  stride: u32,
  offset: usize,
) {
  let normalized = if format.normalized {
    gl::TRUE
  } else {
    gl::FALSE
  };

  gl::VertexAttribPointer(
    index,
    format.size as GLint,
    opengl_attrib_type(format.ty),
    normalized,
    stride as GLsizei,
    offset as *const c_void,
  );
}

pub(crate) unsafe fn vertex_attrib_i_pointer(
  index: u32,
  format: AttribFormat,
  stride: u32,
  offset: usize,
) {
  gl::VertexAttribIPointer(
    index,
    format.size as GLint,
    opengl_attrib_type(format.ty),
    stride as GLsizei,
    offset as *const c_void,
  );
}
