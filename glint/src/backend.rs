//! Backend interface.
//!
//! A backend is the stateful graphics API glint sits on top of. The [`Backend`] trait lists every
//! entry point the device and the resources need; it’s intentionally close to the OpenGL 3.3 core
//! profile, since that is what the state cache mirrors. Methods taking `&mut self` are considered
//! _mutating_ and are always followed by an error-flag check; methods taking `&self` are queries.
//!
//! Backends never see resources, only raw names (`u32`). Name `0` always means “nothing” (or the
//! default framebuffer when talking about framebuffers).

pub mod trace;

use std::fmt;

use crate::buffer::{BufferUsage, LockAccess};
use crate::device::Primitive;
use crate::framebuffer::{Attachment, BlitFilter, ClearMask, ColorBuffer, IncompleteReason};
use crate::parameter::UniformValue;
use crate::shader::{ActiveVariable, ShaderKind};
use crate::texture::{InternalFormat, MagFilter, MinFilter, TextureDesc, Wrap};
use crate::vertex::AttribFormat;

/// Buffer binding points.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferTarget {
  /// Vertex data.
  Array,
  /// Index data.
  ElementArray,
}

/// Framebuffer binding points.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FramebufferTarget {
  /// Read and draw targets at once.
  Both,
  /// Draw target only.
  Draw,
  /// Read target only.
  Read,
}

/// Width of the indices read by an indexed draw.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IndexType {
  /// 16-bit indices.
  U16,
  /// 32-bit indices.
  U32,
}

impl IndexType {
  /// Size in bytes of a single index.
  pub fn bytes(self) -> usize {
    match self {
      IndexType::U16 => 2,
      IndexType::U32 => 4,
    }
  }
}

/// A sampling parameter of the 2D texture bound to the active unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureParameter {
  WrapS(Wrap),
  WrapT(Wrap),
  MinFilter(MinFilter),
  MagFilter(MagFilter),
  BorderColor([f32; 4]),
}

/// Error code reported by the backend error flag.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
  /// Symbolic name of the error code.
  ///
  /// Returns `"unknown"` if the code is not a known OpenGL error.
  pub fn name(self) -> &'static str {
    match self.0 {
      gl::NO_ERROR => "GL_NO_ERROR",
      gl::INVALID_ENUM => "GL_INVALID_ENUM",
      gl::INVALID_VALUE => "GL_INVALID_VALUE",
      gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
      gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
      gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
      gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
      gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
      _ => "unknown",
    }
  }
}

impl fmt::Display for ErrorCode {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    write!(f, "{} (0x{:04x})", self.name(), self.0)
  }
}

/// Stateful graphics backend.
///
/// # Safety
///
/// [`Backend::map_buffer_range`] hands out a raw pointer that glint dereferences for `len` bytes.
/// Implementors must guarantee that, when non-null, the pointer stays valid for reads (and writes,
/// depending on the access) until the matching [`Backend::unmap_buffer`] call on the same target.
pub unsafe trait Backend {
  /// Pop the next error off the error flag, if any.
  fn get_error(&mut self) -> Option<ErrorCode>;

  fn gen_buffer(&mut self) -> u32;

  fn delete_buffer(&mut self, buffer: u32);

  fn is_buffer(&self, buffer: u32) -> bool;

  fn bind_buffer(&mut self, target: BufferTarget, buffer: u32);

  /// Allocate `size` bytes for the buffer bound to `target`, optionally filled with `data`.
  fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage);

  /// Map a region of the buffer bound to `target`.
  ///
  /// Returns a null pointer on failure.
  fn map_buffer_range(
    &mut self,
    target: BufferTarget,
    offset: usize,
    len: usize,
    access: LockAccess,
  ) -> *mut u8;

  /// Unmap the buffer bound to `target`.
  ///
  /// Returns `false` if the contents got corrupted while mapped.
  fn unmap_buffer(&mut self, target: BufferTarget) -> bool;

  fn gen_vertex_array(&mut self) -> u32;

  fn delete_vertex_array(&mut self, vertex_array: u32);

  fn bind_vertex_array(&mut self, vertex_array: u32);

  /// Source attribute `index` from the bound array buffer, converting to floating point.
  fn vertex_attrib_pointer(&mut self, index: u32, format: AttribFormat, stride: u32, offset: usize);

  /// Source attribute `index` from the bound array buffer, keeping integers as integers.
  fn vertex_attrib_i_pointer(&mut self, index: u32, format: AttribFormat, stride: u32, offset: usize);

  fn enable_vertex_attrib_array(&mut self, index: u32);

  fn disable_vertex_attrib_array(&mut self, index: u32);

  fn create_shader(&mut self, kind: ShaderKind) -> u32;

  /// Upload the source of a shader and compile it.
  fn compile_shader(&mut self, shader: u32, source: &str);

  fn shader_compile_status(&self, shader: u32) -> bool;

  fn shader_info_log(&self, shader: u32) -> String;

  fn is_shader(&self, shader: u32) -> bool;

  fn delete_shader(&mut self, shader: u32);

  fn create_program(&mut self) -> u32;

  fn attach_shader(&mut self, program: u32, shader: u32);

  fn link_program(&mut self, program: u32);

  fn program_link_status(&self, program: u32) -> bool;

  fn program_info_log(&self, program: u32) -> String;

  /// Active vertex attributes of a linked program.
  fn active_attributes(&self, program: u32) -> Vec<ActiveVariable>;

  /// Active uniforms of a linked program.
  fn active_uniforms(&self, program: u32) -> Vec<ActiveVariable>;

  fn is_program(&self, program: u32) -> bool;

  fn use_program(&mut self, program: u32);

  fn delete_program(&mut self, program: u32);

  /// Upload a uniform value to the program in use.
  fn uniform(&mut self, location: i32, value: &UniformValue);

  fn gen_texture(&mut self) -> u32;

  fn delete_texture(&mut self, texture: u32);

  /// Select the texture unit subsequent texture binds apply to.
  fn active_texture(&mut self, unit: u32);

  fn bind_texture_2d(&mut self, texture: u32);

  /// Allocate (and optionally fill) the storage of the 2D texture bound to the active unit.
  fn tex_image_2d(&mut self, desc: &TextureDesc, data: Option<&[u8]>);

  fn tex_parameter_2d(&mut self, param: TextureParameter);

  fn generate_mipmap_2d(&mut self);

  fn gen_render_buffer(&mut self) -> u32;

  fn delete_render_buffer(&mut self, render_buffer: u32);

  fn bind_render_buffer(&mut self, render_buffer: u32);

  fn render_buffer_storage(&mut self, format: InternalFormat, width: u32, height: u32);

  fn gen_framebuffer(&mut self) -> u32;

  fn delete_framebuffer(&mut self, framebuffer: u32);

  fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: u32);

  /// Attach a 2D texture to the framebuffer bound to both targets.
  fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: u32);

  /// Attach a render buffer to the framebuffer bound to both targets.
  fn framebuffer_render_buffer(&mut self, attachment: Attachment, render_buffer: u32);

  fn draw_buffers(&mut self, buffers: &[ColorBuffer]);

  fn read_buffer(&mut self, buffer: ColorBuffer);

  /// Completeness of the framebuffer bound to both targets.
  fn check_framebuffer_status(&self) -> Result<(), IncompleteReason>;

  /// Copy a `width` × `height` region from the read framebuffer to the draw framebuffer.
  fn blit_framebuffer(&mut self, width: u32, height: u32, mask: ClearMask, filter: BlitFilter);

  fn clear_color(&mut self, color: [f32; 4]);

  fn clear(&mut self, mask: ClearMask);

  fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32);

  /// Draw `count` indices starting `offset` bytes into the bound element buffer.
  fn draw_elements(&mut self, mode: Primitive, count: u32, ty: IndexType, offset: usize);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_code_names() {
    assert_eq!(ErrorCode(gl::INVALID_ENUM).name(), "GL_INVALID_ENUM");
    assert_eq!(ErrorCode(gl::OUT_OF_MEMORY).name(), "GL_OUT_OF_MEMORY");
    assert_eq!(ErrorCode(0xdead).name(), "unknown");
  }

  #[test]
  fn error_code_display() {
    assert_eq!(
      ErrorCode(gl::INVALID_OPERATION).to_string(),
      "GL_INVALID_OPERATION (0x0502)"
    );
  }

  #[test]
  fn index_type_bytes() {
    assert_eq!(IndexType::U16.bytes(), 2);
    assert_eq!(IndexType::U32.bytes(), 4);
  }
}
