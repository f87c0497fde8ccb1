//! OpenGL 3.3 backend.
//!
//! This module implements an OpenGL 3.3 core profile backend for glint. The backend type is
//! [`GL33`]. It performs no caching on its own: every call goes straight to OpenGL, the device
//! being in charge of not issuing redundant ones.

mod buffer;
mod framebuffer;
mod shader;
mod state;
mod texture;
mod vertex;

pub use self::state::StateQueryError;

use gl::types::*;
use std::marker::PhantomData;
use std::os::raw::c_void;

use glint::backend::{Backend, BufferTarget, ErrorCode, FramebufferTarget, IndexType, TextureParameter};
use glint::texture::TextureDesc;
use glint::vertex::AttribFormat;
use glint::{
  ActiveVariable, Attachment, BlitFilter, BufferUsage, ClearMask, ColorBuffer, IncompleteReason,
  InternalFormat, LockAccess, Primitive, ShaderKind, UniformValue,
};

/// An OpenGL 3.3 backend.
///
/// Only one backend can exist per thread at a time, since it assumes it owns the OpenGL context
/// current on that thread.
#[derive(Debug)]
pub struct GL33 {
  _a: PhantomData<*const ()>, // !Send and !Sync
}

impl GL33 {
  /// Create a new OpenGL 3.3 backend.
  ///
  /// The OpenGL context must be current on the calling thread and the `gl` function pointers
  /// loaded.
  pub fn new() -> Result<Self, StateQueryError> {
    state::acquire()?;

    if let Err(e) = unsafe { state::check_version() } {
      state::release();
      return Err(e);
    }

    unsafe { texture::set_unpack_alignment(1) };

    Ok(GL33 { _a: PhantomData })
  }
}

impl Drop for GL33 {
  fn drop(&mut self) {
    state::release();
  }
}

unsafe impl Backend for GL33 {
  fn get_error(&mut self) -> Option<ErrorCode> {
    match unsafe { gl::GetError() } {
      gl::NO_ERROR => None,
      code => Some(ErrorCode(code)),
    }
  }

  fn gen_buffer(&mut self) -> u32 {
    let mut buffer: GLuint = 0;
    unsafe { gl::GenBuffers(1, &mut buffer) };
    buffer
  }

  fn delete_buffer(&mut self, buffer: u32) {
    unsafe { gl::DeleteBuffers(1, &buffer) };
  }

  fn is_buffer(&self, buffer: u32) -> bool {
    unsafe { gl::IsBuffer(buffer) == gl::TRUE }
  }

  fn bind_buffer(&mut self, target: BufferTarget, buffer: u32) {
    unsafe { gl::BindBuffer(buffer::opengl_target(target), buffer) };
  }

  fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
    unsafe { buffer::buffer_data(target, size, data, usage) };
  }

  fn map_buffer_range(
    &mut self,
    target: BufferTarget,
    offset: usize,
    len: usize,
    access: LockAccess,
  ) -> *mut u8 {
    unsafe { buffer::map_buffer_range(target, offset, len, access) }
  }

  fn unmap_buffer(&mut self, target: BufferTarget) -> bool {
    unsafe { gl::UnmapBuffer(buffer::opengl_target(target)) == gl::TRUE }
  }

  fn gen_vertex_array(&mut self) -> u32 {
    let mut vertex_array: GLuint = 0;
    unsafe { gl::GenVertexArrays(1, &mut vertex_array) };
    vertex_array
  }

  fn delete_vertex_array(&mut self, vertex_array: u32) {
    unsafe { gl::DeleteVertexArrays(1, &vertex_array) };
  }

  fn bind_vertex_array(&mut self, vertex_array: u32) {
    unsafe { gl::BindVertexArray(vertex_array) };
  }

  fn vertex_attrib_pointer(&mut self, index: u32, format: AttribFormat, stride: u32, offset: usize) {
    unsafe { vertex::vertex_attrib_pointer(index, format, stride, offset) };
  }

  fn vertex_attrib_i_pointer(&mut self, index: u32, format: AttribFormat, stride: u32, offset: usize) {
    unsafe { vertex::vertex_attrib_i_pointer(index, format, stride, offset) };
  }

  fn enable_vertex_attrib_array(&mut self, index: u32) {
    unsafe { gl::EnableVertexAttribArray(index) };
  }

  fn disable_vertex_attrib_array(&mut self, index: u32) {
    unsafe { gl::DisableVertexAttribArray(index) };
  }

  fn create_shader(&mut self, kind: ShaderKind) -> u32 {
    unsafe { gl::CreateShader(shader::opengl_shader_type(kind)) }
  }

  fn compile_shader(&mut self, shader: u32, source: &str) {
    unsafe { shader::compile(shader, source) };
  }

  fn shader_compile_status(&self, shader: u32) -> bool {
    unsafe { shader::shader_param(shader, gl::COMPILE_STATUS) == GLint::from(gl::TRUE) }
  }

  fn shader_info_log(&self, shader: u32) -> String {
    unsafe { shader::shader_info_log(shader) }
  }

  fn is_shader(&self, shader: u32) -> bool {
    unsafe { gl::IsShader(shader) == gl::TRUE }
  }

  fn delete_shader(&mut self, shader: u32) {
    unsafe { gl::DeleteShader(shader) };
  }

  fn create_program(&mut self) -> u32 {
    unsafe { gl::CreateProgram() }
  }

  fn attach_shader(&mut self, program: u32, shader: u32) {
    unsafe { gl::AttachShader(program, shader) };
  }

  fn link_program(&mut self, program: u32) {
    unsafe { gl::LinkProgram(program) };
  }

  fn program_link_status(&self, program: u32) -> bool {
    unsafe { shader::program_param(program, gl::LINK_STATUS) == GLint::from(gl::TRUE) }
  }

  fn program_info_log(&self, program: u32) -> String {
    unsafe { shader::program_info_log(program) }
  }

  fn active_attributes(&self, program: u32) -> Vec<ActiveVariable> {
    unsafe { shader::active_attributes(program) }
  }

  fn active_uniforms(&self, program: u32) -> Vec<ActiveVariable> {
    unsafe { shader::active_uniforms(program) }
  }

  fn is_program(&self, program: u32) -> bool {
    unsafe { gl::IsProgram(program) == gl::TRUE }
  }

  fn use_program(&mut self, program: u32) {
    unsafe { gl::UseProgram(program) };
  }

  fn delete_program(&mut self, program: u32) {
    unsafe { gl::DeleteProgram(program) };
  }

  fn uniform(&mut self, location: i32, value: &UniformValue) {
    unsafe { shader::uniform(location, value) };
  }

  fn gen_texture(&mut self) -> u32 {
    let mut texture: GLuint = 0;
    unsafe { gl::GenTextures(1, &mut texture) };
    texture
  }

  fn delete_texture(&mut self, texture: u32) {
    unsafe { gl::DeleteTextures(1, &texture) };
  }

  fn active_texture(&mut self, unit: u32) {
    unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) };
  }

  fn bind_texture_2d(&mut self, texture: u32) {
    unsafe { gl::BindTexture(gl::TEXTURE_2D, texture) };
  }

  fn tex_image_2d(&mut self, desc: &TextureDesc, data: Option<&[u8]>) {
    unsafe { texture::tex_image_2d(desc, data) };
  }

  fn tex_parameter_2d(&mut self, param: TextureParameter) {
    unsafe { texture::tex_parameter_2d(param) };
  }

  fn generate_mipmap_2d(&mut self) {
    unsafe { gl::GenerateMipmap(gl::TEXTURE_2D) };
  }

  fn gen_render_buffer(&mut self) -> u32 {
    let mut render_buffer: GLuint = 0;
    unsafe { gl::GenRenderbuffers(1, &mut render_buffer) };
    render_buffer
  }

  fn delete_render_buffer(&mut self, render_buffer: u32) {
    unsafe { gl::DeleteRenderbuffers(1, &render_buffer) };
  }

  fn bind_render_buffer(&mut self, render_buffer: u32) {
    unsafe { gl::BindRenderbuffer(gl::RENDERBUFFER, render_buffer) };
  }

  fn render_buffer_storage(&mut self, format: InternalFormat, width: u32, height: u32) {
    unsafe {
      gl::RenderbufferStorage(
        gl::RENDERBUFFER,
        texture::opengl_internal_format(format),
        width as GLsizei,
        height as GLsizei,
      )
    };
  }

  fn gen_framebuffer(&mut self) -> u32 {
    let mut framebuffer: GLuint = 0;
    unsafe { gl::GenFramebuffers(1, &mut framebuffer) };
    framebuffer
  }

  fn delete_framebuffer(&mut self, framebuffer: u32) {
    unsafe { gl::DeleteFramebuffers(1, &framebuffer) };
  }

  fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: u32) {
    unsafe { gl::BindFramebuffer(framebuffer::opengl_target(target), framebuffer) };
  }

  fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: u32) {
    unsafe {
      gl::FramebufferTexture2D(
        gl::DRAW_FRAMEBUFFER,
        framebuffer::opengl_attachment(attachment),
        gl::TEXTURE_2D,
        texture,
        0,
      )
    };
  }

  fn framebuffer_render_buffer(&mut self, attachment: Attachment, render_buffer: u32) {
    unsafe {
      gl::FramebufferRenderbuffer(
        gl::DRAW_FRAMEBUFFER,
        framebuffer::opengl_attachment(attachment),
        gl::RENDERBUFFER,
        render_buffer,
      )
    };
  }

  fn draw_buffers(&mut self, buffers: &[ColorBuffer]) {
    let buffers: Vec<GLenum> = buffers
      .iter()
      .map(|&b| framebuffer::opengl_color_buffer(b))
      .collect();

    unsafe { gl::DrawBuffers(buffers.len() as GLsizei, buffers.as_ptr()) };
  }

  fn read_buffer(&mut self, buffer: ColorBuffer) {
    unsafe { gl::ReadBuffer(framebuffer::opengl_color_buffer(buffer)) };
  }

  fn check_framebuffer_status(&self) -> Result<(), IncompleteReason> {
    framebuffer::get_framebuffer_status()
  }

  fn blit_framebuffer(&mut self, width: u32, height: u32, mask: ClearMask, filter: BlitFilter) {
    let (w, h) = (width as GLint, height as GLint);

    unsafe {
      gl::BlitFramebuffer(
        0,
        0,
        w,
        h,
        0,
        0,
        w,
        h,
        framebuffer::opengl_clear_mask(mask),
        framebuffer::opengl_blit_filter(filter),
      )
    };
  }

  fn clear_color(&mut self, color: [f32; 4]) {
    unsafe { gl::ClearColor(color[0], color[1], color[2], color[3]) };
  }

  fn clear(&mut self, mask: ClearMask) {
    unsafe { gl::Clear(framebuffer::opengl_clear_mask(mask)) };
  }

  fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32) {
    unsafe {
      gl::DrawArrays(
        vertex::opengl_primitive(mode),
        first as GLint,
        count as GLsizei,
      )
    };
  }

  fn draw_elements(&mut self, mode: Primitive, count: u32, ty: IndexType, offset: usize) {
    unsafe {
      gl::DrawElements(
        vertex::opengl_primitive(mode),
        count as GLsizei,
        vertex::opengl_index_type(ty),
        offset as *const c_void,
      )
    };
  }
}
