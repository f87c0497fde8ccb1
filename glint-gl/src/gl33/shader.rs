use gl::types::*;
use std::ptr::null_mut;

use glint::{ActiveVariable, ShaderKind, UniformValue};

pub(crate) fn opengl_shader_type(kind: ShaderKind) -> GLenum {
  match kind {
    ShaderKind::Vertex => gl::VERTEX_SHADER,
    ShaderKind::Pixel => gl::FRAGMENT_SHADER,
  }
}

pub(crate) unsafe fn compile(shader: GLuint, source: &str) {
  // sources are passed with their length, so they don’t need to be NUL-terminated
  let ptr = source.as_ptr() as *const GLchar;
  let len = source.len() as GLint;

  gl::ShaderSource(shader, 1, &ptr, &len);
  gl::CompileShader(shader);
}

pub(crate) unsafe fn shader_param(shader: GLuint, param: GLenum) -> GLint {
  let mut value: GLint = 0;
  gl::GetShaderiv(shader, param, &mut value);
  value
}

pub(crate) unsafe fn program_param(program: GLuint, param: GLenum) -> GLint {
  let mut value: GLint = 0;
  gl::GetProgramiv(program, param, &mut value);
  value
}

pub(crate) unsafe fn shader_info_log(shader: GLuint) -> String {
  let log_len = shader_param(shader, gl::INFO_LOG_LENGTH);
  let mut log: Vec<u8> = Vec::with_capacity(log_len.max(0) as usize);
  let mut written: GLsizei = 0;

  gl::GetShaderInfoLog(shader, log_len, &mut written, log.as_mut_ptr() as *mut GLchar);
  log.set_len(written.max(0) as usize);

  String::from_utf8_lossy(&log).into_owned()
}

pub(crate) unsafe fn program_info_log(program: GLuint) -> String {
  let log_len = program_param(program, gl::INFO_LOG_LENGTH);
  let mut log: Vec<u8> = Vec::with_capacity(log_len.max(0) as usize);
  let mut written: GLsizei = 0;

  gl::GetProgramInfoLog(program, log_len, &mut written, log.as_mut_ptr() as *mut GLchar);
  log.set_len(written.max(0) as usize);

  String::from_utf8_lossy(&log).into_owned()
}

pub(crate) unsafe fn active_attributes(program: GLuint) -> Vec<ActiveVariable> {
  let count = program_param(program, gl::ACTIVE_ATTRIBUTES);
  let max_len = program_param(program, gl::ACTIVE_ATTRIBUTE_MAX_LENGTH);

  (0..count.max(0) as GLuint)
    .map(|index| {
      let mut name = vec![0u8; max_len.max(1) as usize];
      let mut len: GLsizei = 0;
      let mut size: GLint = 0;
      let mut ty: GLenum = 0;

      gl::GetActiveAttrib(
        program,
        index,
        max_len,
        &mut len,
        &mut size,
        &mut ty,
        name.as_mut_ptr() as *mut GLchar,
      );

      // the name buffer is NUL-terminated by GL
      let location = gl::GetAttribLocation(program, name.as_ptr() as *const GLchar);
      name.truncate(len.max(0) as usize);

      ActiveVariable {
        name: String::from_utf8_lossy(&name).into_owned(),
        ty,
        size,
        location,
      }
    })
    .collect()
}

pub(crate) unsafe fn active_uniforms(program: GLuint) -> Vec<ActiveVariable> {
  let count = program_param(program, gl::ACTIVE_UNIFORMS);
  let max_len = program_param(program, gl::ACTIVE_UNIFORM_MAX_LENGTH);

  (0..count.max(0) as GLuint)
    .map(|index| {
      let mut name = vec![0u8; max_len.max(1) as usize];
      let mut len: GLsizei = 0;
      let mut size: GLint = 0;
      let mut ty: GLenum = 0;

      gl::GetActiveUniform(
        program,
        index,
        max_len,
        &mut len,
        &mut size,
        &mut ty,
        name.as_mut_ptr() as *mut GLchar,
      );

      // uniforms living in blocks have no location (-1)
      let location = gl::GetUniformLocation(program, name.as_ptr() as *const GLchar);
      name.truncate(len.max(0) as usize);

      ActiveVariable {
        name: String::from_utf8_lossy(&name).into_owned(),
        ty,
        size,
        location,
      }
    })
    .collect()
}

pub(crate) unsafe fn uniform(location: GLint, value: &UniformValue) {
  let count = value.count() as GLsizei;

  match value {
    UniformValue::Int1(v) => gl::Uniform1iv(location, count, v.as_ptr()),
    UniformValue::Int2(v) => gl::Uniform2iv(location, count, v.as_ptr() as *const GLint),
    UniformValue::Int3(v) => gl::Uniform3iv(location, count, v.as_ptr() as *const GLint),
    UniformValue::Int4(v) => gl::Uniform4iv(location, count, v.as_ptr() as *const GLint),
    UniformValue::UInt1(v) => gl::Uniform1uiv(location, count, v.as_ptr()),
    UniformValue::UInt2(v) => gl::Uniform2uiv(location, count, v.as_ptr() as *const GLuint),
    UniformValue::UInt3(v) => gl::Uniform3uiv(location, count, v.as_ptr() as *const GLuint),
    UniformValue::UInt4(v) => gl::Uniform4uiv(location, count, v.as_ptr() as *const GLuint),
    UniformValue::Float1(v) => gl::Uniform1fv(location, count, v.as_ptr()),
    UniformValue::Float2(v) => gl::Uniform2fv(location, count, v.as_ptr() as *const GLfloat),
    UniformValue::Float3(v) => gl::Uniform3fv(location, count, v.as_ptr() as *const GLfloat),
    UniformValue::Float4(v) => gl::Uniform4fv(location, count, v.as_ptr() as *const GLfloat),
    UniformValue::Mat4(v) => {
      gl::UniformMatrix4fv(location, count, gl::FALSE, v.as_ptr() as *const GLfloat)
    }
  }
}
