//! Shaders and programs.
//!
//! A [`Shader`] is compiled as soon as it’s created and a [`Program`] linked as soon as it’s
//! created. Neither fails at construction: a compilation or link error is recorded on the object,
//! along with the backend diagnostic log, and the object simply cannot be used to draw. Poll
//! [`Shader::is_compiled`] / [`Program::is_linked`] before relying on them.
//!
//! Once linked, a program’s active attributes and uniforms are reflected and cached. Uniform
//! lookups by name go through that cache and never hit the backend.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::rc::Rc;

use crate::backend::Backend;
use crate::handle::{Handle, Resource};
use crate::state::GfxState;

/// Stage of a shader.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShaderKind {
  Vertex,
  /// Fragment shader.
  Pixel,
}

/// Reflected active attribute or uniform of a linked program.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ActiveVariable {
  /// Name, as reported by the backend (`name[0]` for arrays).
  pub name: String,
  /// Backend type (`GL_FLOAT_VEC3`, `GL_SAMPLER_2D`, …).
  pub ty: u32,
  /// Number of elements; `1` unless the variable is an array.
  pub size: i32,
  pub location: i32,
}

/// A compiled (or not) shader stage.
pub struct Shader<B>
where
  B: Backend,
{
  name: u32,
  kind: ShaderKind,
  compiled: bool,
  log: String,
  state: Rc<RefCell<GfxState<B>>>,
}

impl<B> Shader<B>
where
  B: Backend,
{
  pub(crate) fn new(state: &Rc<RefCell<GfxState<B>>>, kind: ShaderKind, source: &str) -> Self {
    let mut st = state.borrow_mut();
    let name = st.call(|b| b.create_shader(kind));
    st.call(|b| b.compile_shader(name, source));

    let compiled = st.backend().shader_compile_status(name);
    let log = st.backend().shader_info_log(name);

    if !compiled {
      log::warn!("{:?} shader {} failed to compile:\n{}", kind, name, log);
    }

    Shader {
      name,
      kind,
      compiled,
      log,
      state: state.clone(),
    }
  }

  pub fn kind(&self) -> ShaderKind {
    self.kind
  }

  pub fn is_compiled(&self) -> bool {
    self.compiled
  }

  /// Compilation log.
  pub fn info_log(&self) -> &str {
    &self.log
  }

  /// Whether the backend still knows this shader.
  pub fn is_valid(&self) -> bool {
    self.state.borrow().backend().is_shader(self.name)
  }

  /// Human-readable compilation status and log.
  pub fn dump_debug_info(&self) -> String {
    format!(
      "{:?} shader {}:\n  compiled: {}\n  info log: {}\n",
      self.kind,
      self.name,
      self.compiled,
      self.log.trim_end()
    )
  }
}

impl<B> Resource for Shader<B>
where
  B: Backend,
{
  fn name(&self) -> u32 {
    self.name
  }
}

impl<B> fmt::Debug for Shader<B>
where
  B: Backend,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Shader")
      .field("name", &self.name)
      .field("kind", &self.kind)
      .field("compiled", &self.compiled)
      .finish()
  }
}

impl<B> Drop for Shader<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    let name = self.name;
    self.state.borrow_mut().call(|b| b.delete_shader(name));
  }
}

/// A linked (or not) vertex and pixel shader pair.
///
/// The program keeps its shaders alive.
pub struct Program<B>
where
  B: Backend,
{
  name: u32,
  linked: bool,
  log: String,
  attributes: Vec<ActiveVariable>,
  uniforms: Vec<ActiveVariable>,
  uniform_lookup: HashMap<String, usize>,
  _shaders: [Handle<Shader<B>>; 2],
  state: Rc<RefCell<GfxState<B>>>,
}

impl<B> Program<B>
where
  B: Backend,
{
  pub(crate) fn new(
    state: &Rc<RefCell<GfxState<B>>>,
    vertex: &Handle<Shader<B>>,
    pixel: &Handle<Shader<B>>,
  ) -> Self {
    let mut st = state.borrow_mut();
    let name = st.call(|b| b.create_program());
    st.call(|b| b.attach_shader(name, vertex.name()));
    st.call(|b| b.attach_shader(name, pixel.name()));
    st.call(|b| b.link_program(name));

    let linked = st.backend().program_link_status(name);
    let log = st.backend().program_info_log(name);

    let (attributes, uniforms) = if linked {
      (
        st.backend().active_attributes(name),
        st.backend().active_uniforms(name),
      )
    } else {
      log::warn!("program {} failed to link:\n{}", name, log);
      (Vec::new(), Vec::new())
    };

    let mut uniform_lookup = HashMap::with_capacity(uniforms.len());
    for (i, uniform) in uniforms.iter().enumerate() {
      uniform_lookup.insert(uniform.name.clone(), i);

      // arrays are reported as `name[0]` but usually looked up as `name`
      if let Some(base) = uniform.name.strip_suffix("[0]") {
        uniform_lookup.entry(base.to_owned()).or_insert(i);
      }
    }

    Program {
      name,
      linked,
      log,
      attributes,
      uniforms,
      uniform_lookup,
      _shaders: [vertex.clone(), pixel.clone()],
      state: state.clone(),
    }
  }

  pub fn is_linked(&self) -> bool {
    self.linked
  }

  /// Link log.
  pub fn info_log(&self) -> &str {
    &self.log
  }

  /// Active vertex attributes.
  pub fn attributes(&self) -> &[ActiveVariable] {
    &self.attributes
  }

  /// Active uniforms.
  pub fn uniforms(&self) -> &[ActiveVariable] {
    &self.uniforms
  }

  /// Reflected uniform named `name`.
  pub fn uniform(&self, name: &str) -> Option<&ActiveVariable> {
    self.uniform_lookup.get(name).map(|&i| &self.uniforms[i])
  }

  /// Location of the uniform named `name`, if the program has it.
  ///
  /// Uniform block members are reflected without a location and yield `None`.
  pub fn uniform_location(&self, name: &str) -> Option<i32> {
    self
      .uniform(name)
      .map(|u| u.location)
      .filter(|&location| location >= 0)
  }

  /// Whether the backend still knows this program.
  pub fn is_valid(&self) -> bool {
    self.state.borrow().backend().is_program(self.name)
  }

  /// Human-readable link status, log, and reflected attributes and uniforms.
  pub fn dump_debug_info(&self) -> String {
    let mut s = String::new();

    let _ = writeln!(s, "program {}:", self.name);
    let _ = writeln!(s, "  linked: {}", self.linked);
    let _ = writeln!(s, "  info log: {}", self.log.trim_end());

    let _ = writeln!(s, "  attributes ({}):", self.attributes.len());
    for attr in &self.attributes {
      let _ = writeln!(
        s,
        "    name={}, type={}, size={}, location={}",
        attr.name,
        attribute_type_name(attr.ty),
        attr.size,
        attr.location
      );
    }

    let _ = writeln!(s, "  uniforms ({}):", self.uniforms.len());
    for uniform in &self.uniforms {
      let _ = writeln!(
        s,
        "    name={}, type={}, size={}, location={}",
        uniform.name,
        uniform_type_name(uniform.ty),
        uniform.size,
        uniform.location
      );
    }

    s
  }
}

impl<B> Resource for Program<B>
where
  B: Backend,
{
  fn name(&self) -> u32 {
    self.name
  }
}

impl<B> fmt::Debug for Program<B>
where
  B: Backend,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Program")
      .field("name", &self.name)
      .field("linked", &self.linked)
      .field("attributes", &self.attributes)
      .field("uniforms", &self.uniforms)
      .finish()
  }
}

impl<B> Drop for Program<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    let name = self.name;
    let mut st = self.state.borrow_mut();

    st.on_delete_program(name);
    st.call(|b| b.delete_program(name));
  }
}

// Map a GL enum to its symbolic name, or "unknown".
macro_rules! gl_type_name {
  ($ty:expr; $($name:ident),* $(,)?) => {
    match $ty {
      $(gl::$name => concat!("GL_", stringify!($name)),)*
      _ => "unknown",
    }
  };
}

/// Symbolic name of a reflected attribute type.
pub fn attribute_type_name(ty: u32) -> &'static str {
  gl_type_name!(ty;
    FLOAT, FLOAT_VEC2, FLOAT_VEC3, FLOAT_VEC4,
    FLOAT_MAT2, FLOAT_MAT3, FLOAT_MAT4,
    FLOAT_MAT2x3, FLOAT_MAT2x4, FLOAT_MAT3x2, FLOAT_MAT3x4, FLOAT_MAT4x2, FLOAT_MAT4x3,
    INT, INT_VEC2, INT_VEC3, INT_VEC4,
    UNSIGNED_INT, UNSIGNED_INT_VEC2, UNSIGNED_INT_VEC3, UNSIGNED_INT_VEC4,
    DOUBLE, DOUBLE_VEC2, DOUBLE_VEC3, DOUBLE_VEC4,
    DOUBLE_MAT2, DOUBLE_MAT3, DOUBLE_MAT4,
    DOUBLE_MAT2x3, DOUBLE_MAT2x4, DOUBLE_MAT3x2, DOUBLE_MAT3x4, DOUBLE_MAT4x2, DOUBLE_MAT4x3,
  )
}

/// Symbolic name of a reflected uniform type.
pub fn uniform_type_name(ty: u32) -> &'static str {
  gl_type_name!(ty;
    FLOAT, FLOAT_VEC2, FLOAT_VEC3, FLOAT_VEC4,
    DOUBLE, DOUBLE_VEC2, DOUBLE_VEC3, DOUBLE_VEC4,
    INT, INT_VEC2, INT_VEC3, INT_VEC4,
    UNSIGNED_INT, UNSIGNED_INT_VEC2, UNSIGNED_INT_VEC3, UNSIGNED_INT_VEC4,
    BOOL, BOOL_VEC2, BOOL_VEC3, BOOL_VEC4,
    FLOAT_MAT2, FLOAT_MAT3, FLOAT_MAT4,
    FLOAT_MAT2x3, FLOAT_MAT2x4, FLOAT_MAT3x2, FLOAT_MAT3x4, FLOAT_MAT4x2, FLOAT_MAT4x3,
    DOUBLE_MAT2, DOUBLE_MAT3, DOUBLE_MAT4,
    DOUBLE_MAT2x3, DOUBLE_MAT2x4, DOUBLE_MAT3x2, DOUBLE_MAT3x4, DOUBLE_MAT4x2, DOUBLE_MAT4x3,
    SAMPLER_1D, SAMPLER_2D, SAMPLER_3D, SAMPLER_CUBE,
    SAMPLER_1D_SHADOW, SAMPLER_2D_SHADOW,
    SAMPLER_1D_ARRAY, SAMPLER_2D_ARRAY, SAMPLER_1D_ARRAY_SHADOW, SAMPLER_2D_ARRAY_SHADOW,
    SAMPLER_2D_MULTISAMPLE, SAMPLER_2D_MULTISAMPLE_ARRAY, SAMPLER_CUBE_SHADOW,
    SAMPLER_BUFFER, SAMPLER_2D_RECT, SAMPLER_2D_RECT_SHADOW,
    INT_SAMPLER_1D, INT_SAMPLER_2D, INT_SAMPLER_3D, INT_SAMPLER_CUBE,
    INT_SAMPLER_1D_ARRAY, INT_SAMPLER_2D_ARRAY,
    INT_SAMPLER_2D_MULTISAMPLE, INT_SAMPLER_2D_MULTISAMPLE_ARRAY,
    INT_SAMPLER_BUFFER, INT_SAMPLER_2D_RECT,
    UNSIGNED_INT_SAMPLER_1D, UNSIGNED_INT_SAMPLER_2D, UNSIGNED_INT_SAMPLER_3D,
    UNSIGNED_INT_SAMPLER_CUBE, UNSIGNED_INT_SAMPLER_1D_ARRAY, UNSIGNED_INT_SAMPLER_2D_ARRAY,
    UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE, UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE_ARRAY,
    UNSIGNED_INT_SAMPLER_BUFFER, UNSIGNED_INT_SAMPLER_2D_RECT,
    IMAGE_1D, IMAGE_2D, IMAGE_3D, IMAGE_2D_RECT, IMAGE_CUBE, IMAGE_BUFFER,
    IMAGE_1D_ARRAY, IMAGE_2D_ARRAY, IMAGE_2D_MULTISAMPLE, IMAGE_2D_MULTISAMPLE_ARRAY,
    INT_IMAGE_1D, INT_IMAGE_2D, INT_IMAGE_3D, INT_IMAGE_2D_RECT, INT_IMAGE_CUBE,
    INT_IMAGE_BUFFER, INT_IMAGE_1D_ARRAY, INT_IMAGE_2D_ARRAY,
    INT_IMAGE_2D_MULTISAMPLE, INT_IMAGE_2D_MULTISAMPLE_ARRAY,
    UNSIGNED_INT_IMAGE_1D, UNSIGNED_INT_IMAGE_2D, UNSIGNED_INT_IMAGE_3D,
    UNSIGNED_INT_IMAGE_2D_RECT, UNSIGNED_INT_IMAGE_CUBE, UNSIGNED_INT_IMAGE_BUFFER,
    UNSIGNED_INT_IMAGE_1D_ARRAY, UNSIGNED_INT_IMAGE_2D_ARRAY,
    UNSIGNED_INT_IMAGE_2D_MULTISAMPLE, UNSIGNED_INT_IMAGE_2D_MULTISAMPLE_ARRAY,
    UNSIGNED_INT_ATOMIC_COUNTER,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::trace::TraceBackend;

  const VS: &str = "
    #version 330 core
    in vec3 co;
    in vec2 uv;
    uniform mat4 model;
    uniform mat4 bones[4];
    void main() {}
  ";

  const FS: &str = "
    #version 330 core
    uniform sampler2D tex;
    uniform mat4 model;
    out vec4 frag;
    void main() {}
  ";

  fn state() -> Rc<RefCell<GfxState<TraceBackend>>> {
    Rc::new(RefCell::new(GfxState::new(TraceBackend::new(), true, None)))
  }

  #[test]
  fn reflection() {
    let state = state();
    let vs = Handle::new(Shader::new(&state, ShaderKind::Vertex, VS));
    let fs = Handle::new(Shader::new(&state, ShaderKind::Pixel, FS));
    let program = Program::new(&state, &vs, &fs);

    assert!(program.is_linked());

    let attrs: Vec<_> = program.attributes().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(attrs, ["co", "uv"]);
    assert_eq!(program.attributes()[0].ty, gl::FLOAT_VEC3);

    assert_eq!(program.uniforms().len(), 3);
    assert_eq!(program.uniform_location("model"), Some(0));
    assert_eq!(program.uniform_location("bones"), Some(1));
    assert_eq!(program.uniform_location("bones[0]"), Some(1));
    assert_eq!(program.uniform("bones").map(|u| u.size), Some(4));
    assert_eq!(program.uniform_location("tex"), Some(5));
    assert_eq!(program.uniform_location("view"), None);
  }

  #[test]
  fn compile_failure_is_recorded() {
    let state = state();
    let fs = Handle::new(Shader::new(&state, ShaderKind::Pixel, "#error broken\n"));

    assert!(!fs.is_compiled());
    assert!(fs.info_log().contains("broken"));
    assert!(fs.is_valid());
    assert!(fs.dump_debug_info().contains("compiled: false"));

    let vs = Handle::new(Shader::new(&state, ShaderKind::Vertex, VS));
    let program = Program::new(&state, &vs, &fs);

    assert!(!program.is_linked());
    assert!(!program.info_log().is_empty());
    assert!(program.uniforms().is_empty());
    assert_eq!(program.uniform_location("model"), None);
  }

  #[test]
  fn dump_lists_reflection() {
    let state = state();
    let vs = Handle::new(Shader::new(&state, ShaderKind::Vertex, VS));
    let fs = Handle::new(Shader::new(&state, ShaderKind::Pixel, FS));
    let program = Program::new(&state, &vs, &fs);

    let dump = program.dump_debug_info();
    assert!(dump.contains("name=co, type=GL_FLOAT_VEC3, size=1, location=0"));
    assert!(dump.contains("name=bones[0], type=GL_FLOAT_MAT4, size=4, location=1"));
    assert!(dump.contains("name=tex, type=GL_SAMPLER_2D"));
  }

  #[test]
  fn type_names() {
    assert_eq!(attribute_type_name(gl::FLOAT_MAT4x3), "GL_FLOAT_MAT4x3");
    assert_eq!(attribute_type_name(gl::SAMPLER_2D), "unknown");
    assert_eq!(uniform_type_name(gl::SAMPLER_2D), "GL_SAMPLER_2D");
    assert_eq!(uniform_type_name(0), "unknown");
  }
}
