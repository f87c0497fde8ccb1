//! Program parameters.
//!
//! A [`ProgramParameters`] list binds uniform names to values. The device reads the list it was
//! given right before every draw and uploads each value whose name is found in the bound
//! program’s reflected uniforms. Names the program doesn’t know are silently skipped, so a single
//! list can be shared by several programs.

use std::cell::RefCell;
use std::rc::Rc;

/// Value of a uniform.
///
/// Every variant holds a list of values so that uniform arrays can be uploaded at once; the
/// element count is the length of the list.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
  Int1(Vec<i32>),
  Int2(Vec<[i32; 2]>),
  Int3(Vec<[i32; 3]>),
  Int4(Vec<[i32; 4]>),
  UInt1(Vec<u32>),
  UInt2(Vec<[u32; 2]>),
  UInt3(Vec<[u32; 3]>),
  UInt4(Vec<[u32; 4]>),
  Float1(Vec<f32>),
  Float2(Vec<[f32; 2]>),
  Float3(Vec<[f32; 3]>),
  Float4(Vec<[f32; 4]>),
  /// Column-major 4×4 matrices, uploaded without transposition.
  Mat4(Vec<[f32; 16]>),
}

impl UniformValue {
  /// Number of elements (1 for a non-array uniform).
  pub fn count(&self) -> usize {
    match self {
      UniformValue::Int1(v) => v.len(),
      UniformValue::Int2(v) => v.len(),
      UniformValue::Int3(v) => v.len(),
      UniformValue::Int4(v) => v.len(),
      UniformValue::UInt1(v) => v.len(),
      UniformValue::UInt2(v) => v.len(),
      UniformValue::UInt3(v) => v.len(),
      UniformValue::UInt4(v) => v.len(),
      UniformValue::Float1(v) => v.len(),
      UniformValue::Float2(v) => v.len(),
      UniformValue::Float3(v) => v.len(),
      UniformValue::Float4(v) => v.len(),
      UniformValue::Mat4(v) => v.len(),
    }
  }
}

impl From<i32> for UniformValue {
  fn from(x: i32) -> Self {
    UniformValue::Int1(vec![x])
  }
}

impl From<u32> for UniformValue {
  fn from(x: u32) -> Self {
    UniformValue::UInt1(vec![x])
  }
}

impl From<f32> for UniformValue {
  fn from(x: f32) -> Self {
    UniformValue::Float1(vec![x])
  }
}

impl From<[f32; 2]> for UniformValue {
  fn from(x: [f32; 2]) -> Self {
    UniformValue::Float2(vec![x])
  }
}

impl From<[f32; 3]> for UniformValue {
  fn from(x: [f32; 3]) -> Self {
    UniformValue::Float3(vec![x])
  }
}

impl From<[f32; 4]> for UniformValue {
  fn from(x: [f32; 4]) -> Self {
    UniformValue::Float4(vec![x])
  }
}

impl From<[f32; 16]> for UniformValue {
  fn from(x: [f32; 16]) -> Self {
    UniformValue::Mat4(vec![x])
  }
}

/// A named uniform value.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramParameter {
  name: String,
  value: UniformValue,
}

impl ProgramParameter {
  pub fn new(name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
    ProgramParameter {
      name: name.into(),
      value: value.into(),
    }
  }

  pub fn int(name: impl Into<String>, x: i32) -> Self {
    Self::new(name, x)
  }

  pub fn uint(name: impl Into<String>, x: u32) -> Self {
    Self::new(name, x)
  }

  pub fn float(name: impl Into<String>, x: f32) -> Self {
    Self::new(name, x)
  }

  pub fn vec4(name: impl Into<String>, x: [f32; 4]) -> Self {
    Self::new(name, x)
  }

  /// A single column-major 4×4 matrix.
  pub fn mat4(name: impl Into<String>, m: [f32; 16]) -> Self {
    Self::new(name, m)
  }

  /// An array of column-major 4×4 matrices.
  pub fn mat4_array(name: impl Into<String>, ms: Vec<[f32; 16]>) -> Self {
    Self::new(name, UniformValue::Mat4(ms))
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn value(&self) -> &UniformValue {
    &self.value
  }

  pub fn set_value(&mut self, value: impl Into<UniformValue>) {
    self.value = value.into();
  }
}

/// Ordered list of program parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgramParameters {
  params: Vec<ProgramParameter>,
}

/// Parameter list shared between its owner and the device.
///
/// The device only keeps a reference: mutations done by the owner between two draws are seen by
/// the next draw.
pub type SharedParameters = Rc<RefCell<ProgramParameters>>;

impl ProgramParameters {
  pub fn new() -> Self {
    Self::default()
  }

  /// Wrap into a list that can be handed to the device.
  pub fn into_shared(self) -> SharedParameters {
    Rc::new(RefCell::new(self))
  }

  /// Append a parameter, even if one with the same name already exists.
  pub fn push(&mut self, param: ProgramParameter) {
    self.params.push(param);
  }

  /// Replace the value of the parameter named `name`, or append a new one.
  pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) {
    match self.params.iter_mut().find(|p| p.name == name) {
      Some(param) => param.set_value(value),
      None => self.params.push(ProgramParameter::new(name, value)),
    }
  }

  pub fn get(&self, name: &str) -> Option<&ProgramParameter> {
    self.params.iter().find(|p| p.name == name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &ProgramParameter> {
    self.params.iter()
  }

  pub fn len(&self) -> usize {
    self.params.len()
  }

  pub fn is_empty(&self) -> bool {
    self.params.is_empty()
  }

  pub fn clear(&mut self) {
    self.params.clear();
  }
}
