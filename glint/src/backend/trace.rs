//! Recording backend.
//!
//! [`TraceBackend`] doesn’t render anything. It records every mutating call it receives as a
//! [`Call`] in a [`TraceLog`], and emulates just enough of an OpenGL context for the core to run
//! against it:
//!
//! - Names are allocated the way OpenGL does: the lowest free name first, so a deleted name is
//!   handed out again by the next allocation of the same kind.
//! - Buffer contents are stored, so locks read and write real memory and indexed draws record the
//!   indices they actually read.
//! - Shaders fail to compile when their source contains an `#error` directive; programs link when
//!   both a compiled vertex and pixel shader are attached. Reflection is derived from the `in` /
//!   `attribute` and `uniform` declarations of the sources.
//! - Framebuffers are complete when they have at least one attachment and every color attachment
//!   their draw buffers reference.
//!
//! Errors can be injected with [`TraceLog::inject_error`]; the backend also raises
//! `GL_INVALID_OPERATION` / `GL_INVALID_VALUE` on misuse (mapping twice, mapping out of range, …).

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

use crate::backend::{
  Backend, BufferTarget, ErrorCode, FramebufferTarget, IndexType, TextureParameter,
};
use crate::buffer::{BufferUsage, LockAccess};
use crate::device::Primitive;
use crate::framebuffer::{Attachment, BlitFilter, ClearMask, ColorBuffer, IncompleteReason};
use crate::parameter::UniformValue;
use crate::shader::{ActiveVariable, ShaderKind};
use crate::texture::{InternalFormat, TextureDesc};
use crate::vertex::AttribFormat;

/// A recorded backend call.
///
/// Generating calls record the name they returned.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
  GenBuffer(u32),
  DeleteBuffer(u32),
  BindBuffer(BufferTarget, u32),
  BufferData(BufferTarget, usize, BufferUsage),
  MapBufferRange(BufferTarget, usize, usize, LockAccess),
  UnmapBuffer(BufferTarget),
  GenVertexArray(u32),
  DeleteVertexArray(u32),
  BindVertexArray(u32),
  VertexAttribPointer(u32, AttribFormat, u32, usize),
  VertexAttribIPointer(u32, AttribFormat, u32, usize),
  EnableVertexAttribArray(u32),
  DisableVertexAttribArray(u32),
  CreateShader(ShaderKind, u32),
  CompileShader(u32),
  DeleteShader(u32),
  CreateProgram(u32),
  AttachShader(u32, u32),
  LinkProgram(u32),
  UseProgram(u32),
  DeleteProgram(u32),
  Uniform(i32, UniformValue),
  GenTexture(u32),
  DeleteTexture(u32),
  ActiveTexture(u32),
  BindTexture2d(u32),
  /// Texture storage allocation; the flag tells whether texels were uploaded.
  TexImage2d(TextureDesc, bool),
  TexParameter2d(TextureParameter),
  GenerateMipmap2d,
  GenRenderBuffer(u32),
  DeleteRenderBuffer(u32),
  BindRenderBuffer(u32),
  RenderBufferStorage(InternalFormat, u32, u32),
  GenFramebuffer(u32),
  DeleteFramebuffer(u32),
  BindFramebuffer(FramebufferTarget, u32),
  FramebufferTexture2d(Attachment, u32),
  FramebufferRenderBuffer(Attachment, u32),
  DrawBuffers(Vec<ColorBuffer>),
  ReadBuffer(ColorBuffer),
  BlitFramebuffer(u32, u32, ClearMask, BlitFilter),
  ClearColor([f32; 4]),
  Clear(ClearMask),
  DrawArrays(Primitive, u32, u32),
  DrawElements {
    mode: Primitive,
    count: u32,
    ty: IndexType,
    offset: usize,
    /// Indices read from the bound element buffer.
    indices: Vec<u32>,
  },
}

impl Call {
  /// Whether the call changes a binding.
  pub fn is_bind(&self) -> bool {
    matches!(
      self,
      Call::BindBuffer(..)
        | Call::BindVertexArray(_)
        | Call::UseProgram(_)
        | Call::ActiveTexture(_)
        | Call::BindTexture2d(_)
        | Call::BindRenderBuffer(_)
        | Call::BindFramebuffer(..)
    )
  }

  /// Whether the call is a draw.
  pub fn is_draw(&self) -> bool {
    matches!(self, Call::DrawArrays(..) | Call::DrawElements { .. })
  }
}

#[derive(Debug, Default)]
struct LogInner {
  calls: Vec<Call>,
  errors: VecDeque<ErrorCode>,
}

/// Shared view on the calls recorded by a [`TraceBackend`].
///
/// Grab it with [`TraceBackend::log`] before handing the backend over to a device.
#[derive(Clone, Debug, Default)]
pub struct TraceLog(Rc<RefCell<LogInner>>);

impl TraceLog {
  /// All calls recorded so far.
  pub fn calls(&self) -> Vec<Call> {
    self.0.borrow().calls.clone()
  }

  /// Take all calls recorded so far, leaving the log empty.
  pub fn take(&self) -> Vec<Call> {
    std::mem::take(&mut self.0.borrow_mut().calls)
  }

  pub fn clear(&self) {
    self.0.borrow_mut().calls.clear();
  }

  pub fn len(&self) -> usize {
    self.0.borrow().calls.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.borrow().calls.is_empty()
  }

  /// Number of recorded calls satisfying a predicate.
  pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
    self.0.borrow().calls.iter().filter(|call| pred(call)).count()
  }

  /// Number of recorded binding calls.
  pub fn bind_count(&self) -> usize {
    self.count(Call::is_bind)
  }

  /// Raise an error; it will be returned by the next error-flag query.
  pub fn inject_error(&self, code: ErrorCode) {
    self.0.borrow_mut().errors.push_back(code);
  }

  /// Number of raised errors nobody queried yet.
  pub fn pending_errors(&self) -> usize {
    self.0.borrow().errors.len()
  }

  fn record(&self, call: Call) {
    self.0.borrow_mut().calls.push(call);
  }
}

// Names of one kind, allocated lowest first.
#[derive(Debug, Default)]
struct NamePool {
  live: BTreeSet<u32>,
}

impl NamePool {
  fn alloc(&mut self) -> u32 {
    let mut name = 1;

    for &live in &self.live {
      if live != name {
        break;
      }

      name += 1;
    }

    self.live.insert(name);
    name
  }

  fn free(&mut self, name: u32) -> bool {
    self.live.remove(&name)
  }

  fn contains(&self, name: u32) -> bool {
    self.live.contains(&name)
  }
}

#[derive(Debug)]
struct ShaderObject {
  kind: ShaderKind,
  source: String,
  compiled: bool,
  log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
  shaders: Vec<u32>,
  linked: bool,
  log: String,
  attributes: Vec<ActiveVariable>,
  uniforms: Vec<ActiveVariable>,
}

#[derive(Debug, Default)]
struct FramebufferObject {
  attachments: Vec<Attachment>,
  draw_buffers: Vec<ColorBuffer>,
}

/// Backend recording calls instead of rendering.
#[derive(Debug, Default)]
pub struct TraceBackend {
  log: TraceLog,
  buffers: NamePool,
  vertex_arrays: NamePool,
  objects: NamePool,
  textures: NamePool,
  render_buffers: NamePool,
  framebuffers: NamePool,
  buffer_storage: HashMap<u32, Vec<u8>>,
  mapped: BTreeSet<u32>,
  array_buffer: u32,
  element_buffer: u32,
  shaders: HashMap<u32, ShaderObject>,
  programs: HashMap<u32, ProgramObject>,
  framebuffer_objects: HashMap<u32, FramebufferObject>,
  draw_framebuffer: u32,
  read_framebuffer: u32,
}

impl TraceBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Shared handle on the recorded calls.
  pub fn log(&self) -> TraceLog {
    self.log.clone()
  }

  fn raise(&self, code: u32) {
    self.log.inject_error(ErrorCode(code));
  }

  fn bound_buffer(&self, target: BufferTarget) -> u32 {
    match target {
      BufferTarget::Array => self.array_buffer,
      BufferTarget::ElementArray => self.element_buffer,
    }
  }

  // Read `count` indices from the bound element buffer.
  fn read_indices(&self, count: u32, ty: IndexType, offset: usize) -> Option<Vec<u32>> {
    let storage = self.buffer_storage.get(&self.element_buffer)?;
    let end = offset + count as usize * ty.bytes();
    let bytes = storage.get(offset..end)?;

    let indices = match ty {
      IndexType::U16 => bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
        .collect(),
      IndexType::U32 => bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect(),
    };

    Some(indices)
  }

  fn link(&self, program: &ProgramObject) -> Result<(Vec<ActiveVariable>, Vec<ActiveVariable>), String> {
    let shaders: Vec<&ShaderObject> = program
      .shaders
      .iter()
      .filter_map(|name| self.shaders.get(name))
      .collect();

    for &kind in &[ShaderKind::Vertex, ShaderKind::Pixel] {
      if !shaders.iter().any(|s| s.kind == kind) {
        return Err(format!("link error: no {:?} shader attached", kind));
      }
    }

    if let Some(s) = shaders.iter().find(|s| !s.compiled) {
      return Err(format!("link error: {:?} shader is not compiled", s.kind));
    }

    let mut attributes = Vec::new();
    let mut uniforms: Vec<ActiveVariable> = Vec::new();

    for shader in &shaders {
      for decl in declarations(&shader.source) {
        match decl.storage {
          Storage::Input if shader.kind == ShaderKind::Vertex => {
            let location = attributes.len() as i32;
            attributes.push(decl.into_variable(location));
          }

          Storage::Uniform if !uniforms.iter().any(|u| u.name == decl.reflected_name()) => {
            // block members have no location of their own
            let location = if decl.in_block {
              -1
            } else {
              uniforms
                .iter()
                .filter(|u| u.location >= 0)
                .map(|u| u.size)
                .sum::<i32>()
            };

            uniforms.push(decl.into_variable(location));
          }

          _ => (),
        }
      }
    }

    Ok((attributes, uniforms))
  }
}

unsafe impl Backend for TraceBackend {
  fn get_error(&mut self) -> Option<ErrorCode> {
    self.log.0.borrow_mut().errors.pop_front()
  }

  fn gen_buffer(&mut self) -> u32 {
    let name = self.buffers.alloc();
    self.buffer_storage.insert(name, Vec::new());
    self.log.record(Call::GenBuffer(name));
    name
  }

  fn delete_buffer(&mut self, buffer: u32) {
    self.log.record(Call::DeleteBuffer(buffer));

    if self.buffers.free(buffer) {
      self.buffer_storage.remove(&buffer);
      self.mapped.remove(&buffer);

      if self.array_buffer == buffer {
        self.array_buffer = 0;
      }

      if self.element_buffer == buffer {
        self.element_buffer = 0;
      }
    }
  }

  fn is_buffer(&self, buffer: u32) -> bool {
    self.buffers.contains(buffer)
  }

  fn bind_buffer(&mut self, target: BufferTarget, buffer: u32) {
    self.log.record(Call::BindBuffer(target, buffer));

    if buffer != 0 && !self.buffers.contains(buffer) {
      self.raise(gl::INVALID_VALUE);
      return;
    }

    match target {
      BufferTarget::Array => self.array_buffer = buffer,
      BufferTarget::ElementArray => self.element_buffer = buffer,
    }
  }

  fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
    self.log.record(Call::BufferData(target, size, usage));

    let bound = self.bound_buffer(target);
    match self.buffer_storage.get_mut(&bound) {
      Some(storage) => {
        *storage = vec![0; size];

        if let Some(data) = data {
          let len = data.len().min(size);
          storage[..len].copy_from_slice(&data[..len]);
        }
      }

      None => self.raise(gl::INVALID_OPERATION),
    }
  }

  fn map_buffer_range(
    &mut self,
    target: BufferTarget,
    offset: usize,
    len: usize,
    access: LockAccess,
  ) -> *mut u8 {
    self.log.record(Call::MapBufferRange(target, offset, len, access));

    let bound = self.bound_buffer(target);

    if self.mapped.contains(&bound) {
      self.raise(gl::INVALID_OPERATION);
      return std::ptr::null_mut();
    }

    match self.buffer_storage.get_mut(&bound) {
      Some(storage) if offset + len <= storage.len() => {
        self.mapped.insert(bound);
        storage[offset..].as_mut_ptr()
      }

      _ => {
        self.raise(gl::INVALID_VALUE);
        std::ptr::null_mut()
      }
    }
  }

  fn unmap_buffer(&mut self, target: BufferTarget) -> bool {
    self.log.record(Call::UnmapBuffer(target));

    let bound = self.bound_buffer(target);
    if self.mapped.remove(&bound) {
      true
    } else {
      self.raise(gl::INVALID_OPERATION);
      false
    }
  }

  fn gen_vertex_array(&mut self) -> u32 {
    let name = self.vertex_arrays.alloc();
    self.log.record(Call::GenVertexArray(name));
    name
  }

  fn delete_vertex_array(&mut self, vertex_array: u32) {
    self.log.record(Call::DeleteVertexArray(vertex_array));
    self.vertex_arrays.free(vertex_array);
  }

  fn bind_vertex_array(&mut self, vertex_array: u32) {
    self.log.record(Call::BindVertexArray(vertex_array));
  }

  fn vertex_attrib_pointer(&mut self, index: u32, format: AttribFormat, stride: u32, offset: usize) {
    self
      .log
      .record(Call::VertexAttribPointer(index, format, stride, offset));
  }

  fn vertex_attrib_i_pointer(&mut self, index: u32, format: AttribFormat, stride: u32, offset: usize) {
    self
      .log
      .record(Call::VertexAttribIPointer(index, format, stride, offset));
  }

  fn enable_vertex_attrib_array(&mut self, index: u32) {
    self.log.record(Call::EnableVertexAttribArray(index));
  }

  fn disable_vertex_attrib_array(&mut self, index: u32) {
    self.log.record(Call::DisableVertexAttribArray(index));
  }

  fn create_shader(&mut self, kind: ShaderKind) -> u32 {
    let name = self.objects.alloc();
    self.shaders.insert(
      name,
      ShaderObject {
        kind,
        source: String::new(),
        compiled: false,
        log: String::new(),
      },
    );
    self.log.record(Call::CreateShader(kind, name));
    name
  }

  fn compile_shader(&mut self, shader: u32, source: &str) {
    self.log.record(Call::CompileShader(shader));

    let object = match self.shaders.get_mut(&shader) {
      Some(object) => object,
      None => {
        self.raise(gl::INVALID_VALUE);
        return;
      }
    };

    object.source = source.to_owned();
    object.log.clear();
    object.compiled = true;

    for (line, text) in source.lines().enumerate() {
      if let Some(message) = text.trim().strip_prefix("#error") {
        object.compiled = false;
        object.log += &format!("0:{}: error: {}\n", line + 1, message.trim());
      }
    }
  }

  fn shader_compile_status(&self, shader: u32) -> bool {
    self.shaders.get(&shader).map_or(false, |s| s.compiled)
  }

  fn shader_info_log(&self, shader: u32) -> String {
    self
      .shaders
      .get(&shader)
      .map(|s| s.log.clone())
      .unwrap_or_default()
  }

  fn is_shader(&self, shader: u32) -> bool {
    self.shaders.contains_key(&shader)
  }

  fn delete_shader(&mut self, shader: u32) {
    self.log.record(Call::DeleteShader(shader));

    if self.shaders.remove(&shader).is_some() {
      self.objects.free(shader);
    }
  }

  fn create_program(&mut self) -> u32 {
    let name = self.objects.alloc();
    self.programs.insert(name, ProgramObject::default());
    self.log.record(Call::CreateProgram(name));
    name
  }

  fn attach_shader(&mut self, program: u32, shader: u32) {
    self.log.record(Call::AttachShader(program, shader));

    match self.programs.get_mut(&program) {
      Some(object) if self.shaders.contains_key(&shader) => object.shaders.push(shader),
      _ => self.raise(gl::INVALID_VALUE),
    }
  }

  fn link_program(&mut self, program: u32) {
    self.log.record(Call::LinkProgram(program));

    let result = match self.programs.get(&program) {
      Some(object) => self.link(object),
      None => {
        self.raise(gl::INVALID_VALUE);
        return;
      }
    };

    if let Some(object) = self.programs.get_mut(&program) {
      match result {
        Ok((attributes, uniforms)) => {
          object.linked = true;
          object.log.clear();
          object.attributes = attributes;
          object.uniforms = uniforms;
        }

        Err(log) => {
          object.linked = false;
          object.log = log;
          object.attributes.clear();
          object.uniforms.clear();
        }
      }
    }
  }

  fn program_link_status(&self, program: u32) -> bool {
    self.programs.get(&program).map_or(false, |p| p.linked)
  }

  fn program_info_log(&self, program: u32) -> String {
    self
      .programs
      .get(&program)
      .map(|p| p.log.clone())
      .unwrap_or_default()
  }

  fn active_attributes(&self, program: u32) -> Vec<ActiveVariable> {
    self
      .programs
      .get(&program)
      .map(|p| p.attributes.clone())
      .unwrap_or_default()
  }

  fn active_uniforms(&self, program: u32) -> Vec<ActiveVariable> {
    self
      .programs
      .get(&program)
      .map(|p| p.uniforms.clone())
      .unwrap_or_default()
  }

  fn is_program(&self, program: u32) -> bool {
    self.programs.contains_key(&program)
  }

  fn use_program(&mut self, program: u32) {
    self.log.record(Call::UseProgram(program));

    if program != 0 && !self.program_link_status(program) {
      self.raise(gl::INVALID_OPERATION);
    }
  }

  fn delete_program(&mut self, program: u32) {
    self.log.record(Call::DeleteProgram(program));

    if self.programs.remove(&program).is_some() {
      self.objects.free(program);
    }
  }

  fn uniform(&mut self, location: i32, value: &UniformValue) {
    self.log.record(Call::Uniform(location, value.clone()));
  }

  fn gen_texture(&mut self) -> u32 {
    let name = self.textures.alloc();
    self.log.record(Call::GenTexture(name));
    name
  }

  fn delete_texture(&mut self, texture: u32) {
    self.log.record(Call::DeleteTexture(texture));
    self.textures.free(texture);
  }

  fn active_texture(&mut self, unit: u32) {
    self.log.record(Call::ActiveTexture(unit));
  }

  fn bind_texture_2d(&mut self, texture: u32) {
    self.log.record(Call::BindTexture2d(texture));

    if texture != 0 && !self.textures.contains(texture) {
      self.raise(gl::INVALID_VALUE);
    }
  }

  fn tex_image_2d(&mut self, desc: &TextureDesc, data: Option<&[u8]>) {
    self.log.record(Call::TexImage2d(*desc, data.is_some()));
  }

  fn tex_parameter_2d(&mut self, param: TextureParameter) {
    self.log.record(Call::TexParameter2d(param));
  }

  fn generate_mipmap_2d(&mut self) {
    self.log.record(Call::GenerateMipmap2d);
  }

  fn gen_render_buffer(&mut self) -> u32 {
    let name = self.render_buffers.alloc();
    self.log.record(Call::GenRenderBuffer(name));
    name
  }

  fn delete_render_buffer(&mut self, render_buffer: u32) {
    self.log.record(Call::DeleteRenderBuffer(render_buffer));
    self.render_buffers.free(render_buffer);
  }

  fn bind_render_buffer(&mut self, render_buffer: u32) {
    self.log.record(Call::BindRenderBuffer(render_buffer));
  }

  fn render_buffer_storage(&mut self, format: InternalFormat, width: u32, height: u32) {
    self
      .log
      .record(Call::RenderBufferStorage(format, width, height));
  }

  fn gen_framebuffer(&mut self) -> u32 {
    let name = self.framebuffers.alloc();
    self
      .framebuffer_objects
      .insert(name, FramebufferObject::default());
    self.log.record(Call::GenFramebuffer(name));
    name
  }

  fn delete_framebuffer(&mut self, framebuffer: u32) {
    self.log.record(Call::DeleteFramebuffer(framebuffer));

    if self.framebuffers.free(framebuffer) {
      self.framebuffer_objects.remove(&framebuffer);

      if self.draw_framebuffer == framebuffer {
        self.draw_framebuffer = 0;
      }

      if self.read_framebuffer == framebuffer {
        self.read_framebuffer = 0;
      }
    }
  }

  fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: u32) {
    self.log.record(Call::BindFramebuffer(target, framebuffer));

    if framebuffer != 0 && !self.framebuffers.contains(framebuffer) {
      self.raise(gl::INVALID_OPERATION);
      return;
    }

    match target {
      FramebufferTarget::Both => {
        self.draw_framebuffer = framebuffer;
        self.read_framebuffer = framebuffer;
      }

      FramebufferTarget::Draw => self.draw_framebuffer = framebuffer,
      FramebufferTarget::Read => self.read_framebuffer = framebuffer,
    }
  }

  fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: u32) {
    self
      .log
      .record(Call::FramebufferTexture2d(attachment, texture));
    self.attach(attachment, texture);
  }

  fn framebuffer_render_buffer(&mut self, attachment: Attachment, render_buffer: u32) {
    self
      .log
      .record(Call::FramebufferRenderBuffer(attachment, render_buffer));
    self.attach(attachment, render_buffer);
  }

  fn draw_buffers(&mut self, buffers: &[ColorBuffer]) {
    self.log.record(Call::DrawBuffers(buffers.to_vec()));

    match self.framebuffer_objects.get_mut(&self.draw_framebuffer) {
      Some(object) => object.draw_buffers = buffers.to_vec(),
      None if self.draw_framebuffer == 0 => (),
      None => self.raise(gl::INVALID_OPERATION),
    }
  }

  fn read_buffer(&mut self, buffer: ColorBuffer) {
    self.log.record(Call::ReadBuffer(buffer));
  }

  fn check_framebuffer_status(&self) -> Result<(), IncompleteReason> {
    let object = match self.framebuffer_objects.get(&self.draw_framebuffer) {
      Some(object) => object,
      None => return Ok(()),
    };

    if object.attachments.is_empty() {
      return Err(IncompleteReason::MissingAttachment);
    }

    let dangling = object.draw_buffers.iter().any(|buffer| match *buffer {
      ColorBuffer::Attachment(i) => !object.attachments.contains(&Attachment::Color(i)),
      _ => false,
    });

    if dangling {
      return Err(IncompleteReason::IncompleteDrawBuffer);
    }

    Ok(())
  }

  fn blit_framebuffer(&mut self, width: u32, height: u32, mask: ClearMask, filter: BlitFilter) {
    self
      .log
      .record(Call::BlitFramebuffer(width, height, mask, filter));
  }

  fn clear_color(&mut self, color: [f32; 4]) {
    self.log.record(Call::ClearColor(color));
  }

  fn clear(&mut self, mask: ClearMask) {
    self.log.record(Call::Clear(mask));
  }

  fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32) {
    self.log.record(Call::DrawArrays(mode, first, count));
  }

  fn draw_elements(&mut self, mode: Primitive, count: u32, ty: IndexType, offset: usize) {
    let indices = match self.read_indices(count, ty, offset) {
      Some(indices) => indices,
      None => {
        self.raise(gl::INVALID_OPERATION);
        Vec::new()
      }
    };

    self.log.record(Call::DrawElements {
      mode,
      count,
      ty,
      offset,
      indices,
    });
  }
}

impl TraceBackend {
  // Attach (or detach, with name 0) an object to the draw framebuffer.
  fn attach(&mut self, attachment: Attachment, name: u32) {
    let object = match self.framebuffer_objects.get_mut(&self.draw_framebuffer) {
      Some(object) => object,
      None => {
        self.raise(gl::INVALID_OPERATION);
        return;
      }
    };

    let slots: &[Attachment] = match attachment {
      Attachment::DepthStencil => &[Attachment::Depth, Attachment::Stencil],
      _ => &[attachment],
    };

    object.attachments.retain(|a| !slots.contains(a));

    if name != 0 {
      object.attachments.extend_from_slice(slots);
    }
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Storage {
  Input,
  Uniform,
}

// A global declaration found in a shader source.
#[derive(Debug)]
struct Declaration {
  storage: Storage,
  ty: String,
  name: String,
  array_len: Option<i32>,
  // member of a uniform block
  in_block: bool,
}

impl Declaration {
  fn parse(storage: Storage, ty: &str, name: &str, in_block: bool) -> Self {
    let (name, array_len) = match name.find('[') {
      Some(i) => {
        let len = name[i + 1..].trim_end_matches(']').parse().unwrap_or(1);
        (&name[..i], Some(len))
      }

      None => (name, None),
    };

    Declaration {
      storage,
      ty: ty.to_owned(),
      name: name.to_owned(),
      array_len,
      in_block,
    }
  }

  fn reflected_name(&self) -> String {
    match self.array_len {
      Some(_) => format!("{}[0]", self.name),
      None => self.name.clone(),
    }
  }

  fn into_variable(self, location: i32) -> ActiveVariable {
    ActiveVariable {
      name: self.reflected_name(),
      ty: glsl_type(&self.ty),
      size: self.array_len.unwrap_or(1),
      location,
    }
  }
}

// Scan a source for global `in` / `attribute` / `uniform` declarations, uniform block members
// included.
fn declarations(source: &str) -> Vec<Declaration> {
  const QUALIFIERS: &[&str] = &["flat", "smooth", "noperspective", "lowp", "mediump", "highp"];

  // drop preprocessor lines and line comments
  let source = source
    .lines()
    .map(str::trim_start)
    .filter(|line| !line.starts_with('#') && !line.starts_with("//"))
    .collect::<Vec<_>>()
    .join("\n");

  let mut decls = Vec::new();
  let mut in_block = false;

  for piece in source.split_inclusive(|c| c == ';' || c == '{' || c == '}') {
    let delimiter = piece.chars().last();
    let mut statement = piece
      .trim_end_matches(|c| c == ';' || c == '{' || c == '}')
      .trim();

    if statement.starts_with("layout") {
      if let Some(i) = statement.find(')') {
        statement = &statement[i + 1..];
      }
    }

    let tokens: Vec<&str> = statement
      .split_whitespace()
      .filter(|t| !QUALIFIERS.contains(t))
      .collect();

    if in_block {
      if delimiter == Some('}') {
        in_block = false;
      }

      if let [ty, name, ..] = tokens[..] {
        decls.push(Declaration::parse(Storage::Uniform, ty, name, true));
      }

      continue;
    }

    let storage = match tokens.first() {
      Some(&"in") | Some(&"attribute") => Storage::Input,
      Some(&"uniform") if delimiter == Some('{') => {
        in_block = true;
        continue;
      }
      Some(&"uniform") => Storage::Uniform,
      _ => continue,
    };

    if let [_, ty, name, ..] = tokens[..] {
      decls.push(Declaration::parse(storage, ty, name, false));
    }
  }

  decls
}

fn glsl_type(ty: &str) -> u32 {
  match ty {
    "float" => gl::FLOAT,
    "vec2" => gl::FLOAT_VEC2,
    "vec3" => gl::FLOAT_VEC3,
    "vec4" => gl::FLOAT_VEC4,
    "int" => gl::INT,
    "ivec2" => gl::INT_VEC2,
    "ivec3" => gl::INT_VEC3,
    "ivec4" => gl::INT_VEC4,
    "uint" => gl::UNSIGNED_INT,
    "uvec2" => gl::UNSIGNED_INT_VEC2,
    "uvec3" => gl::UNSIGNED_INT_VEC3,
    "uvec4" => gl::UNSIGNED_INT_VEC4,
    "bool" => gl::BOOL,
    "mat2" => gl::FLOAT_MAT2,
    "mat3" => gl::FLOAT_MAT3,
    "mat4" => gl::FLOAT_MAT4,
    "sampler2D" => gl::SAMPLER_2D,
    "samplerCube" => gl::SAMPLER_CUBE,
    "sampler2DShadow" => gl::SAMPLER_2D_SHADOW,
    _ => 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_are_recycled_lowest_first() {
    let mut backend = TraceBackend::new();

    let a = backend.gen_texture();
    let b = backend.gen_texture();
    let c = backend.gen_texture();
    assert_eq!((a, b, c), (1, 2, 3));

    backend.delete_texture(b);
    assert_eq!(backend.gen_texture(), 2);
    assert_eq!(backend.gen_texture(), 4);
  }

  #[test]
  fn shaders_and_programs_share_names() {
    let mut backend = TraceBackend::new();

    let vs = backend.create_shader(ShaderKind::Vertex);
    let program = backend.create_program();
    assert_eq!((vs, program), (1, 2));
  }

  #[test]
  fn scans_declarations() {
    let source = "
      #version 330 core
      layout (location = 0) in vec3 co;
      in vec2 uv;
      uniform mat4 model;
      uniform highp float weights[4];
      out vec2 v_uv;
      void main() {
        v_uv = uv;
      }
      uniform sampler2D tex;
    ";

    let decls = declarations(source);
    let names: Vec<_> = decls
      .iter()
      .map(|d| (d.storage, d.name.as_str(), d.array_len))
      .collect();

    assert_eq!(
      names,
      vec![
        (Storage::Input, "co", None),
        (Storage::Input, "uv", None),
        (Storage::Uniform, "model", None),
        (Storage::Uniform, "weights", Some(4)),
        (Storage::Uniform, "tex", None),
      ]
    );
  }

  #[test]
  fn uniform_block_members_have_no_location() {
    let mut backend = TraceBackend::new();
    let vs = backend.create_shader(ShaderKind::Vertex);
    let fs = backend.create_shader(ShaderKind::Pixel);
    let program = backend.create_program();

    backend.compile_shader(vs, "in vec3 co;\nuniform mat4 model;\nvoid main() {}\n");
    backend.compile_shader(
      fs,
      "uniform Light {\n  vec4 color;\n  float power;\n} light;\nuniform float gain;\nvoid main() {}\n",
    );
    backend.attach_shader(program, vs);
    backend.attach_shader(program, fs);
    backend.link_program(program);

    let uniforms: Vec<_> = backend
      .active_uniforms(program)
      .into_iter()
      .map(|u| (u.name, u.location))
      .collect();

    assert_eq!(
      uniforms,
      vec![
        ("model".to_owned(), 0),
        ("color".to_owned(), -1),
        ("power".to_owned(), -1),
        ("gain".to_owned(), 1),
      ]
    );
  }

  #[test]
  fn compile_error_directive() {
    let mut backend = TraceBackend::new();
    let shader = backend.create_shader(ShaderKind::Pixel);

    backend.compile_shader(shader, "#version 330 core\n#error not today\n");

    assert!(!backend.shader_compile_status(shader));
    assert_eq!(backend.shader_info_log(shader), "0:2: error: not today\n");
  }

  #[test]
  fn mapping_twice_fails() {
    let mut backend = TraceBackend::new();
    let log = backend.log();
    let buffer = backend.gen_buffer();

    backend.bind_buffer(BufferTarget::Array, buffer);
    backend.buffer_data(BufferTarget::Array, 16, None, BufferUsage::StaticDraw);

    let ptr = backend.map_buffer_range(BufferTarget::Array, 0, 16, LockAccess::ReadWrite);
    assert!(!ptr.is_null());

    let again = backend.map_buffer_range(BufferTarget::Array, 0, 16, LockAccess::ReadWrite);
    assert!(again.is_null());
    assert_eq!(backend.get_error(), Some(ErrorCode(gl::INVALID_OPERATION)));
    assert_eq!(log.pending_errors(), 0);

    assert!(backend.unmap_buffer(BufferTarget::Array));
  }
}
