//! The device.
//!
//! [`Device`] is the single entry point of glint. It creates resources, records what the next draw
//! should use (the _pending_ state) and, when a draw is submitted, reconciles the pending state
//! with what the backend currently has, issuing only the calls needed to go from one to the
//! other.
//!
//! Reconciliation runs in a fixed order before every draw:
//!
//! 1. The pending program is bound.
//! 2. The pending parameter list is uploaded. Parameters are not diffed: every value whose name the
//!    program knows is uploaded again, since uniform values typically change every draw anyway.
//! 3. Every element of the pending vertex layout is resolved against the pending stream sources;
//!    attribute slots whose configuration changed are specified again, and enabled slots the
//!    layout doesn’t use are disabled.
//! 4. All texture units are walked, binding the pending texture (or nothing) on each of them.
//! 5. The draw is issued.
//!
//! All of it is single-threaded: a [`Device`] and every resource it creates live on the thread
//! owning the graphics context.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::backend::{Backend, BufferTarget, FramebufferTarget};
use crate::buffer::{BufferUsage, IndexBuffer, VertexBuffer};
use crate::framebuffer::{BlitFilter, ClearMask, FrameBuffer, RenderBuffer};
use crate::handle::{Handle, Resource};
use crate::parameter::SharedParameters;
use crate::shader::{Program, Shader, ShaderKind};
use crate::state::{
  DeviceState, GfxState, PendingState, MAX_STREAMS, MAX_TEXTURE_UNITS, MAX_VERTEX_ATTRIBS,
};
use crate::texture::{InternalFormat, PixelFormat, PixelType, Texture2D, TextureDesc};
use crate::vertex::{VertexElement, VertexLayout};

/// Primitive topology of a draw.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Primitive {
  Points,
  Lines,
  LineStrip,
  LineLoop,
  Triangles,
  TriangleStrip,
  TriangleFan,
}

/// Device options.
///
/// Feel free to look at the different methods available to tweak the options. You may want to start
/// with `default()` though.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceOpt {
  error_checks: bool,
  label: Option<String>,
}

impl Default for DeviceOpt {
  /// Defaults:
  ///
  /// - `error_checks` set to `true`.
  /// - `label` set to `None`.
  fn default() -> Self {
    DeviceOpt {
      error_checks: true,
      label: None,
    }
  }
}

impl DeviceOpt {
  /// Query the backend error flag after every mutating call. Default to `true`.
  #[inline]
  pub fn set_error_checks(self, error_checks: bool) -> Self {
    DeviceOpt {
      error_checks,
      ..self
    }
  }

  /// Whether the backend error flag is queried after every mutating call.
  #[inline]
  pub fn error_checks(&self) -> bool {
    self.error_checks
  }

  /// Label prefixing every backend error logged by the device.
  ///
  /// Pass `None` to remove the label.
  #[inline]
  pub fn set_label<L>(self, label: L) -> Self
  where
    L: Into<Option<String>>,
  {
    DeviceOpt {
      label: label.into(),
      ..self
    }
  }

  /// Get the label, if any.
  #[inline]
  pub fn label(&self) -> Option<&str> {
    self.label.as_deref()
  }
}

/// The device.
pub struct Device<B>
where
  B: Backend,
{
  state: Rc<RefCell<GfxState<B>>>,
  pending: PendingState<B>,
  opt: DeviceOpt,
}

impl<B> Device<B>
where
  B: Backend,
{
  /// Create a device with the default options.
  ///
  /// The backend is assumed to be a fresh context: nothing bound, texture unit 0 active.
  pub fn new(backend: B) -> Self {
    Self::with_opt(backend, DeviceOpt::default())
  }

  pub fn with_opt(backend: B, opt: DeviceOpt) -> Self {
    let state = GfxState::new(backend, opt.error_checks, opt.label.clone());

    Device {
      state: Rc::new(RefCell::new(state)),
      pending: PendingState::new(),
      opt,
    }
  }

  pub fn opt(&self) -> &DeviceOpt {
    &self.opt
  }

  /// Access the backend.
  ///
  /// # Panics
  ///
  /// The state shared with every resource stays borrowed while the returned guard lives. Creating,
  /// mutating or dropping a resource, or drawing, before the guard is dropped panics.
  pub fn backend(&self) -> Ref<B> {
    Ref::map(self.state.borrow(), GfxState::backend)
  }

  /// Snapshot of what the backend has been told so far.
  pub fn current_state(&self) -> DeviceState {
    self.state.borrow().current().clone()
  }

  /// What the next draw will use.
  pub fn pending_state(&self) -> &PendingState<B> {
    &self.pending
  }

  pub fn create_vertex_buffer(
    &self,
    size: usize,
    data: Option<&[u8]>,
    usage: BufferUsage,
  ) -> Handle<VertexBuffer<B>> {
    Handle::new(VertexBuffer::new(&self.state, size, data, usage))
  }

  /// Create an index buffer of `size` bytes holding `stride`-byte indices.
  ///
  /// # Panics
  ///
  /// Panics if `stride` is neither 2 nor 4.
  pub fn create_index_buffer(
    &self,
    size: usize,
    data: Option<&[u8]>,
    stride: usize,
    usage: BufferUsage,
  ) -> Handle<IndexBuffer<B>> {
    Handle::new(IndexBuffer::new(&self.state, size, data, stride, usage))
  }

  pub fn create_vertex_shader(&self, source: &str) -> Handle<Shader<B>> {
    Handle::new(Shader::new(&self.state, ShaderKind::Vertex, source))
  }

  pub fn create_pixel_shader(&self, source: &str) -> Handle<Shader<B>> {
    Handle::new(Shader::new(&self.state, ShaderKind::Pixel, source))
  }

  /// Link a vertex and a pixel shader.
  ///
  /// # Panics
  ///
  /// Panics if the shaders are not of the expected kinds.
  pub fn create_program(
    &self,
    vertex: &Handle<Shader<B>>,
    pixel: &Handle<Shader<B>>,
  ) -> Handle<Program<B>> {
    assert_eq!(vertex.kind(), ShaderKind::Vertex, "expected a vertex shader");
    assert_eq!(pixel.kind(), ShaderKind::Pixel, "expected a pixel shader");

    Handle::new(Program::new(&self.state, vertex, pixel))
  }

  /// # Panics
  ///
  /// Panics if an element reads from a stream or feeds a slot out of the hardware limits.
  pub fn create_vertex_layout(
    &self,
    elements: impl Into<Vec<VertexElement>>,
  ) -> Handle<VertexLayout> {
    Handle::new(VertexLayout::new(elements))
  }

  /// Create a 2D texture, optionally filled with `data` (in which case mipmaps are generated).
  ///
  /// # Panics
  ///
  /// Panics if `data` is too short for the described base level.
  pub fn create_texture_2d(
    &self,
    internal_format: InternalFormat,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    pixel_type: PixelType,
    data: Option<&[u8]>,
  ) -> Handle<Texture2D<B>> {
    let desc = TextureDesc {
      internal_format,
      width,
      height,
      pixel_format,
      pixel_type,
    };

    Handle::new(Texture2D::new(&self.state, desc, data))
  }

  pub fn create_render_buffer(
    &self,
    format: InternalFormat,
    width: u32,
    height: u32,
  ) -> Handle<RenderBuffer<B>> {
    Handle::new(RenderBuffer::new(&self.state, format, width, height))
  }

  pub fn create_frame_buffer(&self) -> Handle<FrameBuffer<B>> {
    Handle::new(FrameBuffer::new(&self.state))
  }

  /// Set the vertex buffer read by stream `index`.
  ///
  /// # Panics
  ///
  /// Panics if `index` is out of range.
  pub fn set_stream_source(&mut self, index: usize, buffer: Option<&Handle<VertexBuffer<B>>>) {
    assert!(
      index < MAX_STREAMS,
      "stream index {} out of range (max {})",
      index,
      MAX_STREAMS
    );

    self.pending.streams[index] = buffer.cloned();
  }

  pub fn clear_stream_source(&mut self, index: usize) {
    self.set_stream_source(index, None);
  }

  pub fn set_vertex_layout(&mut self, layout: Option<&Handle<VertexLayout>>) {
    self.pending.layout = layout.cloned();
  }

  pub fn set_program(&mut self, program: Option<&Handle<Program<B>>>) {
    self.pending.program = program.cloned();
  }

  /// Set the parameter list uploaded before each draw.
  ///
  /// The list is shared, not copied: changes made to it by its owner are seen by the next draw.
  pub fn set_program_parameters(&mut self, parameters: Option<&SharedParameters>) {
    self.pending.parameters = parameters.cloned();
  }

  /// Set the texture sampled from unit `unit`.
  ///
  /// # Panics
  ///
  /// Panics if `unit` is out of range.
  pub fn set_texture(&mut self, unit: usize, texture: Option<&Handle<Texture2D<B>>>) {
    assert!(
      unit < MAX_TEXTURE_UNITS,
      "texture unit {} out of range (max {})",
      unit,
      MAX_TEXTURE_UNITS
    );

    self.pending.textures[unit] = texture.cloned();
  }

  pub fn clear_texture(&mut self, unit: usize) {
    self.set_texture(unit, None);
  }

  /// Reset the whole pending state.
  ///
  /// Nothing is sent to the backend; resources only referenced by the pending state are released.
  pub fn clear_state(&mut self) {
    self.pending = PendingState::new();
  }

  /// Render into `framebuffer`, or into the default framebuffer if `None`.
  ///
  /// Unlike the rest of the state, the render target is bound immediately.
  pub fn set_render_target(&mut self, framebuffer: Option<&FrameBuffer<B>>) {
    let name = framebuffer.map_or(0, Resource::name);

    self
      .state
      .borrow_mut()
      .bind_framebuffer(FramebufferTarget::Both, name);
  }

  pub fn set_clear_color(&mut self, color: [f32; 4]) {
    self.state.borrow_mut().set_clear_color(color);
  }

  /// Clear buffers of the current render target.
  pub fn clear(&mut self, mask: ClearMask) {
    self.state.borrow_mut().call(|b| b.clear(mask));
  }

  /// Copy the `width` × `height` lower-left region of `src` into `dst`.
  ///
  /// `None` designates the default framebuffer.
  pub fn blit_framebuffer(
    &mut self,
    src: Option<&FrameBuffer<B>>,
    dst: Option<&FrameBuffer<B>>,
    width: u32,
    height: u32,
    mask: ClearMask,
    filter: BlitFilter,
  ) {
    let mut st = self.state.borrow_mut();

    st.bind_framebuffer(FramebufferTarget::Read, src.map_or(0, Resource::name));
    st.bind_framebuffer(FramebufferTarget::Draw, dst.map_or(0, Resource::name));
    st.call(|b| b.blit_framebuffer(width, height, mask, filter));
  }

  /// Draw `count` vertices read through `indices`, starting at index `start`.
  ///
  /// # Panics
  ///
  /// Panics if the index range lies outside of the index buffer, or if the pending state lacks a
  /// program, a vertex layout, or a stream source the layout reads from.
  pub fn draw_indexed(&mut self, indices: &IndexBuffer<B>, mode: Primitive, start: u32, count: u32) {
    assert!(
      start as usize + count as usize <= indices.len(),
      "index range {}..{} out of index buffer bounds ({} indices)",
      start,
      start + count,
      indices.len()
    );

    self.reconcile();

    let mut st = self.state.borrow_mut();
    let ty = indices.index_type();
    let offset = start as usize * indices.stride();

    st.bind_buffer(BufferTarget::ElementArray, indices.name());
    st.call(|b| b.draw_elements(mode, count, ty, offset));
  }

  /// Draw `count` vertices starting at vertex `start`.
  ///
  /// # Panics
  ///
  /// Panics if the pending state lacks a program, a vertex layout, or a stream source the layout
  /// reads from.
  pub fn draw_arrays(&mut self, mode: Primitive, start: u32, count: u32) {
    self.reconcile();
    self.state.borrow_mut().call(|b| b.draw_arrays(mode, start, count));
  }

  // Bring the backend in line with the pending state.
  fn reconcile(&mut self) {
    let pending = &self.pending;
    let mut st = self.state.borrow_mut();

    let program = match pending.program {
      Some(ref program) => program,
      None => panic!("cannot draw without a program"),
    };

    st.use_program(program.name());

    if let Some(ref parameters) = pending.parameters {
      for param in parameters.borrow().iter() {
        if let Some(location) = program.uniform_location(param.name()) {
          st.call(|b| b.uniform(location, param.value()));
        }
      }
    }

    let layout = match pending.layout {
      Some(ref layout) => layout,
      None => panic!("cannot draw without a vertex layout"),
    };

    let mut used = [false; MAX_VERTEX_ATTRIBS];

    for element in layout.elements() {
      let stream = match pending.streams[element.stream_index as usize] {
        Some(ref stream) => stream,
        None => panic!(
          "vertex layout reads from stream {}, which has no source",
          element.stream_index
        ),
      };

      st.set_vertex_attrib(
        element.attribute_index,
        stream.name(),
        element.format(),
        element.stride,
        element.offset,
      );
      used[element.attribute_index as usize] = true;
    }

    st.disable_unused_vertex_attribs(&used);

    for (unit, texture) in pending.textures.iter().enumerate() {
      let name = texture.as_ref().map_or(0, |texture| texture.name());
      st.bind_texture(unit as u32, name);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::trace::{Call, TraceBackend};
  use crate::vertex::VertexElementType;

  #[test]
  fn default_opt() {
    let opt = DeviceOpt::default();
    assert!(opt.error_checks());
    assert_eq!(opt.label(), None);

    let opt = opt.set_label("main".to_owned()).set_error_checks(false);
    assert_eq!(opt.label(), Some("main"));
    assert!(!opt.error_checks());
  }

  #[test]
  fn setters_do_not_touch_backend() {
    let backend = TraceBackend::new();
    let log = backend.log();
    let mut device = Device::new(backend);

    let vb = device.create_vertex_buffer(12, None, BufferUsage::StaticDraw);
    let layout = device.create_vertex_layout(vec![VertexElement::new(
      0,
      0,
      0,
      12,
      VertexElementType::Float3,
    )]);
    log.clear();

    device.set_stream_source(3, Some(&vb));
    device.set_vertex_layout(Some(&layout));
    device.clear_stream_source(3);

    assert!(log.is_empty());
    assert!(device.pending_state().stream_source(3).is_none());
    assert!(device.pending_state().vertex_layout().is_some());
  }

  #[test]
  #[should_panic]
  fn stream_index_out_of_range() {
    let mut device = Device::new(TraceBackend::new());
    device.set_stream_source(MAX_STREAMS, None);
  }

  #[test]
  #[should_panic]
  fn texture_unit_out_of_range() {
    let mut device = Device::new(TraceBackend::new());
    device.set_texture(MAX_TEXTURE_UNITS, None);
  }

  #[test]
  #[should_panic(expected = "cannot draw without a program")]
  fn draw_without_program() {
    let mut device = Device::new(TraceBackend::new());
    device.draw_arrays(Primitive::Triangles, 0, 3);
  }

  #[test]
  fn pending_state_keeps_resources_alive() {
    let mut device = Device::new(TraceBackend::new());
    let vb = device.create_vertex_buffer(4, None, BufferUsage::StaticDraw);

    device.set_stream_source(0, Some(&vb));
    assert_eq!(Handle::ref_count(&vb), 2);

    device.clear_state();
    assert_eq!(Handle::ref_count(&vb), 1);
  }

  #[test]
  fn clear_uses_cached_color() {
    let backend = TraceBackend::new();
    let log = backend.log();
    let mut device = Device::new(backend);

    device.set_clear_color([0.5, 0.5, 0.5, 1.]);
    device.clear(ClearMask::COLOR | ClearMask::DEPTH);
    device.set_clear_color([0.5, 0.5, 0.5, 1.]);
    device.clear(ClearMask::COLOR);

    assert_eq!(
      log.calls(),
      vec![
        Call::ClearColor([0.5, 0.5, 0.5, 1.]),
        Call::Clear(ClearMask::COLOR | ClearMask::DEPTH),
        Call::Clear(ClearMask::COLOR),
      ]
    );
  }
}
