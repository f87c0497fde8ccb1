//! Device state.
//!
//! This module holds the two generations of state the device reconciles before every draw:
//!
//! - [`PendingState`], what the caller asked for. It holds owning handles to the resources it
//!   references so that they outlive the draw that reads them.
//! - [`DeviceState`], what the backend has been told so far. It only holds backend names.
//!
//! It also holds the cache layer shared by the device and every resource it creates, which is the
//! only place backend calls are issued from.

use std::panic::Location;

use crate::backend::{Backend, BufferTarget, FramebufferTarget};
use crate::buffer::VertexBuffer;
use crate::handle::Handle;
use crate::parameter::SharedParameters;
use crate::shader::Program;
use crate::texture::Texture2D;
use crate::vertex::{AttribFormat, AttribType, VertexLayout};

/// Number of vertex streams.
pub const MAX_STREAMS: usize = 16;

/// Number of vertex attribute slots.
pub const MAX_VERTEX_ATTRIBS: usize = 16;

/// Number of texture units.
pub const MAX_TEXTURE_UNITS: usize = 8;

/// Number of color attachments of a framebuffer.
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

// Upper bound of errors drained by a single check; some drivers never clear their error flag
// after a context loss.
const MAX_ERRORS_PER_CHECK: usize = 8;

/// Cached configuration of a vertex attribute slot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CachedAttrib {
  /// Buffer the slot sources from; `0` if the slot was never (or is no longer) specified.
  pub buffer: u32,
  /// Component type; `None` if the slot was never (or is no longer) specified.
  pub ty: Option<AttribType>,
  pub size: u32,
  pub stride: u32,
  pub offset: usize,
  pub normalized: bool,
  /// Whether the slot was specified through the floating point path.
  pub convert_to_float: bool,
  pub enabled: bool,
}

impl CachedAttrib {
  fn matches(&self, buffer: u32, format: &AttribFormat, stride: u32, offset: usize) -> bool {
    self.buffer == buffer
      && self.ty == Some(format.ty)
      && self.size == format.size
      && self.stride == stride
      && self.offset == offset
      && self.normalized == format.normalized
      && self.convert_to_float == format.convert_to_float
  }

  fn set_source(&mut self, buffer: u32, format: &AttribFormat, stride: u32, offset: usize) {
    self.buffer = buffer;
    self.ty = Some(format.ty);
    self.size = format.size;
    self.stride = stride;
    self.offset = offset;
    self.normalized = format.normalized;
    self.convert_to_float = format.convert_to_float;
  }

  // Forget the source but keep the enabled flag, which is still what the backend has.
  fn forget_source(&mut self) {
    *self = CachedAttrib {
      enabled: self.enabled,
      ..CachedAttrib::default()
    };
  }
}

/// Backend-visible state, as last told to the backend.
///
/// A freshly created device assumes a fresh context: everything is unbound, unit 0 is active and
/// no attribute is enabled.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceState {
  pub array_buffer: u32,
  pub element_buffer: u32,
  pub program: u32,
  pub active_texture_unit: u32,
  /// Texture bound to each unit.
  pub textures: [u32; MAX_TEXTURE_UNITS],
  pub attribs: [CachedAttrib; MAX_VERTEX_ATTRIBS],
  pub read_framebuffer: u32,
  pub draw_framebuffer: u32,
  pub render_buffer: u32,
  /// The single vertex array every attribute lives in. Created lazily, never rebound.
  pub vertex_array: u32,
  pub clear_color: [f32; 4],
}

impl Default for DeviceState {
  fn default() -> Self {
    DeviceState {
      array_buffer: 0,
      element_buffer: 0,
      program: 0,
      active_texture_unit: 0,
      textures: [0; MAX_TEXTURE_UNITS],
      attribs: [CachedAttrib::default(); MAX_VERTEX_ATTRIBS],
      read_framebuffer: 0,
      draw_framebuffer: 0,
      render_buffer: 0,
      vertex_array: 0,
      clear_color: [0.; 4],
    }
  }
}

/// State requested by the caller, applied at the next draw.
pub struct PendingState<B>
where
  B: Backend,
{
  pub(crate) streams: [Option<Handle<VertexBuffer<B>>>; MAX_STREAMS],
  pub(crate) layout: Option<Handle<VertexLayout>>,
  pub(crate) program: Option<Handle<Program<B>>>,
  pub(crate) parameters: Option<SharedParameters>,
  pub(crate) textures: [Option<Handle<Texture2D<B>>>; MAX_TEXTURE_UNITS],
}

impl<B> PendingState<B>
where
  B: Backend,
{
  pub(crate) fn new() -> Self {
    PendingState {
      streams: Default::default(),
      layout: None,
      program: None,
      parameters: None,
      textures: Default::default(),
    }
  }

  pub fn stream_source(&self, index: usize) -> Option<&Handle<VertexBuffer<B>>> {
    self.streams.get(index).and_then(Option::as_ref)
  }

  pub fn vertex_layout(&self) -> Option<&Handle<VertexLayout>> {
    self.layout.as_ref()
  }

  pub fn program(&self) -> Option<&Handle<Program<B>>> {
    self.program.as_ref()
  }

  pub fn parameters(&self) -> Option<&SharedParameters> {
    self.parameters.as_ref()
  }

  pub fn texture(&self, unit: usize) -> Option<&Handle<Texture2D<B>>> {
    self.textures.get(unit).and_then(Option::as_ref)
  }
}

/// The backend and its cache.
///
/// Every bind goes through here and is skipped when the cache says the backend already has the
/// requested name. Resources keep a shared reference to it so that their destructors can fire
/// the deletion hooks (`on_delete_*`).
pub(crate) struct GfxState<B>
where
  B: Backend,
{
  backend: B,
  current: DeviceState,
  error_checks: bool,
  label: Option<String>,
}

impl<B> GfxState<B>
where
  B: Backend,
{
  pub(crate) fn new(backend: B, error_checks: bool, label: Option<String>) -> Self {
    GfxState {
      backend,
      current: DeviceState::default(),
      error_checks,
      label,
    }
  }

  pub(crate) fn backend(&self) -> &B {
    &self.backend
  }

  pub(crate) fn current(&self) -> &DeviceState {
    &self.current
  }

  /// Issue a mutating backend call, then check the error flag.
  ///
  /// Errors are logged with the location of the caller.
  #[track_caller]
  pub(crate) fn call<R>(&mut self, f: impl FnOnce(&mut B) -> R) -> R {
    let r = f(&mut self.backend);

    if self.error_checks {
      self.check_error(Location::caller());
    }

    r
  }

  fn check_error(&mut self, location: &Location) {
    for _ in 0..MAX_ERRORS_PER_CHECK {
      let code = match self.backend.get_error() {
        Some(code) => code,
        None => return,
      };

      match self.label {
        Some(ref label) => log::error!(
          "[{}] {}:{}: backend error 0x{:04x}: {}",
          label,
          location.file(),
          location.line(),
          code.0,
          code.name()
        ),

        None => log::error!(
          "{}:{}: backend error 0x{:04x}: {}",
          location.file(),
          location.line(),
          code.0,
          code.name()
        ),
      }
    }
  }

  pub(crate) fn bind_shared_vertex_array(&mut self) {
    if self.current.vertex_array == 0 {
      let vertex_array = self.call(|b| b.gen_vertex_array());
      self.call(|b| b.bind_vertex_array(vertex_array));
      self.current.vertex_array = vertex_array;
    }
  }

  pub(crate) fn bind_buffer(&mut self, target: BufferTarget, buffer: u32) {
    // element bindings are vertex array state
    if buffer != 0 {
      self.bind_shared_vertex_array();
    }

    let bound = match target {
      BufferTarget::Array => &mut self.current.array_buffer,
      BufferTarget::ElementArray => &mut self.current.element_buffer,
    };

    if *bound != buffer {
      *bound = buffer;
      self.call(|b| b.bind_buffer(target, buffer));
    }
  }

  pub(crate) fn on_delete_buffer(&mut self, buffer: u32) {
    if self.current.array_buffer == buffer {
      self.bind_buffer(BufferTarget::Array, 0);
    }

    if self.current.element_buffer == buffer {
      self.bind_buffer(BufferTarget::ElementArray, 0);
    }

    for attrib in self.current.attribs.iter_mut() {
      if attrib.buffer == buffer {
        attrib.forget_source();
      }
    }
  }

  pub(crate) fn use_program(&mut self, program: u32) {
    if self.current.program != program {
      self.current.program = program;
      self.call(|b| b.use_program(program));
    }
  }

  pub(crate) fn on_delete_program(&mut self, program: u32) {
    if self.current.program == program {
      self.use_program(0);
    }
  }

  pub(crate) fn set_active_texture(&mut self, unit: u32) {
    if self.current.active_texture_unit != unit {
      self.current.active_texture_unit = unit;
      self.call(|b| b.active_texture(unit));
    }
  }

  /// Bind a texture to a unit, activating the unit only if a bind is needed.
  pub(crate) fn bind_texture(&mut self, unit: u32, texture: u32) {
    let slot = unit as usize;
    assert!(slot < MAX_TEXTURE_UNITS, "texture unit {} out of range", unit);

    if self.current.textures[slot] != texture {
      self.set_active_texture(unit);
      self.current.textures[slot] = texture;
      self.call(|b| b.bind_texture_2d(texture));
    }
  }

  /// Bind a texture to a unit and leave that unit active, so that texture commands target it.
  pub(crate) fn select_texture(&mut self, unit: u32, texture: u32) {
    self.set_active_texture(unit);
    self.bind_texture(unit, texture);
  }

  pub(crate) fn on_delete_texture(&mut self, texture: u32) {
    // the backend reverts these units to 0 by itself
    for bound in self.current.textures.iter_mut() {
      if *bound == texture {
        *bound = 0;
      }
    }
  }

  pub(crate) fn bind_render_buffer(&mut self, render_buffer: u32) {
    if self.current.render_buffer != render_buffer {
      self.current.render_buffer = render_buffer;
      self.call(|b| b.bind_render_buffer(render_buffer));
    }
  }

  pub(crate) fn on_delete_render_buffer(&mut self, render_buffer: u32) {
    if self.current.render_buffer == render_buffer {
      self.current.render_buffer = 0;
    }
  }

  pub(crate) fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: u32) {
    let current = &mut self.current;

    let changed = match target {
      FramebufferTarget::Both => {
        let changed =
          current.read_framebuffer != framebuffer || current.draw_framebuffer != framebuffer;
        current.read_framebuffer = framebuffer;
        current.draw_framebuffer = framebuffer;
        changed
      }

      FramebufferTarget::Draw => {
        let changed = current.draw_framebuffer != framebuffer;
        current.draw_framebuffer = framebuffer;
        changed
      }

      FramebufferTarget::Read => {
        let changed = current.read_framebuffer != framebuffer;
        current.read_framebuffer = framebuffer;
        changed
      }
    };

    if changed {
      self.call(|b| b.bind_framebuffer(target, framebuffer));
    }
  }

  pub(crate) fn on_delete_framebuffer(&mut self, framebuffer: u32) {
    // deleting a bound framebuffer reverts its targets to the default one
    if self.current.read_framebuffer == framebuffer {
      self.current.read_framebuffer = 0;
    }

    if self.current.draw_framebuffer == framebuffer {
      self.current.draw_framebuffer = 0;
    }
  }

  pub(crate) fn set_clear_color(&mut self, color: [f32; 4]) {
    if self.current.clear_color != color {
      self.current.clear_color = color;
      self.call(|b| b.clear_color(color));
    }
  }

  /// Point an attribute slot at a buffer region and enable it.
  ///
  /// The attribute pointer is only reissued if the slot configuration changed.
  pub(crate) fn set_vertex_attrib(
    &mut self,
    slot: u32,
    buffer: u32,
    format: AttribFormat,
    stride: u32,
    offset: usize,
  ) {
    let index = slot as usize;

    if !self.current.attribs[index].matches(buffer, &format, stride, offset) {
      self.bind_buffer(BufferTarget::Array, buffer);

      if format.convert_to_float {
        self.call(|b| b.vertex_attrib_pointer(slot, format, stride, offset));
      } else {
        self.call(|b| b.vertex_attrib_i_pointer(slot, format, stride, offset));
      }

      self.current.attribs[index].set_source(buffer, &format, stride, offset);
    }

    if !self.current.attribs[index].enabled {
      self.current.attribs[index].enabled = true;
      self.call(|b| b.enable_vertex_attrib_array(slot));
    }
  }

  /// Disable every enabled slot not flagged in `used`.
  pub(crate) fn disable_unused_vertex_attribs(&mut self, used: &[bool; MAX_VERTEX_ATTRIBS]) {
    for slot in 0..MAX_VERTEX_ATTRIBS {
      if self.current.attribs[slot].enabled && !used[slot] {
        self.current.attribs[slot].enabled = false;
        self.call(|b| b.disable_vertex_attrib_array(slot as u32));
      }
    }
  }
}

impl<B> Drop for GfxState<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    let vertex_array = self.current.vertex_array;

    if vertex_array != 0 {
      self.current.vertex_array = 0;
      self.call(|b| b.delete_vertex_array(vertex_array));
    }
  }
}
