//! Render buffers and framebuffers.
//!
//! A [`FrameBuffer`] starts empty; textures and render buffers are attached to it afterwards and
//! kept alive as long as they stay attached. Completeness is not enforced: check it with
//! [`FrameBuffer::check_status`] once every attachment is in place.

use std::cell::RefCell;
use std::error;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::backend::{Backend, FramebufferTarget};
use crate::handle::{Handle, Resource};
use crate::state::{GfxState, MAX_COLOR_ATTACHMENTS};
use crate::texture::{InternalFormat, Texture2D};

bitflags! {
  /// Buffers affected by a clear or a blit.
  #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
  pub struct ClearMask: u32 {
    const COLOR = 0b001;
    const DEPTH = 0b010;
    const STENCIL = 0b100;
  }
}

/// Filter applied when a blit stretches the copied region.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BlitFilter {
  Nearest,
  Linear,
}

/// Attachment point of a framebuffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Attachment {
  /// Color attachment `i`, with `i` < 4.
  Color(u32),
  Depth,
  Stencil,
  DepthStencil,
}

/// Color buffer selected for drawing or reading.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ColorBuffer {
  None,
  /// Back buffer of the default framebuffer.
  Back,
  /// Front buffer of the default framebuffer.
  Front,
  /// Color attachment `i` of a framebuffer.
  Attachment(u32),
}

/// Reason a framebuffer is incomplete.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IncompleteReason {
  /// Incomplete framebuffer.
  Undefined,
  /// Incomplete attachment (color / depth).
  IncompleteAttachment,
  /// An attachment was missing.
  MissingAttachment,
  /// Incomplete draw buffer.
  IncompleteDrawBuffer,
  /// Incomplete read buffer.
  IncompleteReadBuffer,
  /// Unsupported.
  Unsupported,
  /// Incomplete multisample configuration.
  IncompleteMultisample,
  /// Incomplete layer targets.
  IncompleteLayerTargets,
}

impl fmt::Display for IncompleteReason {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      IncompleteReason::Undefined => write!(f, "incomplete reason"),
      IncompleteReason::IncompleteAttachment => write!(f, "incomplete attachment"),
      IncompleteReason::MissingAttachment => write!(f, "missing attachment"),
      IncompleteReason::IncompleteDrawBuffer => write!(f, "incomplete draw buffer"),
      IncompleteReason::IncompleteReadBuffer => write!(f, "incomplete read buffer"),
      IncompleteReason::Unsupported => write!(f, "unsupported"),
      IncompleteReason::IncompleteMultisample => write!(f, "incomplete multisample"),
      IncompleteReason::IncompleteLayerTargets => write!(f, "incomplete layer targets"),
    }
  }
}

impl error::Error for IncompleteReason {}

/// Render target storage that cannot be sampled.
pub struct RenderBuffer<B>
where
  B: Backend,
{
  name: u32,
  format: InternalFormat,
  width: u32,
  height: u32,
  state: Rc<RefCell<GfxState<B>>>,
}

impl<B> RenderBuffer<B>
where
  B: Backend,
{
  pub(crate) fn new(
    state: &Rc<RefCell<GfxState<B>>>,
    format: InternalFormat,
    width: u32,
    height: u32,
  ) -> Self {
    let mut st = state.borrow_mut();
    let name = st.call(|b| b.gen_render_buffer());
    st.bind_render_buffer(name);
    st.call(|b| b.render_buffer_storage(format, width, height));

    RenderBuffer {
      name,
      format,
      width,
      height,
      state: state.clone(),
    }
  }

  pub fn format(&self) -> InternalFormat {
    self.format
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }
}

impl<B> Resource for RenderBuffer<B>
where
  B: Backend,
{
  fn name(&self) -> u32 {
    self.name
  }
}

impl<B> fmt::Debug for RenderBuffer<B>
where
  B: Backend,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("RenderBuffer")
      .field("name", &self.name)
      .field("format", &self.format)
      .field("width", &self.width)
      .field("height", &self.height)
      .finish()
  }
}

impl<B> Drop for RenderBuffer<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    let name = self.name;
    let mut st = self.state.borrow_mut();

    st.on_delete_render_buffer(name);
    st.call(|b| b.delete_render_buffer(name));
  }
}

/// Object attached to a framebuffer.
pub enum AttachmentSource<B>
where
  B: Backend,
{
  Texture(Handle<Texture2D<B>>),
  RenderBuffer(Handle<RenderBuffer<B>>),
}

impl<B> AttachmentSource<B>
where
  B: Backend,
{
  fn name(&self) -> u32 {
    match self {
      AttachmentSource::Texture(texture) => texture.name(),
      AttachmentSource::RenderBuffer(render_buffer) => render_buffer.name(),
    }
  }

  fn same_object(&self, other: &Self) -> bool {
    match (self, other) {
      (AttachmentSource::Texture(a), AttachmentSource::Texture(b)) => Handle::ptr_eq(a, b),
      (AttachmentSource::RenderBuffer(a), AttachmentSource::RenderBuffer(b)) => Handle::ptr_eq(a, b),
      _ => false,
    }
  }
}

// Slots written by an attachment point.
fn slots(attachment: Attachment) -> &'static [Attachment] {
  match attachment {
    Attachment::Color(0) => &[Attachment::Color(0)],
    Attachment::Color(1) => &[Attachment::Color(1)],
    Attachment::Color(2) => &[Attachment::Color(2)],
    Attachment::Color(3) => &[Attachment::Color(3)],
    Attachment::Color(_) => &[],
    Attachment::Depth => &[Attachment::Depth],
    Attachment::Stencil => &[Attachment::Stencil],
    Attachment::DepthStencil => &[Attachment::Depth, Attachment::Stencil],
  }
}

fn check_color_attachment(attachment: Attachment) {
  if let Attachment::Color(i) = attachment {
    assert!(
      (i as usize) < MAX_COLOR_ATTACHMENTS,
      "color attachment {} out of range (max {})",
      i,
      MAX_COLOR_ATTACHMENTS
    );
  }
}

impl<B> Clone for AttachmentSource<B>
where
  B: Backend,
{
  fn clone(&self) -> Self {
    match self {
      AttachmentSource::Texture(texture) => AttachmentSource::Texture(texture.clone()),
      AttachmentSource::RenderBuffer(rb) => AttachmentSource::RenderBuffer(rb.clone()),
    }
  }
}

impl<B> fmt::Debug for AttachmentSource<B>
where
  B: Backend,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      AttachmentSource::Texture(texture) => f.debug_tuple("Texture").field(texture).finish(),
      AttachmentSource::RenderBuffer(rb) => f.debug_tuple("RenderBuffer").field(rb).finish(),
    }
  }
}

/// Framebuffer object.
pub struct FrameBuffer<B>
where
  B: Backend,
{
  name: u32,
  attachments: RefCell<Vec<(Attachment, AttachmentSource<B>)>>,
  state: Rc<RefCell<GfxState<B>>>,
}

impl<B> FrameBuffer<B>
where
  B: Backend,
{
  pub(crate) fn new(state: &Rc<RefCell<GfxState<B>>>) -> Self {
    let name = state.borrow_mut().call(|b| b.gen_framebuffer());

    FrameBuffer {
      name,
      attachments: RefCell::new(Vec::new()),
      state: state.clone(),
    }
  }

  /// Attach a texture or render buffer, replacing whatever was attached at that point.
  ///
  /// [`Attachment::DepthStencil`] fills both the depth and the stencil slot.
  ///
  /// # Panics
  ///
  /// Panics if the attachment is a color attachment out of range.
  pub fn attach(&self, attachment: Attachment, source: AttachmentSource<B>) {
    check_color_attachment(attachment);

    {
      let mut st = self.state.borrow_mut();
      st.bind_framebuffer(FramebufferTarget::Both, self.name);

      let object = source.name();
      match source {
        AttachmentSource::Texture(_) => st.call(|b| b.framebuffer_texture_2d(attachment, object)),
        AttachmentSource::RenderBuffer(_) => {
          st.call(|b| b.framebuffer_render_buffer(attachment, object))
        }
      }
    }

    let previous = self.replace(attachment, Some(source));
    drop(previous);
  }

  /// Detach whatever is attached at `attachment`, releasing it.
  ///
  /// [`Attachment::DepthStencil`] empties both the depth and the stencil slot. Detaching an empty
  /// slot is not an error.
  ///
  /// # Panics
  ///
  /// Panics if the attachment is a color attachment out of range.
  pub fn detach(&self, attachment: Attachment) {
    check_color_attachment(attachment);

    let texture = slots(attachment)
      .iter()
      .any(|&slot| matches!(self.slot(slot), Some(AttachmentSource::Texture(_))));

    {
      let mut st = self.state.borrow_mut();
      st.bind_framebuffer(FramebufferTarget::Both, self.name);

      if texture {
        st.call(|b| b.framebuffer_texture_2d(attachment, 0));
      } else {
        st.call(|b| b.framebuffer_render_buffer(attachment, 0));
      }
    }

    let previous = self.replace(attachment, None);
    drop(previous);
  }

  // Update the slots covered by `attachment` and hand back what they held. The caller drops the
  // result once the state is released, as it may hold the last handle to a resource.
  fn replace(
    &self,
    attachment: Attachment,
    source: Option<AttachmentSource<B>>,
  ) -> Vec<AttachmentSource<B>> {
    let mut attachments = self.attachments.borrow_mut();
    let mut previous = Vec::new();

    for &slot in slots(attachment) {
      if let Some(i) = attachments.iter().position(|(a, _)| *a == slot) {
        previous.push(attachments.remove(i).1);
      }

      if let Some(ref source) = source {
        attachments.push((slot, source.clone()));
      }
    }

    previous
  }

  fn slot(&self, slot: Attachment) -> Option<AttachmentSource<B>> {
    self
      .attachments
      .borrow()
      .iter()
      .find(|(a, _)| *a == slot)
      .map(|(_, source)| source.clone())
  }

  pub fn attach_texture(&self, attachment: Attachment, texture: &Handle<Texture2D<B>>) {
    self.attach(attachment, AttachmentSource::Texture(texture.clone()));
  }

  pub fn attach_render_buffer(&self, attachment: Attachment, render_buffer: &Handle<RenderBuffer<B>>) {
    self.attach(
      attachment,
      AttachmentSource::RenderBuffer(render_buffer.clone()),
    );
  }

  /// Source attached at `attachment`.
  ///
  /// For [`Attachment::DepthStencil`], this is the source filling both the depth and the stencil
  /// slot, if they share one.
  pub fn attachment(&self, attachment: Attachment) -> Option<AttachmentSource<B>> {
    match attachment {
      Attachment::DepthStencil => {
        let depth = self.slot(Attachment::Depth)?;
        let stencil = self.slot(Attachment::Stencil)?;

        if depth.same_object(&stencil) {
          Some(depth)
        } else {
          None
        }
      }

      slot => self.slot(slot),
    }
  }

  /// Select a single color buffer to draw into.
  pub fn set_draw_buffer(&self, buffer: ColorBuffer) {
    self.set_draw_buffers(&[buffer]);
  }

  /// Select the color buffers fragment outputs are written to, in output order.
  pub fn set_draw_buffers(&self, buffers: &[ColorBuffer]) {
    let mut st = self.state.borrow_mut();
    st.bind_framebuffer(FramebufferTarget::Both, self.name);
    st.call(|b| b.draw_buffers(buffers));
  }

  /// Select the color buffer reads and blits copy from.
  pub fn set_read_buffer(&self, buffer: ColorBuffer) {
    let mut st = self.state.borrow_mut();
    st.bind_framebuffer(FramebufferTarget::Both, self.name);
    st.call(|b| b.read_buffer(buffer));
  }

  /// Check whether the framebuffer can be rendered to.
  ///
  /// An incomplete framebuffer is still a valid object; it just cannot be drawn to.
  pub fn check_status(&self) -> Result<(), IncompleteReason> {
    let mut st = self.state.borrow_mut();
    st.bind_framebuffer(FramebufferTarget::Both, self.name);

    let status = st.backend().check_framebuffer_status();

    if let Err(reason) = status {
      log::warn!("framebuffer {} is incomplete: {}", self.name, reason);
    }

    status
  }
}

impl<B> Resource for FrameBuffer<B>
where
  B: Backend,
{
  fn name(&self) -> u32 {
    self.name
  }
}

impl<B> fmt::Debug for FrameBuffer<B>
where
  B: Backend,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("FrameBuffer")
      .field("name", &self.name)
      .field("attachments", &self.attachments.borrow())
      .finish()
  }
}

impl<B> Drop for FrameBuffer<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    let name = self.name;
    let mut st = self.state.borrow_mut();

    st.on_delete_framebuffer(name);
    st.call(|b| b.delete_framebuffer(name));
  }
}
