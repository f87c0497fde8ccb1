//! # What is this?
//!
//! glint is a thin layer sitting between a stateless, retained-mode way of describing draws and a
//! stateful graphics backend (typically OpenGL). Stateful backends are expensive whenever you ask
//! them to re-specify state they already hold: binding the same buffer twice, re-activating the same
//! texture unit, re-issuing a vertex attribute pointer that didn’t change, etc. glint removes those
//! redundant calls by tracking two generations of state:
//!
//! - The _pending_ state, which is what you, the caller, asked for. It’s allowed to be incomplete
//!   or inconsistent until you actually draw something.
//! - The _current_ state, which is exactly what the backend has been told so far.
//!
//! Right before every draw, the [`Device`] reconciles both and only issues the deltas.
//!
//! # Resources
//!
//! Every backend object is wrapped in a resource type owning exactly one backend name:
//!
//! - [`VertexBuffer`] and [`IndexBuffer`], see the [`buffer`] module.
//! - [`Shader`] and [`Program`], see the [`shader`] module.
//! - [`Texture2D`], see the [`texture`] module.
//! - [`RenderBuffer`] and [`FrameBuffer`], see the [`framebuffer`] module.
//! - [`VertexLayout`], which doesn’t own any backend object but describes how vertex streams feed
//!   attribute slots. See the [`vertex`] module.
//!
//! Resources are created via the [`Device`] and handed back as [`Handle`]s, which are reference
//! counted. When the last handle goes away, the backend object is deleted and the device cache is
//! notified so that a recycled backend name is never mistaken for the old object.
//!
//! # Backends
//!
//! The backend is abstracted by the [`Backend`] trait. The `glint-gl` crate provides an OpenGL 3.3
//! implementation. A recording backend, [`backend::trace::TraceBackend`], is also available to
//! inspect the exact call stream glint produces without requiring a GPU.
//!
//! # Threading
//!
//! Everything in glint is single-threaded. None of the types are `Send` nor `Sync`, as the
//! underlying graphics context is bound to a single thread.

pub mod backend;
pub mod buffer;
pub mod device;
pub mod framebuffer;
pub mod handle;
pub mod parameter;
pub mod shader;
pub mod state;
pub mod texture;
pub mod vertex;

pub use crate::backend::{Backend, ErrorCode};
pub use crate::buffer::{BufferLock, BufferLockError, BufferUsage, IndexBuffer, LockAccess, VertexBuffer};
pub use crate::device::{Device, DeviceOpt, Primitive};
pub use crate::framebuffer::{
  Attachment, AttachmentSource, BlitFilter, ClearMask, ColorBuffer, FrameBuffer, IncompleteReason,
  RenderBuffer,
};
pub use crate::handle::{Handle, Resource};
pub use crate::parameter::{ProgramParameter, ProgramParameters, SharedParameters, UniformValue};
pub use crate::shader::{ActiveVariable, Program, Shader, ShaderKind};
pub use crate::state::{DeviceState, PendingState};
pub use crate::texture::{InternalFormat, MagFilter, MinFilter, PixelFormat, PixelType, Texture2D, Wrap};
pub use crate::vertex::{VertexElement, VertexElementType, VertexLayout};
