use gl::types::*;

use glint::backend::FramebufferTarget;
use glint::{Attachment, BlitFilter, ClearMask, ColorBuffer, IncompleteReason};

pub(crate) fn opengl_target(target: FramebufferTarget) -> GLenum {
  match target {
    FramebufferTarget::Both => gl::FRAMEBUFFER,
    FramebufferTarget::Draw => gl::DRAW_FRAMEBUFFER,
    FramebufferTarget::Read => gl::READ_FRAMEBUFFER,
  }
}

pub(crate) fn opengl_attachment(attachment: Attachment) -> GLenum {
  match attachment {
    Attachment::Color(i) => gl::COLOR_ATTACHMENT0 + i,
    Attachment::Depth => gl::DEPTH_ATTACHMENT,
    Attachment::Stencil => gl::STENCIL_ATTACHMENT,
    Attachment::DepthStencil => gl::DEPTH_STENCIL_ATTACHMENT,
  }
}

pub(crate) fn opengl_color_buffer(buffer: ColorBuffer) -> GLenum {
  match buffer {
    ColorBuffer::None => gl::NONE,
    ColorBuffer::Back => gl::BACK,
    ColorBuffer::Front => gl::FRONT,
    ColorBuffer::Attachment(i) => gl::COLOR_ATTACHMENT0 + i,
  }
}

pub(crate) fn opengl_clear_mask(mask: ClearMask) -> GLbitfield {
  let mut bits = 0;

  if mask.contains(ClearMask::COLOR) {
    bits |= gl::COLOR_BUFFER_BIT;
  }

  if mask.contains(ClearMask::DEPTH) {
    bits |= gl::DEPTH_BUFFER_BIT;
  }

  if mask.contains(ClearMask::STENCIL) {
    bits |= gl::STENCIL_BUFFER_BIT;
  }

  bits
}

pub(crate) fn opengl_blit_filter(filter: BlitFilter) -> GLenum {
  match filter {
    BlitFilter::Nearest => gl::NEAREST,
    BlitFilter::Linear => gl::LINEAR,
  }
}

pub(crate) fn get_framebuffer_status() -> Result<(), IncompleteReason> {
  let status = unsafe { gl::CheckFramebufferStatus(gl::DRAW_FRAMEBUFFER) };

  match status {
    gl::FRAMEBUFFER_COMPLETE => Ok(()),
    gl::FRAMEBUFFER_UNDEFINED => Err(IncompleteReason::Undefined),
    gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => Err(IncompleteReason::IncompleteAttachment),
    gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => Err(IncompleteReason::MissingAttachment),
    gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => Err(IncompleteReason::IncompleteDrawBuffer),
    gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => Err(IncompleteReason::IncompleteReadBuffer),
    gl::FRAMEBUFFER_UNSUPPORTED => Err(IncompleteReason::Unsupported),
    gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => Err(IncompleteReason::IncompleteMultisample),
    gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => Err(IncompleteReason::IncompleteLayerTargets),
    _ => {
      // 0 means the query itself failed; the error flag tells why
      log::error!("unknown framebuffer status 0x{:04x}", status);
      Err(IncompleteReason::Undefined)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clear_mask_bits() {
    assert_eq!(opengl_clear_mask(ClearMask::empty()), 0);
    assert_eq!(
      opengl_clear_mask(ClearMask::COLOR | ClearMask::STENCIL),
      gl::COLOR_BUFFER_BIT | gl::STENCIL_BUFFER_BIT
    );
    assert_eq!(
      opengl_clear_mask(ClearMask::all()),
      gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT | gl::STENCIL_BUFFER_BIT
    );
  }

  #[test]
  fn color_attachments() {
    assert_eq!(opengl_attachment(Attachment::Color(2)), gl::COLOR_ATTACHMENT2);
    assert_eq!(
      opengl_color_buffer(ColorBuffer::Attachment(3)),
      gl::COLOR_ATTACHMENT3
    );
    assert_eq!(opengl_color_buffer(ColorBuffer::None), gl::NONE);
  }
}
