//! Backend acquisition.

use gl::types::*;
use std::cell::RefCell;
use std::error;
use std::fmt;

// TLS synchronization barrier for `GL33`.
thread_local!(static TLS_ACQUIRE_GFX_STATE: RefCell<Option<()>> = RefCell::new(Some(())));

// Take the per-thread token.
pub(crate) fn acquire() -> Result<(), StateQueryError> {
  TLS_ACQUIRE_GFX_STATE.with(|rc| match rc.borrow_mut().take() {
    Some(_) => Ok(()),
    None => Err(StateQueryError::UnavailableGLState),
  })
}

// Give the per-thread token back.
pub(crate) fn release() {
  TLS_ACQUIRE_GFX_STATE.with(|rc| *rc.borrow_mut() = Some(()));
}

pub(crate) unsafe fn check_version() -> Result<(), StateQueryError> {
  let mut major: GLint = 0;
  let mut minor: GLint = 0;
  gl::GetIntegerv(gl::MAJOR_VERSION, &mut major);
  gl::GetIntegerv(gl::MINOR_VERSION, &mut minor);

  if (major, minor) < (3, 3) {
    return Err(StateQueryError::UnsupportedVersion { major, minor });
  }

  log::debug!("OpenGL {}.{} context", major, minor);

  Ok(())
}

/// An error that might happen when the context is queried.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StateQueryError {
  /// The [`GL33`](crate::GL33) backend is unavailable.
  ///
  /// That might occur if you try to have more than one backend on the same thread.
  UnavailableGLState,
  /// The current context doesn’t provide OpenGL 3.3.
  UnsupportedVersion { major: GLint, minor: GLint },
}

impl fmt::Display for StateQueryError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StateQueryError::UnavailableGLState => write!(f, "unavailable graphics state"),
      StateQueryError::UnsupportedVersion { major, minor } => {
        write!(f, "unsupported OpenGL version: {}.{} (3.3 required)", major, minor)
      }
    }
  }
}

impl error::Error for StateQueryError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn one_backend_per_thread() {
    assert_eq!(acquire(), Ok(()));
    assert_eq!(acquire(), Err(StateQueryError::UnavailableGLState));

    release();
    assert_eq!(acquire(), Ok(()));
    release();
  }

  #[test]
  fn error_display() {
    assert_eq!(
      StateQueryError::UnsupportedVersion { major: 2, minor: 1 }.to_string(),
      "unsupported OpenGL version: 2.1 (3.3 required)"
    );
  }
}
