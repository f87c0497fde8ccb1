//! OpenGL backends.
//!
//! This crate exports [OpenGL](https://www.khronos.org/opengl/) backends for [glint]. Pick a backend
//! type, create it once the OpenGL context is current and its function pointers are loaded, then
//! hand it over to [`glint::Device::new`].
//!
//! ```ignore
//! gl::load_with(|s| window.get_proc_address(s) as *const _);
//!
//! let backend = glint_gl::GL33::new()?;
//! let mut device = glint::Device::new(backend);
//! ```

pub mod gl33;

pub use gl33::GL33;
