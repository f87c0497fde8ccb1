//! 2D textures.
//!
//! A [`Texture2D`] is created with its storage allocated once and for all; texels can be supplied
//! at creation, in which case the whole mipmap chain is generated. Textures start with repeat
//! wrapping and trilinear minification; both can be changed afterwards, along with the border
//! color used by [`Wrap::ClampToBorder`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::backend::{Backend, TextureParameter};
use crate::handle::Resource;
use crate::state::GfxState;

/// Internal (GPU side) format of a texture or render buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InternalFormat {
  R8,
  RG8,
  RGB8,
  RGBA8,
  SRGB8,
  SRGB8Alpha8,
  R16F,
  RG16F,
  RGB16F,
  RGBA16F,
  R32F,
  RG32F,
  RGB32F,
  RGBA32F,
  Depth16,
  Depth24,
  Depth32F,
  Depth24Stencil8,
  Depth32FStencil8,
  StencilIndex8,
}

/// Layout of the texels supplied by the CPU.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelFormat {
  Red,
  RG,
  RGB,
  RGBA,
  BGR,
  BGRA,
  Depth,
  DepthStencil,
}

impl PixelFormat {
  /// Number of components per texel.
  pub fn components(self) -> usize {
    match self {
      PixelFormat::Red | PixelFormat::Depth => 1,
      PixelFormat::RG | PixelFormat::DepthStencil => 2,
      PixelFormat::RGB | PixelFormat::BGR => 3,
      PixelFormat::RGBA | PixelFormat::BGRA => 4,
    }
  }
}

/// Type of the texel components supplied by the CPU.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelType {
  Byte,
  UnsignedByte,
  Short,
  UnsignedShort,
  Int,
  UnsignedInt,
  HalfFloat,
  Float,
  /// 24-bit depth and 8-bit stencil packed in a single 32-bit value.
  UnsignedInt248,
}

/// Wrapping mode of a texture coordinate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Wrap {
  Repeat,
  MirroredRepeat,
  ClampToEdge,
  ClampToBorder,
}

/// Minification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MinFilter {
  Nearest,
  Linear,
  NearestMipmapNearest,
  NearestMipmapLinear,
  LinearMipmapNearest,
  LinearMipmapLinear,
}

/// Magnification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MagFilter {
  Nearest,
  Linear,
}

/// Storage description of a 2D texture.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TextureDesc {
  pub internal_format: InternalFormat,
  pub width: u32,
  pub height: u32,
  pub pixel_format: PixelFormat,
  pub pixel_type: PixelType,
}

impl TextureDesc {
  /// Size in bytes of one texel as supplied by the CPU.
  pub fn texel_size(&self) -> usize {
    let component = match self.pixel_type {
      PixelType::Byte | PixelType::UnsignedByte => 1,
      PixelType::Short | PixelType::UnsignedShort | PixelType::HalfFloat => 2,
      PixelType::Int | PixelType::UnsignedInt | PixelType::Float => 4,
      PixelType::UnsignedInt248 => return 4,
    };

    component * self.pixel_format.components()
  }

  /// Size in bytes of the whole base level, rows tightly packed.
  pub fn data_size(&self) -> usize {
    self.width as usize * self.height as usize * self.texel_size()
  }
}

/// A 2D texture.
pub struct Texture2D<B>
where
  B: Backend,
{
  name: u32,
  desc: TextureDesc,
  wrap: Cell<(Wrap, Wrap)>,
  filter: Cell<(MinFilter, MagFilter)>,
  border_color: Cell<[f32; 4]>,
  state: Rc<RefCell<GfxState<B>>>,
}

impl<B> Texture2D<B>
where
  B: Backend,
{
  /// # Panics
  ///
  /// Panics if `data` is too short for the described base level.
  pub(crate) fn new(
    state: &Rc<RefCell<GfxState<B>>>,
    desc: TextureDesc,
    data: Option<&[u8]>,
  ) -> Self {
    if let Some(data) = data {
      assert!(
        data.len() >= desc.data_size(),
        "texture data too short: {} bytes for {}×{} texels of {} bytes",
        data.len(),
        desc.width,
        desc.height,
        desc.texel_size()
      );
    }

    let wrap = (Wrap::Repeat, Wrap::Repeat);
    let filter = (MinFilter::LinearMipmapLinear, MagFilter::Linear);

    let mut st = state.borrow_mut();
    let name = st.call(|b| b.gen_texture());
    st.select_texture(0, name);
    st.call(|b| b.tex_image_2d(&desc, data));
    st.call(|b| b.tex_parameter_2d(TextureParameter::WrapS(wrap.0)));
    st.call(|b| b.tex_parameter_2d(TextureParameter::WrapT(wrap.1)));
    st.call(|b| b.tex_parameter_2d(TextureParameter::MinFilter(filter.0)));
    st.call(|b| b.tex_parameter_2d(TextureParameter::MagFilter(filter.1)));

    if data.is_some() {
      st.call(|b| b.generate_mipmap_2d());
    }

    log::trace!(
      "created texture {} ({}×{} {:?})",
      name,
      desc.width,
      desc.height,
      desc.internal_format
    );

    Texture2D {
      name,
      desc,
      wrap: Cell::new(wrap),
      filter: Cell::new(filter),
      border_color: Cell::new([0.; 4]),
      state: state.clone(),
    }
  }

  pub fn desc(&self) -> &TextureDesc {
    &self.desc
  }

  pub fn width(&self) -> u32 {
    self.desc.width
  }

  pub fn height(&self) -> u32 {
    self.desc.height
  }

  pub fn internal_format(&self) -> InternalFormat {
    self.desc.internal_format
  }

  /// Wrapping of the S and T coordinates.
  pub fn wrap_mode(&self) -> (Wrap, Wrap) {
    self.wrap.get()
  }

  pub fn filter_mode(&self) -> (MinFilter, MagFilter) {
    self.filter.get()
  }

  pub fn border_color(&self) -> [f32; 4] {
    self.border_color.get()
  }

  pub fn set_wrap_mode(&self, s: Wrap, t: Wrap) {
    self.wrap.set((s, t));
    self.set_parameters(&[TextureParameter::WrapS(s), TextureParameter::WrapT(t)]);
  }

  pub fn set_filter_mode(&self, min: MinFilter, mag: MagFilter) {
    self.filter.set((min, mag));
    self.set_parameters(&[
      TextureParameter::MinFilter(min),
      TextureParameter::MagFilter(mag),
    ]);
  }

  pub fn set_border_color(&self, color: [f32; 4]) {
    self.border_color.set(color);
    self.set_parameters(&[TextureParameter::BorderColor(color)]);
  }

  // texture commands apply to the texture bound on the active unit, so select unit 0 first
  fn set_parameters(&self, params: &[TextureParameter]) {
    let mut st = self.state.borrow_mut();
    st.select_texture(0, self.name);

    for &param in params {
      st.call(|b| b.tex_parameter_2d(param));
    }
  }
}

impl<B> Resource for Texture2D<B>
where
  B: Backend,
{
  fn name(&self) -> u32 {
    self.name
  }
}

impl<B> fmt::Debug for Texture2D<B>
where
  B: Backend,
{
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Texture2D")
      .field("name", &self.name)
      .field("desc", &self.desc)
      .field("wrap", &self.wrap.get())
      .field("filter", &self.filter.get())
      .field("border_color", &self.border_color.get())
      .finish()
  }
}

impl<B> Drop for Texture2D<B>
where
  B: Backend,
{
  fn drop(&mut self) {
    let name = self.name;
    let mut st = self.state.borrow_mut();

    st.on_delete_texture(name);
    st.call(|b| b.delete_texture(name));

    log::trace!("deleted texture {}", name);
  }
}
