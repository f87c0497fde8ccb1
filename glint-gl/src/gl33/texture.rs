use gl::types::*;
use std::os::raw::c_void;
use std::ptr;

use glint::backend::TextureParameter;
use glint::texture::TextureDesc;
use glint::{InternalFormat, MagFilter, MinFilter, PixelFormat, PixelType, Wrap};

pub(crate) fn opengl_internal_format(format: InternalFormat) -> GLenum {
  match format {
    InternalFormat::R8 => gl::R8,
    InternalFormat::RG8 => gl::RG8,
    InternalFormat::RGB8 => gl::RGB8,
    InternalFormat::RGBA8 => gl::RGBA8,
    InternalFormat::SRGB8 => gl::SRGB8,
    InternalFormat::SRGB8Alpha8 => gl::SRGB8_ALPHA8,
    InternalFormat::R16F => gl::R16F,
    InternalFormat::RG16F => gl::RG16F,
    InternalFormat::RGB16F => gl::RGB16F,
    InternalFormat::RGBA16F => gl::RGBA16F,
    InternalFormat::R32F => gl::R32F,
    InternalFormat::RG32F => gl::RG32F,
    InternalFormat::RGB32F => gl::RGB32F,
    InternalFormat::RGBA32F => gl::RGBA32F,
    InternalFormat::Depth16 => gl::DEPTH_COMPONENT16,
    InternalFormat::Depth24 => gl::DEPTH_COMPONENT24,
    InternalFormat::Depth32F => gl::DEPTH_COMPONENT32F,
    InternalFormat::Depth24Stencil8 => gl::DEPTH24_STENCIL8,
    InternalFormat::Depth32FStencil8 => gl::DEPTH32F_STENCIL8,
    InternalFormat::StencilIndex8 => gl::STENCIL_INDEX8,
  }
}

fn opengl_pixel_format(format: PixelFormat) -> GLenum {
  match format {
    PixelFormat::Red => gl::RED,
    PixelFormat::RG => gl::RG,
    PixelFormat::RGB => gl::RGB,
    PixelFormat::RGBA => gl::RGBA,
    PixelFormat::BGR => gl::BGR,
    PixelFormat::BGRA => gl::BGRA,
    PixelFormat::Depth => gl::DEPTH_COMPONENT,
    PixelFormat::DepthStencil => gl::DEPTH_STENCIL,
  }
}

fn opengl_pixel_type(ty: PixelType) -> GLenum {
  match ty {
    PixelType::Byte => gl::BYTE,
    PixelType::UnsignedByte => gl::UNSIGNED_BYTE,
    PixelType::Short => gl::SHORT,
    PixelType::UnsignedShort => gl::UNSIGNED_SHORT,
    PixelType::Int => gl::INT,
    PixelType::UnsignedInt => gl::UNSIGNED_INT,
    PixelType::HalfFloat => gl::HALF_FLOAT,
    PixelType::Float => gl::FLOAT,
    PixelType::UnsignedInt248 => gl::UNSIGNED_INT_24_8,
  }
}

fn opengl_wrap(wrap: Wrap) -> GLenum {
  match wrap {
    Wrap::Repeat => gl::REPEAT,
    Wrap::MirroredRepeat => gl::MIRRORED_REPEAT,
    Wrap::ClampToEdge => gl::CLAMP_TO_EDGE,
    Wrap::ClampToBorder => gl::CLAMP_TO_BORDER,
  }
}

fn opengl_min_filter(filter: MinFilter) -> GLenum {
  match filter {
    MinFilter::Nearest => gl::NEAREST,
    MinFilter::Linear => gl::LINEAR,
    MinFilter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
    MinFilter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
    MinFilter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
    MinFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
  }
}

fn opengl_mag_filter(filter: MagFilter) -> GLenum {
  match filter {
    MagFilter::Nearest => gl::NEAREST,
    MagFilter::Linear => gl::LINEAR,
  }
}

// set the unpack alignment for uploading tightly packed texels
pub(crate) unsafe fn set_unpack_alignment(alignment: GLint) {
  gl::PixelStorei(gl::UNPACK_ALIGNMENT, alignment);
}

pub(crate) unsafe fn tex_image_2d(desc: &TextureDesc, data: Option<&[u8]>) {
  let data = data.map_or(ptr::null(), |data| data.as_ptr() as *const c_void);

  gl::TexImage2D(
    gl::TEXTURE_2D,
    0,
    opengl_internal_format(desc.internal_format) as GLint,
    desc.width as GLsizei,
    desc.height as GLsizei,
    0,
    opengl_pixel_format(desc.pixel_format),
    opengl_pixel_type(desc.pixel_type),
    data,
  );
}

pub(crate) unsafe fn tex_parameter_2d(param: TextureParameter) {
  match param {
    TextureParameter::WrapS(wrap) => {
      gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, opengl_wrap(wrap) as GLint)
    }

    TextureParameter::WrapT(wrap) => {
      gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, opengl_wrap(wrap) as GLint)
    }

    TextureParameter::MinFilter(filter) => gl::TexParameteri(
      gl::TEXTURE_2D,
      gl::TEXTURE_MIN_FILTER,
      opengl_min_filter(filter) as GLint,
    ),

    TextureParameter::MagFilter(filter) => gl::TexParameteri(
      gl::TEXTURE_2D,
      gl::TEXTURE_MAG_FILTER,
      opengl_mag_filter(filter) as GLint,
    ),

    TextureParameter::BorderColor(color) => {
      gl::TexParameterfv(gl::TEXTURE_2D, gl::TEXTURE_BORDER_COLOR, color.as_ptr())
    }
  }
}
