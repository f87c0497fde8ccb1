//! Vertex layouts.
//!
//! A [`VertexLayout`] describes how the vertex streams bound on the device feed the vertex
//! attribute slots of a program. Each [`VertexElement`] reads one attribute from one stream, at a
//! given byte offset and stride, with a given [`VertexElementType`].

use crate::state::{MAX_STREAMS, MAX_VERTEX_ATTRIBS};

/// Primitive type of a vertex attribute component.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttribType {
  UnsignedByte,
  Short,
  UnsignedShort,
  HalfFloat,
  Float,
  /// Packed 10-10-10-2 unsigned components, stored in reverse order.
  UnsignedInt2101010Rev,
}

/// Fully resolved attribute format, as handed to the backend.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AttribFormat {
  /// Type of each component.
  pub ty: AttribType,
  /// Number of components (1 to 4).
  pub size: u32,
  /// Whether integer components are normalized to `[0; 1]` (or `[-1; 1]` if signed).
  pub normalized: bool,
  /// Whether the shader sees the attribute as floating point.
  ///
  /// When `false`, the attribute is sourced through the integer attribute path.
  pub convert_to_float: bool,
}

/// Logical type of a vertex element.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VertexElementType {
  Float1,
  Float2,
  Float3,
  Float4,
  /// Normal packed in four normalized unsigned bytes.
  PackedNormal,
  UByte4,
  UByte4N,
  /// RGBA color in four normalized unsigned bytes.
  Color,
  Short2,
  Short4,
  Short2N,
  Short4N,
  Half2,
  Half4,
  UShort2,
  UShort4,
  UShort2N,
  UShort4N,
  /// Three 10-bit and one 2-bit normalized unsigned components.
  URGB10A2N,
}

impl VertexElementType {
  /// Backend format of this element type.
  pub fn format(self) -> AttribFormat {
    use AttribType::*;

    let (ty, size, normalized, convert_to_float) = match self {
      VertexElementType::Float1 => (Float, 1, false, true),
      VertexElementType::Float2 => (Float, 2, false, true),
      VertexElementType::Float3 => (Float, 3, false, true),
      VertexElementType::Float4 => (Float, 4, false, true),
      VertexElementType::PackedNormal => (UnsignedByte, 4, true, true),
      VertexElementType::UByte4 => (UnsignedByte, 4, false, false),
      VertexElementType::UByte4N => (UnsignedByte, 4, true, true),
      VertexElementType::Color => (UnsignedByte, 4, true, true),
      VertexElementType::Short2 => (Short, 2, false, false),
      VertexElementType::Short4 => (Short, 4, false, false),
      VertexElementType::Short2N => (Short, 2, true, true),
      VertexElementType::Short4N => (Short, 4, true, true),
      VertexElementType::Half2 => (HalfFloat, 2, false, true),
      VertexElementType::Half4 => (HalfFloat, 4, false, true),
      VertexElementType::UShort2 => (UnsignedShort, 2, false, false),
      VertexElementType::UShort4 => (UnsignedShort, 4, false, false),
      VertexElementType::UShort2N => (UnsignedShort, 2, true, true),
      VertexElementType::UShort4N => (UnsignedShort, 4, true, true),
      VertexElementType::URGB10A2N => (UnsignedInt2101010Rev, 4, true, true),
    };

    AttribFormat {
      ty,
      size,
      normalized,
      convert_to_float,
    }
  }

  /// Size in bytes of one element of this type.
  pub fn bytes(self) -> usize {
    let format = self.format();
    let component = match format.ty {
      AttribType::UnsignedByte => 1,
      AttribType::Short | AttribType::UnsignedShort | AttribType::HalfFloat => 2,
      AttribType::Float => 4,
      AttribType::UnsignedInt2101010Rev => return 4,
    };

    component * format.size as usize
  }
}

/// A single attribute read from a single stream.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VertexElement {
  /// Stream the attribute is read from.
  pub stream_index: u32,
  /// Attribute slot the attribute feeds.
  pub attribute_index: u32,
  /// Offset in bytes of the first attribute in the stream.
  pub offset: usize,
  /// Distance in bytes between two consecutive attributes in the stream.
  pub stride: u32,
  /// Logical type.
  pub ty: VertexElementType,
}

impl VertexElement {
  pub fn new(
    stream_index: u32,
    attribute_index: u32,
    offset: usize,
    stride: u32,
    ty: VertexElementType,
  ) -> Self {
    VertexElement {
      stream_index,
      attribute_index,
      offset,
      stride,
      ty,
    }
  }

  /// Backend format of the element.
  pub fn format(&self) -> AttribFormat {
    self.ty.format()
  }
}

/// Ordered list of vertex elements.
///
/// A layout doesn’t own any backend object: it’s resolved against the pending stream sources at
/// draw time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VertexLayout {
  elements: Vec<VertexElement>,
}

impl VertexLayout {
  /// Build a layout.
  ///
  /// # Panics
  ///
  /// Panics if an element reads from a stream or feeds a slot out of the hardware limits.
  pub fn new(elements: impl Into<Vec<VertexElement>>) -> Self {
    let elements = elements.into();

    for element in &elements {
      assert!(
        (element.stream_index as usize) < MAX_STREAMS,
        "stream index {} out of range (max {})",
        element.stream_index,
        MAX_STREAMS
      );
      assert!(
        (element.attribute_index as usize) < MAX_VERTEX_ATTRIBS,
        "attribute slot {} out of range (max {})",
        element.attribute_index,
        MAX_VERTEX_ATTRIBS
      );
    }

    VertexLayout { elements }
  }

  pub fn elements(&self) -> &[VertexElement] {
    &self.elements
  }

  pub fn len(&self) -> usize {
    self.elements.len()
  }

  pub fn is_empty(&self) -> bool {
    self.elements.is_empty()
  }
}
