#![allow(dead_code)]

use glint::backend::trace::{TraceBackend, TraceLog};
use glint::{
  BufferUsage, Device, Handle, Program, VertexBuffer, VertexElement, VertexElementType,
  VertexLayout,
};

pub const VS: &str = "
#version 330 core

in vec3 co;
in vec2 uv;

uniform mat4 model;

out vec2 v_uv;

void main() {
  v_uv = uv;
  gl_Position = model * vec4(co, 1.);
}
";

pub const FS: &str = "
#version 330 core

in vec2 v_uv;

uniform sampler2D tex;
uniform vec4 tint;

out vec4 frag;

void main() {
  frag = texture(tex, v_uv) * tint;
}
";

pub fn init_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

pub fn device() -> (Device<TraceBackend>, TraceLog) {
  init_logger();

  let backend = TraceBackend::new();
  let log = backend.log();

  (Device::new(backend), log)
}

pub fn program(device: &Device<TraceBackend>) -> Handle<Program<TraceBackend>> {
  let vs = device.create_vertex_shader(VS);
  let fs = device.create_pixel_shader(FS);
  let program = device.create_program(&vs, &fs);
  assert!(program.is_linked(), "{}", program.info_log());

  program
}

/// Interleaved float3 position and float2 texture coordinates on stream 0.
pub fn layout(device: &Device<TraceBackend>) -> Handle<VertexLayout> {
  device.create_vertex_layout(vec![
    VertexElement::new(0, 0, 0, 20, VertexElementType::Float3),
    VertexElement::new(0, 1, 12, 20, VertexElementType::Float2),
  ])
}

/// `count` vertices matching [`layout`].
pub fn vertices(device: &Device<TraceBackend>, count: usize) -> Handle<VertexBuffer<TraceBackend>> {
  let data = vec![0u8; count * 20];
  device.create_vertex_buffer(data.len(), Some(data.as_slice()), BufferUsage::StaticDraw)
}

/// A device with a program, a layout and a stream source pending, ready to draw.
pub struct Scene {
  pub device: Device<TraceBackend>,
  pub log: TraceLog,
  pub program: Handle<Program<TraceBackend>>,
  pub layout: Handle<VertexLayout>,
  pub vertices: Handle<VertexBuffer<TraceBackend>>,
}

impl Scene {
  pub fn new() -> Self {
    let (mut device, log) = device();
    let program = program(&device);
    let layout = layout(&device);
    let vertices = vertices(&device, 4);

    device.set_program(Some(&program));
    device.set_vertex_layout(Some(&layout));
    device.set_stream_source(0, Some(&vertices));

    Scene {
      device,
      log,
      program,
      layout,
      vertices,
    }
  }
}
