mod common;

use glint::backend::trace::Call;
use glint::backend::BufferTarget;
use glint::{
  InternalFormat, PixelFormat, PixelType, Primitive, ProgramParameter, ProgramParameters,
  Resource, UniformValue, VertexElement, VertexElementType,
};

use common::Scene;

#[test]
fn repeated_draws_bind_nothing() {
  let mut scene = Scene::new();
  let texture = scene.device.create_texture_2d(
    InternalFormat::RGBA8,
    2,
    2,
    PixelFormat::RGBA,
    PixelType::UnsignedByte,
    None,
  );
  scene.device.set_texture(0, Some(&texture));
  scene.device.set_texture(5, Some(&texture));

  scene.device.draw_arrays(Primitive::Triangles, 0, 3);
  assert!(scene.log.bind_count() > 0);

  scene.log.clear();

  for _ in 0..4 {
    scene.device.draw_arrays(Primitive::Triangles, 0, 3);
  }

  assert_eq!(scene.log.bind_count(), 0);
  assert_eq!(scene.log.count(Call::is_draw), 4);
  assert_eq!(scene.log.len(), 4);
}

#[test]
fn unused_attribute_slots_are_disabled_once() {
  let mut scene = Scene::new();

  let wide = scene.device.create_vertex_layout(vec![
    VertexElement::new(0, 0, 0, 20, VertexElementType::Float3),
    VertexElement::new(0, 1, 12, 20, VertexElementType::Float2),
    VertexElement::new(0, 2, 16, 20, VertexElementType::Color),
  ]);
  let narrow = scene.device.create_vertex_layout(vec![VertexElement::new(
    0,
    0,
    0,
    20,
    VertexElementType::Float3,
  )]);

  scene.device.set_vertex_layout(Some(&wide));
  scene.device.draw_arrays(Primitive::Points, 0, 4);
  assert_eq!(
    scene.log.count(|c| matches!(c, Call::EnableVertexAttribArray(_))),
    3
  );

  scene.log.clear();
  scene.device.set_vertex_layout(Some(&narrow));
  scene.device.draw_arrays(Primitive::Points, 0, 4);

  let calls = scene.log.take();
  let disabled: Vec<u32> = calls
    .iter()
    .filter_map(|c| match *c {
      Call::DisableVertexAttribArray(slot) => Some(slot),
      _ => None,
    })
    .collect();
  assert_eq!(disabled, vec![1, 2]);

  let draw = calls.iter().position(Call::is_draw);
  let last_disable = calls
    .iter()
    .rposition(|c| matches!(c, Call::DisableVertexAttribArray(_)));
  assert!(last_disable < draw);

  // slot 0 was configured identically by both layouts
  assert!(!calls
    .iter()
    .any(|c| matches!(c, Call::VertexAttribPointer(..) | Call::VertexAttribIPointer(..))));

  scene.device.draw_arrays(Primitive::Points, 0, 4);
  assert_eq!(
    scene.log.count(|c| matches!(c, Call::DisableVertexAttribArray(_))),
    0
  );
}

#[test]
fn integer_elements_take_integer_path() {
  let mut scene = Scene::new();
  let layout = scene.device.create_vertex_layout(vec![
    VertexElement::new(0, 0, 0, 20, VertexElementType::Float3),
    VertexElement::new(0, 3, 12, 20, VertexElementType::UShort2),
  ]);

  scene.device.set_vertex_layout(Some(&layout));
  scene.log.clear();
  scene.device.draw_arrays(Primitive::Points, 0, 1);

  assert_eq!(
    scene.log.count(|c| matches!(c, Call::VertexAttribIPointer(3, ..))),
    1
  );
  assert_eq!(
    scene.log.count(|c| matches!(c, Call::VertexAttribPointer(0, ..))),
    1
  );
}

#[test]
fn switching_stream_source_respecifies_attributes() {
  let mut scene = Scene::new();
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);

  let other = common::vertices(&scene.device, 4);
  scene.device.set_stream_source(0, Some(&other));
  scene.log.clear();
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);

  let calls = scene.log.take();
  assert_eq!(
    calls
      .iter()
      .filter(|c| matches!(c, Call::VertexAttribPointer(..)))
      .count(),
    2
  );
  // the new buffer is still bound from its creation
  assert!(!calls.contains(&Call::BindBuffer(BufferTarget::Array, other.name())));
  assert!(!calls
    .iter()
    .any(|c| matches!(c, Call::EnableVertexAttribArray(_))));
}

#[test]
fn deleted_texture_name_is_not_considered_bound() {
  let mut scene = Scene::new();
  let make_texture = |scene: &Scene| {
    scene.device.create_texture_2d(
      InternalFormat::RGBA8,
      4,
      4,
      PixelFormat::RGBA,
      PixelType::UnsignedByte,
      None,
    )
  };

  let first = make_texture(&scene);
  let first_name = first.name();
  scene.device.set_texture(2, Some(&first));
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);
  assert_eq!(scene.device.current_state().textures[2], first_name);

  scene.device.clear_texture(2);
  drop(first);
  assert_eq!(scene.device.current_state().textures[2], 0);

  let second = make_texture(&scene);
  assert_eq!(second.name(), first_name);

  scene.device.set_texture(2, Some(&second));
  scene.log.clear();
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);

  let calls = scene.log.take();
  let bind = calls
    .iter()
    .position(|c| *c == Call::BindTexture2d(first_name));
  let activate = calls.iter().position(|c| *c == Call::ActiveTexture(2));
  assert!(bind.is_some());
  assert!(activate < bind);
}

#[test]
fn texture_sweep_unbinds_units_left_empty() {
  let mut scene = Scene::new();
  let texture = scene.device.create_texture_2d(
    InternalFormat::R8,
    1,
    1,
    PixelFormat::Red,
    PixelType::UnsignedByte,
    Some(&[0u8][..]),
  );

  scene.device.set_texture(1, Some(&texture));
  scene.device.set_texture(3, Some(&texture));
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);

  scene.device.clear_texture(1);
  scene.log.clear();
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);

  let binds: Vec<Call> = scene
    .log
    .calls()
    .into_iter()
    .filter(Call::is_bind)
    .collect();
  assert_eq!(binds, vec![Call::ActiveTexture(1), Call::BindTexture2d(0)]);
}

#[test]
fn unknown_parameters_are_skipped() {
  let mut scene = Scene::new();

  let mut params = ProgramParameters::new();
  params.push(ProgramParameter::vec4("tint", [1., 0.5, 0.25, 1.]));
  params.push(ProgramParameter::float("does_not_exist", 3.));
  params.push(ProgramParameter::int("tex", 0));
  let params = params.into_shared();

  scene.device.set_program_parameters(Some(&params));
  scene.log.clear();
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);

  let tint = scene.program.uniform_location("tint").unwrap();
  let tex = scene.program.uniform_location("tex").unwrap();

  let uniforms: Vec<Call> = scene
    .log
    .calls()
    .into_iter()
    .filter(|c| matches!(c, Call::Uniform(..)))
    .collect();
  assert_eq!(
    uniforms,
    vec![
      Call::Uniform(tint, UniformValue::Float4(vec![[1., 0.5, 0.25, 1.]])),
      Call::Uniform(tex, UniformValue::Int1(vec![0])),
    ]
  );
  assert_eq!(scene.log.pending_errors(), 0);
}

#[test]
fn block_members_are_not_uploaded() {
  let mut scene = Scene::new();
  let vs = scene.device.create_vertex_shader(common::VS);
  let fs = scene.device.create_pixel_shader(
    "
    #version 330 core

    uniform Material {
      vec4 albedo;
    };

    uniform vec4 tint;

    out vec4 frag;

    void main() {
      frag = albedo * tint;
    }
    ",
  );
  let program = scene.device.create_program(&vs, &fs);
  assert!(program.is_linked(), "{}", program.info_log());
  assert_eq!(program.uniform("albedo").map(|u| u.location), Some(-1));
  assert_eq!(program.uniform_location("albedo"), None);

  let mut params = ProgramParameters::new();
  params.push(ProgramParameter::vec4("albedo", [1., 0., 0., 1.]));
  params.push(ProgramParameter::vec4("tint", [0., 1., 0., 1.]));
  let params = params.into_shared();

  scene.device.set_program(Some(&program));
  scene.device.set_program_parameters(Some(&params));
  scene.log.clear();
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);

  let tint = program.uniform_location("tint").unwrap();
  let uniforms: Vec<Call> = scene
    .log
    .calls()
    .into_iter()
    .filter(|c| matches!(c, Call::Uniform(..)))
    .collect();
  assert_eq!(
    uniforms,
    vec![Call::Uniform(tint, UniformValue::Float4(vec![[0., 1., 0., 1.]]))]
  );
}

#[test]
fn parameters_are_read_at_draw_time() {
  let mut scene = Scene::new();
  let params = ProgramParameters::new().into_shared();
  params.borrow_mut().set("tint", [0f32, 0., 0., 1.]);

  scene.device.set_program_parameters(Some(&params));
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);

  params.borrow_mut().set("tint", [1f32, 1., 1., 1.]);
  scene.log.clear();
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);

  let tint = scene.program.uniform_location("tint").unwrap();
  assert_eq!(
    scene.log.calls()[0],
    Call::Uniform(tint, UniformValue::Float4(vec![[1., 1., 1., 1.]]))
  );
}

#[test]
fn triangle_fan_scenario() {
  let (mut device, log) = common::device();
  let program = common::program(&device);
  let layout = common::layout(&device);
  let quad = common::vertices(&device, 4);
  // leaves another buffer bound to the array target
  let _other = common::vertices(&device, 1);

  let params = ProgramParameters::new().into_shared();
  params.borrow_mut().push(ProgramParameter::mat4(
    "model",
    [
      1., 0., 0., 0., 0., 1., 0., 0., 0., 0., 1., 0., 0., 0., 0., 1.,
    ],
  ));

  device.set_stream_source(0, Some(&quad));
  device.set_vertex_layout(Some(&layout));
  device.set_program(Some(&program));
  device.set_program_parameters(Some(&params));

  log.clear();
  device.draw_arrays(Primitive::TriangleFan, 0, 4);

  assert_eq!(log.count(|c| matches!(c, Call::BindBuffer(..))), 1);
  assert_eq!(
    log.count(|c| *c == Call::BindBuffer(BufferTarget::Array, quad.name())),
    1
  );
  assert_eq!(
    log.count(|c| matches!(c, Call::VertexAttribPointer(..))),
    2
  );
  assert_eq!(log.count(|c| *c == Call::UseProgram(program.name())), 1);
  assert_eq!(log.count(|c| matches!(c, Call::Uniform(..))), 1);
  assert_eq!(log.count(Call::is_draw), 1);
  assert_eq!(
    log.calls().last(),
    Some(&Call::DrawArrays(Primitive::TriangleFan, 0, 4))
  );

  log.clear();
  device.draw_arrays(Primitive::TriangleFan, 0, 4);

  assert_eq!(log.bind_count(), 0);
  assert_eq!(log.count(Call::is_draw), 1);
  assert_eq!(log.pending_errors(), 0);
}

#[test]
#[should_panic(expected = "cannot draw without a vertex layout")]
fn draw_without_layout() {
  let mut scene = Scene::new();
  scene.device.set_vertex_layout(None);
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);
}

#[test]
#[should_panic(expected = "which has no source")]
fn draw_with_missing_stream() {
  let mut scene = Scene::new();
  scene.device.clear_stream_source(0);
  scene.device.draw_arrays(Primitive::Triangles, 0, 3);
}
