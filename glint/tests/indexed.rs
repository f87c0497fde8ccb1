mod common;

use glint::backend::trace::Call;
use glint::backend::IndexType;
use glint::{BufferUsage, LockAccess, Primitive, Resource};

use common::Scene;

fn u16_bytes(indices: &[u16]) -> Vec<u8> {
  indices.iter().flat_map(|i| i.to_le_bytes().to_vec()).collect()
}

fn u32_bytes(indices: &[u32]) -> Vec<u8> {
  indices.iter().flat_map(|i| i.to_le_bytes().to_vec()).collect()
}

#[test]
fn short_indices_draw_16_bits() {
  let mut scene = Scene::new();
  let data = u16_bytes(&[0, 1, 2, 2, 3, 0]);
  let indices =
    scene
      .device
      .create_index_buffer(data.len(), Some(data.as_slice()), 2, BufferUsage::StaticDraw);

  assert_eq!(indices.len(), 6);
  assert_eq!(indices.index_type(), IndexType::U16);

  scene.log.clear();
  scene.device.draw_indexed(&indices, Primitive::Triangles, 3, 3);

  assert_eq!(
    scene.log.calls().last(),
    Some(&Call::DrawElements {
      mode: Primitive::Triangles,
      count: 3,
      ty: IndexType::U16,
      offset: 6,
      indices: vec![2, 3, 0],
    })
  );
  assert_eq!(scene.log.pending_errors(), 0);
}

#[test]
fn long_indices_draw_32_bits() {
  let mut scene = Scene::new();
  let data = u32_bytes(&[3, 2, 1, 0, 70000]);
  let indices =
    scene
      .device
      .create_index_buffer(data.len(), Some(data.as_slice()), 4, BufferUsage::StaticDraw);

  assert_eq!(indices.index_type(), IndexType::U32);

  scene.log.clear();
  scene.device.draw_indexed(&indices, Primitive::LineStrip, 1, 4);

  match scene.log.calls().last() {
    Some(Call::DrawElements {
      ty,
      offset,
      indices,
      count,
      ..
    }) => {
      assert_eq!(*ty, IndexType::U32);
      assert_eq!(*offset, 4);
      assert_eq!(*count, 4);
      assert_eq!(*indices, vec![2, 1, 0, 70000]);
    }

    other => panic!("expected an indexed draw, got {:?}", other),
  }
}

#[test]
fn draw_processes_requested_count_only() {
  let mut scene = Scene::new();
  let data = u16_bytes(&[0, 1, 2, 3, 0, 1, 2, 3]);
  let indices =
    scene
      .device
      .create_index_buffer(data.len(), Some(data.as_slice()), 2, BufferUsage::StaticDraw);

  scene.log.clear();
  scene.device.draw_indexed(&indices, Primitive::TriangleStrip, 0, 4);

  let processed = scene
    .log
    .calls()
    .into_iter()
    .find_map(|c| match c {
      Call::DrawElements { indices, .. } => Some(indices.len()),
      _ => None,
    });
  assert_eq!(processed, Some(4));
}

#[test]
fn index_buffer_bind_is_deduplicated() {
  let mut scene = Scene::new();
  let data = u16_bytes(&[0, 1, 2]);
  let first =
    scene
      .device
      .create_index_buffer(data.len(), Some(data.as_slice()), 2, BufferUsage::StaticDraw);
  let second =
    scene
      .device
      .create_index_buffer(data.len(), Some(data.as_slice()), 2, BufferUsage::StaticDraw);

  scene.log.clear();
  scene.device.draw_indexed(&first, Primitive::Triangles, 0, 3);
  scene.device.draw_indexed(&first, Primitive::Triangles, 0, 3);
  scene.device.draw_indexed(&second, Primitive::Triangles, 0, 3);

  let binds: Vec<Call> = scene
    .log
    .calls()
    .into_iter()
    .filter(|c| matches!(c, Call::BindBuffer(..)))
    .collect();
  assert_eq!(
    binds,
    vec![
      Call::BindBuffer(glint::backend::BufferTarget::ElementArray, first.name()),
      Call::BindBuffer(glint::backend::BufferTarget::ElementArray, second.name()),
    ]
  );
}

#[test]
#[should_panic(expected = "out of index buffer bounds")]
fn index_range_past_the_end() {
  let mut scene = Scene::new();
  let data = u16_bytes(&[0, 1, 2]);
  let indices = scene
    .device
    .create_index_buffer(data.len(), Some(data.as_slice()), 2, BufferUsage::StaticDraw);

  scene.device.draw_indexed(&indices, Primitive::Triangles, 1, 3);
}

#[test]
#[should_panic]
fn odd_index_stride() {
  let scene = Scene::new();
  scene
    .device
    .create_index_buffer(6, None, 3, BufferUsage::StaticDraw);
}

#[test]
fn lock_reads_and_writes_contents() {
  let scene = Scene::new();
  let data: Vec<u8> = (0..16).collect();
  let buffer =
    scene
      .device
      .create_vertex_buffer(data.len(), Some(data.as_slice()), BufferUsage::DynamicDraw);

  {
    let lock = buffer.lock(0, 16, LockAccess::ReadOnly).unwrap();
    assert_eq!(lock.as_slice::<u8>(), data.as_slice());
  }

  assert!(!buffer.is_locked());
  buffer.update(4, &[0xff; 4]).unwrap();

  let lock = buffer.lock(4, 8, LockAccess::ReadWrite).unwrap();
  assert_eq!(lock.as_slice::<u8>(), &[0xff, 0xff, 0xff, 0xff, 8, 9, 10, 11]);
  assert!(buffer.is_locked());
}

#[test]
#[should_panic(expected = "already locked")]
fn double_lock_panics() {
  let scene = Scene::new();
  let buffer = scene
    .device
    .create_vertex_buffer(8, None, BufferUsage::StaticDraw);

  let _lock = buffer.lock(0, 8, LockAccess::WriteDiscard).unwrap();
  let _again = buffer.lock(0, 4, LockAccess::ReadOnly);
}

#[test]
#[should_panic(expected = "read-only lock")]
fn write_through_read_only_lock() {
  let scene = Scene::new();
  let buffer = scene
    .device
    .create_vertex_buffer(8, None, BufferUsage::StaticDraw);

  let mut lock = buffer.lock(0, 8, LockAccess::ReadOnly).unwrap();
  lock.as_mut_slice::<u8>()[0] = 1;
}

#[test]
fn deleting_bound_buffer_resets_cache() {
  let scene = Scene::new();
  let buffer = scene
    .device
    .create_vertex_buffer(8, None, BufferUsage::StaticDraw);
  let name = buffer.name();
  assert_eq!(scene.device.current_state().array_buffer, name);

  scene.log.clear();
  drop(buffer);

  assert_eq!(scene.device.current_state().array_buffer, 0);
  assert_eq!(
    scene.log.calls(),
    vec![
      Call::BindBuffer(glint::backend::BufferTarget::Array, 0),
      Call::DeleteBuffer(name),
    ]
  );
}
