//! End-to-end scenario tests exercising the frame protocol and error
//! taxonomy through the public `Renderer` API. These drive the same
//! public surface a real producer would, with a recording backend
//! standing in for the GPU.

mod support;

use render_core::command::ShaderStage;
use render_core::config::RendererConfig;
use render_core::context::{Rect, VertexSource};
use render_core::handle::{ProgramHandle, RawHandle};
use render_core::uniform::UniformType;
use render_core::vertex::VertexFormat;
use render_core::{NullBackend, Renderer};
use support::MockBackend;

fn single_threaded() -> Renderer<MockBackend> {
    Renderer::new(RendererConfig::default(), MockBackend::new(), false)
}

// A single triangle, no layer setup beyond what commit(0) touches.
#[test]
fn single_triangle_draws_once_on_default_layer() {
    let mut r = single_threaded();
    r.init();

    let vs = r.create_shader(ShaderStage::Vertex, b"vs");
    let fs = r.create_shader(ShaderStage::Fragment, b"fs");
    let program = r.create_program(vs, fs);
    let vb = r.create_vertex_buffer(&[0u8; 3 * 12], VertexFormat::P3);

    r.set_program(program);
    r.set_vertex_buffer(VertexSource::Static(vb), 3);
    r.commit(0);
    r.frame();

    let (touched, draws) = r.backend().unwrap().last_render_frame();
    assert_eq!(touched, 1);
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].1, 0);
    assert_eq!(draws[0].0.vertex_count, 3);
}

// Two draws committed out of layer order must be issued in
// ascending-by-layer order regardless of commit sequence.
#[test]
fn draws_are_issued_in_ascending_layer_order() {
    let mut r = single_threaded();
    r.init();
    let vs = r.create_shader(ShaderStage::Vertex, b"vs");
    let fs = r.create_shader(ShaderStage::Fragment, b"fs");
    let program = r.create_program(vs, fs);
    let vb1 = r.create_vertex_buffer(&[0u8; 3 * 12], VertexFormat::P3);
    let vb2 = r.create_vertex_buffer(&[0u8; 3 * 12], VertexFormat::P3);

    r.set_program(program);
    r.set_vertex_buffer(VertexSource::Static(vb1), 3);
    r.commit(2);

    r.set_program(program);
    r.set_vertex_buffer(VertexSource::Static(vb2), 3);
    r.commit(0);

    r.frame();

    let (_, draws) = r.backend().unwrap().last_render_frame();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].1, 0);
    assert_eq!(
        draws[0].0.vertex_source,
        Some(VertexSource::Static(vb2)),
        "the layer-0 draw (vb2) must be issued before the layer-2 draw (vb1)"
    );
    assert_eq!(draws[1].1, 2);
}

// A transient carve-out starts at offset 0 and sizes to count *
// stride; the next frame's reservation starts at 0 again.
#[test]
fn transient_carve_out_and_reset() {
    let mut r = single_threaded();
    r.init();

    let tvb = r.reserve_transient_vertex_buffer(6, VertexFormat::P3C4);
    let tib = r.reserve_transient_index_buffer(6);
    match tvb {
        VertexSource::Transient(reservation) => {
            assert_eq!(reservation.byte_offset, 0);
            assert_eq!(reservation.byte_size, 6 * VertexFormat::P3C4.bytes_per_vertex());
        }
        _ => panic!("expected a transient reservation"),
    }
    r.set_vertex_buffer(tvb, 6);
    r.set_index_buffer(tib, 0, 6);
    r.commit(0);
    r.frame();

    let tvb2 = r.reserve_transient_vertex_buffer(6, VertexFormat::P3C4);
    match tvb2 {
        VertexSource::Transient(reservation) => assert_eq!(reservation.byte_offset, 0),
        _ => panic!("expected a transient reservation"),
    }
}

// A uniform round-trips through the constant buffer and reaches the
// backend's update_uniform exactly once per frame.
#[test]
fn uniform_round_trip() {
    let mut r = single_threaded();
    r.init();
    let u = r.create_uniform("u_tint", UniformType::Float4, 1);
    let value: [f32; 4] = [1.0, 0.5, 0.25, 1.0];
    let bytes: Vec<u8> = value.iter().flat_map(|f| f.to_le_bytes()).collect();
    r.set_uniform(u, UniformType::Float4, &bytes);
    r.frame();

    let updates = r.backend().unwrap().uniform_updates(u);
    assert_eq!(updates.len(), 1, "update_uniform must be called exactly once per frame");
    assert_eq!(updates[0], bytes);
}

// Registering a stock-uniform name is a fatal name collision.
#[test]
#[should_panic(expected = "<NameCollision>")]
fn stock_name_collision_is_fatal() {
    let mut r = single_threaded();
    r.init();
    r.create_uniform("MODEL_VIEW_PROJECTION", UniformType::Float4x4, 1);
}

// Using a destroyed handle is a fatal invalid-handle error.
#[test]
#[should_panic(expected = "<InvalidHandle>")]
fn destroy_then_use_is_fatal() {
    let mut r = single_threaded();
    r.init();
    let vb = r.create_vertex_buffer(&[0u8; 3 * 12], VertexFormat::P3);
    r.destroy_vertex_buffer(vb);
    r.set_vertex_buffer(VertexSource::Static(vb), 3);
    r.commit(0);
}

#[test]
fn layer_setup_is_tracked_independently_of_draw_order() {
    let mut r = single_threaded();
    r.init();
    r.set_layer_viewport(1, Rect { x: 0, y: 0, width: 640, height: 480 });
    let vs = r.create_shader(ShaderStage::Vertex, b"vs");
    let fs = r.create_shader(ShaderStage::Fragment, b"fs");
    let program = r.create_program(vs, fs);
    let vb = r.create_vertex_buffer(&[0u8; 3 * 12], VertexFormat::P3);
    r.set_program(program);
    r.set_vertex_buffer(VertexSource::Static(vb), 3);
    r.commit(1);
    r.frame();

    let (touched, _) = r.backend().unwrap().last_render_frame();
    assert_eq!(touched, 1);
}

#[test]
fn threaded_mode_runs_a_frame_through_a_dedicated_thread() {
    let mut r = Renderer::new(RendererConfig::default(), NullBackend::default(), true);
    r.init();
    let vs = r.create_shader(ShaderStage::Vertex, b"vs");
    let fs = r.create_shader(ShaderStage::Fragment, b"fs");
    let program = r.create_program(vs, fs);
    let vb = r.create_vertex_buffer(&[0u8; 3 * 12], VertexFormat::P3);
    r.set_program(program);
    r.set_vertex_buffer(VertexSource::Static(vb), 3);
    r.commit(0);
    r.frame();
    assert!(r.backend().is_none(), "threaded mode does not expose the backend directly");
    r.shutdown();
}

#[test]
fn frame_dispatches_no_draws_once_nothing_new_was_committed() {
    let mut r = single_threaded();
    r.init();
    let vs = r.create_shader(ShaderStage::Vertex, b"vs");
    let fs = r.create_shader(ShaderStage::Fragment, b"fs");
    let program = r.create_program(vs, fs);
    let vb = r.create_vertex_buffer(&[0u8; 3 * 12], VertexFormat::P3);
    r.set_program(program);
    r.set_vertex_buffer(VertexSource::Static(vb), 3);
    r.commit(0);
    r.frame();
    r.frame();

    let (_, draws) = r.backend().unwrap().last_render_frame();
    assert!(draws.is_empty(), "a frame with no new commits must dispatch no draws");
}

#[test]
#[should_panic(expected = "<InvalidHandle>")]
fn invalid_program_handle_is_fatal() {
    let mut r = single_threaded();
    r.init();
    let bogus = ProgramHandle::new(RawHandle { index: 999, generation: 0 });
    r.set_program(bogus);
}
