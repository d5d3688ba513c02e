//! Uniform capture: every write lands at a fresh offset and draws keep the
//! bytes they were recorded with.

mod common;

use opal_graphics::glenum;
use opal_graphics::soft::{DrawTrace, ShaderStage};

fn uniform_data(draw: &DrawTrace, stage: ShaderStage, slot: u32) -> Option<Vec<u8>> {
    draw.uniforms
        .iter()
        .find(|u| u.stage == stage && u.slot == slot)
        .map(|u| u.data.clone())
}

#[test]
fn writes_capture_per_draw() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.uniform_allocate(program, ShaderStage::Vertex, 0, 16);
    ctx.bind_program(Some(program));

    ctx.uniform_write(program, ShaderStage::Vertex, 0, 0, &[1; 16]);
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.uniform_write(program, ShaderStage::Vertex, 0, 0, &[2; 16]);
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let draws = &ctx.device().submissions().last().unwrap().draws;
    assert_eq!(draws.len(), 2);
    assert_eq!(
        uniform_data(&draws[0], ShaderStage::Vertex, 0),
        Some(vec![1; 16])
    );
    assert_eq!(
        uniform_data(&draws[1], ShaderStage::Vertex, 0),
        Some(vec![2; 16])
    );
}

#[test]
fn partial_write_carries_the_rest_forward() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.uniform_allocate(program, ShaderStage::Vertex, 0, 16);
    ctx.bind_program(Some(program));

    ctx.uniform_write(program, ShaderStage::Vertex, 0, 0, &[7; 16]);
    ctx.uniform_write(program, ShaderStage::Vertex, 0, 4, &[9; 4]);
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let draws = &ctx.device().submissions().last().unwrap().draws;
    let mut expected = vec![7u8; 16];
    expected[4..8].fill(9);
    assert_eq!(
        uniform_data(&draws[0], ShaderStage::Vertex, 0),
        Some(expected)
    );
}

#[test]
fn invalid_writes_are_dropped() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.uniform_allocate(program, ShaderStage::Vertex, 0, 16);
    ctx.bind_program(Some(program));

    // Undeclared slot, then out of bounds on a declared one.
    ctx.uniform_write(program, ShaderStage::Vertex, 5, 0, &[1; 4]);
    ctx.uniform_write(program, ShaderStage::Vertex, 0, 14, &[1; 4]);
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let draws = &ctx.device().submissions().last().unwrap().draws;
    assert_eq!(draws.len(), 1);
    assert!(draws[0].uniforms.is_empty());
}

#[test]
fn stages_and_slots_are_independent() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.uniform_allocate(program, ShaderStage::Vertex, 0, 8);
    ctx.uniform_allocate(program, ShaderStage::Fragment, 2, 8);
    ctx.bind_program(Some(program));

    ctx.uniform_write(program, ShaderStage::Vertex, 0, 0, &[11; 8]);
    ctx.uniform_write(program, ShaderStage::Fragment, 2, 0, &[22; 8]);
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let draws = &ctx.device().submissions().last().unwrap().draws;
    assert_eq!(
        uniform_data(&draws[0], ShaderStage::Vertex, 0),
        Some(vec![11; 8])
    );
    assert_eq!(
        uniform_data(&draws[0], ShaderStage::Fragment, 2),
        Some(vec![22; 8])
    );
}

#[test]
fn values_survive_slot_rotation() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.uniform_allocate(program, ShaderStage::Vertex, 0, 16);
    ctx.bind_program(Some(program));
    ctx.uniform_write(program, ShaderStage::Vertex, 0, 0, &[3; 16]);

    // The uniform region is rebuilt at every rotation; the value must ride
    // along.
    common::next_frame(&mut ctx);
    common::next_frame(&mut ctx);
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let draws = &ctx.device().submissions().last().unwrap().draws;
    assert_eq!(
        uniform_data(&draws[0], ShaderStage::Vertex, 0),
        Some(vec![3; 16])
    );
}

#[test]
fn programs_outlive_their_shaders() {
    let mut ctx = common::context();
    let vs = ctx
        .load_shader_binary(&opal_graphics::encode_shader_binary(
            ShaderStage::Vertex,
            &[0x30; 32],
        ))
        .unwrap();
    let fs = ctx
        .load_shader_binary(&opal_graphics::encode_shader_binary(
            ShaderStage::Fragment,
            &[0x40; 32],
        ))
        .unwrap();
    let program = ctx.link_program(vs, fs);
    ctx.delete_shader(vs);
    ctx.delete_shader(fs);

    ctx.bind_program(Some(program));
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let draws = &ctx.device().submissions().last().unwrap().draws;
    assert_eq!(draws.len(), 1);
    assert!(draws[0].vertex_shader.is_some());
    assert!(draws[0].fragment_shader.is_some());
}

#[test]
fn stage_mismatch_fails_the_link() {
    let mut ctx = common::context();
    let fs_a = ctx
        .load_shader_binary(&opal_graphics::encode_shader_binary(
            ShaderStage::Fragment,
            &[0x50; 32],
        ))
        .unwrap();
    let fs_b = ctx
        .load_shader_binary(&opal_graphics::encode_shader_binary(
            ShaderStage::Fragment,
            &[0x60; 32],
        ))
        .unwrap();
    let program = ctx.link_program(fs_a, fs_b);
    ctx.bind_program(Some(program));
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();
    assert!(ctx.device().submissions().last().unwrap().draws.is_empty());
}
