//! Frame slot rotation, fence gating, flush/finish and the sticky queue
//! error.

mod common;

use opal_graphics::soft::{CacheFlags, Command, ShaderStage};
use opal_graphics::{glenum, ClearMask};

#[test]
fn presents_rotate_through_three_surfaces() {
    let mut ctx = common::context();
    for _ in 0..4 {
        common::next_frame(&mut ctx);
    }
    let presented = ctx.device().presented();
    assert_eq!(presented.len(), 4);
    assert_ne!(presented[0], presented[1]);
    assert_ne!(presented[1], presented[2]);
    assert_ne!(presented[0], presented[2]);
    // Fourth frame reuses the first surface.
    assert_eq!(presented[0], presented[3]);
}

#[test]
fn slot_reuse_waits_the_slot_fence() {
    let mut ctx = common::context();
    for _ in 0..5 {
        common::next_frame(&mut ctx);
    }
    let device = ctx.device();
    let submissions = device.submissions();
    assert_eq!(submissions.len(), 5);
    // Rotating into a slot waits the fence of the frame it ran two frames
    // ago; everything older retires with it.
    assert!(device.fence_signaled(submissions[2].fence));
    assert!(!device.fence_signaled(submissions[3].fence));
    assert!(!device.fence_signaled(submissions[4].fence));
}

#[test]
fn present_is_decoupled_from_submit() {
    let mut ctx = common::context();
    ctx.set_viewport(0, 0, 8, 8);
    ctx.end_frame();
    // Submitting presents nothing on its own.
    assert_eq!(ctx.device().submissions().len(), 1);
    assert!(ctx.device().presented().is_empty());

    // A slot can be reopened without ever presenting.
    ctx.acquire_frame();
    ctx.wait_slot_fence();
    ctx.begin_frame();
    assert_eq!(ctx.frame_index(), 1);

    ctx.end_frame();
    ctx.present_frame();
    assert_eq!(ctx.device().submissions().len(), 2);
    assert_eq!(ctx.device().presented().len(), 1);
}

#[test]
fn pipelined_draws_keep_their_own_uniforms() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.uniform_allocate(program, ShaderStage::Vertex, 0, 16);
    ctx.bind_program(Some(program));

    for frame in 0..60u32 {
        for mesh in 0..3u32 {
            let tint = (frame * 3 + mesh) as u8;
            ctx.uniform_write(program, ShaderStage::Vertex, 0, 0, &[tint; 16]);
            ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
        }
        common::next_frame(&mut ctx);
    }

    let device = ctx.device();
    let submissions = device.submissions();
    assert_eq!(submissions.len(), 60);
    for (frame, submission) in submissions.iter().enumerate() {
        // Every draw keeps the uniform value it was recorded with, even
        // though the region is reclaimed as slots rotate.
        assert_eq!(submission.draws.len(), 3);
        for (mesh, draw) in submission.draws.iter().enumerate() {
            let tint = (frame * 3 + mesh) as u8;
            let uniform = draw
                .uniforms
                .iter()
                .find(|u| u.stage == ShaderStage::Vertex && u.slot == 0)
                .unwrap();
            assert_eq!(uniform.data, vec![tint; 16]);
        }
        // A slot is only reused once its frame from three turns earlier
        // retired.
        if frame + 3 < submissions.len() {
            assert!(device.fence_signaled(submission.fence));
        }
    }
}

#[test]
fn finish_drains_every_fence() {
    let mut ctx = common::context();
    common::next_frame(&mut ctx);
    common::next_frame(&mut ctx);
    ctx.finish();
    let device = ctx.device();
    for submission in device.submissions() {
        assert!(device.fence_signaled(submission.fence));
    }
}

#[test]
fn flush_replays_bound_state() {
    let mut ctx = common::context();
    ctx.set_viewport(1, 2, 30, 40);
    ctx.flush();
    // The reopened command buffer starts with targets, descriptors and the
    // cached state; a second flush makes it observable.
    ctx.flush();
    let submission = ctx.device().submissions().last().unwrap();
    assert!(matches!(
        submission.commands[0],
        Command::BindRenderTargets { color: Some(_), .. }
    ));
    assert!(submission.commands.iter().any(|c| matches!(
        c,
        Command::SetViewport {
            x: 1,
            y: 2,
            width: 30,
            height: 40,
        }
    )));
    assert!(submission
        .commands
        .iter()
        .any(|c| matches!(c, Command::BindDescriptorSets { .. })));
}

#[test]
fn texture_barrier_reaches_the_queue() {
    let mut ctx = common::context();
    ctx.texture_barrier();
    ctx.flush();
    let submission = ctx.device().submissions().last().unwrap();
    assert!(submission.barrier_count >= 1);
    assert!(submission
        .barrier_flags
        .contains(CacheFlags::IMAGE | CacheFlags::DESCRIPTOR));
}

#[test]
fn queue_error_is_sticky_and_silent() {
    let mut ctx = common::context();
    common::next_frame(&mut ctx);
    let submitted = ctx.device().submissions().len();
    let presented = ctx.device().presented().len();

    ctx.poison_queue();
    ctx.clear(ClearMask::COLOR, [1.0, 0.0, 0.0, 1.0], 1.0, 0);
    common::next_frame(&mut ctx);
    assert!(ctx.queue_error());
    // The work is dropped, nothing panics, and later frames stay no-ops.
    assert_eq!(ctx.device().submissions().len(), submitted);
    assert_eq!(ctx.device().presented().len(), presented);

    ctx.set_viewport(0, 0, 8, 8);
    common::next_frame(&mut ctx);
    ctx.finish();
    assert_eq!(ctx.device().submissions().len(), submitted);
    assert!(ctx.queue_error());
}

#[test]
fn draws_require_a_linked_program() {
    let mut ctx = common::context();
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();
    assert!(ctx.device().submissions().last().unwrap().draws.is_empty());

    let program = common::simple_program(&mut ctx);
    ctx.bind_program(Some(program));
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();
    let draws = &ctx.device().submissions().last().unwrap().draws;
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].vertex_count, 3);
    assert!(!draws[0].indexed);
}
