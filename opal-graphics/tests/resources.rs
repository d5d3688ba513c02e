//! Buffers, renderbuffers, framebuffer completeness rules, readback bounds
//! and scissored clears.

mod common;

use opal_graphics::soft::Command;
use opal_graphics::{
    glenum, AttachmentPoint, AttribSource, ClearMask, IndexSource, TexTarget, VertexAttrib,
};

fn attrib_offsets(commands: &[Command]) -> Vec<usize> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::BindVertexAttribs(attribs) => attribs.first().map(|a| a.offset),
            _ => None,
        })
        .collect()
}

#[test]
fn buffer_data_reallocates_instead_of_overwriting() {
    let mut ctx = common::context();
    let buf = ctx.create_buffer();
    ctx.buffer_data(buf, &[1; 64], glenum::STATIC_DRAW);
    let attribs = [VertexAttrib {
        location: 0,
        size: 2,
        ty: glenum::FLOAT,
        normalized: false,
        stride: 0,
        source: AttribSource::Buffer {
            buffer: buf,
            offset: 0,
        },
    }];
    ctx.set_vertex_attribs(&attribs);
    // A frame in flight could still read the first allocation; the second
    // upload must land somewhere else.
    ctx.buffer_data(buf, &[2; 64], glenum::STATIC_DRAW);
    ctx.set_vertex_attribs(&attribs);
    ctx.flush();

    let offsets = attrib_offsets(&ctx.device().submissions().last().unwrap().commands);
    assert_eq!(offsets.len(), 2);
    assert_ne!(offsets[0], offsets[1]);
}

#[test]
fn client_arrays_are_staged_at_record_time() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.bind_program(Some(program));

    let mut vertices = [0u8; 24];
    vertices[0] = 0xCD;
    ctx.set_vertex_attribs(&[VertexAttrib {
        location: 0,
        size: 2,
        ty: glenum::FLOAT,
        normalized: false,
        stride: 0,
        source: AttribSource::Client(&vertices),
    }]);
    // Caller memory can be reused immediately; the copy already happened.
    vertices[0] = 0;
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let submission = ctx.device().submissions().last().unwrap();
    let offset = attrib_offsets(&submission.commands)[0];
    let block = ctx.device().block_data(ctx.data_block()).unwrap();
    assert_eq!(block[offset], 0xCD);
}

#[test]
fn index_draws_validate_the_buffer_range() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.bind_program(Some(program));

    let buf = ctx.create_buffer();
    ctx.buffer_data(buf, &[0; 8], glenum::STATIC_DRAW);
    // Eight bytes hold four u16 indices; asking for a hundred is dropped.
    ctx.draw_elements(
        glenum::TRIANGLES,
        100,
        glenum::UNSIGNED_SHORT,
        IndexSource::Buffer {
            buffer: buf,
            offset: 0,
        },
    );
    ctx.draw_elements(
        glenum::TRIANGLES,
        4,
        glenum::UNSIGNED_SHORT,
        IndexSource::Buffer {
            buffer: buf,
            offset: 0,
        },
    );
    ctx.flush();

    let draws = &ctx.device().submissions().last().unwrap().draws;
    assert_eq!(draws.len(), 1);
    assert!(draws[0].indexed);
    assert_eq!(draws[0].vertex_count, 4);
}

#[test]
fn renderbuffer_delete_breaks_completeness() {
    let mut ctx = common::context();
    let rb = ctx.create_renderbuffer();
    ctx.renderbuffer_storage(rb, glenum::RGB565, 8, 8);
    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_renderbuffer(AttachmentPoint::Color, rb);
    assert!(ctx.framebuffer_complete());

    ctx.clear(ClearMask::COLOR, [1.0, 0.0, 0.0, 1.0], 1.0, 0);
    let px = ctx.read_pixels(0, 0, 1, 1);
    assert_eq!(px, vec![255, 0, 0, 255]);

    // Renderbuffers own dedicated storage, so deletion really frees it and
    // the framebuffer stops resolving.
    ctx.delete_renderbuffer(rb);
    assert!(!ctx.framebuffer_complete());
    let before = ctx.device().submissions().len();
    ctx.clear(ClearMask::COLOR, [0.0, 1.0, 0.0, 1.0], 1.0, 0);
    ctx.flush();
    let submission = ctx.device().submissions().last().unwrap();
    assert!(ctx.device().submissions().len() > before);
    assert!(!submission
        .commands
        .iter()
        .any(|c| matches!(c, Command::ClearColor { .. })));
}

#[test]
fn attachment_formats_are_enforced() {
    let mut ctx = common::context();
    let color = ctx.create_texture();
    ctx.texture_image_2d(
        color,
        TexTarget::TwoD,
        0,
        8,
        8,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        None,
    );
    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, color, TexTarget::TwoD, 0);
    assert!(ctx.framebuffer_complete());

    // A color-format texture cannot serve as the depth attachment.
    ctx.framebuffer_texture(AttachmentPoint::Depth, color, TexTarget::TwoD, 0);
    assert!(!ctx.framebuffer_complete());

    let depth = ctx.create_renderbuffer();
    ctx.renderbuffer_storage(depth, glenum::DEPTH_COMPONENT16, 8, 8);
    ctx.framebuffer_renderbuffer(AttachmentPoint::Depth, depth);
    assert!(ctx.framebuffer_complete());
}

#[test]
fn stencil_rides_the_combined_image() {
    let mut ctx = common::context();
    let color = ctx.create_renderbuffer();
    ctx.renderbuffer_storage(color, glenum::RGBA8, 8, 8);
    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_renderbuffer(AttachmentPoint::Color, color);

    let combined = ctx.create_renderbuffer();
    ctx.renderbuffer_storage(combined, glenum::DEPTH24_STENCIL8, 8, 8);
    ctx.framebuffer_renderbuffer(AttachmentPoint::Depth, combined);
    ctx.framebuffer_renderbuffer(AttachmentPoint::Stencil, combined);
    assert!(ctx.framebuffer_complete());

    // A separate depth image cannot pair with the stencil attachment.
    let lone_depth = ctx.create_renderbuffer();
    ctx.renderbuffer_storage(lone_depth, glenum::DEPTH_COMPONENT16, 8, 8);
    ctx.framebuffer_renderbuffer(AttachmentPoint::Depth, lone_depth);
    assert!(!ctx.framebuffer_complete());
}

#[test]
fn malformed_shader_binaries_are_rejected() {
    let mut ctx = common::context();
    assert!(ctx.load_shader_binary(b"not a shader").is_none());
    let mut truncated = opal_graphics::encode_shader_binary(
        opal_graphics::soft::ShaderStage::Vertex,
        &[0; 64],
    );
    truncated.truncate(truncated.len() - 8);
    assert!(ctx.load_shader_binary(&truncated).is_none());
}

#[test]
fn read_pixels_rejects_out_of_bounds_regions() {
    let mut ctx = common::context();
    assert!(ctx.read_pixels(60, 60, 10, 10).is_empty());
    assert!(ctx.read_pixels(0, 0, 0, 4).is_empty());
    // Near-max coordinates must not wrap the bounds check.
    assert!(ctx.read_pixels(u32::MAX, 0, 2, 2).is_empty());
    assert!(ctx.read_pixels(0, u32::MAX - 1, 4, 4).is_empty());
}

#[test]
fn reused_handles_never_see_stale_state() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.bind_program(Some(program));

    let old = ctx.create_texture();
    ctx.texture_image_2d(
        old,
        TexTarget::TwoD,
        0,
        2,
        2,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        Some(&[9; 16]),
    );
    ctx.delete_texture(old);

    // A fresh texture starts undefined even if it lands in the freed slot,
    // and the stale handle no longer resolves anywhere.
    let fresh = ctx.create_texture();
    assert_ne!(old, fresh);
    ctx.bind_texture(0, Some(fresh));
    ctx.bind_texture(1, Some(old));
    ctx.texture_sub_image_2d(
        old,
        TexTarget::TwoD,
        0,
        0,
        0,
        1,
        1,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        &[1; 4],
    );
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let draws = &ctx.device().submissions().last().unwrap().draws;
    assert_eq!(draws.len(), 1);
    assert!(draws[0].textures.is_empty());
}

#[test]
fn scissored_clears_clip_to_the_rect() {
    let mut ctx = common::context();
    ctx.set_scissor(true, 0, 0, 2, 2);
    ctx.clear(ClearMask::COLOR, [1.0, 0.0, 0.0, 1.0], 1.0, 0);
    ctx.set_scissor(false, 0, 0, 0, 0);

    let px = ctx.read_pixels(0, 0, 4, 4);
    let texel = |x: usize, y: usize| &px[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
    // Scissor origin is the bottom-left corner, matching readback.
    assert_eq!(texel(0, 0), &[255, 0, 0, 255]);
    assert_eq!(texel(1, 1), &[255, 0, 0, 255]);
    assert_eq!(texel(2, 0), &[0, 0, 0, 0]);
    assert_eq!(texel(0, 2), &[0, 0, 0, 0]);
}

#[test]
fn color_mask_limits_clears() {
    let mut ctx = common::context();
    ctx.clear(ClearMask::COLOR, [1.0, 1.0, 1.0, 1.0], 1.0, 0);
    ctx.set_color_mask(opal_graphics::ColorMask {
        red: false,
        green: true,
        blue: false,
        alpha: true,
    });
    ctx.clear(ClearMask::COLOR, [0.0, 0.0, 0.0, 0.0], 1.0, 0);
    let px = ctx.read_pixels(0, 0, 1, 1);
    assert_eq!(px, vec![255, 0, 255, 0]);
}
