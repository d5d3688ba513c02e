//! Texture uploads, format handling, cube completeness, mip generation and
//! the framebuffer copy round trip.

mod common;

use opal_graphics::soft::{CacheFlags, Swizzle};
use opal_graphics::{glenum, AttachmentPoint, ClearMask, TexTarget};

#[test]
fn rgb_upload_expands_with_opaque_alpha() {
    let mut ctx = common::context();
    let tex = ctx.create_texture();
    #[rustfmt::skip]
    let data = [
        255, 0, 0,   0, 255, 0,
        0, 0, 255,   255, 255, 255,
    ];
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        2,
        2,
        glenum::RGB,
        glenum::UNSIGNED_BYTE,
        Some(&data),
    );

    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, tex, TexTarget::TwoD, 0);
    assert!(ctx.framebuffer_complete());

    let px = ctx.read_pixels(0, 0, 2, 2);
    // Uploads start at the bottom row and readback returns bottom row first,
    // so the round trip preserves row order.
    assert_eq!(&px[0..8], &[255, 0, 0, 255, 0, 255, 0, 255]);
    assert_eq!(&px[8..16], &[0, 0, 255, 255, 255, 255, 255, 255]);
}

#[test]
fn upload_then_read_back_is_identity() {
    let mut ctx = common::context();
    let tex = ctx.create_texture();
    #[rustfmt::skip]
    let data = [
        255, 0, 0, 255,
        0, 255, 0, 255,
    ];
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        1,
        2,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        Some(&data),
    );

    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, tex, TexTarget::TwoD, 0);
    assert_eq!(ctx.read_pixels(0, 0, 1, 2), data);
}

#[test]
fn luminance_samples_through_a_swizzle() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.bind_program(Some(program));

    let tex = ctx.create_texture();
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        1,
        1,
        glenum::LUMINANCE,
        glenum::UNSIGNED_BYTE,
        Some(&[128]),
    );
    ctx.bind_texture(0, Some(tex));
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let draws = &ctx.device().submissions().last().unwrap().draws;
    assert_eq!(draws[0].textures.len(), 1);
    let trace = &draws[0].textures[0];
    assert_eq!(trace.unit, 0);
    assert_eq!(
        trace.swizzle,
        [Swizzle::R, Swizzle::R, Swizzle::R, Swizzle::One]
    );
}

#[test]
fn incomplete_cube_binds_are_dropped() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.bind_program(Some(program));

    let tex = ctx.create_texture();
    let face = [0u8; 4 * 4 * 4];
    for i in 0..5 {
        ctx.texture_image_2d(
            tex,
            TexTarget::CubeFace(i),
            0,
            4,
            4,
            glenum::RGBA,
            glenum::UNSIGNED_BYTE,
            Some(&face),
        );
    }
    ctx.bind_texture(0, Some(tex));
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();
    assert!(ctx.device().submissions().last().unwrap().draws[0]
        .textures
        .is_empty());

    // The sixth face completes the cube.
    ctx.texture_image_2d(
        tex,
        TexTarget::CubeFace(5),
        0,
        4,
        4,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        Some(&face),
    );
    ctx.bind_texture(0, Some(tex));
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();
    assert_eq!(
        ctx.device().submissions().last().unwrap().draws[0]
            .textures
            .len(),
        1
    );
}

#[test]
fn compressed_uploads_validate_their_size() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.bind_program(Some(program));

    let tex = ctx.create_texture();
    // One ETC2 RGB block is 8 bytes; a short upload is dropped entirely.
    ctx.compressed_texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        glenum::COMPRESSED_RGB8_ETC2,
        4,
        4,
        &[0; 7],
    );
    ctx.bind_texture(0, Some(tex));
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();
    assert!(ctx.device().submissions().last().unwrap().draws[0]
        .textures
        .is_empty());

    ctx.compressed_texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        glenum::COMPRESSED_RGB8_ETC2,
        4,
        4,
        &[0xAB; 8],
    );
    ctx.bind_texture(0, Some(tex));
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();
    let trace = &ctx.device().submissions().last().unwrap().draws[0].textures;
    assert_eq!(trace.len(), 1);
    assert_eq!(trace[0].swizzle, Swizzle::IDENTITY);
}

#[test]
fn generate_mipmaps_fills_the_chain() {
    let mut ctx = common::context();
    let tex = ctx.create_texture();
    let texel = [10u8, 20, 30, 255];
    let data: Vec<u8> = texel.iter().copied().cycle().take(4 * 4 * 4).collect();
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        4,
        4,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        Some(&data),
    );
    ctx.generate_mipmaps(tex);

    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, tex, TexTarget::TwoD, 1);
    assert!(ctx.framebuffer_complete());
    let px = ctx.read_pixels(0, 0, 2, 2);
    // A constant image downsamples to itself.
    for chunk in px.chunks_exact(4) {
        assert_eq!(chunk, texel);
    }
}

#[test]
fn generate_mipmaps_is_idempotent() {
    let mut ctx = common::context();
    let tex = ctx.create_texture();
    let data: Vec<u8> = (0..4 * 4 * 4).map(|i| (i * 7 % 251) as u8).collect();
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        4,
        4,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        Some(&data),
    );

    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, tex, TexTarget::TwoD, 1);

    // Regenerating from an unchanged base reproduces the chain exactly.
    ctx.generate_mipmaps(tex);
    let first = ctx.read_pixels(0, 0, 2, 2);
    ctx.generate_mipmaps(tex);
    let second = ctx.read_pixels(0, 0, 2, 2);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn render_target_switch_barriers_before_sampling() {
    let mut ctx = common::context();
    let program = common::simple_program(&mut ctx);
    ctx.bind_program(Some(program));

    let tex = ctx.create_texture();
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        2,
        2,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        Some(&[0; 16]),
    );
    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, tex, TexTarget::TwoD, 0);
    ctx.clear(ClearMask::COLOR, [0.0, 1.0, 0.0, 1.0], 1.0, 0);

    // Back to the display, then sample what was just rendered.
    ctx.bind_framebuffer(None);
    ctx.bind_texture(0, Some(tex));
    ctx.draw_arrays(glenum::TRIANGLES, 0, 3);
    ctx.flush();

    let submission = ctx.device().submissions().last().unwrap();
    assert_eq!(submission.draws.len(), 1);
    assert_eq!(submission.draws[0].textures.len(), 1);
    // Both the retarget and the first bind after it raise barriers.
    assert!(submission.barrier_count >= 2);
    assert!(submission
        .barrier_flags
        .contains(CacheFlags::IMAGE | CacheFlags::DESCRIPTOR));

    // The clear landed in the texture despite the retarget.
    ctx.bind_framebuffer(Some(fb));
    let px = ctx.read_pixels(0, 0, 2, 2);
    for chunk in px.chunks_exact(4) {
        assert_eq!(chunk, &[0, 255, 0, 255]);
    }
}

#[test]
fn sub_image_replaces_only_its_region() {
    let mut ctx = common::context();
    let tex = ctx.create_texture();
    let data = [64u8; 2 * 2 * 4];
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        2,
        2,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        Some(&data),
    );
    ctx.texture_sub_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        1,
        1,
        1,
        1,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        &[255, 0, 0, 255],
    );

    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, tex, TexTarget::TwoD, 0);
    let px = ctx.read_pixels(0, 0, 2, 2);
    // The region origin counts from the bottom-left, like the readback.
    assert_eq!(&px[0..4], &[64, 64, 64, 64]);
    assert_eq!(&px[4..8], &[64, 64, 64, 64]);
    assert_eq!(&px[8..12], &[64, 64, 64, 64]);
    assert_eq!(&px[12..16], &[255, 0, 0, 255]);
}

#[test]
fn oversized_sub_image_coordinates_are_dropped() {
    let mut ctx = common::context();
    let tex = ctx.create_texture();
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        2,
        2,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        Some(&[7; 16]),
    );
    // Near-max offsets must not wrap the bounds check.
    ctx.texture_sub_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        u32::MAX,
        0,
        2,
        1,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        &[1; 8],
    );

    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, tex, TexTarget::TwoD, 0);
    let px = ctx.read_pixels(0, 0, 2, 2);
    assert!(px.iter().all(|&b| b == 7));
}

#[test]
fn mismatched_sub_image_format_is_dropped() {
    let mut ctx = common::context();
    let tex = ctx.create_texture();
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        2,
        2,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        Some(&[7; 16]),
    );
    ctx.texture_sub_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        0,
        0,
        2,
        1,
        glenum::RGB,
        glenum::UNSIGNED_BYTE,
        &[1; 6],
    );

    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, tex, TexTarget::TwoD, 0);
    let px = ctx.read_pixels(0, 0, 2, 2);
    assert!(px.iter().all(|&b| b == 7));
}

#[test]
fn framebuffer_copy_round_trips_through_the_cpu() {
    let mut ctx = common::context();
    ctx.clear(ClearMask::COLOR, [1.0, 0.5, 0.0, 1.0], 1.0, 0);

    let tex = ctx.create_texture();
    ctx.texture_image_2d(
        tex,
        TexTarget::TwoD,
        0,
        64,
        64,
        glenum::RGBA,
        glenum::UNSIGNED_BYTE,
        None,
    );
    ctx.copy_framebuffer_to_texture(tex, TexTarget::TwoD, 0, 0, 0, 64, 64);

    let fb = ctx.create_framebuffer();
    ctx.bind_framebuffer(Some(fb));
    ctx.framebuffer_texture(AttachmentPoint::Color, tex, TexTarget::TwoD, 0);
    let px = ctx.read_pixels(0, 0, 2, 2);
    for chunk in px.chunks_exact(4) {
        assert_eq!(chunk, &[255, 128, 0, 255]);
    }
}
