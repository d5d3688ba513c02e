#![allow(dead_code)]

use opal_graphics::soft::ShaderStage;
use opal_graphics::{
    encode_shader_binary, Context, ContextDesc, DisplayDesc, ProgramHandle, RegionDesc,
};

/// A small context: 64x64 display, modest regions.
pub fn context() -> Context {
    let _ = env_logger::builder().is_test(true).try_init();
    Context::init(ContextDesc {
        display: DisplayDesc {
            width: 64,
            height: 64,
            depth_stencil: true,
        },
        regions: RegionDesc {
            code_size: 64 << 10,
            static_size: 1 << 20,
            client_slot_size: 512 << 10,
            uniform_size: 64 << 10,
            texture_size: 4 << 20,
            image_descriptors: 64,
            sampler_descriptors: 64,
        },
    })
    .unwrap()
}

/// One full frame turn through the boundary operations.
pub fn next_frame(ctx: &mut Context) {
    ctx.end_frame();
    ctx.present_frame();
    ctx.acquire_frame();
    ctx.wait_slot_fence();
    ctx.begin_frame();
}

/// Loads a vertex/fragment pair of dummy microcode and links them.
pub fn simple_program(ctx: &mut Context) -> ProgramHandle {
    let vs = ctx
        .load_shader_binary(&encode_shader_binary(ShaderStage::Vertex, &[0x10; 64]))
        .unwrap();
    let fs = ctx
        .load_shader_binary(&encode_shader_binary(ShaderStage::Fragment, &[0x20; 64]))
        .unwrap();
    ctx.link_program(vs, fs)
}
