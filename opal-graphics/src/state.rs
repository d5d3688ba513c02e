//! Fixed-function state tracking.
//!
//! Setters update the cached GL-form state and immediately record the
//! decoded device state into the current command buffer. The cache exists so
//! the whole set can be replayed when a command buffer is reopened after a
//! flush or slot rotation.

use crate::soft::{self, Command};
use crate::{convert, BlendState, ColorMask, Context, DepthState, Rect, StencilState, Viewport};

/// Scissor rect recorded when the scissor test is disabled; large enough to
/// never clip any attachable surface.
const UNCLIPPED: u32 = 0x4000;

pub(crate) struct StateCache {
    pub viewport: Viewport,
    pub scissor_enabled: bool,
    pub scissor: Rect,
    pub blend: BlendState,
    pub blend_color: [f32; 4],
    pub depth: DepthState,
    pub stencil: StencilState,
    pub cull_enabled: bool,
    pub cull_face: u32,
    pub front_face: u32,
    pub color_mask: ColorMask,
    pub depth_bias: (f32, f32),
    pub line_width: f32,
}

impl StateCache {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport {
                x: 0,
                y: 0,
                width,
                height,
            },
            scissor_enabled: false,
            scissor: Rect {
                x: 0,
                y: 0,
                width,
                height,
            },
            blend: BlendState::default(),
            blend_color: [0.0; 4],
            depth: DepthState::default(),
            stencil: StencilState::default(),
            cull_enabled: false,
            cull_face: crate::glenum::BACK,
            front_face: crate::glenum::CCW,
            color_mask: ColorMask::default(),
            depth_bias: (0.0, 0.0),
            line_width: 1.0,
        }
    }

    pub fn color_state(&self) -> soft::ColorState {
        let mut write_mask = soft::ColorWrites::empty();
        write_mask.set(soft::ColorWrites::RED, self.color_mask.red);
        write_mask.set(soft::ColorWrites::GREEN, self.color_mask.green);
        write_mask.set(soft::ColorWrites::BLUE, self.color_mask.blue);
        write_mask.set(soft::ColorWrites::ALPHA, self.color_mask.alpha);
        soft::ColorState {
            blend_enabled: self.blend.enabled,
            color: soft::BlendComponent {
                src: convert::map_blend_factor(self.blend.src_rgb),
                dst: convert::map_blend_factor(self.blend.dst_rgb),
                op: convert::map_blend_equation(self.blend.equation_rgb),
            },
            alpha: soft::BlendComponent {
                src: convert::map_blend_factor(self.blend.src_alpha),
                dst: convert::map_blend_factor(self.blend.dst_alpha),
                op: convert::map_blend_equation(self.blend.equation_alpha),
            },
            write_mask,
        }
    }

    /// Depth and stencil are one bind on the device; any partial update
    /// recomposes the full state from the cache.
    pub fn depth_stencil_state(&self) -> soft::DepthStencilState {
        let face = |f: &crate::StencilFaceState| soft::StencilFace {
            compare: convert::map_compare_func(f.func),
            reference: f.reference as u32,
            compare_mask: f.compare_mask,
            write_mask: f.write_mask,
            fail_op: convert::map_stencil_op(f.fail_op),
            depth_fail_op: convert::map_stencil_op(f.depth_fail_op),
            pass_op: convert::map_stencil_op(f.pass_op),
        };
        soft::DepthStencilState {
            depth_test: self.depth.test_enabled,
            depth_write: self.depth.write_enabled,
            depth_compare: convert::map_compare_func(self.depth.func),
            stencil_test: self.stencil.test_enabled,
            front: face(&self.stencil.front),
            back: face(&self.stencil.back),
        }
    }

    pub fn raster_state(&self) -> soft::RasterState {
        soft::RasterState {
            cull: convert::map_cull(self.cull_enabled, self.cull_face),
            front_face: convert::map_front_face(self.front_face),
            depth_bias_constant: self.depth_bias.0,
            depth_bias_slope: self.depth_bias.1,
            line_width: self.line_width,
        }
    }

    pub fn scissor_command(&self) -> Command {
        if self.scissor_enabled {
            Command::SetScissor {
                x: self.scissor.x,
                y: self.scissor.y,
                width: self.scissor.width,
                height: self.scissor.height,
            }
        } else {
            Command::SetScissor {
                x: 0,
                y: 0,
                width: UNCLIPPED,
                height: UNCLIPPED,
            }
        }
    }

    pub fn viewport_command(&self) -> Command {
        Command::SetViewport {
            x: self.viewport.x,
            y: self.viewport.y,
            width: self.viewport.width,
            height: self.viewport.height,
        }
    }
}

impl Context {
    /// Replays every cached state into the current command buffer. Used when
    /// a command buffer is (re)opened.
    pub(crate) fn apply_all_state(&mut self) {
        let commands = [
            self.state.viewport_command(),
            self.state.scissor_command(),
            Command::BindColorState(self.state.color_state()),
            Command::BindDepthStencilState(self.state.depth_stencil_state()),
            Command::BindRasterState(self.state.raster_state()),
            Command::SetBlendColor(self.state.blend_color),
        ];
        for command in commands {
            self.record(command);
        }
    }
}

#[hidden_trait::expose]
impl crate::traits::StateDevice for Context {
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.state.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
        let command = self.state.viewport_command();
        self.record(command);
    }

    fn set_scissor(&mut self, enabled: bool, x: i32, y: i32, width: u32, height: u32) {
        self.state.scissor_enabled = enabled;
        self.state.scissor = Rect {
            x,
            y,
            width,
            height,
        };
        let command = self.state.scissor_command();
        self.record(command);
    }

    fn set_blend(&mut self, blend: BlendState) {
        self.state.blend = blend;
        let state = self.state.color_state();
        self.record(Command::BindColorState(state));
    }

    fn set_blend_color(&mut self, color: [f32; 4]) {
        self.state.blend_color = color;
        self.record(Command::SetBlendColor(color));
    }

    fn set_depth(&mut self, depth: DepthState) {
        self.state.depth = depth;
        let state = self.state.depth_stencil_state();
        self.record(Command::BindDepthStencilState(state));
    }

    fn set_stencil(&mut self, stencil: StencilState) {
        self.state.stencil = stencil;
        let state = self.state.depth_stencil_state();
        self.record(Command::BindDepthStencilState(state));
    }

    fn set_cull(&mut self, enabled: bool, face: u32) {
        self.state.cull_enabled = enabled;
        self.state.cull_face = face;
        let state = self.state.raster_state();
        self.record(Command::BindRasterState(state));
    }

    fn set_front_face(&mut self, winding: u32) {
        self.state.front_face = winding;
        let state = self.state.raster_state();
        self.record(Command::BindRasterState(state));
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        self.state.color_mask = mask;
        let state = self.state.color_state();
        self.record(Command::BindColorState(state));
    }

    fn set_depth_bias(&mut self, constant: f32, slope: f32) {
        self.state.depth_bias = (constant, slope);
        let state = self.state.raster_state();
        self.record(Command::BindRasterState(state));
    }

    fn set_line_width(&mut self, width: f32) {
        self.state.line_width = width;
        let state = self.state.raster_state();
        self.record(Command::BindRasterState(state));
    }
}
