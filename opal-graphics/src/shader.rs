//! Precompiled shader binaries, program linking and uniform capture.
//!
//! Shaders arrive as opaque microcode wrapped in a small container. Loading
//! one places the code in the append-only code region; the resulting shader
//! is a plain value, so linking a program copies it and the program keeps
//! working after the shader object is deleted.

use crate::soft::{self, Command, ShaderStage};
use crate::{Context, ProgramHandle, ShaderHandle, MAX_UNIFORM_BINDINGS};

const SHADER_MAGIC: [u8; 4] = *b"OPSH";
const SHADER_HEADER_SIZE: usize = 16;

/// Wraps raw microcode in the container understood by
/// [`load_shader_binary`](crate::traits::ShaderDevice::load_shader_binary).
pub fn encode_shader_binary(stage: ShaderStage, code: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SHADER_HEADER_SIZE + code.len());
    out.extend_from_slice(&SHADER_MAGIC);
    out.extend_from_slice(&(stage.index() as u32).to_le_bytes());
    out.extend_from_slice(&(code.len() as u32).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(code);
    out
}

pub(crate) struct ShaderEntry {
    pub shader: soft::Shader,
}

#[derive(Clone, Copy)]
pub(crate) struct UniformBinding {
    pub size: usize,
    /// Current capture offset in the data block; `None` until first written.
    pub offset: Option<usize>,
}

pub(crate) struct ProgramEntry {
    pub linked: bool,
    pub vertex: Option<soft::Shader>,
    pub fragment: Option<soft::Shader>,
    pub uniforms: [[Option<UniformBinding>; MAX_UNIFORM_BINDINGS]; ShaderStage::COUNT],
}

fn parse_shader_binary(data: &[u8]) -> Option<(ShaderStage, &[u8])> {
    if data.len() < SHADER_HEADER_SIZE || data[..4] != SHADER_MAGIC {
        return None;
    }
    let stage = match u32::from_le_bytes(data[4..8].try_into().ok()?) {
        0 => ShaderStage::Vertex,
        1 => ShaderStage::Fragment,
        _ => return None,
    };
    let code_size = u32::from_le_bytes(data[8..12].try_into().ok()?) as usize;
    if SHADER_HEADER_SIZE + code_size != data.len() {
        return None;
    }
    Some((stage, &data[SHADER_HEADER_SIZE..]))
}

#[hidden_trait::expose]
impl crate::traits::ShaderDevice for Context {
    fn load_shader_binary(&mut self, data: &[u8]) -> Option<ShaderHandle> {
        let (stage, code) = match parse_shader_binary(data) {
            Some(parsed) => parsed,
            None => {
                log::warn!("malformed shader binary ({} bytes)", data.len());
                return None;
            }
        };
        let offset = self.code_arena.allocate(code.len())?;
        if let Some(block) = self.device.block_data_mut(self.code_block) {
            block[offset..offset + code.len()].copy_from_slice(code);
        }
        let shader = self
            .device
            .init_shader(stage, self.code_block, offset, code.len())?;
        Some(self.shaders.insert(ShaderEntry { shader }))
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        // The microcode stays resident; only the handle dies. Programs hold
        // shader values, not handles.
        self.shaders.remove(shader);
    }

    fn link_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> ProgramHandle {
        let vs = self.shaders.get(vertex).map(|e| e.shader);
        let fs = self.shaders.get(fragment).map(|e| e.shader);
        let linked = matches!(vs, Some(s) if s.stage == ShaderStage::Vertex)
            && matches!(fs, Some(s) if s.stage == ShaderStage::Fragment);
        if !linked {
            log::warn!("program link failed: stage mismatch or dead shader handle");
        }
        self.programs.insert(ProgramEntry {
            linked,
            vertex: vs.filter(|s| s.stage == ShaderStage::Vertex),
            fragment: fs.filter(|s| s.stage == ShaderStage::Fragment),
            uniforms: Default::default(),
        })
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(program);
    }

    fn bind_program(&mut self, program: Option<ProgramHandle>) {
        match program {
            Some(handle) => {
                if !self.programs.get(handle).is_some_and(|p| p.linked) {
                    log::debug!("bind_program on an unlinked or dead program");
                    return;
                }
                self.bound_program = Some(handle);
            }
            None => self.bound_program = None,
        }
        self.emit_program_bind();
    }

    fn uniform_allocate(&mut self, program: ProgramHandle, stage: ShaderStage, slot: u32, size: usize) {
        if slot as usize >= MAX_UNIFORM_BINDINGS || size == 0 {
            log::debug!("uniform_allocate: invalid slot {} or size {}", slot, size);
            return;
        }
        if let Some(entry) = self.programs.get_mut(program) {
            entry.uniforms[stage.index()][slot as usize] = Some(UniformBinding { size, offset: None });
        }
    }

    fn uniform_write(
        &mut self,
        program: ProgramHandle,
        stage: ShaderStage,
        slot: u32,
        offset: usize,
        data: &[u8],
    ) {
        if slot as usize >= MAX_UNIFORM_BINDINGS {
            return;
        }
        let Some(binding) = self
            .programs
            .get(program)
            .and_then(|p| p.uniforms[stage.index()][slot as usize])
        else {
            log::debug!("uniform_write to an undeclared binding");
            return;
        };
        if offset + data.len() > binding.size {
            log::debug!(
                "uniform_write out of bounds: {}+{} > {}",
                offset,
                data.len(),
                binding.size
            );
            return;
        }
        // Capture at a fresh offset so draws already recorded keep the bytes
        // they saw. Unwritten parts of a partially updated block carry
        // forward.
        let Some(at) = self.uniform_arena.allocate(binding.size) else {
            return;
        };
        if let Some(block) = self.device.block_data_mut(self.data_block) {
            match binding.offset {
                Some(old) => block.copy_within(old..old + binding.size, at),
                None => block[at..at + binding.size].fill(0),
            }
            block[at + offset..at + offset + data.len()].copy_from_slice(data);
        }
        if let Some(entry) = self.programs.get_mut(program) {
            if let Some(binding) = entry.uniforms[stage.index()][slot as usize].as_mut() {
                binding.offset = Some(at);
            }
        }
        if self.bound_program == Some(program) {
            self.emit_uniform_push(stage, slot, at, binding.size);
        }
    }
}

impl Context {
    /// Records the shader bind for the current program together with every
    /// written uniform binding. Uniform bytes are embedded in the command
    /// stream, so this is the capture point.
    pub(crate) fn emit_program_bind(&mut self) {
        let Some(entry) = self.bound_program.and_then(|h| self.programs.get(h)) else {
            self.record(Command::BindShaders {
                vertex: None,
                fragment: None,
            });
            return;
        };
        let vertex = entry.vertex;
        let fragment = entry.fragment;
        let uniforms = entry.uniforms;
        self.record(Command::BindShaders { vertex, fragment });
        for (stage_index, bindings) in uniforms.iter().enumerate() {
            let stage = if stage_index == 0 {
                ShaderStage::Vertex
            } else {
                ShaderStage::Fragment
            };
            for (slot, binding) in bindings.iter().enumerate() {
                if let Some(UniformBinding {
                    size,
                    offset: Some(at),
                }) = *binding
                {
                    self.emit_uniform_push(stage, slot as u32, at, size);
                }
            }
        }
    }

    fn emit_uniform_push(&mut self, stage: ShaderStage, slot: u32, at: usize, size: usize) {
        let bytes = match self.device.block_data(self.data_block) {
            Some(block) => block[at..at + size].to_vec(),
            None => return,
        };
        let buf = self.cur_cmdbuf();
        let range = self.device.push_data(buf, &bytes);
        self.record(Command::PushUniforms {
            stage,
            slot,
            data: range,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_round_trip() {
        let binary = encode_shader_binary(ShaderStage::Fragment, &[1, 2, 3, 4]);
        let (stage, code) = parse_shader_binary(&binary).unwrap();
        assert_eq!(stage, ShaderStage::Fragment);
        assert_eq!(code, &[1, 2, 3, 4]);
    }

    #[test]
    fn truncated_container_is_rejected() {
        let mut binary = encode_shader_binary(ShaderStage::Vertex, &[0; 32]);
        binary.truncate(binary.len() - 1);
        assert!(parse_shader_binary(&binary).is_none());
        assert!(parse_shader_binary(b"OPS").is_none());
    }
}
