use std::fs;
use std::path::{Path, PathBuf};

use gfx_auxil as auxil;
use glsl_to_spirv::ShaderType;

use crate::error::{DemoError, Result};

/// SPIR-V words for one vertex and one fragment stage.
#[derive(Debug, Clone)]
pub struct ShaderSet {
    pub vertex: Vec<u32>,
    pub fragment: Vec<u32>,
}

impl ShaderSet {
    /// Reads and compiles the two GLSL stages.
    pub fn load(vertex_path: &Path, fragment_path: &Path) -> Result<Self> {
        let vertex = compile(&load_shader_source(vertex_path)?, Stage::Vertex, vertex_path)?;
        let fragment = compile(
            &load_shader_source(fragment_path)?,
            Stage::Fragment,
            fragment_path,
        )?;

        log::info!(
            "compiled {} ({} words) and {} ({} words)",
            vertex_path.display(),
            vertex.len(),
            fragment_path.display(),
            fragment.len()
        );

        Ok(Self { vertex, fragment })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        }
    }

    fn shader_type(self) -> ShaderType {
        match self {
            Stage::Vertex => ShaderType::Vertex,
            Stage::Fragment => ShaderType::Fragment,
        }
    }
}

pub fn load_shader_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| DemoError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })
}

/// Compiles GLSL to SPIR-V. `path` only labels the error.
pub fn compile(source: &str, stage: Stage, path: &Path) -> Result<Vec<u32>> {
    let failed = |log: String| DemoError::ShaderCompileFailed {
        stage: stage.name(),
        path: PathBuf::from(path),
        log,
    };

    let spirv = glsl_to_spirv::compile(source, stage.shader_type()).map_err(failed)?;
    auxil::read_spirv(spirv).map_err(|error| failed(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    fn shipped(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("assets")
            .join("shaders")
            .join(name)
    }

    #[test]
    fn missing_source_is_file_not_found() {
        let path = Path::new("does/not/exist.vert");
        match load_shader_source(path) {
            Err(DemoError::FileNotFound { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn broken_glsl_reports_the_stage() {
        let source = "#version 450\nvoid main() { gl_Position = nope; }\n";
        match compile(source, Stage::Vertex, Path::new("broken.vert")) {
            Err(DemoError::ShaderCompileFailed { stage, path, .. }) => {
                assert_eq!(stage, "vertex");
                assert_eq!(path, PathBuf::from("broken.vert"));
            }
            other => panic!("expected ShaderCompileFailed, got {:?}", other),
        }
    }

    #[test]
    fn shipped_shaders_compile() {
        for (vert, frag) in [("cube.vert", "cube.frag"), ("triangle.vert", "triangle.frag")] {
            let set = ShaderSet::load(&shipped(vert), &shipped(frag)).unwrap();
            assert_eq!(set.vertex[0], SPIRV_MAGIC);
            assert_eq!(set.fragment[0], SPIRV_MAGIC);
        }
    }
}
