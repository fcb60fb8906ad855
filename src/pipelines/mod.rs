mod pipeline;
pub use pipeline::{Pipeline, PipelineDesc};

pub mod shaders;
pub use shaders::ShaderSet;
