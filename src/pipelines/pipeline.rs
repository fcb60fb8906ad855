use crate::entities::{COLOR_OFFSET, VERTEX_STRIDE};
use crate::error::{DemoError, Result};
use crate::pipelines::ShaderSet;

use std::rc::Rc;

use gfx_hal as hal;

use hal::{
    format,
    image, pass,
    pass::Subpass,
    prelude::*,
    pso,
    pso::{
        ShaderStageFlags, VertexInputRate, InputAssemblerDesc,
        Primitive, PrimitiveAssemblerDesc
    },
};

use std::{
    iter,
    mem::ManuallyDrop,
    ptr,
};

const ENTRY_NAME: &str = "main";

/// What a demo needs from its graphics pipeline.
pub struct PipelineDesc<'a> {
    pub shaders: &'a ShaderSet,
    /// Size of the vertex stage push constant block.
    pub push_constant_bytes: u32,
    pub cull_face: pso::Face,
}

pub struct Pipeline<B: hal::Backend> {
    device: Rc<B::Device>,
    render_pass: ManuallyDrop<B::RenderPass>,
    pipeline_layout: ManuallyDrop<B::PipelineLayout>,
    pipeline: ManuallyDrop<B::GraphicsPipeline>,
}


impl<B: hal::Backend> Pipeline<B> {
    pub fn new(
        device: Rc<B::Device>,
        format: hal::format::Format,
        set_layout: &B::DescriptorSetLayout,
        desc: &PipelineDesc,
    ) -> Result<Self> {
        let render_pass = create_render_pass::<B>(&device, format)?;
        let pipeline_layout = match create_pipeline_layout::<B>(&device, set_layout, desc.push_constant_bytes) {
            Ok(layout) => layout,
            Err(error) => {
                unsafe { (*device).destroy_render_pass(ManuallyDrop::into_inner(render_pass)) };
                return Err(error);
            }
        };
        let pipeline = match create_pipeline::<B>(&device, &*render_pass, &*pipeline_layout, desc) {
            Ok(pipeline) => pipeline,
            Err(error) => {
                unsafe {
                    (*device).destroy_pipeline_layout(ManuallyDrop::into_inner(pipeline_layout));
                    (*device).destroy_render_pass(ManuallyDrop::into_inner(render_pass));
                }
                return Err(error);
            }
        };

        Ok(Self {
            device,
            render_pass,
            pipeline_layout,
            pipeline,
        })
    }

    pub fn render_pass(&self) -> &B::RenderPass {
        &*self.render_pass
    }

    pub fn pipeline_layout(&self) -> &B::PipelineLayout {
        &*self.pipeline_layout
    }

    pub fn pipeline(&self) -> &B::GraphicsPipeline {
        &*self.pipeline
    }
}

impl<B> Drop for Pipeline<B> where B: hal::Backend {
    fn drop(&mut self) {
        if let Err(error) = (*self.device).wait_idle() {
            log::warn!("device not idle while dropping pipeline: {:?}", error);
        }

        unsafe {
            (*self.device)
                .destroy_pipeline_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline_layout,
                )));

            (*self.device)
                .destroy_render_pass(ManuallyDrop::into_inner(ptr::read(
                    &self.render_pass,
                )));

            (*self.device)
                .destroy_graphics_pipeline(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline,
                )));
        }

    }
}

fn create_render_pass<B: hal::Backend>(device: &Rc<B::Device>, format: hal::format::Format) -> Result<ManuallyDrop<B::RenderPass>> {
        let attachment = pass::Attachment {
            format: Some(format),
            samples: 1,
            ops: pass::AttachmentOps::new(
                pass::AttachmentLoadOp::Clear,
                pass::AttachmentStoreOp::Store,
            ),
            stencil_ops: pass::AttachmentOps::DONT_CARE,
            layouts: image::Layout::Undefined..image::Layout::Present,
        };

        let subpass = pass::SubpassDesc {
            colors: &[(0, image::Layout::ColorAttachmentOptimal)],
            depth_stencil: None,
            inputs: &[],
            resolves: &[],
            preserves: &[],
        };

        let render_pass = unsafe {
            (**device).create_render_pass(
                iter::once(attachment),
                iter::once(subpass),
                iter::empty(),
            )
        }
        .map_err(|e| DemoError::backend("create render pass", e))?;

        Ok(ManuallyDrop::new(render_pass))
}

fn create_pipeline_layout<B: hal::Backend>(
    device: &Rc<B::Device>,
    set_layout: &B::DescriptorSetLayout,
    push_constant_bytes: u32,
) -> Result<ManuallyDrop<B::PipelineLayout>> {
    let layout = unsafe {
        (**device).create_pipeline_layout(
            iter::once(set_layout),
            [(ShaderStageFlags::VERTEX, 0..push_constant_bytes)].into_iter()
        )
    }
    .map_err(|e| DemoError::backend("create pipeline layout", e))?;

    Ok(ManuallyDrop::new(layout))
}

fn create_shader_module<B: hal::Backend>(device: &Rc<B::Device>, stage: &'static str, spirv: &[u32]) -> Result<B::ShaderModule> {
    unsafe { (**device).create_shader_module(spirv) }.map_err(|e| DemoError::ShaderCompileFailed {
        stage,
        path: "<spir-v>".into(),
        log: format!("{:?}", e),
    })
}

fn create_pipeline<B: hal::Backend>(
        device: &Rc<B::Device>,
        render_pass: &B::RenderPass,
        pipeline_layout: &B::PipelineLayout,
        desc: &PipelineDesc,
    ) -> Result<ManuallyDrop<B::GraphicsPipeline>> {

    let vs_module = create_shader_module::<B>(device, "vertex", &desc.shaders.vertex)?;
    let fs_module = match create_shader_module::<B>(device, "fragment", &desc.shaders.fragment) {
        Ok(module) => module,
        Err(error) => {
            unsafe { (**device).destroy_shader_module(vs_module) };
            return Err(error);
        }
    };

    let (vs_entry, fs_entry) = (
        pso::EntryPoint {
            entry: ENTRY_NAME,
            module: &vs_module,
            specialization: pso::Specialization::default(),
        },
        pso::EntryPoint {
            entry: ENTRY_NAME,
            module: &fs_module,
            specialization: pso::Specialization::default(),
        },
    );

    // One interleaved buffer: vec3 position at location 0, vec4 color at
    // location 1, advancing per vertex.
    let primitive_assembler = {
        PrimitiveAssemblerDesc::Vertex {
            buffers: &[pso::VertexBufferDesc {
                binding: 0,
                stride: VERTEX_STRIDE,
                rate: VertexInputRate::Vertex,
            }],
            attributes: &[
                pso::AttributeDesc {
                    location: 0,
                    binding: 0,
                    element: pso::Element {
                        format: format::Format::Rgb32Sfloat,
                        offset: 0,
                    },
                },
                pso::AttributeDesc {
                    location: 1,
                    binding: 0,
                    element: pso::Element {
                        format: format::Format::Rgba32Sfloat,
                        offset: COLOR_OFFSET,
                    },
                },
            ],
            input_assembler: InputAssemblerDesc::new(Primitive::TriangleList),
            vertex: vs_entry,
            tessellation: None,
            geometry: None,
        }
    };

    let subpass = Subpass {
        index: 0,
        main_pass: render_pass,
    };

    let mut pipeline_desc = pso::GraphicsPipelineDesc::new(
        primitive_assembler,
        pso::Rasterizer {
            cull_face: desc.cull_face,
            front_face: pso::FrontFace::CounterClockwise,
            ..pso::Rasterizer::FILL
        },
        Some(fs_entry),
        pipeline_layout,
        subpass,
    );

    pipeline_desc.blender.targets.push(pso::ColorBlendDesc {
        mask: pso::ColorMask::ALL,
        blend: Some(pso::BlendState::ALPHA),
    });

    let pipeline = unsafe {
        (**device).create_graphics_pipeline(&pipeline_desc, None)
    };

    unsafe {
        (**device).destroy_shader_module(vs_module);
        (**device).destroy_shader_module(fs_module);
    }

    let pipeline = pipeline.map_err(|e| DemoError::ShaderLinkFailed(format!("{:?}", e)))?;
    Ok(ManuallyDrop::new(pipeline))
}
