use crate::entities::FLOATS_PER_VERTEX;
use crate::error::{DemoError, Result};
use crate::guard::{DeviceGuard, Guard};
use crate::pipelines::{Pipeline, PipelineDesc, ShaderSet};
use crate::texture::Texture;

use std::rc::Rc;
use gfx_hal as hal;

use hal::{
    buffer, command, format,
    format::ChannelType,
    image, memory,
    pool,
    prelude::*,
    pso,
    pso::ShaderStageFlags,
    queue::QueueGroup,
    window,
};

use std::{
    borrow::Borrow,
    iter,
    mem::{self, ManuallyDrop},
    ptr,
};

/// Everything a demo hands the renderer once, at start-up.
pub struct Scene<'a> {
    /// Flattened vertices, position then color.
    pub vertices: &'a [f32],
    /// Drawn indexed when present, as a plain triangle list otherwise.
    pub indices: Option<&'a [u16]>,
    pub shaders: &'a ShaderSet,
    pub push_constant_bytes: u32,
    pub texture: Option<&'a ::image::RgbaImage>,
    pub cull_face: pso::Face,
}

struct IndexBuffer<B: hal::Backend> {
    buffer: ManuallyDrop<B::Buffer>,
    memory: ManuallyDrop<B::Memory>,
    count: u32,
}

pub struct Renderer<B: hal::Backend> {
    desc_pool: ManuallyDrop<B::DescriptorPool>,
    surface: ManuallyDrop<B::Surface>,
    format: hal::format::Format,
    dimensions: window::Extent2D,
    viewport: pso::Viewport,
    framebuffer: ManuallyDrop<B::Framebuffer>,
    pipeline: Pipeline<B>,
    desc_set: Option<B::DescriptorSet>,
    set_layout: ManuallyDrop<B::DescriptorSetLayout>,
    submission_complete_semaphores: Vec<B::Semaphore>,
    submission_complete_fences: Vec<B::Fence>,
    cmd_pools: Vec<B::CommandPool>,
    cmd_buffers: Vec<B::CommandBuffer>,
    texture: Option<Texture<B>>,
    vertex_buffer: ManuallyDrop<B::Buffer>,
    vertex_buffer_memory: ManuallyDrop<B::Memory>,
    vertex_count: u32,
    index_buffer: Option<IndexBuffer<B>>,
    frames_in_flight: usize,
    frame: u64,
    // These members are dropped in the declaration order.
    device: Rc<B::Device>,
    adapter: hal::adapter::Adapter<B>,
    queue_group: QueueGroup<B>,
    instance: Rc<B::Instance>,
}

impl<B> Renderer<B>
where
    B: hal::Backend,
{
    pub fn new(
        instance: B::Instance,
        surface: B::Surface,
        adapter: hal::adapter::Adapter<B>,
        dimensions: window::Extent2D,
        scene: &Scene,
    ) -> Result<Renderer<B>> {
        // Everything below sits in a guard until the renderer is assembled,
        // so an early return destroys what was already created.
        let instance = Rc::new(instance);
        let mut surface = Guard::new(&instance, surface, |instance, surface| unsafe {
            instance.destroy_surface(surface)
        });

        let memory_types = adapter.physical_device.memory_properties().memory_types;
        let limits = adapter.physical_device.properties().limits;

        // Build a new device and associated command queues
        let family = adapter
            .queue_families
            .iter().find(|family| {
                surface.supports_queue_family(family) && family.queue_type().supports_graphics()
            })
            .ok_or_else(|| DemoError::backend("find a queue family", "no family supports presentation and graphics"))?;

        let physical_device = &adapter.physical_device;

        let mut gpu = unsafe {
            physical_device
                .open(
                    &[(family, &[1.0])],
                    hal::Features::empty()
                )
        }
        .map_err(|e| DemoError::backend("open the device", e))?;

        let mut queue_group = gpu
            .queue_groups
            .pop()
            .ok_or_else(|| DemoError::backend("open a queue", "device returned no queue group"))?;

        // Logical device
        let device = Rc::new(gpu.device);

        let mut command_pool = create_command_pool::<B>(&device, &queue_group)?;

        // Binding 0 is the texture image, binding 1 its sampler. Scenes
        // without a texture get an empty layout.
        let bindings = if scene.texture.is_some() {
            vec![
                pso::DescriptorSetLayoutBinding {
                    binding: 0,
                    ty: pso::DescriptorType::Image {
                        ty: pso::ImageDescriptorType::Sampled {
                            with_sampler: false,
                        },
                    },
                    count: 1,
                    stage_flags: ShaderStageFlags::FRAGMENT,
                    immutable_samplers: false,
                },
                pso::DescriptorSetLayoutBinding {
                    binding: 1,
                    ty: pso::DescriptorType::Sampler,
                    count: 1,
                    stage_flags: ShaderStageFlags::FRAGMENT,
                    immutable_samplers: false,
                },
            ]
        } else {
            vec![]
        };

        let set_layout = Guard::new(
            &device,
            unsafe {
                (*device).create_descriptor_set_layout(
                    bindings.into_iter(),
                    iter::empty(),
                )
            }
            .map_err(|e| DemoError::backend("create descriptor set layout", e))?,
            |device, layout| unsafe { device.destroy_descriptor_set_layout(layout) },
        );

        // Descriptors
        let mut desc_pool = Guard::new(
            &device,
            unsafe {
                (*device).create_descriptor_pool(
                    1, // sets
                    vec![
                        pso::DescriptorRangeDesc {
                            ty: pso::DescriptorType::Image {
                                ty: pso::ImageDescriptorType::Sampled {
                                    with_sampler: false,
                                },
                            },
                            count: 1,
                        },
                        pso::DescriptorRangeDesc {
                            ty: pso::DescriptorType::Sampler,
                            count: 1,
                        },
                    ]
                    .into_iter(),
                    pso::DescriptorPoolCreateFlags::empty(),
                )
            }
            .map_err(|e| DemoError::backend("create descriptor pool", e))?,
            |device, pool| unsafe { device.destroy_descriptor_pool(pool) },
        );
        let mut desc_set = unsafe {
            desc_pool.allocate_one(&*set_layout)
        }
        .map_err(|e| DemoError::backend("allocate descriptor set", e))?;

        // Buffer allocations
        log::debug!("memory types: {:?}", memory_types);

        let (vertex_buffer, vertex_buffer_memory) =
            create_buffer::<B, f32>(&device, &memory_types, buffer::Usage::VERTEX, scene.vertices)?;
        let vertex_count = (scene.vertices.len() / FLOATS_PER_VERTEX) as u32;

        let index_buffer = match scene.indices {
            Some(indices) => Some((
                create_buffer::<B, u16>(&device, &memory_types, buffer::Usage::INDEX, indices)?,
                indices.len() as u32,
            )),
            None => None,
        };

        let texture = match scene.texture {
            Some(img) => {
                let texture = Texture::upload(
                    device.clone(),
                    &memory_types,
                    &limits,
                    &mut queue_group,
                    &mut command_pool,
                    img,
                )?;
                unsafe { texture.write_descriptors(&mut desc_set) };
                Some(texture)
            }
            None => None,
        };

        let caps = surface.capabilities(&adapter.physical_device);
        let formats = surface.supported_formats(&adapter.physical_device);
        log::debug!("formats: {:?}", formats);
        let format = formats.map_or(format::Format::Rgba8Srgb, |formats| pick_format(&formats));

        let swap_config = window::SwapchainConfig::from_caps(&caps, format, dimensions);
        let fat = swap_config.framebuffer_attachment();
        log::info!("{:?}", swap_config);
        let extent = swap_config.extent;

        let pipeline = Pipeline::new(
            device.clone(),
            format,
            &*set_layout,
            &PipelineDesc {
                shaders: scene.shaders,
                push_constant_bytes: scene.push_constant_bytes,
                cull_face: scene.cull_face,
            },
        )?;

        let framebuffer = Guard::new(
            &device,
            unsafe {
                (*device).create_framebuffer(
                    pipeline.render_pass(),
                    iter::once(fat),
                    image::Extent {
                        width: extent.width,
                        height: extent.height,
                        depth: 1,
                    },
                )
            }
            .map_err(|e| DemoError::backend("create framebuffer", e))?,
            |device, framebuffer| unsafe { device.destroy_framebuffer(framebuffer) },
        );

        // Define maximum number of frames we want to be able to be "in flight" (being computed
        // simultaneously) at once
        let frames_in_flight = 3;

        // The number of the rest of the resources is based on the frames in flight.
        let mut submission_complete_semaphores = Vec::with_capacity(frames_in_flight);
        let mut submission_complete_fences = Vec::with_capacity(frames_in_flight);
        // One command pool per frame, each reset as a whole before its frame
        // is recorded again.
        let mut cmd_pools = Vec::with_capacity(frames_in_flight);
        let mut cmd_buffers = Vec::with_capacity(frames_in_flight);

        cmd_pools.push(command_pool);
        for _ in 1..frames_in_flight {
            cmd_pools.push(create_command_pool::<B>(&device, &queue_group)?);
        }

        for pool in cmd_pools.iter_mut() {
            submission_complete_semaphores.push(Guard::new(
                &device,
                (*device)
                    .create_semaphore()
                    .map_err(|e| DemoError::backend("create semaphore", e))?,
                |device, semaphore| unsafe { device.destroy_semaphore(semaphore) },
            ));
            submission_complete_fences.push(Guard::new(
                &device,
                (*device)
                    .create_fence(true)
                    .map_err(|e| DemoError::backend("create fence", e))?,
                |device, fence| unsafe { device.destroy_fence(fence) },
            ));
            cmd_buffers.push(unsafe { pool.allocate_one(command::Level::Primary) });
        }

        // Configured last: nothing after this point can fail.
        unsafe {
            surface
                .configure_swapchain(&*device, swap_config)
        }
        .map_err(|e| DemoError::backend("configure swapchain", e))?;

        // Rendering setup
        let viewport = pso::Viewport {
            rect: pso::Rect {
                x: 0,
                y: 0,
                w: extent.width as _,
                h: extent.height as _,
            },
            depth: 0.0..1.0,
        };

        Ok(Renderer {
            desc_pool: ManuallyDrop::new(desc_pool.release()),
            surface: ManuallyDrop::new(surface.release()),
            format,
            dimensions,
            viewport,
            framebuffer: ManuallyDrop::new(framebuffer.release()),
            pipeline,
            desc_set: Some(desc_set),
            set_layout: ManuallyDrop::new(set_layout.release()),
            submission_complete_semaphores: release_all(submission_complete_semaphores),
            submission_complete_fences: release_all(submission_complete_fences),
            cmd_pools: release_all(cmd_pools),
            cmd_buffers,
            texture,
            vertex_buffer: ManuallyDrop::new(vertex_buffer.release()),
            vertex_buffer_memory: ManuallyDrop::new(vertex_buffer_memory.release()),
            vertex_count,
            index_buffer: index_buffer.map(|((buffer, memory), count)| IndexBuffer {
                buffer: ManuallyDrop::new(buffer.release()),
                memory: ManuallyDrop::new(memory.release()),
                count,
            }),
            frames_in_flight,
            frame: 0,
            device,
            adapter,
            queue_group,
            instance,
        })
    }

    /// Reconfigures the swapchain for the stored dimensions. Does nothing
    /// while the window is minimized.
    pub fn recreate_swapchain(&mut self) -> Result<()> {
        if !is_drawable(self.dimensions) {
            log::debug!("skipping swapchain rebuild for {:?}", self.dimensions);
            return Ok(());
        }

        let caps = self.surface.capabilities(&self.adapter.physical_device);
        let swap_config = window::SwapchainConfig::from_caps(&caps, self.format, self.dimensions);
        log::info!("{:?}", swap_config);

        let extent = swap_config.extent.to_extent();
        self.viewport.rect.w = extent.width as _;
        self.viewport.rect.h = extent.height as _;

        (*self.device)
            .wait_idle()
            .map_err(|e| DemoError::backend("wait for device idle", e))?;

        unsafe {
            let framebuffer = (*self.device)
                .create_framebuffer(
                    self.pipeline.render_pass(),
                    iter::once(swap_config.framebuffer_attachment()),
                    extent,
                )
                .map_err(|e| DemoError::backend("create framebuffer", e))?;
            (*self.device)
                .destroy_framebuffer(ManuallyDrop::into_inner(ptr::read(&self.framebuffer)));
            self.framebuffer = ManuallyDrop::new(framebuffer);

            self.surface
                .configure_swapchain(&*self.device, swap_config)
                .map_err(|e| DemoError::backend("configure swapchain", e))?;
        }

        Ok(())
    }

    /// Records, submits and presents one frame with `push_constants` handed
    /// to the vertex stage.
    pub fn render(&mut self, push_constants: &[u32]) -> Result<()> {
        if !is_drawable(self.dimensions) {
            return Ok(());
        }

        let surface_image = unsafe {
            match self.surface.acquire_image(!0) {
                Ok((image, _)) => image,
                Err(error) => {
                    log::debug!("acquire failed ({:?}), rebuilding swapchain", error);
                    return self.recreate_swapchain();
                }
            }
        };

        // Compute index into our resource ring buffers based on the frame number
        // and number of frames in flight. Pay close attention to where this index is needed
        // versus when the swapchain image index we got from acquire_image is needed.
        let frame_idx = self.frame as usize % self.frames_in_flight;

        // Wait for the fence of the previous submission of this frame and reset it; ensures we are
        // submitting only up to maximum number of frames_in_flight if we are submitting faster than
        // the gpu can keep up with.
        unsafe {
            let fence = &mut self.submission_complete_fences[frame_idx];
            (*self.device)
                .wait_for_fence(fence, !0)
                .map_err(|e| DemoError::backend("wait for frame fence", e))?;
            (*self.device)
                .reset_fence(fence)
                .map_err(|e| DemoError::backend("reset frame fence", e))?;
            self.cmd_pools[frame_idx].reset(false);
        }

        // Rendering
        let cmd_buffer = &mut self.cmd_buffers[frame_idx];
        unsafe {
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);

            cmd_buffer.set_viewports(0, iter::once(self.viewport.clone()));
            cmd_buffer.set_scissors(0, iter::once(self.viewport.rect));
            cmd_buffer.bind_graphics_pipeline(self.pipeline.pipeline());

            cmd_buffer.bind_vertex_buffers(
                0,
                iter::once((&*self.vertex_buffer, buffer::SubRange::WHOLE)),
            );

            if let Some(index_buffer) = &self.index_buffer {
                cmd_buffer.bind_index_buffer(
                    &*index_buffer.buffer,
                    buffer::SubRange::WHOLE,
                    hal::IndexType::U16,
                );
            }

            cmd_buffer.bind_graphics_descriptor_sets(
                self.pipeline.pipeline_layout(),
                0,
                self.desc_set.as_ref().into_iter(),
                iter::empty(),
            );

            cmd_buffer.begin_render_pass(
                &self.pipeline.render_pass(),
                &self.framebuffer,
                self.viewport.rect,
                iter::once(command::RenderAttachmentInfo {
                    image_view: surface_image.borrow(),
                    clear_value: command::ClearValue {
                        color: command::ClearColor {
                            float32: [0.0, 0.0, 0.0, 1.0],
                        },
                    },
                }),
                command::SubpassContents::Inline,
            );

            cmd_buffer.push_graphics_constants(
                self.pipeline.pipeline_layout(),
                ShaderStageFlags::VERTEX,
                0,
                push_constants,
            );

            match &self.index_buffer {
                Some(index_buffer) => cmd_buffer.draw_indexed(0..index_buffer.count, 0, 0..1),
                None => cmd_buffer.draw(0..self.vertex_count, 0..1),
            }
            cmd_buffer.end_render_pass();
            cmd_buffer.finish();

            self.queue_group.queues[0].submit(
                iter::once(&*cmd_buffer),
                iter::empty(),
                iter::once(&self.submission_complete_semaphores[frame_idx]),
                Some(&mut self.submission_complete_fences[frame_idx]),
            );

            // present frame
            let result = self.queue_group.queues[0].present(
                &mut self.surface,
                surface_image,
                Some(&mut self.submission_complete_semaphores[frame_idx]),
            );

            if let Err(error) = result {
                log::debug!("present failed ({:?}), rebuilding swapchain", error);
                self.recreate_swapchain()?;
            }
        }

        // Increment our frame
        self.frame += 1;
        Ok(())
    }

    pub fn dimensions_set(&mut self, dimensions: window::Extent2D) {
        self.dimensions = dimensions;
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }
}

impl<B> Drop for Renderer<B>
where
    B: hal::Backend,
{
    fn drop(&mut self) {
        if let Err(error) = (*self.device).wait_idle() {
            log::warn!("device not idle at shutdown: {:?}", error);
        }
        unsafe {
            let _ = self.desc_set.take();
            let _ = self.texture.take();
            (*self.device).destroy_descriptor_pool(ManuallyDrop::into_inner(ptr::read(&self.desc_pool)));
            (*self.device).destroy_descriptor_set_layout(ManuallyDrop::into_inner(ptr::read(&self.set_layout)));

            (*self.device).destroy_buffer(ManuallyDrop::into_inner(ptr::read(&self.vertex_buffer)));
            (*self.device).free_memory(ManuallyDrop::into_inner(ptr::read(&self.vertex_buffer_memory)));
            if let Some(index_buffer) = self.index_buffer.take() {
                (*self.device).destroy_buffer(ManuallyDrop::into_inner(index_buffer.buffer));
                (*self.device).free_memory(ManuallyDrop::into_inner(index_buffer.memory));
            }

            for p in self.cmd_pools.drain(..) {
                (*self.device).destroy_command_pool(p);
            }

            for s in self.submission_complete_semaphores.drain(..) {
                (*self.device).destroy_semaphore(s);
            }

            for f in self.submission_complete_fences.drain(..) {
                (*self.device).destroy_fence(f);
            }

            (*self.device).destroy_framebuffer(ManuallyDrop::into_inner(ptr::read(&self.framebuffer)));

            self.surface.unconfigure_swapchain(&*self.device);

            self.instance.destroy_surface(ManuallyDrop::into_inner(ptr::read(&self.surface)));
        }
        log::debug!("renderer dropped");
    }
}

/// A zero-sized window (minimized on some platforms) has no swapchain to
/// draw into.
pub fn is_drawable(dimensions: window::Extent2D) -> bool {
    dimensions.width > 0 && dimensions.height > 0
}

/// First sRGB format the surface offers, else its first format.
fn pick_format(formats: &[format::Format]) -> format::Format {
    formats
        .iter()
        .find(|format| format.base_format().1 == ChannelType::Srgb)
        .or_else(|| formats.first())
        .copied()
        .unwrap_or(format::Format::Rgba8Srgb)
}

/// First memory type allowed by `type_mask` that has all of `properties`.
pub(crate) fn find_memory_type(
    memory_types: &[hal::adapter::MemoryType],
    type_mask: u32,
    properties: memory::Properties,
) -> Result<hal::MemoryTypeId> {
    // type_mask is a bit field where each bit represents a memory type. If the bit is set
    // to 1 it means we can use that type for our resource.
    memory_types
        .iter()
        .enumerate()
        .position(|(id, mem_type)| {
            type_mask & (1 << id) != 0 && mem_type.properties.contains(properties)
        })
        .map(hal::MemoryTypeId::from)
        .ok_or_else(|| DemoError::backend("find a memory type", properties))
}

fn create_command_pool<B: hal::Backend>(
    device: &Rc<B::Device>,
    queue_group: &QueueGroup<B>,
) -> Result<DeviceGuard<B, B::CommandPool>> {
    let pool = unsafe {
        (**device).create_command_pool(queue_group.family, pool::CommandPoolCreateFlags::empty())
    }
    .map_err(|e| DemoError::backend("create command pool", e))?;
    Ok(Guard::new(device, pool, |device, pool| unsafe {
        device.destroy_command_pool(pool)
    }))
}

fn release_all<O, T>(guards: Vec<Guard<O, T>>) -> Vec<T> {
    guards.into_iter().map(Guard::release).collect()
}

/// Creates a CPU-visible buffer and fills it with `src`.
pub(crate) fn create_buffer<B: hal::Backend, T: bytemuck::Pod>(
    device: &Rc<B::Device>,
    memory_types: &[hal::adapter::MemoryType],
    usage: buffer::Usage,
    src: &[T],
) -> Result<(DeviceGuard<B, B::Buffer>, DeviceGuard<B, B::Memory>)> {
    let bytes: &[u8] = bytemuck::cast_slice(src);
    let buffer_len = bytes.len() as u64;
    if buffer_len == 0 {
        return Err(DemoError::backend("create buffer", "empty source data"));
    }
    debug_assert_eq!(buffer_len, (src.len() * mem::size_of::<T>()) as u64);

    let mut buffer = Guard::new(
        device,
        unsafe {
            (**device).create_buffer(
                buffer_len,
                usage,
                memory::SparseFlags::empty(),
            )
        }
        .map_err(|e| DemoError::backend("create buffer", e))?,
        |device, buffer| unsafe { device.destroy_buffer(buffer) },
    );

    let buffer_req = unsafe {
        (**device).get_buffer_requirements(&buffer)
    };

    let upload_type = find_memory_type(memory_types, buffer_req.type_mask, memory::Properties::CPU_VISIBLE)?;

    let mut buffer_memory = Guard::new(
        device,
        unsafe { (**device).allocate_memory(upload_type, buffer_req.size) }
            .map_err(|e| DemoError::backend("allocate buffer memory", e))?,
        |device, memory| unsafe { device.free_memory(memory) },
    );

    unsafe {
        (**device)
            .bind_buffer_memory(&buffer_memory, 0, &mut buffer)
            .map_err(|e| DemoError::backend("bind buffer memory", e))?;

        let mapping = (**device)
            .map_memory(&mut buffer_memory, memory::Segment::ALL)
            .map_err(|e| DemoError::backend("map buffer memory", e))?;

        ptr::copy_nonoverlapping(bytes.as_ptr(), mapping, bytes.len());
        (**device)
            .flush_mapped_memory_ranges(iter::once((&*buffer_memory, memory::Segment::ALL)))
            .map_err(|e| DemoError::backend("flush buffer memory", e))?;
        (**device).unmap_memory(&mut buffer_memory);
    }

    Ok((buffer, buffer_memory))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimized_window_is_not_drawable() {
        for (width, height) in [(0, 0), (0, 500), (500, 0)] {
            assert!(!is_drawable(window::Extent2D { width, height }));
        }
        assert!(is_drawable(window::Extent2D { width: 1, height: 1 }));
        assert!(is_drawable(window::Extent2D { width: 500, height: 500 }));
    }

    #[test]
    fn srgb_format_is_preferred() {
        let formats = [format::Format::Bgra8Unorm, format::Format::Bgra8Srgb];
        assert_eq!(pick_format(&formats), format::Format::Bgra8Srgb);
    }

    #[test]
    fn first_format_without_srgb() {
        let formats = [format::Format::Bgra8Unorm, format::Format::Rgba8Unorm];
        assert_eq!(pick_format(&formats), format::Format::Bgra8Unorm);
    }

    #[test]
    fn empty_format_list_falls_back() {
        assert_eq!(pick_format(&[]), format::Format::Rgba8Srgb);
    }
}
