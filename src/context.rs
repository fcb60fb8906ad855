use gfx_hal as hal;
use hal::{prelude::*, window};
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

use crate::error::{DemoError, Result};
use crate::Backend;

/// Window plus the backend objects the renderer takes ownership of.
pub struct Context {
    pub event_loop: EventLoop<()>,
    pub window: Window,
    pub instance: crate::back::Instance,
    pub surface: <Backend as hal::Backend>::Surface,
    pub adapter: hal::adapter::Adapter<Backend>,
}

impl Context {
    pub fn new(title: &str, dims: window::Extent2D) -> Result<Self> {
        if crate::EMPTY_BACKEND {
            log::warn!(
                "running with the empty backend, no graphical output is to be expected"
            );
        }

        let event_loop = EventLoop::new();

        let window = WindowBuilder::new()
            .with_min_inner_size(winit::dpi::Size::Logical(winit::dpi::LogicalSize::new(
                64.0, 64.0,
            )))
            .with_inner_size(winit::dpi::Size::Physical(winit::dpi::PhysicalSize::new(
                dims.width,
                dims.height,
            )))
            .with_title(title)
            .build(&event_loop)?;

        let instance = crate::back::Instance::create(title, 1)
            .map_err(|e| DemoError::backend("create an instance", e))?;

        let surface = unsafe { instance.create_surface(&window) }
            .map_err(|e| DemoError::backend("create a surface", e))?;

        let mut adapters = instance.enumerate_adapters();
        for adapter in &adapters {
            log::info!("{:?}", adapter.info);
        }
        if adapters.is_empty() {
            return Err(DemoError::backend("find an adapter", "none reported"));
        }
        let adapter = adapters.remove(0);
        log::info!("using {}", adapter.info.name);

        Ok(Self {
            event_loop,
            window,
            instance,
            surface,
            adapter,
        })
    }
}
