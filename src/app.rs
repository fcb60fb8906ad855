use gfx_hal as hal;
use hal::window;
use winit::event::{Event, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::Window;

use crate::controls::{pressed_key, Controls};
use crate::renderer::{is_drawable, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Quitting,
}

impl LoopState {
    /// Closing the window quits; quitting is final.
    pub fn on_window_event(self, event: &WindowEvent) -> Self {
        match event {
            WindowEvent::CloseRequested => LoopState::Quitting,
            _ => self,
        }
    }

    pub fn on_key(self, key: VirtualKeyCode) -> Self {
        match key {
            VirtualKeyCode::Escape => LoopState::Quitting,
            _ => self,
        }
    }
}

/// Polls events, lets `controls` update the angles and draws a frame each
/// time the queue is drained. Never returns; the process exits when the loop
/// reaches [`LoopState::Quitting`].
pub fn run<B, C>(
    event_loop: EventLoop<()>,
    window: Window,
    mut renderer: Renderer<B>,
    mut controls: C,
) -> !
where
    B: hal::Backend,
    C: Controls + 'static,
{
    let mut state = LoopState::Running;

    // It is important that the closure move captures the Renderer,
    // otherwise it will not be dropped when the event loop exits.
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Some(key) = pressed_key(&event) {
            state = state.on_key(key);
        }
        controls.handle_event(&event);

        match event {
            Event::WindowEvent { event, window_id } if window_id == window.id() => {
                state = state.on_window_event(&event);

                if let WindowEvent::Resized(dims) = event {
                    log::info!("resized to {:?}", dims);
                    let extent = window::Extent2D {
                        width: dims.width,
                        height: dims.height,
                    };
                    renderer.dimensions_set(extent);
                    if is_drawable(extent) {
                        if let Err(error) = renderer.recreate_swapchain() {
                            log::error!("{}", error);
                            state = LoopState::Quitting;
                        }
                    }
                }
            }
            Event::RedrawEventsCleared if state == LoopState::Running => {
                controls.advance();
                let constants = [controls.constants()];
                if let Err(error) = renderer.render(bytemuck::cast_slice(&constants)) {
                    log::error!("{}", error);
                    state = LoopState::Quitting;
                }
            }
            _ => {}
        }

        if state == LoopState::Quitting {
            *control_flow = ControlFlow::Exit;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_request_quits() {
        let state = LoopState::Running.on_window_event(&WindowEvent::CloseRequested);
        assert_eq!(state, LoopState::Quitting);
    }

    #[test]
    fn other_window_events_keep_running() {
        let state = LoopState::Running.on_window_event(&WindowEvent::Focused(true));
        assert_eq!(state, LoopState::Running);
    }

    #[test]
    fn escape_quits_and_arrows_do_not() {
        assert_eq!(LoopState::Running.on_key(VirtualKeyCode::Left), LoopState::Running);
        assert_eq!(LoopState::Running.on_key(VirtualKeyCode::Escape), LoopState::Quitting);
    }

    #[test]
    fn quitting_is_final() {
        let state = LoopState::Quitting
            .on_window_event(&WindowEvent::Focused(true))
            .on_key(VirtualKeyCode::Up);
        assert_eq!(state, LoopState::Quitting);
    }
}
