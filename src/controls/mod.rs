mod cube_controls;
pub use cube_controls::{CubeAngles, CubeConstants, CubeControls, CUBE_STEP};

mod spin_controls;
pub use spin_controls::{SpinConstants, SpinControls, SPIN_STEP};

use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};

/// Per-demo rotation state. Owns the angles, turns input into angle changes
/// and hands the render step the push constants for the current frame.
pub trait Controls {
    type Constants: bytemuck::Pod;

    fn key_pressed(&mut self, key: VirtualKeyCode);

    /// Called once per frame before drawing.
    fn advance(&mut self) {}

    fn constants(&self) -> Self::Constants;

    fn handle_event<T>(&mut self, event: &Event<T>) {
        if let Some(key) = pressed_key(event) {
            self.key_pressed(key);
        }
    }
}

/// Key of a press (auto-repeat included) on any window.
pub fn pressed_key<T>(event: &Event<T>) -> Option<VirtualKeyCode> {
    match event {
        Event::WindowEvent {
            event:
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                },
            ..
        } => Some(*key),
        _ => None,
    }
}
