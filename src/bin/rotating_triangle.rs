use clap::Parser;
use gfx_hal::pso;

use rotation_demos::{
    app,
    config::{self, Args},
    context::Context,
    controls::{SpinConstants, SpinControls},
    entities::{self, Triangle},
    pipelines::ShaderSet,
    renderer::{Renderer, Scene},
    transforms,
};

pub const TITLE: &str = "Rotating triangle";

fn main() -> anyhow::Result<()> {
    config::init_logging();
    let args = Args::parse();

    let shaders = ShaderSet::load(
        &args.shader_path("triangle.vert"),
        &args.shader_path("triangle.frag"),
    )?;

    let triangle = Triangle::default();
    let vertices = entities::flatten(triangle.vertices());

    log::debug!(
        "z-axis quarter turn: {}",
        transforms::rotation3(transforms::Axis::Z, 90.0)
    );

    let context = Context::new(TITLE, args.dims())?;
    let renderer = Renderer::new(
        context.instance,
        context.surface,
        context.adapter,
        args.dims(),
        &Scene {
            vertices: &vertices,
            indices: None,
            shaders: &shaders,
            push_constant_bytes: std::mem::size_of::<SpinConstants>() as u32,
            texture: None,
            cull_face: pso::Face::NONE,
        },
    )?;

    app::run(context.event_loop, context.window, renderer, SpinControls::new())
}
