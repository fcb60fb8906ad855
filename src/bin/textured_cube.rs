use clap::Parser;
use gfx_hal::pso;

use rotation_demos::{
    app,
    config::{self, Args},
    context::Context,
    controls::{CubeConstants, CubeControls},
    entities::{self, Cube},
    pipelines::ShaderSet,
    renderer::{Renderer, Scene},
    texture, transforms,
};

pub const TITLE: &str = "Textured cube";

fn main() -> anyhow::Result<()> {
    config::init_logging();
    let args = Args::parse();

    // Everything that can fail does so before the window opens.
    let shaders = ShaderSet::load(&args.shader_path("cube.vert"), &args.shader_path("cube.frag"))?;
    let retro = texture::load_image(&args.asset_path("retro.png"))?;

    let cube = Cube::default();
    let vertices = entities::flatten(&cube.vertices());

    log::debug!(
        "x-axis quarter turn: {}",
        transforms::rotation4(transforms::Axis::X, 90.0)
    );

    let context = Context::new(TITLE, args.dims())?;
    let renderer = Renderer::new(
        context.instance,
        context.surface,
        context.adapter,
        args.dims(),
        &Scene {
            vertices: &vertices,
            indices: Some(cube.indices()),
            shaders: &shaders,
            push_constant_bytes: std::mem::size_of::<CubeConstants>() as u32,
            texture: Some(&retro),
            cull_face: pso::Face::BACK,
        },
    )?;
    log::info!("textured: {}, use the arrow keys to turn the cube", renderer.has_texture());

    app::run(context.event_loop, context.window, renderer, CubeControls::new())
}
