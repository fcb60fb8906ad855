use std::path::{Path, PathBuf};

use clap::Parser;
use gfx_hal::window;

pub const DEFAULT_DIMS: window::Extent2D = window::Extent2D {
    width: 500,
    height: 500,
};

/// Command line shared by both demos.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Args {
    /// Directory holding `shaders/` and the cube texture.
    #[arg(long, default_value = "assets")]
    pub assets: PathBuf,

    /// Initial window width in physical pixels.
    #[arg(long, default_value_t = DEFAULT_DIMS.width)]
    pub width: u32,

    /// Initial window height in physical pixels.
    #[arg(long, default_value_t = DEFAULT_DIMS.height)]
    pub height: u32,
}

impl Args {
    pub fn dims(&self) -> window::Extent2D {
        window::Extent2D {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }

    pub fn shader_path(&self, file_name: &str) -> PathBuf {
        self.assets.join("shaders").join(file_name)
    }

    pub fn asset_path(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.assets.join(file_name)
    }
}

/// Sets up `env_logger` with an `info` default that `RUST_LOG` overrides.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    // A second call (tests, embedding) leaves the first logger in place.
    let _ = env_logger::Builder::from_env(env).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_window() {
        let args = Args::parse_from(["textured-cube"]);
        assert_eq!(args.assets, PathBuf::from("assets"));
        assert_eq!(args.dims(), DEFAULT_DIMS);
    }

    #[test]
    fn paths_are_resolved_under_assets() {
        let args = Args::parse_from(["rotating-triangle", "--assets", "/tmp/demo"]);
        assert_eq!(
            args.shader_path("triangle.vert"),
            PathBuf::from("/tmp/demo/shaders/triangle.vert")
        );
        assert_eq!(
            args.asset_path("retro.png"),
            PathBuf::from("/tmp/demo/retro.png")
        );
    }

    #[test]
    fn zero_sized_window_is_clamped() {
        let args = Args::parse_from(["textured-cube", "--width", "0", "--height", "64"]);
        assert_eq!(
            args.dims(),
            window::Extent2D {
                width: 1,
                height: 64
            }
        );
    }
}
