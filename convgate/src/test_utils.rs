//! Shared fixtures for handler and router tests.

use std::{io::Cursor, sync::Arc};

use axum_test::TestServer;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use crate::{AppState, Config, build_router};

pub const INDEX_HTML: &str = "<!doctype html><title>convgate</title>";
pub const STYLE_CSS: &str = "body { margin: 0; }";

/// Temporary asset directory with an index document and one stylesheet.
pub struct TestAssets {
    dir: TempDir,
}

impl TestAssets {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("index.html"), INDEX_HTML).expect("Failed to write index");
        std::fs::create_dir(dir.path().join("css")).expect("Failed to create css dir");
        std::fs::write(dir.path().join("css/style.css"), STYLE_CSS).expect("Failed to write stylesheet");
        Self { dir }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.assets.dir = self.dir.path().to_path_buf();
        config.assets.index = self.dir.path().join("index.html");
        config
    }

    pub fn server(&self) -> TestServer {
        server_with_config(self.config())
    }
}

pub fn server_with_config(config: Config) -> TestServer {
    let state = AppState::builder().config(Arc::new(config)).build();
    TestServer::new(build_router(state).into_make_service()).expect("Failed to create test server")
}

/// PNG encoded solid image of the given size
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 120, 200])));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).expect("Failed to encode PNG");
    out.into_inner()
}
