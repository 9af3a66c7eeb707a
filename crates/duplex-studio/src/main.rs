mod runtime;
mod scanout;
mod scene;

use anyhow::Result;
use duplex_engine::config::{BackendInit, DisplayMode};
use duplex_engine::format::PixelFormat;
use duplex_engine::logging::{init_logging, LoggingConfig};

use runtime::{Runtime, StudioConfig};
use scanout::ScanoutInit;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(StudioConfig {
        title: "duplex studio".to_string(),
        mode: DisplayMode::new(640, 360, PixelFormat::Argb8888),
        backend: BackendInit::from_env(),
        scanout: ScanoutInit::default(),
    })
}
