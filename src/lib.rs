pub mod accumulation;
pub mod application;
pub mod camera;
pub mod compositor;
pub mod config;
pub mod error;
pub mod kernel;
pub mod light;
pub mod renderer;
pub mod scene;
pub mod target;
pub mod texture;
pub mod tracer;
pub mod tracker;
pub mod transform;

pub use config::TracerConfig;
pub use error::{TracerError, TracerResult};
pub use tracer::ProgressiveTracer;

use application::Application;

/// Open a window and trace `config`'s scene until it is closed.
pub async fn run(config: TracerConfig) -> TracerResult<()> {
    let title = config.window_title.clone();
    Application::<ProgressiveTracer>::init(config, &title).await
}
