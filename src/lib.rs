//! texstream library
//!
//! Streams CPU-generated RGBA8 frames into a GPU texture every display
//! refresh through a pool of reusable, asynchronously-remapped staging
//! buffers, and draws a small instanced triangle mesh sampling that texture.
//!
//! Exposes internal modules for testing and integration.

pub mod app;
pub mod config;
pub mod graphics;
pub mod source;

// Re-export commonly used types for tests
pub use config::Config;
pub use graphics::staging::{StagingBufferPool, StagingError};
pub use source::FrameSource;
