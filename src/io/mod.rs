//! Input/output: files, thumbnails, video sinks, progress and the CLI

/// Command-line interface and pipeline orchestration
pub mod cli;
/// Constants and defaults
pub mod configuration;
/// Video frame sinks
pub mod encoder;
/// Error types
pub mod error;
/// Image reading and writing
pub mod image;
/// Library building and the thumbnail cache
pub mod library;
/// Terminal progress display
pub mod progress;
