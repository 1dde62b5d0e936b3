//! Pictor processing library
//!
//! The action-pipeline engine behind on-demand media transformation. A
//! request carries a slash separated action chain (`resize,w_100/format,png`)
//! that is parsed once, validated during a pre-pass, and executed in order
//! against a decoded working image. Processors own one chain namespace each:
//! `image` runs the action pipeline, `video` extracts snapshots through
//! ffmpeg, `style` resolves named chains from the KV store and re-dispatches.

pub mod action;
pub mod chain;
pub mod context;
pub mod image;
pub mod mask;
pub mod processor;
pub mod style;
pub mod video;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use action::{Action, ActionRegistry};
pub use chain::{parse_query, parse_request, split_chain, split_kv};
pub use context::{Features, ImageContext, ProcessContext};
pub use image::{EncodeOptions, ImageHandle, ImageMetadata, ImageProcessor, OutputFormat};
pub use mask::ActionMask;
pub use processor::{
    build_registry, ProcessData, Processor, ProcessorRegistry, ProcessResponse,
};
pub use style::StyleProcessor;
pub use video::VideoProcessor;
