//! Per-request processing state.

use std::collections::BTreeMap;
use std::sync::Arc;

use pictor_storage::BufferStore;

use crate::image::{ImageHandle, ImageMetadata};
use crate::mask::ActionMask;

/// Request-global feature flags.
///
/// Defaults apply per request; the pre-pass (`before_new_context`) and a few
/// explicit toggles during processing are the only writers.
#[derive(Debug, Clone)]
pub struct Features {
    /// Convert single-frame output to webp unless an explicit format is set.
    pub auto_webp: bool,
    /// Normalize EXIF orientation before any action runs.
    pub auto_orient: bool,
    /// The response is an info payload instead of image bytes.
    pub return_info: bool,
    /// Decode every frame of an animated source.
    pub read_all_animated_frames: bool,
    /// Cap on decoded frames when `read_all_animated_frames` is off.
    pub limit_animated_frames: Option<u32>,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            auto_webp: false,
            auto_orient: true,
            return_info: false,
            read_all_animated_frames: true,
            limit_animated_frames: None,
        }
    }
}

/// Context built during phase one, before the source is fetched.
pub struct ProcessContext {
    pub uri: String,
    pub actions: Vec<String>,
    pub mask: ActionMask,
    pub store: Arc<dyn BufferStore>,
    pub features: Features,
    pub headers: BTreeMap<String, String>,
}

/// Full image context: the phase-one state plus the decoded working image,
/// its metadata snapshot and the optional info payload.
pub struct ImageContext {
    pub uri: String,
    pub actions: Vec<String>,
    pub mask: ActionMask,
    pub store: Arc<dyn BufferStore>,
    pub features: Features,
    pub headers: BTreeMap<String, String>,
    pub image: ImageHandle,
    pub metadata: ImageMetadata,
    pub info: Option<serde_json::Value>,
}

impl ImageContext {
    pub fn from_parts(ctx: ProcessContext, image: ImageHandle, metadata: ImageMetadata) -> Self {
        Self {
            uri: ctx.uri,
            actions: ctx.actions,
            mask: ctx.mask,
            store: ctx.store,
            features: ctx.features,
            headers: ctx.headers,
            image,
            metadata,
            info: None,
        }
    }
}
