//! Boundary to the hosted generative model.
//!
//! [`GenerationService`] is the only asynchronous seam in the crate. Every
//! call either yields a usable result or fails with
//! [`AtomError::RemoteGeneration`](crate::error::AtomError::RemoteGeneration);
//! nothing is retried.

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use crate::types::{AspectRatio, ImageBlob, Message, ModelTier, SizeTier};
use async_trait::async_trait;
use futures::stream::BoxStream;

pub const RENDER_OPERATION: &str = "Rendering";
pub const EDIT_OPERATION: &str = "Image editing";
pub const IMAGINE_OPERATION: &str = "Image generation";
pub const CHAT_OPERATION: &str = "Chat";

/// Finite, non-restartable stream of text deltas
pub type TextStream = BoxStream<'static, Result<String>>;

/// Turn a sketch into a photorealistic render
#[derive(Debug, Clone)]
pub struct RenderCall {
    pub prompt: String,
    pub sketch: ImageBlob,
    pub size: SizeTier,
    pub aspect_ratio: AspectRatio,
    pub tier: ModelTier,
}

/// Modify an existing render, optionally restricted to a masked region
#[derive(Debug, Clone)]
pub struct EditCall {
    pub base_image: ImageBlob,
    pub prompt: String,
    /// Binary PNG mask; white marks the region to change
    pub mask: Option<ImageBlob>,
    pub aspect_ratio: AspectRatio,
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn render(&self, call: &RenderCall) -> Result<ImageBlob>;

    async fn edit(&self, call: &EditCall) -> Result<ImageBlob>;

    /// Square image from a text prompt alone
    async fn generate_from_text(&self, prompt: &str) -> Result<ImageBlob>;

    async fn chat_stream(&self, history: &[Message]) -> Result<TextStream>;
}

pub fn render_prompt(style: &str) -> String {
    format!(
        "You are an expert architectural visualization engine. \
         Transform this SketchUp screenshot into a photorealistic architectural render. \
         Focus on realistic lighting, high-quality materials, and cinematic atmosphere. \
         Architecture Style/Prompt: {}",
        style
    )
}

pub fn edit_prompt(request: &str, has_mask: bool) -> String {
    if has_mask {
        format!(
            "Specifically focus the following modification on the area highlighted in the \
             provided mask image: {}. Keep everything else identical to the original \
             architectural render.",
            request
        )
    } else {
        format!(
            "Focus only on the following modifications to this architectural render while \
             keeping the rest identical: {}",
            request
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt_wraps_style() {
        let prompt = render_prompt("Tropical modern villa");
        assert!(prompt.starts_with("You are an expert architectural visualization engine."));
        assert!(prompt.ends_with("Architecture Style/Prompt: Tropical modern villa"));
    }

    #[test]
    fn test_edit_prompt_depends_on_mask() {
        let masked = edit_prompt("add trees", true);
        assert!(masked.contains("area highlighted in the provided mask image: add trees."));

        let unmasked = edit_prompt("add trees", false);
        assert!(unmasked.ends_with("keeping the rest identical: add trees"));
        assert!(!unmasked.contains("mask"));
    }
}
