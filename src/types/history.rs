use super::cost::Cost;
use super::ids::RenderId;
use super::tier::{AspectRatio, ModelTier, SizeTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed render or edit.
///
/// `image_url` holds the result as a `data:` URL so the log is self-contained.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderHistoryItem {
    pub id: RenderId,
    pub prompt: String,
    pub size: SizeTier,
    pub image_url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub cost: Cost,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_tier: Option<ModelTier>,
}

impl RenderHistoryItem {
    /// Edits are recorded with an `[Edit] ` prompt prefix
    pub fn is_edit(&self) -> bool {
        self.prompt.starts_with("[Edit] ")
    }

    /// Suggested download file name, `render-<id>.<extension>`
    pub fn download_name(&self, extension: &str) -> String {
        format!("render-{}.{}", self.id, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_item_parsing() {
        let json = r#"{
            "id": "1700000000000",
            "prompt": "[Edit] add trees",
            "size": "Full HD",
            "imageUrl": "data:image/jpeg;base64,AAAA",
            "timestamp": 1700000000000,
            "cost": 0.725,
            "aspectRatio": "16:9",
            "modelTier": "pro"
        }"#;

        let item: RenderHistoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id.as_str(), "1700000000000");
        assert_eq!(item.size, SizeTier::FullHd);
        assert_eq!(item.cost, Cost::new(0.725));
        assert_eq!(item.aspect_ratio, Some(AspectRatio::Widescreen));
        assert_eq!(item.model_tier, Some(ModelTier::Pro));
        assert!(item.is_edit());
        assert_eq!(item.download_name("png"), "render-1700000000000.png");
    }

    #[test]
    fn test_optional_fields_may_be_missing() {
        let json = r#"{"id":"1","prompt":"Render","size":"Mini HD","imageUrl":"x","timestamp":1,"cost":0}"#;
        let item: RenderHistoryItem = serde_json::from_str(json).unwrap();
        assert!(item.aspect_ratio.is_none());
        assert!(item.model_tier.is_none());
        assert!(!item.is_edit());
    }
}
