pub mod blob;
pub mod chat;
pub mod cost;
pub mod history;
pub mod ids;
pub mod remaining_time;
pub mod request;
pub mod tier;
pub mod usage;

pub use blob::ImageBlob;
pub use chat::{Attachment, AttachmentKind, Message, Role};
pub use cost::Cost;
pub use history::RenderHistoryItem;
pub use ids::{MessageId, RenderId};
pub use remaining_time::RemainingTime;
pub use request::RenderRequestSpec;
pub use tier::{AspectRatio, ModelTier, OperationKind, SizeTier};
pub use usage::UsageStats;
