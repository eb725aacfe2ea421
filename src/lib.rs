// Module declarations
pub mod chat;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatting;
pub mod history;
pub mod identity;
pub mod ledger;
pub mod mask;
pub mod pricing;
pub mod service;
pub mod store;
pub mod studio;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use chat::ChatSession;
pub use config::Config;
pub use error::{AtomError, Result};
pub use history::HistoryLog;
pub use identity::UserIdentity;
pub use mask::{RegionMask, Stroke, StrokeLayer, Tool, binarize, binarize_overlay};
pub use pricing::{CostModel, CostTable};
pub use service::{GeminiClient, GenerationService};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreKey};
pub use studio::Studio;
pub use types::{
    AspectRatio, Cost, ImageBlob, Message, ModelTier, OperationKind, RemainingTime,
    RenderHistoryItem, RenderRequestSpec, SizeTier, UsageStats,
};
