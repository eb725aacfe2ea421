use chrono::Duration;

/// Length of the usage accounting window.
/// Render count and cost reset once this much time has passed since the last reset.
pub const USAGE_WINDOW: Duration = Duration::hours(24);

/// Renders allowed per window on the free tier
pub const DEFAULT_DAILY_FREE_LIMIT: u32 = 5;

/// Edits are billed at this fraction of a create at the same size
pub const DEFAULT_EDIT_COST_MULTIPLIER: f64 = 0.5;

/// Default brush width in pixels
pub const DEFAULT_BRUSH_SIZE: f32 = 40.0;

/// Brush colour used on the drawing surface, rgba(99, 102, 241, 0.6)
pub const BRUSH_COLOR: [u8; 4] = [99, 102, 241, 153];

/// Base URL of the Gemini REST API
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
