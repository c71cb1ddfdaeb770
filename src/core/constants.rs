//! Shared constants used across the application

/// Name given to freshly created sessions, suffixed with an ordinal
/// ("Session 1", "Session 2", ...). Sessions still carrying this pattern are
/// renamed after their first user message.
pub const SESSION_PLACEHOLDER_PREFIX: &str = "Session";

/// Number of leading words of the first user message used to derive a
/// session name.
pub const SESSION_NAME_WORDS: usize = 4;

/// Character budget for derived session names. Longer names are truncated on
/// a char boundary and terminated with an ellipsis.
pub const SESSION_NAME_BUDGET: usize = 32;

/// Maximum number of prior user/assistant turns forwarded to a completion
/// engine. Bounds the request payload.
pub const HISTORY_TURN_LIMIT: usize = 20;

/// Total content character budget for forwarded history. Oldest turns are
/// dropped first until the window fits.
pub const HISTORY_CHAR_BUDGET: usize = 12_000;

/// Maximum number of hits returned by cross-session search.
pub const SEARCH_RESULT_LIMIT: usize = 20;

/// Quality suffix appended to every image-generation prompt.
pub const IMAGE_QUALITY_SUFFIX: &str = "professional quality, highly detailed, 4K";

/// Base endpoint of the hosted image-generation service.
pub const IMAGE_ENDPOINT: &str = "https://image.pollinations.ai";

/// Fixed pixel dimensions for generated images.
pub const IMAGE_WIDTH: u32 = 800;
pub const IMAGE_HEIGHT: u32 = 400;
