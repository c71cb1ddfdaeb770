//! Image adapter: deterministic URL construction against the hosted
//! image-generation endpoint. No network call happens here; the URL is
//! embedded in a markdown image reference and fetched by whatever renders
//! the transcript.

use rand::Rng;
use url::Url;

use crate::core::constants::{IMAGE_ENDPOINT, IMAGE_HEIGHT, IMAGE_QUALITY_SUFFIX, IMAGE_WIDTH};

/// Optional style/mood modifiers folded into the prompt before the fixed
/// quality suffix.
#[derive(Debug, Clone, Default)]
pub struct PromptBoost {
    pub style: Option<String>,
    pub mood: Option<String>,
}

/// Compose the full generation prompt: base text, optional modifiers, then
/// the quality suffix.
pub fn enhance_prompt(base: &str, boost: &PromptBoost) -> String {
    let mut parts = vec![base.trim().to_string()];
    if let Some(style) = boost.style.as_deref().filter(|s| !s.is_empty()) {
        parts.push(style.to_string());
    }
    if let Some(mood) = boost.mood.as_deref().filter(|s| !s.is_empty()) {
        parts.push(mood.to_string());
    }
    parts.push(IMAGE_QUALITY_SUFFIX.to_string());
    parts.join(", ")
}

/// Build the endpoint URL for a prompt with an explicit seed. The prompt is
/// percent-escaped into the path; width/height are fixed query parameters.
pub fn build_image_url_with_seed(prompt: &str, seed: u64) -> String {
    let mut url = Url::parse(IMAGE_ENDPOINT).expect("endpoint constant is a valid URL");
    url.path_segments_mut()
        .expect("endpoint constant is a base URL")
        .push("prompt")
        .push(prompt);
    url.query_pairs_mut()
        .append_pair("width", &IMAGE_WIDTH.to_string())
        .append_pair("height", &IMAGE_HEIGHT.to_string())
        .append_pair("seed", &seed.to_string())
        .append_pair("nologo", "true")
        .append_pair("enhance", "true");
    url.into()
}

/// Build the endpoint URL with a random cache-busting seed.
pub fn build_image_url(prompt: &str) -> String {
    let seed = rand::thread_rng().gen_range(0..1_000_000u64);
    build_image_url_with_seed(prompt, seed)
}

/// Markdown image reference stored as the assistant turn for an image
/// request.
pub fn image_markdown(prompt: &str, url: &str) -> String {
    let alt = prompt.trim().replace(['[', ']'], "");
    format!("![{alt}]({url})")
}
