//! Turn router: decides whether a user message asks for an image or for
//! text, purely by keyword sniffing. Deterministic, never fails.

/// Canonical image-request keyword set. Matching is case-insensitive
/// substring containment.
pub const IMAGE_KEYWORDS: &[&str] = &[
    "draw",
    "pic",
    "image",
    "photo bana",
    "generate image",
    "create image",
    "paint",
    "illustrate",
    "visualize",
    "sketch",
    "artwork",
    "design an image",
    "make a picture",
    "show me",
    "render",
];

/// Where a user turn is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Image,
    Text,
}

/// True iff the message contains any canonical image keyword.
pub fn is_image_request(message: &str) -> bool {
    let lowered = message.to_lowercase();
    IMAGE_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

pub fn classify(message: &str) -> Route {
    if is_image_request(message) {
        Route::Image
    } else {
        Route::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_messages_route_to_image() {
        assert!(is_image_request("draw a cat"));
        assert!(is_image_request("DRAW a cat"));
        assert!(is_image_request("please Generate Image of a sunset"));
        assert!(is_image_request("ek photo bana do"));
        assert!(is_image_request("can you sketch the layout"));
        assert!(is_image_request("show me the Eiffel Tower"));
    }

    #[test]
    fn plain_questions_route_to_text() {
        assert!(!is_image_request("explain gravity"));
        assert!(!is_image_request("what is the capital of France?"));
        assert!(!is_image_request(""));
    }

    #[test]
    fn classify_mirrors_the_keyword_test() {
        assert_eq!(classify("paint a landscape"), Route::Image);
        assert_eq!(classify("summarize this article"), Route::Text);
    }
}
