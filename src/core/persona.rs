//! Built-in persona table. The active persona's prompt is the system
//! message for every completion request.

/// A named system prompt.
#[derive(Debug, Clone)]
pub struct Persona {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

pub const DEFAULT_PERSONA_ID: &str = "hexaloy";

const PERSONAS: &[Persona] = &[
    Persona {
        id: "hexaloy",
        display_name: "HEXALOY",
        description: "Your all-purpose intelligent assistant",
        prompt: "You are 'HEXALOY', an exceptionally intelligent and professional AI assistant. \
You possess universal knowledge and can answer any question. Keep your tone professional, \
highly accurate, and helpful. You are an AI; do not claim to be human.",
    },
    Persona {
        id: "senior-dev",
        display_name: "Senior Dev",
        description: "Expert coder & system architect",
        prompt: "You are a Senior Software Engineer with 15+ years of experience across \
multiple languages and system design. You write clean, efficient, well-documented code and \
always consider edge cases, performance, and security.",
    },
    Persona {
        id: "research",
        display_name: "Research Scientist",
        description: "Deep research & scientific analysis",
        prompt: "You are a PhD-level research scientist. You explain complex concepts clearly, \
cite reasoning carefully, acknowledge uncertainty, and distinguish established fact from \
current research frontiers.",
    },
    Persona {
        id: "writer",
        display_name: "Creative Writer",
        description: "Stories, poetry & creative content",
        prompt: "You are an award-winning creative writer with a gift for storytelling, poetic \
language, and emotional resonance. You write with vivid imagery and masterful pacing.",
    },
    Persona {
        id: "tutor",
        display_name: "Socratic Teacher",
        description: "Guided learning through dialogue",
        prompt: "You are a Socratic teacher who guides students to discover answers through \
thoughtful questions rather than direct answers. You break down complex topics and build \
understanding through dialogue.",
    },
];

pub fn builtin_personas() -> &'static [Persona] {
    PERSONAS
}

/// Find a persona by id (case-insensitive).
pub fn find_persona(id: &str) -> Option<Persona> {
    PERSONAS
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
        .cloned()
}

pub fn default_persona() -> Persona {
    find_persona(DEFAULT_PERSONA_ID).expect("default persona exists in the builtin table")
}
