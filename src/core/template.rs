//! Built-in prompt templates: reusable prompt scaffolds loaded into the
//! input box with their `{placeholder}` fields left for the user to fill in.

pub struct PromptTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub template: &'static str,
}

const TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        id: "code-review",
        title: "Code Review",
        category: "Development",
        template: "Please review the following code and provide: bugs and issues found, \
security vulnerabilities if any, performance improvements, best-practice recommendations, \
and a refactored version.\n\n```\n{code}\n```",
    },
    PromptTemplate {
        id: "debug",
        title: "Debug Code",
        category: "Development",
        template: "I have a bug in my {language} code. Error message: {error}\n\n\
My code:\n```{language}\n{code}\n```\n\nPlease identify the root cause, explain why this \
error occurs, provide the fixed code, and explain what you changed.",
    },
    PromptTemplate {
        id: "blog-post",
        title: "Blog Post",
        category: "Writing",
        template: "Write a comprehensive, engaging blog post about {topic}. Target audience: \
{audience}. Tone: {tone}. Length: about {length} words. Include an introduction, main \
sections with subheadings, actionable takeaways, and a conclusion.",
    },
    PromptTemplate {
        id: "study-guide",
        title: "Study Guide",
        category: "Education",
        template: "Create a comprehensive study guide for {topic}. Include core concepts \
explained simply, key terms and definitions, important formulas or rules, common \
misconceptions, practice questions with answers, and real-world applications.",
    },
    PromptTemplate {
        id: "email",
        title: "Professional Email",
        category: "Communication",
        template: "Write a professional email. From: {sender}. To: {recipient}. Purpose: \
{purpose}. Key points to cover: {points}. Tone: {tone}. Include an appropriate subject \
line, greeting, body, and sign-off.",
    },
    PromptTemplate {
        id: "research",
        title: "Research Summary",
        category: "Research",
        template: "Provide a comprehensive research summary on {topic}. Cover background and \
context, the current state of knowledge, key findings, controversies and debates, future \
directions, and practical implications.",
    },
];

pub fn builtin_templates() -> &'static [PromptTemplate] {
    TEMPLATES
}

/// Find a template by id (case-insensitive).
pub fn find_template(id: &str) -> Option<&'static PromptTemplate> {
    TEMPLATES.iter().find(|t| t.id.eq_ignore_ascii_case(id))
}

/// Placeholder names appearing as `{name}` in a template, in order of first
/// appearance and without duplicates.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rest = &rest[open + 1..];
        let Some(close) = rest.find('}') else { break };
        let name = &rest[..close];
        if !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !names.contains(&name)
        {
            names.push(name);
        }
        rest = &rest[close + 1..];
    }
    names
}
