//! Aggregate statistics across every session in the store, surfaced by the
//! `/stats` command.

use std::collections::HashMap;

use crate::core::session::SessionStore;

/// Number of most-frequent user words reported.
const TOP_WORD_LIMIT: usize = 10;
/// Shorter words are too common to be interesting.
const MIN_WORD_CHARS: usize = 5;

#[derive(Debug, Default)]
pub struct Analytics {
    pub total_sessions: usize,
    pub total_messages: usize,
    pub total_words: usize,
    pub estimated_tokens: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub longest_message_chars: usize,
    /// Most frequent substantive words from user turns, ranked by count.
    pub top_words: Vec<(String, usize)>,
}

impl Analytics {
    pub fn average_session_length(&self) -> f64 {
        if self.total_sessions == 0 {
            0.0
        } else {
            self.total_messages as f64 / self.total_sessions as f64
        }
    }

    /// Multi-line summary rendered as an info banner in the transcript.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Session statistics:".to_string(),
            format!(
                "  {} session(s), {} message(s) ({} from you, {} from HEXALOY)",
                self.total_sessions, self.total_messages, self.user_messages,
                self.assistant_messages
            ),
            format!(
                "  {} words, ~{} tokens, longest message {} chars",
                self.total_words, self.estimated_tokens, self.longest_message_chars
            ),
            format!(
                "  average session length: {:.1} message(s)",
                self.average_session_length()
            ),
        ];
        if !self.top_words.is_empty() {
            let words: Vec<String> = self
                .top_words
                .iter()
                .map(|(word, count)| format!("{word} ({count})"))
                .collect();
            lines.push(format!("  frequent words: {}", words.join(", ")));
        }
        lines.join("\n")
    }
}

/// Walk every conversation turn in every session. App banners are not
/// counted. The token estimate uses the rough four-chars-per-token heuristic.
pub fn compute_analytics(store: &SessionStore) -> Analytics {
    let mut analytics = Analytics::default();
    let mut word_freq: HashMap<String, usize> = HashMap::new();

    for session in store.sessions() {
        analytics.total_sessions += 1;
        for turn in &session.turns {
            if !turn.is_conversation() {
                continue;
            }
            analytics.total_messages += 1;
            let chars = turn.content.chars().count();
            analytics.estimated_tokens += chars / 4;
            analytics.longest_message_chars = analytics.longest_message_chars.max(chars);

            let words = turn.content.split_whitespace();
            if turn.is_user() {
                analytics.user_messages += 1;
                for word in words {
                    analytics.total_words += 1;
                    let clean: String = word
                        .to_lowercase()
                        .chars()
                        .filter(|c| c.is_alphanumeric())
                        .collect();
                    if clean.chars().count() >= MIN_WORD_CHARS {
                        *word_freq.entry(clean).or_insert(0) += 1;
                    }
                }
            } else {
                analytics.assistant_messages += 1;
                analytics.total_words += words.count();
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = word_freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_WORD_LIMIT);
    analytics.top_words = ranked;
    analytics
}
