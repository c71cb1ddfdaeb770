//! In-memory session store.
//!
//! A session is a named, ordered conversation thread. The store owns every
//! session for the lifetime of the process, tracks exactly one current
//! session, and guarantees unique session names. Nothing here touches disk.

use crate::core::constants::{
    HISTORY_CHAR_BUDGET, HISTORY_TURN_LIMIT, SEARCH_RESULT_LIMIT, SESSION_NAME_BUDGET,
    SESSION_NAME_WORDS, SESSION_PLACEHOLDER_PREFIX,
};
use crate::core::message::{Turn, TurnRole};

#[derive(Debug, Clone)]
pub struct Session {
    pub name: String,
    pub turns: Vec<Turn>,
    /// Monotonic creation ordinal, used to pick the most recently created
    /// session when the current one goes away.
    created_seq: u64,
}

impl Session {
    fn new(name: String, created_seq: u64) -> Self {
        Self {
            name,
            turns: Vec::new(),
            created_seq,
        }
    }

    /// Number of user/assistant turns, ignoring app banners.
    pub fn conversation_len(&self) -> usize {
        self.turns.iter().filter(|t| t.is_conversation()).count()
    }

    /// Trailing window of conversation turns forwarded to an engine: at most
    /// the last `HISTORY_TURN_LIMIT` user/assistant turns, further trimmed
    /// from the front until total content fits `HISTORY_CHAR_BUDGET`.
    pub fn trimmed_history(&self) -> Vec<&Turn> {
        let conversation: Vec<&Turn> =
            self.turns.iter().filter(|t| t.is_conversation()).collect();

        let start = conversation.len().saturating_sub(HISTORY_TURN_LIMIT);
        let mut window = conversation[start..].to_vec();

        let mut total_chars: usize = window.iter().map(|t| t.content.len()).sum();
        while window.len() > 1 && total_chars > HISTORY_CHAR_BUDGET {
            let removed = window.remove(0);
            total_chars -= removed.content.len();
        }

        window
    }
}

/// One search hit: where the match was found and a snippet around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub session: String,
    pub turn_index: usize,
    pub role: TurnRole,
    pub snippet: String,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: Vec<Session>,
    current: usize,
    next_seq: u64,
}

impl SessionStore {
    /// Create a store holding a single empty placeholder session.
    pub fn new() -> Self {
        let mut store = Self {
            sessions: Vec::new(),
            current: 0,
            next_seq: 0,
        };
        store.create_session();
        store
    }

    /// Insert a new empty session with a generated placeholder name and make
    /// it current. Returns the new session's name.
    pub fn create_session(&mut self) -> String {
        let name = self.unique_name(&format!(
            "{} {}",
            SESSION_PLACEHOLDER_PREFIX,
            self.sessions.len() + 1
        ));
        let seq = self.next_seq;
        self.next_seq += 1;
        self.sessions.push(Session::new(name.clone(), seq));
        self.current = self.sessions.len() - 1;
        name
    }

    pub fn current(&self) -> &Session {
        &self.sessions[self.current]
    }

    pub fn current_name(&self) -> &str {
        &self.sessions[self.current].name
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.name == name)
    }

    /// Make the named session current. No effect on its turns.
    pub fn select_session(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(idx) => {
                self.current = idx;
                true
            }
            None => false,
        }
    }

    /// Whether the named session may be deleted: it must exist, must not be
    /// current, and must hold at least one turn.
    pub fn can_delete(&self, name: &str) -> bool {
        match self.index_of(name) {
            Some(idx) => idx != self.current && !self.sessions[idx].turns.is_empty(),
            None => false,
        }
    }

    /// Remove the named session. Violating the delete guard is a no-op
    /// (surfaced to the UI as a disabled action, not an error). If the
    /// current pointer is displaced by the removal it is re-aimed at the
    /// most recently created remaining session; an empty store gets a fresh
    /// placeholder.
    pub fn delete_session(&mut self, name: &str) -> bool {
        if !self.can_delete(name) {
            return false;
        }
        let idx = self.index_of(name).expect("guard checked existence");
        let current_name = self.sessions[self.current].name.clone();
        self.sessions.remove(idx);

        if self.sessions.is_empty() {
            self.create_session();
        } else {
            self.current = match self.index_of(&current_name) {
                Some(i) => i,
                None => self.most_recently_created(),
            };
        }
        true
    }

    fn most_recently_created(&self) -> usize {
        self.sessions
            .iter()
            .enumerate()
            .max_by_key(|(_, s)| s.created_seq)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Append a turn to the named session.
    pub fn append_turn(&mut self, name: &str, turn: Turn) -> bool {
        match self.index_of(name) {
            Some(idx) => {
                self.sessions[idx].turns.push(turn);
                true
            }
            None => false,
        }
    }

    /// Append a turn to the current session.
    pub fn append_to_current(&mut self, turn: Turn) {
        self.sessions[self.current].turns.push(turn);
    }

    /// If the session still carries its initial placeholder name and has no
    /// turns, rename it after the first user message. Derived names that
    /// collide with an existing session get a numeric suffix. Returns the
    /// new name when a rename happened.
    pub fn rename_if_placeholder(&mut self, name: &str, first_message: &str) -> Option<String> {
        let idx = self.index_of(name)?;
        if !is_placeholder_name(&self.sessions[idx].name) || !self.sessions[idx].turns.is_empty() {
            return None;
        }
        let derived = self.unique_name(&derive_session_name(first_message));
        self.sessions[idx].name = derived.clone();
        Some(derived)
    }

    fn unique_name(&self, candidate: &str) -> String {
        if self.index_of(candidate).is_none() {
            return candidate.to_string();
        }
        let mut n = 2;
        loop {
            let suffixed = format!("{candidate} ({n})");
            if self.index_of(&suffixed).is_none() {
                return suffixed;
            }
            n += 1;
        }
    }

    /// Case-insensitive substring search across all sessions, capped at
    /// `SEARCH_RESULT_LIMIT` hits.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.len() < 2 {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        let mut hits = Vec::new();

        'outer: for session in &self.sessions {
            for (i, turn) in session.turns.iter().enumerate() {
                if !turn.is_conversation() {
                    continue;
                }
                let haystack = turn.content.to_lowercase();
                if let Some(pos) = haystack.find(&needle) {
                    let (start, match_len) =
                        map_lowered_range(&turn.content, pos, needle.len());
                    hits.push(SearchHit {
                        session: session.name.clone(),
                        turn_index: i,
                        role: turn.role,
                        snippet: snippet_around(&turn.content, start, match_len),
                    });
                    if hits.len() >= SEARCH_RESULT_LIMIT {
                        break 'outer;
                    }
                }
            }
        }
        hits
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// True for names matching the initial placeholder pattern "Session N".
pub fn is_placeholder_name(name: &str) -> bool {
    name.strip_prefix(SESSION_PLACEHOLDER_PREFIX)
        .and_then(|rest| rest.strip_prefix(' '))
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Derive a session name from the leading words of the first user message,
/// truncated to the name budget on a char boundary.
pub fn derive_session_name(message: &str) -> String {
    let words: Vec<&str> = message.split_whitespace().take(SESSION_NAME_WORDS).collect();
    let mut name = words.join(" ");
    if name.is_empty() {
        name = format!("{SESSION_PLACEHOLDER_PREFIX} 1");
        return name;
    }

    let truncated_here = message.split_whitespace().count() > SESSION_NAME_WORDS;
    if name.chars().count() > SESSION_NAME_BUDGET {
        name = name.chars().take(SESSION_NAME_BUDGET).collect();
        name = name.trim_end().to_string();
    }
    if truncated_here || name.len() < words.join(" ").len() {
        name.push('…');
    }
    name
}

/// Map a byte range found in the lowercased copy of `content` back to byte
/// offsets in `content` itself. Case mapping can change a char's UTF-8
/// length, so offsets are walked char by char.
fn map_lowered_range(content: &str, lowered_start: usize, lowered_len: usize) -> (usize, usize) {
    let lowered_end = lowered_start + lowered_len;
    let mut lowered_pos = 0;
    let mut start = 0;
    let mut end = content.len();
    for (orig_pos, c) in content.char_indices() {
        if lowered_pos <= lowered_start {
            start = orig_pos;
        }
        if lowered_pos >= lowered_end {
            end = orig_pos;
            break;
        }
        lowered_pos += c.to_lowercase().map(char::len_utf8).sum::<usize>();
    }
    (start, end.saturating_sub(start))
}

fn snippet_around(content: &str, pos: usize, match_len: usize) -> String {
    let start = floor_char_boundary(content, pos.saturating_sub(60));
    let end = ceil_char_boundary(content, (pos + match_len + 120).min(content.len()));
    let mut snippet = String::new();
    if start > 0 {
        snippet.push('…');
    }
    snippet.push_str(&content[start..end]);
    if end < content.len() {
        snippet.push('…');
    }
    snippet
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
