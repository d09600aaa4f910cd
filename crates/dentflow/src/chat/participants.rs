//! Chat membership tests and participant-list arithmetic.
//!
//! Participants are display names. Two membership policies exist:
//! [`ParticipantMatcher::Fuzzy`] reproduces the lab's historical behaviour
//! (case-insensitive equality or containment in either direction), and
//! [`ParticipantMatcher::Exact`] requires the exact display name.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantMatcher {
    /// "Dr. Smith" matches "dr. smith", "Dr. Smith (QA)" and "Smith".
    /// Can produce false positives: "Jo" matches "Johnson".
    #[default]
    Fuzzy,
    Exact,
}

impl ParticipantMatcher {
    /// Returns true when `user` matches one participant entry.
    pub fn matches(&self, participant: &str, user: &str) -> bool {
        let user = user.trim();
        if user.is_empty() {
            return false;
        }
        match self {
            ParticipantMatcher::Exact => participant == user,
            ParticipantMatcher::Fuzzy => {
                let participant = participant.trim().to_lowercase();
                if participant.is_empty() {
                    return false;
                }
                let user = user.to_lowercase();
                participant == user || participant.contains(&user) || user.contains(&participant)
            }
        }
    }

    /// Returns true when `user` matches any entry of `participants`.
    pub fn is_participant(&self, participants: &[String], user: &str) -> bool {
        participants.iter().any(|p| self.matches(p, user))
    }

    /// Entries of `participants` that `user` matches.
    pub fn matching<'a>(&self, participants: &'a [String], user: &str) -> Vec<&'a str> {
        participants
            .iter()
            .filter(|p| self.matches(p, user))
            .map(String::as_str)
            .collect()
    }
}

/// Appends `name` unless an identical entry exists. Returns true when appended.
pub fn merge_participant(participants: &mut Vec<String>, name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() || participants.iter().any(|p| p == name) {
        return false;
    }
    participants.push(name.to_string());
    true
}

/// Trims entries, drops empties and removes exact duplicates, keeping first
/// occurrence order.
pub fn normalize(list: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(list.len());
    for entry in list {
        merge_participant(&mut out, entry);
    }
    out
}

/// Added and removed entries between two participant lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParticipantDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ParticipantDiff {
    pub fn between(previous: &[String], next: &[String]) -> Self {
        Self {
            added: next
                .iter()
                .filter(|n| !previous.contains(n))
                .cloned()
                .collect(),
            removed: previous
                .iter()
                .filter(|p| !next.contains(p))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
