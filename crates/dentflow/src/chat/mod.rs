//! One chat per order: provisioning, participants, archive and delete.

pub mod manager;
pub mod participants;

pub use manager::ChatManager;
pub use participants::{merge_participant, normalize, ParticipantDiff, ParticipantMatcher};
