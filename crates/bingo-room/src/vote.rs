//! Letter votes.
//!
//! ```text
//!   Idle ──start()──→ Active{epoch} ──resolve(epoch)──→ Idle
//! ```
//!
//! Each `start` bumps the epoch. The room actor arms its deadline timer
//! with that epoch and hands it back to [`VoteState::resolve`] when the
//! timer fires, so a firing for an older vote is ignored.

use std::collections::HashSet;

use bingo_protocol::{ClientId, Letter, VoteTally};

use crate::RoomError;

/// Vote state for one room.
#[derive(Debug, Default)]
pub struct VoteState {
    active: bool,
    epoch: u64,
    deadline_ms: u64,
    tally: VoteTally,
    voters: HashSet<ClientId>,
}

impl VoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new vote closing at `deadline_ms` (Unix milliseconds).
    ///
    /// Returns the new epoch.
    pub fn start(&mut self, deadline_ms: u64) -> Result<u64, RoomError> {
        if self.active {
            return Err(RoomError::InvalidState("a vote is already running".into()));
        }
        self.epoch += 1;
        self.active = true;
        self.deadline_ms = deadline_ms;
        self.tally = VoteTally::default();
        self.voters.clear();
        Ok(self.epoch)
    }

    /// Records one vote and returns the updated tally.
    ///
    /// # Errors
    /// - [`RoomError::InvalidState`] if no vote is running
    /// - [`RoomError::AlreadyVoted`] on a second vote from the same client
    pub fn submit(&mut self, client_id: &ClientId, letter: Letter) -> Result<VoteTally, RoomError> {
        if !self.active {
            return Err(RoomError::InvalidState("no vote is running".into()));
        }
        if !self.voters.insert(client_id.clone()) {
            return Err(RoomError::AlreadyVoted);
        }
        self.tally.record(letter);
        Ok(self.tally)
    }

    /// Closes the vote if `epoch` is the one running.
    ///
    /// Returns `None` for stale or already-resolved epochs. Otherwise
    /// returns `Some(winner)`, where `winner` is `None` if nobody voted.
    pub fn resolve(&mut self, epoch: u64) -> Option<Option<Letter>> {
        if !self.active || epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "ignoring stale vote deadline");
            return None;
        }
        let winner = winning_letter(&self.tally);
        self.active = false;
        self.tally = VoteTally::default();
        self.voters.clear();
        Some(winner)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    pub fn tally(&self) -> VoteTally {
        self.tally
    }

    pub fn has_voted(&self, client_id: &ClientId) -> bool {
        self.voters.contains(client_id)
    }
}

/// The letter with the most votes. Ties go to the earliest letter in
/// `B I N G O` order. `None` if there are no votes.
pub fn winning_letter(tally: &VoteTally) -> Option<Letter> {
    let mut best: Option<(Letter, u32)> = None;
    for letter in Letter::ALL {
        let count = tally.get(letter);
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((letter, count));
        }
    }
    best.map(|(letter, _)| letter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: &str) -> ClientId {
        ClientId::parse(id).unwrap()
    }

    #[test]
    fn test_start_bumps_epoch_and_rejects_overlap() {
        let mut v = VoteState::new();
        assert_eq!(v.start(1000).unwrap(), 1);
        assert!(v.is_active());
        assert!(matches!(v.start(2000), Err(RoomError::InvalidState(_))));
        assert_eq!(v.epoch(), 1);
        assert_eq!(v.deadline_ms(), 1000);
    }

    #[test]
    fn test_submit_requires_active_vote() {
        let mut v = VoteState::new();
        assert!(matches!(
            v.submit(&cid("a"), Letter::B),
            Err(RoomError::InvalidState(_))
        ));
    }

    #[test]
    fn test_duplicate_vote_does_not_change_tally() {
        let mut v = VoteState::new();
        v.start(0).unwrap();
        v.submit(&cid("a"), Letter::G).unwrap();
        assert!(matches!(
            v.submit(&cid("a"), Letter::O),
            Err(RoomError::AlreadyVoted)
        ));
        v.submit(&cid("b"), Letter::O).unwrap();

        let tally = v.tally();
        assert_eq!(tally.get(Letter::G), 1);
        assert_eq!(tally.get(Letter::O), 1);
        assert_eq!(tally.total(), 2);
        assert!(v.has_voted(&cid("a")));
    }

    #[test]
    fn test_resolve_ignores_stale_epoch() {
        let mut v = VoteState::new();
        let first = v.start(0).unwrap();
        assert!(v.resolve(first).is_some());
        let second = v.start(0).unwrap();

        assert_eq!(v.resolve(first), None);
        assert!(v.is_active());
        assert!(v.resolve(second).is_some());
        assert_eq!(v.resolve(second), None);
    }

    #[test]
    fn test_resolve_resets_state() {
        let mut v = VoteState::new();
        let epoch = v.start(0).unwrap();
        v.submit(&cid("a"), Letter::N).unwrap();
        assert_eq!(v.resolve(epoch), Some(Some(Letter::N)));
        assert!(!v.is_active());
        assert_eq!(v.tally().total(), 0);
        assert!(!v.has_voted(&cid("a")));
    }

    #[test]
    fn test_winning_letter_zero_votes() {
        assert_eq!(winning_letter(&VoteTally::default()), None);
    }

    #[test]
    fn test_winning_letter_strict_max() {
        let mut t = VoteTally::default();
        t.record(Letter::I);
        t.record(Letter::O);
        t.record(Letter::O);
        assert_eq!(winning_letter(&t), Some(Letter::O));
    }

    #[test]
    fn test_winning_letter_tie_goes_to_earliest() {
        let mut t = VoteTally::default();
        t.record(Letter::O);
        t.record(Letter::G);
        t.record(Letter::I);
        assert_eq!(winning_letter(&t), Some(Letter::I));
    }
}
