//! The local live view: match state keyed by match id.
//!
//! The board is the subscriber side's working copy of every match it has
//! heard about. Because feed delivery is at-least-once and unordered
//! across matches, the merge is a **full-state replace by id**: each
//! incoming [`MatchUpdate`] overwrites only the record it names and
//! touches nothing else. Applying the same update twice leaves the board
//! visibly identical - counters are never bumped client-side, scores and
//! minutes always come whole from the publisher.

use matchday_core::types::{MatchId, MatchState, MatchStatus, MatchUpdate};
use std::collections::HashMap;

/// Presentation state derived from a match's status.
///
/// Computed on demand for the UI layer (pulsing LIVE badge vs static
/// kickoff time); never persisted, never transmitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayPhase {
    /// Scheduled, show kickoff time
    Upcoming,
    /// In play, pulse the live badge
    LivePulse,
    /// Half-time interval
    Paused,
    /// Finished, postponed, or cancelled
    Ended,
}

impl DisplayPhase {
    /// Derive the display phase for a state snapshot.
    #[must_use]
    pub const fn for_state(state: &MatchState) -> Self {
        match state.status {
            MatchStatus::Scheduled => Self::Upcoming,
            MatchStatus::Live => Self::LivePulse,
            MatchStatus::HalfTime => Self::Paused,
            MatchStatus::Finished | MatchStatus::Postponed | MatchStatus::Cancelled => Self::Ended,
        }
    }
}

/// Local view of live match state for any number of matches.
#[derive(Debug, Default)]
pub struct MatchBoard {
    matches: HashMap<MatchId, MatchState>,
    stale: bool,
}

impl MatchBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one update into the board.
    ///
    /// Replaces only the record with the update's id; every other match
    /// on the board is untouched. Idempotent: re-applying an update the
    /// board already reflects changes nothing and reports `false`.
    ///
    /// Any applied update also clears the staleness flag - fresh data is
    /// the proof the feed is back.
    pub fn apply(&mut self, update: &MatchUpdate) -> bool {
        self.stale = false;
        let id = update.state.id;
        let changed = self.matches.get(&id) != Some(&update.state);
        if changed {
            metrics::counter!("liveboard_updates_applied_total").increment(1);
            tracing::debug!(
                match_id = %id,
                status = %update.state.status,
                minute = update.state.current_minute,
                "board updated"
            );
            self.matches.insert(id, update.state.clone());
        }
        changed
    }

    /// The current snapshot for a match, if the board has heard of it.
    #[must_use]
    pub fn get(&self, id: MatchId) -> Option<&MatchState> {
        self.matches.get(&id)
    }

    /// All known matches, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &MatchState> {
        self.matches.values()
    }

    /// Number of matches on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether the board has heard of no matches yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Flag the board as possibly stale (feed lost).
    ///
    /// The last-known snapshots stay visible; the flag only tells the UI
    /// to indicate that what it shows may be behind.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Whether the feed has been lost since the last applied update.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn update(id: MatchId, minute: u32) -> MatchUpdate {
        let mut state = MatchState::scheduled(id);
        state.status = MatchStatus::Live;
        state.current_minute = minute;
        state.timer_running = true;
        MatchUpdate::new(state, Utc::now())
    }

    // Scenario: an update arrives, then a stale duplicate of the same
    // event arrives. The displayed minute is unchanged after both.
    #[test]
    fn duplicate_delivery_changes_nothing() {
        let mut board = MatchBoard::new();
        let id = MatchId::new();
        let event = update(id, 10);

        assert!(board.apply(&event));
        let after_first = board.get(id).cloned();

        assert!(!board.apply(&event));
        assert_eq!(board.get(id).cloned(), after_first);
        assert_eq!(board.get(id).map(|s| s.current_minute), Some(10));
    }

    #[test]
    fn merge_replaces_only_the_named_match() {
        let mut board = MatchBoard::new();
        let (first, second) = (MatchId::new(), MatchId::new());
        board.apply(&update(first, 30));
        board.apply(&update(second, 5));

        board.apply(&update(first, 31));

        assert_eq!(board.get(first).map(|s| s.current_minute), Some(31));
        assert_eq!(board.get(second).map(|s| s.current_minute), Some(5));
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn applied_update_clears_staleness() {
        let mut board = MatchBoard::new();
        let id = MatchId::new();
        board.apply(&update(id, 1));

        board.mark_stale();
        assert!(board.is_stale());
        // Last-known state survives the disconnect
        assert_eq!(board.get(id).map(|s| s.current_minute), Some(1));

        board.apply(&update(id, 2));
        assert!(!board.is_stale());
    }

    #[test]
    fn display_phase_follows_status() {
        let mut state = MatchState::scheduled(MatchId::new());
        assert_eq!(DisplayPhase::for_state(&state), DisplayPhase::Upcoming);

        state.status = MatchStatus::Live;
        assert_eq!(DisplayPhase::for_state(&state), DisplayPhase::LivePulse);

        state.status = MatchStatus::HalfTime;
        assert_eq!(DisplayPhase::for_state(&state), DisplayPhase::Paused);

        state.status = MatchStatus::Finished;
        assert_eq!(DisplayPhase::for_state(&state), DisplayPhase::Ended);
    }

    proptest! {
        /// Applying any event sequence twice ends in the same board as
        /// applying it once: the merge is idempotent under redelivery.
        #[test]
        fn replaying_a_sequence_is_idempotent(
            minutes in prop::collection::vec(0_u32..130, 1..30)
        ) {
            let id = MatchId::new();
            let events: Vec<MatchUpdate> =
                minutes.iter().map(|m| update(id, *m)).collect();

            let mut once = MatchBoard::new();
            for event in &events {
                once.apply(event);
            }

            let mut twice = MatchBoard::new();
            for event in &events {
                twice.apply(event);
            }
            for event in &events {
                twice.apply(event);
            }

            // The final visible state is what the last event said, in
            // both worlds.
            prop_assert_eq!(
                once.get(id).map(|s| s.current_minute),
                minutes.last().copied()
            );
            prop_assert_eq!(once.get(id), twice.get(id));
        }
    }
}
