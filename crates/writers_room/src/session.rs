//! Per-channel session state and the turn state machine.
//!
//! Everything here is synchronous and platform-free. The async controllers
//! decide *when* to move a session forward; this module decides *whether*
//! the move is legal and what the next state is.

use crate::{ChannelId, UserId};
use derive_getters::Getters;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use writers_room_error::{SessionError, SessionErrorKind, SessionResult};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum SessionPhase {
    /// Waiting for the initiator to pick a prompt
    SelectingPrompt,
    /// Prompt chosen, turn order not yet drawn
    AwaitingTurnOrderInit,
    /// The next writer is drawn but channel access has not moved yet
    TurnPending(UserId),
    /// One participant holds the pen
    TurnInProgress(UserId),
    /// Every participant has written
    Complete,
    /// The flow stopped before the story was finished
    Abandoned,
}

/// Outcome of moving to the next turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAdvance {
    /// The given participant writes next
    Writer(UserId),
    /// The turn order is exhausted
    Complete,
}

/// One collaborative story bound to its private channel.
#[derive(Debug, Clone, Getters)]
pub struct Session {
    /// Channel the story is written in
    channel: ChannelId,
    /// Channel name, used as the story's header when shared
    name: String,
    /// User who started the session
    initiator: UserId,
    /// Roster in join order, initiator first
    participants: Vec<UserId>,
    /// Writers still to take a turn
    turn_order: VecDeque<UserId>,
    /// Submitted text, one entry per finished turn
    contributions: Vec<String>,
    /// Story prompt, set once
    prompt: Option<String>,
    /// Lifecycle phase
    phase: SessionPhase,
}

impl Session {
    /// Create a session for a freshly formed roster.
    ///
    /// The initiator is moved to the front of the roster if the caller did
    /// not already put them there.
    pub fn new(
        channel: ChannelId,
        name: impl Into<String>,
        initiator: UserId,
        participants: Vec<UserId>,
    ) -> Self {
        let mut roster = Vec::with_capacity(participants.len() + 1);
        roster.push(initiator);
        roster.extend(participants.into_iter().filter(|u| *u != initiator));

        Self {
            channel,
            name: name.into(),
            initiator,
            participants: roster,
            turn_order: VecDeque::new(),
            contributions: Vec::new(),
            prompt: None,
            phase: SessionPhase::SelectingPrompt,
        }
    }

    /// The participant currently allowed to write, if any.
    pub fn current_writer(&self) -> Option<UserId> {
        match self.phase {
            SessionPhase::TurnInProgress(writer) => Some(writer),
            _ => None,
        }
    }

    /// Whether every participant has written.
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    /// Record the prompt and make the session ready for writing.
    ///
    /// # Errors
    ///
    /// Returns `PromptAlreadySet` if a prompt was already recorded, or
    /// `InvalidState` if the session is no longer selecting a prompt.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> SessionResult<()> {
        if self.prompt.is_some() {
            return Err(SessionError::new(SessionErrorKind::PromptAlreadySet));
        }
        if self.phase != SessionPhase::SelectingPrompt {
            return Err(SessionError::new(SessionErrorKind::InvalidState(format!(
                "cannot set prompt while {}",
                self.phase
            ))));
        }
        self.prompt = Some(prompt.into());
        self.phase = SessionPhase::AwaitingTurnOrderInit;
        Ok(())
    }

    /// Draw the turn order and queue up the first writer.
    ///
    /// The writer does not hold the pen until [`Session::start_turn`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the prompt was just set.
    pub fn begin_writing<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SessionResult<TurnAdvance> {
        if self.phase != SessionPhase::AwaitingTurnOrderInit {
            return Err(SessionError::new(SessionErrorKind::InvalidState(format!(
                "cannot start writing while {}",
                self.phase
            ))));
        }
        let mut order = self.participants.clone();
        order.shuffle(rng);
        self.turn_order = order.into();
        Ok(self.advance())
    }

    /// Accept the current writer's text and queue up the next writer.
    ///
    /// # Errors
    ///
    /// Returns `UnauthorizedAction` if `author` does not hold the pen.
    pub fn record_contribution(
        &mut self,
        author: UserId,
        content: impl Into<String>,
    ) -> SessionResult<TurnAdvance> {
        match self.phase {
            SessionPhase::TurnInProgress(writer) if writer == author => {
                self.contributions.push(content.into());
                Ok(self.advance())
            }
            _ => Err(SessionError::new(SessionErrorKind::UnauthorizedAction(
                format!("{} is not the current writer", author),
            ))),
        }
    }

    /// Hand the pen to the queued writer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless a writer is pending.
    pub fn start_turn(&mut self) -> SessionResult<UserId> {
        match self.phase {
            SessionPhase::TurnPending(writer) => {
                self.phase = SessionPhase::TurnInProgress(writer);
                Ok(writer)
            }
            other => Err(SessionError::new(SessionErrorKind::InvalidState(format!(
                "cannot start a turn while {}",
                other
            )))),
        }
    }

    /// Mark the session as stopped before completion.
    pub fn abandon(&mut self) {
        if self.phase != SessionPhase::Complete {
            self.phase = SessionPhase::Abandoned;
        }
    }

    /// Text shown to the next writer: the prompt plus the latest contribution.
    pub fn instructions(&self) -> Option<String> {
        let prompt = self.prompt.as_ref()?;
        Some(match self.contributions.last() {
            Some(previous) => format!("{}\n{}", prompt, previous),
            None => prompt.clone(),
        })
    }

    /// The assembled story, available once every participant has written.
    pub fn final_text(&self) -> Option<String> {
        if !self.is_complete() {
            return None;
        }
        let prompt = self.prompt.as_ref()?;
        Some(format!("{}\n{}", prompt, self.contributions.join("\n")))
    }

    fn advance(&mut self) -> TurnAdvance {
        match self.turn_order.pop_front() {
            Some(writer) => {
                self.phase = SessionPhase::TurnPending(writer);
                TurnAdvance::Writer(writer)
            }
            None => {
                self.phase = SessionPhase::Complete;
                TurnAdvance::Complete
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const A: UserId = UserId::new(1);
    const B: UserId = UserId::new(2);
    const C: UserId = UserId::new(3);

    fn session(roster: Vec<UserId>) -> Session {
        Session::new(ChannelId::new(100), "writing-session-alice", A, roster)
    }

    fn writing(roster: Vec<UserId>, seed: u64) -> (Session, TurnAdvance) {
        let mut s = session(roster);
        s.set_prompt("It was a dark and stormy night.").expect("prompt");
        let first = s
            .begin_writing(&mut StdRng::seed_from_u64(seed))
            .expect("begin");
        (s, first)
    }

    fn contribute(s: &mut Session, writer: UserId, text: &str) -> TurnAdvance {
        s.start_turn().expect("writer pending");
        s.record_contribution(writer, text).expect("writer accepted")
    }

    #[test]
    fn initiator_leads_the_roster() {
        let s = session(vec![B, A, C]);
        assert_eq!(s.participants(), &vec![A, B, C]);
        assert_eq!(s.phase(), &SessionPhase::SelectingPrompt);
        assert_eq!(s.current_writer(), None);
    }

    #[test]
    fn prompt_can_only_be_set_once() {
        let mut s = session(vec![A, B]);
        s.set_prompt("first").expect("prompt");
        let err = s.set_prompt("second").unwrap_err();
        assert_eq!(err.kind, SessionErrorKind::PromptAlreadySet);
        assert_eq!(s.prompt().as_deref(), Some("first"));
    }

    #[test]
    fn writing_requires_a_prompt() {
        let mut s = session(vec![A, B]);
        let err = s.begin_writing(&mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err.kind, SessionErrorKind::InvalidState(_)));
        assert!(s.turn_order().is_empty());
    }

    #[test]
    fn turn_order_is_a_permutation_of_the_roster() {
        for seed in 0..32 {
            let (s, first) = writing(vec![A, B, C], seed);
            let TurnAdvance::Writer(writer) = first else {
                panic!("expected a writer");
            };
            let mut drawn: Vec<UserId> = std::iter::once(writer)
                .chain(s.turn_order().iter().copied())
                .collect();
            drawn.sort();
            assert_eq!(drawn, vec![A, B, C]);
            assert_eq!(s.phase(), &SessionPhase::TurnPending(writer));
        }
    }

    #[test]
    fn nobody_holds_the_pen_between_turns() {
        let (mut s, first) = writing(vec![A, B], 4);
        let TurnAdvance::Writer(w1) = first else {
            panic!("expected a writer");
        };
        assert_eq!(s.current_writer(), None);
        assert!(s.record_contribution(w1, "too early").is_err());

        assert_eq!(s.start_turn().expect("pending"), w1);
        assert_eq!(s.current_writer(), Some(w1));
        let err = s.start_turn().unwrap_err();
        assert!(matches!(err.kind, SessionErrorKind::InvalidState(_)));

        let TurnAdvance::Writer(w2) = s.record_contribution(w1, "One.").expect("turn 1") else {
            panic!("expected a writer");
        };
        assert_ne!(w1, w2);
        assert_eq!(s.current_writer(), None);
        assert_eq!(s.phase(), &SessionPhase::TurnPending(w2));
    }

    #[test]
    fn contributions_and_turn_order_move_in_lockstep() {
        let (mut s, mut turn) = writing(vec![A, B, C], 9);
        let mut realized = Vec::new();
        while let TurnAdvance::Writer(writer) = turn {
            let before = s.turn_order().len() + s.contributions().len();
            realized.push(writer);
            turn = contribute(&mut s, writer, &format!("line by {}", writer));
            let after = s.turn_order().len() + s.contributions().len();
            assert!(after == before || (turn == TurnAdvance::Complete && after == before + 1));
            assert!(s.contributions().len() <= s.participants().len());
        }

        assert!(s.is_complete());
        assert_eq!(s.current_writer(), None);
        for (i, writer) in realized.iter().enumerate() {
            assert_eq!(s.contributions()[i], format!("line by {}", writer));
        }
    }

    #[test]
    fn only_the_current_writer_may_contribute() {
        let (mut s, first) = writing(vec![A, B], 3);
        let TurnAdvance::Writer(writer) = first else {
            panic!("expected a writer");
        };
        let intruder = if writer == A { B } else { A };
        s.start_turn().expect("pending");

        let err = s.record_contribution(intruder, "not my turn").unwrap_err();
        assert!(matches!(err.kind, SessionErrorKind::UnauthorizedAction(_)));
        assert!(s.contributions().is_empty());
        assert_eq!(s.current_writer(), Some(writer));

        let stranger = UserId::new(77);
        assert!(s.record_contribution(stranger, "hi").is_err());
    }

    #[test]
    fn instructions_show_prompt_and_latest_contribution_only() {
        let (mut s, first) = writing(vec![A, B, C], 5);
        assert_eq!(
            s.instructions().as_deref(),
            Some("It was a dark and stormy night.")
        );

        let TurnAdvance::Writer(w1) = first else {
            panic!("expected a writer");
        };
        let TurnAdvance::Writer(w2) = contribute(&mut s, w1, "One.") else {
            panic!("expected a writer");
        };
        contribute(&mut s, w2, "Two.");
        assert_eq!(
            s.instructions().as_deref(),
            Some("It was a dark and stormy night.\nTwo.")
        );
    }

    #[test]
    fn final_text_is_prompt_then_contributions() {
        let (mut s, first) = writing(vec![A, B], 11);
        let TurnAdvance::Writer(w1) = first else {
            panic!("expected a writer");
        };
        assert_eq!(s.final_text(), None);
        let TurnAdvance::Writer(w2) = contribute(&mut s, w1, "Once upon a time") else {
            panic!("expected a writer");
        };
        assert_eq!(contribute(&mut s, w2, "The end"), TurnAdvance::Complete);
        assert_eq!(
            s.final_text().as_deref(),
            Some("It was a dark and stormy night.\nOnce upon a time\nThe end")
        );
    }

    #[test]
    fn abandon_keeps_completed_sessions_complete() {
        let mut s = session(vec![A]);
        s.abandon();
        assert_eq!(s.phase(), &SessionPhase::Abandoned);

        let (mut done, first) = writing(vec![A], 1);
        assert_eq!(first, TurnAdvance::Writer(A));
        contribute(&mut done, A, "solo");
        done.abandon();
        assert!(done.is_complete());
    }
}
