//! Typed transition events published by the session controller

use crate::core::{Outcome, Side};
use crate::ledger::Move;
use crate::session::phase::SessionPhase;
use crate::stats::Statistics;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged { from: SessionPhase, to: SessionPhase },
    MoveApplied(Move),
    TurnChanged(Side),
    GameOver(Outcome),
    MovesUndone { count: usize },
    /// Replay cursor moved; `cursor` is -1 for the empty board
    ReplayMoved { cursor: isize },
    OracleQueryScheduled { epoch: u64, side: Side },
    StatisticsChanged(Statistics),
    Status(String),
}

/// Receives controller events
///
/// Observers are called synchronously, in subscription order, after the
/// controller has finished mutating its state.
pub trait SessionObserver: Send {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: FnMut(&SessionEvent) + Send,
{
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

/// Observer that stores every event in a shared list
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<SessionEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<SessionEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl SessionObserver for EventRecorder {
    fn on_event(&mut self, event: &SessionEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_shares_events() {
        let recorder = EventRecorder::new();
        let mut handle: Box<dyn SessionObserver> = Box::new(recorder.clone());
        handle.on_event(&SessionEvent::TurnChanged(Side::White));
        handle.on_event(&SessionEvent::MovesUndone { count: 2 });

        assert_eq!(recorder.events().len(), 2);
        assert_eq!(recorder.take()[0], SessionEvent::TurnChanged(Side::White));
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = 0;
        {
            let mut observer = |_: &SessionEvent| seen += 1;
            observer.on_event(&SessionEvent::Status("hi".to_string()));
        }
        assert_eq!(seen, 1);
    }
}
