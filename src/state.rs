//! Presentation state: which panel is open and whether it is busy.
//!
//! Two small state machines, both owned by the front-end's [`Session`] and
//! passed down to the submitter rather than living in globals:
//!
//! ```text
//! submit:      Idle ──try_begin()──▶ Busy ──guard dropped──▶ Idle
//! navigation:  None ──select(op)───▶ Tool(op) ──back()────▶ None
//! ```
//!
//! The busy flag is released by dropping a [`BusyGuard`], so every way out
//! of a submission (success, server failure, fault, panic) clears it once.

use crate::operation::Operation;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether a panel has a request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    Busy,
}

/// Single-flight flag for one panel.
#[derive(Debug, Default)]
pub struct SubmitFlag {
    busy: AtomicBool,
}

impl SubmitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        if self.busy.load(Ordering::SeqCst) {
            RequestState::Busy
        } else {
            RequestState::Idle
        }
    }

    /// Move Idle → Busy. Returns `None` if a request is already in flight.
    pub fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard { flag: self })
    }
}

/// Holds a panel in [`RequestState::Busy`] until dropped.
#[must_use = "the panel returns to Idle as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a SubmitFlag,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::SeqCst);
    }
}

/// The visible tool panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    #[default]
    None,
    Tool(Operation),
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Panel::None => f.write_str("home"),
            Panel::Tool(op) => write!(f, "{op}"),
        }
    }
}

/// Panel selection with a back-stack.
///
/// Each `select` records one history entry; `back` consumes one entry and
/// returns to [`Panel::None`] without ending the session.
#[derive(Debug, Default)]
pub struct Navigator {
    active: Panel,
    history: Vec<Operation>,
}

impl Navigator {
    pub fn active(&self) -> Panel {
        self.active
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn select(&mut self, op: Operation) {
        self.history.push(op);
        self.active = Panel::Tool(op);
    }

    /// Returns `false` (and changes nothing) when there is no history.
    pub fn back(&mut self) -> bool {
        if self.history.pop().is_some() {
            self.active = Panel::None;
            true
        } else {
            false
        }
    }
}

/// Everything a front-end keeps between submissions.
#[derive(Debug, Default)]
pub struct Session {
    pub navigator: Navigator,
    flags: [SubmitFlag; 5],
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single-flight flag of `op`'s panel.
    pub fn flag(&self, op: Operation) -> &SubmitFlag {
        let idx = Operation::ALL
            .iter()
            .position(|o| *o == op)
            .unwrap_or_default();
        &self.flags[idx]
    }

    /// True while any panel has a request in flight.
    pub fn is_busy(&self) -> bool {
        self.flags.iter().any(|f| f.state() == RequestState::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_toggles_state() {
        let flag = SubmitFlag::new();
        assert_eq!(flag.state(), RequestState::Idle);
        {
            let _guard = flag.try_begin().expect("idle flag must start");
            assert_eq!(flag.state(), RequestState::Busy);
            assert!(flag.try_begin().is_none(), "second submit must be refused");
        }
        assert_eq!(flag.state(), RequestState::Idle);
        assert!(flag.try_begin().is_some());
    }

    #[test]
    fn guard_releases_on_panic() {
        let flag = SubmitFlag::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = flag.try_begin().unwrap();
            panic!("fault during submission");
        }));
        assert!(result.is_err());
        assert_eq!(flag.state(), RequestState::Idle);
    }

    #[test]
    fn select_then_back_returns_home() {
        let mut nav = Navigator::default();
        assert_eq!(nav.active(), Panel::None);

        nav.select(Operation::Split);
        assert_eq!(nav.active(), Panel::Tool(Operation::Split));
        assert_eq!(nav.history_len(), 1);

        assert!(nav.back());
        assert_eq!(nav.active(), Panel::None);
        assert!(!nav.back(), "no history left");
        assert_eq!(nav.active(), Panel::None);
    }

    #[test]
    fn each_select_pushes_one_entry() {
        let mut nav = Navigator::default();
        nav.select(Operation::Merge);
        nav.select(Operation::Ocr);
        assert_eq!(nav.history_len(), 2);
        assert!(nav.back());
        assert_eq!(nav.active(), Panel::None);
        assert_eq!(nav.history_len(), 1);
    }

    #[test]
    fn session_flags_are_per_panel() {
        let session = Session::new();
        let _merge = session.flag(Operation::Merge).try_begin().unwrap();
        assert!(session.is_busy());
        assert_eq!(session.flag(Operation::Split).state(), RequestState::Idle);
        assert!(session.flag(Operation::Merge).try_begin().is_none());
    }

    #[test]
    fn panel_display() {
        assert_eq!(Panel::None.to_string(), "home");
        assert_eq!(Panel::Tool(Operation::ToDocx).to_string(), "to-docx");
    }
}
