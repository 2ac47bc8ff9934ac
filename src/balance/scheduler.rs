//! Debounced layout-check scheduling.
//!
//! The editor receives a flood of content-changed events during rapid
//! typing. Running a measurement pass per keystroke would be wasteful,
//! so checks are coalesced: at most one pending check per kind, and each
//! new edit replaces the pending one ("latest wins") and pushes the due
//! time out by the debounce interval.
//!
//! Time is an injected millisecond value — the host clock in production,
//! a virtual clock in tests. [`CheckScheduler::take_due`] drains checks
//! in fixed precedence, overflow before underflow, so resolution order
//! is a property of the scheduler rather than of call-site sequencing.

/// The two named layout checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Overflow,
    Underflow,
}

/// A due check: which rule to run, against which sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    pub kind: CheckKind,
    pub sheet: usize,
}

/// Default debounce interval, matching the editor's input coalescing.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Clone, Copy)]
struct Pending {
    sheet: usize,
    due_at: u64,
}

/// Coalescing scheduler with one pending slot per check kind.
#[derive(Debug, Clone, Default)]
pub struct CheckScheduler {
    debounce_ms: u64,
    overflow: Option<Pending>,
    underflow: Option<Pending>,
}

impl CheckScheduler {
    pub fn new() -> CheckScheduler {
        CheckScheduler::with_debounce(DEFAULT_DEBOUNCE_MS)
    }

    pub fn with_debounce(debounce_ms: u64) -> CheckScheduler {
        CheckScheduler { debounce_ms, overflow: None, underflow: None }
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    /// Record a content change on `sheet`: both check kinds are re-armed
    /// at `now + debounce`, replacing anything pending.
    pub fn note_edit(&mut self, sheet: usize, now: u64) {
        self.arm(CheckKind::Overflow, sheet, now);
        self.arm(CheckKind::Underflow, sheet, now);
    }

    /// Arm a single check kind, replacing any pending check of that kind.
    pub fn arm(&mut self, kind: CheckKind, sheet: usize, now: u64) {
        let pending = Some(Pending { sheet, due_at: now + self.debounce_ms });
        match kind {
            CheckKind::Overflow => self.overflow = pending,
            CheckKind::Underflow => self.underflow = pending,
        }
    }

    /// Drain every check due at `now`, overflow first.
    pub fn take_due(&mut self, now: u64) -> Vec<Check> {
        let mut due = Vec::new();
        if let Some(p) = self.overflow {
            if p.due_at <= now {
                due.push(Check { kind: CheckKind::Overflow, sheet: p.sheet });
                self.overflow = None;
            }
        }
        if let Some(p) = self.underflow {
            if p.due_at <= now {
                due.push(Check { kind: CheckKind::Underflow, sheet: p.sheet });
                self.underflow = None;
            }
        }
        due
    }

    pub fn has_pending(&self) -> bool {
        self.overflow.is_some() || self.underflow.is_some()
    }

    /// Cancel everything. Called on editor teardown so no stale check
    /// ever runs against a torn-down document.
    pub fn clear(&mut self) {
        self.overflow = None;
        self.underflow = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_is_due_before_the_debounce_elapses() {
        let mut s = CheckScheduler::with_debounce(100);
        s.note_edit(0, 1000);
        assert!(s.take_due(1099).is_empty());
        assert_eq!(s.take_due(1100).len(), 2);
        assert!(!s.has_pending());
    }

    #[test]
    fn latest_edit_wins() {
        let mut s = CheckScheduler::with_debounce(100);
        s.note_edit(0, 1000);
        s.note_edit(2, 1050);
        // The first edit's deadline passes without firing.
        assert!(s.take_due(1100).is_empty());
        let due = s.take_due(1150);
        assert_eq!(due.len(), 2);
        assert!(due.iter().all(|c| c.sheet == 2));
    }

    #[test]
    fn overflow_drains_before_underflow() {
        let mut s = CheckScheduler::with_debounce(100);
        s.note_edit(1, 0);
        let due = s.take_due(100);
        assert_eq!(due[0].kind, CheckKind::Overflow);
        assert_eq!(due[1].kind, CheckKind::Underflow);
    }

    #[test]
    fn arming_one_kind_leaves_the_other_alone() {
        let mut s = CheckScheduler::with_debounce(100);
        s.note_edit(0, 0);
        assert_eq!(s.take_due(100).len(), 2);
        s.arm(CheckKind::Underflow, 3, 200);
        let due = s.take_due(300);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0], Check { kind: CheckKind::Underflow, sheet: 3 });
    }

    #[test]
    fn clear_cancels_pending_checks() {
        let mut s = CheckScheduler::new();
        s.note_edit(0, 0);
        s.clear();
        assert!(!s.has_pending());
        assert!(s.take_due(u64::MAX).is_empty());
    }
}
