// SPDX-License-Identifier: MIT

//! How a harness reports a test given its disposition and raw outcome

use serde::Serialize;

use super::rules::{Disposition, DispositionKind};

/// Raw result of running a test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// Reported result after applying a disposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed,
    /// Not executed
    Skipped,
    /// Failed as expected
    XFailed,
    /// Passed although a failure was expected (non-strict)
    XPassed,
    /// Passed although a failure was expected and the mark is strict
    XPassStrict,
}

impl Verdict {
    /// Combine a disposition with the raw outcome
    ///
    /// For `skip` the test never runs, so `outcome` is ignored.
    pub fn decide(disposition: Option<&Disposition>, outcome: TestOutcome) -> Self {
        match (disposition.map(|d| (d.kind, d.strict)), outcome) {
            (None, TestOutcome::Passed) => Verdict::Passed,
            (None, TestOutcome::Failed) => Verdict::Failed,
            (Some((DispositionKind::Skip, _)), _) => Verdict::Skipped,
            (Some((DispositionKind::Xfail, _)), TestOutcome::Failed) => Verdict::XFailed,
            (Some((DispositionKind::Xfail, false)), TestOutcome::Passed) => Verdict::XPassed,
            (Some((DispositionKind::Xfail, true)), TestOutcome::Passed) => Verdict::XPassStrict,
        }
    }

    /// Whether this verdict counts against the run
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Failed | Verdict::XPassStrict)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Passed => "PASSED",
            Verdict::Failed => "FAILED",
            Verdict::Skipped => "SKIPPED",
            Verdict::XFailed => "XFAIL",
            Verdict::XPassed => "XPASS",
            Verdict::XPassStrict => "XPASS(strict)",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disposition(kind: DispositionKind, strict: bool) -> Disposition {
        Disposition {
            kind,
            reason: "reason".to_string(),
            strict,
            matched_key: "t.py".to_string(),
        }
    }

    #[test]
    fn test_no_disposition_keeps_outcome() {
        assert_eq!(Verdict::decide(None, TestOutcome::Passed), Verdict::Passed);
        assert_eq!(Verdict::decide(None, TestOutcome::Failed), Verdict::Failed);
    }

    #[test]
    fn test_skip_ignores_outcome() {
        let d = disposition(DispositionKind::Skip, true);
        assert_eq!(Verdict::decide(Some(&d), TestOutcome::Passed), Verdict::Skipped);
        assert_eq!(Verdict::decide(Some(&d), TestOutcome::Failed), Verdict::Skipped);
    }

    #[test]
    fn test_xfail() {
        let lenient = disposition(DispositionKind::Xfail, false);
        let strict = disposition(DispositionKind::Xfail, true);

        assert_eq!(
            Verdict::decide(Some(&lenient), TestOutcome::Failed),
            Verdict::XFailed
        );
        assert_eq!(
            Verdict::decide(Some(&lenient), TestOutcome::Passed),
            Verdict::XPassed
        );
        let v = Verdict::decide(Some(&strict), TestOutcome::Passed);
        assert_eq!(v, Verdict::XPassStrict);
        assert!(v.is_failure());
        assert!(!Verdict::XPassed.is_failure());
    }

    #[test]
    fn test_display() {
        assert_eq!(Verdict::XPassStrict.to_string(), "XPASS(strict)");
        assert_eq!(Verdict::Skipped.to_string(), "SKIPPED");
    }
}
