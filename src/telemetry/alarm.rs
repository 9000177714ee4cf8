//! Edge-triggered alarm detection.
//!
//! The device reports its alarm as a level (true while the condition
//! holds). Alerts should go out once per episode, so the detector reports
//! only rising edges. It performs no I/O.

/// Remembers the last alarm level and reports false→true transitions.
#[derive(Debug, Default)]
pub struct AlarmEdgeDetector {
    previous: bool,
}

impl AlarmEdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest alarm level.
    ///
    /// Returns `true` exactly when the previous level was `false` and this
    /// one is `true`. The level is remembered either way.
    pub fn check(&mut self, alarm: bool) -> bool {
        let fires = !self.previous && alarm;
        self.previous = alarm;
        fires
    }

    /// Forget the last level, so the next `true` fires again.
    pub fn reset(&mut self) {
        self.previous = false;
    }

    pub fn previous(&self) -> bool {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_contiguous_run() {
        let mut detector = AlarmEdgeDetector::new();
        let levels = [false, true, true, true, false, true];

        let fired: Vec<usize> = levels
            .iter()
            .enumerate()
            .filter(|(_, &level)| detector.check(level))
            .map(|(i, _)| i)
            .collect();

        assert_eq!(fired, vec![1, 5]);
    }

    #[test]
    fn test_first_true_fires() {
        let mut detector = AlarmEdgeDetector::new();
        assert!(detector.check(true));
        assert!(!detector.check(true));
    }

    #[test]
    fn test_false_never_fires() {
        let mut detector = AlarmEdgeDetector::new();
        assert!(!detector.check(false));
        assert!(!detector.check(false));
        assert!(!detector.previous());
    }

    #[test]
    fn test_reset_rearms() {
        let mut detector = AlarmEdgeDetector::new();
        assert!(detector.check(true));
        detector.reset();
        assert!(!detector.previous());
        assert!(detector.check(true));
    }
}
