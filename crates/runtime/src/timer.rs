use foundation::time::Time;

/// Identifies one arming of a [`Timer`].
///
/// Callbacks scheduled outside the timer (e.g. a browser `setTimeout`) carry
/// the token they were armed with; a token from an earlier arming is stale
/// and must not fire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        TimerToken(raw)
    }
}

/// A single-shot delayed callback slot.
///
/// At most one deadline is pending. Re-arming replaces it rather than
/// stacking a second callback.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Timer {
    generation: u64,
    deadline: Option<Time>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Time> {
        self.deadline
    }

    /// Arms the timer `delay_s` seconds after `now`, replacing any pending deadline.
    pub fn arm(&mut self, now: Time, delay_s: f64) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        let deadline = now.after(delay_s);
        self.deadline = Some(deadline);
        tracing::trace!(generation = self.generation, deadline_s = deadline.0, "timer armed");
        TimerToken(self.generation)
    }

    /// Arms only when nothing is pending.
    pub fn arm_if_idle(&mut self, now: Time, delay_s: f64) -> Option<TimerToken> {
        if self.is_pending() {
            return None;
        }
        Some(self.arm(now, delay_s))
    }

    /// Drops the pending deadline. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.deadline.take().is_some();
        if was_pending {
            // Invalidate tokens handed out for the cancelled arming.
            self.generation = self.generation.wrapping_add(1);
        }
        was_pending
    }

    pub fn is_current(&self, token: TimerToken) -> bool {
        self.deadline.is_some() && token.0 == self.generation
    }

    /// Fires if the deadline has been reached. Fires at most once per arming.
    pub fn poll(&mut self, now: Time) -> bool {
        match self.deadline {
            Some(deadline) if now.0 >= deadline.0 => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Fires from an externally scheduled callback, regardless of the clock.
    ///
    /// Returns `false` for stale tokens or when nothing is pending.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.deadline = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Timer;
    use foundation::time::Time;

    #[test]
    fn poll_fires_once_at_deadline() {
        let mut t = Timer::new();
        t.arm(Time(0.0), 3.0);
        assert!(!t.poll(Time(2.9)));
        assert!(t.poll(Time(3.0)));
        assert!(!t.poll(Time(10.0)));
        assert!(!t.is_pending());
    }

    #[test]
    fn arm_if_idle_does_not_stack() {
        let mut t = Timer::new();
        assert!(t.arm_if_idle(Time(0.0), 3.0).is_some());
        assert!(t.arm_if_idle(Time(1.0), 3.0).is_none());
        assert_eq!(t.deadline(), Some(Time(3.0)));
    }

    #[test]
    fn rearm_invalidates_previous_token() {
        let mut t = Timer::new();
        let first = t.arm(Time(0.0), 3.0);
        let second = t.arm(Time(1.0), 3.0);
        assert!(!t.fire(first));
        assert!(t.fire(second));
        assert!(!t.fire(second));
    }

    #[test]
    fn cancel_invalidates_token() {
        let mut t = Timer::new();
        let token = t.arm(Time(0.0), 3.0);
        assert!(t.cancel());
        assert!(!t.cancel());
        assert!(!t.fire(token));
        assert!(!t.poll(Time(100.0)));
    }
}
