use foundation::time::Time;
use runtime::{EventBus, Stamped, Timer, TimerToken};

use crate::region::ScenarioList;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SelectionCause {
    Initial,
    Manual,
    AutoAdvance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Selected {
        index: usize,
        name: String,
        cause: SelectionCause,
    },
    AutoAdvanceChanged(bool),
}

/// The selected scenario and the auto-advance cycle that drives it.
///
/// Auto-advance is a single delayed callback re-armed after every render
/// while enabled. When it fires the selection moves to the next scenario,
/// wrapping from the last back to the first. Any manual selection turns
/// auto-advance off and drops the pending callback.
#[derive(Debug, Clone)]
pub struct ScenarioSelection {
    scenarios: ScenarioList,
    selected: Option<usize>,
    auto_advance: bool,
    interval_s: f64,
    timer: Timer,
    events: EventBus<SelectionEvent>,
}

impl ScenarioSelection {
    /// Starts on `initial` when it names a scenario, otherwise on the first one.
    pub fn new(
        scenarios: ScenarioList,
        initial: Option<&str>,
        auto_advance: bool,
        interval_s: f64,
    ) -> Self {
        let selected = initial
            .and_then(|name| scenarios.position(name))
            .or(if scenarios.is_empty() { None } else { Some(0) });

        let mut s = Self {
            scenarios,
            selected,
            auto_advance,
            interval_s: interval_s.max(0.0),
            timer: Timer::new(),
            events: EventBus::new(),
        };
        if let Some(index) = selected {
            s.emit_selected(Time::ZERO, index, SelectionCause::Initial);
        }
        s
    }

    pub fn scenarios(&self) -> &ScenarioList {
        &self.scenarios
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.and_then(|i| self.scenarios.get(i))
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    pub fn interval_s(&self) -> f64 {
        self.interval_s
    }

    pub fn is_timer_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn timer_deadline(&self) -> Option<Time> {
        self.timer.deadline()
    }

    /// Index following `current`, wrapping after the last scenario.
    pub fn next_index(&self, current: Option<usize>) -> Option<usize> {
        let len = self.scenarios.len();
        if len == 0 {
            return None;
        }
        Some(match current {
            Some(i) => (i + 1) % len,
            None => 0,
        })
    }

    /// Manual selection by slider position.
    ///
    /// Returns `false` (and changes nothing) when `index` is out of range.
    pub fn select_index(&mut self, now: Time, index: usize) -> bool {
        if index >= self.scenarios.len() {
            return false;
        }
        self.set_auto_advance(now, false);
        if self.selected != Some(index) {
            self.selected = Some(index);
            self.emit_selected(now, index, SelectionCause::Manual);
        }
        true
    }

    pub fn set_auto_advance(&mut self, now: Time, enabled: bool) {
        if !enabled {
            self.timer.cancel();
        }
        if self.auto_advance != enabled {
            self.auto_advance = enabled;
            self.events.emit(now, SelectionEvent::AutoAdvanceChanged(enabled));
            tracing::debug!(enabled, "auto-advance toggled");
        }
    }

    /// Re-arms the auto-advance callback after a render.
    ///
    /// Returns the token of a newly armed callback; `None` when disabled,
    /// when there is nothing to cycle, or when a callback is already pending.
    pub fn after_render(&mut self, now: Time) -> Option<TimerToken> {
        if !self.auto_advance || self.scenarios.is_empty() {
            return None;
        }
        self.timer.arm_if_idle(now, self.interval_s)
    }

    /// Clock-driven firing. Returns the new index when the selection moved.
    pub fn poll(&mut self, now: Time) -> Option<usize> {
        if !self.timer.poll(now) {
            return None;
        }
        self.advance(now)
    }

    /// Firing from an externally scheduled callback carrying `token`.
    pub fn fire(&mut self, now: Time, token: TimerToken) -> Option<usize> {
        if !self.timer.fire(token) {
            return None;
        }
        self.advance(now)
    }

    pub fn drain_events(&mut self) -> Vec<Stamped<SelectionEvent>> {
        self.events.drain()
    }

    fn advance(&mut self, now: Time) -> Option<usize> {
        if !self.auto_advance {
            return None;
        }
        let next = self.next_index(self.selected)?;
        self.selected = Some(next);
        self.emit_selected(now, next, SelectionCause::AutoAdvance);
        Some(next)
    }

    fn emit_selected(&mut self, now: Time, index: usize, cause: SelectionCause) {
        let name = self.scenarios.get(index).unwrap_or_default().to_string();
        tracing::debug!(index, scenario = %name, ?cause, "scenario selected");
        self.events.emit(now, SelectionEvent::Selected { index, name, cause });
    }
}

#[cfg(test)]
mod tests {
    use super::{ScenarioSelection, SelectionCause, SelectionEvent};
    use crate::region::ScenarioList;
    use foundation::time::Time;

    fn selection(auto: bool) -> ScenarioSelection {
        ScenarioSelection::new(ScenarioList::new(["Core", "High", "Low"]), None, auto, 3.0)
    }

    #[test]
    fn starts_on_named_initial_scenario_or_first() {
        let s = ScenarioSelection::new(ScenarioList::new(["A", "Core"]), Some("Core"), true, 3.0);
        assert_eq!(s.selected_name(), Some("Core"));
        let s = ScenarioSelection::new(ScenarioList::new(["A", "B"]), Some("Core"), true, 3.0);
        assert_eq!(s.selected_index(), Some(0));
        let s = ScenarioSelection::new(ScenarioList::default(), Some("Core"), true, 3.0);
        assert_eq!(s.selected_index(), None);
    }

    #[test]
    fn advancing_from_last_wraps_to_first() {
        let mut s = selection(true);
        let mut seen = Vec::new();
        let mut now = Time::ZERO;
        for _ in 0..4 {
            s.after_render(now);
            now = now.after(3.0);
            seen.push(s.poll(now).unwrap());
        }
        assert_eq!(seen, vec![1, 2, 0, 1]);
    }

    #[test]
    fn callback_only_fires_after_interval() {
        let mut s = selection(true);
        s.after_render(Time(0.0));
        assert_eq!(s.poll(Time(2.5)), None);
        assert_eq!(s.poll(Time(3.0)), Some(1));
    }

    #[test]
    fn rendering_twice_does_not_stack_callbacks() {
        let mut s = selection(true);
        let first = s.after_render(Time(0.0));
        assert!(first.is_some());
        assert!(s.after_render(Time(1.0)).is_none());
        assert_eq!(s.timer_deadline(), Some(Time(3.0)));
    }

    #[test]
    fn disabling_auto_advance_stops_automatic_changes() {
        let mut s = selection(true);
        let token = s.after_render(Time(0.0)).unwrap();
        s.set_auto_advance(Time(1.0), false);

        assert_eq!(s.fire(Time(3.0), token), None);
        assert_eq!(s.poll(Time(100.0)), None);
        assert!(s.after_render(Time(100.0)).is_none());
        assert_eq!(s.selected_index(), Some(0));
    }

    #[test]
    fn manual_select_disables_auto_advance() {
        let mut s = selection(true);
        let token = s.after_render(Time(0.0)).unwrap();
        assert!(s.select_index(Time(1.0), 2));
        assert!(!s.auto_advance());
        assert_eq!(s.selected_name(), Some("Low"));
        assert_eq!(s.fire(Time(3.0), token), None);
        assert_eq!(s.selected_index(), Some(2));
    }

    #[test]
    fn out_of_range_select_is_ignored() {
        let mut s = selection(true);
        assert!(!s.select_index(Time(0.0), 3));
        assert!(s.auto_advance());
        assert_eq!(s.selected_index(), Some(0));
    }

    #[test]
    fn reenabling_resumes_from_current_selection() {
        let mut s = selection(false);
        s.select_index(Time(0.0), 2);
        s.set_auto_advance(Time(0.0), true);
        let token = s.after_render(Time(0.0)).unwrap();
        assert_eq!(s.fire(Time(3.0), token), Some(0));
    }

    #[test]
    fn events_record_causes() {
        let mut s = selection(true);
        s.after_render(Time(0.0));
        s.poll(Time(3.0));
        s.select_index(Time(4.0), 0);

        let kinds: Vec<SelectionEvent> = s.drain_events().into_iter().map(|e| e.event).collect();
        assert_eq!(
            kinds,
            vec![
                SelectionEvent::Selected {
                    index: 0,
                    name: "Core".to_string(),
                    cause: SelectionCause::Initial,
                },
                SelectionEvent::Selected {
                    index: 1,
                    name: "High".to_string(),
                    cause: SelectionCause::AutoAdvance,
                },
                SelectionEvent::AutoAdvanceChanged(false),
                SelectionEvent::Selected {
                    index: 0,
                    name: "Core".to_string(),
                    cause: SelectionCause::Manual,
                },
            ]
        );
    }
}
