use foundation::time::Time;

/// An event stamped with the time it was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<E> {
    pub at: Time,
    pub event: E,
}

/// Append-only event log, drained by whoever syncs UI or logs.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBus<E> {
    events: Vec<Stamped<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, at: Time, event: E) {
        self.events.push(Stamped { at, event });
    }

    pub fn events(&self) -> &[Stamped<E>] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Stamped<E>> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use foundation::time::Time;

    #[test]
    fn records_events_in_order_with_time() {
        let mut bus = EventBus::new();
        bus.emit(Time(1.0), "a");
        bus.emit(Time(2.0), "b");
        let got: Vec<_> = bus.events().iter().map(|s| (s.at, s.event)).collect();
        assert_eq!(got, vec![(Time(1.0), "a"), (Time(2.0), "b")]);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(Time(0.0), 7u32);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.is_empty());
    }
}
