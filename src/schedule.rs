//! Phased Scheduler
//!
//! Named lifecycle phases, each holding a priority-sorted sequence of
//! subscriptions. The host's render pipeline drives phases synchronously;
//! dispatch order is deterministic: ascending priority, then subscription
//! order. Subscriptions persist across fires and are never retracted.

use indexmap::IndexMap;

#[derive(Debug, Clone)]
struct Subscription<A> {
    priority: i64,
    action: A,
}

/// Registry of pending actions keyed by lifecycle event name.
#[derive(Debug, Clone)]
pub struct EventSchedule<A> {
    phases: IndexMap<String, Vec<Subscription<A>>>,
}

impl<A> EventSchedule<A> {
    pub fn new() -> Self {
        Self {
            phases: IndexMap::new(),
        }
    }

    pub fn subscribe(&mut self, event: &str, priority: i64, action: A) {
        self.phases
            .entry(event.to_string())
            .or_default()
            .push(Subscription { priority, action });
    }

    /// Actions pending for one event, in dispatch order. Stable sort keeps
    /// subscription order among equal priorities.
    pub fn fire(&self, event: &str) -> Vec<&A> {
        let mut pending: Vec<&Subscription<A>> = self
            .phases
            .get(event)
            .map(|subs| subs.iter().collect())
            .unwrap_or_default();
        pending.sort_by_key(|sub| sub.priority);
        pending.into_iter().map(|sub| &sub.action).collect()
    }

    /// Event names with at least one subscription, in first-seen order.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.phases.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

impl<A> Default for EventSchedule<A> {
    fn default() -> Self {
        Self::new()
    }
}
