//! Event fan-out to observer surfaces.
//!
//! Delivery is synchronous and best-effort: emitting with no observers is a
//! no-op, and observers ignore whatever they do not render. Countdown events
//! reach widget surfaces only while the widget is enabled.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Kind of surface an observer renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Dashboard,
    Widget,
    Overlay,
    System,
    /// Receives every event regardless of gating.
    Any,
}

pub trait Observer: Send {
    fn surface(&self) -> Surface {
        Surface::Any
    }

    fn on_event(&mut self, event: &Event);
}

/// Handle returned by [`NotificationDispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct FnObserver<F> {
    surface: Surface,
    f: F,
}

impl<F: FnMut(&Event) + Send> Observer for FnObserver<F> {
    fn surface(&self) -> Surface {
        self.surface
    }

    fn on_event(&mut self, event: &Event) {
        (self.f)(event)
    }
}

/// Wrap a closure as an observer for `surface`.
pub fn observer_fn<F>(surface: Surface, f: F) -> Box<dyn Observer>
where
    F: FnMut(&Event) + Send + 'static,
{
    Box::new(FnObserver { surface, f })
}

/// Shared in-memory event buffer, for surfaces that poll.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    surface: Option<Surface>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_surface(surface: Surface) -> Self {
        Self {
            surface: Some(surface),
            events: Arc::default(),
        }
    }

    /// Take every buffered event.
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(Event::name)
            .collect()
    }
}

impl Observer for EventLog {
    fn surface(&self) -> Surface {
        self.surface.unwrap_or(Surface::Any)
    }

    fn on_event(&mut self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

#[derive(Default)]
pub struct NotificationDispatcher {
    observers: Vec<(SubscriptionId, Box<dyn Observer>)>,
    next_id: u64,
    widget_enabled: bool,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        before != self.observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn set_widget_enabled(&mut self, enabled: bool) {
        self.widget_enabled = enabled;
    }

    pub fn widget_enabled(&self) -> bool {
        self.widget_enabled
    }

    pub fn emit(&mut self, event: &Event) {
        tracing::trace!(event = event.name(), "Dispatching event");
        let gated = event.is_widget_event() && !self.widget_enabled;
        for (_, observer) in &mut self.observers {
            if gated && observer.surface() == Surface::Widget {
                continue;
            }
            observer.on_event(event);
        }
    }

    pub fn emit_all(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.emit(&event);
        }
    }
}
