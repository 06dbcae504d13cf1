use serde::{Deserialize, Serialize};

/// Event stored on a motion's event track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    pub time: f32,
    pub name: String,
}

impl MotionEvent {
    #[must_use]
    pub fn new(time: f32, name: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
        }
    }
}

/// Event triggered during a frame, tagged with its source motion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmittedEvent {
    pub name: String,
    pub time: f32,
    pub motion_id: String,
    /// Blend weight of the source motion when the event fired.
    pub weight: f32,
}

/// Events collected during one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventBuffer {
    events: Vec<EmittedEvent>,
}

impl EventBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EmittedEvent) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn extend(&mut self, other: EventBuffer) {
        self.events.extend(other.events);
    }

    #[must_use]
    pub fn events(&self) -> &[EmittedEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmittedEvent> {
        self.events.iter()
    }
}
