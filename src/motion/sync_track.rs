use serde::{Deserialize, Serialize};

/// Marker on a motion's sync track, e.g. a foot plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub time: f32,
    pub id: String,
}

impl SyncEvent {
    #[must_use]
    pub fn new(time: f32, id: impl Into<String>) -> Self {
        Self {
            time,
            id: id.into(),
        }
    }
}

/// Ordered sync events of a looping motion.
///
/// Consecutive events form segments; the last segment wraps around the end
/// of the motion to the first event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncTrack {
    events: Vec<SyncEvent>,
    duration: f32,
}

impl SyncTrack {
    /// Builds a track, sorting the events by time.
    #[must_use]
    pub fn new(mut events: Vec<SyncEvent>, duration: f32) -> Self {
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { events, duration }
    }

    #[must_use]
    pub fn events(&self) -> &[SyncEvent] {
        &self.events
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.events.len()
    }

    fn prev_index(&self, index: usize) -> usize {
        (index + self.events.len() - 1) % self.events.len()
    }

    fn is_pair(&self, first: usize, id_first: &str, id_second: &str) -> bool {
        self.events[first].id == id_first && self.events[self.next_index(first)].id == id_second
    }

    /// Indices of the events that enclose `time`.
    ///
    /// Before the first event the wrapping segment `(last, 0)` is returned.
    #[must_use]
    pub fn find_event_indices(&self, time: f32) -> Option<(usize, usize)> {
        if self.events.is_empty() {
            return None;
        }

        let first = match self.events.iter().rposition(|event| event.time <= time) {
            Some(index) => index,
            None => self.events.len() - 1,
        };
        Some((first, self.next_index(first)))
    }

    /// Searches for a segment `(id_first, id_second)` starting at
    /// `start_index`, walking forward or backward over the whole track.
    #[must_use]
    pub fn find_matching_events(
        &self,
        start_index: usize,
        id_first: &str,
        id_second: &str,
        forward: bool,
    ) -> Option<(usize, usize)> {
        if self.events.is_empty() {
            return None;
        }

        let mut index = start_index % self.events.len();
        for _ in 0..self.events.len() {
            if self.is_pair(index, id_first, id_second) {
                return Some((index, self.next_index(index)));
            }
            index = if forward {
                self.next_index(index)
            } else {
                self.prev_index(index)
            };
        }
        None
    }

    /// Length in seconds of the segment between two event indices, wrapping
    /// over the end of the motion when needed.
    #[must_use]
    pub fn calc_segment_length(&self, first: usize, second: usize) -> f32 {
        let (Some(a), Some(b)) = (self.events.get(first), self.events.get(second)) else {
            return 0.0;
        };
        if second > first {
            b.time - a.time
        } else {
            self.duration - a.time + b.time
        }
    }

    /// How many segments with the same ids as `(first, second)` occur before
    /// `first`.
    #[must_use]
    pub fn calc_occurrence(&self, first: usize, second: usize) -> usize {
        let (Some(a), Some(b)) = (self.events.get(first), self.events.get(second)) else {
            return 0;
        };
        (0..first)
            .filter(|&index| self.is_pair(index, &a.id, &b.id))
            .count()
    }

    /// Finds the `occurrence`-th segment `(id_first, id_second)`. Occurrences
    /// beyond the number of matches wrap around.
    #[must_use]
    pub fn extract_occurrence(
        &self,
        occurrence: usize,
        id_first: &str,
        id_second: &str,
    ) -> Option<(usize, usize)> {
        let matches: Vec<usize> = (0..self.events.len())
            .filter(|&index| self.is_pair(index, id_first, id_second))
            .collect();
        if matches.is_empty() {
            return None;
        }
        let first = matches[occurrence % matches.len()];
        Some((first, self.next_index(first)))
    }

    #[must_use]
    pub fn event_time(&self, index: usize) -> Option<f32> {
        self.events.get(index).map(|event| event.time)
    }

    #[must_use]
    pub fn event_id(&self, index: usize) -> Option<&str> {
        self.events.get(index).map(|event| event.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_track() -> SyncTrack {
        SyncTrack::new(
            vec![
                SyncEvent::new(0.2, "left"),
                SyncEvent::new(0.7, "right"),
            ],
            1.0,
        )
    }

    #[test]
    fn finds_enclosing_events() {
        let track = walk_track();
        assert_eq!(track.find_event_indices(0.5), Some((0, 1)));
        assert_eq!(track.find_event_indices(0.8), Some((1, 0)));
        assert_eq!(track.find_event_indices(0.1), Some((1, 0)));
        assert_eq!(SyncTrack::default().find_event_indices(0.3), None);
    }

    #[test]
    fn segment_length_wraps_around_the_end() {
        let track = walk_track();
        assert!((track.calc_segment_length(0, 1) - 0.5).abs() < 1e-6);
        assert!((track.calc_segment_length(1, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn matching_events_by_id() {
        let track = SyncTrack::new(
            vec![
                SyncEvent::new(0.0, "left"),
                SyncEvent::new(0.3, "right"),
                SyncEvent::new(0.6, "left"),
                SyncEvent::new(0.9, "right"),
            ],
            1.2,
        );

        assert_eq!(track.find_matching_events(1, "left", "right", true), Some((2, 3)));
        assert_eq!(track.find_matching_events(1, "left", "right", false), Some((0, 1)));
        assert_eq!(track.find_matching_events(0, "jump", "land", true), None);

        assert_eq!(track.calc_occurrence(2, 3), 1);
        assert_eq!(track.extract_occurrence(1, "left", "right"), Some((2, 3)));
        assert_eq!(track.extract_occurrence(2, "left", "right"), Some((0, 1)));
    }
}
