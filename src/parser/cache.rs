use smallvec::SmallVec;

use crate::events::Event;
use crate::source::Location;

/// A stack of speculative event frames.
///
/// A grammar branch that may fail opens a frame before emitting; committing
/// merges the frame into its parent (or hands the events back for delivery
/// when it was the outermost frame), failing discards it. Observers never see
/// events from branches that did not commit.
pub(crate) struct EventCache {
    frames: SmallVec<[Vec<(Event, Location)>; 4]>,
}

impl EventCache {
    pub(crate) fn new() -> Self {
        EventCache {
            frames: SmallVec::new(),
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Discard the top frame and everything emitted under it.
    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Record an event in the open frame, or hand it back when no frame is
    /// open and it should go straight to the handler.
    pub(crate) fn push_event(
        &mut self,
        event: Event,
        location: Location,
    ) -> Option<(Event, Location)> {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.push((event, location));
                None
            }
            None => Some((event, location)),
        }
    }

    /// Commit the top frame. Returns the buffered events when this was the
    /// outermost frame, so the caller can deliver them.
    pub(crate) fn flush_frame(&mut self) -> Option<Vec<(Event, Location)>> {
        let frame = self.frames.pop()?;
        match self.frames.last_mut() {
            Some(parent) => {
                parent.extend(frame);
                None
            }
            None => Some(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    fn loc() -> Location {
        Location::point(Source::new("x", None), 0)
    }

    #[test]
    fn events_bypass_when_no_frame_is_open() {
        let mut cache = EventCache::new();
        assert!(cache.push_event(Event::StreamStart, loc()).is_some());
    }

    #[test]
    fn discarded_frames_hide_events() {
        let mut cache = EventCache::new();
        cache.push_frame();
        assert!(cache.push_event(Event::SequenceEnd, loc()).is_none());
        cache.pop_frame();
        assert_eq!(cache.depth(), 0);
    }

    #[test]
    fn nested_frames_merge_into_parent() {
        let mut cache = EventCache::new();
        cache.push_frame();
        cache.push_frame();
        cache.push_event(Event::SequenceEnd, loc());
        assert!(cache.flush_frame().is_none());
        let events = cache.flush_frame().expect("outermost flush returns events");
        assert_eq!(events.len(), 1);
    }
}
