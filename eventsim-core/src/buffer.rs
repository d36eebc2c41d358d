//! Events withheld while a mobile client is offline.

use std::collections::HashMap;

use uuid::Uuid;

use crate::event::Event;

/// Withheld events keyed by session id, in capture order.
///
/// Lives on the stack frame of one session run and is dropped with it.
#[derive(Debug, Default)]
pub struct SessionBuffer {
    held: HashMap<Uuid, Vec<Event>>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(&mut self, event: Event) {
        self.held.entry(event.session_id).or_default().push(event);
    }

    /// Takes every event withheld for `session_id`, oldest first.
    pub fn release(&mut self, session_id: &Uuid) -> Vec<Event> {
        self.held.remove(session_id).unwrap_or_default()
    }

    pub fn held(&self, session_id: &Uuid) -> usize {
        self.held.get(session_id).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.held.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Payload, SessionKind};

    fn event(session_id: Uuid, index: u64) -> Event {
        Event::capture(
            session_id,
            0,
            index,
            SessionKind::Mobile,
            Payload { value: 10, error: 0 },
        )
    }

    #[test]
    fn release_preserves_capture_order() {
        let id = Uuid::new_v4();
        let mut buffer = SessionBuffer::new();
        for i in 3..=6 {
            buffer.hold(event(id, i));
        }
        assert_eq!(buffer.held(&id), 4);
        let indices: Vec<u64> = buffer.release(&id).iter().map(|e| e.event_index).collect();
        assert_eq!(indices, vec![3, 4, 5, 6]);
        assert!(buffer.is_empty());
        assert!(buffer.release(&id).is_empty());
    }

    #[test]
    fn sessions_do_not_share_entries() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut buffer = SessionBuffer::new();
        buffer.hold(event(a, 1));
        buffer.hold(event(b, 1));
        buffer.hold(event(a, 2));
        assert_eq!(buffer.release(&a).len(), 2);
        assert_eq!(buffer.held(&b), 1);
    }
}
