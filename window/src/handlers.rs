use std::sync::Arc;

use crate::events::{EventKind, WindowEvent};

pub type Handler = Arc<dyn Fn(&WindowEvent) + Send + Sync>;

/// Token returned by a subscription, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Subscribers of one window, in subscription order.
#[derive(Default)]
pub(crate) struct Handlers {
    next: u64,
    entries: Vec<(HandlerId, EventKind, Handler)>,
}

impl Handlers {
    pub fn add(&mut self, kind: EventKind, handler: Handler) -> HandlerId {
        self.next += 1;
        let id = HandlerId(self.next);
        self.entries.push((id, kind, handler));
        id
    }

    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(eid, _, _)| *eid != id);
        self.entries.len() != before
    }

    /// Handlers for `kind`, cloned so they can run without holding the lock.
    pub fn matching(&self, kind: EventKind) -> Vec<Handler> {
        self.entries
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Arc::clone(h))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_add_match_remove() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut hs = Handlers::default();
        let h = Arc::clone(&hits);
        let id = hs.add(
            EventKind::MouseLeave,
            Arc::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        hs.add(EventKind::KeyDown, Arc::new(|_| {}));

        for handler in hs.matching(EventKind::MouseLeave) {
            handler(&WindowEvent::MouseLeave);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(hs.matching(EventKind::MouseClick).is_empty());

        assert!(hs.remove(id));
        assert!(!hs.remove(id));
        assert_eq!(hs.len(), 1);
        hs.clear();
        assert_eq!(hs.len(), 0);
    }
}
