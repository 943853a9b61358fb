use std::{collections::VecDeque, sync::Mutex};

use crate::item::QueueItem;

/// FIFO of pending transfers.
///
/// Many producers may append concurrently; the single active drain loop is
/// the only consumer. The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct UploadQueue {
    items: Mutex<VecDeque<QueueItem>>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<QueueItem>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append to the tail. Returns the new length, which is the item's
    /// 1-based position in the queue.
    pub fn enqueue(&self, item: QueueItem) -> usize {
        let mut items = self.lock();
        items.push_back(item);
        items.len()
    }

    pub fn dequeue_front(&self) -> Option<QueueItem> {
        self.lock().pop_front()
    }

    /// Up to `limit` items from the head, oldest first, without removing them.
    pub fn peek_all(&self, limit: usize) -> Vec<QueueItem> {
        self.lock().iter().take(limit).cloned().collect()
    }

    /// Total length together with up to `limit` head items, read under one
    /// lock so the two agree.
    pub fn snapshot(&self, limit: usize) -> (usize, Vec<QueueItem>) {
        let items = self.lock();
        (items.len(), items.iter().take(limit).cloned().collect())
    }

    /// Drop every pending item and return how many were removed. An item the
    /// drain loop has already dequeued is unaffected.
    pub fn clear(&self) -> usize {
        let mut items = self.lock();
        let count = items.len();
        items.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::item::*, rstest::rstest, std::sync::Arc};

    fn item(name: &str) -> QueueItem {
        QueueItem::new(
            MediaDescriptor {
                source: SourceRef::new(format!("src-{name}")),
                name: name.to_string(),
                content_type: "application/octet-stream".into(),
                size_bytes: None,
            },
            ConversationRef::new("1"),
        )
    }

    #[test]
    fn enqueue_returns_position() {
        let q = UploadQueue::new();
        assert_eq!(q.enqueue(item("a")), 1);
        assert_eq!(q.enqueue(item("b")), 2);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn dequeue_is_fifo() {
        let q = UploadQueue::new();
        for name in ["a", "b", "c"] {
            q.enqueue(item(name));
        }
        let order: Vec<String> = std::iter::from_fn(|| q.dequeue_front())
            .map(|i| i.display_name().to_string())
            .collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert!(q.dequeue_front().is_none());
    }

    #[test]
    fn peek_all_returns_oldest_without_mutation() {
        let q = UploadQueue::new();
        for i in 0..15 {
            q.enqueue(item(&format!("f{i}")));
        }
        let preview = q.peek_all(10);
        let names: Vec<&str> = preview.iter().map(|i| i.display_name()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("f{i}")).collect();
        assert_eq!(names, expected);
        assert_eq!(q.len(), 15);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(10, 10)]
    #[case(15, 10)]
    fn peek_and_clear_at_limit_boundaries(#[case] queued: usize, #[case] previewed: usize) {
        let q = UploadQueue::new();
        for i in 0..queued {
            q.enqueue(item(&format!("f{i}")));
        }
        let (len, head) = q.snapshot(10);
        assert_eq!(len, queued);
        assert_eq!(head.len(), previewed);
        assert_eq!(q.peek_all(10), head);
        assert_eq!(q.clear(), queued);
        assert!(q.is_empty());
    }

    #[test]
    fn clear_returns_count_and_is_idempotent() {
        let q = UploadQueue::new();
        q.enqueue(item("a"));
        q.enqueue(item("b"));
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
        assert_eq!(q.clear(), 0);
        assert!(q.is_empty());
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let q = Arc::new(UploadQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let q = Arc::clone(&q);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        q.enqueue(item(&format!("t{t}-{i}")));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(q.len(), 400);

        // Per-producer order is preserved.
        let mut last_seen = [None::<usize>; 8];
        while let Some(it) = q.dequeue_front() {
            let (t, i) = it.display_name()[1..].split_once('-').unwrap();
            let (t, i): (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
            if let Some(prev) = last_seen[t] {
                assert!(i > prev);
            }
            last_seen[t] = Some(i);
        }
    }
}
