mod event;
mod sink;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

pub use event::*;
pub use sink::*;

/// Identifier correlating the events of a single query.
pub type QueryId = u64;

/// Shared handle to an event sink.
pub type EventSinkHandle = Arc<dyn EventSink>;

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique [`QueryId`].
pub fn next_query_id() -> QueryId {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

/// Event sink handle that discards everything.
pub fn null_sink() -> EventSinkHandle {
    Arc::new(NullSink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        sink.emit(QueryEvent::Snapshot {
            stage: SnapshotStage::Invalidated,
        });
    }

    #[test]
    fn test_channel_sink() {
        let (sink, rx) = ChannelSink::new();
        sink.emit(QueryEvent::Request {
            query_id: 1,
            url: "https://aur.archlinux.org/rpc?arg=yay&type=search&v=5".to_string(),
        });
        sink.emit(QueryEvent::Response {
            query_id: 1,
            url: "https://aur.archlinux.org/rpc?arg=yay&type=search&v=5".to_string(),
            results: 3,
        });

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], QueryEvent::Request { .. }));
        assert!(matches!(
            &events[1],
            QueryEvent::Response { results: 3, .. }
        ));
    }

    #[test]
    fn test_channel_sink_receiver_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(QueryEvent::CacheHit {
            query_id: 7,
            name: "yay".to_string(),
        });
    }

    #[test]
    fn test_collector_sink() {
        let sink = CollectorSink::default();
        assert!(sink.is_empty());

        sink.emit(QueryEvent::Snapshot {
            stage: SnapshotStage::Fetching {
                url: "https://aur.archlinux.org/packages-meta-ext-v1.json.gz".to_string(),
            },
        });
        sink.emit(QueryEvent::Snapshot {
            stage: SnapshotStage::Loaded { packages: 100 },
        });

        assert_eq!(sink.len(), 2);
        let events = sink.events();
        assert!(matches!(
            &events[1],
            QueryEvent::Snapshot {
                stage: SnapshotStage::Loaded { packages: 100 }
            }
        ));
    }

    #[test]
    fn test_event_sink_handle() {
        let sink: EventSinkHandle = Arc::new(TracingSink);
        sink.emit(QueryEvent::QueryFinished {
            query_id: 2,
            results: 5,
            failures: 0,
        });

        let null = null_sink();
        null.emit(QueryEvent::Snapshot {
            stage: SnapshotStage::Invalidated,
        });
    }

    #[test]
    fn test_query_ids_are_unique() {
        let first = next_query_id();
        let second = next_query_id();
        assert_ne!(first, second);
    }

    #[test]
    fn test_event_query_id() {
        let event = QueryEvent::ChunkDispatched {
            query_id: 42,
            index: 0,
            size: 10,
        };
        assert_eq!(event.query_id(), Some(42));

        let event = QueryEvent::Snapshot {
            stage: SnapshotStage::Invalidated,
        };
        assert_eq!(event.query_id(), None);
    }
}
