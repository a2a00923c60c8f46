use std::sync::atomic::{AtomicU64, Ordering};

use starsync_events::{EventSinkHandle, MirrorEvent, OperationId};
use starsync_github::ListingProgress;

/// Creates a listing progress callback that bridges to [`MirrorEvent`] emissions.
pub fn create_listing_bridge(events: EventSinkHandle) -> impl Fn(ListingProgress) + Send {
    move |progress| {
        let event = match progress {
            ListingProgress::Page {
                page,
                count,
            } => {
                MirrorEvent::ListingPage {
                    page,
                    count,
                }
            }
            ListingProgress::RateLimited {
                page,
                wait,
            } => {
                MirrorEvent::RateLimited {
                    page,
                    wait,
                }
            }
            ListingProgress::Complete {
                total,
            } => {
                MirrorEvent::ListingComplete {
                    total,
                }
            }
        };
        events.emit(event);
    }
}

/// Generates a unique operation ID.
pub fn next_op_id() -> OperationId {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use starsync_events::CollectorSink;

    use super::*;

    #[test]
    fn test_next_op_id_is_unique() {
        let id1 = next_op_id();
        let id2 = next_op_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_listing_bridge_maps_all_variants() {
        let collector = Arc::new(CollectorSink::default());
        let bridge = create_listing_bridge(collector.clone());

        bridge(ListingProgress::Page {
            page: 1,
            count: 100,
        });
        bridge(ListingProgress::RateLimited {
            page: 2,
            wait: Duration::from_secs(60),
        });
        bridge(ListingProgress::Complete {
            total: 100,
        });

        let events = collector.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            MirrorEvent::ListingPage {
                page: 1,
                count: 100
            }
        ));
        assert!(matches!(
            &events[1],
            MirrorEvent::RateLimited {
                page: 2,
                ..
            }
        ));
        assert!(matches!(
            &events[2],
            MirrorEvent::ListingComplete {
                total: 100
            }
        ));
    }
}
