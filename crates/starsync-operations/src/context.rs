use std::sync::Arc;

use starsync_config::config::Config;
use starsync_events::EventSinkHandle;

/// Shared state handed to every operation.
#[derive(Clone)]
pub struct MirrorContext {
    config: Arc<Config>,
    events: EventSinkHandle,
}

impl MirrorContext {
    pub fn new(config: Config, events: EventSinkHandle) -> Self {
        Self {
            config: Arc::new(config),
            events,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventSinkHandle {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use starsync_events::{CollectorSink, MirrorEvent};

    use super::*;

    #[test]
    fn test_context_shares_sink() {
        let collector = Arc::new(CollectorSink::default());
        let ctx = MirrorContext::new(Config::default_config(), collector.clone());
        let cloned = ctx.clone();

        ctx.events().emit(MirrorEvent::ListingComplete {
            total: 1,
        });
        cloned.events().emit(MirrorEvent::ListingComplete {
            total: 2,
        });

        assert_eq!(collector.len(), 2);
        assert_eq!(cloned.config().get_parallel_limit(), 16);
    }
}
