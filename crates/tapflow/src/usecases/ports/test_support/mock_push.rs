use std::sync::Arc;
use std::sync::Mutex;

use super::unavailable;
use crate::usecases::ports::PushChannel;
use crate::usecases::ports::PushEvent;
use crate::usecases::ports::PushHandler;
use crate::usecases::ports::PushSubscription;
use crate::usecases::ports::ServiceError;

type Handlers = Arc<Mutex<Vec<(u64, PushHandler)>>>;

/// Push channel whose events are injected by the test.
#[derive(Default)]
pub struct MockPushChannel {
    handlers: Handlers,
    next_id: Mutex<u64>,
    fail: bool,
}

impl MockPushChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Delivers `event` synchronously to every live subscriber.
    pub fn emit(&self, event: PushEvent) {
        let handlers: Vec<PushHandler> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }
}

impl PushChannel for MockPushChannel {
    fn subscribe(&self, handler: PushHandler) -> Result<PushSubscription, ServiceError> {
        if self.fail {
            return Err(unavailable("push channel"));
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        self.handlers.lock().unwrap().push((id, handler));
        let handlers = Arc::clone(&self.handlers);
        Ok(PushSubscription::new(move || {
            handlers.lock().unwrap().retain(|(h, _)| *h != id);
        }))
    }
}
