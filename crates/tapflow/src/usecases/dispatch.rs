//! Fire-and-forget echo of captured gestures to the device.

use std::io;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use crossbeam_channel::unbounded;
use tracing::warn;

use crate::domain::DevicePoint;
use crate::usecases::ports::GestureExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionRequest {
    Tap(DevicePoint),
    Swipe {
        start: DevicePoint,
        end: DevicePoint,
        duration_ms: u64,
    },
}

/// Queues execution requests onto a worker so capture never waits on the device.
#[derive(Clone)]
pub struct ExecutionDispatcher {
    tx: Sender<ExecutionRequest>,
}

impl ExecutionDispatcher {
    pub fn spawn(executor: Arc<dyn GestureExecutor>) -> io::Result<Self> {
        let (tx, rx) = unbounded::<ExecutionRequest>();
        thread::Builder::new()
            .name("gesture-dispatch".to_string())
            .spawn(move || {
                for request in rx.iter() {
                    let result = match request {
                        ExecutionRequest::Tap(point) => executor.tap(point),
                        ExecutionRequest::Swipe {
                            start,
                            end,
                            duration_ms,
                        } => executor.swipe(start, end, duration_ms),
                    };
                    if let Err(err) = result {
                        warn!(?request, error = %err, "Gesture execution failed");
                    }
                }
            })?;
        Ok(Self { tx })
    }

    pub fn dispatch(&self, request: ExecutionRequest) {
        if self.tx.send(request).is_err() {
            warn!(?request, "Gesture dispatcher has stopped; request dropped");
        }
    }
}
