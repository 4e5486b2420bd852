//! Translation between the outer surfaces (CLI, HTTP API) and the use cases.

pub mod intents;
pub mod presenter;

pub use intents::{ErrorPayload, IntentRequest};
pub use presenter::{OutputFormat, Presenter, create_presenter};
