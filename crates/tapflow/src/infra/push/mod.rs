mod channel;
mod message;
mod socket;

pub use channel::WsPushChannel;
