pub mod client;
pub mod messages;
pub mod models;
pub mod threads;
pub mod transport;

pub use client::GmailClient;
pub use models::{LabelDelta, Message, Thread};
pub use transport::MailboxTransport;
