pub mod client;
pub mod dispatcher;
pub mod request;

pub use client::{Confirmation, GmailActionClient, LabelSet};
pub use dispatcher::{ActionDispatcher, DispatchReport, DispatchState};
pub use request::{ActionKind, ActionRequest, Label};
