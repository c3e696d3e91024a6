use std::time::Duration;

use resume_core::Message;
use resume_core::RequestId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub request_id: RequestId,
    pub transcript: Vec<Message>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponderError {
    #[error("responder backend failed: {0}")]
    Backend(String),
    #[error("no reply within {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("agent session has shut down")]
pub struct SessionClosed;
