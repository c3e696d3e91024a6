use std::time::Duration;

use async_trait::async_trait;
use resume_core::agent_introduction;

use crate::contracts::ReplyRequest;
use crate::contracts::ResponderError;

/// Produces the assistant's reply for a transcript. Called at most once per
/// outstanding request.
#[async_trait]
pub trait Responder: Send + Sync {
    fn name(&self) -> &'static str;

    async fn respond(&self, request: &ReplyRequest) -> Result<String, ResponderError>;
}

/// Stand-in for the analysis backend: waits, then introduces itself.
#[derive(Debug, Clone, Copy)]
pub struct StubResponder {
    delay: Duration,
}

impl StubResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for StubResponder {
    fn default() -> Self {
        Self::new(Duration::from_millis(1_000))
    }
}

#[async_trait]
impl Responder for StubResponder {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn respond(&self, request: &ReplyRequest) -> Result<String, ResponderError> {
        tracing::debug!(
            request_id = request.request_id.0,
            turns = request.transcript.len(),
            delay_ms = self.delay.as_millis() as u64,
            "stub responder replying with introduction"
        );
        tokio::time::sleep(self.delay).await;
        Ok(agent_introduction().to_string())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use resume_core::RequestId;

    use super::*;

    fn request() -> ReplyRequest {
        ReplyRequest {
            request_id: RequestId(1),
            transcript: Vec::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stub_waits_for_its_delay() {
        let responder = StubResponder::new(Duration::from_millis(1_000));
        let started = tokio::time::Instant::now();
        let reply = responder.respond(&request()).await.expect("stub reply");
        assert_eq!(reply, agent_introduction());
        assert!(started.elapsed() >= Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn stub_ignores_transcript_content() {
        let responder = StubResponder::new(Duration::ZERO);
        let first = responder.respond(&request()).await.expect("first");
        let mut other = request();
        other.request_id = RequestId(9);
        let second = responder.respond(&other).await.expect("second");
        assert_eq!(first, second);
    }
}
