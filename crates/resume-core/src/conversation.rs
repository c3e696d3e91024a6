use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationPhase {
    Idle,
    Awaiting { request_id: RequestId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationError {
    pub request_id: RequestId,
    pub message: Arc<str>,
}

/// Why a reply could not be applied to the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMismatch {
    NotAwaiting,
    StaleRequest { outstanding: RequestId },
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    transcript: Vec<Message>,
    phase: ConversationPhase,
    draft: String,
    last_error: Option<ConversationError>,
    next_message_id: u64,
    next_request_id: u64,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            transcript: Vec::new(),
            phase: ConversationPhase::Idle,
            draft: String::new(),
            last_error: None,
            next_message_id: 1,
            next_request_id: 1,
        }
    }
}

impl ConversationState {
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, ConversationPhase::Awaiting { .. })
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn last_error(&self) -> Option<&ConversationError> {
        self.last_error.as_ref()
    }

    pub fn set_draft(&mut self, text: String) {
        self.draft = text;
    }

    /// Idle -> Awaiting. Returns the request to hand to the responder, or `None`
    /// when the text is blank or a request is already outstanding.
    pub fn begin_send(&mut self, text: &str) -> Option<RequestId> {
        if self.is_pending() {
            tracing::debug!("send refused while a reply is pending");
            return None;
        }
        let content = text.trim();
        if content.is_empty() {
            return None;
        }

        self.append(Role::User, content.to_string());
        self.draft.clear();
        self.last_error = None;

        let request_id = RequestId(self.next_request_id);
        self.next_request_id += 1;
        self.phase = ConversationPhase::Awaiting { request_id };
        tracing::debug!(request_id = request_id.0, "conversation awaiting reply");
        Some(request_id)
    }

    /// Awaiting -> Idle with the assistant reply appended.
    pub fn complete(&mut self, request_id: RequestId, text: String) -> Result<(), ReplyMismatch> {
        self.settle(request_id)?;
        self.append(Role::Assistant, text);
        Ok(())
    }

    /// Awaiting -> Idle without touching the transcript.
    pub fn fail(&mut self, request_id: RequestId, message: Arc<str>) -> Result<(), ReplyMismatch> {
        self.settle(request_id)?;
        self.last_error = Some(ConversationError {
            request_id,
            message,
        });
        Ok(())
    }

    /// Drops the transcript and any outstanding request. Ids keep counting so a
    /// late reply for a dropped request can never match a new one.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.phase = ConversationPhase::Idle;
        self.draft.clear();
        self.last_error = None;
    }

    fn settle(&mut self, request_id: RequestId) -> Result<(), ReplyMismatch> {
        match self.phase {
            ConversationPhase::Idle => Err(ReplyMismatch::NotAwaiting),
            ConversationPhase::Awaiting { request_id: outstanding } if outstanding != request_id => {
                Err(ReplyMismatch::StaleRequest { outstanding })
            }
            ConversationPhase::Awaiting { .. } => {
                self.phase = ConversationPhase::Idle;
                Ok(())
            }
        }
    }

    fn append(&mut self, role: Role, content: String) {
        let id = MessageId(self.next_message_id);
        self.next_message_id += 1;
        self.transcript.push(Message {
            id,
            role,
            content,
            created_at: Utc::now(),
        });
    }
}

pub fn agent_introduction() -> &'static str {
    "Hello! I'm your Resume AI Agent. I'm here to help you optimize your resume to perfectly match job descriptions.

Here's what I can do for you:
• Analyze your resume and identify areas for improvement
• Match your skills and experience to specific job requirements
• Suggest targeted improvements to make your resume stand out
• Help you tailor your resume for different positions

To get started, please upload your resume PDF and share a job description (either by pasting the text or providing a URL). I'll then analyze both and provide personalized recommendations to help you land that interview!

What would you like to work on today?"
}
