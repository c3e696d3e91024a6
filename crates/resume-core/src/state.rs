use super::conversation::ConversationState;
use super::upload::UploadState;

pub const APP_TITLE: &str = "Resume AI Agent";

/// Everything the reducer owns. The theme lives in the preference store.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    pub upload: UploadState,
    pub conversation: ConversationState,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_pending()
    }

    /// Guidance for the most recent rejected selection, if any.
    pub fn upload_guidance(&self) -> Option<&'static str> {
        self.upload.last_error().map(|reason| reason.guidance())
    }
}
