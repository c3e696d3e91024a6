use std::sync::Arc;

use super::conversation::RequestId;
use super::upload::SelectedFile;

#[derive(Debug, Clone)]
pub enum AgentAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    SelectFile(SelectedFile),
    /// Files chosen through the picker; only the first is considered.
    PickFiles(Vec<SelectedFile>),
    RemoveFile,
    DragEnter,
    DragOver,
    DragLeave,
    Drop(Vec<SelectedFile>),
    SetDraft(String),
    SendMessage(String),
    SubmitDraft,
    ToggleTheme,
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    ResponseArrived {
        request_id: RequestId,
        text: String,
    },
    ResponseFailed {
        request_id: RequestId,
        reason: Arc<str>,
    },
    ResetSession,
}

impl UserAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectFile(_) => "select_file",
            Self::PickFiles(_) => "pick_files",
            Self::RemoveFile => "remove_file",
            Self::DragEnter => "drag_enter",
            Self::DragOver => "drag_over",
            Self::DragLeave => "drag_leave",
            Self::Drop(_) => "drop",
            Self::SetDraft(_) => "set_draft",
            Self::SendMessage(_) => "send_message",
            Self::SubmitDraft => "submit_draft",
            Self::ToggleTheme => "toggle_theme",
        }
    }
}

impl RuntimeAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResponseArrived { .. } => "response_arrived",
            Self::ResponseFailed { .. } => "response_failed",
            Self::ResetSession => "reset_session",
        }
    }
}
