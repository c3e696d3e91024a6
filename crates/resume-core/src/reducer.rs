use super::actions::AgentAction;
use super::actions::RuntimeAction;
use super::actions::UserAction;
use super::conversation::Message;
use super::conversation::RequestId;
use super::state::AgentState;
use super::upload::FileRejection;
use super::upload::SelectedFile;
use super::upload::UploadState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEffect {
    RequestFrame,
    /// Drag and drop must not fall through to the platform's own handling.
    SuppressDefault,
    ResetPicker,
    ScrollToLatest,
    /// Emitted for every rejected selection attempt, even a repeat of the last one.
    ShowRejection(FileRejection),
    RequestReply {
        request_id: RequestId,
        transcript: Vec<Message>,
    },
    ToggleTheme,
}

pub fn reduce(state: &mut AgentState, action: AgentAction) -> Vec<AgentEffect> {
    match action {
        AgentAction::User(user) => {
            tracing::debug!(action = user.name(), "reduce user action");
            reduce_user(state, user)
        }
        AgentAction::Runtime(runtime) => {
            tracing::debug!(action = runtime.name(), "reduce runtime action");
            reduce_runtime(state, runtime)
        }
    }
}

fn reduce_user(state: &mut AgentState, action: UserAction) -> Vec<AgentEffect> {
    match action {
        UserAction::SelectFile(file) => {
            let mut effects = rejection_effect(state.upload.select_file(file));
            effects.push(AgentEffect::RequestFrame);
            effects
        }
        UserAction::PickFiles(files) => match select_first(&mut state.upload, files) {
            Some(outcome) => {
                let mut effects = rejection_effect(outcome);
                effects.push(AgentEffect::RequestFrame);
                effects
            }
            None => Vec::new(),
        },
        UserAction::RemoveFile => {
            state.upload.clear();
            vec![AgentEffect::ResetPicker, AgentEffect::RequestFrame]
        }
        UserAction::DragEnter | UserAction::DragOver => {
            state.upload.set_drag_active(true);
            vec![AgentEffect::SuppressDefault, AgentEffect::RequestFrame]
        }
        UserAction::DragLeave => {
            state.upload.set_drag_active(false);
            vec![AgentEffect::SuppressDefault, AgentEffect::RequestFrame]
        }
        UserAction::Drop(files) => {
            state.upload.set_drag_active(false);
            if files.len() > 1 {
                tracing::debug!(ignored = files.len() - 1, "extra dropped files ignored");
            }
            let mut effects = vec![AgentEffect::SuppressDefault];
            if let Some(outcome) = select_first(&mut state.upload, files) {
                effects.extend(rejection_effect(outcome));
            }
            effects.push(AgentEffect::RequestFrame);
            effects
        }
        UserAction::SetDraft(text) => {
            state.conversation.set_draft(text);
            vec![AgentEffect::RequestFrame]
        }
        UserAction::SendMessage(text) => send(state, &text),
        UserAction::SubmitDraft => {
            let draft = state.conversation.draft().to_string();
            send(state, &draft)
        }
        UserAction::ToggleTheme => vec![AgentEffect::ToggleTheme, AgentEffect::RequestFrame],
    }
}

fn reduce_runtime(state: &mut AgentState, action: RuntimeAction) -> Vec<AgentEffect> {
    match action {
        RuntimeAction::ResponseArrived { request_id, text } => {
            match state.conversation.complete(request_id, text) {
                Ok(()) => vec![AgentEffect::ScrollToLatest, AgentEffect::RequestFrame],
                Err(mismatch) => {
                    tracing::info!(
                        request_id = request_id.0,
                        ?mismatch,
                        "dropping reply for a request that is no longer outstanding"
                    );
                    Vec::new()
                }
            }
        }
        RuntimeAction::ResponseFailed { request_id, reason } => {
            match state.conversation.fail(request_id, reason) {
                Ok(()) => vec![AgentEffect::RequestFrame],
                Err(mismatch) => {
                    tracing::info!(
                        request_id = request_id.0,
                        ?mismatch,
                        "dropping failure for a request that is no longer outstanding"
                    );
                    Vec::new()
                }
            }
        }
        RuntimeAction::ResetSession => {
            state.conversation.reset();
            state.upload = UploadState::default();
            vec![AgentEffect::ResetPicker, AgentEffect::RequestFrame]
        }
    }
}

fn send(state: &mut AgentState, text: &str) -> Vec<AgentEffect> {
    match state.conversation.begin_send(text) {
        Some(request_id) => vec![
            AgentEffect::ScrollToLatest,
            AgentEffect::RequestReply {
                request_id,
                transcript: state.conversation.transcript().to_vec(),
            },
            AgentEffect::RequestFrame,
        ],
        None => Vec::new(),
    }
}

/// `None` when nothing was offered to the upload controller.
fn select_first(
    upload: &mut UploadState,
    files: Vec<SelectedFile>,
) -> Option<Result<(), FileRejection>> {
    files
        .into_iter()
        .next()
        .map(|file| upload.select_file(file))
}

fn rejection_effect(outcome: Result<(), FileRejection>) -> Vec<AgentEffect> {
    match outcome {
        Ok(()) => Vec::new(),
        Err(rejection) => vec![AgentEffect::ShowRejection(rejection)],
    }
}

#[cfg(test)]
mod tests;
