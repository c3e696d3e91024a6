use std::path::PathBuf;

pub(super) use super::reduce;
pub(super) use super::AgentEffect;
pub(super) use crate::actions::AgentAction;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::conversation::agent_introduction;
pub(super) use crate::conversation::RequestId;
pub(super) use crate::conversation::Role;
pub(super) use crate::state::AgentState;
pub(super) use crate::upload::FileRejection;
pub(super) use crate::upload::FileSource;
pub(super) use crate::upload::SelectedFile;
pub(super) use crate::upload::MAX_UPLOAD_BYTES;
pub(super) use crate::upload::PDF_MEDIA_TYPE;

mod invariants;

fn state() -> AgentState {
    AgentState::new()
}

fn pdf(name: &str, size_bytes: u64) -> SelectedFile {
    SelectedFile::new(
        FileSource::Path(PathBuf::from(format!("/uploads/{name}"))),
        PDF_MEDIA_TYPE,
        size_bytes,
        name,
    )
}

fn other(name: &str, media_type: &str) -> SelectedFile {
    SelectedFile::new(
        FileSource::Memory(b"not a pdf".as_slice().into()),
        media_type,
        9,
        name,
    )
}

fn run_user(state: &mut AgentState, action: UserAction) -> Vec<AgentEffect> {
    reduce(state, AgentAction::User(action))
}

fn run_runtime(state: &mut AgentState, action: RuntimeAction) -> Vec<AgentEffect> {
    reduce(state, AgentAction::Runtime(action))
}

fn candidate_name(state: &AgentState) -> Option<&str> {
    state.upload.candidate().map(|file| file.name())
}

/// Sends `text` and returns the request the responder would be called with.
fn send_and_expect_request(state: &mut AgentState, text: &str) -> RequestId {
    let effects = run_user(state, UserAction::SendMessage(text.to_string()));
    let request = effects.iter().find_map(|effect| match effect {
        AgentEffect::RequestReply { request_id, .. } => Some(*request_id),
        _ => None,
    });
    let Some(request_id) = request else {
        panic!("expected a reply request for {text:?}, got {effects:?}");
    };
    assert!(state.conversation.is_pending());
    request_id
}

fn transcript_pairs(state: &AgentState) -> Vec<(Role, String)> {
    state
        .conversation
        .transcript()
        .iter()
        .map(|message| (message.role, message.content.clone()))
        .collect()
}
