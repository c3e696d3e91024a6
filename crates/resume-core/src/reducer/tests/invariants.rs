use super::*;
use pretty_assertions::assert_eq;

fn complete(state: &mut AgentState, request_id: RequestId, text: &str) {
    run_runtime(
        state,
        RuntimeAction::ResponseArrived {
            request_id,
            text: text.to_string(),
        },
    );
}

#[test]
fn message_ids_and_timestamps_follow_transcript_order() {
    let mut state = state();
    for turn in ["one", "two", "three"] {
        let request_id = send_and_expect_request(&mut state, turn);
        complete(&mut state, request_id, "ok");
    }

    let transcript = state.conversation.transcript();
    assert_eq!(transcript.len(), 6);
    for pair in transcript.windows(2) {
        assert!(pair[0].id < pair[1].id);
        assert!(pair[0].created_at <= pair[1].created_at);
    }
}

#[test]
fn roles_alternate_user_then_assistant() {
    let mut state = state();
    for turn in ["a", "b"] {
        let request_id = send_and_expect_request(&mut state, turn);
        run_user(&mut state, UserAction::SendMessage("ignored".to_string()));
        complete(&mut state, request_id, "reply");
    }

    let roles: Vec<Role> = state
        .conversation
        .transcript()
        .iter()
        .map(|message| message.role)
        .collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[test]
fn upload_actions_do_not_touch_conversation() {
    let mut state = state();
    let request_id = send_and_expect_request(&mut state, "Hello");

    run_user(&mut state, UserAction::DragEnter);
    run_user(&mut state, UserAction::Drop(vec![pdf("cv.pdf", 1)]));
    run_user(&mut state, UserAction::RemoveFile);
    run_user(&mut state, UserAction::ToggleTheme);

    assert!(state.conversation.is_pending());
    assert_eq!(state.conversation.transcript().len(), 1);

    complete(&mut state, request_id, "done");
    assert!(!state.conversation.is_pending());
}

#[test]
fn draft_edits_never_change_pending() {
    let mut state = state();
    run_user(&mut state, UserAction::SetDraft("typing".to_string()));
    assert!(!state.conversation.is_pending());

    send_and_expect_request(&mut state, "Hello");
    run_user(&mut state, UserAction::SetDraft("more typing".to_string()));
    assert!(state.conversation.is_pending());
    assert_eq!(state.conversation.draft(), "more typing");
}
