use std::sync::Arc;
use std::time::Duration;

use resume_core::reduce;
use resume_core::AgentAction;
use resume_core::AgentEffect;
use resume_core::AgentState;
use resume_core::ConversationState;
use resume_core::Message;
use resume_core::PreferenceStorage;
use resume_core::PreferenceStore;
use resume_core::RequestId;
use resume_core::RuntimeAction;
use resume_core::ThemeMode;
use resume_core::ThemeSurface;
use resume_core::UploadState;
use resume_core::UserAction;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::contracts::ReplyRequest;
use crate::contracts::ResponderError;
use crate::contracts::SessionClosed;
use crate::responder::Responder;

/// What the presentation layer renders. Published after every accepted transition;
/// a slow subscriber only sees the latest one.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub revision: u64,
    pub upload: UploadState,
    pub conversation: ConversationState,
    pub theme: ThemeMode,
}

impl ViewSnapshot {
    pub fn is_loading(&self) -> bool {
        self.conversation.is_pending()
    }

    pub fn upload_guidance(&self) -> Option<&'static str> {
        self.upload.last_error().map(|reason| reason.guidance())
    }
}

/// Host-side effects of one transition. Every batch is delivered, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEffects {
    /// Revision of the snapshot published by the same transition.
    pub revision: u64,
    pub effects: Vec<AgentEffect>,
    pub notice: Option<Arc<str>>,
}

#[derive(Debug)]
enum SessionCommand {
    Dispatch(UserAction),
    Reset,
    Shutdown,
}

pub struct SessionOptions {
    pub reply_timeout: Option<Duration>,
}

pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<ViewSnapshot>,
    effects: Option<mpsc::UnboundedReceiver<HostEffects>>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn dispatch(&self, action: UserAction) -> Result<(), SessionClosed> {
        self.commands
            .send(SessionCommand::Dispatch(action))
            .map_err(|_| SessionClosed)
    }

    /// Clears the transcript and upload. Not reachable from user input.
    pub fn reset(&self) -> Result<(), SessionClosed> {
        self.commands
            .send(SessionCommand::Reset)
            .map_err(|_| SessionClosed)
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshots.borrow().clone()
    }

    /// The effect stream has a single consumer; later calls return `None`.
    pub fn take_effects(&mut self) -> Option<mpsc::UnboundedReceiver<HostEffects>> {
        self.effects.take()
    }

    pub async fn shutdown(self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "agent session task ended abnormally");
        }
    }
}

/// Single event-processing task that owns the controllers. User commands and
/// responder completions are both serialized through it.
pub struct AgentSession<S, T> {
    state: AgentState,
    preferences: PreferenceStore<S, T>,
    responder: Arc<dyn Responder>,
    reply_timeout: Option<Duration>,
    replies: mpsc::UnboundedSender<RuntimeAction>,
    snapshots: watch::Sender<ViewSnapshot>,
    effects: mpsc::UnboundedSender<HostEffects>,
    revision: u64,
}

impl<S, T> AgentSession<S, T>
where
    S: PreferenceStorage + 'static,
    T: ThemeSurface + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        responder: Arc<dyn Responder>,
        preferences: PreferenceStore<S, T>,
        options: SessionOptions,
    ) -> SessionHandle {
        let state = AgentState::new();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        let (effects_tx, effects_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(ViewSnapshot {
            revision: 0,
            upload: state.upload.clone(),
            conversation: state.conversation.clone(),
            theme: preferences.mode(),
        });

        tracing::info!(
            responder = responder.name(),
            theme = preferences.mode().label(),
            "agent session started"
        );
        let session = Self {
            state,
            preferences,
            responder,
            reply_timeout: options.reply_timeout,
            replies: replies_tx,
            snapshots: snapshots_tx,
            effects: effects_tx,
            revision: 0,
        };
        let task = tokio::spawn(session.run(commands_rx, replies_rx));

        SessionHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
            effects: Some(effects_rx),
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut replies: mpsc::UnboundedReceiver<RuntimeAction>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Dispatch(action)) => self.apply(AgentAction::User(action)),
                    Some(SessionCommand::Reset) => {
                        self.apply(AgentAction::Runtime(RuntimeAction::ResetSession))
                    }
                    Some(SessionCommand::Shutdown) | None => break,
                },
                Some(reply) = replies.recv() => self.apply(AgentAction::Runtime(reply)),
            }
        }
        tracing::info!("agent session stopped");
    }

    fn apply(&mut self, action: AgentAction) {
        let effects = reduce(&mut self.state, action);
        if effects.is_empty() {
            return;
        }

        let mut host_effects = Vec::with_capacity(effects.len());
        let mut notice = None;
        for effect in effects {
            match effect {
                AgentEffect::RequestReply {
                    request_id,
                    transcript,
                } => self.request_reply(request_id, transcript),
                AgentEffect::ToggleTheme => {
                    if let Err(err) = self.preferences.toggle() {
                        tracing::warn!(error = %err, "theme change could not be saved");
                        notice = Some(Arc::from(format!("Theme not changed: {err}")));
                    }
                }
                other => host_effects.push(other),
            }
        }
        self.publish(host_effects, notice);
    }

    fn request_reply(&self, request_id: RequestId, transcript: Vec<Message>) {
        let responder = Arc::clone(&self.responder);
        let replies = self.replies.clone();
        let reply_timeout = self.reply_timeout;
        tokio::spawn(async move {
            let request = ReplyRequest {
                request_id,
                transcript,
            };
            let outcome = match reply_timeout {
                Some(limit) => match tokio::time::timeout(limit, responder.respond(&request)).await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ResponderError::TimedOut(limit)),
                },
                None => responder.respond(&request).await,
            };

            let action = match outcome {
                Ok(text) => RuntimeAction::ResponseArrived { request_id, text },
                Err(err) => {
                    tracing::warn!(
                        request_id = request_id.0,
                        responder = responder.name(),
                        error = %err,
                        "responder failed"
                    );
                    RuntimeAction::ResponseFailed {
                        request_id,
                        reason: Arc::from(err.to_string()),
                    }
                }
            };
            if replies.send(action).is_err() {
                tracing::debug!(request_id = request_id.0, "session gone before reply");
            }
        });
    }

    fn publish(&mut self, effects: Vec<AgentEffect>, notice: Option<Arc<str>>) {
        self.revision += 1;
        self.snapshots.send_replace(ViewSnapshot {
            revision: self.revision,
            upload: self.state.upload.clone(),
            conversation: self.state.conversation.clone(),
            theme: self.preferences.mode(),
        });
        if effects.is_empty() && notice.is_none() {
            return;
        }
        let batch = HostEffects {
            revision: self.revision,
            effects,
            notice,
        };
        if self.effects.send(batch).is_err() {
            tracing::trace!(revision = self.revision, "effect stream closed");
        }
    }
}
