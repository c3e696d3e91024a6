use std::io;
use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::style::Color;
use crossterm::style::Stylize;
use resume_core::config::AgentConfig;
use resume_core::conversation::MessageId;
use resume_core::conversation::Role;
use resume_core::preferences::PreferenceStorage;
use resume_core::preferences::PreferenceStore;
use resume_core::preferences::ThemeMode;
use resume_core::preferences::ThemeSurface;
use resume_core::reducer::AgentEffect;
use resume_core::state::APP_TITLE;
use resume_core::upload::format_file_size;
use resume_core::upload::FileSource;
use resume_core::upload::SelectedFile;
use resume_core::UserAction;
use resume_exec::AgentSession;
use resume_exec::HostEffects;
use resume_exec::SessionHandle;
use resume_exec::SessionOptions;
use resume_exec::StubResponder;
use resume_exec::ViewSnapshot;
use tokio::sync::mpsc;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Message(String),
    Attach(PathBuf),
    Drop(Vec<PathBuf>),
    Remove,
    Theme,
    Status,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

enum Flow {
    Continue,
    Quit,
}

pub async fn run<S, T>(
    preferences: PreferenceStore<S, T>,
    config: &AgentConfig,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: PreferenceStorage + 'static,
    T: ThemeSurface + 'static,
{
    let responder = Arc::new(StubResponder::new(config.responder.stub_delay()));
    let mut handle = AgentSession::spawn(
        responder,
        preferences,
        SessionOptions {
            reply_timeout: config.responder.timeout(),
        },
    );
    let mut snapshots = handle.subscribe();
    let mut effects = handle
        .take_effects()
        .ok_or("agent session effect stream already taken")?;
    let mut lines = spawn_stdin_reader();
    let mut stdout = io::stdout();

    let initial = handle.snapshot();
    let mut renderer = Renderer::new(&initial);
    renderer.header(&initial, &mut stdout)?;

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                let snapshot = handle.snapshot();
                match handle_input(&handle, &snapshot, parse_input(&line), &mut stdout)? {
                    Flow::Continue => {}
                    Flow::Quit => break,
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                renderer.render(&snapshot, &mut stdout)?;
            }
            Some(batch) = effects.recv() => renderer.apply_effects(&batch, &mut stdout)?,
        }
    }

    handle.shutdown().await;
    Ok(())
}

pub fn print_commands() {
    println!("Commands:");
    println!("  <text>            send a message");
    println!("  <empty line>      send the kept draft");
    println!("  /attach PATH      choose a resume file");
    println!("  /drop PATH...     drop files onto the upload area (first one is used)");
    println!("  /remove           remove the attached file");
    println!("  /theme            toggle dark/light theme");
    println!("  /status           show the attached file and conversation state");
    println!("  /help             show this help");
    println!("  /quit             exit");
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    match name {
        "attach" if !rest.is_empty() => Input::Attach(PathBuf::from(rest)),
        "drop" => Input::Drop(rest.split_whitespace().map(PathBuf::from).collect()),
        "remove" => Input::Remove,
        "theme" => Input::Theme,
        "status" => Input::Status,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => Input::Unknown(trimmed.to_string()),
    }
}

fn handle_input(
    handle: &SessionHandle,
    snapshot: &ViewSnapshot,
    input: Input,
    out: &mut impl Write,
) -> Result<Flow, Box<dyn std::error::Error>> {
    let palette = palette_for(snapshot.theme);
    match input {
        Input::Empty => handle.dispatch(UserAction::SubmitDraft)?,
        Input::Message(text) => {
            if snapshot.is_loading() {
                writeln!(
                    out,
                    "{}",
                    "Still waiting for the assistant; kept as draft. Press Enter on an empty line to send it."
                        .with(palette.muted)
                )?;
                handle.dispatch(UserAction::SetDraft(text))?;
            } else {
                handle.dispatch(UserAction::SetDraft(text))?;
                handle.dispatch(UserAction::SubmitDraft)?;
            }
        }
        Input::Attach(path) => match inspect_file(&path) {
            Ok(file) => handle.dispatch(UserAction::PickFiles(vec![file]))?,
            Err(err) => writeln!(
                out,
                "{}",
                format!("Cannot read {}: {err}", path.display()).with(palette.error)
            )?,
        },
        Input::Drop(paths) => {
            handle.dispatch(UserAction::DragEnter)?;
            let mut files = Vec::with_capacity(paths.len());
            for path in paths {
                match inspect_file(&path) {
                    Ok(file) => files.push(file),
                    Err(err) => writeln!(
                        out,
                        "{}",
                        format!("Skipping {}: {err}", path.display()).with(palette.error)
                    )?,
                }
            }
            handle.dispatch(UserAction::Drop(files))?;
        }
        Input::Remove => handle.dispatch(UserAction::RemoveFile)?,
        Input::Theme => handle.dispatch(UserAction::ToggleTheme)?,
        Input::Status => write_status(snapshot, out)?,
        Input::Help => print_commands(),
        Input::Quit => return Ok(Flow::Quit),
        Input::Unknown(command) => writeln!(
            out,
            "{}",
            format!("Unknown command {command}; try /help").with(palette.error)
        )?,
    }
    Ok(Flow::Continue)
}

fn inspect_file(path: &Path) -> io::Result<SelectedFile> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(io::Error::other("not a regular file"));
    }
    let media_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MEDIA_TYPE);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile::new(
        FileSource::Path(path.to_path_buf()),
        media_type,
        metadata.len(),
        name,
    ))
}

#[derive(Debug, Clone, Copy)]
struct UiPalette {
    title: Color,
    user: Color,
    assistant: Color,
    muted: Color,
    success: Color,
    error: Color,
}

fn palette_for(theme: ThemeMode) -> UiPalette {
    match theme {
        ThemeMode::Light => UiPalette {
            title: Color::DarkBlue,
            user: Color::DarkBlue,
            assistant: Color::Black,
            muted: Color::DarkGrey,
            success: Color::DarkGreen,
            error: Color::DarkRed,
        },
        ThemeMode::Dark => UiPalette {
            title: Color::Cyan,
            user: Color::Cyan,
            assistant: Color::White,
            muted: Color::Grey,
            success: Color::Green,
            error: Color::Red,
        },
    }
}

/// Prints only what changed since the previous snapshot.
struct Renderer {
    last_message: Option<MessageId>,
    was_loading: bool,
    theme: ThemeMode,
    candidate: Option<String>,
    drag_active: bool,
}

impl Renderer {
    fn new(snapshot: &ViewSnapshot) -> Self {
        Self {
            last_message: snapshot.conversation.transcript().last().map(|m| m.id),
            was_loading: snapshot.is_loading(),
            theme: snapshot.theme,
            candidate: snapshot.upload.candidate().map(|f| f.name().to_string()),
            drag_active: snapshot.upload.drag_active(),
        }
    }

    fn header(&self, snapshot: &ViewSnapshot, out: &mut impl Write) -> io::Result<()> {
        let palette = palette_for(snapshot.theme);
        writeln!(out, "{}", APP_TITLE.with(palette.title).bold())?;
        writeln!(
            out,
            "{}",
            "Upload your resume PDF with /attach, then ask away. /help lists commands."
                .with(palette.muted)
        )
    }

    /// Rejections and notices arrive once per transition, so repeats are printed too.
    fn apply_effects(&mut self, batch: &HostEffects, out: &mut impl Write) -> io::Result<()> {
        let palette = palette_for(self.theme);
        for effect in &batch.effects {
            tracing::trace!(?effect, revision = batch.revision, "host effect");
            if let AgentEffect::ShowRejection(rejection) = effect {
                writeln!(out, "{}", rejection.guidance().with(palette.error))?;
            }
        }
        if let Some(notice) = &batch.notice {
            writeln!(out, "{}", notice.as_ref().with(palette.error))?;
        }
        out.flush()
    }

    fn render(&mut self, snapshot: &ViewSnapshot, out: &mut impl Write) -> io::Result<()> {
        if snapshot.theme != self.theme {
            self.theme = snapshot.theme;
            let palette = palette_for(self.theme);
            writeln!(
                out,
                "{}",
                format!("Theme: {}", self.theme.label()).with(palette.muted)
            )?;
        }
        let palette = palette_for(self.theme);

        let drag_active = snapshot.upload.drag_active();
        if drag_active && !self.drag_active {
            writeln!(out, "{}", "Drop your file here...".with(palette.muted))?;
        }
        self.drag_active = drag_active;

        let candidate = snapshot.upload.candidate();
        let candidate_name = candidate.map(|file| file.name().to_string());
        if candidate_name != self.candidate {
            match candidate {
                Some(file) => writeln!(
                    out,
                    "{}",
                    format!("Attached {} ({})", file.name(), file.size_label())
                        .with(palette.success)
                )?,
                None => writeln!(out, "{}", "Attachment removed.".with(palette.muted))?,
            }
            self.candidate = candidate_name;
        }

        let since = self.last_message;
        for message in snapshot
            .conversation
            .transcript()
            .iter()
            .filter(|message| since.map_or(true, |last| message.id > last))
        {
            let (label, color) = match message.role {
                Role::User => ("You", palette.user),
                Role::Assistant => ("Agent", palette.assistant),
            };
            writeln!(
                out,
                "{} {}",
                format!("{label} [{}]:", message.created_at.format("%H:%M")).with(color).bold(),
                message.content.as_str().with(color)
            )?;
            self.last_message = Some(message.id);
        }

        let loading = snapshot.is_loading();
        if loading && !self.was_loading {
            writeln!(out, "{}", "Agent is thinking...".with(palette.muted))?;
        }
        if !loading && self.was_loading {
            if let Some(err) = snapshot.conversation.last_error() {
                writeln!(
                    out,
                    "{}",
                    format!("No reply: {}. You can send again.", err.message).with(palette.error)
                )?;
            }
        }
        self.was_loading = loading;
        out.flush()
    }
}

fn write_status(snapshot: &ViewSnapshot, out: &mut impl Write) -> io::Result<()> {
    let palette = palette_for(snapshot.theme);
    let attachment = match snapshot.upload.candidate() {
        Some(file) => format!(
            "{} ({})",
            file.name(),
            format_file_size(file.size_bytes())
        ),
        None => "none".to_string(),
    };
    let state = if snapshot.is_loading() {
        "waiting for reply"
    } else {
        "idle"
    };
    writeln!(out, "{}", format!("Attachment: {attachment}").with(palette.muted))?;
    writeln!(
        out,
        "{}",
        format!(
            "Conversation: {state}, {} messages",
            snapshot.conversation.transcript().len()
        )
        .with(palette.muted)
    )?;
    writeln!(
        out,
        "{}",
        format!("Theme: {}", snapshot.theme.label()).with(palette.muted)
    )
}
