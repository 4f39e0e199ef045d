//! Generation pipeline: gate, generate, parse, apply, persist, debit.
//!
//! The generator is a seam: anything that turns a prompt into reply
//! text. The CLI feeds replies from a file, stdin, or the clipboard so
//! runs stay reproducible; tests feed canned strings. A parsed reply
//! replaces the workspace's whole file map; a reply with no markers
//! falls back into the transcript as an `ai` message. Either way the
//! owner is debited the word count of the raw reply.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::meter;
use crate::core::parse::{DelimitedParser, ParseOutcome};
use crate::core::workspace::Workspace;
use crate::infra::store::{ChatMessage, Store};

/// Instructions appended to the transcript when asking for project code.
pub const CODE_GUIDANCE: &str = "\
You are a full-stack architect and developer. Analyze the requirements, \
pick a fitting stack, and reply with complete, production-ready project \
files. Format the output using <<<FILE /path/to/file>>> marker lines so \
every file can be parsed out of one reply. Only create files the request \
actually needs.";

/// Instructions appended when asking for a conversational reply.
pub const CHAT_GUIDANCE: &str = "\
You are a thoughtful teammate. Reply conversationally and concisely, \
follow the context of earlier turns, and say so plainly when you do not \
know something.";

/// Anything that can turn a prompt into reply text.
pub trait TextGenerator {
    fn generate(&mut self, prompt: &str) -> Result<String>;
}

/// Where the CLI reads a generator reply from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    File(PathBuf),
    Stdin,
    Clipboard,
}

impl ReplySource {
    /// Resolve the `--reply-from <path>` / `--from-clipboard` flags;
    /// a path of `-` means stdin.
    pub fn from_flags(reply_from: Option<PathBuf>, from_clipboard: bool) -> Result<Self> {
        if from_clipboard {
            return Ok(ReplySource::Clipboard);
        }
        match reply_from {
            Some(path) if path.as_os_str() == "-" => Ok(ReplySource::Stdin),
            Some(path) => Ok(ReplySource::File(path)),
            None => anyhow::bail!(
                "no reply source given: pass --reply-from <file> (or -) or --from-clipboard"
            ),
        }
    }
}

impl TextGenerator for ReplySource {
    fn generate(&mut self, _prompt: &str) -> Result<String> {
        match self {
            ReplySource::File(path) => fs::read_to_string(&path)
                .with_context(|| format!("read reply from {}", path.display())),
            ReplySource::Stdin => {
                std::io::read_to_string(std::io::stdin()).context("read reply from stdin")
            }
            ReplySource::Clipboard => get_clipboard_content(),
        }
    }
}

fn get_clipboard_content() -> Result<String> {
    use arboard::Clipboard;
    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
    clipboard
        .get_text()
        .context("Failed to get text from clipboard")
}

/// What one generation run did (or would do, under dry-run).
#[derive(Debug)]
pub struct GenerationReport {
    pub workspace_id: String,
    /// Applied paths in map order; None when the reply had no markers.
    pub applied: Option<Vec<String>>,
    pub cost: u64,
    pub balance: u64,
    pub dry_run: bool,
}

/// What one chat turn did (or would do, under dry-run).
#[derive(Debug)]
pub struct ChatReport {
    pub reply: String,
    pub cost: u64,
    pub balance: u64,
    pub dry_run: bool,
}

/// Ask for project code and apply the reply to the workspace.
///
/// An extra prompt (if given) joins the transcript first. Under dry-run
/// the parsed outcome is reported but nothing is persisted or debited.
#[instrument(skip_all, fields(id = %workspace_id))]
pub fn run_generation(
    store: &Store,
    workspace_id: &str,
    extra_prompt: Option<&str>,
    generator: &mut dyn TextGenerator,
    dry_run: bool,
) -> Result<GenerationReport> {
    let mut record = store.get_workspace(workspace_id)?;
    let user = store.get_user(&record.user)?;
    meter::check_gate(user.token)?;

    if let Some(text) = extra_prompt {
        record.messages.push(ChatMessage::user(text));
    }
    let prompt = compose_prompt(&record.messages, CODE_GUIDANCE)?;
    let raw = generator.generate(&prompt).context("text generator failed")?;
    let cost = meter::count_words(&raw) as u64;

    let mut ws = Workspace::load(record.files.clone(), record.selected.clone());
    let applied = match DelimitedParser::new().parse(&raw) {
        ParseOutcome::Files(map) => {
            ws.replace_all(map);
            Some(ws.files().keys().cloned().collect::<Vec<_>>())
        }
        ParseOutcome::NoFiles => {
            record.messages.push(ChatMessage::ai(raw));
            None
        }
    };

    let balance = meter::debit(user.token, cost);
    if dry_run {
        return Ok(GenerationReport {
            workspace_id: record.id,
            applied,
            cost,
            balance,
            dry_run: true,
        });
    }

    record.files = ws.files().clone();
    record.selected = ws.selected().map(str::to_string);
    store.save_workspace(&mut record)?;
    ws.mark_saved();
    store.update_token(&record.user, balance)?;
    info!(
        files = applied.as_ref().map(Vec::len),
        cost, balance, "generation applied"
    );

    Ok(GenerationReport {
        workspace_id: record.id,
        applied,
        cost,
        balance,
        dry_run: false,
    })
}

/// One chat turn: the user message joins the transcript, the reply is
/// appended as an `ai` message, and the owner pays the word count of
/// the serialized reply.
#[instrument(skip_all, fields(id = %workspace_id))]
pub fn run_chat(
    store: &Store,
    workspace_id: &str,
    message: &str,
    generator: &mut dyn TextGenerator,
    dry_run: bool,
) -> Result<ChatReport> {
    let mut record = store.get_workspace(workspace_id)?;
    let user = store.get_user(&record.user)?;
    meter::check_gate(user.token)?;

    record.messages.push(ChatMessage::user(message));
    let prompt = compose_prompt(&record.messages, CHAT_GUIDANCE)?;
    let raw = generator.generate(&prompt).context("text generator failed")?;

    let reply = ChatMessage::ai(raw);
    let serialized = serde_json::to_string(&reply).context("serialize reply")?;
    let cost = meter::count_words(&serialized) as u64;
    let balance = meter::debit(user.token, cost);

    if dry_run {
        return Ok(ChatReport {
            reply: reply.content,
            cost,
            balance,
            dry_run: true,
        });
    }

    record.messages.push(reply.clone());
    store.save_workspace(&mut record)?;
    store.update_token(&record.user, balance)?;
    info!(cost, balance, "chat reply recorded");

    Ok(ChatReport {
        reply: reply.content,
        cost,
        balance,
        dry_run: false,
    })
}

/// The transcript serialized as JSON with guidance appended, the same
/// shape the transcript is stored in.
fn compose_prompt(messages: &[ChatMessage], guidance: &str) -> Result<String> {
    let transcript = serde_json::to_string(messages).context("serialize transcript")?;
    Ok(format!("{transcript} {guidance}"))
}
