//! CLI command handlers for workspace, user, and reply-parsing commands.
//!
//! Thin layer between clap args and the core pipeline: resolve inputs,
//! run the operation against the store, print human or JSON output.

use std::fs;
use std::io;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use serde_json::json;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::cli::{
    AddArgs, AppContext, ApplyArgs, ChatArgs, DeleteArgs, EditArgs, ExportArgs, ListArgs, NewArgs,
    ParseArgs, RenameArgs, ShowArgs, UserArgs, UserCreateArgs, UserGrantArgs, UserShowArgs,
    UserSubcommand,
};
use crate::core::export::export_files;
use crate::core::generate::{self, ReplySource, TextGenerator};
use crate::core::parse::{DelimitedParser, ParseOutcome};
use crate::core::workspace::Workspace;
use crate::infra::config::load_config;
use crate::infra::store::{ChatMessage, open_store};

/// Create a workspace for a registered user, seeded from config defaults.
#[instrument(skip(args, ctx))]
pub fn new_run(args: NewArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let owner = store.get_user(&args.user)?;
    let config = load_config().unwrap_or_default();
    let seed = Workspace::seeded(&config.default_file_name, &config.default_file_content);

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would create:".yellow());
            println!(
                "  workspace for {} seeded with {}",
                owner.email, config.default_file_name
            );
        }
        return Ok(());
    }

    let messages = match &args.prompt
    {
        Some(text) => vec![ChatMessage::user(text)],
        None => Vec::new(),
    };
    let record = store.create_workspace(&owner.email, messages, seed.files().clone())?;

    if args.json
    {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }
    if !ctx.quiet
    {
        println!("{} {}", "Created workspace".green().bold(), record.id);
    }
    Ok(())
}

pub fn list_run(args: ListArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let summaries = store.list_workspaces(args.user.as_deref())?;

    if args.json
    {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    if summaries.is_empty()
    {
        if !ctx.quiet
        {
            println!("No workspaces yet");
        }
        return Ok(());
    }

    #[derive(Tabled)]
    struct Row
    {
        id: String,
        user: String,
        files: usize,
        messages: usize,
        updated: String,
    }

    let rows: Vec<Row> = summaries
        .into_iter()
        .map(|s| {
            Row {
                id: s.id,
                user: s.user,
                files: s.files,
                messages: s.messages,
                updated: s.updated_at,
            }
        })
        .collect();

    let table = Table::new(rows).to_string();
    println!("{}", table);
    Ok(())
}

pub fn show_run(args: ShowArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let record = store.get_workspace(&args.id)?;

    if let Some(path) = &args.file
    {
        let ws = Workspace::load(record.files, record.selected);
        let Some(content) = ws.content(path)
        else
        {
            bail!("no file {} in workspace {}", path, args.id);
        };
        let text = content.text();
        print!("{}", text);
        if !text.ends_with('\n')
        {
            println!();
        }
        return Ok(());
    }

    if args.json
    {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("{} {}", "Workspace".bold(), record.id);
    println!("  owner:   {}", record.user);
    println!("  created: {}", record.created_at);
    println!("  updated: {}", record.updated_at);
    if let Some(selected) = &record.selected
    {
        println!("  selected: {}", selected.cyan());
    }

    if !record.messages.is_empty()
    {
        println!();
        println!("{}", "Transcript".bold());
        for message in &record.messages
        {
            println!("  {} {}", format!("{}:", message.role).bold(), message.content);
        }
    }

    println!();
    println!("{}", "Files".bold());
    for (path, content) in &record.files
    {
        println!("  {} ({} bytes)", path.cyan(), content.text().len());
    }
    Ok(())
}

pub fn add_run(args: AddArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let record = store.get_workspace(&args.id)?;
    let mut ws = Workspace::load(record.files, record.selected);
    let path = ws.add_file("// New file");

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would add:".yellow());
            println!("  {}", path);
        }
        return Ok(());
    }

    store.update_files(&args.id, ws.files().clone(), ws.selected().map(str::to_string))?;
    ws.mark_saved();
    if !ctx.quiet
    {
        println!("{} {}", "Added".green().bold(), path);
    }
    Ok(())
}

pub fn rename_run(args: RenameArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let record = store.get_workspace(&args.id)?;
    let mut ws = Workspace::load(record.files, record.selected);

    let moves = ws.rename(&args.path, &args.new_name);
    if moves.is_empty()
    {
        if !ctx.quiet
        {
            println!("Nothing to rename at {}", args.path);
        }
        return Ok(());
    }

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would rename:".yellow());
            for (from, to) in &moves
            {
                println!("  {} -> {}", from, to);
            }
        }
        return Ok(());
    }

    store.update_files(&args.id, ws.files().clone(), ws.selected().map(str::to_string))?;
    ws.mark_saved();
    if !ctx.quiet
    {
        for (from, to) in &moves
        {
            println!("{} {} -> {}", "Renamed".green().bold(), from, to);
        }
    }
    Ok(())
}

pub fn delete_run(args: DeleteArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let record = store.get_workspace(&args.id)?;
    let mut ws = Workspace::load(record.files, record.selected);

    let removed = ws.delete(&args.path);
    if removed == 0
    {
        if !ctx.quiet
        {
            println!("Nothing to delete at {}", args.path);
        }
        return Ok(());
    }

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would delete:".yellow());
            println!("  {} file(s) under {}", removed, args.path);
        }
        return Ok(());
    }

    store.update_files(&args.id, ws.files().clone(), ws.selected().map(str::to_string))?;
    ws.mark_saved();
    if !ctx.quiet
    {
        println!("{} {} file(s) under {}", "Deleted".green().bold(), removed, args.path);
    }
    Ok(())
}

pub fn edit_run(args: EditArgs, ctx: &AppContext) -> Result<()>
{
    let text = read_edit_content(&args)?;
    let store = open_store(ctx)?;
    let record = store.get_workspace(&args.id)?;
    let mut ws = Workspace::load(record.files, record.selected);

    if !ws.edit_content(&args.path, &text)
    {
        bail!("no file {} in workspace {}", args.path, args.id);
    }

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would write:".yellow());
            println!("  {} ({} bytes)", args.path, text.len());
        }
        return Ok(());
    }

    store.update_files(&args.id, ws.files().clone(), ws.selected().map(str::to_string))?;
    ws.mark_saved();
    if !ctx.quiet
    {
        println!("{} {}", "Updated".green().bold(), args.path);
    }
    Ok(())
}

fn read_edit_content(args: &EditArgs) -> Result<String>
{
    if let Some(text) = &args.content
    {
        return Ok(text.clone());
    }
    match &args.from_file
    {
        Some(path) if path.as_os_str() == "-" =>
        {
            io::read_to_string(io::stdin()).context("read content from stdin")
        }
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read content from {}", path.display())),
        None => bail!("pass --content <text> or --from-file <path>"),
    }
}

/// Run one generation turn against a workspace.
#[instrument(skip(args, ctx))]
pub fn apply_run(args: ApplyArgs, ctx: &AppContext) -> Result<()>
{
    let mut source = ReplySource::from_flags(args.reply_from.clone(), args.from_clipboard)?;
    let store = open_store(ctx)?;
    let report =
        generate::run_generation(&store, &args.id, args.prompt.as_deref(), &mut source, ctx.dry_run)?;

    if args.json
    {
        let output = json!({
            "workspace": report.workspace_id,
            "applied": report.applied,
            "cost": report.cost,
            "balance": report.balance,
            "dry_run": report.dry_run,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    match &report.applied
    {
        Some(paths) if !ctx.quiet =>
        {
            if report.dry_run
            {
                println!("{}", "DRY RUN: Would apply:".yellow());
            }
            else
            {
                println!("{} {} file(s)", "Applied".green().bold(), paths.len());
            }
            for path in paths
            {
                println!("  {}", path.cyan());
            }
        }
        None if !ctx.quiet =>
        {
            let notice = if report.dry_run
            {
                "DRY RUN: No file markers; would record the reply as a chat message"
            }
            else
            {
                "No file markers; reply recorded as a chat message"
            };
            println!("{}", notice.yellow());
        }
        _ => {}
    }
    if !ctx.quiet
    {
        println!("  cost: {} tokens, balance: {}", report.cost, report.balance);
    }
    Ok(())
}

/// Run one conversational turn against a workspace.
#[instrument(skip(args, ctx))]
pub fn chat_run(args: ChatArgs, ctx: &AppContext) -> Result<()>
{
    let mut source = ReplySource::from_flags(args.reply_from.clone(), args.from_clipboard)?;
    let store = open_store(ctx)?;
    let report = generate::run_chat(&store, &args.id, &args.message, &mut source, ctx.dry_run)?;

    if args.json
    {
        let output = json!({
            "reply": report.reply,
            "cost": report.cost,
            "balance": report.balance,
            "dry_run": report.dry_run,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if report.dry_run && !ctx.quiet
    {
        println!("{}", "DRY RUN: Reply not persisted".yellow());
    }
    println!("{} {}", "ai:".bold(), report.reply);
    if !ctx.quiet
    {
        println!("  cost: {} tokens, balance: {}", report.cost, report.balance);
    }
    Ok(())
}

/// Parse a delimited reply from a file, stdin, or the clipboard.
pub fn parse_run(args: ParseArgs, _ctx: &AppContext) -> Result<()>
{
    let raw = read_reply_input(&args)?;
    let outcome = DelimitedParser::new().parse(&raw);

    if args.json
    {
        // Same envelope a generation endpoint would return
        let files = match &outcome
        {
            ParseOutcome::Files(map) => json!(map),
            ParseOutcome::NoFiles => serde_json::Value::Null,
        };
        let output = json!({ "files": files, "raw": raw });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match &outcome
    {
        ParseOutcome::Files(map) =>
        {
            println!("{} {} file(s)", "Parsed".green().bold(), map.len());
            for (path, content) in map
            {
                println!("  {} ({} bytes)", path.cyan(), content.text().len());
            }
        }
        ParseOutcome::NoFiles =>
        {
            println!("{}", "No file markers found".yellow());
        }
    }
    Ok(())
}

fn read_reply_input(args: &ParseArgs) -> Result<String>
{
    let mut source = if args.from_clipboard
    {
        ReplySource::Clipboard
    }
    else
    {
        match &args.input
        {
            Some(path) if path.as_os_str() == "-" => ReplySource::Stdin,
            Some(path) => ReplySource::File(path.clone()),
            None => ReplySource::Stdin,
        }
    };
    source.generate("")
}

/// Write a workspace's files into a real directory tree.
#[instrument(skip(args, ctx))]
pub fn export_run(args: ExportArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let record = store.get_workspace(&args.id)?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would export:".yellow());
            println!(
                "  {} file(s) under {}",
                record.files.len(),
                args.out_dir.display()
            );
        }
        return Ok(());
    }

    let written = export_files(&record.files, &args.out_dir, args.force)?;
    if !ctx.quiet
    {
        println!(
            "{} {} file(s) to {}",
            "Exported".green().bold(),
            written.len(),
            args.out_dir.display()
        );
        for path in &written
        {
            println!("  {}", path.display());
        }
    }
    Ok(())
}

pub fn user_run(args: UserArgs, ctx: &AppContext) -> Result<()>
{
    match args.command
    {
        UserSubcommand::Create(args) => user_create_run(args, ctx),
        UserSubcommand::Show(args) => user_show_run(args, ctx),
        UserSubcommand::Grant(args) => user_grant_run(args, ctx),
    }
}

fn user_create_run(args: UserCreateArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let config = load_config().unwrap_or_default();
    let grant = args.grant.unwrap_or(config.default_token_grant);

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would register:".yellow());
            println!("  {} <{}> with {} tokens", args.name, args.email, grant);
        }
        return Ok(());
    }

    let (user, created) = store.create_user(&args.name, &args.email, grant)?;
    if args.json
    {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }
    if !ctx.quiet
    {
        if created
        {
            println!(
                "{} {} <{}> with {} tokens",
                "Registered".green().bold(),
                user.name,
                user.email,
                user.token
            );
        }
        else
        {
            println!(
                "{} <{}> already registered ({} tokens left)",
                user.name, user.email, user.token
            );
        }
    }
    Ok(())
}

fn user_show_run(args: UserShowArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let user = store.get_user(&args.email)?;

    if args.json
    {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    #[derive(Tabled)]
    struct Row
    {
        name: String,
        email: String,
        tokens: u64,
    }

    let table = Table::new(vec![Row {
        name: user.name,
        email: user.email,
        tokens: user.token,
    }])
    .to_string();
    println!("{}", table);
    Ok(())
}

fn user_grant_run(args: UserGrantArgs, ctx: &AppContext) -> Result<()>
{
    let store = open_store(ctx)?;
    let user = store.get_user(&args.email)?;
    let topped_up = user.token.saturating_add(args.amount);

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would grant:".yellow());
            println!("  {} -> {} tokens for {}", user.token, topped_up, user.email);
        }
        return Ok(());
    }

    let user = store.update_token(&args.email, topped_up)?;
    if !ctx.quiet
    {
        println!(
            "{} {} tokens, new balance {} for {}",
            "Granted".green().bold(),
            args.amount,
            user.token,
            user.email
        );
    }
    Ok(())
}
