use anyhow::Result;
use clap::Parser;
use codeloom::cli::{AppContext, Cli, Commands};
use codeloom::cli_ext::workspace_cmd;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
        data_dir: cli.data_dir.clone(),
    };

    match cli.command {
        Commands::New(args) => workspace_cmd::new_run(args, &ctx),
        Commands::List(args) => workspace_cmd::list_run(args, &ctx),
        Commands::Show(args) => workspace_cmd::show_run(args, &ctx),
        Commands::Tree(args) => codeloom::tree_run(args, &ctx),
        Commands::Add(args) => workspace_cmd::add_run(args, &ctx),
        Commands::Rename(args) => workspace_cmd::rename_run(args, &ctx),
        Commands::Delete(args) => workspace_cmd::delete_run(args, &ctx),
        Commands::Edit(args) => workspace_cmd::edit_run(args, &ctx),
        Commands::Apply(args) => workspace_cmd::apply_run(args, &ctx),
        Commands::Chat(args) => workspace_cmd::chat_run(args, &ctx),
        Commands::Parse(args) => workspace_cmd::parse_run(args, &ctx),
        Commands::Export(args) => workspace_cmd::export_run(args, &ctx),
        Commands::User(args) => workspace_cmd::user_run(args, &ctx),
        Commands::Init(args) => codeloom::infra::config::init(args, &ctx),
        Commands::Completions(args) => codeloom::completion::run(args, &ctx),
    }
}
