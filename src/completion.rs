//! Shell completion scripts for the `loom` binary.

use std::path::PathBuf;
use std::{fs, io};

use anyhow::{Context, Result, bail};
use clap::CommandFactory;
use clap_complete::{Shell as CompletionShell, generate, generate_to};
use owo_colors::OwoColorize;

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
            Shell::Elvish => CompletionShell::Elvish,
        }
    }
}

/// Where the generated script goes; `--stdout` wins over `--out-dir`.
enum Target {
    Stdout,
    Dir(PathBuf),
}

impl Target {
    fn from_flags(stdout: bool, out_dir: Option<PathBuf>) -> Result<Self> {
        if stdout {
            return Ok(Target::Stdout);
        }
        match out_dir {
            Some(dir) => Ok(Target::Dir(dir)),
            None => bail!("--out-dir is required unless --stdout is set"),
        }
    }
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    let target = Target::from_flags(args.stdout, args.out_dir)?;
    let mut cmd = Cli::command();
    let shell: CompletionShell = args.shell.into();
    // The script completes whatever the binary is actually called
    let bin = cmd.get_name().to_string();

    match target {
        Target::Stdout => generate(shell, &mut cmd, bin, &mut io::stdout()),
        Target::Dir(dir) => {
            if ctx.dry_run {
                if !ctx.quiet {
                    println!("{}", "DRY RUN: Would write:".yellow());
                    println!("  {} completion under {}", bin, dir.display());
                }
                return Ok(());
            }
            fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
            let path =
                generate_to(shell, &mut cmd, bin, &dir).context("generate completion file")?;
            if !ctx.quiet {
                eprintln!("Wrote completion to {}", path.display());
            }
        }
    }
    Ok(())
}
