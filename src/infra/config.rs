use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Directory holding workspaces/ and users.json; `~` expands
    pub data_dir: String,

    /// Token balance granted to newly created users
    pub default_token_grant: u64,

    /// Placeholder file seeded into new workspaces
    pub default_file_name: String,

    /// Content of the seeded placeholder file
    pub default_file_content: String,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            data_dir: "~/.codeloom".to_string(),
            default_token_grant: 55_000,
            default_file_name: "index.js".to_string(),
            default_file_content: "// Write your code here...".to_string(),
        }
    }
}

impl Config
{
    /// The data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf
    {
        PathBuf::from(shellexpand::tilde(&self.data_dir).into_owned())
    }
}

pub fn load_config() -> Result<Config>
{
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    let config_paths = ["codeloom.toml", "codeloom.yaml", "codeloom.json", ".codeloom.toml"];

    for path in &config_paths
    {
        if Path::new(path).exists()
        {
            builder = builder.add_source(config::File::with_name(path));
            break;
        }
    }

    // Environment overrides: CODELOOM_DATA_DIR maps straight onto
    // data_dir, so no nesting separator here
    builder = builder.add_source(config::Environment::with_prefix("CODELOOM"));

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("codeloom.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would write:".yellow());
            println!("  {}", config_path.display());
        }
        return Ok(());
    }

    let config = Config::default();
    let body =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;
    let text = format!(
        "# codeloom configuration (every key is optional)\n\
         # data_dir: where workspace and user documents live; ~ expands to your home\n\
         # default_token_grant: balance given to users created with `loom user create`\n\n{body}"
    );

    std::fs::write(&config_path, text).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
