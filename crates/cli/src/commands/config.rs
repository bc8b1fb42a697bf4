//! Config command - write the example configuration

use anyhow::{Context, Result, bail};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::commands::ensure_parent_dir;
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(&path, force),
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    ensure_parent_dir(path)?;

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = match options.open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        ),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to create config file: {}", path.display()));
        }
    };
    file.write_all(AppConfig::example_toml().as_bytes())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    tracing::info!(path = %path.display(), force = force, "Config file written");
    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Pick a default tone, structure and closing under [style]");
    println!("  2. Choose an [llm] provider; export the key named by api_key_env, or use \"stub\"");
    println!("  3. Run 'postcraft doctor' to check the setup");
    println!("  4. Try 'postcraft refine --text \"...\"'");

    Ok(())
}
