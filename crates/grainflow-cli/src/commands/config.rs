//! Engine configuration command.

use super::load_engine_config;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the config to this file instead of printing it
    #[arg(long, value_name = "PATH")]
    write: Option<PathBuf>,

    /// Validate and show an existing config file instead of the defaults
    #[arg(long, value_name = "PATH")]
    check: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_engine_config(args.check.as_deref())?;

    match &args.write {
        Some(path) => {
            if path.exists() && !args.force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config.save(path)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}
