mod ui;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use pwdb::{AlphabetSpec, PwdbError, Response, Session};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pwdb",
    version,
    author,
    about = "Deterministic per-site passwords from a single master password"
)]
struct Cli {
    /// Registry file [default: ~/.pwdb]
    #[arg(short, long, env = "PWDB_FILE", value_name = "PATH")]
    file: Option<PathBuf>,

    /// Set or reset the master password. Discards every registered site.
    #[arg(short = 's', long)]
    set_master: bool,

    /// Derive for a single site and exit
    #[arg(long, value_name = "NAME")]
    site: Option<String>,

    /// Character classes for --site: any of u (uppercase), n (digits), s (symbols)
    #[arg(long, value_name = "CLASSES", requires = "site", value_parser = AlphabetSpec::parse)]
    spec: Option<AlphabetSpec>,

    /// Print only passwords
    #[arg(short, long)]
    quiet: bool,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    ui::init_tracing(cli.verbose);

    let options = ui::DisplayOptions {
        unicode_support: ui::detect_unicode_support(),
        color_support: ui::detect_color_support(),
        quiet: cli.quiet,
    };

    let path = match cli.file {
        Some(path) => path,
        None => ui::default_registry_path(std::env::var_os("HOME"))?,
    };

    let mut terminal = ui::Terminal;

    let mut session = if cli.set_master {
        Session::initialize(&path, &mut terminal)
    } else {
        Session::open(&path, &mut terminal)
    }
    .with_context(|| format!("Failed to open registry {}", path.display()))?;

    if let Some(site) = cli.site {
        let response = session.request(&site, cli.spec, &mut terminal)?;
        ui::display_response(&response, &options);
        return Ok(());
    }

    if cli.set_master {
        if !options.quiet {
            println!("Registry initialized at {}", path.display());
        }
        return Ok(());
    }

    loop {
        let input = ui::prompt_site()?;
        match session.handle_input(&input, &mut terminal) {
            Ok(Response::Finished) => break,
            Ok(response) => ui::display_response(&response, &options),
            Err(PwdbError::Prompt(err)) => return Err(err).context("Failed to read input"),
            Err(err) => ui::display_error(&err, &options),
        }
    }

    Ok(())
}
