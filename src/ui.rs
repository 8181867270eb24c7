use anyhow::{Context, Result};
use console::{Style, Term};
use pwdb::session::{Derived, Response, SiteInteraction};
use pwdb::{MasterSecret, PwdbError, SecretPrompt};
use rpassword::read_password;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

pub const REGISTRY_FILE_NAME: &str = ".pwdb";

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("✓", "!")
    } else {
        ("+", "!")
    }
}

fn tree_prefixes(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("├─", "└─")
    } else {
        ("|-", "`-")
    }
}

/// Logs go to stderr so stdout carries only prompts and passwords.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// `$HOME/.pwdb`
pub fn default_registry_path(home: Option<OsString>) -> Result<PathBuf> {
    let home = home
        .filter(|h| !h.is_empty())
        .context("HOME is not set; pass --file or set PWDB_FILE")?;
    Ok(PathBuf::from(home).join(REGISTRY_FILE_NAME))
}

fn normalize(s: &str) -> String {
    s.trim().nfc().collect()
}

fn control_char_positions(s: &str) -> Vec<usize> {
    s.chars()
        .enumerate()
        .filter(|(_, c)| c.is_control())
        .map(|(pos, _)| pos)
        .collect()
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn read_line() -> io::Result<Option<String>> {
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input))
}

fn ask(prompt: &str) -> io::Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    read_line()
}

/// Reads the next site name. End of input counts as an empty line.
pub fn prompt_site() -> Result<String> {
    loop {
        let Some(input) = ask("Enter site name: ").context("Failed to read site name")? else {
            println!();
            return Ok(String::new());
        };

        let normalized = normalize(&input);
        let positions = control_char_positions(&normalized);
        if positions.is_empty() {
            return Ok(normalized);
        }

        let term = Term::stderr();
        term.write_line(&format!(
            "WARNING: site name contains {} control character(s) at position(s): {}",
            positions.len(),
            positions
                .iter()
                .map(|pos| pos.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))?;
        term.write_str("Continue anyway? [y/N]: ")?;
        term.flush()?;

        let answer = read_line()?.unwrap_or_default();
        term.clear_last_lines(2)?;

        if is_yes(&answer) {
            return Ok(normalized);
        }
    }
}

/// Console side of the session: hidden master password entry and the
/// plain questions asked when a site is added.
pub struct Terminal;

impl SecretPrompt for Terminal {
    fn read_secret(&mut self, prompt: &str) -> io::Result<MasterSecret> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let password = Zeroizing::new(read_password()?);
        Ok(MasterSecret::new(normalize(&password)))
    }
}

impl SiteInteraction for Terminal {
    fn confirm_add(&mut self, site: &str) -> io::Result<bool> {
        let answer = ask(&format!("Site {} not recognized. Add? (y/N) ", site))?;
        Ok(answer.is_some_and(|a| is_yes(&a)))
    }

    fn read_alphabet_spec(&mut self, _site: &str) -> io::Result<String> {
        let answer = ask("Enter u, n, s depending on password requirements: ")?;
        Ok(answer.map(|a| normalize(&a)).unwrap_or_default())
    }
}

fn status_style(ok: bool, options: &DisplayOptions) -> Style {
    match (options.color_support, ok) {
        (false, _) => Style::new(),
        (true, true) => Style::new().green(),
        (true, false) => Style::new().yellow(),
    }
}

pub fn display_response(response: &Response, options: &DisplayOptions) {
    match response {
        Response::Password(derived) => display_password(derived, options),
        Response::Matches(sites) => display_matches(sites, options),
        Response::Declined(site) => {
            if !options.quiet {
                println!("Site {} not added.", site);
            }
        }
        Response::Finished => {}
    }
}

fn display_password(derived: &Derived, options: &DisplayOptions) {
    if options.quiet {
        println!("{}", &*derived.password);
        return;
    }

    if derived.registered {
        let (check_ok, _) = get_status_symbols(options.unicode_support);
        let style = status_style(true, options);
        println!(
            "{} Added {} ({})",
            style.apply_to(format!("[{}]", check_ok)),
            derived.site,
            display_spec(derived.spec.as_str())
        );
    }

    let label = if options.color_support {
        Style::new().dim()
    } else {
        Style::new()
    };
    println!("{}", label.apply_to(format!("{}:", derived.site)));
    println!("{}", &*derived.password);
}

fn display_spec(spec: &str) -> &str {
    if spec.is_empty() { "no required classes" } else { spec }
}

fn display_matches(sites: &[String], options: &DisplayOptions) {
    if options.quiet {
        for site in sites {
            println!("{}", site);
        }
        return;
    }

    if sites.is_empty() {
        println!("No matching sites.");
        return;
    }

    let (branch, last_branch) = tree_prefixes(options.unicode_support);
    println!("Matching sites:");
    for (i, site) in sites.iter().enumerate() {
        let prefix = if i == sites.len() - 1 {
            last_branch
        } else {
            branch
        };
        println!("  {} {}", prefix, site);
    }
}

pub fn display_error(err: &PwdbError, options: &DisplayOptions) {
    let (_, check_warn) = get_status_symbols(options.unicode_support);
    let style = status_style(false, options).for_stderr();
    eprintln!("{} {}", style.apply_to(format!("[{}]", check_warn)), err);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_status_symbols_unicode() {
        let (ok, warn) = get_status_symbols(true);
        assert_eq!(ok, "✓");
        assert_eq!(warn, "!");
    }

    #[test]
    fn test_get_status_symbols_ascii() {
        let (ok, warn) = get_status_symbols(false);
        assert_eq!(ok, "+");
        assert_eq!(warn, "!");
    }

    #[test]
    fn test_normalize_nfc() {
        let nfc = "café";
        let nfd = "cafe\u{0301}";

        assert_ne!(nfc.as_bytes(), nfd.as_bytes());
        assert_eq!(normalize(nfc).as_bytes(), normalize(nfd).as_bytes());
    }

    #[test]
    fn test_trim_whitespace() {
        let cases = vec![
            ("  example.com  ", "example.com"),
            ("\tbank\n", "bank"),
            ("bank\r\n", "bank"),
            (" café ", "café"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize(input), expected);
        }
    }

    #[test]
    fn test_empty_after_trim() {
        for input in ["   ", "\t\t", "\n", ""] {
            assert_eq!(normalize(input), "");
        }
    }

    #[test]
    fn test_control_char_positions() {
        assert!(control_char_positions("example.com").is_empty());
        assert_eq!(control_char_positions("ba\u{1}nk\u{7f}"), vec![2, 5]);
    }

    #[test]
    fn test_is_yes() {
        for answer in ["y", "Y", "yes", " YES\n"] {
            assert!(is_yes(answer), "{:?}", answer);
        }
        for answer in ["", "n", "no", "yep", "\n"] {
            assert!(!is_yes(answer), "{:?}", answer);
        }
    }

    #[test]
    fn test_default_registry_path() {
        let path = default_registry_path(Some(OsString::from("/home/rene"))).unwrap();
        assert_eq!(path, PathBuf::from("/home/rene/.pwdb"));
    }

    #[test]
    fn test_default_registry_path_requires_home() {
        assert!(default_registry_path(None).is_err());
        assert!(default_registry_path(Some(OsString::new())).is_err());
    }

    #[test]
    fn test_display_spec() {
        assert_eq!(display_spec(""), "no required classes");
        assert_eq!(display_spec("uns"), "uns");
    }
}
