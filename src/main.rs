//! docpatch: diff, apply and reconcile javadoc patches over parsed source trees.
//!
//! - `docpatch diff --clean clean/ --modified modified/ --patches patches/`
//! - `docpatch apply --source clean/ --patches patches/ --output out/`
//! - `docpatch missed --source current/ --patches patches/ --output missed/`
//!
//! Paths not given on the command line come from `docpatch.toml`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docpatch::{BatchReport, Settings};

#[derive(Parser)]
#[command(
    name = "docpatch",
    version,
    about = "Diff, persist and reapply javadoc between a clean and a hand-documented source tree"
)]
struct Cli {
    /// Settings file (default: docpatch.toml, searched upward)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write patches holding the documentation that differs between two trees
    Diff {
        /// Baseline tree
        #[arg(long)]
        clean: Option<PathBuf>,
        /// Documented tree
        #[arg(long)]
        modified: Option<PathBuf>,
        /// Patch output directory (cleared first)
        #[arg(long)]
        patches: Option<PathBuf>,
        /// External symbol list, one qualified type per line
        #[arg(long)]
        symbols: Option<PathBuf>,
    },
    /// Apply patches to a tree and write the documented result
    Apply {
        /// Tree to document
        #[arg(long)]
        source: Option<PathBuf>,
        /// Patch directory
        #[arg(long)]
        patches: Option<PathBuf>,
        /// Output directory (cleared first)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Keep existing comments wrapped in this tag
        #[arg(long)]
        original_tag: Option<String>,
        /// Drop existing comments instead of keeping them as a fallback
        #[arg(long)]
        no_keep_original: bool,
        /// HTML-escape existing comments
        #[arg(long)]
        sanitize_original: bool,
        /// Shorten references to the names visible in each unit
        #[arg(long)]
        simplify_references: bool,
        /// External symbol list, one qualified type per line
        #[arg(long)]
        symbols: Option<PathBuf>,
    },
    /// Write the patch content that no longer attaches to a tree
    Missed {
        /// Current tree
        #[arg(long)]
        source: Option<PathBuf>,
        /// Patch directory
        #[arg(long)]
        patches: Option<PathBuf>,
        /// Output directory (cleared first)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    docpatch::init_tracing();
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let settings =
        Settings::load(cli.config.as_deref(), &cwd).context("failed to load settings")?;

    let report = match cli.command {
        Command::Diff {
            clean,
            modified,
            patches,
            symbols,
        } => {
            let clean = required(clean.or(settings.clean), "clean", "clean")?;
            let modified = required(modified.or(settings.modified), "modified", "modified")?;
            let patches = required(patches.or(settings.patches), "patches", "patches")?;
            let symbols = symbols.or(settings.symbols);
            docpatch::make_patches(&clean, &modified, &patches, symbols.as_deref())
                .with_context(|| format!("failed to diff {}", modified.display()))?
        }
        Command::Apply {
            source,
            patches,
            output,
            original_tag,
            no_keep_original,
            sanitize_original,
            simplify_references,
            symbols,
        } => {
            let mut options = settings.apply_options();
            if original_tag.is_some() {
                options.original_tag = original_tag;
            }
            options.keep_original &= !no_keep_original;
            options.sanitize_original |= sanitize_original;
            options.simplify_references |= simplify_references;

            let source = required(source.or(settings.clean), "source", "clean")?;
            let output = required(output.or(settings.output), "output", "output")?;
            let patches = patches.or(settings.patches);
            let symbols = symbols.or(settings.symbols);
            docpatch::apply_patches(
                &source,
                patches.as_deref(),
                &output,
                &options,
                symbols.as_deref(),
            )
            .with_context(|| format!("failed to apply patches to {}", source.display()))?
        }
        Command::Missed {
            source,
            patches,
            output,
        } => {
            let source = required(source.or(settings.clean), "source", "clean")?;
            let patches = required(patches.or(settings.patches), "patches", "patches")?;
            let output = required(output.or(settings.missed), "output", "missed")?;
            docpatch::missed_patches(&source, &patches, &output)
                .with_context(|| format!("failed to reconcile {}", patches.display()))?
        }
    };

    summarize(&report)
}

/// A path that must come from the command line or the settings file.
fn required(path: Option<PathBuf>, flag: &str, key: &str) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => bail!("--{} is required (or set `{}` in docpatch.toml)", flag, key),
    }
}

fn summarize(report: &BatchReport) -> Result<()> {
    eprintln!(
        "{} units processed, {} written, {} failed",
        report.processed,
        report.written,
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!("error: {}: {}", failure.unit, failure.error);
    }
    if !report.is_success() {
        bail!("{} unit(s) failed", report.failures.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_names_the_flag() {
        let err = required(None, "source", "clean").unwrap_err();
        assert!(err.to_string().contains("--source"));
        assert!(err.to_string().contains("`clean`"));
        assert_eq!(
            required(Some(PathBuf::from("x")), "patches", "patches").unwrap(),
            PathBuf::from("x")
        );
    }

    #[test]
    fn cli_parses_apply_flags() {
        let cli = Cli::try_parse_from([
            "docpatch",
            "apply",
            "--source",
            "src",
            "--output",
            "out",
            "--original-tag",
            "original",
            "--no-keep-original",
        ])
        .unwrap();
        match cli.command {
            Command::Apply {
                source,
                original_tag,
                no_keep_original,
                ..
            } => {
                assert_eq!(source, Some(PathBuf::from("src")));
                assert_eq!(original_tag.as_deref(), Some("original"));
                assert!(no_keep_original);
            }
            _ => panic!("expected apply"),
        }
    }
}
