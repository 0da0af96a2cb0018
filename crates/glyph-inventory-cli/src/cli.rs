//! Command-line args and their processing.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use glyph_inventory::{
    check_texts, printable_block, Font, FontInventory, InventoryOptions, OutputFormat, TextCheck,
};

/// Glyph inventory and text coverage checks for TrueType fonts.
#[derive(Debug, Parser)]
#[command(name = "glyph-inventory", version, about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lists chars renderable by the font.
    Extract(ExtractArgs),
    /// Checks whether the font has glyphs for all chars in the provided strings.
    /// Exits with status 1 if any string is not fully covered.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Path to the TrueType font file.
    font: PathBuf,
    /// Output format: `text` (concatenated chars), `json` (glyph records) or `array`
    /// (JSON array of chars).
    #[arg(long, short, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Include non-printable chars, such as whitespace other than the space char.
    #[arg(long)]
    all: bool,
    /// Include control chars U+0000..=U+001F. Combine with `--all` to include control chars
    /// that are not printable.
    #[arg(long)]
    include_control: bool,
    /// File to write the output to. If not specified, the output is written to stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Path to the TrueType font file.
    font: PathBuf,
    /// Strings to check.
    #[arg(required = true)]
    texts: Vec<String>,
    /// Output check results as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    pub(crate) fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Extract(args) => args.run(),
            Command::Check(args) => args.run(),
        }
    }
}

fn read_font(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("cannot read font file `{}`", path.display()))
}

fn parse_font<'a>(path: &Path, bytes: &'a [u8]) -> anyhow::Result<Font<'a>> {
    Font::new(bytes).with_context(|| format!("cannot parse font `{}`", path.display()))
}

impl ExtractArgs {
    fn run(self) -> anyhow::Result<ExitCode> {
        let bytes = read_font(&self.font)?;
        let font = parse_font(&self.font, &bytes)?;
        let options = InventoryOptions::default()
            .printable_only(!self.all)
            .include_control_chars(self.include_control);
        let inventory = FontInventory::new(&font, &options);
        log::info!(
            "extracted {} chars from `{}`",
            inventory.glyph_count(),
            self.font.display()
        );

        write_summary(&inventory, font.glyph_count(), &mut io::stderr().lock())?;
        write_output(self.output.as_deref(), &inventory.render(self.format))?;
        Ok(ExitCode::SUCCESS)
    }
}

/// Counts inventory chars per printable block, in the order of first occurrence.
/// Chars outside named blocks are counted as `Other`.
fn block_counts(inventory: &FontInventory) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = vec![];
    for ch in inventory.chars() {
        let block = printable_block(ch).unwrap_or("Other");
        if let Some((_, count)) = counts.iter_mut().find(|(name, _)| *name == block) {
            *count += 1;
        } else {
            counts.push((block, 1));
        }
    }
    counts
}

fn write_summary(
    inventory: &FontInventory,
    total_glyphs: u16,
    out: &mut impl Write,
) -> io::Result<()> {
    let metadata = inventory.metadata();
    writeln!(
        out,
        "Font: {} ({})",
        metadata.full_name, metadata.postscript_name
    )?;
    writeln!(
        out,
        "Family: {}; subfamily: {}",
        metadata.family, metadata.subfamily
    )?;
    writeln!(
        out,
        "Chars: {} (font has {total_glyphs} glyphs)",
        inventory.glyph_count()
    )?;
    for (block, count) in block_counts(inventory) {
        writeln!(out, "  {block}: {count}")?;
    }
    Ok(())
}

fn write_output(path: Option<&Path>, output: &str) -> anyhow::Result<()> {
    if let Some(path) = path {
        fs::write(path, output)
            .with_context(|| format!("cannot write output to `{}`", path.display()))
    } else {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{output}").context("cannot write output to stdout")
    }
}

impl CheckArgs {
    fn run(self) -> anyhow::Result<ExitCode> {
        let bytes = read_font(&self.font)?;
        let font = parse_font(&self.font, &bytes)?;
        let checks = check_texts(&font, &self.texts);

        let mut stdout = io::stdout().lock();
        if self.json {
            serde_json::to_writer_pretty(&mut stdout, &checks)
                .context("cannot serialize check results")?;
            writeln!(stdout)?;
        } else {
            write_checks(&checks, &mut stdout)?;
        }

        Ok(if checks.iter().all(|check| check.all_exists) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}

fn write_checks(checks: &[TextCheck], out: &mut impl Write) -> io::Result<()> {
    for check in checks {
        if check.all_exists {
            writeln!(out, "OK {:?}", check.text)?;
        } else {
            let missing: String = check.distinct_missing_chars().into_iter().collect();
            writeln!(
                out,
                "MISSING {:?}: {} of {} chars are missing: {missing:?}",
                check.text,
                check.missing_chars.len(),
                check.chars.len()
            )?;
        }
    }
    Ok(())
}
