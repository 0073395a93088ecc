//! Main entry point for the zipdir CLI application.
//!
//! This binary packs a directory into a ZIP archive, or unpacks/lists an
//! existing archive, depending on the flags given.

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use zipdir::cli::Mode;
use zipdir::{Cli, FileSystem, LocalFileSystem};

/// Application entry point.
///
/// Parses command-line arguments, installs logging and dispatches to the
/// handler for the requested mode.
fn main() {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    if let Err(e) = run(&cli) {
        tracing::error!("Failed to run zipdir: {:?}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Validate the arguments, then run the requested mode.
fn run(cli: &Cli) -> Result<()> {
    let validation = cli.validate();
    for warning in &validation.warnings {
        tracing::warn!("{warning}");
    }
    if !validation.is_ok() {
        bail!("{}", validation.errors.join("; "));
    }

    let fs = LocalFileSystem::new();
    match cli.mode() {
        Mode::Pack => pack(&fs, cli),
        Mode::Unpack => unpack(&fs, cli),
        Mode::List => list(&fs, cli),
    }
}

fn pack(fs: &impl FileSystem, cli: &Cli) -> Result<()> {
    let output = cli.output.as_deref().context("missing --out")?;

    zipdir::pack_directory_to_file(fs, &cli.input, output, &cli.pack_options())
        .context("Failed to zip directory")?;

    if !cli.is_quiet() {
        println!("  packed: {} -> {}", cli.input.display(), output.display());
    }
    Ok(())
}

fn unpack(fs: &impl FileSystem, cli: &Cli) -> Result<()> {
    let output = cli.output.as_deref().context("missing --out")?;

    zipdir::unpack_file_to_directory(fs, &cli.input, output)
        .context("Failed to unzip archive")?;

    if !cli.is_quiet() {
        println!("  unpacked: {} -> {}", cli.input.display(), output.display());
    }
    Ok(())
}

/// List archive members in a table with sizes and compression ratio.
fn list(fs: &impl FileSystem, cli: &Cli) -> Result<()> {
    let archive = fs.read_file(&cli.input).context("Failed to read archive")?;
    let members = zipdir::list_archive(&archive).context("Failed to list archive")?;

    println!("{:>10}  {:>10}  {:>5}  {:>8}  Name", "Length", "Size", "Cmpr", "CRC-32");
    println!("{}", "-".repeat(60));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for member in &members {
        println!(
            "{:>10}  {:>10}  {}  {:08x}  {}",
            member.uncompressed_size,
            member.compressed_size,
            ratio(member.compressed_size, member.uncompressed_size),
            member.crc32,
            member.name
        );

        if !member.is_directory {
            total_uncompressed += member.uncompressed_size;
            total_compressed += member.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(60));
    println!(
        "{:>10}  {:>10}  {}  {:>8}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    );

    Ok(())
}

/// Percentage saved by compression, formatted to five columns.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}
