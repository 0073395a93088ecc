use std::path::{Path, PathBuf};

use clap::Parser;

use crate::archive::PackOptions;
use crate::walk::{SpecialFilePolicy, WalkOptions};
use crate::zip::WriteOptions;

#[derive(Parser, Debug)]
#[command(name = "zipdir")]
#[command(version)]
#[command(about = "zipdir is a tool to zip a directory", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipdir -i proj -o out.zip              pack proj/ into out.zip\n  \
  zipdir -u -i out.zip -o restored       unpack out.zip into restored/\n  \
  zipdir -l -i out.zip                   list the members of out.zip")]
pub struct Cli {
    /// Path to dir which should be zipped (the archive with -u or -l)
    #[arg(short = 'i', long = "in", value_name = "PATH")]
    pub input: PathBuf,

    /// Output zip file including path (the destination dir with -u)
    #[arg(short = 'o', long = "out", value_name = "PATH", required_unless_present = "list")]
    pub output: Option<PathBuf>,

    /// Unpack the archive given by -i into the directory given by -o
    #[arg(short = 'u', long, conflicts_with = "list")]
    pub unpack: bool,

    /// List the members of the archive given by -i
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Store files without compression
    #[arg(long, conflicts_with_all = ["unpack", "list"])]
    pub store: bool,

    /// DEFLATE compression level
    #[arg(
        long,
        value_name = "0-9",
        value_parser = clap::value_parser!(u32).range(0..=9),
        conflicts_with_all = ["unpack", "list"]
    )]
    pub level: Option<u32>,

    /// Fail instead of skipping symlinks and other special files
    #[arg(long, conflicts_with_all = ["unpack", "list"])]
    pub fail_on_special: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// What the invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Pack,
    Unpack,
    List,
}

/// Outcome of checking the arguments against the filesystem.
///
/// Errors must stop the command; warnings are for the caller to report.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.list {
            Mode::List
        } else if self.unpack {
            Mode::Unpack
        } else {
            Mode::Pack
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    pub fn pack_options(&self) -> PackOptions {
        let defaults = WriteOptions::default();
        PackOptions {
            walk: WalkOptions {
                special_files: if self.fail_on_special {
                    SpecialFilePolicy::Fail
                } else {
                    SpecialFilePolicy::Skip
                },
            },
            write: WriteOptions {
                store: self.store,
                level: self.level.unwrap_or(defaults.level),
            },
        }
    }

    /// Check argument combinations and the paths they name.
    pub fn validate(&self) -> Validation {
        let mut result = Validation::default();

        if self.store && self.level.is_some() {
            result.errors.push("--level has no effect with --store".to_string());
        }

        match self.mode() {
            Mode::Pack => self.validate_pack(&mut result),
            Mode::Unpack | Mode::List => self.validate_unpack(&mut result),
        }

        result
    }

    fn validate_pack(&self, result: &mut Validation) {
        if !self.input.is_dir() {
            result
                .errors
                .push(format!("input '{}' is not a directory", self.input.display()));
            return;
        }

        let Some(output) = &self.output else { return };
        if output.is_dir() {
            result
                .errors
                .push(format!("output '{}' is a directory", output.display()));
        } else if is_inside(output, &self.input) {
            result.warnings.push(format!(
                "output '{}' is inside the input directory; later runs will pack it too",
                output.display()
            ));
        }
    }

    fn validate_unpack(&self, result: &mut Validation) {
        if !self.input.is_file() {
            result
                .errors
                .push(format!("input '{}' is not a file", self.input.display()));
        }

        if self.mode() != Mode::Unpack {
            return;
        }
        let Some(output) = &self.output else { return };
        if output.exists() && !output.is_dir() {
            result
                .errors
                .push(format!("output '{}' is not a directory", output.display()));
        } else if output
            .read_dir()
            .map(|mut items| items.next().is_some())
            .unwrap_or(false)
        {
            result.warnings.push(format!(
                "output directory '{}' is not empty; existing files may be overwritten",
                output.display()
            ));
        }
    }
}

/// Whether `path` would land somewhere below `dir`.
fn is_inside(path: &Path, dir: &Path) -> bool {
    let Ok(dir) = dir.canonicalize() else {
        return false;
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    parent
        .canonicalize()
        .map(|parent| parent.starts_with(&dir))
        .unwrap_or(false)
}
