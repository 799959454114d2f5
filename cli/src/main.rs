//! unopc CLI - OPC package inspection tool
//!
//! A command-line tool for listing the parts and relationships of DOCX,
//! XLSX and PPTX packages.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use unopc::{JsonFormat, PackageReader, ReadOptions};

/// Inspect the part and relationship graph of Office packages
#[derive(Parser)]
#[command(
    name = "unopc",
    author = "iyulab",
    version,
    about = "Inspect OPC packages (docx, xlsx, pptx)",
    long_about = "unopc - Open Packaging Conventions package inspector.\n\n\
                  Resolves every part reachable from the package root and lists\n\
                  parts, relationships and content types."
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fail if the package reaches more than this many parts
    #[arg(long, global = true)]
    max_parts: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List parts in discovery order
    Parts {
        /// Package file or unzipped package directory
        input: PathBuf,
    },

    /// List relationships with their sources
    Rels {
        /// Package file or unzipped package directory
        input: PathBuf,

        /// Show only external relationships
        #[arg(long)]
        external: bool,
    },

    /// Write the package manifest as JSON
    Json {
        /// Package file or unzipped package directory
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Show package summary
    Info {
        /// Package file or unzipped package directory
        input: PathBuf,
    },

    /// Write every reachable part to a directory
    Extract {
        /// Package file or unzipped package directory
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Library logs go to stderr; `--verbose` enables debug, `RUST_LOG` overrides.
fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_module("unopc", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = ReadOptions::new();
    if let Some(max_parts) = cli.max_parts {
        options = options.with_max_parts(max_parts);
    }

    match cli.command {
        Commands::Parts { input } => {
            let package = read_package(&input, &options)?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for (partname, content_type, blob) in package.iter_sparts() {
                writeln!(
                    out,
                    "{:<48} {:>10}  {}",
                    partname.as_str(),
                    blob.len(),
                    content_type.dimmed()
                )?;
            }
        }

        Commands::Rels { input, external } => {
            let package = read_package(&input, &options)?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for (source, srel) in package.iter_srels() {
                if external && !srel.is_external() {
                    continue;
                }
                let target = if srel.is_external() {
                    format!("{} {}", srel.target_ref(), "(external)".yellow())
                } else {
                    srel.target_partname()?.to_string()
                };
                writeln!(
                    out,
                    "{} {} -> {}  {}",
                    source.as_str().bold(),
                    srel.r_id(),
                    target,
                    short_reltype(srel.reltype()).dimmed()
                )?;
            }
        }

        Commands::Json {
            input,
            output,
            compact,
        } => {
            let package = read_package(&input, &options)?;

            let format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let json = unopc::manifest::to_json(&package, format)?;

            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!(
                    "{} Wrote manifest: {}",
                    "✓".green().bold(),
                    path.display()
                );
            }
        }

        Commands::Info { input } => {
            let package = read_package(&input, &options)?;

            let kind = unopc::detect_format(&package)
                .map(|f| f.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            let relationships = package.iter_srels().count();
            let external = package
                .iter_srels()
                .filter(|(_, srel)| srel.is_external())
                .count();
            let total_size: usize = package.iter_sparts().map(|(_, _, blob)| blob.len()).sum();

            println!("{}", "Package Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Kind".bold(), kind);
            println!("{}: {}", "Parts".bold(), package.len());
            println!(
                "{}: {} ({} external)",
                "Relationships".bold(),
                relationships,
                external
            );
            println!("{}: {} bytes", "Part data".bold(), total_size);

            let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
            for (_, content_type, _) in package.iter_sparts() {
                *by_type.entry(content_type).or_default() += 1;
            }
            println!("\n{}", "Content Types".cyan().bold());
            println!("{}", "─".repeat(40));
            for (content_type, count) in by_type {
                println!("{:>5}  {}", count, content_type);
            }
        }

        Commands::Extract { input, output } => {
            let package = read_package(&input, &options)?;

            let pb = create_spinner("Writing parts...");
            let mut count = 0;
            for (partname, _, blob) in package.iter_sparts() {
                let path = partname
                    .membername()
                    .split('/')
                    .fold(output.clone(), |path, segment| path.join(segment));
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, blob)?;
                count += 1;
            }
            pb.finish_and_clear();

            if count > 0 {
                println!(
                    "{} Extracted {} parts to {}",
                    "✓".green().bold(),
                    count,
                    output.display()
                );
            } else {
                println!("{} No parts reachable in package", "!".yellow().bold());
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn read_package(input: &Path, options: &ReadOptions) -> unopc::Result<PackageReader> {
    let pb = create_spinner("Reading package...");
    let result = PackageReader::open_with_options(input, options);
    pb.finish_and_clear();
    result
}

/// Last path segment of a relationship type URI.
fn short_reltype(reltype: &str) -> &str {
    reltype.rsplit('/').next().unwrap_or(reltype)
}

fn print_version() {
    println!("{} {}", "unopc".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Open Packaging Conventions package inspector");
    println!();
    println!("Supported packages: DOCX, XLSX, PPTX (zip or unzipped directory)");
    println!("Repository: https://github.com/iyulab/unopc");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
