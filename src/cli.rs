// Command-line interface for bsdelta.
//
// Subcommands mirror the classic patch tooling pair: `diff` creates a
// patch between two files, `patch` replays one, `info` inspects a patch
// container, `config` prints build details.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::codec::{self, Codec};
use crate::engine::PatchOptions;
use crate::io::{apply_patch_file, create_patch_file};
use crate::patch::container;
use crate::patch::control;
use crate::patch::header::{HEADER_LEN, PatchHeader};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_ZLIB_LEVEL: u32 = 9;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Bsdiff-style binary delta tool.
#[derive(Parser, Debug)]
#[command(
    name = "bsdelta",
    version,
    about = "binary delta patch creator/applier",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Create a patch that transforms OLD into NEW.
    Diff(DiffArgs),
    /// Apply a patch to OLD, reconstructing the new file.
    Patch(PatchArgs),
    /// Print information about a patch container.
    Info(InfoArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CodecArg {
    None,
    #[cfg(feature = "zlib-codec")]
    Zlib,
    #[cfg(feature = "lzma-codec")]
    Lzma,
}

#[cfg(feature = "zlib-codec")]
const DEFAULT_CODEC: CodecArg = CodecArg::Zlib;
#[cfg(all(feature = "lzma-codec", not(feature = "zlib-codec")))]
const DEFAULT_CODEC: CodecArg = CodecArg::Lzma;
#[cfg(all(not(feature = "zlib-codec"), not(feature = "lzma-codec")))]
const DEFAULT_CODEC: CodecArg = CodecArg::None;

#[derive(Args, Debug)]
struct DiffArgs {
    /// Old (base) file.
    #[arg(value_hint = ValueHint::FilePath)]
    old: PathBuf,

    /// New (target) file.
    #[arg(value_hint = ValueHint::FilePath)]
    new: PathBuf,

    /// Patch output file.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// Stream codec for the patch container.
    #[arg(long, value_enum, default_value_t = DEFAULT_CODEC)]
    codec: CodecArg,

    /// Zlib compression level (0-9).
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(0..=9), default_value_t = DEFAULT_ZLIB_LEVEL)]
    level: u32,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// Old (base) file.
    #[arg(value_hint = ValueHint::FilePath)]
    old: PathBuf,

    /// Patch file.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// Reconstructed output file.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Patch file to inspect.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Diff,
    Patch,
    Info,
    Config,
}

struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    codec: CodecArg,
    level: u32,
    old_file: Option<PathBuf>,
    new_file: Option<PathBuf>,
    patch_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

fn resolve_options(cli: Cli) -> Options {
    let base = Options {
        command: Command::Config,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        codec: DEFAULT_CODEC,
        level: DEFAULT_ZLIB_LEVEL,
        old_file: None,
        new_file: None,
        patch_file: None,
        output_file: None,
    };

    match cli.command {
        Cmd::Diff(args) => Options {
            command: Command::Diff,
            codec: args.codec,
            level: args.level,
            old_file: Some(args.old),
            new_file: Some(args.new),
            patch_file: Some(args.patch),
            ..base
        },
        Cmd::Patch(args) => Options {
            command: Command::Patch,
            old_file: Some(args.old),
            patch_file: Some(args.patch),
            output_file: Some(args.output),
            ..base
        },
        Cmd::Info(args) => Options {
            command: Command::Info,
            patch_file: Some(args.patch),
            ..base
        },
        Cmd::Config => base,
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("bsdelta".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("bsdelta version {version} (Rust), Copyright (C) bsdelta contributors");
    eprintln!("Licensed under the MIT license");

    let lzma = cfg!(feature = "lzma-codec") as u8;
    let zlib = cfg!(feature = "zlib-codec") as u8;
    let file_io = cfg!(feature = "file-io") as u8;
    let parallel = cfg!(feature = "parallel") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("CODEC_LZMA={lzma}");
    eprintln!("CODEC_ZLIB={zlib}");
    eprintln!("FILE_IO={file_io}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("DEFAULT_ZLIB_LEVEL={DEFAULT_ZLIB_LEVEL}");
    eprintln!("HEADER_LEN={HEADER_LEN}");
    eprintln!("CONTROL_SIZE={}", control::CONTROL_SIZE);
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Build PatchOptions from CLI options
// ---------------------------------------------------------------------------

fn build_patch_options(opts: &Options) -> PatchOptions {
    let codec = match opts.codec {
        CodecArg::None => Codec::Raw,
        #[cfg(feature = "zlib-codec")]
        CodecArg::Zlib => Codec::Zlib { level: opts.level },
        #[cfg(feature = "lzma-codec")]
        CodecArg::Lzma => Codec::Lzma,
    };
    PatchOptions { codec }
}

fn check_overwrite(path: &PathBuf, force: bool) -> bool {
    if path.exists() && !force {
        eprintln!(
            "bsdelta: output file exists, use -f to overwrite: {}",
            path.display()
        );
        return false;
    }
    true
}

fn hex(digest: &[u8; 32]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Diff command
// ---------------------------------------------------------------------------

fn cmd_diff(opts: &Options) -> i32 {
    let old = opts.old_file.as_ref().unwrap();
    let new = opts.new_file.as_ref().unwrap();
    let patch = opts.patch_file.as_ref().unwrap();

    if !check_overwrite(patch, opts.force) {
        return 1;
    }

    let patch_opts = build_patch_options(opts);
    let stats = match create_patch_file(old, new, patch, &patch_opts) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("bsdelta: diff: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        let ratio = if stats.new_size > 0 {
            stats.patch_size as f64 / stats.new_size as f64
        } else {
            0.0
        };
        eprintln!(
            "bsdelta: diff: old {} bytes, new {} bytes, patch {} bytes ({:.1}% of new)",
            stats.old_size,
            stats.new_size,
            stats.patch_size,
            ratio * 100.0
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "diff",
            "old_size": stats.old_size,
            "new_size": stats.new_size,
            "patch_size": stats.patch_size,
            "old_sha256": stats.old_sha256.as_ref().map(hex),
            "new_sha256": stats.new_sha256.as_ref().map(hex),
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }

    0
}

// ---------------------------------------------------------------------------
// Patch command
// ---------------------------------------------------------------------------

fn cmd_patch(opts: &Options) -> i32 {
    let old = opts.old_file.as_ref().unwrap();
    let patch = opts.patch_file.as_ref().unwrap();
    let output = opts.output_file.as_ref().unwrap();

    if !check_overwrite(output, opts.force) {
        return 1;
    }

    let stats = match apply_patch_file(old, patch, output) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("bsdelta: patch: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "bsdelta: patch: old {} bytes + patch {} bytes -> output {} bytes",
            stats.old_size, stats.patch_size, stats.output_size
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "patch",
            "old_size": stats.old_size,
            "patch_size": stats.patch_size,
            "output_size": stats.output_size,
            "output_sha256": stats.output_sha256.as_ref().map(hex),
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }

    0
}

// ---------------------------------------------------------------------------
// Info command
// ---------------------------------------------------------------------------

fn cmd_info(opts: &Options) -> i32 {
    let patch_path = opts.patch_file.as_ref().unwrap();
    let data = match std::fs::read(patch_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("bsdelta: {}: {e}", patch_path.display());
            return 1;
        }
    };

    let header = match PatchHeader::decode(&data) {
        Ok(hdr) => hdr,
        Err(e) => {
            eprintln!("bsdelta: invalid patch container: {e}");
            return 1;
        }
    };

    let codec_name = codec::codec_name(header.codec_id).unwrap_or("unknown");
    // Truncated containers can declare more than the body holds; the
    // decode path below rejects that, but the summary should not underflow.
    let extra_len = (data.len() as u64)
        .saturating_sub(HEADER_LEN as u64 + header.ctrl_len + header.diff_len);

    println!("bsdelta container size:       {}", data.len());
    println!(
        "bsdelta codec:                {codec_name} (id '{}')",
        header.codec_id as char
    );
    println!("bsdelta control stream:       {} bytes", header.ctrl_len);
    println!("bsdelta diff stream:          {} bytes", header.diff_len);
    println!("bsdelta extra stream:         {extra_len} bytes");
    println!("bsdelta new file length:      {}", header.new_len);

    // -v additionally decodes the streams and summarizes the records.
    if opts.verbose > 0 {
        let decoded = match container::decode_container(&data) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("bsdelta: stream decode: {e}");
                return 1;
            }
        };
        let records = match control::parse_stream(&decoded.control) {
            Some(r) => r,
            None => {
                eprintln!("bsdelta: malformed control stream");
                return 1;
            }
        };
        let copy: u64 = records.iter().map(|r| r.copy).sum();
        let extra: u64 = records.iter().map(|r| r.extra).sum();
        println!("bsdelta control records:      {}", records.len());
        println!("bsdelta copied bytes:         {copy}");
        println!("bsdelta literal bytes:        {extra}");

        if opts.verbose > 1 {
            println!("  Record   Copy    Extra     Seek");
            for (i, r) in records.iter().enumerate() {
                println!("  {i:06} {:6} {:8} {:8}", r.copy, r.extra, r.seek);
            }
        }
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "info",
            "container_size": data.len(),
            "codec": codec_name,
            "control_compressed_len": header.ctrl_len,
            "diff_compressed_len": header.diff_len,
            "extra_compressed_len": extra_len,
            "new_file_length": header.new_len,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let opts = resolve_options(cli);

    let exit_code = match opts.command {
        Command::Diff => cmd_diff(&opts),
        Command::Patch => cmd_patch(&opts),
        Command::Info => cmd_info(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
