use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use mustache_metadata::{
    mustache_metadata, ExportOptions, FileCollection, Options, Pipeline, PipelineContext,
};
use tracing_subscriber::EnvFilter;

/// Annotate a JSON file collection for logic-less templates.
///
/// Input is `{ "path": { "contents": "...", ...metadata } }`; the annotated
/// collection is printed with existence markers rendered as `"key?": true`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file collection; read from stdin when omitted.
    input: Option<PathBuf>,
    /// Options file: {"match": "...", "matchOptions": {...}}
    #[arg(long)]
    config: Option<PathBuf>,
    /// Glob selecting the files to annotate
    #[arg(long = "match")]
    pattern: Option<String>,
    /// Case-insensitive matching
    #[arg(long)]
    nocase: bool,
    /// Let wildcards match dot files
    #[arg(long)]
    dot: bool,
    /// Match slash-free patterns against the basename
    #[arg(long)]
    match_base: bool,
    /// Do not render existence markers in the output
    #[arg(long)]
    no_markers: bool,
    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("mmeta: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    // Build options: config file first, flags on top.
    let mut opts = match &args.config {
        Some(path) => Options::from_json(&std::fs::read_to_string(path)?)?,
        None => Options::default(),
    };
    if let Some(pattern) = &args.pattern {
        opts.pattern = pattern.clone();
    }
    opts.match_options.nocase |= args.nocase;
    opts.match_options.dot |= args.dot;
    opts.match_options.match_base |= args.match_base;

    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let mut files = FileCollection::from_json_str(&raw)?;
    tracing::info!(files = files.len(), pattern = %opts.pattern, "loaded file collection");

    Pipeline::new()
        .with(mustache_metadata(opts)?)
        .run(&mut files, &PipelineContext::new())?;

    let out = files.to_json(ExportOptions {
        markers: !args.no_markers,
    });
    let rendered = if args.compact {
        serde_json::to_string(&out)
    } else {
        serde_json::to_string_pretty(&out)
    }?;
    println!("{rendered}");
    Ok(())
}
