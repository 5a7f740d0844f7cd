//! Weave CLI
//!
//! Usage:
//!   weave [OPTIONS] <PAGE>
//!
//! Options:
//!   -l, --layout <NAME>      Layout to wrap the page in
//!   -t, --templates <DIR>    Directory of page and shared templates
//!       --layouts <DIR>      Directory of layout templates
//!   -e, --ext <EXT>          Template file extensions to load
//!   -d, --data <FILE>        Render data (JSON, or TOML by extension)
//!   -c, --config <FILE>      Configuration file (TOML)
//!       --missing-key-zero   Render missing keys as zero values
//!   -h, --help               Print help

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weave::{Config, Error, FragmentSource, TemplateSet};

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Render a page inside a layout from directories of templates")]
struct Cli {
    /// Page (or shared fragment) to render
    page: String,

    /// Layout to wrap the page in
    #[arg(short, long, default_value = "")]
    layout: String,

    /// Directory of page and shared templates ("" to skip)
    #[arg(short, long, default_value = "templates")]
    templates: PathBuf,

    /// Directory of layout templates ("" to skip)
    #[arg(long, default_value = "templates/layouts")]
    layouts: PathBuf,

    /// Template file extensions to load
    #[arg(short, long = "ext", default_value = ".tmpl")]
    extensions: Vec<String>,

    /// Render data (JSON, or TOML by extension)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render missing keys as zero values
    #[arg(long)]
    missing_key_zero: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weave=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if cli.missing_key_zero {
        config = config.with_missing_key_zero(true);
    }

    let sources = match load_sources(&cli.layouts, &cli.templates, &cli.extensions) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("Error loading templates: {}", e);
            std::process::exit(1);
        }
    };

    let data = match &cli.data {
        Some(path) => match read_data(path) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("Error loading data '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Value::Null,
    };

    let set = TemplateSet::with_config(config);
    if let Err(e) = set.add_all(sources.clone()) {
        report(&e, &sources, &set);
        std::process::exit(1);
    }

    match set.render_value(&cli.layout, &cli.page, &data) {
        Ok(out) => print!("{}", out),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Collect layouts, then pages. An empty directory path skips that kind.
fn load_sources(
    layouts: &Path,
    templates: &Path,
    extensions: &[String],
) -> io::Result<Vec<FragmentSource>> {
    let mut sources = Vec::new();
    for (dir, is_layout) in [(layouts, true), (templates, false)] {
        if dir.as_os_str().is_empty() {
            debug!(is_layout, "no directory given, skipping");
            continue;
        }
        sources.extend(load_dir(dir, extensions, is_layout)?);
    }
    Ok(sources)
}

/// Read every template file directly inside `dir`, named by file stem
fn load_dir(dir: &Path, extensions: &[String], is_layout: bool) -> io::Result<Vec<FragmentSource>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| with_path(e, dir))? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(stem) = path.file_stem() else {
            continue;
        };
        let content = fs::read_to_string(&path).map_err(|e| with_path(e, &path))?;
        sources.push(FragmentSource {
            name: stem.to_string_lossy().into_owned(),
            content,
            is_layout,
        });
    }
    debug!(dir = %dir.display(), count = sources.len(), is_layout, "loaded templates");
    Ok(sources)
}

fn with_path(err: io::Error, path: &Path) -> io::Error {
    io::Error::new(err.kind(), format!("'{}': {}", path.display(), err))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.') == ext)
}

/// Load render data; `.toml` files are TOML, anything else JSON
fn read_data(path: &Path) -> Result<Value, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    if path.extension().is_some_and(|e| e == "toml") {
        toml::from_str::<Value>(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
    }
}

/// Print a registration error, with source context for compile errors
fn report(err: &Error, sources: &[FragmentSource], set: &TemplateSet) {
    if let Error::Compile { name, errors } = err {
        // A page and a layout may share a name; the failing one never registered
        let failed = sources.iter().find(|s| {
            &s.name == name && set.registry().get(s.kind(), &s.name).is_none()
        });
        if let Some(source) = failed {
            for e in errors {
                eprint!("{}", e.format(&source.content, name));
            }
            return;
        }
    }
    eprintln!("Error: {}", err);
}
