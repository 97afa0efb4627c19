use clap::Args;
use console::style;
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tfl_opgen_core::{GenerateError, GenerateRequest, OpList, generate};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{ConfigFile, Settings};

/// Width of the operation name column in failure reports.
const REPORT_WIDTH: usize = 50;

/// Arguments of `tfl-opgen generate`.
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Config file [default: ./tfl-opgen.toml when present]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Operation registry (.pbtxt, .txt or .json)
    #[arg(long, value_name = "FILE")]
    pub registry: Option<PathBuf>,
    /// Docs directory of <Op>.txt files, or a .json/.yaml map
    #[arg(long, value_name = "PATH")]
    pub docs: Option<PathBuf>,
    /// Reflected operation names, one per line [default: every registry op]
    #[arg(long, value_name = "FILE")]
    pub names: Option<PathBuf>,
    /// Generated module path
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Prefix marking private operation names [default: _]
    #[arg(long, value_name = "PREFIX")]
    pub private_prefix: Option<String>,
    /// Compare with the existing output instead of writing it
    #[arg(long)]
    pub check: bool,
    /// Log at debug level
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

pub fn run(args: &GenerateArgs) -> i32 {
    match run_inner(args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn run_inner(args: &GenerateArgs) -> Result<(), String> {
    let overrides = ConfigFile {
        registry: args.registry.clone(),
        docs: args.docs.clone(),
        names: args.names.clone(),
        output: args.output.clone(),
        private_prefix: args.private_prefix.clone(),
    };
    let settings = ConfigFile::discover(args.config.as_deref())?.merge(overrides)?;
    debug!(?settings, "Resolved settings.");

    let registry = load_registry(&settings.registry)?;
    let request = GenerateRequest {
        names: settings.names.as_deref().map(load_names).transpose()?,
        docs: match &settings.docs {
            Some(path) => load_docs(path)?,
            None => HashMap::new(),
        },
        private_prefix: settings.private_prefix.clone(),
    };

    let module = generate(&registry, &request).map_err(|err| {
        report_failure(&err);
        err.to_string()
    })?;

    if args.check {
        return check_output(&settings, &module.code);
    }

    write_output(&settings.output, &module.code)?;
    println!(
        "generated {} operations -> {}",
        module.functions.len(),
        settings.output.display()
    );
    Ok(())
}

fn load_registry(path: &Path) -> Result<OpList, String> {
    let contents = read(path, "registry")?;
    let registry = match extension(path).as_deref() {
        Some("pbtxt" | "txt") => OpList::from_pbtxt(&contents),
        Some("json") => OpList::from_json(&contents),
        _ => {
            return Err(format!(
                "Unsupported registry format: {} (expected .pbtxt, .txt or .json)",
                path.display()
            ));
        }
    }
    .map_err(|err| format!("Failed to load registry {}: {err}", path.display()))?;
    info!(
        path = %path.display(),
        operations = registry.ops.len(),
        "Loaded operation registry."
    );
    Ok(registry)
}

/// One name per line; blank lines and `#` comments are ignored.
fn load_names(path: &Path) -> Result<Vec<String>, String> {
    let contents = read(path, "names file")?;
    Ok(parse_names(&contents))
}

fn parse_names(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn load_docs(path: &Path) -> Result<HashMap<String, String>, String> {
    if path.is_dir() {
        return load_docs_dir(path);
    }
    let contents = read(path, "docs file")?;
    let docs: HashMap<String, String> = match extension(path).as_deref() {
        Some("json") => serde_json::from_str(&contents).map_err(|err| err.to_string()),
        Some("yaml" | "yml") => serde_yaml::from_str(&contents).map_err(|err| err.to_string()),
        _ => Err("expected a directory, .json or .yaml".to_string()),
    }
    .map_err(|err| format!("Failed to load docs {}: {err}", path.display()))?;
    debug!(path = %path.display(), entries = docs.len(), "Loaded docs map.");
    Ok(docs)
}

/// `<dir>/<OpName>.txt` files, not recursive.
fn load_docs_dir(dir: &Path) -> Result<HashMap<String, String>, String> {
    let mut docs = HashMap::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry
            .map_err(|err| format!("Failed to scan docs directory {}: {err}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || extension(path).as_deref() != Some("txt") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        docs.insert(name.to_string(), read(path, "docs file")?);
    }
    debug!(dir = %dir.display(), entries = docs.len(), "Loaded docs directory.");
    Ok(docs)
}

fn check_output(settings: &Settings, code: &str) -> Result<(), String> {
    let path = &settings.output;
    let existing = if path.exists() {
        read(path, "output")?
    } else {
        String::new()
    };
    if existing == code {
        println!("{} is up to date", path.display());
        return Ok(());
    }
    print!("{}", render_diff(&path.display().to_string(), &existing, code));
    Err(format!("{} is out of date", path.display()))
}

/// Unified diff with three lines of context.
fn render_diff(label: &str, existing: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(existing, new);
    let mut output = String::new();

    output.push_str(&format!("{}\n", style(format!("--- {label} (current)")).bold()));
    output.push_str(&format!("{}\n", style(format!("+++ {label} (generated)")).bold()));

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let mut line = change.value().to_string();
                if change.missing_newline() {
                    line.push('\n');
                }
                let rendered = match change.tag() {
                    ChangeTag::Delete => style(format!("-{line}")).red().to_string(),
                    ChangeTag::Insert => style(format!("+{line}")).green().to_string(),
                    ChangeTag::Equal => format!(" {line}"),
                };
                output.push_str(&rendered);
            }
        }
    }
    output
}

fn write_output(path: &Path, code: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create output directory: {err}"))?;
    }
    fs::write(path, code)
        .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
    debug!(path = %path.display(), bytes = code.len(), "Wrote generated module.");
    Ok(())
}

/// `<op padded>  [Failed]` for errors tied to one operation.
fn report_failure(err: &GenerateError) {
    let op = match err {
        GenerateError::Compile { op, .. } | GenerateError::UnsupportedAttrKind { op, .. } => op,
        GenerateError::UnresolvedOperation { name } | GenerateError::DuplicateOperation { name } => {
            name
        }
        GenerateError::NameCollision { second, .. } => second,
        GenerateError::RegistryParse { .. }
        | GenerateError::RegistryJson(_)
        | GenerateError::UnknownDataType { .. } => return,
    };
    eprintln!(
        "{:<width$}  [{}]",
        op,
        style("Failed").red(),
        width = REPORT_WIDTH
    );
}

fn read(path: &Path, what: &str) -> Result<String, String> {
    fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {what} {}: {err}", path.display()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
