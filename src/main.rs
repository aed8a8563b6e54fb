//! layerscope - layer overlap analyzer for union-mount container filesystems.
//!
//! Usage:
//!   lscope analyze LAYER...                 Analyze layer roots, topmost first
//!   lscope analyze --upper DIR --lower A:B  Analyze an overlay upper/lower pair
//!   lscope analyze --inspect image.json     Analyze the layers of an inspected image
//!   lscope export LAYER... -o report.json   Export the report as JSON
//!   lscope --help                           Show help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use itertools::Itertools;
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use layerscope_analyze::StackAnalyzer;
use layerscope_core::{
    AnalyzeConfig, LayerReport, LayerStack, LayerStatus, Metric, SimilarityResult, StackReport,
};
use layerscope_scan::WalkProgress;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(
    name = "layerscope",
    version,
    about = "Layer overlap analyzer for union-mount container filesystems",
    long_about = "layerscope walks every layer of a union-mount stack and reports, for each \
                  layer, its structure and how many of its files and directories also \
                  exist in the layers below it."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a layer stack and print the report
    Analyze {
        #[command(flatten)]
        layers: LayerArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export the analysis report to JSON
    Export {
        #[command(flatten)]
        layers: LayerArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Where the layer stack comes from, and how to walk it.
#[derive(Args)]
struct LayerArgs {
    /// Layer root directories, topmost first
    #[arg(conflicts_with_all = ["upper", "lower", "inspect"])]
    layers: Vec<PathBuf>,

    /// Overlay upper directory (becomes the topmost layer)
    #[arg(long, conflicts_with = "inspect")]
    upper: Option<PathBuf>,

    /// Colon-separated overlay lower directories, in mount order
    #[arg(long, conflicts_with = "inspect")]
    lower: Option<String>,

    /// Image inspection JSON with GraphDriver data ("-" reads stdin)
    #[arg(long)]
    inspect: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop walking after this many seconds and report partial results
    #[arg(long)]
    timeout: Option<f64>,

    /// Threads used inside each layer walk
    #[arg(long)]
    walk_threads: Option<usize>,

    /// Walk layers one after another
    #[arg(long)]
    sequential: bool,

    /// Skip hidden entries
    #[arg(long)]
    no_hidden: bool,

    /// Glob pattern of entry names to skip (repeatable)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Print walk progress to stderr
    #[arg(long)]
    progress: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One image from an inspection document.
#[derive(Debug, Deserialize)]
struct InspectedImage {
    #[serde(rename = "GraphDriver")]
    graph_driver: GraphDriver,
}

#[derive(Debug, Deserialize)]
struct GraphDriver {
    #[serde(rename = "Data")]
    data: GraphDriverData,
}

#[derive(Debug, Deserialize)]
struct GraphDriverData {
    #[serde(rename = "UpperDir")]
    upper_dir: Option<PathBuf>,
    #[serde(rename = "LowerDir")]
    lower_dir: Option<String>,
}

/// Inspection output is an array of images, or a single image object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InspectDocument {
    Many(Vec<InspectedImage>),
    One(InspectedImage),
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Command::Analyze { layers, format } => run_analyze(&layers, format),
        Command::Export { layers, output } => run_export(&layers, output),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "layerscope=debug" } else { "layerscope=info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();
    Ok(())
}

impl LayerArgs {
    /// Resolve the layer stack from positional roots, overlay dirs or an inspection document.
    fn stack(&self) -> Result<LayerStack> {
        if let Some(source) = &self.inspect {
            return stack_from_inspect(source);
        }
        if self.upper.is_some() || self.lower.is_some() {
            return Ok(LayerStack::from_overlay_dirs(
                self.upper.as_deref(),
                self.lower.as_deref(),
            ));
        }
        Ok(LayerStack::new(self.layers.iter().cloned()))
    }

    /// Load the config file, if any, and apply flag overrides.
    fn config(&self) -> Result<AnalyzeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => AnalyzeConfig::default(),
        };

        if let Some(secs) = self.timeout {
            config.timeout =
                Some(Duration::try_from_secs_f64(secs).context("Invalid timeout")?);
        }
        if let Some(threads) = self.walk_threads {
            config.walk_threads = threads;
        }
        if self.sequential {
            config.parallel_layers = false;
        }
        if self.no_hidden {
            config.include_hidden = false;
        }
        config.exclude_patterns.extend(self.exclude.iter().cloned());

        Ok(config)
    }
}

/// Build a stack from the first image of an inspection document.
fn stack_from_inspect(source: &Path) -> Result<LayerStack> {
    let text = if source == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read inspection document from stdin")?;
        text
    } else {
        fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?
    };

    let document: InspectDocument =
        serde_json::from_str(&text).context("Invalid image inspection document")?;
    let image = match document {
        InspectDocument::One(image) => image,
        InspectDocument::Many(images) => images
            .into_iter()
            .next()
            .ok_or_else(|| eyre!("Image inspection document lists no images"))?,
    };

    let data = image.graph_driver.data;
    if data.lower_dir.is_none() {
        tracing::info!("Image has no LowerDir, analyzing the upper directory only");
    }
    Ok(LayerStack::from_overlay_dirs(
        data.upper_dir.as_deref(),
        data.lower_dir.as_deref(),
    ))
}

/// Analyze the stack described by `args`, optionally echoing walk progress.
fn analyze(args: &LayerArgs) -> Result<StackReport> {
    let stack = args.stack()?;
    let config = args.config()?;
    let analyzer = StackAnalyzer::with_config(config).context("Invalid configuration")?;

    eprintln!("Analyzing {} layer(s)...", stack.len());

    let progress = args.progress.then(|| {
        let mut rx = analyzer.walker().subscribe();
        thread::spawn(move || {
            loop {
                match rx.blocking_recv() {
                    Ok(update) => print_progress(&update),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let report = analyzer.analyze(&stack);

    // Dropping the analyzer closes the progress channel
    drop(analyzer);
    if let Some(handle) = progress {
        join_progress(handle)?;
    }

    Ok(report)
}

fn join_progress(handle: thread::JoinHandle<()>) -> Result<()> {
    handle
        .join()
        .map_err(|_| eyre!("Progress reporter thread panicked"))
}

fn print_progress(update: &WalkProgress) {
    let state = if update.finished { "done" } else { "walking" };
    eprintln!(
        "  layer {} {}: {} files, {} dirs, {} errors ({:.0} entries/s)",
        update.layer,
        state,
        update.files_walked,
        update.dirs_walked,
        update.errors_count,
        update.entries_per_second()
    );
}

/// Run analysis and print the report.
fn run_analyze(args: &LayerArgs, format: OutputFormat) -> Result<()> {
    let report = analyze(args)?;

    match format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    check_primary(&report)
}

/// Export the report to JSON.
fn run_export(args: &LayerArgs, output: Option<PathBuf>) -> Result<()> {
    let report = analyze(args)?;
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(output_path) => {
            fs::write(&output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    check_primary(&report)
}

/// Fail the process when the topmost layer produced no data.
fn check_primary(report: &StackReport) -> Result<()> {
    if report.layers.is_empty() {
        bail!("No layers given");
    }
    if !report.primary_usable() {
        bail!("Topmost layer could not be walked");
    }
    Ok(())
}

fn print_report(report: &StackReport) {
    println!();
    println!("{}", "─".repeat(70));
    println!(" Layer Overlap Report");
    println!(
        " {} layer(s) analyzed in {:.2}s",
        report.layers.len(),
        report.duration.as_secs_f64()
    );
    println!("{}", "─".repeat(70));

    for layer in &report.layers {
        print_layer(layer);
    }

    for warning in &report.warnings {
        println!(" warning: {}", warning.message);
    }

    if report.has_warnings() {
        println!();
        println!("{} warning(s) during analysis", report.warning_count());
    }
}

fn print_layer(layer: &LayerReport) {
    let stats = &layer.stats;

    println!();
    println!(
        " Layer {}  {}  [{}]",
        layer.layer.index,
        layer.layer.root.display(),
        status_label(layer.status)
    );
    println!(
        "   {} entries: {} files, {} directories, {} symlinks",
        stats.total_entries(),
        stats.file_count,
        stats.dir_count,
        stats.symlink_count
    );
    println!(
        "   max depth {}, average file depth {:.2}",
        stats.max_depth, stats.avg_file_depth
    );
    print_similarity("files", &layer.files);
    print_similarity("directories", &layer.directories);

    for warning in &layer.warnings {
        println!("   warning: {} ({})", warning.message, warning.path.display());
    }
}

fn print_similarity(label: &str, result: &SimilarityResult) {
    println!(
        "   {:<12} {}/{} in lower layers ({}), avg depth {:.2}, avg layers {:.2}",
        label,
        result.matches,
        result.candidates,
        format_percent(result.match_percent),
        result.avg_match_depth,
        result.avg_layers_matched
    );

    if result.has_matches() {
        let first = result
            .first_matches
            .iter()
            .filter(|m| m.count > 0)
            .map(|m| format!("layer {}: {}", m.layer, m.count))
            .join(", ");
        println!("   {:<12} first found in {}", "", first);
    }
}

fn format_percent(metric: Metric) -> String {
    match metric.value() {
        Some(percent) => format!("{percent:.1}%"),
        None => metric.to_string(),
    }
}

fn status_label(status: LayerStatus) -> &'static str {
    match status {
        LayerStatus::Complete => "complete",
        LayerStatus::Partial => "partial",
        LayerStatus::Unusable => "unusable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layer_args(argv: &[&str]) -> LayerArgs {
        let mut full = vec!["layerscope", "analyze"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Analyze { layers, .. } => layers,
            Command::Export { .. } => unreachable!("parsed an analyze command"),
        }
    }

    #[test]
    fn test_stack_from_inspect_array() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("inspect.json");
        fs::write(
            &doc,
            r#"[{"Id": "sha256:abc", "GraphDriver": {"Name": "overlay2", "Data": {
                "UpperDir": "/o/top/diff",
                "LowerDir": "/o/l2/diff:/o/l1/diff",
                "MergedDir": "/o/top/merged"
            }}}]"#,
        )
        .unwrap();

        let stack = stack_from_inspect(&doc).unwrap();
        let roots: Vec<_> = stack.iter().map(|l| l.root.clone()).collect();
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/o/top/diff"),
                PathBuf::from("/o/l2/diff"),
                PathBuf::from("/o/l1/diff"),
            ]
        );
    }

    #[test]
    fn test_stack_from_inspect_without_lower_dir() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("inspect.json");
        fs::write(&doc, r#"{"GraphDriver": {"Data": {"UpperDir": "/o/base/diff"}}}"#).unwrap();

        let stack = stack_from_inspect(&doc).unwrap();
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_stack_from_empty_inspect_fails() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("inspect.json");
        fs::write(&doc, "[]").unwrap();

        assert!(stack_from_inspect(&doc).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("layerscope.toml");
        fs::write(
            &config_path,
            "walk_threads = 8\nexclude_patterns = [\".wh.*\"]\ntimeout = 30.0\n",
        )
        .unwrap();

        let args = layer_args(&[
            "/a",
            "/b",
            "--config",
            config_path.to_str().unwrap(),
            "--walk-threads",
            "2",
            "--exclude",
            "*.pyc",
            "--sequential",
        ]);
        let config = args.config().unwrap();

        assert_eq!(config.walk_threads, 2);
        assert!(!config.parallel_layers);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.exclude_patterns, vec![".wh.*", "*.pyc"]);
        assert_eq!(args.stack().unwrap().len(), 2);
    }

    #[test]
    fn test_overlay_flags() {
        let args = layer_args(&["--upper", "/up", "--lower", "/l1:/l2"]);
        let stack = args.stack().unwrap();

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.top().unwrap().root, PathBuf::from("/up"));
    }

    #[test]
    fn test_negative_timeout_is_rejected() {
        let args = layer_args(&["/a", "--timeout=-1"]);
        assert!(args.config().is_err());
    }

    #[test]
    fn test_progress_thread_panic_is_reported() {
        let handle: thread::JoinHandle<()> = thread::spawn(|| panic!("reporter failed"));
        let err = join_progress(handle).unwrap_err();
        assert!(err.to_string().contains("panicked"));

        assert!(join_progress(thread::spawn(|| ())).is_ok());
    }
}
