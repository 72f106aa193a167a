//! h5scope command line interface
//!
//! - Browse the group/dataset tree of a container
//! - Inspect dataset shape, type and attributes
//! - Column statistics between cursors
//! - Windowed FFT with peak and THD over a cursor or range selection
//! - Copy subsets into a new container, export rows to CSV
//! - Generate the two-tone demo container

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use h5scope::formats::open_container;
use h5scope::generate::{generate_demo, DemoSignal};
use h5scope::store::{is_plottable, Container, Dataset, DatasetInfo, Node};
use h5scope::{copy_items, export, AnalysisConfig};
use h5scope_core::dsp::harmonics::ThdParams;
use h5scope_core::dsp::stats::Statistics;
use h5scope_core::dsp::window::WindowKind;
use h5scope_core::selection::cursor::CursorMode;
use h5scope_core::selection::mask::Selection;
use h5scope_core::selection::range::RangePercent;
use h5scope_core::types::{PeakReport, SpectrumComponent, XAxis};
use h5scope_core::view::SeriesView;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "h5scope")]
#[command(author, version, about = "Signal container inspector", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Analysis settings file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the group/dataset tree
    Tree {
        file: PathBuf,

        /// Also print attributes
        #[arg(long)]
        attrs: bool,
    },

    /// Shape, type and attributes of one item
    Info { file: PathBuf, path: String },

    /// Statistics of a column, optionally between two X positions
    Show {
        file: PathBuf,
        path: String,

        /// Y column (label or index)
        #[arg(short = 'y', long)]
        column: Option<String>,

        #[command(flatten)]
        axis: AxisSource,

        /// Cursor positions on the X axis
        #[arg(long, num_args = 2, value_names = ["C1", "C2"], allow_negative_numbers = true)]
        cursors: Option<Vec<f64>>,

        /// Range start in percent, used when no cursors are given
        #[arg(long)]
        range_start: Option<String>,

        /// Range end in percent, used when no cursors are given
        #[arg(long)]
        range_end: Option<String>,
    },

    /// Spectrum peak, THD and statistics of a column
    Fft {
        file: PathBuf,
        path: String,

        /// Signal column (label or index)
        #[arg(short = 'y', long)]
        column: Option<String>,

        /// Sampling frequency in kHz
        #[arg(long)]
        fs_khz: Option<String>,

        /// Window (Rectangular, Hann, Hamming, Blackman, Gabor)
        #[arg(short, long)]
        window: Option<String>,

        /// Coordinate system of the cursors
        #[arg(long, value_enum)]
        x_axis: Option<AxisArg>,

        /// Cursor positions (Hz, or bin index with --x-axis index)
        #[arg(long, num_args = 2, value_names = ["C1", "C2"], allow_negative_numbers = true)]
        cursors: Option<Vec<f64>>,

        /// Range start in percent
        #[arg(long)]
        range_start: Option<String>,

        /// Range end in percent
        #[arg(long)]
        range_end: Option<String>,

        /// Use this frequency (Hz) as the THD fundamental
        #[arg(long)]
        fundamental: Option<f64>,

        /// Spectrum curve the statistics are taken over
        #[arg(long, value_enum, default_value = "magnitude")]
        component: ComponentArg,

        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },

    /// Copy groups and datasets into a new JSON container
    Copy {
        source: PathBuf,
        dest: PathBuf,

        /// Paths to copy
        #[arg(required = true)]
        paths: Vec<String>,

        /// Stored as the comment/description root attributes
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Export dataset rows to CSV, limited to the cursor interval if given
    ExportCsv {
        file: PathBuf,
        path: String,
        output: PathBuf,

        #[command(flatten)]
        axis: AxisSource,

        #[arg(long, num_args = 2, value_names = ["C1", "C2"], allow_negative_numbers = true)]
        cursors: Option<Vec<f64>>,
    },

    /// Write the 50 Hz + 1 kHz demo container
    Generate {
        #[arg(default_value = "signals_axes_vs_matrix.json")]
        output: PathBuf,

        /// Sampling frequency in kHz
        #[arg(long, default_value = "1000")]
        fs_khz: f64,
    },
}

/// Where the X values of a series come from. Sample index when neither
/// is given.
#[derive(Args)]
struct AxisSource {
    /// X column of the same dataset (label or index)
    #[arg(short = 'x', long, conflicts_with = "x_dataset")]
    x: Option<String>,

    /// Another dataset as X axis (1-D, or first column of 2-D)
    #[arg(long)]
    x_dataset: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum AxisArg {
    Frequency,
    Index,
}

impl From<AxisArg> for XAxis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::Frequency => XAxis::Frequency,
            AxisArg::Index => XAxis::Index,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ComponentArg {
    Magnitude,
    Db,
    Phase,
}

impl From<ComponentArg> for SpectrumComponent {
    fn from(c: ComponentArg) -> Self {
        match c {
            ComponentArg::Magnitude => SpectrumComponent::Magnitude,
            ComponentArg::Db => SpectrumComponent::MagnitudeDb,
            ComponentArg::Phase => SpectrumComponent::Phase,
        }
    }
}

#[derive(Serialize)]
struct FftReport {
    path: String,
    samples: usize,
    sampling_hz: f64,
    window: WindowKind,
    bins: usize,
    selection: Selection,
    selected_bins: usize,
    thd_full: f64,
    peak: Option<PeakReport>,
    component: SpectrumComponent,
    statistics: Option<Statistics>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Tree { file, attrs } => cmd_tree(&file, attrs),
        Commands::Info { file, path } => cmd_info(&file, &path),
        Commands::Show {
            file,
            path,
            column,
            axis,
            cursors,
            range_start,
            range_end,
        } => {
            let range = (range_start.is_some() || range_end.is_some()).then(|| {
                (range_start.unwrap_or_default(), range_end.unwrap_or_default())
            });
            cmd_show(&file, &path, &config, column, &axis, cursors, range)
        }
        Commands::Fft {
            file,
            path,
            column,
            fs_khz,
            window,
            x_axis,
            cursors,
            range_start,
            range_end,
            fundamental,
            component,
            json,
        } => {
            let mut config = config;
            if let Some(axis) = x_axis {
                config.x_axis = axis.into();
            }
            let opts = FftOptions {
                column,
                fs_khz,
                window,
                cursors,
                range_start,
                range_end,
                fundamental,
                component: component.into(),
                json,
            };
            cmd_fft(&file, &path, &config, opts)
        }
        Commands::Copy {
            source,
            dest,
            paths,
            comment,
        } => cmd_copy(&source, &dest, &paths, &comment),
        Commands::ExportCsv {
            file,
            path,
            output,
            axis,
            cursors,
        } => cmd_export(&file, &path, &output, &axis, cursors),
        Commands::Generate { output, fs_khz } => cmd_generate(&output, fs_khz),
    }
}

fn open(file: &Path) -> Result<Box<dyn Container>> {
    open_container(file).with_context(|| format!("Failed to open {}", file.display()))
}

fn read(container: &dyn Container, path: &str) -> Result<Dataset> {
    container
        .read_dataset(path)
        .with_context(|| format!("Failed to read dataset {path}"))
}

/// Column index for a label or a numeric index, `default` when none is
/// named.
fn resolve_column(dataset: &Dataset, path: &str, name: Option<&str>, default: usize) -> Result<usize> {
    match name {
        Some(name) => dataset
            .resolve_column(name)
            .with_context(|| format!("{path} has columns {:?}", dataset.columns)),
        None => Ok(default),
    }
}

/// Strict start/end percentage fields.
fn parse_range(start: &str, end: &str) -> Result<RangePercent> {
    RangePercent::try_from_text(start, end)
        .with_context(|| format!("Invalid range {start:?} .. {end:?}"))
}

/// The signal column when none is named: the second one of a matrix
/// (the first usually being time), else the only one.
fn default_signal_column(dataset: &Dataset) -> usize {
    if dataset.ncols() > 1 {
        1
    } else {
        0
    }
}

fn cmd_tree(file: &Path, attrs: bool) -> Result<()> {
    let container = open(file)?;
    let root = container.load_structure()?;
    println!("{}", file.display());
    if attrs {
        for (key, value) in &root.attributes {
            println!("  @{key} = {value}");
        }
    }
    print_children(&root, 1, attrs);
    Ok(())
}

fn print_children(node: &Node, depth: usize, attrs: bool) {
    let indent = "  ".repeat(depth);
    for child in &node.children {
        match (&child.shape, &child.dtype) {
            (Some(shape), Some(dtype)) => println!("{indent}{}  {shape:?} {dtype}", child.name),
            _ => println!("{indent}{}/", child.name),
        }
        if attrs {
            for (key, value) in &child.attributes {
                println!("{indent}  @{key} = {value}");
            }
        }
        print_children(child, depth + 1, attrs);
    }
}

fn cmd_info(file: &Path, path: &str) -> Result<()> {
    let container = open(file)?;
    let root = container.load_structure()?;
    let node = root
        .find(path)
        .with_context(|| format!("No item {path} in {}", file.display()))?;

    println!("{} ({})", node.path, node.kind);
    if let Ok(info) = DatasetInfo::from_node(node) {
        println!("  shape:     {:?}", info.shape);
        println!("  dtype:     {}", info.dtype);
        println!("  size:      {}", info.size);
        println!("  ndim:      {}", info.ndim);
        println!("  plottable: {}", is_plottable(&info));
    }
    for (key, value) in &node.attributes {
        println!("  @{key} = {value}");
    }
    Ok(())
}

fn place_cursors(view: &mut SeriesView, cursors: Option<Vec<f64>>) {
    if let Some([c1, c2]) = cursors.as_deref() {
        view.selection.cursors.set_mode(CursorMode::P1);
        view.selection.cursors.place(*c1, *c2);
    }
}

fn series(
    container: &dyn Container,
    path: &str,
    dataset: &Dataset,
    axis: &AxisSource,
    y: usize,
) -> Result<SeriesView> {
    let values = dataset.column(y)?;
    if let Some(x_path) = &axis.x_dataset {
        let x = container
            .read_axis(x_path)
            .with_context(|| format!("Failed to read X axis {x_path}"))?;
        if x.len() != values.len() {
            warn!("{x_path} has {} values, {path} has {}", x.len(), values.len());
        }
        return Ok(SeriesView::new(x, values));
    }
    Ok(match axis.x.as_deref() {
        Some(name) => {
            let xi = resolve_column(dataset, path, Some(name), 0)?;
            SeriesView::new(dataset.column(xi)?, values)
        }
        None => SeriesView::indexed(values),
    })
}

fn cmd_show(
    file: &Path,
    path: &str,
    config: &AnalysisConfig,
    column: Option<String>,
    axis: &AxisSource,
    cursors: Option<Vec<f64>>,
    range: Option<(String, String)>,
) -> Result<()> {
    let container = open(file)?;
    let dataset = read(container.as_ref(), path)?;
    let y = resolve_column(&dataset, path, column.as_deref(), default_signal_column(&dataset))?;
    let mut view = series(container.as_ref(), path, &dataset, axis, y)?;
    place_cursors(&mut view, cursors);
    view.selection.range = match range {
        Some((start, end)) => parse_range(&start, &end)?,
        None => config.display_range(view.x().len()),
    };

    println!(
        "{path} [{}]: {} rows, {} points",
        dataset.columns.get(y).map_or("", |s| s.as_str()),
        dataset.rows(),
        view.y().len()
    );
    match view.resolve() {
        Selection::Cursors(i) => println!("between cursors {} .. {}", i.lo, i.hi),
        Selection::Range(i) => println!("range {} .. {}", i.lo, i.hi),
        Selection::Full => println!("full series"),
    }
    let (start, end, stride) = view.display_window(false);
    debug!("display rows {start}..{end} step {stride}");
    print_statistics(view.statistics().as_ref());
    Ok(())
}

fn print_statistics(stats: Option<&Statistics>) {
    match stats {
        Some(stats) => {
            for (label, value) in stats.entries() {
                println!("  {label:<8} {value:.6}");
            }
        }
        None => println!("  (no samples selected)"),
    }
}

struct FftOptions {
    column: Option<String>,
    fs_khz: Option<String>,
    window: Option<String>,
    cursors: Option<Vec<f64>>,
    range_start: Option<String>,
    range_end: Option<String>,
    fundamental: Option<f64>,
    component: SpectrumComponent,
    json: bool,
}

fn cmd_fft(file: &Path, path: &str, config: &AnalysisConfig, opts: FftOptions) -> Result<()> {
    let container = open(file)?;
    let dataset = read(container.as_ref(), path)?;
    let col = resolve_column(&dataset, path, opts.column.as_deref(), default_signal_column(&dataset))?;
    let signal = dataset.column(col)?;
    info!("{} samples from {path} column {col}", signal.len());

    let mut session = config.session(signal);
    if let Some(khz) = &opts.fs_khz {
        session.set_sampling_frequency_text(khz);
    }
    if let Some(name) = &opts.window {
        session.set_window_name(name);
    }
    if let Some(f) = opts.fundamental {
        session.set_thd_params(ThdParams {
            fundamental_freq: Some(f),
            ..config.thd_params()
        });
    }
    let explicit_range = if opts.range_start.is_some() || opts.range_end.is_some() {
        Some(parse_range(
            opts.range_start.as_deref().unwrap_or(""),
            opts.range_end.as_deref().unwrap_or(""),
        )?)
    } else {
        None
    };
    if let Some([c1, c2]) = opts.cursors.as_deref() {
        if config.cursor_mode == CursorMode::Off {
            session.set_cursor_mode(CursorMode::P1);
        }
        session.place_cursors(*c1, *c2);
    }

    let Some(spectrum) = session.spectrum() else {
        anyhow::bail!("{path}: need at least 2 samples for an FFT");
    };
    let bins = spectrum.len();
    let thd_full = spectrum.thd_full;
    match explicit_range {
        Some(range) => session.set_range(range),
        None if config.range() == RangePercent::FULL => session.set_range(config.display_range(bins)),
        None => {}
    }

    let report = FftReport {
        path: path.to_string(),
        samples: session.signal().len(),
        sampling_hz: session.sampling_frequency(),
        window: session.window(),
        bins,
        selection: session.selection(),
        selected_bins: session.selected_bins().len(),
        thd_full,
        peak: session.peak_report(),
        component: opts.component,
        statistics: session.statistics(opts.component),
    };

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{path}: {} samples at {} Hz, {} window", report.samples, report.sampling_hz, report.window);
    println!("  bins:      {} ({} selected)", report.bins, report.selected_bins);
    println!("  THD (full): {:.2} %", report.thd_full);
    match &report.peak {
        Some(peak) => {
            println!("  peak:      {:.4} Hz (bin {})", peak.peak_freq, peak.peak_index);
            println!("  magnitude: {:.4}", peak.peak_magnitude);
            println!("  THD:       {:.2} %", peak.thd_percent);
        }
        None => println!("  peak:      (no bins selected)"),
    }
    println!("  {}:", report.component.label());
    print_statistics(report.statistics.as_ref());
    Ok(())
}

fn cmd_copy(source: &Path, dest: &Path, paths: &[String], comment: &str) -> Result<()> {
    let container = open(source)?;
    let count = copy_items(container.as_ref(), dest, paths, comment)
        .with_context(|| format!("Failed to copy into {}", dest.display()))?;
    println!("Exported elements: {count}");
    Ok(())
}

fn cmd_export(file: &Path, path: &str, output: &Path, axis: &AxisSource, cursors: Option<Vec<f64>>) -> Result<()> {
    let container = open(file)?;
    let dataset = read(container.as_ref(), path)?;
    let mut view = series(container.as_ref(), path, &dataset, axis, 0)?;
    place_cursors(&mut view, cursors);
    let rows = view.selected_rows();
    let written = export::export_csv(output, &dataset, &rows)
        .with_context(|| format!("Failed to export CSV to {}", output.display()))?;
    println!("Successfully exported {written} rows to {}", output.display());
    Ok(())
}

fn cmd_generate(output: &Path, fs_khz: f64) -> Result<()> {
    let demo = DemoSignal {
        fs: fs_khz * 1e3,
        ..DemoSignal::default()
    };
    let n = generate_demo(output, &demo).with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Created {} ({n} samples)", output.display());
    Ok(())
}
