use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use iosnoop_viz::Result;
use iosnoop_viz::export::{self, CsvConfig, Dialect};
use iosnoop_viz::filter::FilterConfig;
use iosnoop_viz::heatmap::{Condition, HeatmapConfig};
use iosnoop_viz::plot::{self, PlotConfig};
use iosnoop_viz::report::{LOG_TARGET, LogReporter};
use iosnoop_viz::util::{make_output_file, parse_datetime};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iosnoop-viz")]
#[command(version, about = "Parse and visualize iosnoop output", long_about = None)]
struct Cli {
    /// Path to iosnoop output file.
    #[arg(long)]
    data: PathBuf,

    /// Base datetime to convert kernel timestamps to local time, format: yyyymmddHHMMSS.
    #[arg(long, value_parser = parse_datetime)]
    basedate: Option<NaiveDateTime>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Verbose mode (debug logging, binned grids).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Column names to keep in the output.
    #[arg(long, num_args = 1..)]
    columns: Vec<String>,

    /// Commands in iosnoop output (substring match).
    #[arg(long, num_args = 1..)]
    io_commands: Vec<String>,

    /// Device in iosnoop output.
    #[arg(long)]
    io_device: Option<String>,

    /// Process ids in iosnoop output.
    #[arg(long, num_args = 1..)]
    io_pids: Vec<i64>,

    /// I/O types in iosnoop output.
    #[arg(long, num_args = 1..)]
    io_types: Vec<String>,

    /// Seconds since the first row.
    #[arg(long)]
    since: Option<f64>,

    /// Seconds until, relative to the first row.
    #[arg(long)]
    until: Option<f64>,
}

impl From<FilterArgs> for FilterConfig {
    fn from(args: FilterArgs) -> Self {
        FilterConfig {
            since: args.since,
            until: args.until,
            columns: args.columns,
            commands: args.io_commands,
            device: args.io_device,
            pids: args.io_pids,
            types: args.io_types,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write filtered rows as CSV.
    Csv {
        /// Path to save the csv file (default: <data name>.csv).
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = DialectArg::Excel)]
        dialect: DialectArg,

        /// Overrides the dialect's separator.
        #[arg(long, value_enum)]
        separator: Option<SeparatorArg>,
    },

    /// Render a latency/time heatmap as HTML.
    Plot {
        /// Path to save the graph (default: <data name>.html).
        #[arg(long)]
        fig_output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = PlotType::Heatmap)]
        plot_type: PlotType,

        #[arg(long, value_enum, default_value_t = Colormap::Reds)]
        colormap: Colormap,

        /// Square cells.
        #[arg(long)]
        square: bool,

        /// Extra panels, e.g. "LATms > 10" "TYPE == 'W'".
        #[arg(long, num_args = 1.., value_parser = parse_condition)]
        subplot_conditions: Vec<Condition>,

        /// Interval of x (time) bins in seconds.
        #[arg(long, default_value_t = 1.0, value_parser = parse_interval)]
        x_interval: f64,

        /// Maximum value for the x axis.
        #[arg(long)]
        x_max: Option<f64>,

        /// Interval of y (latency) bins in milliseconds.
        #[arg(long, default_value_t = 50.0, value_parser = parse_interval)]
        y_interval: f64,

        /// Maximum value for the y axis.
        #[arg(long)]
        y_max: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Excel,
    ExcelTab,
    Unix,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Excel => Dialect::Excel,
            DialectArg::ExcelTab => Dialect::ExcelTab,
            DialectArg::Unix => Dialect::Unix,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SeparatorArg {
    Comma,
    Tab,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlotType {
    Heatmap,
}

#[derive(Clone, Copy, ValueEnum)]
enum Colormap {
    Reds,
    Blues,
    Greens,
    Greys,
    Oranges,
    Purples,
}

impl Colormap {
    fn name(self) -> &'static str {
        match self {
            Colormap::Reds => "reds",
            Colormap::Blues => "blues",
            Colormap::Greens => "greens",
            Colormap::Greys => "greys",
            Colormap::Oranges => "oranges",
            Colormap::Purples => "purples",
        }
    }
}

fn parse_condition(s: &str) -> std::result::Result<Condition, String> {
    Condition::parse(s).map_err(|e| e.to_string())
}

fn parse_interval(s: &str) -> std::result::Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("interval must be positive, got {}", v))
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module(LOG_TARGET, level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let reporter = LogReporter;

    let filters = FilterConfig::from(cli.filters);

    match cli.cmd {
        Commands::Csv {
            output,
            dialect,
            separator,
        } => {
            let config = CsvConfig {
                output: output.unwrap_or_else(|| make_output_file(&cli.data, "csv")),
                data: cli.data,
                base_date: cli.basedate,
                filters,
                dialect: dialect.into(),
                delimiter: separator.map(|s| match s {
                    SeparatorArg::Comma => b',',
                    SeparatorArg::Tab => b'\t',
                }),
            };
            export::write_csv(&config, &reporter)?;
        }
        Commands::Plot {
            fig_output,
            plot_type: PlotType::Heatmap,
            colormap,
            square,
            subplot_conditions,
            x_interval,
            x_max,
            y_interval,
            y_max,
        } => {
            let config = PlotConfig {
                output: fig_output.unwrap_or_else(|| make_output_file(&cli.data, "html")),
                data: cli.data,
                filters,
                heatmap: HeatmapConfig {
                    x_interval,
                    x_max,
                    y_interval,
                    y_max,
                    base_date: cli.basedate,
                },
                conditions: subplot_conditions,
                colormap: colormap.name().to_string(),
                square,
            };
            if let Some(out) = plot::plot(&config, &reporter)? {
                println!("Wrote {}", out.display());
            }
        }
    }

    Ok(())
}
