use clap::{Parser, Subcommand, ValueEnum};
use pixsort::config::{self, PixsortConfig};
use pixsort::sorting::{Criterion, Pattern, SortEngine, SortJob, Strategy};
use pixsort::{codec, output};
use std::path::PathBuf;
use std::time::Instant;

/// Draw a bar every this many percent.
const PROGRESS_STEP: u8 = 10;

#[derive(Parser)]
#[command(name = "pixsort")]
#[command(about = "Pixel-sort images along an angle")]
#[command(long_about = "\
Pixel-sort images along an angle

Every line of pixels running along the sort angle is reordered by a color
key. Lines are straight; the angle is in degrees, counter-clockwise from the
+x axis (0 sorts rows left to right, 90 sorts columns).

Criteria:
  Brightness   mean of R, G, B (default)
  Hue          HSV hue, red → green → blue
  Saturation   HSV saturation
  Intensity    HSL lightness, (max + min) / 2
  Minimum      smallest channel

Settings come from ./pixsort.toml (or --config), then flags.
Run 'pixsort gen-config' to generate a documented pixsort.toml.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sort one image and write the result
    Sort(SortArgs),
    /// Print a stock pixsort.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Rotate the canvas so lines become rows
    Rotate,
    /// Shift rows or columns with wrap-around (lossless)
    Shear,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Rotate => Strategy::Rotate,
            StrategyArg::Shear => Strategy::Shear,
        }
    }
}

#[derive(clap::Args)]
struct SortArgs {
    /// Image to read
    input: PathBuf,

    /// Where to write the result; the extension picks the format
    output: PathBuf,

    /// Sort angle in degrees
    #[arg(long, allow_negative_numbers = true)]
    angle: Option<i32>,

    /// Sort key (unknown names fall back to Brightness)
    #[arg(long)]
    criterion: Option<String>,

    /// Line pattern: Linear, Radial, Spiral or Wave
    #[arg(long)]
    pattern: Option<String>,

    /// Fraction of each line that takes its sorted pixel, in (0, 1]
    #[arg(long)]
    intensity: Option<f32>,

    /// Seed for reproducible partial sorts
    #[arg(long)]
    seed: Option<u64>,

    /// How lines along the angle are aligned
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Sort lines on all worker threads
    #[arg(long)]
    parallel: bool,

    /// Config file (default: ./pixsort.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl SortArgs {
    /// Flags win over file values.
    fn apply(&self, config: &mut PixsortConfig) {
        if let Some(angle) = self.angle {
            config.sort.angle = angle;
        }
        if let Some(name) = &self.criterion {
            config.sort.criterion = Criterion::from_name(name);
        }
        if let Some(name) = &self.pattern {
            config.sort.pattern = Pattern::from_name(name);
        }
        if let Some(intensity) = self.intensity {
            config.sort.intensity = intensity;
        }
        if let Some(seed) = self.seed {
            config.sort.seed = Some(seed);
        }
        if let Some(strategy) = self.strategy {
            config.geometry.strategy = strategy.into();
        }
        if self.parallel {
            config.processing.parallel = true;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Sort(args) => run_sort(&args)?,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_sort(args: &SortArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config::load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;
    init_thread_pool(&config.processing);

    let params = config.sort_params();
    let engine_config = config.engine_config();
    let image = codec::load_rgb(&args.input)?;
    for line in output::format_run_header(&args.input, image.dimensions(), &params, &engine_config) {
        println!("{}", line);
    }

    let start = Instant::now();
    let job = SortJob::spawn(SortEngine::new(engine_config), &image, params)?;
    drop(image);

    let (tx, rx) = std::sync::mpsc::channel::<u8>();
    let printer = std::thread::spawn(move || {
        let mut last = None;
        for percent in rx {
            if output::is_progress_milestone(last, percent, PROGRESS_STEP) {
                println!("{}", output::format_progress(percent));
            }
            last = Some(percent);
        }
    });
    let result = job.wait(|percent| {
        let _ = tx.send(percent);
    });
    drop(tx);
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;

    let sorted = match result {
        Ok(sorted) => sorted,
        Err(failure) => {
            for line in output::format_failure(&failure) {
                eprintln!("{}", line);
            }
            std::process::exit(1);
        }
    };

    codec::save_rgb(&sorted, &args.output)?;
    for line in output::format_summary(&args.output, sorted.dimensions(), start.elapsed()) {
        println!("{}", line);
    }
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never more threads than available cores; the config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
