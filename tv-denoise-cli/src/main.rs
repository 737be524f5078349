use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use tv_denoise::{
    Config, Error, FailureOutcome, Image, MetricPair, SweepResult, Warning, add_gaussian_noise,
    compute_metrics, denoise, linspace, sweep_lambda, sweep_lambda_parallel,
};

mod visualize;

/// Side length of the synthetic image used when no `--image` is given.
const PHANTOM_SIDE: usize = 128;

#[derive(Parser)]
#[command(name = "tv-denoise", version, about, long_about = None)]
struct Cli {
    /// Grayscale source image. Colour images are converted to luma.
    /// Without one, a synthetic phantom is used.
    #[arg(short = 'i', long)]
    image: Option<PathBuf>,

    /// Keep only every k-th row and column of the source image.
    #[arg(long, default_value_t = 1)]
    downsample: usize,

    /// Standard deviation of the Gaussian noise.
    #[arg(long, default_value_t = 0.1)]
    sigma: f64,

    /// Seed for the noise generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Regularization weight for the demo run.
    #[arg(short = 'l', long, default_value_t = 0.1)]
    lambda: f64,

    /// Iteration budget for every solve.
    #[arg(long = "max-iter", default_value_t = tv_denoise::DEFAULT_MAX_ITERATIONS)]
    max_iter: usize,

    /// Smallest lambda in the sweep.
    #[arg(long, default_value_t = 0.01)]
    sweep_start: f64,

    /// Largest lambda in the sweep.
    #[arg(long, default_value_t = 0.2)]
    sweep_end: f64,

    /// How many evenly spaced lambdas to sweep over.
    #[arg(long, default_value_t = 5)]
    sweep_steps: usize,

    /// Run the sweep's solves concurrently.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Save comparison.png, sweep.png and denoised.png into this directory.
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Log filter, used when RUST_LOG isn't set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Everything one run of the CLI computed.
struct Run {
    clean: Image,
    noisy: Image,
    demo: DemoRun,
    sweep: SweepResult,
    sweep_duration: Duration,
}

/// The single solve at `--lambda`.
struct DemoRun {
    lambda: f64,
    denoised: Image,
    metrics: MetricPair,
    converged: bool,
    iterations: usize,
    warnings: Vec<Warning>,
}

fn main() {
    let cli = Cli::parse();
    let _logger = match setup_logging(&cli.log_level) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    let run = match main_inner(&cli) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    if let Err(e) = handle_output(&run, &cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Log to stderr, so stdout only has the results.
/// The handle must stay alive for as long as logs should be written.
fn setup_logging(level: &str) -> anyhow::Result<LoggerHandle> {
    let handle = Logger::try_with_env_or_str(level)
        .context("bad log level")?
        .log_to_stderr()
        .start()
        .context("logger initialization failed")?;
    Ok(handle)
}

fn main_inner(cli: &Cli) -> anyhow::Result<Run> {
    let source = match &cli.image {
        Some(path) => load_grayscale(path)?,
        None => Image::phantom(PHANTOM_SIDE, PHANTOM_SIDE)?,
    };
    let clean = source.downsampled(cli.downsample)?;
    log::info!("Denoising a {}x{} image", clean.rows(), clean.cols());
    let noisy = add_gaussian_noise(&clean, cli.sigma, Some(cli.seed))?;
    let config = Config::default().with_max_iterations(cli.max_iter);

    let demo = demo_run(&clean, &noisy, cli.lambda, config)?;

    let lambdas = linspace(cli.sweep_start, cli.sweep_end, cli.sweep_steps);
    let now = Instant::now();
    let sweep = if cli.parallel {
        sweep_lambda_parallel(&noisy, &clean, &lambdas, config)?
    } else {
        sweep_lambda(&noisy, &clean, &lambdas, config)?
    };
    let sweep_duration = now.elapsed();

    Ok(Run {
        clean,
        noisy,
        demo,
        sweep,
        sweep_duration,
    })
}

/// Denoise once. If the solver runs out of iterations, carry on with its last iterate.
fn demo_run(clean: &Image, noisy: &Image, lambda: f64, config: Config) -> anyhow::Result<DemoRun> {
    let (denoised, converged, iterations, warnings) = match denoise(noisy, lambda, config) {
        Ok(outcome) => {
            let iterations = outcome.iterations();
            let warnings = outcome.warnings().to_vec();
            (outcome.into_image(), true, iterations, warnings)
        }
        Err(FailureOutcome {
            error: Error::NonConvergence { .. },
            last_iterate: Some(last_iterate),
            iterations,
            warnings,
        }) => (last_iterate, false, iterations, warnings),
        Err(failure) => return Err(Error::from(failure).into()),
    };
    let metrics = compute_metrics(clean, &denoised)?;
    Ok(DemoRun {
        lambda,
        denoised,
        metrics,
        converged,
        iterations,
        warnings,
    })
}

fn handle_output(run: &Run, cli: &Cli) -> anyhow::Result<()> {
    print_output(run);
    if let Some(dir) = &cli.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
        visualize::save_comparison(
            &run.clean,
            &run.noisy,
            &run.demo.denoised,
            run.demo.lambda,
            &dir.join("comparison.png"),
        )?;
        visualize::save_sweep_chart(&run.sweep, &dir.join("sweep.png"))?;
        visualize::save_grayscale(&run.demo.denoised, &dir.join("denoised.png"))?;
    }
    Ok(())
}

/// Read any image format the `image` crate supports, as luma scaled into [0, 1].
fn load_grayscale(path: &Path) -> anyhow::Result<Image> {
    let luma = image::open(path)
        .with_context(|| format!("could not read image {}", path.display()))?
        .to_luma8();
    let (width, height) = luma.dimensions();
    let pixels = luma
        .into_raw()
        .into_iter()
        .map(|v| f64::from(v) / 255.0)
        .collect();
    Ok(Image::new(height as usize, width as usize, pixels)?)
}

/// Prints the output nicely to stdout.
fn print_output(run: &Run) {
    let DemoRun {
        lambda,
        metrics,
        converged,
        iterations,
        warnings,
        ..
    } = &run.demo;
    print_warnings(warnings);
    if !converged {
        print_non_convergence(*lambda, *iterations);
    }
    print_metrics_line(*lambda, metrics);

    println!("Sweep:");
    for entry in &run.sweep.entries {
        if !entry.converged {
            print_non_convergence(entry.lambda, entry.iterations);
        }
        print_metrics_line(
            entry.lambda,
            &MetricPair {
                psnr: entry.psnr,
                ssim: entry.ssim,
            },
        );
    }
    print_performance(run.sweep.len(), run.sweep_duration);
    if let Some(best) = run.sweep.best_by_psnr() {
        println!("Best lambda by PSNR: {:.3}", best.lambda);
    }
    if let Some(best) = run.sweep.best_by_ssim() {
        println!("Best lambda by SSIM: {:.3}", best.lambda);
    }
}

fn print_metrics_line(lambda: f64, MetricPair { psnr, ssim }: &MetricPair) {
    println!("{}", metrics_line(lambda, *psnr, *ssim));
}

fn metrics_line(lambda: f64, psnr: f64, ssim: f64) -> String {
    format!("lambda={lambda:.3} PSNR={psnr:.2} SSIM={ssim:.3}")
}

fn print_performance(solves: usize, duration: Duration) {
    if solves == 0 {
        return;
    }
    let per_solve = per_solve(duration, solves);
    println!(
        "Swept {solves} lambdas in {}ms ({}ms per solve)",
        duration.as_millis(),
        per_solve.as_millis()
    );
}

fn per_solve(duration: Duration, solves: usize) -> Duration {
    duration.div_f64(solves as f64)
}

fn print_warnings(warnings: &[Warning]) {
    use colored::Colorize;
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("\t{}", warning.content.to_string().yellow());
        }
    }
}

fn print_non_convergence(lambda: f64, iterations: usize) {
    use colored::Colorize;
    let msg = format!(
        "lambda={lambda:.3} did not converge in {iterations} iterations, using the last iterate"
    );
    eprintln!("{}", msg.yellow());
}
