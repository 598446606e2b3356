//! HippoMaps CLI - spatial significance testing for hippocampal maps

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hippomaps_algorithms::context::{ContextParams, ContextResult, Contextualizer};
use hippomaps_algorithms::metrics::Metric;
use hippomaps_algorithms::permutation::{
    PermutationEngine, SpectralConfig, Spectrum, SpinPermutation, WeightCache,
};
use hippomaps_algorithms::significance::{EvaluateParams, SignificanceEvaluator, SignificanceResult};
use hippomaps_colormap::{ScatterRaster, ScatterStyle};
use hippomaps_core::io::{write_field_text, FileMapLoader, JsonSurfaceLoader, MapLoader};
use hippomaps_core::{Density, Label, ResourceConfig, ScalarField, VertexCountRegistry};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "hippomaps")]
#[command(
    author,
    version,
    about = "Spatial statistics for hippocampal surface maps",
    long_about = None
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Root of the reference resources (surfaces, feature catalog)
    #[arg(short, long, global = true, default_value = "resources")]
    resources: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a map file
    Info {
        /// Input map (text or TIFF)
        input: PathBuf,
    },
    /// Spin test on the unfolded grid
    Spin(TestArgs),
    /// Moran spectral randomisation test on the canonical surface
    Moran {
        #[command(flatten)]
        test: TestArgs,
        /// Neighbourhood ring for geodesic weights
        #[arg(long, default_value = "1")]
        n_ring: usize,
        /// Eigenvectors to keep: all, nonzero
        #[arg(long, default_value = "all")]
        spectrum: String,
    },
    /// Rank maps against the reference feature catalog
    Contextualize {
        /// Input maps, one file per map
        #[arg(required = true)]
        maps: Vec<PathBuf>,
        /// Closest features to report per map
        #[arg(short, long, default_value = "3")]
        top: usize,
        /// Use plain Pearson correlation instead of spin tests
        #[arg(long)]
        no_perm: bool,
        /// Permutations per spin test
        #[arg(short, long, default_value = "1000")]
        nperm: usize,
        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Write the context scatter plot to this TIFF
        #[arg(long)]
        plot: Option<PathBuf>,
    },
}

#[derive(Args)]
struct TestArgs {
    /// Map compared with each surrogate
    fixed: PathBuf,
    /// Map that is randomised
    perturbed: PathBuf,
    /// Number of permutations
    #[arg(short, long, default_value = "1000")]
    nperm: usize,
    /// Similarity metric: pearson, spearman, adjusted_rand, adjusted_mutual_info
    #[arg(short, long, default_value = "pearson")]
    metric: String,
    /// Structure label: hipp, dentate
    #[arg(short, long, default_value = "hipp")]
    label: String,
    /// Density of the input maps: unfoldiso, 0p5mm, 1mm, 2mm
    #[arg(short, long, default_value = "0p5mm")]
    density: String,
    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
    /// Write the null distribution, one value per line
    #[arg(long)]
    null: Option<PathBuf>,
}

impl TestArgs {
    fn params(&self) -> Result<EvaluateParams> {
        Ok(EvaluateParams {
            nperm: self.nperm,
            metric: self.metric.parse::<Metric>().context("Invalid metric")?,
            label: self.label.parse::<Label>().context("Invalid label")?,
            density: self.density.parse::<Density>().context("Invalid density")?,
            seed: self.seed,
        })
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Setting default subscriber failed")
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn read_map(path: &Path) -> Result<ScalarField> {
    let field = FileMapLoader
        .load(path)
        .with_context(|| format!("Failed to read map {}", path.display()))?;
    info!("{}: {} values", path.display(), field.len());
    Ok(field)
}

fn run_test(
    args: &TestArgs,
    engine: &dyn PermutationEngine,
    evaluator: &SignificanceEvaluator,
) -> Result<()> {
    let params = args.params()?;
    let fixed = read_map(&args.fixed)?;
    let perturbed = read_map(&args.perturbed)?;

    let pb = spinner(&format!("Running {} permutations...", params.nperm))?;
    let start = Instant::now();
    let result = evaluator
        .evaluate(fixed, perturbed, engine, &params)
        .with_context(|| format!("{} test failed", engine.name()))?;
    pb.finish_and_clear();

    report(&result, &params, start.elapsed());
    if let Some(path) = &args.null {
        write_field_text(&ScalarField::new(result.null.clone()), path)
            .context("Failed to write null distribution")?;
        println!("Null distribution saved to: {}", path.display());
    }
    Ok(())
}

fn report(result: &SignificanceResult, params: &EvaluateParams, elapsed: std::time::Duration) {
    println!("Metric: {}", params.metric);
    println!("Observed: {:.4}", result.observed);
    println!("p-value: {:.4} ({} permutations)", result.p_value, result.null.len());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_context(result: &ContextResult, maps: &[PathBuf]) {
    for (t, path) in maps.iter().enumerate() {
        println!("[{}] {}", t, path.display());
        println!("  AP correlation: {:.3}", result.ap_corr[t]);
        println!("  Subfield correlation: {:.3}", result.subfield_corr[t]);
        for ((name, r), p) in result.top_features[t]
            .iter()
            .zip(&result.top_r[t])
            .zip(&result.top_p[t])
        {
            println!("    {:<24} R = {:>7.3}  p = {:.4}", name, r, p);
        }
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let config = ResourceConfig::new(&cli.resources);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let field = read_map(&input)?;
            let stats = field.statistics();
            let registry = VertexCountRegistry::default();

            println!("File: {}", input.display());
            println!("Vertices: {}", field.len());
            let matches: Vec<String> = Label::ALL
                .iter()
                .filter_map(|&label| {
                    registry
                        .density_for(label, field.len())
                        .map(|d| format!("{} {}", label, d))
                })
                .collect();
            if matches.is_empty() {
                println!("Tessellation: unknown");
            } else {
                println!("Tessellation: {}", matches.join(", "));
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid vertices: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / field.len().max(1) as f64
            );
        }

        // ── Significance ─────────────────────────────────────────────
        Commands::Spin(args) => {
            run_test(&args, &SpinPermutation, &SignificanceEvaluator::from_config(&config))?;
        }

        Commands::Moran {
            test,
            n_ring,
            spectrum,
        } => {
            let params = test.params()?;
            let spectrum: Spectrum = spectrum.parse().context("Invalid spectrum")?;
            let cache = WeightCache::new(SpectralConfig {
                n_ring,
                spectrum,
                ..SpectralConfig::default()
            });
            let surfaces = JsonSurfaceLoader::new(config.clone());

            let pb = spinner("Building spectral model...")?;
            let engine = cache
                .engine(params.label, params.density, &surfaces)
                .context("Failed to build spectral model")?;
            pb.finish_and_clear();

            run_test(&test, &engine, &SignificanceEvaluator::from_config(&config))?;
        }

        // ── Contextualize ────────────────────────────────────────────
        Commands::Contextualize {
            maps,
            top,
            no_perm,
            nperm,
            seed,
            plot,
        } => {
            let fields = maps
                .iter()
                .map(|p| read_map(p))
                .collect::<Result<Vec<_>>>()?;
            let ctx = Contextualizer::from_config(&config)
                .context("Failed to load feature catalog")?;
            let params = ContextParams {
                top_n: top,
                permutation_test: !no_perm,
                nperm,
                seed,
                plot: plot.is_some(),
            };

            let mut renderer = plot
                .as_ref()
                .map(|path| ScatterRaster::new(ScatterStyle::default()).to_file(path));

            let pb = spinner("Comparing with reference maps...")?;
            let start = Instant::now();
            let result = ctx
                .contextualize(
                    &fields,
                    &params,
                    renderer.as_mut().map(|r| r as &mut dyn hippomaps_core::Renderer),
                )
                .context("Contextualization failed")?;
            pb.finish_and_clear();

            print_context(&result, &maps);
            println!("  Processing time: {:.2?}", start.elapsed());
        }
    }

    Ok(())
}
