use std::path::PathBuf;

use clap::Parser;

use basalt_generator::config::{load_params, save_params};
use basalt_generator::export::{export_heightfield, export_preview};
use basalt_generator::logging::init_logging;
use basalt_generator::terrain_map::TerrainClass;
use basalt_generator::{GenerationParams, TerrainGenerator};

#[derive(Parser, Debug)]
#[command(name = "basalt_generator")]
#[command(about = "Generate terraced basalt-column terrain with lava channels and voids")]
struct Args {
    /// Width of the map in pixels (overrides the config file)
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the map in pixels (overrides the config file)
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Seed for the elevation and Worley layers
    #[arg(short, long)]
    seed: Option<i32>,

    /// Load generation parameters from a JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective parameters to a JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Preview image of the classified terrain
    #[arg(short, long, default_value = "basalt.png")]
    output: PathBuf,

    /// Also write the terraced heightfield as a PNG
    #[arg(long)]
    heightfield: Option<PathBuf>,

    /// Number of terrace levels
    #[arg(short = 't', long)]
    terraces: Option<u32>,

    /// Probability that an open region becomes void instead of lava
    #[arg(long)]
    void_chance: Option<f32>,

    /// Hex column radius in pixels
    #[arg(long)]
    hex_size: Option<f32>,

    /// Debug-level logging (RUST_LOG still takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, params: &mut GenerationParams) {
        if let Some(w) = self.width {
            params.width = w;
        }
        if let Some(h) = self.height {
            params.height = h;
        }
        if let Some(seed) = self.seed {
            params.elevation.seed = seed;
            params.worley.seed = seed;
        }
        if let Some(t) = self.terraces {
            params.composition.terrace_levels = t;
        }
        if let Some(v) = self.void_chance {
            params.composition.void_chance = v.clamp(0.0, 1.0);
        }
        if let Some(s) = self.hex_size {
            params.columns.hex_size = s;
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut params = match &args.config {
        Some(path) => match load_params(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => GenerationParams::default(),
    };
    args.apply(&mut params);

    if let Some(path) = &args.save_config {
        if let Err(e) = save_params(path, &params) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        println!("Saved parameters to {}", path.display());
    }

    println!("Generating {}x{} terrain", params.width, params.height);
    println!(
        "Seeds: elevation {}, worley {}, river {}",
        params.elevation.seed, params.worley.seed, params.river.seed
    );

    let mut generator = TerrainGenerator::new();
    let data = generator.generate(&params);
    let report = &data.report;

    println!("Plateaus: {}", report.plateaus);
    println!("Columns: {}", report.columns);
    println!(
        "Channels: {} regions, {} kept, {} dropped",
        report.channels.regions, report.channels.kept, report.channels.dropped
    );
    println!(
        "Lava bodies: {}, void bodies: {}",
        data.lava_bodies.len(),
        data.void_bodies.len()
    );
    println!("Contour segments: {}", report.contour_segments);

    let counts = data.terrain.class_counts();
    let total = (data.width * data.height).max(1) as f64;
    for (class, n) in [
        (TerrainClass::Basalt, counts.basalt),
        (TerrainClass::Lava, counts.lava),
        (TerrainClass::Void, counts.void),
        (TerrainClass::Plateau(1), counts.plateau),
        (TerrainClass::Empty, counts.empty),
    ] {
        println!("  {:<8} {:>6.1}%", class.display_name(), 100.0 * n as f64 / total);
    }
    for (stage, time) in &report.timings {
        println!("  {:<10} {:>8.1} ms", stage, time.as_secs_f64() * 1000.0);
    }
    println!("Total: {:.1} ms", report.total_time().as_secs_f64() * 1000.0);

    if let Err(e) = export_preview(&data, &args.output) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    println!("Preview written to {}", args.output.display());

    if let Some(path) = &args.heightfield {
        if let Err(e) = export_heightfield(&data.heightfield, path) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        println!("Heightfield written to {}", path.display());
    }
}
