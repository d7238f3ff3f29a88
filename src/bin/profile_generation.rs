//! Profiling tool: cold generation vs. regeneration from cached noise

use std::time::{Duration, Instant};

use basalt_generator::{GenerationParams, TerrainGenerator};

fn percent(part: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    100.0 * part.as_secs_f64() / total.as_secs_f64()
}

fn main() {
    basalt_generator::logging::init_logging(false);

    let params = GenerationParams::default();
    let mut generator = TerrainGenerator::new();

    println!("=== Performance Profiling ===");
    println!("Map size: {}x{} ({} cells)", params.width, params.height, params.width * params.height);
    println!();

    // Cold run: every noise layer is generated
    let start = Instant::now();
    let cold = generator.generate(&params);
    let cold_time = start.elapsed();
    println!("Cold generation: {:?}", cold_time);
    for (stage, time) in &cold.report.timings {
        println!("  {:<10} {:>8.2}% ({:?})", stage, percent(*time, cold_time), time);
    }

    // Warm run: only composition parameters changed, noise comes from the cache
    let mut retuned = params.clone();
    retuned.composition.terrace_levels += 2;
    let start = Instant::now();
    let warm = generator.generate(&retuned);
    let warm_time = start.elapsed();
    println!("\nCached regeneration (terraces {}): {:?}", retuned.composition.terrace_levels, warm_time);
    for (stage, time) in &warm.report.timings {
        println!("  {:<10} {:>8.2}% ({:?})", stage, percent(*time, warm_time), time);
    }

    let stats = generator.cache_stats();
    println!("\n=== Summary ===");
    println!("Cache: {} hits, {} misses", stats.hits, stats.misses);
    println!("Speedup from cache: {:.1}x", cold_time.as_secs_f64() / warm_time.as_secs_f64().max(1e-9));
    println!(
        "Output: {} plateaus, {} columns, {} lava, {} voids",
        warm.plateaus.len(),
        warm.columns.len(),
        warm.lava_bodies.len(),
        warm.void_bodies.len()
    );
}
