//! Headless field inspection: run one simulation step and save the position
//! and normal textures as PNGs.

use clap::Parser;

use swell::displacement::{read_texels, save_texels_png, DisplacementSimulator};
use swell::gpu::GpuContext;
use swell::params::OceanConfig;

#[derive(Parser, Debug)]
#[command(about = "Dump the ocean displacement field textures to PNGs")]
struct Args {
    /// Field texture resolution
    #[arg(long, default_value_t = 256)]
    resolution: u32,

    /// Wave falloff lookup table size
    #[arg(long, default_value_t = 128)]
    lookup_size: u32,

    /// Simulation time to evaluate (seconds)
    #[arg(long, default_value_t = 0.0)]
    time: f32,

    /// Output file prefix
    #[arg(long, default_value = "field")]
    out: String,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let ocean = OceanConfig {
        resolution: args.resolution,
        lookup_size: args.lookup_size,
        dump_fields: true,
        ..OceanConfig::default()
    };
    ocean.validate().expect("invalid configuration");

    let gpu = GpuContext::headless().expect("GPU context");

    let mut simulator = DisplacementSimulator::new(&gpu.device);
    simulator.reconfigure(&gpu.device, &gpu.queue, &ocean);
    let outcome = simulator.step(&gpu.device, &gpu.queue, &ocean.waves, args.time);
    println!("step outcome: {:?}", outcome);

    let field = simulator.field().expect("field provisioned");
    let resolution = field.resolution();

    let position = read_texels(&gpu.device, &gpu.queue, &field.position, resolution);
    let normal = read_texels(&gpu.device, &gpu.queue, &field.normal, resolution);

    save_texels_png(&format!("{}_position.png", args.out), &position, resolution).unwrap();
    save_texels_png(&format!("{}_normal.png", args.out), &normal, resolution).unwrap();
    println!("saved {0}_position.png and {0}_normal.png", args.out);
}
