//! meshmux CLI - mesh format conversion tool.
//!
//! Usage: meshmux <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `meshmux --help` for available commands. Set `RUST_LOG=debug` to see
//! which codec handles each file.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use meshmux::algo::{subdivide_midpoint, SubdivideOptions};
use meshmux::attribute::{slot, AttributeKind, ConverterRegistry, InterpolationRegistry};
use meshmux::fs::FileRef;
use meshmux::io::{FileContainer, FormatRegistry};

#[derive(Parser)]
#[command(name = "meshmux")]
#[command(author, version, about = "Mesh format conversion CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered formats
    Formats,

    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Convert a mesh between formats
    Convert {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file (format chosen by extension)
        output: PathBuf,

        /// Reshape positions to this many components (2-4)
        #[arg(long, value_parser = clap::value_parser!(u8).range(2..=4))]
        position_components: Option<u8>,

        /// Reshape every texture coordinate set to this many components (2-4)
        #[arg(long, value_parser = clap::value_parser!(u8).range(2..=4))]
        uv_components: Option<u8>,
    },

    /// Midpoint-subdivide every mesh in a file
    Subdivide {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Number of subdivision iterations
        #[arg(short, long, default_value = "1")]
        iterations: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let registry = FormatRegistry::with_defaults();

    match cli.command {
        Commands::Formats => cmd_formats(&registry),
        Commands::Info { input } => cmd_info(&registry, &input)?,
        Commands::Convert {
            input,
            output,
            position_components,
            uv_components,
        } => {
            cmd_convert(
                &registry,
                &input,
                &output,
                position_components.map(usize::from),
                uv_components.map(usize::from),
            )?;
        }
        Commands::Subdivide {
            input,
            output,
            iterations,
        } => {
            cmd_subdivide(&registry, &input, &output, iterations)?;
        }
    }

    Ok(())
}

fn cmd_formats(registry: &FormatRegistry) {
    for codec in registry.codecs() {
        let extensions: Vec<String> = codec
            .supported_extensions()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("{:<6} {}", codec.name(), extensions.join(", "));
    }
}

fn load(registry: &FormatRegistry, input: &Path) -> Result<FileContainer, Box<dyn std::error::Error>> {
    let container = registry.read(&FileRef::os(input))?;
    println!(
        "Loaded: {} mesh(es), {} vertices, {} faces",
        container.meshes.len(),
        container.num_vertices(),
        container.num_faces()
    );
    Ok(container)
}

fn cmd_info(registry: &FormatRegistry, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let container = registry.read(&FileRef::os(input))?;

    println!("File: {}", input.display());
    if let Some(format) = &container.source_format {
        println!("Format: {}", format);
    }
    println!("Meshes: {}", container.meshes.len());

    for (i, mesh) in container.meshes.iter().enumerate() {
        println!();
        println!("Mesh {}{}", i, mesh.name().map(|n| format!(" ({n})")).unwrap_or_default());
        println!("  Vertices: {}", mesh.num_vertices());
        match mesh.topology() {
            Some(topology) if topology.is_triangles() => {
                println!("  Faces: {} (triangles)", topology.num_faces());
            }
            Some(topology) => println!("  Faces: {} (polygons)", topology.num_faces()),
            None => println!("  Faces: none (unindexed)"),
        }
        println!("  Slots:");
        for (name, spec) in mesh.schema().iter() {
            println!("    {:<10} {:<9} {}D", name, spec.kind.to_string(), spec.components);
        }
    }

    Ok(())
}

fn cmd_convert(
    registry: &FormatRegistry,
    input: &Path,
    output: &Path,
    position_components: Option<usize>,
    uv_components: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut container = load(registry, input)?;
    let converters = ConverterRegistry::new();

    for mesh in &mut container.meshes {
        if let Some(n) = position_components {
            if mesh.schema().contains(slot::POSITION) {
                mesh.convert_slot(slot::POSITION, n, &converters)?;
            }
        }
        if let Some(n) = uv_components {
            let uv_slots: Vec<String> = mesh
                .schema()
                .iter()
                .filter(|(_, spec)| spec.kind == AttributeKind::TexCoord)
                .map(|(name, _)| name.to_string())
                .collect();
            for name in uv_slots {
                mesh.convert_slot(&name, n, &converters)?;
            }
        }
    }

    let start = Instant::now();
    registry.write(&FileRef::os(output), &container)?;
    println!("Saved: {} ({:.2?})", output.display(), start.elapsed());

    Ok(())
}

fn cmd_subdivide(
    registry: &FormatRegistry,
    input: &Path,
    output: &Path,
    iterations: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let container = load(registry, input)?;
    let options = SubdivideOptions::new(iterations);
    let interpolation = InterpolationRegistry::new();

    println!("Applying midpoint subdivision ({} iterations)...", iterations);
    let start = Instant::now();
    let meshes = container
        .meshes
        .iter()
        .map(|mesh| subdivide_midpoint(mesh, &options, &interpolation))
        .collect::<Result<Vec<_>, _>>()?;
    let elapsed = start.elapsed();

    let container = FileContainer {
        meshes,
        source_format: container.source_format,
    };
    println!(
        "Result: {} vertices, {} faces",
        container.num_vertices(),
        container.num_faces()
    );
    registry.write(&FileRef::os(output), &container)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
