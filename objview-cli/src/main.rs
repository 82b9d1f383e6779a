/// objview - load a Wavefront OBJ mesh and transform it in place
///
/// Example:
///   objview model.obj --op tx=1 --op ry=1.5708 --op s=2 --dump

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use objview_core::AffineOp;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Load an OBJ mesh, apply affine transforms, report the result
#[derive(Parser)]
#[command(name = "objview")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the .obj file
    path: PathBuf,

    /// Transform to apply, in order: tx|ty|tz|rx|ry|rz|s=<value> (angles in radians)
    #[arg(long = "op", value_name = "OP")]
    ops: Vec<AffineOp>,

    /// Print every vertex and triangle after the transforms
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    let fmt_layer = fmt::layer().with_target(false).with_writer(io::stderr);
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(if cfg!(debug_assertions) { "debug" } else { "info" }))?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let cli = Cli::parse();

    let mut mesh = objview_core::parse(&cli.path)
        .with_context(|| format!("Failed to load {}", cli.path.display()))?;

    for op in &cli.ops {
        op.apply(mesh.vertices_mut())
            .with_context(|| format!("Failed to apply {}", op))?;
        info!("Applied {}", op);
    }

    let status = mesh.status();
    info!(
        "{} vertices, {} facets, ~{} edges, {} triangles",
        status.vertices,
        status.facets,
        status.edges,
        mesh.triangle_count()
    );
    if let Some((min, max)) = mesh.bounds() {
        info!(
            "Bounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    if cli.dump {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        mesh.write_dump(&mut out)?;
        out.flush()?;
    }

    Ok(())
}
