//! Builds and writes the geometry of an isovolume database.
//!
//! Usage:
//! ```text
//! cargo run --example build_geometry -- <db> <data> <level>...
//! cargo run --example build_geometry -- db temperature 5 15 25
//! ```
//!
//! The database must hold one STL file per band (levels + 1) in `<db>/vols`
//! or `<db>`. The result is written to `<db>/geom-<data>.vtk`.

use std::process::ExitCode;

use isogeom::{BuildParams, IsoGeometry, IsogeomError};

fn run(db: String, data: String, levels: Vec<f64>) -> Result<(), IsogeomError> {
    let mut geom = IsoGeometry::new()
        .with_levels(levels)?
        .with_data(data)
        .with_db(db);
    let summary = geom.build(&BuildParams::default().with_viz(true))?;
    let path = geom.write_geometry(None)?;
    println!(
        "{} volumes, {} surfaces, {} curves -> {}",
        summary.volumes,
        summary.surfaces,
        summary.curves,
        path.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    // Default: WARN for everything, INFO for isogeom.
    // Override with RUST_LOG env var (e.g. RUST_LOG=isogeom=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("isogeom=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut args = std::env::args().skip(1);
    let (Some(db), Some(data)) = (args.next(), args.next()) else {
        eprintln!("usage: build_geometry <db> <data> <level>...");
        return ExitCode::FAILURE;
    };
    let levels: Result<Vec<f64>, _> = args.map(|a| a.parse::<f64>()).collect();
    let Ok(levels) = levels else {
        eprintln!("levels must be numbers");
        return ExitCode::FAILURE;
    };

    match run(db, data, levels) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
