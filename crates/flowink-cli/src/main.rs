//! FlowInk command-line host.
//!
//! Inspects, verifies, renders and generates sealed `.fink` diagram files.

use clap::{Parser, Subcommand};
use flowink_core::persist::{self, DiagramRecord};
use flowink_core::shapes::kinds;
use flowink_core::{
    ConfigError, ConnectorDirection, ConnectorRole, Diagram, DiagramConfig, DiagramError,
    FileStorage, PersistError, RecordingSurface, Shape, ShapeRegistry, Storage, StorageError,
};
use kurbo::{Point, Size};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "flowink", version, about = "Inspect and generate FlowInk diagrams")]
struct Cli {
    /// JSON config file (hit radii, signing key, load mode, ...)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the shapes and connections of a diagram
    Info { path: PathBuf },
    /// Check the signature and wiring of a diagram
    Verify { path: PathBuf },
    /// Write a small sample diagram
    Sample { path: PathBuf },
    /// Paint a diagram and list the draw calls
    Render {
        path: PathBuf,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
    },
    /// List the diagrams in a storage directory
    List {
        /// Defaults to the user data directory
        dir: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Diagram(#[from] DiagramError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0} wiring problem(s) found")]
    Wiring(usize),
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn load(path: &Path, config: &DiagramConfig) -> Result<Diagram, CliError> {
    let bytes = read(path)?;
    Ok(Diagram::load(&bytes, &ShapeRegistry::default(), config.clone())?)
}

fn info(path: &Path, config: &DiagramConfig) -> Result<(), CliError> {
    let record: DiagramRecord = persist::read_record(&read(path)?, &config.signing_key)?;
    println!("format version: {}", record.format_version);
    println!("view origin:    {}", record.view_origin);
    println!(
        "grid:           {} ({})",
        record.grid_size,
        if record.show_grid { "shown" } else { "hidden" }
    );
    println!("shapes:         {}", record.shapes.len());
    for shape in &record.shapes {
        println!(
            "  {} {:<18} at {},{} size {}x{} {:?}",
            shape.id, shape.kind, shape.x, shape.y, shape.width, shape.height, shape.text
        );
    }
    println!("connections:    {}", record.connections.len());
    for conn in &record.connections {
        println!(
            "  {} {}[{}] -> {}[{}]",
            conn.id, conn.from_shape_id, conn.from_index, conn.to_shape_id, conn.to_index
        );
    }
    Ok(())
}

fn verify(path: &Path, config: &DiagramConfig) -> Result<(), CliError> {
    let diagram = load(path, config)?;
    let problems = diagram.check_wiring();
    if problems > 0 {
        return Err(CliError::Wiring(problems));
    }
    println!(
        "{}: ok ({} shapes, {} connections)",
        path.display(),
        diagram.shapes().len(),
        diagram.connections().len()
    );
    Ok(())
}

fn sample(path: &Path, config: &DiagramConfig) -> Result<(), CliError> {
    let registry = ShapeRegistry::default();
    let mut diagram = Diagram::new(config.clone());
    diagram.show_grid = true;

    let a = diagram.drop_shape(kinds::RECTANGLE, Point::new(40.0, 40.0), &registry)?;
    let b = diagram.drop_shape(kinds::RECTANGLE, Point::new(280.0, 40.0), &registry)?;
    let c = diagram.drop_shape(kinds::DIAMOND, Point::new(290.0, 200.0), &registry)?;
    for (id, text) in [(a, "a1"), (b, "a2"), (c, "a3")] {
        if let Some(shape) = diagram.shape_mut(id) {
            shape.text = text.to_string();
        }
    }

    let connector = |direction, role| Shape::connector_index(direction, role).unwrap_or(0);
    diagram.add_connection_between(
        (a, connector(ConnectorDirection::Right, ConnectorRole::Source)),
        (b, connector(ConnectorDirection::Left, ConnectorRole::Target)),
    )?;
    diagram.add_connection_between(
        (b, connector(ConnectorDirection::Down, ConnectorRole::Source)),
        (c, connector(ConnectorDirection::Up, ConnectorRole::Target)),
    )?;

    let bytes = diagram.save()?;
    std::fs::write(path, bytes).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("Wrote sample diagram to {}", path.display());
    println!("wrote {}", path.display());
    Ok(())
}

fn render(path: &Path, config: &DiagramConfig, viewport: Size) -> Result<(), CliError> {
    let diagram = load(path, config)?;
    let mut surface = RecordingSurface::new();
    diagram.paint(&mut surface, viewport);
    for command in &surface.commands {
        println!("{:?}", command);
    }
    println!("{} draw calls", surface.len());
    Ok(())
}

fn list(dir: Option<&Path>, config: &DiagramConfig) -> Result<(), CliError> {
    let storage = match dir {
        Some(dir) => FileStorage::new(dir.to_path_buf())?,
        None => FileStorage::default_location()?,
    };
    let registry = ShapeRegistry::default();
    let ids = storage.list()?;
    if ids.is_empty() {
        println!("no diagrams in {}", storage.base_path().display());
    }
    for id in ids {
        match storage.load(&id, &registry, config.clone()) {
            Ok(diagram) => println!(
                "{:<24} {} shapes, {} connections",
                id,
                diagram.shapes().len(),
                diagram.connections().len()
            ),
            Err(err) => println!("{:<24} unreadable: {}", id, err),
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => DiagramConfig::from_path(path)?,
        None => DiagramConfig::default(),
    };

    match cli.command {
        Command::Info { path } => info(&path, &config),
        Command::Verify { path } => verify(&path, &config),
        Command::Sample { path } => sample(&path, &config),
        Command::Render {
            path,
            width,
            height,
        } => render(&path, &config, Size::new(width, height)),
        Command::List { dir } => list(dir.as_deref(), &config),
        Command::Config => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
