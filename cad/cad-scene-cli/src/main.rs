//! cad-scene - CAD to renderer JSON / glTF
//!
//! Usage:
//!   cad-scene import model.step               Print the node/mesh JSON result
//!   cad-scene import part.json --format brep  Force the input format
//!   cad-scene gltf model.step -o out/model    Write out/model.gltf (+ .bin)
//!   cad-scene gltf model.step -o out/model --binary
//!
//! The result object goes to stdout; logs go to stderr (`RUST_LOG` to tune).
//! The exit status is non-zero when the result reports `"success": false`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use cad_scene::{
    CadFormat, ExportConfig, GltfExporter, ImportOptions, ImportParams, NameFormat,
    TransformFormat, read_file, read_file_gltf,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::debug;

#[derive(Parser)]
#[command(name = "cad-scene")]
#[command(about = "Flatten CAD files into render-ready meshes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the node tree and mesh array as JSON
    Import {
        #[command(flatten)]
        input: InputArgs,

        /// Tessellate every mesh in a separate pass before serializing
        #[arg(long)]
        force_tessellation: bool,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// Write the document as glTF 2.0
    Gltf {
        #[command(flatten)]
        input: InputArgs,

        /// Output path without extension
        #[arg(short, long, value_name = "STEM")]
        output: PathBuf,

        /// Write a single .glb instead of .gltf
        #[arg(long)]
        binary: bool,

        /// Placement encoding
        #[arg(long, value_enum, default_value_t = TransformArg::Compact)]
        transform: TransformArg,

        /// Node naming
        #[arg(long, value_enum, default_value_t = NameArg::ProductAndInstance)]
        names: NameArg,

        /// Do not write the zero TEXCOORD_0 attribute
        #[arg(long)]
        no_uv: bool,

        /// Write the payload to a .bin file next to the .gltf
        #[arg(long)]
        external_buffers: bool,

        /// Encode meshes on one thread
        #[arg(long)]
        serial: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// CAD file to read
    file: PathBuf,

    /// Input format (default: from the file extension)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// JSON file with import parameters (linearUnit, linearDeflectionType,
    /// linearDeflection, angularDeflection)
    #[arg(short, long, value_name = "JSON")]
    params: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Step,
    Iges,
    Brep,
}

impl From<FormatArg> for CadFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Step => Self::Step,
            FormatArg::Iges => Self::Iges,
            FormatArg::Brep => Self::Brep,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TransformArg {
    Compact,
    Mat4,
    Trs,
}

impl From<TransformArg> for TransformFormat {
    fn from(arg: TransformArg) -> Self {
        match arg {
            TransformArg::Compact => Self::Compact,
            TransformArg::Mat4 => Self::Mat4,
            TransformArg::Trs => Self::Trs,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum NameArg {
    Product,
    Instance,
    ProductAndInstance,
}

impl From<NameArg> for NameFormat {
    fn from(arg: NameArg) -> Self {
        match arg {
            NameArg::Product => Self::Product,
            NameArg::Instance => Self::Instance,
            NameArg::ProductAndInstance => Self::ProductAndInstance,
        }
    }
}

fn resolve_format(input: &InputArgs) -> Result<CadFormat> {
    match input.format {
        Some(format) => Ok(format.into()),
        None => match CadFormat::from_path(&input.file) {
            Some(format) => Ok(format),
            None => bail!(
                "Cannot detect the format of {}; pass --format",
                input.file.display()
            ),
        },
    }
}

fn load_params(path: Option<&Path>) -> Result<ImportParams> {
    let Some(path) = path else {
        return Ok(ImportParams::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameters: {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid parameter JSON: {}", path.display()))?;
    Ok(ImportParams::from_json(&value))
}

fn read_input(input: &InputArgs) -> Result<(CadFormat, Vec<u8>, ImportParams)> {
    let format = resolve_format(input)?;
    let bytes = fs::read(&input.file)
        .with_context(|| format!("Failed to read {}", input.file.display()))?;
    let params = load_params(input.params.as_deref())?;
    debug!(%format, bytes = bytes.len(), ?params, "Read input");
    Ok((format, bytes, params))
}

fn print_json(value: &impl serde::Serialize, pretty: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Import {
            input,
            force_tessellation,
            pretty,
        } => {
            let (format, bytes, params) = read_input(&input)?;
            let options = ImportOptions::default().with_force_tessellation(force_tessellation);
            let outcome = read_file(format, &bytes, &params, options);
            print_json(&outcome, pretty)?;
            Ok(outcome.is_success())
        }
        Command::Gltf {
            input,
            output,
            binary,
            transform,
            names,
            no_uv,
            external_buffers,
            serial,
        } => {
            let (format, bytes, params) = read_input(&input)?;
            if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            let config = ExportConfig::default()
                .with_transform_format(transform.into())
                .with_node_name_format(names.into())
                .with_force_uv(!no_uv)
                .with_embed_buffers(!external_buffers)
                .with_parallel(!serial);
            let exporter = GltfExporter::new(output, binary).with_config(config);
            let outcome = read_file_gltf(format, &bytes, &params, &exporter);
            print_json(&outcome, false)?;
            Ok(outcome.is_success())
        }
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let success = run(cli)?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
