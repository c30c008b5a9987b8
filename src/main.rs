//! dicom-mpr - inspect, decode and reformat DICOM files.
//!
//! This binary reads files from the local filesystem and drives the library.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dicom_mpr::{
    codec::{to_display_u8, DecodedFrame, DisplayParams, PixelDecoder},
    config::{Cli, Command, DecodeArgs, InspectArgs, SliceArgs},
    format::{detect_layout, parse, Dataset, Element, Value},
    volume::{DecodeScheduler, LayerSource, MultiPlanarVolume, Plane, Series},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match &cli.command {
        Command::Inspect(args) => run_inspect(args).await,
        Command::Decode(args) => run_decode(args).await,
        Command::Slice(args) => run_slice(args, cli.workers).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose { "dicom_mpr=debug" } else { "dicom_mpr=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn read_dataset(path: &Path) -> Result<Dataset, String> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse(data).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

// =============================================================================
// Inspect Command
// =============================================================================

#[derive(Serialize)]
struct InspectSummary {
    file: String,
    layout: &'static str,
    transfer_syntax: Option<String>,
    elements: Vec<ElementSummary>,
}

#[derive(Serialize)]
struct ElementSummary {
    tag: String,
    name: Option<&'static str>,
    vr: &'static str,
    length: u32,
    value: String,
}

async fn run_inspect(args: &InspectArgs) -> Result<(), String> {
    let data = tokio::fs::read(&args.file)
        .await
        .map_err(|e| format!("Failed to read {}: {}", args.file.display(), e))?;
    let layout = detect_layout(&data).map_err(|e| e.to_string())?;
    let dataset = parse(data).map_err(|e| e.to_string())?;

    let summary = InspectSummary {
        file: args.file.display().to_string(),
        layout: layout.name(),
        transfer_syntax: dataset.transfer_syntax_uid().map(str::to_string),
        elements: dataset.iter().map(summarize).collect(),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
        println!("{}", json);
        return Ok(());
    }

    println!("{} ({})", summary.file, summary.layout);
    if let Some(ts) = &summary.transfer_syntax {
        println!("Transfer syntax: {}", ts);
    }
    println!("─────────────────────────────────────────────────────────────");
    for e in &summary.elements {
        println!(
            "{} {:<2} {:>8}  {:<36} {}",
            e.tag,
            e.vr,
            e.length,
            e.name.unwrap_or("?"),
            e.value
        );
    }
    println!("─────────────────────────────────────────────────────────────");
    println!("{} element(s)", summary.elements.len());
    Ok(())
}

fn summarize(element: &Element) -> ElementSummary {
    const MAX_TEXT: usize = 64;

    let value = match &element.value {
        Value::Empty => String::new(),
        Value::Text(s) if s.chars().count() > MAX_TEXT => {
            format!("{}...", s.chars().take(MAX_TEXT).collect::<String>())
        }
        Value::Text(s) => s.clone(),
        Value::Bytes(b) => format!("<{} bytes>", b.len()),
        Value::Sequence(items) => format!("<{} item(s)>", items.len()),
        Value::Encapsulated(f) => format!("<{} fragment(s), {} bytes>", f.len(), f.total_size()),
        other => match other.to_f64_vec() {
            Some(v) if v.len() > 8 => format!("<{} values>", v.len()),
            Some(v) => v
                .iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join("\\"),
            None => format!("<{} value(s)>", other.multiplicity()),
        },
    };

    ElementSummary {
        tag: format!("({:04X},{:04X})", element.tag.group, element.tag.element),
        name: element.name(),
        vr: element.vr.as_str(),
        length: element.length,
        value,
    }
}

// =============================================================================
// Decode Command
// =============================================================================

async fn run_decode(args: &DecodeArgs) -> Result<(), String> {
    let dataset = read_dataset(&args.file).await?;
    let frame_index = args.frame;

    let (dataset, frame) = tokio::task::spawn_blocking(move || {
        let frame = PixelDecoder::default().decode_frame(&dataset, frame_index);
        (dataset, frame)
    })
    .await
    .map_err(|e| format!("Decode task failed: {}", e))?;
    let frame = frame.map_err(|e| format!("Failed to decode frame {}: {}", frame_index, e))?;

    info!(
        columns = frame.columns,
        rows = frame.rows,
        channels = frame.channels,
        photometric = frame.photometric.as_str(),
        "Decoded frame"
    );

    let params = DisplayParams::from_dataset(&dataset, frame_index);
    write_png(&args.output, &frame, &params)
}

// =============================================================================
// Slice Command
// =============================================================================

async fn run_slice(args: &SliceArgs, workers: usize) -> Result<(), String> {
    let datasets = join_all(args.files.iter().map(|p| read_dataset(p)))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let series = Series::assemble(datasets).map_err(|e| e.to_string())?;
    let geometry = series.geometry();
    info!(
        size = ?geometry.size(),
        spacing = ?geometry.spacing(),
        origin = ?geometry.origin(),
        "Volume assembled"
    );

    let scheduler = DecodeScheduler::new(workers).map_err(|e| e.to_string())?;
    let volume = series
        .into_volume(PixelDecoder::default(), scheduler)
        .map_err(|e| e.to_string())?;
    let plane = Plane::from(args.plane);

    match args.thick {
        Some(m) => {
            let thick = volume.thick(m).map_err(|e| e.to_string())?;
            write_slice(&thick, plane, args.index, &args.output).await
        }
        None => write_slice(&volume, plane, args.index, &args.output).await,
    }
}

async fn write_slice<S: LayerSource>(
    volume: &MultiPlanarVolume<S>,
    plane: Plane,
    index: Option<usize>,
    output: &PathBuf,
) -> Result<(), String> {
    let view = volume.geometry().plane(plane);
    let index = index.unwrap_or(view.count / 2);
    info!(
        plane = plane.as_str(),
        index = index,
        count = view.count,
        labels = %view.label_string(),
        "Extracting slice"
    );

    let slice = volume
        .get_slice(plane, index)
        .await
        .map_err(|e| e.to_string())?;

    // Display parameters come from the slab nearest the slice centre
    let layer = match plane {
        Plane::Axial => index,
        Plane::Sagittal | Plane::Coronal => volume.cache().layer_count() / 2,
    };
    let params = volume
        .cache()
        .metadata(layer)
        .map(|ds| DisplayParams::from_dataset(ds, 0))
        .unwrap_or_default();

    write_png(output, &slice.image, &params)
}

fn write_png(path: &Path, frame: &DecodedFrame, params: &DisplayParams) -> Result<(), String> {
    let (samples, channels) = to_display_u8(frame, params);
    let color = if channels == 3 {
        image::ExtendedColorType::Rgb8
    } else {
        image::ExtendedColorType::L8
    };

    image::save_buffer_with_format(
        path,
        &samples,
        frame.columns as u32,
        frame.rows as u32,
        color,
        image::ImageFormat::Png,
    )
    .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    info!(path = %path.display(), "Wrote PNG");
    Ok(())
}
