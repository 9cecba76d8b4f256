use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use focalloop::{
    AnimationConfig, CancelToken, Canvas, CpuBackend, EngineConfig, ExportFormat, ExportRequest,
    ImageId, ImageSet, PlaybackEngine, Point, RenderBackend as _, Vec2,
};

#[derive(Parser, Debug)]
#[command(name = "focalloop", version)]
struct Cli {
    /// More log output (`-v` debug, `-vv` trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Engine configuration JSON (limits, export settings).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Align every image with a focal point and write the updated project.
    Align(AlignArgs),
    /// Render one playback frame as a PNG.
    Frame(FrameArgs),
    /// Export the loop as an animated GIF, a video (requires `ffmpeg` on PATH) or a PNG sequence.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct AlignArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output project JSON.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playback tick (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Draw focal markers like the interactive preview.
    #[arg(long)]
    markers: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// `gif`, `video` (`mp4`/`webm`) or `frames` (`zip`).
    #[arg(long, default_value = "gif")]
    format: String,

    /// Output file path.
    #[arg(long)]
    out: PathBuf,
}

/// On-disk project: image files plus the per-image record fields.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Project {
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
    #[serde(default)]
    animation: AnimationConfig,
    images: Vec<ProjectImage>,
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ProjectImage {
    /// Image file, relative to the project file.
    path: PathBuf,
    #[serde(default)]
    created_at: u64,
    #[serde(default)]
    position: [f64; 2],
    #[serde(default = "one")]
    scale: f64,
    /// Rotation in degrees.
    #[serde(default)]
    rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frame_zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frame_offset: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    focal_point: Option<[f64; 2]>,
    #[serde(default = "one")]
    opacity: f64,
    #[serde(default)]
    draw_rank: i64,
}

fn one() -> f64 {
    1.0
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    match cli.cmd {
        Command::Align(args) => cmd_align(args, &cfg),
        Command::Frame(args) => cmd_frame(args, &cfg),
        Command::Export(args) => cmd_export(args, &cfg),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "focalloop=warn",
        1 => "focalloop=debug",
        _ => "focalloop=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn read_project(path: &Path) -> anyhow::Result<Project> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let r = BufReader::new(f);
    let project: Project = serde_json::from_reader(r).with_context(|| "parse project JSON")?;
    Ok(project)
}

/// Decode every image and apply its record fields. Ids follow project order.
fn load_set(project: &Project, root: &Path, cfg: &EngineConfig) -> anyhow::Result<(ImageSet, Vec<ImageId>)> {
    let mut set = ImageSet::new(cfg.max_images);
    let mut ids = Vec::with_capacity(project.images.len());
    for img in &project.images {
        let path = root.join(&img.path);
        let bytes =
            std::fs::read(&path).with_context(|| format!("read image '{}'", path.display()))?;
        let (next, id) = set
            .with_ingested(&bytes, img.created_at)
            .with_context(|| format!("ingest '{}'", path.display()))?;

        let mut record = next
            .get(id)
            .cloned()
            .with_context(|| format!("image {id} missing after ingest"))?;
        record.placement.position = Point::new(img.position[0], img.position[1]);
        record.placement.scale = img.scale;
        record.placement.rotation_rad = img.rotation.to_radians();
        record.frame_zoom = img.frame_zoom;
        record.frame_offset = img.frame_offset.map(|[x, y]| Vec2::new(x, y));
        record.focal_point = img.focal_point.map(|[x, y]| Point::new(x, y));
        record.opacity = img.opacity;
        record.draw_rank = img.draw_rank;

        set = next.with_replaced(record)?;
        ids.push(id);
    }
    Ok((set, ids))
}

fn project_root(in_path: &Path) -> &Path {
    in_path.parent().unwrap_or_else(|| Path::new("."))
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_align(args: AlignArgs, cfg: &EngineConfig) -> anyhow::Result<()> {
    let mut project = read_project(&args.in_path)?;
    let (set, ids) = load_set(&project, project_root(&args.in_path), cfg)?;

    let aligned = focalloop::align(&set, cfg.min_frame_zoom)?;
    for (img, id) in project.images.iter_mut().zip(&ids) {
        if let Some(record) = aligned.get(*id) {
            let p = record.placement.position;
            img.position = [p.x, p.y];
        }
    }

    ensure_parent(&args.out)?;
    let f = File::create(&args.out)
        .with_context(|| format!("create project '{}'", args.out.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(f), &project)
        .with_context(|| format!("write project '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs, cfg: &EngineConfig) -> anyhow::Result<()> {
    let project = read_project(&args.in_path)?;
    let (set, _) = load_set(&project, project_root(&args.in_path), cfg)?;

    let surface = Canvas::new(project.width, project.height)?;
    let mut engine = PlaybackEngine::new(cfg, &project.animation, surface).with_focal_markers(args.markers);
    anyhow::ensure!(engine.play(&set), "project has no images to play");
    for _ in 0..args.frame {
        engine.step(&set);
    }
    let plan = engine
        .frame(&set)?
        .with_context(|| "playback produced no frame")?;
    let frame = CpuBackend::new().render(&plan)?;

    ensure_parent(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs, cfg: &EngineConfig) -> anyhow::Result<()> {
    let project = read_project(&args.in_path)?;
    let (set, _) = load_set(&project, project_root(&args.in_path), cfg)?;

    let format = ExportFormat::parse(&args.format)?;
    let req = ExportRequest::new(format, project.animation.clone(), project.width, project.height);
    let mut last_pct = 0u32;
    let artifact = focalloop::export(&set, cfg, &req, &CancelToken::new(), &mut |p| {
        let pct = (p * 100.0).round() as u32;
        if pct >= last_pct + 10 || pct == 100 {
            tracing::info!(progress = pct, "exporting");
            last_pct = pct;
        }
    })?;

    ensure_parent(&args.out)?;
    std::fs::write(&args.out, &artifact.bytes)
        .with_context(|| format!("write artifact '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}, {} frames, {} ms/frame)",
        args.out.display(),
        artifact.mime_type,
        artifact.frame_count,
        artifact.frame_delay_ms
    );
    Ok(())
}
