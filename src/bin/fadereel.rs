use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fadereel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode one clip per image and compose them into a cross-faded reel.
    Generate(GenerateArgs),
    /// Generate the reel and write the frame shown at a given time as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct ReelArgs {
    /// Directory holding the source images.
    #[arg(long)]
    images: PathBuf,

    /// Image names, in reel order; extensions are resolved inside `--images`.
    #[arg(long, value_delimiter = ',', default_value = "1,2,3,4,5")]
    names: Vec<String>,

    /// Directory the clip files are written to.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Reel config JSON; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Encode worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// End the reel with the last visible clip instead of summing clip lengths.
    #[arg(long, default_value_t = false)]
    visible_span: bool,

    /// Overlay text.
    #[arg(long)]
    text: Option<String>,

    /// Do not draw the text overlay.
    #[arg(long, default_value_t = false)]
    no_overlay: bool,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    reel: ReelArgs,

    /// Also render the composed reel into this MP4.
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    reel: ReelArgs,

    /// Composition time in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    png: PathBuf,

    /// Fit the frame into the configured viewport instead of the render size.
    #[arg(long, default_value_t = false)]
    fit: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut reel = run_request(&args.reel)?;
    for clip in &reel.clips {
        eprintln!("wrote {}", clip.path.display());
    }
    let comp = reel.handle.composition();
    eprintln!(
        "reel: {} clips, {:.1}s, {}x{}",
        comp.entries().len(),
        comp.duration_secs(),
        comp.render_size().width,
        comp.render_size().height
    );

    if let Some(out) = &args.export {
        let mut sink = fadereel::FfmpegSink::new(fadereel::FfmpegSinkOpts::new(out));
        let stats = reel
            .handle
            .export(&mut sink, &mut reel.stills)
            .with_context(|| format!("export '{}'", out.display()))?;
        eprintln!("wrote {} ({} frames)", out.display(), stats.frames);
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut reel = run_request(&args.reel)?;
    let comp = reel.handle.composition().clone();
    let last = comp.frame_count().saturating_sub(1);
    let at = comp.frame_rate().secs_to_frames_floor(args.at.max(0.0));
    let idx = fadereel::FrameIndex(at.min(last));

    let frame = if args.fit {
        reel.handle.render_viewport_frame(idx, &mut reel.stills)?
    } else {
        reel.handle.render_frame(idx, &mut reel.stills)?
    };
    let img = frame
        .to_straight_image()
        .context("rendered frame does not match its size")?;

    if let Some(parent) = args.png.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    img.save_with_format(&args.png, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.png.display()))?;

    eprintln!("wrote {}", args.png.display());
    Ok(())
}

fn run_request(args: &ReelArgs) -> anyhow::Result<fadereel::GeneratedReel> {
    let mut cfg = match &args.config {
        Some(path) => fadereel::ReelConfig::from_path(path)?,
        None => fadereel::ReelConfig::default(),
    };
    if let Some(out) = &args.out {
        cfg.encoder.out_dir = out.clone();
    }
    if args.threads.is_some() {
        cfg.threads = args.threads;
    }
    if args.visible_span {
        cfg.compose.duration_policy = fadereel::DurationPolicy::VisibleSpan;
    }
    if let Some(text) = &args.text {
        cfg.overlay.get_or_insert_with(Default::default).text = text.clone();
    }
    if args.no_overlay {
        cfg.no_overlay = true;
    }

    let images = load_images(&args.images, &args.names)?;
    let generator = fadereel::ReelGenerator::new(cfg.into());
    generator.generate_reel(&images).context("generate reel")
}

fn load_images(dir: &Path, names: &[String]) -> anyhow::Result<Vec<fadereel::SourceImage>> {
    names
        .iter()
        .map(|name| {
            fadereel::SourceImage::load_named(dir, name)
                .with_context(|| format!("load image '{name}' from '{}'", dir.display()))
        })
        .collect()
}
