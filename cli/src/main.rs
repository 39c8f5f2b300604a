use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sigstudio::drag::{DragController, Point};
use sigstudio::imaging::animation::{AnimationEffect, AnimationError, AnimationSpec, generate_frames};
use sigstudio::imaging::crop::{AspectRatio, CropError, CropSettings, CropShape, crop};
use sigstudio::imaging::export::{ExportError, encode_gif, encode_png, load_image};
use sigstudio::model::{ElementId, ModelError, SignatureDesign};
use sigstudio_cli::{ApiClient, ClientError, IconUploader, TemplateClient};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid design JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Crop(#[from] CropError),
    #[error(transparent)]
    Animation(#[from] AnimationError),
    #[error(transparent)]
    Design(#[from] ModelError),
    #[error("pointer-down was ignored; is --from finite?")]
    NoDrag,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::Io { path: path.to_path_buf(), source }
}

#[derive(Parser, Debug)]
#[command(name = "sigstudio", about = "Email-signature studio CLI")]
struct Cli {
    #[arg(long, env = "SIGSTUDIO_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Log at debug level on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the server is up.
    Ping,
    /// List templates known to the server.
    Templates,
    /// Render a design on the server.
    Render(RenderArgs),
    /// Crop an image locally.
    Crop(CropArgs),
    /// Generate animation frames locally.
    Animate(AnimateArgs),
    /// Upload contact icons; repeated files are served from the cache.
    UploadIcon(UploadIconArgs),
    /// Move or scale an element of a design with a pointer gesture.
    Drag(DragArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    design: PathBuf,
    /// Write HTML here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Print the plain-text alternative instead of HTML.
    #[arg(long, default_value_t = false)]
    text: bool,
}

#[derive(Args, Debug)]
struct CropArgs {
    image: PathBuf,
    #[arg(long, value_parser = parse_aspect, default_value = "square")]
    aspect: AspectRatio,
    /// Zoom in percent.
    #[arg(long, default_value_t = 100.0)]
    scale: f32,
    /// Rotation in degrees.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    rotate: f32,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    offset_x: f32,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    offset_y: f32,
    #[arg(long, default_value_t = 400)]
    width: u32,
    /// Mask the output to an inscribed circle.
    #[arg(long, default_value_t = false)]
    circle: bool,
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct AnimateArgs {
    image: PathBuf,
    #[arg(long, default_value_t = sigstudio::imaging::animation::DEFAULT_FRAMES)]
    frames: u32,
    #[arg(long, value_parser = parse_effect, default_value = "fade-zoom")]
    effect: AnimationEffect,
    #[arg(long, default_value_t = sigstudio::imaging::animation::DEFAULT_START_SCALE)]
    start_scale: f32,
    #[arg(long, default_value_t = sigstudio::imaging::animation::DEFAULT_FRAME_DELAY_MS)]
    delay_ms: u32,
    #[arg(long)]
    out_dir: PathBuf,
    /// Also write a looping `signature.gif`.
    #[arg(long, default_value_t = false)]
    gif: bool,
}

#[derive(Args, Debug)]
struct UploadIconArgs {
    /// Icon files; the file name is the cache key.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct DragArgs {
    design: PathBuf,
    #[arg(long, value_parser = parse_element)]
    element: ElementId,
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    from: Point,
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    to: Point,
    /// Set the element scale after the move.
    #[arg(long)]
    scale: Option<f64>,
    /// Write here instead of overwriting the input.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let client = ApiClient::new(&cli.base_url);

    match cli.command {
        Command::Ping => {
            client.ping().await?;
            println!("ok");
            Ok(())
        }
        Command::Templates => run_templates(client).await,
        Command::Render(args) => run_render(&client, args).await,
        Command::Crop(args) => run_crop(&args),
        Command::Animate(args) => run_animate(&args),
        Command::UploadIcon(args) => run_upload_icons(client, args).await,
        Command::Drag(args) => run_drag(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

async fn run_templates(client: ApiClient) -> Result<(), CliError> {
    for template in TemplateClient::new(client).list().await? {
        let animated = if template.supports_animation { "animated" } else { "static" };
        println!("{}\t{}\t{animated}\t{}", template.id.as_str(), template.name, template.description);
    }
    Ok(())
}

async fn run_render(client: &ApiClient, args: RenderArgs) -> Result<(), CliError> {
    let design = read_design(&args.design)?;
    let rendered = client.render(&design).await?;
    let output = if args.text { rendered.text } else { rendered.html };
    match args.out {
        Some(path) => std::fs::write(&path, output).map_err(io_err(&path))?,
        None => println!("{output}"),
    }
    Ok(())
}

fn run_crop(args: &CropArgs) -> Result<(), CliError> {
    let bytes = std::fs::read(&args.image).map_err(io_err(&args.image))?;
    let source = load_image(&bytes)?;
    let settings = CropSettings {
        scale: args.scale,
        rotation: args.rotate,
        offset_x: args.offset_x,
        offset_y: args.offset_y,
        aspect: args.aspect,
        shape: if args.circle { CropShape::Circle } else { CropShape::Rectangle },
    };
    let cropped = crop(&source, &settings, args.width)?;
    std::fs::write(&args.out, encode_png(&cropped)?).map_err(io_err(&args.out))?;
    println!("{} {}x{}", args.out.display(), cropped.width(), cropped.height());
    Ok(())
}

fn run_animate(args: &AnimateArgs) -> Result<(), CliError> {
    let bytes = std::fs::read(&args.image).map_err(io_err(&args.image))?;
    let source = load_image(&bytes)?.to_rgba8();
    let spec = AnimationSpec {
        frame_count: args.frames,
        effect: args.effect,
        start_scale: args.start_scale,
        frame_delay_ms: args.delay_ms,
        background: None,
    };
    let frames = generate_frames(&source, &spec)?;

    std::fs::create_dir_all(&args.out_dir).map_err(io_err(&args.out_dir))?;
    for frame in &frames {
        let path = args.out_dir.join(&frame.file_name);
        std::fs::write(&path, encode_png(&frame.image)?).map_err(io_err(&path))?;
        println!("{}", path.display());
    }
    if args.gif {
        let path = args.out_dir.join("signature.gif");
        let gif = encode_gif(frames.iter().map(|f| &f.image), spec.frame_delay_ms)?;
        std::fs::write(&path, gif).map_err(io_err(&path))?;
        println!("{}", path.display());
    }
    Ok(())
}

async fn run_upload_icons(client: ApiClient, args: UploadIconArgs) -> Result<(), CliError> {
    let mut uploader = IconUploader::new(client);
    for path in &args.files {
        let bytes = std::fs::read(path).map_err(io_err(path))?;
        let key = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let icon = uploader
            .upload_icon(&key, &bytes, content_type_for(path))
            .await;
        let kind = if icon.is_remote() { "remote" } else { "inline" };
        println!("{key}\t{kind}\t{}", icon.as_str());
    }
    Ok(())
}

fn run_drag(args: &DragArgs) -> Result<(), CliError> {
    let mut design = read_design(&args.design)?;

    let mut controller = DragController::new(design.layout);
    controller.pointer_down(args.element, args.from);
    controller.pointer_move(args.to);
    let (element, mut position) = controller.pointer_up().ok_or(CliError::NoDrag)?;
    if let Some(scale) = args.scale {
        position = controller.set_scale(element, scale);
    }
    design.layout = controller.layout();
    design.validate()?;

    let out = args.out.as_ref().unwrap_or(&args.design);
    let json = serde_json::to_string_pretty(&design)?;
    std::fs::write(out, json).map_err(io_err(out))?;
    println!("{} x={} y={} scale={}", element.as_str(), position.x, position.y, position.scale);
    Ok(())
}

fn read_design(path: &Path) -> Result<SignatureDesign, CliError> {
    let raw = std::fs::read_to_string(path).map_err(io_err(path))?;
    Ok(serde_json::from_str(&raw)?)
}

/// MIME type from the file extension. Unknown types are left for the server
/// to reject, which sends the icon down the inline fallback.
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn parse_aspect(raw: &str) -> Result<AspectRatio, String> {
    AspectRatio::parse(raw).ok_or_else(|| format!("unknown aspect `{raw}` (square, landscape, portrait, or W:H)"))
}

fn parse_effect(raw: &str) -> Result<AnimationEffect, String> {
    AnimationEffect::parse(raw).ok_or_else(|| format!("unknown effect `{raw}` (fade, zoom, fade-zoom)"))
}

fn parse_element(raw: &str) -> Result<ElementId, String> {
    ElementId::parse(raw).ok_or_else(|| format!("unknown element `{raw}` (headshot, logo)"))
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{raw}`"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x `{x}`: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y `{y}`: {e}"))?;
    Ok(Point::new(x, y))
}
