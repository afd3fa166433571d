use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use unmark::{
    EditorConfig, EditorSession, MaskResolution, Outcome, Point, ProcessingClient, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "unmark", version)]
struct Cli {
    /// Editor configuration JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the binary mask for a set of strokes as a PNG.
    Mask(MaskArgs),
    /// Render the editing view (image plus highlighted strokes) as a PNG.
    Preview(PreviewArgs),
    /// Submit the image and its mask to the backend and save the result.
    Process(ProcessArgs),
    /// Ping the backend root endpoint.
    Health(HealthArgs),
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Input image (PNG, JPEG, WebP, ...).
    #[arg(long)]
    image: PathBuf,

    /// One stroke as display-space points: "x,y x,y ...". Repeat for more strokes.
    #[arg(long = "stroke")]
    strokes: Vec<String>,

    /// Brush width in display pixels.
    #[arg(long)]
    brush: Option<f64>,

    /// Editing viewport size.
    #[arg(long, default_value = "1280x800")]
    viewport: String,
}

#[derive(Args, Debug)]
struct MaskArgs {
    #[command(flatten)]
    edit: EditArgs,

    /// Rasterize at the image's natural size instead of the display size.
    #[arg(long, default_value_t = false)]
    natural: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    edit: EditArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    #[command(flatten)]
    edit: EditArgs,

    /// Backend base URL (overrides config and environment).
    #[arg(long)]
    api_url: Option<String>,

    /// Directory the processed image is saved into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct HealthArgs {
    /// Backend base URL (overrides config and environment).
    #[arg(long)]
    api_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Mask(args) => cmd_mask(config, args),
        Command::Preview(args) => cmd_preview(config, args),
        Command::Process(args) => cmd_process(config, args),
        Command::Health(args) => cmd_health(config, args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EditorConfig> {
    let config = match path {
        Some(p) => EditorConfig::from_path(p)?,
        None => EditorConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn cmd_mask(mut config: EditorConfig, args: MaskArgs) -> anyhow::Result<()> {
    if args.natural {
        config.mask_resolution = MaskResolution::Natural;
    }
    let sess = open_session(config, &args.edit)?;
    let surface = sess.surface().context("no image loaded")?;
    let mask = unmark::extract_mask(surface)?;
    write_file(&args.out, &mask.png)?;
    eprintln!("wrote {} ({}x{})", args.out.display(), mask.width, mask.height);
    Ok(())
}

fn cmd_preview(config: EditorConfig, args: PreviewArgs) -> anyhow::Result<()> {
    let mut sess = open_session(config, &args.edit)?;
    let frame = sess.render_preview()?;
    write_file(&args.out, &frame.encode_png()?)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_process(mut config: EditorConfig, args: ProcessArgs) -> anyhow::Result<()> {
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    let client = ProcessingClient::new(&config)?;
    let sess = RefCell::new(open_session(config, &args.edit)?);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    tracing::info!(url = client.process_url(), "submitting");
    match rt.block_on(unmark::process(&sess, &client))? {
        Outcome::Applied(handle) => {
            let sess = sess.borrow();
            if let Some(path) = sess.presenter().save_to(&args.out_dir)? {
                eprintln!("wrote {} ({}x{})", path.display(), handle.width, handle.height);
            }
            Ok(())
        }
        Outcome::Discarded => anyhow::bail!("result was discarded"),
    }
}

fn cmd_health(mut config: EditorConfig, args: HealthArgs) -> anyhow::Result<()> {
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    let client = ProcessingClient::new(&config)?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    let message = rt.block_on(client.health())?;
    println!("{message}");
    Ok(())
}

fn open_session(config: EditorConfig, args: &EditArgs) -> anyhow::Result<EditorSession> {
    let viewport = Viewport::parse(&args.viewport)?;
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("read image '{}'", args.image.display()))?;
    let file_name = args
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());

    let mut sess = EditorSession::new(config, viewport)?;
    let geometry = sess.load_image(bytes, file_name)?;
    tracing::info!(
        width = geometry.display_width,
        height = geometry.display_height,
        scale = geometry.scale_factor,
        "image loaded"
    );
    if let Some(width) = args.brush {
        sess.set_brush_width(width)?;
    }
    for raw in &args.strokes {
        let points = parse_stroke(raw)?;
        let Some((first, rest)) = points.split_first() else {
            continue;
        };
        sess.pointer_down(*first)?;
        for p in rest {
            sess.pointer_move(*p)?;
        }
        sess.pointer_up()?;
    }
    Ok(sess)
}

fn parse_stroke(raw: &str) -> anyhow::Result<Vec<Point>> {
    raw.split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .with_context(|| format!("stroke point '{pair}' is not 'x,y'"))?;
            let x: f64 = x
                .trim()
                .parse()
                .with_context(|| format!("stroke point '{pair}': bad x"))?;
            let y: f64 = y
                .trim()
                .parse()
                .with_context(|| format!("stroke point '{pair}': bad y"))?;
            Ok(Point::new(x, y))
        })
        .collect()
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}
