use crate::config::load_config;
use crate::graph_view::GraphView;
use crate::layout_dump::write_layout_dump;
use crate::render::{SvgCanvas, write_output_svg};
use crate::replay::{GestureScript, replay};
use crate::store::ProjectStore;
use crate::theme::Theme;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storygraph", version, about = "Render and rearrange story cause graphs")]
pub struct Args {
    /// Project file (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Project id. Defaults to the first project in the file.
    #[arg(short = 'p', long = "project")]
    pub project: Option<String>,

    /// Gesture script to replay before rendering
    #[arg(short = 'g', long = "gestures")]
    pub gestures: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, layout, view, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Surface width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Surface height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Measure text with the built-in approximation instead of system fonts
    #[arg(long = "fastText")]
    pub fast_text: bool,

    /// Write computed layouts and the final view transform as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Write the project file, with committed node positions, to this path
    #[arg(long = "save")]
    pub save: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if args.fast_text {
        config.render.fast_text_metrics = true;
    }

    let (input, origin) = read_input(args.input.as_deref())?;
    let mut store = ProjectStore::parse(&input, &origin)?;
    let project_id = store.resolve_project_id(args.project.as_deref())?;

    let render_cfg = config.render.clone();
    let font_family = config.theme.title_font.family.clone();
    let background = config
        .theme
        .background
        .clone()
        .or_else(|| Theme::export().background);

    let mut view = GraphView::new(project_id, config);
    view.load_from(&store);

    if let Some(path) = args.gestures.as_deref() {
        let script = GestureScript::load(path)?;
        let summary = replay(&mut view, &script, &mut store);
        tracing::info!(
            events = summary.events,
            redraws = summary.redraws,
            "replayed {}",
            path.display()
        );
    }

    let mut canvas = SvgCanvas::new(render_cfg.width, render_cfg.height).with_background(background);
    view.paint(&mut canvas);
    let svg = canvas.finish();

    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &render_cfg, &font_family)?;
        }
    }

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &view)
            .with_context(|| format!("failed to write layout dump {}", path.display()))?;
    }

    if let Some(path) = args.save.as_deref() {
        store.save(path)?;
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // a second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<(String, PathBuf)> {
    if let Some(path) = path {
        if path != Path::new("-") {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            return Ok((content, path.to_path_buf()));
        }
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, PathBuf::from("<stdin>")))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(feature = "png")]
fn write_png(
    svg: &str,
    output: &Path,
    render_cfg: &crate::config::RenderConfig,
    font_family: &str,
) -> Result<()> {
    crate::render::write_output_png(svg, output, render_cfg, font_family)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
fn write_png(
    _svg: &str,
    _output: &Path,
    _render_cfg: &crate::config::RenderConfig,
    _font_family: &str,
) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}
