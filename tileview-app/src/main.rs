use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::collections::VecDeque;
use std::path::PathBuf;
use tileview::runtime::{FrameClock, FrameLoop};
use tileview::{AnnotationStore, Frame, InputEvent, Size, Viewer, ViewerConfig, ViewerProfile};

#[derive(Parser)]
#[command(name = "tileview-app")]
#[command(version, about = "Replays an input session over a tile pyramid and writes the frames", long_about = None)]
struct Cli {
    /// Tile pyramid root (`<level>/<column>/<row>.<ext>`)
    #[arg(value_name = "TILES")]
    tiles: PathBuf,

    /// JSON configuration file; overrides the profile
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Built-in configuration preset
    #[arg(short, long, value_enum, default_value = "viewer")]
    profile: Profile,

    /// JSON array of per-frame event batches
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Annotations to start the session with
    #[arg(long, value_name = "FILE")]
    annotations: Option<PathBuf>,

    /// Where to write the session's annotations on exit
    #[arg(long, value_name = "FILE")]
    save_annotations: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(short, long, value_name = "N", default_value = "120")]
    frames: u64,

    #[arg(long, default_value = "800")]
    width: u32,

    #[arg(long, default_value = "600")]
    height: u32,

    /// Directory for PNG frames; nothing is written without it
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Write every Nth frame
    #[arg(long, value_name = "N", default_value = "1")]
    every: u64,

    /// Pace the loop at the configured frame rate instead of running flat out
    #[arg(long)]
    realtime: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Viewer,
    Dashboard,
}

/// Hands out one batch of scripted events per frame
struct ScriptedInput {
    batches: VecDeque<Vec<InputEvent>>,
}

impl ScriptedInput {
    fn load(path: Option<&PathBuf>) -> Result<Self> {
        let batches = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading script {}", path.display()))?;
                serde_json::from_str::<Vec<Vec<InputEvent>>>(&text)
                    .with_context(|| format!("parsing script {}", path.display()))?
            }
            None => Vec::new(),
        };
        Ok(Self {
            batches: batches.into(),
        })
    }
}

impl tileview::runtime::InputSource for ScriptedInput {
    fn poll(&mut self) -> Vec<InputEvent> {
        self.batches.pop_front().unwrap_or_default()
    }
}

/// Writes selected frames as numbered PNGs
struct PngSink {
    dir: Option<PathBuf>,
    every: u64,
    index: u64,
}

impl tileview::runtime::FrameSink for PngSink {
    fn present(&mut self, frame: &Frame) -> tileview::Result<()> {
        let index = self.index;
        self.index += 1;
        if index % self.every != 0 {
            return Ok(());
        }
        log::debug!(
            "frame {}: level {} zoom {:.3} {} {}",
            index,
            frame.active_level,
            frame.zoom,
            frame.readout(),
            frame.hud.altitude_label()
        );
        if let Some(dir) = &self.dir {
            frame.save(dir.join(format!("frame_{:05}.png", index)))?;
        }
        Ok(())
    }
}

fn load_config(cli: &Cli) -> Result<ViewerConfig> {
    let config = match &cli.config {
        Some(path) => ViewerConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => match cli.profile {
            Profile::Viewer => ViewerProfile::Viewer.resolve(),
            Profile::Dashboard => ViewerProfile::Dashboard.resolve(),
        },
    };
    Ok(config.with_tile_root(&cli.tiles))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.every == 0 {
        bail!("--every must be at least 1");
    }
    if !cli.tiles.is_dir() {
        bail!("tile root {} is not a directory", cli.tiles.display());
    }
    if let Some(dir) = &cli.out {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let config = load_config(&cli)?;
    let size = Size::new(cli.width as f64, cli.height as f64);
    let mut viewer = Viewer::create(config, size).context("creating viewer")?;
    if let Some(path) = &cli.annotations {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        viewer = viewer.with_annotations(AnnotationStore::from_json(&text)?);
    }

    let mut input = ScriptedInput::load(cli.script.as_ref())?;
    let mut sink = PngSink {
        dir: cli.out.clone(),
        every: cli.every,
        index: 0,
    };

    let mut frame_loop = FrameLoop::new(viewer).with_max_frames(cli.frames);
    if !cli.realtime {
        frame_loop = frame_loop.with_clock(FrameClock::unlimited());
    }
    let annotations = frame_loop.run(&mut input, &mut sink)?;

    log::info!("session finished with {} annotations", annotations.len());
    if let Some(path) = &cli.save_annotations {
        std::fs::write(path, annotations.to_json()?).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
