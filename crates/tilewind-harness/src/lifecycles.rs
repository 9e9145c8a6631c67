//! The four window/engine lifecycles.
//!
//! All of them build the same scene and differ only in who owns the engine
//! and who drives the frame loop:
//! - standard: the window creates and owns the engine, loop autostarts
//! - delayed: as standard, but the loop is started by hand after setup
//! - managed: the engine is created first and handed to the window by ref
//! - legacy: managed engine, caller-driven `process` / `draw_frame` loop

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};

use tilewind_engine::engine::{Engine, EngineAccess, EngineArgs, EngineRef, Tilengine};
use tilewind_engine::native::{Color, WindowFlags};
use tilewind_engine::resources::{Bitmap, Palette, Rect, Tilemap};
use tilewind_engine::time::FrameArgs;
use tilewind_engine::window::{LoopExit, Runtime, Window, WindowConfig};

use crate::screenshot;

const FOREGROUND: &str = "Sonic_md_fg1.tmx";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Standard,
    Delayed,
    Managed,
    Legacy,
}

impl Lifecycle {
    pub const ALL: [Lifecycle; 4] = [
        Lifecycle::Standard,
        Lifecycle::Delayed,
        Lifecycle::Managed,
        Lifecycle::Legacy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Lifecycle::Standard => "standard",
            Lifecycle::Delayed => "delayed",
            Lifecycle::Managed => "managed",
            Lifecycle::Legacy => "legacy",
        }
    }
}

/// Settings shared by every lifecycle run.
#[derive(Debug, Clone)]
pub struct Options {
    pub engine: EngineArgs,
    /// Capture the final frame to this png.
    pub screenshot: Option<PathBuf>,
}

/// What one lifecycle run did.
#[derive(Debug, Clone)]
pub struct Summary {
    pub lifecycle: Lifecycle,
    pub frames: u64,
    pub exit: Option<LoopExit>,
    pub screenshot: Option<PathBuf>,
}

pub fn run(tln: &Tilengine, lifecycle: Lifecycle, opts: &Options) -> Result<Summary> {
    log::info!("running {} lifecycle", lifecycle.name());
    let summary = match lifecycle {
        Lifecycle::Standard => run_windowed(tln, lifecycle, opts, true),
        Lifecycle::Delayed => run_windowed(tln, lifecycle, opts, false),
        Lifecycle::Managed => run_managed(tln, opts),
        Lifecycle::Legacy => run_legacy(tln, opts),
    }
    .with_context(|| format!("{} lifecycle failed", lifecycle.name()))?;

    if tln.has_live_engine() {
        bail!("{} lifecycle leaked its engine", lifecycle.name());
    }
    Ok(summary)
}

fn window_config(opts: &Options) -> WindowConfig {
    WindowConfig::default()
        .with_title("tilewind")
        .with_flags(WindowFlags::NOVSYNC | WindowFlags::S1)
        .with_engine(opts.engine.clone())
}

/// Window owns its engine; the loop autostarts or is started after setup.
fn run_windowed(tln: &Tilengine, lifecycle: Lifecycle, opts: &Options, autostart: bool) -> Result<Summary> {
    let mut rt = Runtime::new(tln.clone());
    let id = rt.open_window(window_config(opts).with_autostart(autostart))?;
    let window = rt.window_mut(id).context("window vanished after opening")?;

    let scene = window
        .with_engine(|engine| Scene::build(tln, engine))
        .context("window has no engine")??;
    scene.install(window);

    if !autostart {
        window.start()?;
    }

    let exit = rt.run().into_iter().find(|(w, _)| *w == id).map(|(_, exit)| exit);
    let window = rt.window_mut(id).context("window vanished during run")?;
    let frames = window.frame();
    let shot = match &opts.screenshot {
        Some(path) => window
            .with_engine_mut(|engine| capture(engine, path))
            .transpose()?,
        None => None,
    };

    rt.clear_windows();
    Ok(Summary {
        lifecycle,
        frames,
        exit,
        screenshot: shot,
    })
}

/// Engine created up front and reached by the window through a ref.
fn run_managed(tln: &Tilengine, opts: &Options) -> Result<Summary> {
    let engine = EngineRef::new(tln.create_engine(&opts.engine)?);
    let mut rt = Runtime::new(tln.clone());
    let id = rt.open_window(
        window_config(opts)
            .with_autostart(false)
            .without_engine(),
    )?;
    let window = rt.window_mut(id).context("window vanished after opening")?;
    window.set_managed_engine(engine.clone());

    let scene = engine
        .with(|e| Scene::build(tln, e))
        .context("managed engine is busy")??;
    scene.install(window);
    window.start()?;

    let exit = rt.run().into_iter().find(|(w, _)| *w == id).map(|(_, exit)| exit);
    let frames = rt.window(id).map_or(0, Window::frame);
    rt.clear_windows();

    let shot = finish_managed(engine, opts)?;
    Ok(Summary {
        lifecycle: Lifecycle::Managed,
        frames,
        exit,
        screenshot: shot,
    })
}

/// Managed engine with a caller-driven loop.
fn run_legacy(tln: &Tilengine, opts: &Options) -> Result<Summary> {
    let engine = EngineRef::new(tln.create_engine(&opts.engine)?);
    let mut rt = Runtime::new(tln.clone());
    let id = rt.open_window(
        window_config(opts)
            .with_autostart(false)
            .without_engine(),
    )?;
    let window = rt.window_mut(id).context("window vanished after opening")?;
    window.set_managed_engine(engine.clone());

    let scene = engine
        .with(|e| Scene::build(tln, e))
        .context("managed engine is busy")??;

    let mut frames = 0u64;
    while window.process() {
        scene.before_frame(frames);
        window.draw_frame(0)?;
        frames += 1;
    }
    rt.clear_windows();

    let shot = finish_managed(engine, opts)?;
    Ok(Summary {
        lifecycle: Lifecycle::Legacy,
        frames,
        exit: Some(LoopExit::Closed),
        screenshot: shot,
    })
}

fn finish_managed(engine: EngineRef, opts: &Options) -> Result<Option<PathBuf>> {
    let mut engine = engine.take().context("managed engine was taken")?;
    let shot = match &opts.screenshot {
        Some(path) => Some(capture(&mut engine, path)?),
        None => None,
    };
    engine.delete();
    Ok(shot)
}

fn capture(engine: &mut Engine, path: &Path) -> Result<PathBuf> {
    let (width, height) = engine.resolution();
    let pixels = engine.render_to_buffer(0);
    screenshot::save_argb(path, width as u32, height as u32, pixels)?;
    log::info!("saved {}", path.display());
    Ok(path.to_path_buf())
}

// ── scene ─────────────────────────────────────────────────────────────────

/// Demo content: a foreground tilemap and a paletted bitmap on layer 0.
struct Scene {
    foreground: Tilemap,
    canvas: Bitmap,
    box_x: Cell<i32>,
}

impl Scene {
    fn build(tln: &Tilengine, engine: &Engine) -> Result<Self> {
        let foreground = Tilemap::load(tln, FOREGROUND, None)
            .with_context(|| format!("failed to load {FOREGROUND}"))?;

        let canvas = Bitmap::new(tln, 256, 256, 8)?;
        canvas.set_palette(&Palette::new(tln, 16)?);

        let layer = engine.layer(0).context("engine has no layers")?;
        layer.set_bitmap(&canvas);
        if let Some(palette) = layer.bitmap().and_then(|b| b.palette()) {
            palette.set_color(1, Color::new(255, 0, 0));
        }
        layer.set_bitmap(&canvas);
        log::info!("scene ready, last error: {}", engine.last_error_message());

        foreground.update_tile(23, 0, |t| t.set_flip_y(true));

        Ok(Self {
            foreground,
            canvas,
            box_x: Cell::new(20),
        })
    }

    /// Moves a red box across the canvas.
    fn before_frame(&self, frame: u64) {
        let x = 20 + (frame % 200) as i32;
        self.box_x.set(x);
        self.canvas.clear(0);
        self.canvas.draw_rect(Rect::new(x, 20, 16, 16), 1, false);
        self.foreground.update_tile(23, 0, |t| t.set_flip_y(true));
    }

    fn install(self, window: &mut Window) {
        let scene = Rc::new(self);

        let before = scene.clone();
        window.before_frame(move |_, args: &FrameArgs| {
            before.before_frame(args.frame);
            Ok(())
        });

        window.after_frame(move |_, args| {
            if args.frame % 60 == 0 {
                log::debug!("frame {} box at x={}", args.frame, scene.box_x.get());
            }
            Ok(())
        });
    }
}
