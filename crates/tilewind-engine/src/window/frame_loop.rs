use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::engine::{Engine, EngineAccess, EngineRef, Tilengine};
use crate::error::WindowError;
use crate::native::{Crt, CrtEffect, ErrorCode, Input, Native, Player};
use crate::time::{FrameArgs, FrameClock};

use super::{CancelToken, DrawFailurePolicy, EngineSlot, WindowConfig};

/// Per-frame user callback.
///
/// Errors are logged and do not stop the loop or the remaining hooks.
pub type FrameHook = Box<dyn FnMut(&mut Window, &FrameArgs) -> anyhow::Result<()>>;

/// Runtime-assigned window identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub(crate) u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Outcome of one [`Window::tick`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tick {
    /// The loop is not running; nothing happened.
    Idle,
    /// A frame was processed and the loop keeps going.
    Continue,
    /// The loop observed a stop request and ended.
    Stopped,
    /// The native window was closed and the loop ended.
    Closed,
}

/// Why the most recent loop run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    Closed,
    /// The loop died; the message is the error's display text.
    Failed(String),
}

/// A native output window with a cooperative frame loop.
///
/// The loop advances one iteration per [`tick`](Self::tick). Each iteration
/// switches to the window's engine context, runs the `before_frame` hooks,
/// draws, runs the `after_frame` hooks and pumps native events (non-threaded
/// windows only).
///
/// Windows are opened through [`crate::window::Runtime::open_window`].
pub struct Window {
    id: WindowId,
    native: Rc<dyn Native>,
    engine: EngineSlot,
    threaded: bool,

    running: bool,
    deleted: bool,
    token: Option<CancelToken>,

    before: Vec<FrameHook>,
    after: Vec<FrameHook>,

    clock: FrameClock,
    policy: DrawFailurePolicy,
    failures: u32,
    last_exit: Option<LoopExit>,
}

impl Window {
    pub(crate) fn open(tln: &Tilengine, id: WindowId, config: WindowConfig) -> Result<Self, WindowError> {
        let engine = match &config.engine {
            Some(args) => EngineSlot::Owned(tln.create_engine(args)?),
            None => EngineSlot::Unset,
        };

        let native = tln.backend().clone();
        let overlay = config.overlay.as_deref();
        let created = if config.threaded {
            native.create_window_thread(overlay, config.flags)
        } else {
            native.create_window(overlay, config.flags)
        };
        if !created {
            return Err(WindowError::CreateFailed(native.last_error()));
        }

        let mut window = Self {
            id,
            native,
            engine,
            threaded: config.threaded,
            running: false,
            deleted: false,
            token: None,
            before: Vec::new(),
            after: Vec::new(),
            clock: FrameClock::new(),
            policy: config.failure_policy,
            failures: 0,
            last_exit: None,
        };

        if let Some(title) = &config.title {
            window.set_title(title);
        }
        log::debug!(
            "{id} opened ({}, {})",
            if window.threaded { "threaded" } else { "pumped" },
            if window.engine.is_owned() { "owned engine" } else { "no engine yet" }
        );

        if config.autostart {
            window.start()?;
        }
        Ok(window)
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_threaded(&self) -> bool {
        self.threaded
    }

    /// Loop iterations begun since the last [`start`](Self::start).
    pub fn frame(&self) -> u64 {
        self.clock.frames()
    }

    pub fn last_exit(&self) -> Option<&LoopExit> {
        self.last_exit.as_ref()
    }

    pub fn failure_policy(&self) -> DrawFailurePolicy {
        self.policy
    }

    pub fn set_failure_policy(&mut self, policy: DrawFailurePolicy) {
        self.policy = policy;
    }

    // ── engine ────────────────────────────────────────────────────────────

    pub fn engine(&self) -> &EngineSlot {
        &self.engine
    }

    /// Points the window at a caller-managed engine, dropping any owned one.
    pub fn set_managed_engine(&mut self, engine: EngineRef) {
        if self.engine.is_owned() {
            log::debug!("{}: dropping owned engine for a managed one", self.id);
        }
        self.engine = EngineSlot::Managed(engine);
    }

    /// Hands the window ownership of `engine`, replacing whatever it had.
    pub fn attach_engine(&mut self, engine: Engine) {
        self.engine = EngineSlot::Owned(engine);
    }

    /// Removes the window's engine; the loop fails with `NoEngine` until a
    /// new one is provided.
    pub fn detach_engine(&mut self) -> EngineSlot {
        mem::take(&mut self.engine)
    }

    // ── hooks ─────────────────────────────────────────────────────────────

    /// Registers a hook run before each draw.
    pub fn before_frame(
        &mut self,
        hook: impl FnMut(&mut Window, &FrameArgs) -> anyhow::Result<()> + 'static,
    ) {
        self.before.push(Box::new(hook));
    }

    /// Registers a hook run after each successful draw.
    pub fn after_frame(
        &mut self,
        hook: impl FnMut(&mut Window, &FrameArgs) -> anyhow::Result<()> + 'static,
    ) {
        self.after.push(Box::new(hook));
    }

    // ── loop control ──────────────────────────────────────────────────────

    /// Arms the loop; the next [`tick`](Self::tick) runs a frame.
    ///
    /// No-op while running. A start after the loop ended is a clean restart:
    /// fresh stop token, frame clock and failure count.
    pub fn start(&mut self) -> Result<(), WindowError> {
        if self.deleted {
            return Err(WindowError::Deleted);
        }
        if self.running {
            return Ok(());
        }
        self.token = Some(CancelToken::new());
        self.clock.reset();
        self.failures = 0;
        self.last_exit = None;
        self.running = true;
        log::debug!("{}: loop started", self.id);
        Ok(())
    }

    /// Requests the loop to stop; it ends at its next check point.
    pub fn stop(&self) {
        if let Some(token) = &self.token {
            token.cancel();
        }
    }

    /// Token that stops the current loop run from anywhere.
    ///
    /// `None` before the first [`start`](Self::start).
    pub fn stop_handle(&self) -> Option<CancelToken> {
        self.token.clone()
    }

    /// Runs one loop iteration.
    ///
    /// Errors end the loop; they are also recorded as
    /// [`LoopExit::Failed`].
    pub fn tick(&mut self) -> Result<Tick, WindowError> {
        if !self.running {
            return Ok(Tick::Idle);
        }
        match self.step() {
            Ok(tick) => Ok(tick),
            Err(e) => {
                self.running = false;
                self.last_exit = Some(LoopExit::Failed(e.to_string()));
                log::error!("{}: loop failed: {e}", self.id);
                Err(e)
            }
        }
    }

    fn step(&mut self) -> Result<Tick, WindowError> {
        if self.cancelled() {
            return Ok(self.finish(LoopExit::Stopped));
        }
        if !self.native.is_window_active() {
            return Ok(self.finish(LoopExit::Closed));
        }

        self.switch_context()?;

        let frame = self.clock.begin_frame();
        let args = self.clock.collect(frame);
        self.run_hooks(|w| &mut w.before, &args, "before_frame");
        if self.deleted {
            return Ok(self.finish(LoopExit::Stopped));
        }
        // Hooks may have detached or replaced the engine.
        self.switch_context()?;

        match self.draw() {
            Ok(()) => {
                self.failures = 0;
                let args = self.clock.collect(frame);
                self.run_hooks(|w| &mut w.after, &args, "after_frame");
                if self.deleted {
                    return Ok(self.finish(LoopExit::Stopped));
                }
            }
            Err(code) => {
                self.failures += 1;
                if self.failures >= self.policy.max_consecutive_failures {
                    return Err(WindowError::DrawFailed {
                        consecutive: self.failures,
                        code,
                    });
                }
                log::warn!(
                    "{}: draw failed ({code}), {}/{} before the loop gives up",
                    self.id,
                    self.failures,
                    self.policy.max_consecutive_failures
                );
            }
        }

        if self.threaded {
            self.native.wait_redraw();
        } else {
            self.native.process_window();
        }

        if self.cancelled() {
            return Ok(self.finish(LoopExit::Stopped));
        }
        Ok(Tick::Continue)
    }

    fn cancelled(&self) -> bool {
        self.token.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn finish(&mut self, exit: LoopExit) -> Tick {
        let tick = match exit {
            LoopExit::Closed => Tick::Closed,
            _ => Tick::Stopped,
        };
        self.running = false;
        log::debug!("{}: loop ended ({exit:?}) after {} frame(s)", self.id, self.clock.frames());
        self.last_exit = Some(exit);
        tick
    }

    /// Makes the window's engine context current.
    fn switch_context(&self) -> Result<(), WindowError> {
        let context = self
            .engine
            .with_engine(Engine::context)
            .ok_or(WindowError::NoEngine)?;
        if !self.native.set_context(context) {
            return Err(WindowError::ContextSwitch(self.native.last_error()));
        }
        Ok(())
    }

    fn draw(&self) -> Result<(), ErrorCode> {
        self.native.set_last_error(ErrorCode::Ok);
        self.native.draw_frame(0);
        match self.native.last_error() {
            ErrorCode::Ok => Ok(()),
            code => Err(code),
        }
    }

    /// Runs one hook list in order.
    ///
    /// The list is taken out while it runs so hooks can borrow the window;
    /// hooks registered meanwhile are appended after it.
    fn run_hooks(
        &mut self,
        list: fn(&mut Window) -> &mut Vec<FrameHook>,
        args: &FrameArgs,
        phase: &str,
    ) {
        let mut hooks = mem::take(list(self));
        for hook in hooks.iter_mut() {
            if let Err(e) = hook(self, args) {
                log::warn!("{}: {phase} hook failed: {e:#}", self.id);
            }
        }
        let added = mem::replace(list(self), hooks);
        list(self).extend(added);
    }

    // ── legacy synchronous mode ───────────────────────────────────────────

    /// Pumps native events once; `false` when the window should close.
    pub fn process(&mut self) -> bool {
        !self.deleted && self.native.process_window()
    }

    /// Draws one frame outside the loop (`0` auto-increments).
    pub fn draw_frame(&mut self, frame: i32) -> Result<(), WindowError> {
        if self.deleted {
            return Err(WindowError::Deleted);
        }
        self.switch_context()?;
        self.native.set_last_error(ErrorCode::Ok);
        self.native.draw_frame(frame);
        match self.native.last_error() {
            ErrorCode::Ok => Ok(()),
            code => Err(WindowError::DrawFailed { consecutive: 1, code }),
        }
    }

    // ── teardown ──────────────────────────────────────────────────────────

    /// Destroys the native window and ends the loop. Idempotent.
    pub fn delete(&mut self) {
        if self.deleted {
            return;
        }
        self.stop();
        self.deleted = true;
        if self.running {
            self.running = false;
            self.last_exit = Some(LoopExit::Stopped);
        }
        self.native.delete_window();
        log::debug!("{} deleted", self.id);
    }

    pub(crate) fn discard_token(&mut self) {
        self.token = None;
    }

    // ── native passthroughs ───────────────────────────────────────────────

    pub fn set_title(&self, title: &str) {
        self.native.set_window_title(title);
    }

    pub fn is_active(&self) -> bool {
        !self.deleted && self.native.is_window_active()
    }

    pub fn input(&self, player: Player, input: Input) -> bool {
        self.native.input(player, input)
    }

    pub fn enable_input(&self, player: Player, enable: bool) {
        self.native.enable_input(player, enable);
    }

    pub fn assign_input_joystick(&self, player: Player, index: i32) {
        self.native.assign_input_joystick(player, index);
    }

    pub fn define_input_key(&self, player: Player, input: Input, keycode: u32) {
        self.native.define_input_key(player, input, keycode);
    }

    pub fn define_input_button(&self, player: Player, input: Input, button: u8) {
        self.native.define_input_button(player, input, button);
    }

    pub fn wait_redraw(&self) {
        self.native.wait_redraw();
    }

    pub fn config_crt(&self, kind: Crt, blur: bool) {
        self.native.config_crt_effect(kind, blur);
    }

    pub fn disable_crt(&self) {
        self.native.disable_crt_effect();
    }

    /// CRT emulation with every parameter given explicitly.
    pub fn enable_crt(&self, effect: &CrtEffect) {
        self.native.enable_crt_effect(effect);
    }

    pub fn enable_blur(&self, enable: bool) {
        self.native.enable_blur(enable);
    }

    pub fn delay(&self, msecs: u32) {
        self.native.delay(msecs);
    }

    /// Milliseconds since the native library started.
    pub fn ticks(&self) -> u32 {
        self.native.ticks()
    }

    pub fn average_fps(&self) -> u32 {
        self.native.average_fps()
    }

    pub fn width(&self) -> i32 {
        self.native.window_width()
    }

    pub fn height(&self) -> i32 {
        self.native.window_height()
    }

    pub fn scale_factor(&self) -> i32 {
        self.native.window_scale_factor()
    }

    pub fn set_scale_factor(&self, factor: i32) {
        self.native.set_window_scale_factor(factor);
    }
}

impl EngineAccess for Window {
    fn with_engine<R>(&self, f: impl FnOnce(&Engine) -> R) -> Option<R> {
        self.engine.with_engine(f)
    }

    fn with_engine_mut<R>(&mut self, f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
        self.engine.with_engine_mut(f)
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.delete();
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("engine", &self.engine)
            .field("threaded", &self.threaded)
            .field("running", &self.running)
            .field("deleted", &self.deleted)
            .field("frame", &self.clock.frames())
            .field("before_hooks", &self.before.len())
            .field("after_hooks", &self.after.len())
            .field("last_exit", &self.last_exit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::engine::EngineArgs;
    use crate::native::{Headless, HeadlessConfig};

    fn open(config: WindowConfig) -> (Rc<Headless>, Tilengine, Window) {
        open_with(HeadlessConfig::default(), config)
    }

    fn open_with(headless: HeadlessConfig, config: WindowConfig) -> (Rc<Headless>, Tilengine, Window) {
        let backend = Rc::new(Headless::new(headless));
        let tln = Tilengine::from_backend(backend.clone());
        let window = Window::open(&tln, WindowId(1), config).unwrap();
        (backend, tln, window)
    }

    #[test]
    fn idle_until_started() {
        let (backend, _tln, mut w) = open(WindowConfig::default().with_autostart(false));
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        w.before_frame(move |_, _| {
            seen.set(seen.get() + 1);
            Ok(())
        });

        assert_eq!(w.tick().unwrap(), Tick::Idle);
        assert_eq!(calls.get(), 0);
        assert_eq!(backend.stats().draw_calls, 0);

        w.start().unwrap();
        assert_eq!(w.tick().unwrap(), Tick::Continue);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn hooks_run_in_order_around_draw() {
        let (backend, _tln, mut w) = open(WindowConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));

        for (tag, after) in [("b1", false), ("b2", false), ("a1", true)] {
            let log = log.clone();
            let b = backend.clone();
            let hook = move |_: &mut Window, _: &FrameArgs| {
                log.borrow_mut().push((tag, b.stats().draw_calls));
                Ok(())
            };
            if after {
                w.after_frame(hook);
            } else {
                w.before_frame(hook);
            }
        }

        w.tick().unwrap();
        assert_eq!(*log.borrow(), [("b1", 0), ("b2", 0), ("a1", 1)]);
    }

    #[test]
    fn failing_hook_is_isolated() {
        let (_backend, _tln, mut w) = open(WindowConfig::default());
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        w.before_frame(|_, _| anyhow::bail!("broken"));
        w.before_frame(move |_, _| {
            flag.set(true);
            Ok(())
        });

        assert_eq!(w.tick().unwrap(), Tick::Continue);
        assert!(ran.get());
        assert!(w.is_running());
    }

    #[test]
    fn hook_added_during_round_runs_next_round() {
        let (_backend, _tln, mut w) = open(WindowConfig::default());
        let count = Rc::new(Cell::new(0));
        let registered = Rc::new(Cell::new(false));

        let (c, r) = (count.clone(), registered.clone());
        w.before_frame(move |win, _| {
            if !r.replace(true) {
                let c = c.clone();
                win.before_frame(move |_, _| {
                    c.set(c.get() + 1);
                    Ok(())
                });
            }
            Ok(())
        });

        w.tick().unwrap();
        assert_eq!(count.get(), 0);
        w.tick().unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn stop_in_before_hook_completes_the_iteration() {
        let (backend, _tln, mut w) = open(WindowConfig::default());
        let after = Rc::new(Cell::new(0));
        let a = after.clone();
        w.before_frame(|win, _| {
            win.stop();
            Ok(())
        });
        w.after_frame(move |_, _| {
            a.set(a.get() + 1);
            Ok(())
        });

        assert_eq!(w.tick().unwrap(), Tick::Stopped);
        assert_eq!(after.get(), 1);
        assert_eq!(backend.stats().frames_drawn, 1);
        assert_eq!(w.last_exit(), Some(&LoopExit::Stopped));
        assert_eq!(w.tick().unwrap(), Tick::Idle);
    }

    #[test]
    fn stop_before_tick_draws_nothing() {
        let (backend, _tln, mut w) = open(WindowConfig::default());
        w.stop();
        assert_eq!(w.tick().unwrap(), Tick::Stopped);
        assert_eq!(backend.stats().draw_calls, 0);
    }

    #[test]
    fn pumps_only_when_not_threaded() {
        let (backend, _tln, mut w) = open(WindowConfig::default());
        for _ in 0..4 {
            w.tick().unwrap();
        }
        assert_eq!(backend.stats().process_calls, 4);
        assert_eq!(backend.stats().wait_redraw_calls, 0);

        let (backend, _tln, mut w) = open(WindowConfig::default().with_threaded(true));
        for _ in 0..4 {
            w.tick().unwrap();
        }
        assert!(w.is_threaded());
        assert_eq!(backend.stats().process_calls, 0);
        assert_eq!(backend.stats().wait_redraw_calls, 4);
    }

    #[test]
    fn no_engine_fails_before_drawing() {
        let (backend, _tln, mut w) = open(WindowConfig::managed());
        assert!(matches!(w.tick(), Err(WindowError::NoEngine)));
        assert_eq!(backend.stats().draw_calls, 0);
        assert!(!w.is_running());
        assert!(matches!(w.last_exit(), Some(LoopExit::Failed(_))));
    }

    #[test]
    fn draw_failures_below_threshold_skip_after_hooks() {
        let headless = HeadlessConfig {
            failing_draws: vec![1, 2],
            ..HeadlessConfig::default()
        };
        let (_backend, _tln, mut w) = open_with(headless, WindowConfig::default());
        let after = Rc::new(Cell::new(0));
        let a = after.clone();
        w.after_frame(move |_, _| {
            a.set(a.get() + 1);
            Ok(())
        });

        assert_eq!(w.tick().unwrap(), Tick::Continue);
        assert_eq!(w.tick().unwrap(), Tick::Continue);
        assert_eq!(after.get(), 0);
        assert_eq!(w.tick().unwrap(), Tick::Continue);
        assert_eq!(after.get(), 1);
    }

    #[test]
    fn draw_failures_at_threshold_end_the_loop() {
        let headless = HeadlessConfig {
            failing_draws: vec![1, 2],
            draw_error: ErrorCode::OutOfMemory,
            ..HeadlessConfig::default()
        };
        let config = WindowConfig::default().with_failure_policy(DrawFailurePolicy::tolerate(2));
        let (_backend, _tln, mut w) = open_with(headless, config);

        assert_eq!(w.tick().unwrap(), Tick::Continue);
        let err = w.tick().unwrap_err();
        assert!(matches!(
            err,
            WindowError::DrawFailed {
                consecutive: 2,
                code: ErrorCode::OutOfMemory
            }
        ));
        assert!(!w.is_running());
    }

    #[test]
    fn closed_window_ends_the_loop() {
        let (backend, _tln, mut w) = open(WindowConfig::default());
        w.tick().unwrap();
        backend.close_window();
        assert_eq!(w.tick().unwrap(), Tick::Closed);
        assert_eq!(w.last_exit(), Some(&LoopExit::Closed));
    }

    #[test]
    fn restart_is_clean() {
        let (_backend, _tln, mut w) = open(WindowConfig::default());
        w.tick().unwrap();
        w.tick().unwrap();
        let old = w.stop_handle().unwrap();
        w.stop();
        w.tick().unwrap();
        assert_eq!(w.frame(), 2);

        w.start().unwrap();
        assert_eq!(w.frame(), 0);
        assert!(w.last_exit().is_none());
        assert!(!w.stop_handle().unwrap().is_cancelled());
        assert!(old.is_cancelled());
        assert_eq!(w.tick().unwrap(), Tick::Continue);
    }

    #[test]
    fn managed_engine_replaces_owned() {
        let (_backend, tln, mut w) = open(WindowConfig::default().with_autostart(false));
        assert!(w.engine().is_owned());

        let shared = EngineRef::pending();
        w.set_managed_engine(shared.clone());
        assert!(!tln.has_live_engine());

        let _ = shared.replace(tln.create_engine(&EngineArgs::default()).unwrap());
        w.start().unwrap();
        assert_eq!(w.tick().unwrap(), Tick::Continue);
    }

    #[test]
    fn delete_is_idempotent_and_ends_loop() {
        let (backend, _tln, mut w) = open(WindowConfig::default());
        w.delete();
        w.delete();
        assert_eq!(backend.stats().windows_deleted, 1);
        assert_eq!(w.tick().unwrap(), Tick::Idle);
        assert!(matches!(w.start(), Err(WindowError::Deleted)));
        drop(w);
        assert_eq!(backend.stats().windows_deleted, 1);
    }

    #[test]
    fn legacy_mode_draws_on_demand() {
        let (backend, _tln, mut w) = open(WindowConfig::default().with_autostart(false));
        assert!(w.process());
        w.draw_frame(0).unwrap();
        w.draw_frame(0).unwrap();
        assert_eq!(backend.stats().frames_drawn, 2);
        assert_eq!(backend.stats().process_calls, 1);
    }

    #[test]
    fn title_is_applied_on_open() {
        let (backend, _tln, _w) = open(WindowConfig::default().with_title("tilewind"));
        assert_eq!(backend.window_title().as_deref(), Some("tilewind"));
    }

    #[test]
    fn engine_removed_by_hook_is_never_drawn() {
        let (backend, tln, mut w) = open(WindowConfig::default());
        w.before_frame(|win, _| {
            drop(win.detach_engine());
            Ok(())
        });

        assert!(matches!(w.tick(), Err(WindowError::NoEngine)));
        assert_eq!(backend.stats().draw_calls, 0);
        assert!(!w.is_running());
        assert!(matches!(w.last_exit(), Some(LoopExit::Failed(_))));
        assert!(!tln.has_live_engine());
    }

    #[test]
    fn engine_swapped_by_hook_is_made_current() {
        let (backend, tln, mut w) = open(WindowConfig::default());
        let first = w.with_engine(Engine::context).unwrap();
        let swapped = Rc::new(Cell::new(None));

        let seen = swapped.clone();
        w.before_frame(move |win, _| {
            if seen.get().is_none() {
                drop(win.detach_engine());
                let engine = tln.create_engine(&EngineArgs::new().with_layers(1))?;
                seen.set(Some(engine.context()));
                win.attach_engine(engine);
            }
            Ok(())
        });

        assert_eq!(w.tick().unwrap(), Tick::Continue);
        let second = swapped.get().unwrap();
        assert_ne!(first, second);
        assert_eq!(backend.context(), Some(second));
        assert_eq!(backend.stats().frames_drawn, 1);
    }

    #[test]
    fn crt_settings_replace_each_other() {
        let (backend, _tln, w) = open(WindowConfig::default());
        let effect = CrtEffect {
            overlay: crate::native::Overlay::Scanlines,
            overlay_factor: 64,
            threshold: 192,
            curve: [0, 0, 255, 128],
            blur: true,
            glow_factor: 40,
        };

        w.config_crt(Crt::Slot, false);
        w.enable_crt(&effect);
        assert_eq!(backend.custom_crt_effect(), Some(effect));
        assert_eq!(backend.crt_effect(), None);

        w.config_crt(Crt::Aperture, true);
        assert_eq!(backend.custom_crt_effect(), None);
        w.enable_crt(&effect);
        w.disable_crt();
        assert_eq!(backend.custom_crt_effect(), None);

        assert!(!backend.blur_enabled());
        w.enable_blur(true);
        assert!(backend.blur_enabled());
        w.enable_blur(false);
        assert!(!backend.blur_enabled());
    }
}

