use crate::engine::Tilengine;
use crate::error::WindowError;

use super::{EngineSlot, LoopExit, Window, WindowConfig, WindowId};

/// Registry of open windows and their cooperative scheduler.
///
/// [`run`](Self::run) ticks every running window in registration order on
/// the calling thread until none is left running. Callers that own their
/// loop use [`tick_all`](Self::tick_all) or tick windows individually.
pub struct Runtime {
    tln: Tilengine,
    windows: Vec<Window>,
    next_id: u32,
}

impl Runtime {
    pub fn new(tln: Tilengine) -> Self {
        Self {
            tln,
            windows: Vec::new(),
            next_id: 1,
        }
    }

    pub fn tilengine(&self) -> &Tilengine {
        &self.tln
    }

    /// Opens a native window, creating its engine first when
    /// `config.engine` is set, and starts its loop if `config.autostart`.
    pub fn open_window(&mut self, config: WindowConfig) -> Result<WindowId, WindowError> {
        let id = WindowId(self.next_id);
        let window = Window::open(&self.tln, id, config)?;
        self.next_id += 1;
        self.windows.push(window);
        Ok(id)
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|w| w.id() == id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Stops, deletes and unregisters one window.
    pub fn close_window(&mut self, id: WindowId) -> bool {
        let Some(pos) = self.windows.iter().position(|w| w.id() == id) else {
            return false;
        };
        let mut window = self.windows.remove(pos);
        window.stop();
        window.delete();
        true
    }

    /// Tears down every registered window and empties the registry.
    ///
    /// Each window is stopped, deleted, loses its engine and its stop token.
    /// Owned engines are dropped; managed ones are left to their refs.
    pub fn clear_windows(&mut self) {
        for window in &mut self.windows {
            window.stop();
            window.delete();
            drop(window.detach_engine());
            window.discard_token();
        }
        let count = self.windows.len();
        self.windows.clear();
        log::debug!("cleared {count} window(s)");
    }

    /// Ticks every running window once; `true` while any is still running.
    ///
    /// Failed loops are already logged and recorded on the window.
    pub fn tick_all(&mut self) -> bool {
        let mut any_running = false;
        for window in &mut self.windows {
            if !window.is_running() {
                continue;
            }
            if let Err(e) = window.tick() {
                log::debug!("{} left the scheduler: {e}", window.id());
            }
            any_running |= window.is_running();
        }
        any_running
    }

    /// Drives all windows until none is running.
    ///
    /// Returns how each loop that ran during this call ended.
    pub fn run(&mut self) -> Vec<(WindowId, LoopExit)> {
        let mut seen: Vec<WindowId> = Vec::new();
        loop {
            for window in self.windows.iter().filter(|w| w.is_running()) {
                if !seen.contains(&window.id()) {
                    seen.push(window.id());
                }
            }
            if !self.tick_all() {
                break;
            }
        }

        seen.into_iter()
            .filter_map(|id| {
                let exit = self.window(id)?.last_exit()?.clone();
                Some((id, exit))
            })
            .collect()
    }

    /// Engine slot of a window, if it is registered.
    pub fn engine_of(&self, id: WindowId) -> Option<&EngineSlot> {
        self.window(id).map(Window::engine)
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.clear_windows();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::engine::{EngineArgs, EngineRef};
    use crate::native::{Headless, HeadlessConfig};

    fn runtime(config: HeadlessConfig) -> (Rc<Headless>, Runtime) {
        let backend = Rc::new(Headless::new(config));
        let rt = Runtime::new(Tilengine::from_backend(backend.clone()));
        (backend, rt)
    }

    #[test]
    fn run_until_window_closes() {
        let (backend, mut rt) = runtime(HeadlessConfig {
            close_after_frames: Some(5),
            ..HeadlessConfig::default()
        });
        let id = rt.open_window(WindowConfig::default()).unwrap();

        let report = rt.run();
        assert_eq!(report, vec![(id, LoopExit::Closed)]);
        assert_eq!(backend.stats().frames_drawn, 5);
        assert_eq!(rt.window(id).map(Window::frame), Some(5));
    }

    #[test]
    fn run_reports_failures() {
        let (_backend, mut rt) = runtime(HeadlessConfig::default());
        let id = rt.open_window(WindowConfig::managed()).unwrap();
        let report = rt.run();
        assert_eq!(report.len(), 1);
        assert!(matches!(&report[0], (w, LoopExit::Failed(msg)) if *w == id && msg.contains("no engine")));
    }

    #[test]
    fn idle_windows_are_not_reported() {
        let (_backend, mut rt) = runtime(HeadlessConfig::default());
        rt.open_window(WindowConfig::default().with_autostart(false)).unwrap();
        assert!(rt.run().is_empty());
        assert!(!rt.tick_all());
    }

    #[test]
    fn clear_windows_deletes_each_once() {
        let (backend, mut rt) = runtime(HeadlessConfig::default());
        let shared = EngineRef::new(
            rt.tilengine()
                .create_engine(&EngineArgs::default())
                .unwrap(),
        );

        let a = rt.open_window(WindowConfig::managed()).unwrap();
        rt.window_mut(a).unwrap().set_managed_engine(shared.clone());
        let b = rt.open_window(WindowConfig::managed().with_autostart(false)).unwrap();
        rt.window_mut(b).unwrap().delete();

        rt.clear_windows();
        assert!(rt.is_empty());
        assert_eq!(backend.stats().windows_deleted, 2);
        assert!(shared.is_set());
        drop(rt);
        assert_eq!(backend.stats().windows_deleted, 2);
    }

    #[test]
    fn close_window_unregisters() {
        let (backend, mut rt) = runtime(HeadlessConfig::default());
        let id = rt.open_window(WindowConfig::default()).unwrap();
        assert_eq!(rt.len(), 1);
        assert!(rt.close_window(id));
        assert!(!rt.close_window(id));
        assert!(rt.is_empty());
        assert_eq!(backend.stats().windows_deleted, 1);
        assert!(!rt.tilengine().has_live_engine());
    }

    #[test]
    fn second_owned_engine_fails_to_open() {
        let (backend, mut rt) = runtime(HeadlessConfig::default());
        rt.open_window(WindowConfig::default()).unwrap();
        let err = rt.open_window(WindowConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            WindowError::Engine(crate::error::EngineError::AlreadyInitialized)
        ));
        assert_eq!(rt.len(), 1);
        assert_eq!(backend.stats().windows_created, 1);
    }

    #[test]
    fn ids_are_distinct() {
        let (_backend, mut rt) = runtime(HeadlessConfig::default());
        let a = rt.open_window(WindowConfig::managed()).unwrap();
        let b = rt.open_window(WindowConfig::managed()).unwrap();
        assert_ne!(a, b);
        assert!(rt.engine_of(a).is_some_and(EngineSlot::is_unset));
    }
}
