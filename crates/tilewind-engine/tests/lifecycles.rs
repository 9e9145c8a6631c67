//! Owned, delayed, managed and legacy lifecycles end to end.

use std::cell::Cell;
use std::rc::Rc;

use tilewind_engine::engine::{EngineAccess, EngineArgs, EngineRef, Tilengine};
use tilewind_engine::native::{Color, Headless, HeadlessConfig, Player, Input};
use tilewind_engine::resources::{Bitmap, Palette, Tilemap};
use tilewind_engine::window::{EngineSlot, LoopExit, Runtime, WindowConfig};

fn closing_after(frames: u64) -> (Rc<Headless>, Tilengine) {
    let backend = Rc::new(Headless::new(HeadlessConfig {
        close_after_frames: Some(frames),
        ..HeadlessConfig::default()
    }));
    let tln = Tilengine::from_backend(backend.clone());
    (backend, tln)
}

fn args() -> EngineArgs {
    EngineArgs::new().with_resolution(384, 216).with_load_path("assets")
}

#[test]
fn standard_window_owns_its_engine() {
    let (backend, tln) = closing_after(8);
    let mut rt = Runtime::new(tln.clone());
    let id = rt.open_window(WindowConfig::default().with_engine(args())).unwrap();

    let window = rt.window_mut(id).unwrap();
    assert!(window.is_running());
    let bitmap = Bitmap::new(&tln, 256, 256, 8).unwrap();
    bitmap.set_palette(&Palette::new(&tln, 16).unwrap());
    window
        .with_engine(|e| {
            assert!(e.layers()[0].set_bitmap(&bitmap));
            let palette = e.layers()[0].bitmap().and_then(|b| b.palette()).unwrap();
            assert!(palette.set_color(1, Color::new(255, 0, 0)));
        })
        .unwrap();

    assert_eq!(rt.run(), vec![(id, LoopExit::Closed)]);
    assert_eq!(backend.stats().frames_drawn, 8);
    assert_eq!(bitmap.palette().unwrap().color(1), Some(Color::new(255, 0, 0)));

    rt.clear_windows();
    assert!(!tln.has_live_engine());
    assert_eq!(backend.live_contexts(), 0);
}

#[test]
fn delayed_start_runs_only_after_setup() {
    let (backend, tln) = closing_after(4);
    let mut rt = Runtime::new(tln.clone());
    let id = rt
        .open_window(WindowConfig::default().with_engine(args()).with_autostart(false))
        .unwrap();

    let foreground = Tilemap::load(&tln, "Sonic_md_fg1.tmx", None).unwrap();
    assert!(foreground.update_tile(23, 0, |t| t.set_flip_y(true)));
    assert!(rt.run().is_empty());
    assert_eq!(backend.stats().draw_calls, 0);

    rt.window_mut(id).unwrap().start().unwrap();
    assert_eq!(rt.run(), vec![(id, LoopExit::Closed)]);
    assert!(foreground.tile(23, 0).unwrap().flip_y());
}

#[test]
fn managed_engine_outlives_the_window() {
    let (backend, tln) = closing_after(5);
    let engine = EngineRef::new(tln.create_engine(&args()).unwrap());
    let mut rt = Runtime::new(tln.clone());
    let id = rt.open_window(WindowConfig::managed().with_autostart(false)).unwrap();

    let window = rt.window_mut(id).unwrap();
    window.set_managed_engine(engine.clone());
    let frames = Rc::new(Cell::new(0));
    let seen = frames.clone();
    window.after_frame(move |w, _| {
        seen.set(seen.get() + 1);
        assert!(matches!(w.engine(), EngineSlot::Managed(_)));
        Ok(())
    });
    window.start().unwrap();

    assert_eq!(rt.run(), vec![(id, LoopExit::Closed)]);
    assert_eq!(frames.get(), 5);

    rt.clear_windows();
    assert!(engine.is_set());
    assert!(tln.has_live_engine());
    assert_eq!(backend.live_contexts(), 1);

    engine.take().unwrap().delete();
    assert!(!tln.has_live_engine());
}

#[test]
fn delayed_engine_is_seen_through_the_ref() {
    let (_backend, tln) = closing_after(3);
    let slot = EngineRef::pending();
    let mut rt = Runtime::new(tln.clone());
    let id = rt.open_window(WindowConfig::managed().with_autostart(false)).unwrap();
    rt.window_mut(id).unwrap().set_managed_engine(slot.clone());

    let _ = slot.replace(tln.create_engine(&args()).unwrap());
    rt.window_mut(id).unwrap().start().unwrap();
    assert_eq!(rt.run(), vec![(id, LoopExit::Closed)]);
}

#[test]
fn legacy_loop_is_caller_driven() {
    let (backend, tln) = closing_after(u64::MAX);
    let engine = EngineRef::new(tln.create_engine(&args()).unwrap());
    let mut rt = Runtime::new(tln.clone());
    let id = rt.open_window(WindowConfig::managed().with_autostart(false)).unwrap();
    let window = rt.window_mut(id).unwrap();
    window.set_managed_engine(engine.clone());

    let mut frames = 0;
    while window.process() {
        window.draw_frame(0).unwrap();
        frames += 1;
        if frames == 7 {
            backend.set_input(Player::P1, Input::Quit, true);
        }
    }

    assert_eq!(frames, 7);
    assert_eq!(backend.stats().process_calls, 8);
    assert!(!window.is_running());
    assert!(window.last_exit().is_none());
}

#[test]
fn threaded_window_is_never_pumped() {
    let (backend, tln) = closing_after(6);
    let mut rt = Runtime::new(tln);
    rt.open_window(WindowConfig::default().with_engine(args()).with_threaded(true))
        .unwrap();
    rt.run();
    assert_eq!(backend.window_threaded(), Some(true));
    assert_eq!(backend.stats().process_calls, 0);
}
