//! Frame loop contract, checked on the headless backend.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tilewind_engine::engine::{EngineAccess, EngineArgs, EngineRef, Tilengine};
use tilewind_engine::error::{EngineError, WindowError};
use tilewind_engine::native::{ErrorCode, Headless, HeadlessConfig};
use tilewind_engine::window::{DrawFailurePolicy, LoopExit, Runtime, Tick, WindowConfig};

fn runtime(config: HeadlessConfig) -> (Rc<Headless>, Runtime) {
    let backend = Rc::new(Headless::new(config));
    let rt = Runtime::new(Tilengine::from_backend(backend.clone()));
    (backend, rt)
}

fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
    let c = Rc::new(Cell::new(0));
    (c.clone(), c)
}

#[test]
fn live_engine_blocks_second_creation() {
    let tln = Tilengine::headless();
    let engine = tln.create_engine(&EngineArgs::new().with_sprites(4)).unwrap();
    let ctx = engine.context();

    for _ in 0..3 {
        assert!(matches!(
            tln.create_engine(&EngineArgs::default()),
            Err(EngineError::AlreadyInitialized)
        ));
    }
    assert_eq!(engine.context(), ctx);
    assert_eq!(engine.sprites().len(), 4);
}

#[test]
fn engine_ref_mutation_is_shared() {
    let tln = Tilengine::headless();
    let shared = EngineRef::new(tln.create_engine(&EngineArgs::default()).unwrap());
    let aliases: Vec<EngineRef> = (0..3).map(|_| shared.clone()).collect();

    shared.with_mut(|e| e.set_target_fps(48));
    for alias in &aliases {
        assert_eq!(alias.with(|e| e.target_fps()), Some(48));
    }
}

#[test]
fn autostart_false_never_runs_hooks() {
    let (_backend, mut rt) = runtime(HeadlessConfig::default());
    let id = rt
        .open_window(WindowConfig::default().with_autostart(false))
        .unwrap();
    let (calls, seen) = counter();
    rt.window_mut(id).unwrap().before_frame(move |_, _| {
        seen.set(seen.get() + 1);
        Ok(())
    });

    for _ in 0..5 {
        rt.tick_all();
    }
    assert_eq!(calls.get(), 0);

    rt.window_mut(id).unwrap().start().unwrap();
    rt.tick_all();
    assert_eq!(calls.get(), 1);
}

#[test]
fn stop_lets_the_current_iteration_finish() {
    let (_backend, mut rt) = runtime(HeadlessConfig::default());
    let id = rt.open_window(WindowConfig::default()).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));

    let w = rt.window_mut(id).unwrap();
    let e = events.clone();
    w.before_frame(move |win, args| {
        e.borrow_mut().push(("before", args.frame));
        if args.frame == 2 {
            win.stop();
        }
        Ok(())
    });
    let e = events.clone();
    w.after_frame(move |_, args| {
        e.borrow_mut().push(("after", args.frame));
        Ok(())
    });

    let report = rt.run();
    assert_eq!(report, vec![(id, LoopExit::Stopped)]);
    assert_eq!(
        *events.borrow(),
        [
            ("before", 0),
            ("after", 0),
            ("before", 1),
            ("after", 1),
            ("before", 2),
            ("after", 2)
        ]
    );
}

#[test]
fn pumping_depends_on_threading() {
    let (backend, mut rt) = runtime(HeadlessConfig {
        close_after_frames: Some(10),
        ..HeadlessConfig::default()
    });
    rt.open_window(WindowConfig::default()).unwrap();
    rt.run();
    assert_eq!(backend.stats().frames_drawn, 10);
    assert_eq!(backend.stats().process_calls, 10);
    assert_eq!(backend.stats().wait_redraw_calls, 0);
    assert!(backend.stats().context_switches >= 10);

    let (backend, mut rt) = runtime(HeadlessConfig {
        close_after_frames: Some(10),
        ..HeadlessConfig::default()
    });
    rt.open_window(WindowConfig::default().with_threaded(true)).unwrap();
    rt.run();
    assert_eq!(backend.stats().process_calls, 0);
    assert_eq!(backend.stats().wait_redraw_calls, 10);
}

#[test]
fn clear_windows_deletes_every_window_once() {
    let (backend, mut rt) = runtime(HeadlessConfig::default());
    let running = rt.open_window(WindowConfig::default()).unwrap();
    let idle = rt
        .open_window(WindowConfig::managed().with_autostart(false))
        .unwrap();
    let failed = rt.open_window(WindowConfig::managed()).unwrap();

    rt.tick_all();
    rt.window_mut(idle).unwrap().delete();
    assert!(rt.window(running).is_some_and(|w| w.is_running()));
    assert!(matches!(
        rt.window(failed).and_then(|w| w.last_exit()),
        Some(LoopExit::Failed(_))
    ));

    rt.clear_windows();
    assert!(rt.is_empty());
    assert_eq!(backend.stats().windows_created, 3);
    assert_eq!(backend.stats().windows_deleted, 3);
    assert!(!rt.tilengine().has_live_engine());
}

#[test]
fn frame_counter_stops_with_the_loop() {
    let (_backend, mut rt) = runtime(HeadlessConfig::default());
    let id = rt.open_window(WindowConfig::default()).unwrap();
    let frames = Rc::new(RefCell::new(Vec::new()));
    let f = frames.clone();
    rt.window_mut(id).unwrap().after_frame(move |_, args| {
        f.borrow_mut().push(args.frame);
        Ok(())
    });

    for _ in 0..6 {
        rt.tick_all();
    }
    rt.window(id).unwrap().stop();
    for _ in 0..4 {
        rt.tick_all();
    }

    let frames = frames.borrow();
    assert_eq!(*frames, [0, 1, 2, 3, 4, 5]);
    assert_eq!(rt.window(id).unwrap().frame(), 6);
}

#[test]
fn missing_engine_fails_before_any_draw() {
    let (backend, mut rt) = runtime(HeadlessConfig::default());
    let id = rt.open_window(WindowConfig::managed()).unwrap();
    let err = rt.window_mut(id).unwrap().tick().unwrap_err();
    assert!(matches!(err, WindowError::NoEngine));
    assert_eq!(backend.stats().draw_calls, 0);

    let (backend, mut rt) = runtime(HeadlessConfig::default());
    let id = rt.open_window(WindowConfig::managed()).unwrap();
    rt.window_mut(id)
        .unwrap()
        .set_managed_engine(EngineRef::pending());
    assert!(matches!(
        rt.window_mut(id).unwrap().tick(),
        Err(WindowError::NoEngine)
    ));
    assert_eq!(backend.stats().draw_calls, 0);
}

#[test]
fn draw_failure_threshold() {
    let (_backend, mut rt) = runtime(HeadlessConfig {
        failing_draws: vec![2, 4, 5, 6],
        draw_error: ErrorCode::WrongSize,
        ..HeadlessConfig::default()
    });
    let id = rt.open_window(WindowConfig::default()).unwrap();
    let (after, a) = counter();
    rt.window_mut(id).unwrap().after_frame(move |_, _| {
        a.set(a.get() + 1);
        Ok(())
    });

    let w = rt.window_mut(id).unwrap();
    assert_eq!(w.tick().unwrap(), Tick::Continue);
    assert_eq!(w.tick().unwrap(), Tick::Continue);
    assert_eq!(w.tick().unwrap(), Tick::Continue);
    assert_eq!(after.get(), 2);

    assert_eq!(w.tick().unwrap(), Tick::Continue);
    assert_eq!(w.tick().unwrap(), Tick::Continue);
    let err = w.tick().unwrap_err();
    assert!(matches!(
        err,
        WindowError::DrawFailed {
            consecutive: 3,
            code: ErrorCode::WrongSize
        }
    ));
    assert_eq!(after.get(), 2);
    assert!(matches!(w.last_exit(), Some(LoopExit::Failed(_))));
}

#[test]
fn fail_fast_policy_dies_on_first_failure() {
    let (_backend, mut rt) = runtime(HeadlessConfig {
        failing_draws: vec![1],
        ..HeadlessConfig::default()
    });
    let id = rt
        .open_window(WindowConfig::default().with_failure_policy(DrawFailurePolicy::fail_fast()))
        .unwrap();
    let report = rt.run();
    assert!(matches!(&report[..], [(w, LoopExit::Failed(_))] if *w == id));
}

#[test]
fn restart_after_finished_run() {
    let (backend, mut rt) = runtime(HeadlessConfig::default());
    let id = rt.open_window(WindowConfig::default()).unwrap();
    rt.window_mut(id).unwrap().before_frame(|win, args| {
        if args.frame == 3 {
            win.stop();
        }
        Ok(())
    });

    assert_eq!(rt.run(), vec![(id, LoopExit::Stopped)]);
    assert_eq!(backend.stats().frames_drawn, 4);

    rt.window_mut(id).unwrap().start().unwrap();
    assert_eq!(rt.run(), vec![(id, LoopExit::Stopped)]);
    assert_eq!(backend.stats().frames_drawn, 8);
}

#[test]
fn stop_handle_works_from_outside_the_window() {
    let (_backend, mut rt) = runtime(HeadlessConfig::default());
    let id = rt.open_window(WindowConfig::default()).unwrap();
    let handle = rt.window(id).unwrap().stop_handle().unwrap();

    assert!(rt.tick_all());
    handle.cancel();
    assert!(!rt.tick_all());
    assert_eq!(rt.window(id).unwrap().last_exit(), Some(&LoopExit::Stopped));
}

#[test]
fn hooks_reach_the_engine() {
    let (_backend, mut rt) = runtime(HeadlessConfig {
        close_after_frames: Some(3),
        ..HeadlessConfig::default()
    });
    let id = rt.open_window(WindowConfig::default()).unwrap();
    rt.window_mut(id).unwrap().before_frame(|win, args| {
        win.with_engine(|e| e.layers()[0].set_position(args.frame as i32 * 4, 0));
        Ok(())
    });
    rt.run();

    let x = rt
        .window(id)
        .unwrap()
        .with_engine(|e| e.layers()[0].x());
    assert_eq!(x, Some(8));
}
