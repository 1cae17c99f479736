//! End-to-end tests for mount, the render loop and teardown, driven with a
//! manual clock and scripted collaborators.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use image::RgbaImage;
use palmburst::{
    CancelToken, Category, ClassificationResult, ClassifierAdapter, ClassifierLoader,
    ClassifierOptions, ClassifyError, DrawCommand, Frame, FrameSource, FrameSourceProvider,
    GestureClassifier, LifecycleManager, ManualClock, RecordingSurface, RenderLoop, Session,
    SessionConfig, SetupError, TickOutcome, UVec2, Vec2,
};

// ============================================================================
// Scripted collaborators
// ============================================================================

/// Counters shared between a test and the collaborators it hands out.
#[derive(Default)]
struct Probe {
    classify_calls: Cell<u32>,
    close_calls: Cell<u32>,
    open_calls: Cell<u32>,
    stop_calls: Cell<u32>,
}

struct ScriptedClassifier {
    probe: Rc<Probe>,
    /// Results handed out in order; once exhausted, `fallback` repeats.
    script: Rc<RefCell<VecDeque<Result<ClassificationResult, ()>>>>,
    fallback: Result<ClassificationResult, ()>,
}

impl GestureClassifier for ScriptedClassifier {
    fn classify(
        &mut self,
        _frame: &Frame,
        _ts: u64,
    ) -> Result<ClassificationResult, ClassifyError> {
        self.probe.classify_calls.set(self.probe.classify_calls.get() + 1);
        let next = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        next.map_err(|()| ClassifyError::Recognition("scripted failure".into()))
    }

    fn close(&mut self) -> Result<(), ClassifyError> {
        self.probe.close_calls.set(self.probe.close_calls.get() + 1);
        Ok(())
    }
}

struct ScriptedLoader {
    probe: Rc<Probe>,
    script: Rc<RefCell<VecDeque<Result<ClassificationResult, ()>>>>,
    fallback: Result<ClassificationResult, ()>,
    cancel_while_loading: Option<LifecycleManager>,
}

impl ScriptedLoader {
    fn new(probe: &Rc<Probe>, fallback: Result<ClassificationResult, ()>) -> Self {
        Self {
            probe: probe.clone(),
            script: Rc::new(RefCell::new(VecDeque::new())),
            fallback,
            cancel_while_loading: None,
        }
    }
}

impl ClassifierLoader for ScriptedLoader {
    type Classifier = ScriptedClassifier;

    fn load(
        &self,
        _options: &ClassifierOptions,
    ) -> impl Future<Output = Result<ScriptedClassifier, SetupError>> {
        if let Some(manager) = &self.cancel_while_loading {
            manager.cancel();
        }
        std::future::ready(Ok(ScriptedClassifier {
            probe: self.probe.clone(),
            script: self.script.clone(),
            fallback: self.fallback.clone(),
        }))
    }
}

struct FakeStream {
    probe: Rc<Probe>,
    size: UVec2,
    live: bool,
    index: u64,
}

impl FrameSource for FakeStream {
    fn dimensions(&self) -> UVec2 {
        self.size
    }

    fn current_frame(&mut self) -> Option<Frame> {
        if !self.live {
            return None;
        }
        self.index += 1;
        Some(Frame::new(RgbaImage::new(4, 4), self.index))
    }

    fn stop(&mut self) {
        if self.live {
            self.probe.stop_calls.set(self.probe.stop_calls.get() + 1);
        }
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

struct FakeCamera {
    probe: Rc<Probe>,
    size: UVec2,
    deny: bool,
    cancel_while_opening: Option<LifecycleManager>,
}

impl FakeCamera {
    fn new(probe: &Rc<Probe>) -> Self {
        Self {
            probe: probe.clone(),
            size: UVec2::new(200, 400),
            deny: false,
            cancel_while_opening: None,
        }
    }
}

impl FrameSourceProvider for FakeCamera {
    type Source = FakeStream;

    fn open(&self) -> impl Future<Output = Result<FakeStream, SetupError>> {
        self.probe.open_calls.set(self.probe.open_calls.get() + 1);
        if let Some(manager) = &self.cancel_while_opening {
            manager.cancel();
        }
        let result = if self.deny {
            Err(SetupError::PermissionDenied("blocked".into()))
        } else {
            Ok(FakeStream {
                probe: self.probe.clone(),
                size: self.size,
                live: true,
                index: 0,
            })
        };
        std::future::ready(result)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn palm(score: f32, anchor: Vec2) -> ClassificationResult {
    let mut landmarks = vec![Vec2::ZERO; 21];
    landmarks[9] = anchor;
    ClassificationResult {
        gestures: vec![vec![Category::new("Open_Palm", score)]],
        landmarks: vec![landmarks],
        handedness: vec![vec![Category::new("Right", 0.9)]],
    }
}

fn no_hands() -> Result<ClassificationResult, ()> {
    Ok(ClassificationResult::empty())
}

type TestSession<'c> = Session<FakeStream, ScriptedClassifier, RecordingSurface, &'c ManualClock>;

fn mount<'c>(
    manager: &LifecycleManager,
    loader: &ScriptedLoader,
    camera: &FakeCamera,
    clock: &'c ManualClock,
) -> Result<TestSession<'c>, SetupError> {
    pollster::block_on(manager.mount(
        loader,
        camera,
        |size| RecordingSurface::new(size.x as f32, size.y as f32),
        clock,
    ))
}

/// Mount with a recognizer that never sees hands and a 200x400 camera.
fn mount_idle<'c>(
    manager: &LifecycleManager,
    probe: &Rc<Probe>,
    clock: &'c ManualClock,
) -> Result<TestSession<'c>, SetupError> {
    mount(manager, &ScriptedLoader::new(probe, no_hands()), &FakeCamera::new(probe), clock)
}

fn seeded() -> LifecycleManager {
    LifecycleManager::new(SessionConfig::default().with_seed(42))
}

fn glyphs_in_frame(session: &TestSession<'_>) -> usize {
    session
        .surface()
        .current_frame()
        .filter(|c| matches!(c, DrawCommand::Glyph { .. }))
        .count()
}

// ============================================================================
// Render loop behaviour
// ============================================================================

#[test]
fn test_no_hands_never_spawns() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(10_000);
    let manager = seeded();
    let mut session = mount_idle(&manager, &probe, &clock).unwrap();

    let mut render_loop = RenderLoop::new();
    assert!(render_loop.start(&mut session));
    for _ in 0..200 {
        clock.advance(16);
        assert_eq!(render_loop.tick(&mut session), TickOutcome::Rendered { triggered: None });
    }
    assert!(session.particles().is_empty());
    assert_eq!(render_loop.spawn_count(), 0);
    assert_eq!(session.surface().clear_count(), 200);
    assert_eq!(probe.classify_calls.get(), 200);
}

#[test]
fn test_debounce_window() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(1_000);
    let manager = seeded();
    let loader = ScriptedLoader::new(&probe, Ok(palm(0.9, Vec2::new(0.5, 0.5))));
    let mut session = mount(&manager, &loader, &FakeCamera::new(&probe), &clock).unwrap();

    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut session);

    // First qualifying gesture fires.
    assert!(matches!(
        render_loop.tick(&mut session),
        TickOutcome::Rendered { triggered: Some(_) }
    ));

    // Held palm within the window: nothing new.
    clock.set(1_300);
    render_loop.tick(&mut session);
    clock.set(1_500);
    render_loop.tick(&mut session);
    assert_eq!(render_loop.spawn_count(), 1);

    // Just past the window.
    clock.set(1_501);
    render_loop.tick(&mut session);
    assert_eq!(render_loop.spawn_count(), 2);
    assert_eq!(session.trigger().last_trigger_ms(), Some(1_501));
}

#[test]
fn test_score_threshold_is_exclusive() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();
    let loader = ScriptedLoader::new(&probe, no_hands());
    loader.script.borrow_mut().extend([
        Ok(palm(0.7, Vec2::new(0.5, 0.5))),
        Ok(palm(0.71, Vec2::new(0.5, 0.5))),
    ]);
    let mut session = mount(&manager, &loader, &FakeCamera::new(&probe), &clock).unwrap();

    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut session);
    clock.set(1_000);
    assert_eq!(render_loop.tick(&mut session), TickOutcome::Rendered { triggered: None });
    assert!(session.particles().is_empty());

    clock.set(1_016);
    assert!(matches!(
        render_loop.tick(&mut session),
        TickOutcome::Rendered { triggered: Some(_) }
    ));
    assert_eq!(session.particles().len(), 10);
}

#[test]
fn test_burst_position_and_lifetime() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(5_000);
    let manager = seeded();
    let loader = ScriptedLoader::new(&probe, no_hands());
    loader.script.borrow_mut().push_back(Ok(palm(0.95, Vec2::new(0.5, 0.25))));
    let mut session = mount(&manager, &loader, &FakeCamera::new(&probe), &clock).unwrap();

    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut session);
    assert_eq!(
        render_loop.tick(&mut session),
        TickOutcome::Rendered { triggered: Some(Vec2::new(100.0, 100.0)) }
    );
    assert_eq!(session.particles().len(), 10);
    assert!(session.particles().iter().all(|p| p.position == Vec2::new(100.0, 100.0)));
    // Spawned after this tick's draw pass.
    assert_eq!(glyphs_in_frame(&session), 0);

    for _ in 0..99 {
        clock.advance(16);
        render_loop.tick(&mut session);
    }
    assert_eq!(session.particles().len(), 10);
    assert!(session.particles().iter().all(|p| p.life == 1));

    clock.advance(16);
    render_loop.tick(&mut session);
    assert!(session.particles().is_empty());
    assert_eq!(glyphs_in_frame(&session), 0);
}

#[test]
fn test_opacity_fades_with_life() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(5_000);
    let manager = seeded();
    let loader = ScriptedLoader::new(&probe, no_hands());
    loader.script.borrow_mut().push_back(Ok(palm(0.95, Vec2::new(0.5, 0.5))));
    let mut session = mount(&manager, &loader, &FakeCamera::new(&probe), &clock).unwrap();

    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut session);
    render_loop.tick(&mut session);
    for _ in 0..50 {
        render_loop.tick(&mut session);
    }

    let opacities: Vec<f32> = session
        .surface()
        .current_frame()
        .filter_map(|c| match c {
            DrawCommand::Glyph { opacity, .. } => Some(*opacity),
            DrawCommand::Clear => None,
        })
        .collect();
    assert_eq!(opacities.len(), 10);
    assert!(opacities.iter().all(|&o| (o - 0.5).abs() < 1e-6));
}

#[test]
fn test_transient_failures_keep_animating() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(5_000);
    let manager = seeded();
    let loader = ScriptedLoader::new(&probe, Err(()));
    loader.script.borrow_mut().push_back(Ok(palm(0.95, Vec2::new(0.5, 0.5))));
    let mut session = mount(&manager, &loader, &FakeCamera::new(&probe), &clock).unwrap();

    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut session);
    render_loop.tick(&mut session);
    for _ in 0..10 {
        clock.advance(16);
        assert_eq!(render_loop.tick(&mut session), TickOutcome::Rendered { triggered: None });
        assert_eq!(glyphs_in_frame(&session), 10);
    }
    assert_eq!(session.classifier().failure_count(), 10);
    assert_eq!(session.classifier().classified_count(), 1);
    assert!(session.particles().iter().all(|p| p.life == 90));
}

#[test]
fn test_second_loop_cannot_start() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();
    let mut session = mount_idle(&manager, &probe, &clock).unwrap();

    let mut first = RenderLoop::new();
    let mut second = RenderLoop::new();
    assert!(first.start(&mut session));
    assert!(!first.start(&mut session));
    assert!(!second.start(&mut session));
    assert_eq!(second.tick(&mut session), TickOutcome::Skipped);

    // Once the first loop stops, a fresh loop may take over.
    first.stop(&mut session);
    assert!(second.start(&mut session));
}

// ============================================================================
// Mount and unmount
// ============================================================================

#[test]
fn test_unmount_stops_everything() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();
    let mut session = mount_idle(&manager, &probe, &clock).unwrap();

    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut session);
    render_loop.tick(&mut session);

    manager.unmount(&mut session);
    assert_eq!(render_loop.tick(&mut session), TickOutcome::Stopped);
    assert_eq!(render_loop.tick(&mut session), TickOutcome::Stopped);
    assert_eq!(probe.stop_calls.get(), 1);
    assert_eq!(probe.close_calls.get(), 1);
    assert_eq!(probe.classify_calls.get(), 1);

    // A second teardown is harmless.
    manager.unmount(&mut session);
    assert_eq!(probe.stop_calls.get(), 1);
    assert_eq!(probe.close_calls.get(), 1);
}

#[test]
fn test_cancel_during_model_load() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();
    let mut loader = ScriptedLoader::new(&probe, no_hands());
    loader.cancel_while_loading = Some(manager.clone());

    let err = mount(&manager, &loader, &FakeCamera::new(&probe), &clock).err();
    assert!(matches!(err, Some(SetupError::Canceled)));
    assert_eq!(probe.close_calls.get(), 1);
    assert_eq!(probe.classify_calls.get(), 0);
    assert_eq!(probe.open_calls.get(), 0);
}

#[test]
fn test_cancel_during_camera_open() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();
    let mut camera = FakeCamera::new(&probe);
    camera.cancel_while_opening = Some(manager.clone());

    let err = mount(&manager, &ScriptedLoader::new(&probe, no_hands()), &camera, &clock).err();
    assert!(matches!(err, Some(SetupError::Canceled)));
    assert_eq!(probe.open_calls.get(), 1);
    assert_eq!(probe.stop_calls.get(), 1);
    assert_eq!(probe.close_calls.get(), 1);
    assert_eq!(probe.classify_calls.get(), 0);
}

#[test]
fn test_camera_denied_releases_model() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();
    let mut camera = FakeCamera::new(&probe);
    camera.deny = true;

    let err = mount(&manager, &ScriptedLoader::new(&probe, no_hands()), &camera, &clock).err();
    assert!(matches!(err, Some(SetupError::PermissionDenied(_))));
    assert_eq!(probe.close_calls.get(), 1);
    assert_eq!(probe.stop_calls.get(), 0);
}

#[test]
fn test_empty_frames_rejected() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();
    let mut camera = FakeCamera::new(&probe);
    camera.size = UVec2::new(0, 480);

    let err = mount(&manager, &ScriptedLoader::new(&probe, no_hands()), &camera, &clock).err();
    assert!(matches!(err, Some(SetupError::Camera(_))));
    assert_eq!(probe.stop_calls.get(), 1);
    assert_eq!(probe.close_calls.get(), 1);
}

#[test]
fn test_remount_after_unmount() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();

    let mut first = mount_idle(&manager, &probe, &clock).unwrap();
    manager.unmount(&mut first);
    assert!(first.is_canceled());
    assert!(manager.is_canceled());

    let mut second = mount_idle(&manager, &probe, &clock).unwrap();
    assert!(!second.is_canceled());
    assert!(second.is_ready());
    assert!(first.is_canceled());

    let mut render_loop = RenderLoop::new();
    assert!(render_loop.start(&mut second));
    assert_eq!(render_loop.tick(&mut second), TickOutcome::Rendered { triggered: None });
    assert_eq!(probe.open_calls.get(), 2);
}

#[test]
fn test_remount_after_canceled_mount() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();
    let mut loader = ScriptedLoader::new(&probe, no_hands());
    loader.cancel_while_loading = Some(manager.clone());

    let err = mount(&manager, &loader, &FakeCamera::new(&probe), &clock).err();
    assert!(matches!(err, Some(SetupError::Canceled)));

    loader.cancel_while_loading = None;
    let session = mount(&manager, &loader, &FakeCamera::new(&probe), &clock).unwrap();
    assert!(session.is_ready());
}

#[test]
fn test_dropping_session_releases_resources() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();

    let session = mount_idle(&manager, &probe, &clock).unwrap();
    assert_eq!(probe.close_calls.get(), 0);
    drop(session);
    assert_eq!(probe.stop_calls.get(), 1);
    assert_eq!(probe.close_calls.get(), 1);

    // Unmounting first then dropping still releases exactly once.
    let mut session = mount_idle(&manager, &probe, &clock).unwrap();
    manager.unmount(&mut session);
    drop(session);
    assert_eq!(probe.stop_calls.get(), 2);
    assert_eq!(probe.close_calls.get(), 2);
}

#[test]
fn test_zero_frame_limit_renders_nothing() {
    use palmburst::FixedRateScheduler;

    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let manager = seeded();
    let mut session = mount_idle(&manager, &probe, &clock).unwrap();

    let mut render_loop = RenderLoop::new();
    let mut scheduler = FixedRateScheduler::unthrottled().with_frame_limit(0);
    assert_eq!(render_loop.run(&mut session, &mut scheduler), 0);
    assert_eq!(probe.classify_calls.get(), 0);
    assert!(session.surface().commands().is_empty());
}

#[test]
fn test_session_without_classifier_is_not_ready() {
    let probe = Rc::new(Probe::default());
    let clock = ManualClock::new(0);
    let stream = FakeStream {
        probe: probe.clone(),
        size: UVec2::new(64, 64),
        live: true,
        index: 0,
    };
    let mut session: TestSession<'_> = Session::new(
        stream,
        ClassifierAdapter::empty(),
        RecordingSurface::new(64.0, 64.0),
        &SessionConfig::default(),
        &clock,
        CancelToken::new(),
    );
    assert!(!session.is_ready());

    let mut render_loop = RenderLoop::new();
    render_loop.start(&mut session);
    assert_eq!(render_loop.tick(&mut session), TickOutcome::Skipped);
    assert!(session.surface().commands().is_empty());
}

#[test]
fn test_headless_demo_run() {
    use palmburst::{DemoCamera, DemoLoader, FixedRateScheduler, ImageSurface, SystemClock};

    let manager = seeded();
    let mut session = pollster::block_on(manager.mount(
        &DemoLoader::new(),
        &DemoCamera::new(64, 48),
        |size| ImageSurface::new(size.x, size.y),
        SystemClock,
    ))
    .unwrap();
    assert_eq!(session.surface().image().dimensions(), (64, 48));

    let mut render_loop = RenderLoop::new();
    let mut scheduler = FixedRateScheduler::unthrottled().with_frame_limit(30);
    assert_eq!(render_loop.run(&mut session, &mut scheduler), 30);
    assert!(session.last_frame().is_some());

    manager.unmount(&mut session);
    assert!(!session.is_ready());
    assert!(session.frames().is_none());
}
