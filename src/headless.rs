//=========================================================================
// Headless Backend
//=========================================================================
//
// A GPU-free implementation of the render, UI and asset backends.
//
// Every call is recorded in a journal. Scenes, overlays, buttons and
// subscriptions are tracked so misuse (rendering a disposed scene, two
// cameras attached at once, ...) is reported as a violation instead of
// being silently accepted.
//
// Loads are held as pending resolvers. They complete either when the
// driver says so (`resolve_pending`, `resolve_kind`, `fail_pending`) or,
// with `LoadPolicy::AfterFrames`, a fixed number of frames after they
// were issued.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::{debug, trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::bridge::{
    ready_signal, AssetBackend, ButtonHandle, ButtonStyle, ControlSink, MeshHandle, OverlayHandle,
    ReadySignal, RenderBackend, Resolver, SceneHandle, ShadowGeneratorHandle, Subscription,
    UiBackend,
};
use crate::core::character::CharacterAssets;
use crate::core::graph::{FrameView, NodeId};
use crate::core::input::{InputEvent, KeyCode, Modifiers};

//=== LoadKind ============================================================

/// The kinds of asynchronous work the backend hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
    /// `when_ready` on a scene.
    SceneReady,

    /// `load_environment`.
    Environment,

    /// `load_character_assets`.
    Character,
}

//=== LoadPolicy ==========================================================

/// When pending loads complete on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Only when the driver resolves them.
    #[default]
    Manual,

    /// At the end of the frame `n` frames after they were issued.
    AfterFrames(u64),
}

//=== BackendCall =========================================================

/// One journaled backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateScene(SceneHandle),
    DisposeScene(SceneHandle),
    RenderFrame(SceneHandle),
    AttachCamera(SceneHandle),
    DetachCamera(SceneHandle),
    ShowCurtain,
    HideCurtain,
    CreateShadowGenerator(SceneHandle),
    AddShadowCaster(MeshHandle),
    DebugLayer(bool),
    Resize { width: u32, height: u32 },
    CreateOverlay(OverlayHandle),
    DisposeOverlay(OverlayHandle),
    CreateButton { label: String, style: ButtonStyle },
    Subscribe(Subscription),
    Unsubscribe(Subscription),
    /// A load was issued.
    Load(LoadKind, SceneHandle),
    /// A load resolved successfully.
    Resolved(LoadKind, SceneHandle),
    /// A load was rejected.
    Rejected(LoadKind, SceneHandle),
}

//=== Internal State ======================================================

#[derive(Debug)]
enum LoadResolver {
    Unit(Resolver<()>),
    Character(Resolver<CharacterAssets>, CharacterAssets),
}

#[derive(Debug)]
struct PendingLoad {
    kind: LoadKind,
    scene: SceneHandle,
    issued_at: u64,
    resolver: LoadResolver,
}

impl PendingLoad {
    fn resolve(self) {
        match self.resolver {
            LoadResolver::Unit(resolver) => resolver.resolve(()),
            LoadResolver::Character(resolver, assets) => resolver.resolve(assets),
        }
    }

    fn reject(self, reason: &str) {
        match self.resolver {
            LoadResolver::Unit(resolver) => resolver.reject(reason),
            LoadResolver::Character(resolver, _) => resolver.reject(reason),
        }
    }
}

#[derive(Debug)]
struct Button {
    overlay: OverlayHandle,
    label: String,
}

//=== HeadlessBackend =====================================================

/// Journaling backend for tests and the windowed demo.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    policy: LoadPolicy,
    frame: u64,
    next_handle: u64,

    journal: Vec<BackendCall>,
    violations: Vec<String>,

    scenes: BTreeSet<SceneHandle>,
    attached: Vec<SceneHandle>,
    overlays: BTreeMap<OverlayHandle, SceneHandle>,
    buttons: BTreeMap<ButtonHandle, Button>,
    subscriptions: BTreeMap<Subscription, (ButtonHandle, ControlSink)>,
    loads: VecDeque<PendingLoad>,

    curtain: bool,
    debug_layer: bool,
    surface: Option<(u32, u32)>,
    last_rendered: Option<SceneHandle>,
    last_view: Option<FrameView>,
}

impl HeadlessBackend {
    //--- Construction -----------------------------------------------------

    /// Loads complete only when resolved explicitly.
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: LoadPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    //--- Load Control -----------------------------------------------------

    /// Resolves every pending load, oldest first. Returns how many.
    pub fn resolve_pending(&mut self) -> usize {
        let loads: Vec<_> = self.loads.drain(..).collect();
        let count = loads.len();
        for load in loads {
            self.complete(load);
        }
        count
    }

    /// Resolves the oldest pending load of `kind`.
    pub fn resolve_kind(&mut self, kind: LoadKind) -> bool {
        match self.take_load(kind) {
            Some(load) => {
                self.complete(load);
                true
            }
            None => false,
        }
    }

    /// Rejects the oldest pending load of `kind` with `reason`.
    pub fn fail_pending(&mut self, kind: LoadKind, reason: &str) -> bool {
        match self.take_load(kind) {
            Some(load) => {
                debug!(target: "headless", "Failing {:?} load for {:?}: {}", kind, load.scene, reason);
                self.journal.push(BackendCall::Rejected(kind, load.scene));
                load.reject(reason);
                true
            }
            None => false,
        }
    }

    /// Kinds of the loads still pending, oldest first.
    pub fn pending_loads(&self) -> Vec<LoadKind> {
        self.loads.iter().map(|load| load.kind).collect()
    }

    fn take_load(&mut self, kind: LoadKind) -> Option<PendingLoad> {
        let index = self.loads.iter().position(|load| load.kind == kind)?;
        self.loads.remove(index)
    }

    fn complete(&mut self, load: PendingLoad) {
        trace!(target: "headless", "Resolving {:?} load for {:?}", load.kind, load.scene);
        self.journal.push(BackendCall::Resolved(load.kind, load.scene));
        load.resolve();
    }

    fn issue<T>(&mut self, kind: LoadKind, scene: SceneHandle) -> (Resolver<T>, ReadySignal<T>) {
        if !self.scenes.contains(&scene) {
            self.violation(format!("{:?} load issued for unknown scene {:?}", kind, scene));
        }
        self.journal.push(BackendCall::Load(kind, scene));
        ready_signal(match kind {
            LoadKind::SceneReady => "scene",
            LoadKind::Environment => "environment",
            LoadKind::Character => "character",
        })
    }

    fn enqueue(&mut self, kind: LoadKind, scene: SceneHandle, resolver: LoadResolver) {
        self.loads.push_back(PendingLoad {
            kind,
            scene,
            issued_at: self.frame,
            resolver,
        });
    }

    //--- UI Simulation ----------------------------------------------------

    /// Clicks the most recently subscribed button labelled `label`.
    ///
    /// Returns false if no such button is subscribed or the press was
    /// dropped.
    pub fn press(&mut self, label: &str) -> bool {
        let sink = self
            .subscriptions
            .values()
            .rev()
            .find(|(button, _)| self.buttons.get(button).is_some_and(|b| b.label == label))
            .map(|(_, sink)| sink);

        match sink {
            Some(sink) => sink.press(),
            None => {
                debug!(target: "headless", "No live button labelled {:?}", label);
                false
            }
        }
    }

    /// Labels of all subscribed buttons, oldest first.
    pub fn live_buttons(&self) -> Vec<&str> {
        self.subscriptions
            .values()
            .filter_map(|(button, _)| self.buttons.get(button))
            .map(|button| button.label.as_str())
            .collect()
    }

    //--- Inspection -------------------------------------------------------

    pub fn journal(&self) -> &[BackendCall] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Misuse detected so far; empty for a correct caller.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn live_scenes(&self) -> Vec<SceneHandle> {
        self.scenes.iter().copied().collect()
    }

    pub fn is_scene_alive(&self, scene: SceneHandle) -> bool {
        self.scenes.contains(&scene)
    }

    /// Scenes whose camera is attached, in attach order.
    pub fn attached_scenes(&self) -> Vec<SceneHandle> {
        self.attached.clone()
    }

    pub fn live_overlays(&self) -> usize {
        self.overlays.len()
    }

    pub fn curtain_visible(&self) -> bool {
        self.curtain
    }

    /// Last size passed to `resize`, if any.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface
    }

    pub fn debug_layer_visible(&self) -> bool {
        self.debug_layer
    }

    pub fn last_rendered(&self) -> Option<SceneHandle> {
        self.last_rendered
    }

    pub fn last_view(&self) -> Option<FrameView> {
        self.last_view
    }

    /// Frames completed via `end_frame`.
    pub fn frames(&self) -> u64 {
        self.frame
    }

    //--- Helpers ----------------------------------------------------------

    fn next_raw(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn violation(&mut self, message: String) {
        warn!(target: "headless", "{}", message);
        self.violations.push(message);
    }
}

//=== RenderBackend =======================================================

impl RenderBackend for HeadlessBackend {
    fn create_scene(&mut self) -> SceneHandle {
        let scene = SceneHandle::new(self.next_raw());
        self.scenes.insert(scene);
        self.journal.push(BackendCall::CreateScene(scene));
        scene
    }

    fn dispose_scene(&mut self, scene: SceneHandle) {
        self.journal.push(BackendCall::DisposeScene(scene));
        if !self.scenes.remove(&scene) {
            self.violation(format!("dispose of unknown scene {:?}", scene));
        }
        if self.attached.contains(&scene) {
            self.violation(format!("scene {:?} disposed with its camera attached", scene));
            self.attached.retain(|&s| s != scene);
        }

        // Loads into a disposed scene are cancelled.
        self.loads.retain(|load| load.scene != scene);
    }

    fn when_ready(&mut self, scene: SceneHandle) -> ReadySignal<()> {
        let (resolver, signal) = self.issue(LoadKind::SceneReady, scene);
        self.enqueue(LoadKind::SceneReady, scene, LoadResolver::Unit(resolver));
        signal
    }

    fn render_frame(&mut self, scene: SceneHandle, view: &FrameView) {
        if !self.scenes.contains(&scene) {
            self.violation(format!("render of disposed scene {:?}", scene));
        } else if !self.attached.contains(&scene) {
            self.violation(format!("render of detached scene {:?}", scene));
        }
        self.journal.push(BackendCall::RenderFrame(scene));
        self.last_rendered = Some(scene);
        self.last_view = Some(*view);
    }

    fn attach_camera(&mut self, scene: SceneHandle, camera: NodeId) {
        self.journal.push(BackendCall::AttachCamera(scene));
        if !self.scenes.contains(&scene) {
            self.violation(format!("camera {:?} attached in unknown scene {:?}", camera, scene));
        }
        if !self.attached.is_empty() {
            self.violation(format!(
                "camera of {:?} attached while {:?} still attached",
                scene, self.attached
            ));
        }
        self.attached.push(scene);
    }

    fn detach_camera(&mut self, scene: SceneHandle, camera: NodeId) {
        self.journal.push(BackendCall::DetachCamera(scene));
        if !self.attached.contains(&scene) {
            self.violation(format!("camera {:?} of {:?} detached twice", camera, scene));
        }
        self.attached.retain(|&s| s != scene);
    }

    fn show_loading_curtain(&mut self) {
        self.journal.push(BackendCall::ShowCurtain);
        self.curtain = true;
    }

    fn hide_loading_curtain(&mut self) {
        self.journal.push(BackendCall::HideCurtain);
        self.curtain = false;
    }

    fn create_shadow_generator(&mut self, scene: SceneHandle) -> ShadowGeneratorHandle {
        self.journal.push(BackendCall::CreateShadowGenerator(scene));
        ShadowGeneratorHandle::new(self.next_raw())
    }

    fn add_shadow_caster(&mut self, _generator: ShadowGeneratorHandle, mesh: MeshHandle) {
        self.journal.push(BackendCall::AddShadowCaster(mesh));
    }

    fn set_debug_layer(&mut self, visible: bool) {
        self.journal.push(BackendCall::DebugLayer(visible));
        self.debug_layer = visible;
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.journal.push(BackendCall::Resize { width, height });
        self.surface = Some((width, height));
    }

    fn end_frame(&mut self) {
        self.frame += 1;

        if let LoadPolicy::AfterFrames(delay) = self.policy {
            let frame = self.frame;
            let (due, waiting): (Vec<_>, Vec<_>) = self
                .loads
                .drain(..)
                .partition(|load| frame >= load.issued_at + delay);
            self.loads = waiting.into();
            for load in due {
                self.complete(load);
            }
        }
    }
}

//=== UiBackend ===========================================================

impl UiBackend for HeadlessBackend {
    fn create_fullscreen_overlay(&mut self, scene: SceneHandle) -> OverlayHandle {
        let overlay = OverlayHandle::new(self.next_raw());
        self.overlays.insert(overlay, scene);
        self.journal.push(BackendCall::CreateOverlay(overlay));
        overlay
    }

    fn create_button(&mut self, overlay: OverlayHandle, label: &str, style: ButtonStyle) -> ButtonHandle {
        if !self.overlays.contains_key(&overlay) {
            self.violation(format!("button {:?} created on unknown overlay {:?}", label, overlay));
        }
        let button = ButtonHandle::new(self.next_raw());
        self.buttons.insert(
            button,
            Button {
                overlay,
                label: label.to_string(),
            },
        );
        self.journal.push(BackendCall::CreateButton {
            label: label.to_string(),
            style,
        });
        button
    }

    fn subscribe(&mut self, button: ButtonHandle, sink: ControlSink) -> Subscription {
        let subscription = Subscription::new(self.next_raw());
        self.subscriptions.insert(subscription, (button, sink));
        self.journal.push(BackendCall::Subscribe(subscription));
        subscription
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.journal.push(BackendCall::Unsubscribe(subscription));
        if self.subscriptions.remove(&subscription).is_none() {
            self.violation(format!("unknown subscription {:?} removed", subscription));
        }
    }

    fn dispose_overlay(&mut self, overlay: OverlayHandle) {
        self.journal.push(BackendCall::DisposeOverlay(overlay));
        if self.overlays.remove(&overlay).is_none() {
            self.violation(format!("unknown overlay {:?} disposed", overlay));
        }

        let buttons: Vec<ButtonHandle> = self
            .buttons
            .iter()
            .filter(|(_, b)| b.overlay == overlay)
            .map(|(&handle, _)| handle)
            .collect();
        for handle in buttons {
            self.buttons.remove(&handle);
        }

        let before = self.subscriptions.len();
        self.subscriptions.retain(|_, entry| self.buttons.contains_key(&entry.0));
        if self.subscriptions.len() != before {
            self.violation(format!("overlay {:?} disposed with live subscriptions", overlay));
        }
    }

    /// Enter clicks the most recently subscribed button.
    fn handle_input(&mut self, event: &InputEvent) {
        if !event.is_key_down(KeyCode::Enter, Modifiers::NONE) {
            return;
        }
        let focused = self
            .subscriptions
            .values()
            .next_back()
            .and_then(|(button, _)| self.buttons.get(button))
            .map(|button| button.label.clone());

        if let Some(label) = focused {
            debug!(target: "headless", "Enter activates {:?}", label);
            self.press(&label);
        }
    }
}

//=== AssetBackend ========================================================

impl AssetBackend for HeadlessBackend {
    fn load_environment(&mut self, scene: SceneHandle) -> ReadySignal<()> {
        let (resolver, signal) = self.issue(LoadKind::Environment, scene);
        self.enqueue(LoadKind::Environment, scene, LoadResolver::Unit(resolver));
        signal
    }

    fn load_character_assets(&mut self, scene: SceneHandle) -> ReadySignal<CharacterAssets> {
        let assets = CharacterAssets {
            outer: MeshHandle::new(self.next_raw()),
            body: MeshHandle::new(self.next_raw()),
            visor: MeshHandle::new(self.next_raw()),
        };
        let (resolver, signal) = self.issue(LoadKind::Character, scene);
        self.enqueue(LoadKind::Character, scene, LoadResolver::Character(resolver, assets));
        signal
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::task::Poll;

    use crate::core::bridge::{ContextId, Control, ControlCollector};

    #[test]
    fn manual_loads_wait_for_driver() {
        let mut backend = HeadlessBackend::manual();
        let scene = backend.create_scene();
        let mut ready = backend.when_ready(scene);

        backend.end_frame();
        assert_eq!(ready.poll(), Poll::Pending);

        assert_eq!(backend.resolve_pending(), 1);
        assert_eq!(ready.poll(), Poll::Ready(Ok(())));
    }

    #[test]
    fn timed_loads_resolve_after_delay() {
        let mut backend = HeadlessBackend::with_policy(LoadPolicy::AfterFrames(2));
        let scene = backend.create_scene();
        let mut ready = backend.when_ready(scene);

        backend.end_frame();
        assert_eq!(ready.poll(), Poll::Pending);
        backend.end_frame();
        assert_eq!(ready.poll(), Poll::Ready(Ok(())));
    }

    #[test]
    fn resolve_kind_picks_oldest_of_kind() {
        let mut backend = HeadlessBackend::manual();
        let scene = backend.create_scene();
        let mut environment = backend.load_environment(scene);
        let _character = backend.load_character_assets(scene);

        assert!(backend.resolve_kind(LoadKind::Environment));
        assert!(!backend.resolve_kind(LoadKind::Environment));

        assert_eq!(environment.poll(), Poll::Ready(Ok(())));
        assert_eq!(backend.pending_loads(), vec![LoadKind::Character]);
    }

    #[test]
    fn disposing_a_scene_cancels_its_loads() {
        let mut backend = HeadlessBackend::manual();
        let scene = backend.create_scene();
        let mut ready = backend.when_ready(scene);

        backend.dispose_scene(scene);

        assert!(backend.pending_loads().is_empty());
        assert!(matches!(ready.poll(), Poll::Ready(Err(_))));
    }

    #[test]
    fn rendering_detached_scene_is_a_violation() {
        let mut backend = HeadlessBackend::manual();
        let scene = backend.create_scene();
        let view = FrameView {
            eye: glam::Vec3::ZERO,
            target: glam::Vec3::NEG_Z,
            fov: 0.8,
        };

        backend.render_frame(scene, &view);

        assert_eq!(backend.violations().len(), 1);
    }

    #[test]
    fn press_and_enter_reach_the_sink() {
        let mut backend = HeadlessBackend::manual();
        let mut collector = ControlCollector::new(8);
        let scene = backend.create_scene();
        let overlay = backend.create_fullscreen_overlay(scene);
        let button = backend.create_button(overlay, "Play", ButtonStyle::Centered);
        backend.subscribe(button, collector.sink(ContextId(0), Control::Play));

        assert!(backend.press("Play"));
        assert!(!backend.press("Next"));
        backend.handle_input(&InputEvent::KeyDown {
            key: KeyCode::Enter,
            modifiers: Modifiers::NONE,
        });

        assert_eq!(collector.collect_frame().len(), 2);
        assert_eq!(backend.live_buttons(), vec!["Play"]);
    }
}
