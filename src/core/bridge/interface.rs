//=========================================================================
// Backend Interface
//=========================================================================
//
// The contract between the core and the external rendering engine, UI
// toolkit and asset loaders.
//
// The core never draws, lays out widgets or reads files. It asks a
// backend for opaque handles and ready signals, and hands the handles
// back when a scene context is disposed.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::control::ControlSink;
use super::ready::ReadySignal;
use crate::core::character::CharacterAssets;
use crate::core::graph::{FrameView, NodeId};
use crate::core::input::InputEvent;

//=== Handles =============================================================

macro_rules! backend_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a backend-issued id.
            pub fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

backend_handle!(
    /// A renderable scene owned by the render backend.
    SceneHandle
);
backend_handle!(
    /// A mesh owned by the render backend.
    MeshHandle
);
backend_handle!(
    /// A shadow-generating light.
    ShadowGeneratorHandle
);
backend_handle!(
    /// A fullscreen UI layer bound to one scene.
    OverlayHandle
);
backend_handle!(
    /// A clickable control inside an overlay.
    ButtonHandle
);
backend_handle!(
    /// A live press subscription on a button.
    Subscription
);

//=== ButtonStyle =========================================================

/// Placement/look of a control; interpretation is up to the UI backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonStyle {
    /// Large button centred near the bottom of the screen.
    Centered,

    /// Small button pinned to the top-right corner.
    Corner,
}

//=== RenderBackend =======================================================

/// Scene lifecycle and frame submission.
pub trait RenderBackend {
    /// Creates an empty scene.
    fn create_scene(&mut self) -> SceneHandle;

    /// Releases a scene and everything the backend built inside it.
    fn dispose_scene(&mut self, scene: SceneHandle);

    /// Signal that fires once the scene is safe to render.
    fn when_ready(&mut self, scene: SceneHandle) -> ReadySignal<()>;

    /// Renders one frame of `scene` from `view`.
    fn render_frame(&mut self, scene: SceneHandle, view: &FrameView);

    /// Connects a scene's camera to the canvas and input devices.
    fn attach_camera(&mut self, scene: SceneHandle, camera: NodeId);

    /// Disconnects a scene's camera from the canvas and input devices.
    fn detach_camera(&mut self, scene: SceneHandle, camera: NodeId);

    fn show_loading_curtain(&mut self);

    fn hide_loading_curtain(&mut self);

    /// Creates the shadow-casting light of a scene.
    fn create_shadow_generator(&mut self, scene: SceneHandle) -> ShadowGeneratorHandle;

    /// Registers `mesh` as a caster for `generator`.
    fn add_shadow_caster(&mut self, generator: ShadowGeneratorHandle, mesh: MeshHandle);

    /// Shows or hides the diagnostics layer.
    fn set_debug_layer(&mut self, visible: bool);

    /// The output surface changed size.
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Called once at the end of every frame, rendered or not.
    fn end_frame(&mut self) {}
}

//=== UiBackend ===========================================================

/// Fullscreen overlays and buttons.
pub trait UiBackend {
    fn create_fullscreen_overlay(&mut self, scene: SceneHandle) -> OverlayHandle;

    fn create_button(&mut self, overlay: OverlayHandle, label: &str, style: ButtonStyle) -> ButtonHandle;

    /// Routes presses of `button` into `sink` until unsubscribed.
    fn subscribe(&mut self, button: ButtonHandle, sink: ControlSink) -> Subscription;

    fn unsubscribe(&mut self, subscription: Subscription);

    /// Releases an overlay and its buttons.
    fn dispose_overlay(&mut self, overlay: OverlayHandle);

    /// Keyboard input forwarded by the platform, e.g. Enter to activate
    /// the focused button.
    fn handle_input(&mut self, _event: &InputEvent) {}
}

//=== AssetBackend ========================================================

/// Environment and character loaders.
pub trait AssetBackend {
    /// Builds the level geometry into `scene`.
    fn load_environment(&mut self, scene: SceneHandle) -> ReadySignal<()>;

    /// Builds the character meshes into `scene`.
    fn load_character_assets(&mut self, scene: SceneHandle) -> ReadySignal<CharacterAssets>;
}

//=== Backend =============================================================

/// Everything the state machine needs from the outside world.
pub trait Backend: RenderBackend + UiBackend + AssetBackend {}

impl<T: RenderBackend + UiBackend + AssetBackend> Backend for T {}
