//=========================================================================
// Game Pre-build
//=========================================================================
//
// Loads the game scene's environment and character while the cutscene is
// on screen, so entering gameplay only has to assemble the context.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::bridge::{AssetBackend, Awaited, RenderBackend, SceneHandle};
use crate::core::character::CharacterAssets;
use crate::core::error::LoadError;

//=== GamePrebuild ========================================================

/// A game scene whose loads are in progress or finished.
#[derive(Debug)]
pub(crate) struct GamePrebuild {
    scene: SceneHandle,
    environment: Awaited<()>,
    character: Awaited<CharacterAssets>,
}

impl GamePrebuild {
    /// Creates the scene and starts both loads into it.
    pub(crate) fn start<B>(backend: &mut B) -> Self
    where
        B: RenderBackend + AssetBackend + ?Sized,
    {
        let scene = backend.create_scene();
        let environment = Awaited::new(backend.load_environment(scene));
        let character = Awaited::new(backend.load_character_assets(scene));

        debug!(target: "stage::transition", "Game scene {:?} pre-build started", scene);

        Self {
            scene,
            environment,
            character,
        }
    }

    pub(crate) fn scene(&self) -> SceneHandle {
        self.scene
    }

    /// Advances both loads. Returns `Ok(true)` once both have finished.
    pub(crate) fn poll(&mut self) -> Result<bool, LoadError> {
        let environment = self.environment.poll()?;
        let character = self.character.poll()?;
        Ok(environment && character)
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.environment.is_done() && self.character.is_done()
    }

    /// Hands over the scene and character assets, or gives the pre-build
    /// back if a load is still pending.
    pub(crate) fn finish(self) -> Result<(SceneHandle, CharacterAssets), Self> {
        match (self.environment, self.character) {
            (Awaited::Done(()), Awaited::Done(assets)) => Ok((self.scene, assets)),
            (environment, character) => Err(Self {
                scene: self.scene,
                environment,
                character,
            }),
        }
    }

    /// Drops both loads and releases the scene.
    pub(crate) fn discard<R>(self, renderer: &mut R)
    where
        R: RenderBackend + ?Sized,
    {
        renderer.dispose_scene(self.scene);
        debug!(target: "stage::transition", "Game scene {:?} pre-build discarded", self.scene);
    }
}
