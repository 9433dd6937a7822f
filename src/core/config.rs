//=========================================================================
// Stage Configuration
//=========================================================================
//
// Values fixed at construction time. Filled in by `StageBuilder`; there
// are no configuration files or command-line flags.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Vec3;

//=== Internal Dependencies ===============================================

use crate::core::camera_rig::RigSettings;
use crate::core::character::InputHandle;

//=== StageConfig =========================================================

/// Construction parameters shared by the state machine and scene factory.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Where the character is placed once the game scene is ready.
    pub spawn_point: Vec3,

    /// Camera rig built for the game scene.
    pub rig: RigSettings,

    /// Capacity of the UI → core control channel.
    pub control_capacity: usize,

    /// Handed to the character on every game entry.
    pub input: Option<InputHandle>,
}

impl StageConfig {
    pub const DEFAULT_SPAWN_POINT: Vec3 = Vec3::new(0.0, 3.0, 0.0);
    pub const DEFAULT_CONTROL_CAPACITY: usize = 32;
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            spawn_point: Self::DEFAULT_SPAWN_POINT,
            rig: RigSettings::default(),
            control_capacity: Self::DEFAULT_CONTROL_CAPACITY,
            input: None,
        }
    }
}
