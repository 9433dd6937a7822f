//=========================================================================
// Stagehand Demo
//
// Runs the full Start → Cutscene → Game → Lose cycle in a window on top
// of the headless backend. Loads complete on their own after a short
// delay; buttons are activated with Enter.
//
// Set RUST_LOG=debug for transition details.
//
//=========================================================================

use log::{error, info};
use stagehand::{HeadlessBackend, LoadPolicy, Platform, StageBuilder};

/// Frames a simulated load takes to complete (half a second at 60 Hz).
const LOAD_DELAY_FRAMES: u64 = 30;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let backend = HeadlessBackend::with_policy(LoadPolicy::AfterFrames(LOAD_DELAY_FRAMES));
    let stage = StageBuilder::new().build(backend);

    info!("Press Enter to activate the on-screen control, Shift+Ctrl+Alt+I for diagnostics");

    if let Err(e) = Platform::new(stage).run() {
        error!("Platform error: {}", e);
        std::process::exit(1);
    }
}
