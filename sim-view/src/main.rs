//! Application entry point for the particle-life viewer.
//!
//! This binary sets up logging and eframe/egui, then delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use viewer::Viewer;

/// Starts the native eframe application.
///
/// Logging is configured from `RUST_LOG` via `env_logger`. The simulation
/// is built before the window opens so configuration errors surface early.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if the default setup is invalid or eframe fails to create the
///   native window or event loop.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let viewer = Viewer::new()?;
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Particle Life",
        options,
        Box::new(|_cc| Ok(Box::new(viewer))),
    )?;
    Ok(())
}
