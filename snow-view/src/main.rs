//! Application entry point for the snow-crystal viewer.
//!
//! This binary sets up logging and eframe/egui and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use snow_core::Config;
use viewer::Viewer;

/// Starts the native eframe application.
///
/// Logging goes through `env_logger`, so `RUST_LOG=debug` shows one line
/// per generation.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if the default configuration is rejected or eframe fails to
///   create the native window or event loop.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let viewer = Viewer::new(Config::default())?;
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Snow Crystal",
        options,
        Box::new(move |_cc| Ok(Box::new(viewer))),
    )?;

    log::info!("viewer closed");
    Ok(())
}
