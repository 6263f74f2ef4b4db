//! Portal Runtime
//!
//! Headless entry point for the stereo video demo. Loads the config, builds
//! the app on the selected XR device, then drives preview frames, an XR
//! session and the frames after it, logging every video layer transition.
//!
//! Run with: cargo run -p portal_runtime
//!       or: cargo run --bin portal

mod config;
mod driver;
mod scene;

use config::PortalConfig;
use driver::DemoDriver;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PortalConfig::load();
    config.print_summary();

    let driver = match DemoDriver::new(config) {
        Ok(driver) => driver,
        Err(e) => {
            log::error!("Failed to set up the demo: {}", e);
            std::process::exit(1);
        }
    };

    match driver.run() {
        Ok(summary) => summary.log(),
        Err(e) => {
            log::error!("Demo failed: {}", e);
            std::process::exit(1);
        }
    }
}
