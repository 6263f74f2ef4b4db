//! Headless demo driver
//!
//! Plays the host page's part: sets up the preview, presses the entry
//! button, runs the frame callback at the configured rate, ends the session
//! and reports what the video layer and session did along the way.

use std::sync::Arc;

use serde_json::{json, Value};

use portal_presenter::{FrameReport, PortalApp, SessionError, SessionResult, SetupPhase};
use portal_render::HeadlessEngine;
use portal_video::{Representation, VideoElement, VideoLayerError};
use portal_xr::{
    DeviceProfile, EmulatedXrDevice, EmulatorSettings, GamepadButton, Hand, SessionId, XrPlatform,
};

use crate::config::PortalConfig;
use crate::scene::DemoScene;

/// Frames allowed for the end-session gesture before ending directly
const GESTURE_FRAMES: u32 = 8;

/// What a demo run did
#[derive(Debug, Clone, Default)]
pub struct DemoSummary {
    pub frames: u64,
    pub sessions: u32,
    /// The configured device could not start a session and the stock
    /// emulator was installed
    pub fell_back_to_emulator: bool,
    pub ended_by_gesture: bool,
    pub outbound_messages: usize,
    pub video_refreshes: usize,
    pub final_representation: Option<Representation>,
    /// Human readable log of representation, setup and session changes
    pub transitions: Vec<String>,
}

impl DemoSummary {
    pub fn log(&self) {
        log::info!("=== Demo Summary ===");
        log::info!("  Frames: {}", self.frames);
        log::info!("  Sessions: {}", self.sessions);
        log::info!("  Emulator fallback: {}", self.fell_back_to_emulator);
        log::info!("  Ended by gesture: {}", self.ended_by_gesture);
        log::info!("  Video refreshes: {}", self.video_refreshes);
        log::info!("  Outbound messages: {}", self.outbound_messages);
        log::info!("  Final representation: {:?}", self.final_representation);
        for (i, transition) in self.transitions.iter().enumerate() {
            log::info!("  [{}] {}", i, transition);
        }
        log::info!("====================");
    }
}

/// The stock device installed when nothing else can start a session
fn stock_emulator() -> EmulatedXrDevice {
    EmulatedXrDevice::new(DeviceProfile::meta_quest_3(), EmulatorSettings::default())
}

/// Pick the XR device for the run
pub fn select_platform(config: &PortalConfig) -> EmulatedXrDevice {
    if config.xr.force_emulation {
        log::info!("Emulation forced by config");
        stock_emulator()
    } else {
        EmulatedXrDevice::from_settings(config.emulator.clone())
    }
}

pub struct DemoDriver {
    config: PortalConfig,
    app: PortalApp<EmulatedXrDevice, HeadlessEngine>,
    frame: u64,
    last_representation: Option<Representation>,
    last_phase: Option<SetupPhase>,
    summary: DemoSummary,
}

impl DemoDriver {
    pub fn new(config: PortalConfig) -> SessionResult<Self> {
        config.video.validate()?;

        let mut engine = HeadlessEngine::new();
        let mut scene = DemoScene::new();
        scene
            .install(&mut engine)
            .map_err(VideoLayerError::from)?;

        let video = Arc::new(VideoElement::new(
            config.demo.video_url.clone(),
            config.video.video_width,
            config.video.video_height,
        ));

        let app = PortalApp::new(
            select_platform(&config),
            engine,
            video,
            config.video.clone(),
            config.xr.enable_layers,
            Box::new(scene),
        )?;

        let mut driver = Self {
            config,
            app,
            frame: 0,
            last_representation: None,
            last_phase: None,
            summary: DemoSummary::default(),
        };
        driver.observe_representation();
        Ok(driver)
    }

    /// Run the whole demo
    pub fn run(mut self) -> SessionResult<DemoSummary> {
        let demo = self.config.demo.clone();

        log::info!("Preview: {} frames", demo.preview_frames);
        self.frames(demo.preview_frames);

        let session = self.enter()?;
        self.step(Some(json!({
            "event": "session-started",
            "session": format!("{:?}", session),
        })));
        self.frames(demo.xr_frames.saturating_sub(1));

        if self.app.lifecycle().session().is_some() {
            if demo.end_via_gesture {
                self.end_with_gesture();
            }
            if self.app.lifecycle().session().is_some() {
                let now = self.config.demo.timestamp(self.frame);
                if let Some(reason) = self.app.end_session(now)? {
                    self.record(format!("session ended ({:?})", reason));
                }
                self.observe_representation();
            }
        }

        log::info!("Post-session: {} frames", demo.post_session_frames);
        self.frames(demo.post_session_frames);

        self.summary.final_representation = self.app.video().active();
        Ok(self.summary)
    }

    /// Press the entry button, falling back to the stock emulator when the
    /// configured device cannot start a session
    pub fn enter(&mut self) -> SessionResult<SessionId> {
        let session = match pollster::block_on(self.app.enter_xr()) {
            Ok(session) => session,
            Err(SessionError::SessionUnavailable(reason)) => {
                log::warn!(
                    "{} cannot start a session ({}), installing emulated device",
                    self.app.platform().name(),
                    reason
                );
                self.app.replace_platform(stock_emulator())?;
                self.summary.fell_back_to_emulator = true;
                self.record("installed emulated XR device".to_string());
                pollster::block_on(self.app.enter_xr())?
            }
            Err(e) => return Err(e),
        };

        self.summary.sessions += 1;
        let mode = self
            .app
            .lifecycle()
            .session()
            .map(|s| s.mode().to_string())
            .unwrap_or_default();
        self.record(format!("session {:?} started ({})", session, mode));
        Ok(session)
    }

    /// Right B, release, right A
    fn end_with_gesture(&mut self) {
        let presses = [
            (GamepadButton::Button2, true),
            (GamepadButton::Button2, false),
            (GamepadButton::Button1, true),
            (GamepadButton::Button1, false),
        ];
        for (button, pressed) in presses {
            self.app.platform_mut().set_button(Hand::Right, button, pressed);
            self.step(None);
            if self.app.lifecycle().session().is_none() {
                self.summary.ended_by_gesture = true;
                return;
            }
        }
        for _ in 0..GESTURE_FRAMES {
            self.step(None);
            if self.app.lifecycle().session().is_none() {
                self.summary.ended_by_gesture = true;
                return;
            }
        }
        log::warn!("End-session gesture did not end the session");
    }

    fn frames(&mut self, count: u32) {
        for _ in 0..count {
            self.step(None);
        }
    }

    fn step(&mut self, inbound: Option<Value>) -> FrameReport {
        let timestamp = self.config.demo.timestamp(self.frame);
        self.frame += 1;
        self.summary.frames = self.frame;

        let report = self.app.render_frame(timestamp, inbound);
        self.observe(&report);
        report
    }

    fn observe(&mut self, report: &FrameReport) {
        if report.setup_phase != self.last_phase {
            if let Some(phase) = report.setup_phase {
                self.record(format!("compositor setup: {:?}", phase));
            }
            self.last_phase = report.setup_phase;
        }
        if let Some(action) = &report.action {
            self.record(format!("action: {}", action));
        }
        if let Some(reason) = report.session_ended {
            self.record(format!("session ended ({:?})", reason));
        }
        if report.video_refreshed {
            self.summary.video_refreshes += 1;
        }
        self.summary.outbound_messages += report.outbound.len();
        self.observe_representation();
    }

    fn observe_representation(&mut self) {
        let active = self.app.video().active();
        if active != self.last_representation {
            self.record(format!("video layer: {:?} -> {:?}", self.last_representation, active));
            self.last_representation = active;
        }
    }

    fn record(&mut self, transition: String) {
        log::debug!("frame {}: {}", self.frame, transition);
        self.summary.transitions.push(transition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> PortalConfig {
        let mut config = PortalConfig::default();
        config.demo.preview_frames = 5;
        config.demo.xr_frames = 30;
        config.demo.post_session_frames = 5;
        config
    }

    fn has(summary: &DemoSummary, needle: &str) -> bool {
        summary.transitions.iter().any(|t| t.contains(needle))
    }

    #[test]
    fn test_gesture_run_promotes_and_restores() {
        let summary = DemoDriver::new(short_config()).unwrap().run().unwrap();

        assert_eq!(summary.sessions, 1);
        assert!(summary.ended_by_gesture);
        assert!(!summary.fell_back_to_emulator);
        assert!(has(&summary, "Some(CompositorLayer)"));
        assert!(has(&summary, "compositor setup: LayersBound"));
        assert!(has(&summary, "End session initiated"));
        assert_eq!(summary.final_representation, Some(Representation::WebGlPlanes));
        assert!(summary.outbound_messages > 0);
    }

    #[test]
    fn test_direct_end_without_layers() {
        let mut config = short_config();
        config.xr.enable_layers = false;
        config.demo.end_via_gesture = false;
        let summary = DemoDriver::new(config).unwrap().run().unwrap();

        assert!(!summary.ended_by_gesture);
        assert!(!has(&summary, "CompositorLayer"));
        assert!(has(&summary, "session ended (User)"));
        assert_eq!(summary.final_representation, Some(Representation::WebGlPlanes));
        assert!(summary.video_refreshes > 0);
    }

    #[test]
    fn test_falls_back_to_emulator() {
        let mut config = short_config();
        config.emulator.supports_vr = false;
        config.emulator.supports_ar = false;
        let summary = DemoDriver::new(config).unwrap().run().unwrap();

        assert!(summary.fell_back_to_emulator);
        assert_eq!(summary.sessions, 1);
        assert!(has(&summary, "installed emulated XR device"));
    }

    #[test]
    fn test_invalid_video_config_rejected() {
        let mut config = short_config();
        config.video.refresh_hz = 0;
        assert!(matches!(
            DemoDriver::new(config),
            Err(SessionError::Layer(VideoLayerError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_force_emulation_ignores_device_settings() {
        let mut config = short_config();
        config.emulator.compositor_binding = false;
        config.xr.force_emulation = true;
        assert!(select_platform(&config).is_compositor_binding_available());
    }
}
