//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use photobooth_kiosk::camera::{CameraError, Frame, MediaDevices, Resolution, VideoTrack};
use photobooth_kiosk::kiosk::{Command, Surface};
use photobooth_kiosk::photo::Capture;
use photobooth_kiosk::router::Screen;
use photobooth_kiosk::selection::CharacterId;
use photobooth_kiosk::swap::{JobUpdate, Sleeper, SwapError, SwapService};
use photobooth_kiosk::view::View;
use tokio::sync::mpsc::UnboundedSender;

// === Camera ===

/// Counters shared between a fake device and the tracks it hands out.
#[derive(Debug, Default)]
pub struct CameraLog {
    pub opened: Cell<usize>,
    pub started: Cell<usize>,
    pub stopped: Cell<usize>,
}

impl CameraLog {
    /// Tracks opened and not yet stopped.
    pub fn live(&self) -> usize {
        self.opened.get() - self.stopped.get()
    }
}

/// Camera that always opens, or always fails with a fixed error.
pub struct FakeDevices {
    pub log: Rc<CameraLog>,
    failure: Option<fn() -> CameraError>,
}

impl FakeDevices {
    pub fn working() -> Self {
        Self {
            log: Rc::new(CameraLog::default()),
            failure: None,
        }
    }

    pub fn failing(failure: fn() -> CameraError) -> Self {
        Self {
            log: Rc::new(CameraLog::default()),
            failure: Some(failure),
        }
    }
}

impl MediaDevices for FakeDevices {
    type Track = FakeTrack;

    async fn get_user_media(&mut self) -> Result<FakeTrack, CameraError> {
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        self.log.opened.set(self.log.opened.get() + 1);
        Ok(FakeTrack {
            log: Rc::clone(&self.log),
            playing: false,
        })
    }
}

pub struct FakeTrack {
    log: Rc<CameraLog>,
    playing: bool,
}

impl VideoTrack for FakeTrack {
    fn label(&self) -> &str {
        "fake camera"
    }

    fn resolution(&self) -> Option<Resolution> {
        Some(Resolution::new(2, 2))
    }

    fn start_playback(&mut self) -> Result<(), CameraError> {
        self.playing = true;
        self.log.started.set(self.log.started.get() + 1);
        Ok(())
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.playing {
            return Err(CameraError::NoFrame);
        }
        Ok(Frame {
            data: vec![200; Resolution::new(2, 2).rgb_frame_len()],
            width: 2,
            height: 2,
            timestamp: Instant::now(),
        })
    }

    fn stop(&mut self) {
        self.log.stopped.set(self.log.stopped.get() + 1);
    }
}

// === Swap service ===

/// Scripted service. Status replies are consumed in order; once the script
/// runs out every query reports `processing`.
#[derive(Clone, Default)]
pub struct FakeService {
    inner: Rc<FakeServiceState>,
}

#[derive(Default)]
pub struct FakeServiceState {
    pub submissions: RefCell<Vec<(String, String)>>,
    pub status_queries: Cell<usize>,
    pub fetches: RefCell<Vec<String>>,
    submit_error: RefCell<Option<String>>,
    statuses: RefCell<VecDeque<Result<JobUpdate, ()>>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FakeServiceState {
        &self.inner
    }

    pub fn reject_submit(self, message: &str) -> Self {
        *self.inner.submit_error.borrow_mut() = Some(message.to_string());
        self
    }

    pub fn then_pending(self, times: usize) -> Self {
        for _ in 0..times {
            self.inner.statuses.borrow_mut().push_back(Ok(JobUpdate::Pending {
                status: "processing".to_string(),
            }));
        }
        self
    }

    pub fn then_succeed(self, url: &str) -> Self {
        self.inner
            .statuses
            .borrow_mut()
            .push_back(Ok(JobUpdate::Succeeded {
                result_url: url.to_string(),
            }));
        self
    }

    pub fn then_fail(self, error: Option<&str>) -> Self {
        self.inner.statuses.borrow_mut().push_back(Ok(JobUpdate::Failed {
            error: error.map(str::to_string),
        }));
        self
    }

    pub fn then_unreachable(self) -> Self {
        self.inner.statuses.borrow_mut().push_back(Err(()));
        self
    }

    pub fn submitted_characters(&self) -> Vec<String> {
        self.inner
            .submissions
            .borrow()
            .iter()
            .map(|(_, character)| character.clone())
            .collect()
    }
}

impl SwapService for FakeService {
    async fn start_job(&self, image: &Capture, character: &CharacterId) -> Result<String, SwapError> {
        let mut submissions = self.inner.submissions.borrow_mut();
        submissions.push((image.data_uri().to_string(), character.to_string()));
        if let Some(message) = self.inner.submit_error.borrow().clone() {
            return Err(SwapError::Server(message));
        }
        Ok(format!("pred-{}", submissions.len()))
    }

    async fn check_status(&self, _prediction_id: &str) -> Result<JobUpdate, SwapError> {
        self.inner
            .status_queries
            .set(self.inner.status_queries.get() + 1);
        match self.inner.statuses.borrow_mut().pop_front() {
            Some(Ok(update)) => Ok(update),
            Some(Err(())) => Err(SwapError::StatusCheck),
            None => Ok(JobUpdate::Pending {
                status: "processing".to_string(),
            }),
        }
    }

    async fn fetch_result(&self, result_url: &str, dest: &Path) -> Result<PathBuf, SwapError> {
        self.inner.fetches.borrow_mut().push(result_url.to_string());
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, b"result image")?;
        Ok(dest.to_path_buf())
    }
}

// === Sleeper ===

/// Returns immediately and records every requested delay.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    pub sleeps: Rc<RefCell<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn count(&self) -> usize {
        self.sleeps.borrow().len()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        tokio::task::yield_now().await;
    }
}

// === Surface ===

/// Records everything the kiosk shows and scripts the visitor's reactions.
pub struct RecordingSurface {
    pub views: Vec<View>,
    pub alerts: Vec<String>,
    pub notices: Vec<String>,
    commands: UnboundedSender<Command>,
    reactions: Vec<Box<dyn FnMut(&View) -> Vec<Command>>>,
    notice_reactions: Vec<(String, VecDeque<Vec<Command>>)>,
    quit_on_alert: bool,
}

impl RecordingSurface {
    pub fn new(commands: UnboundedSender<Command>) -> Self {
        Self {
            views: Vec::new(),
            alerts: Vec::new(),
            notices: Vec::new(),
            commands,
            reactions: Vec::new(),
            notice_reactions: Vec::new(),
            quit_on_alert: false,
        }
    }

    /// Send `commands` the first time `screen` is rendered.
    pub fn on_first(mut self, screen: Screen, commands: Vec<Command>) -> Self {
        let mut pending = Some(commands);
        self.reactions.push(Box::new(move |view| {
            if view.screen == screen {
                pending.take().unwrap_or_default()
            } else {
                Vec::new()
            }
        }));
        self
    }

    /// Each time `notice` is shown, send the next batch of `batches`.
    pub fn on_notice(mut self, notice: &str, batches: Vec<Vec<Command>>) -> Self {
        self.notice_reactions
            .push((notice.to_string(), batches.into_iter().collect()));
        self
    }

    pub fn count_notices(&self, notice: &str) -> usize {
        self.notices.iter().filter(|n| *n == notice).count()
    }

    pub fn quit_on_alert(mut self) -> Self {
        self.quit_on_alert = true;
        self
    }

    pub fn screens(&self) -> Vec<Screen> {
        let mut screens: Vec<Screen> = Vec::new();
        for view in &self.views {
            if screens.last() != Some(&view.screen) {
                screens.push(view.screen);
            }
        }
        screens
    }

    pub fn loading_texts(&self) -> Vec<&'static str> {
        let mut texts: Vec<&'static str> = Vec::new();
        for text in self.views.iter().filter_map(|v| v.loading_text) {
            if texts.last() != Some(&text) {
                texts.push(text);
            }
        }
        texts
    }

    pub fn last_view(&self) -> &View {
        self.views.last().expect("nothing rendered")
    }
}

impl Surface for RecordingSurface {
    fn render(&mut self, view: &View) {
        self.views.push(view.clone());
        for reaction in self.reactions.iter_mut() {
            for command in reaction(view) {
                let _ = self.commands.send(command);
            }
        }
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
        if self.quit_on_alert {
            let _ = self.commands.send(Command::Quit);
        }
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
        for (notice, batches) in self.notice_reactions.iter_mut() {
            if notice == message {
                for command in batches.pop_front().unwrap_or_default() {
                    let _ = self.commands.send(command);
                }
            }
        }
    }
}

/// A small PNG written to a temp dir, for upload tests.
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let image = image::RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]));
    image.save(&path).unwrap();
    path
}
