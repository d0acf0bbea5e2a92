//! Kiosk runtime: feeds user commands and async completions through the
//! session reducer and carries out the effects it asks for.
//!
//! Everything runs on one task. The debounce timer, the in-flight swap, the
//! running print job and the progress channel are polled from a single
//! `select!` loop, so state is only ever touched between awaits.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::pin::Pin;

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Sleep;

use crate::camera::{CaptureManager, MediaDevices};
use crate::print::{PrintError, Printer};
use crate::router::Screen;
use crate::selection::{DebounceTicket, SelectionController};
use crate::session::{reduce, Effect, Event, SessionState};
use crate::swap::{
    ResultCache, Sleeper, SwapError, SwapOrchestrator, SwapProgress, SwapService,
    DEFAULT_CACHE_MAX_MB,
};
use crate::view::View;

/// What the visitor can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Capture,
    /// `None` means the picker was dismissed.
    Upload(Option<PathBuf>),
    Select(String),
    Retake,
    Print,
    Quit,
}

/// Where the kiosk draws itself.
pub trait Surface {
    fn render(&mut self, view: &View);

    /// Blocking message the visitor has to see.
    fn alert(&mut self, message: &str);

    /// Non-blocking status line.
    fn notice(&mut self, message: &str) {
        log::info!("{}", message);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KioskError {
    #[error("{0}")]
    Swap(#[from] SwapError),

    #[error("{0}")]
    Print(#[from] PrintError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Async work owned by the run loop.
struct Tasks {
    debounce: Option<(DebounceTicket, Pin<Box<Sleep>>)>,
    swap: Option<LocalBoxFuture<'static, Event>>,
    print: Option<LocalBoxFuture<'static, Result<PathBuf, KioskError>>>,
    progress_tx: UnboundedSender<(u64, SwapProgress)>,
}

enum Input {
    Command(Command),
    Event(Event),
    Printed(Result<PathBuf, KioskError>),
}

/// One print: fetch the result into the cache (once) and spool it.
struct PrintJob<C> {
    service: C,
    cache: ResultCache,
    printer: Printer,
    cache_max_mb: u64,
}

impl<C: SwapService> PrintJob<C> {
    async fn run(self, result_url: String) -> Result<PathBuf, KioskError> {
        let path = match self.cache.get(&result_url) {
            Some(path) => {
                log::info!("Using cached result {}", path.display());
                path
            }
            None => {
                self.cache.ensure_dir_exists()?;
                let dest = self.cache.path_for(&result_url);
                self.service.fetch_result(&result_url, &dest).await?
            }
        };

        self.printer.print(&path).await?;

        if let Err(e) = self.cache.cleanup_if_needed(self.cache_max_mb) {
            log::warn!("Result cache cleanup failed: {}", e);
        }
        Ok(path)
    }
}

pub struct Kiosk<D: MediaDevices, C, S> {
    state: SessionState,
    camera: CaptureManager<D>,
    swapper: SwapOrchestrator<C, S>,
    printer: Printer,
    cache: ResultCache,
    cache_max_mb: u64,
}

impl<D, C, S> Kiosk<D, C, S>
where
    D: MediaDevices,
    C: SwapService + Clone + 'static,
    S: Sleeper + Clone + 'static,
{
    pub fn new(
        camera: CaptureManager<D>,
        swapper: SwapOrchestrator<C, S>,
        selection: SelectionController,
    ) -> Self {
        Self {
            state: SessionState::new(selection),
            camera,
            swapper,
            printer: Printer::default(),
            cache: ResultCache::with_default_dir(),
            cache_max_mb: DEFAULT_CACHE_MAX_MB,
        }
    }

    pub fn with_printer(mut self, printer: Printer) -> Self {
        self.printer = printer;
        self
    }

    pub fn with_cache(mut self, cache: ResultCache, max_size_mb: u64) -> Self {
        self.cache = cache;
        self.cache_max_mb = max_size_mb;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn camera(&self) -> &CaptureManager<D> {
        &self.camera
    }

    /// Run until `Quit` arrives or the command channel closes.
    pub async fn run<U: Surface>(&mut self, mut commands: UnboundedReceiver<Command>, surface: &mut U) {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let mut tasks = Tasks {
            debounce: None,
            swap: None,
            print: None,
            progress_tx,
        };

        self.start(&mut tasks, surface).await;

        loop {
            let input = tokio::select! {
                biased;
                Some((generation, progress)) = progress_rx.recv() => {
                    Input::Event(Event::SwapProgressed { generation, progress })
                }
                event = task_finished(&mut tasks.swap) => Input::Event(event),
                printed = task_finished(&mut tasks.print) => Input::Printed(printed),
                ticket = debounce_elapsed(&mut tasks.debounce) => {
                    Input::Event(Event::DebounceElapsed(ticket))
                }
                command = commands.recv() => match command {
                    Some(Command::Quit) | None => break,
                    Some(command) => Input::Command(command),
                },
            };

            match input {
                Input::Command(command) => self.handle_command(command, &mut tasks, surface).await,
                Input::Event(event) => self.dispatch(event, &mut tasks, surface).await,
                Input::Printed(outcome) => report_print(outcome, surface),
            }
        }

        if let Some(print) = tasks.print.take() {
            surface.notice("Finishing the current print...");
            report_print(print.await, surface);
        }

        if self.camera.release() {
            log::info!("Camera released on shutdown");
        }
    }

    async fn start<U: Surface>(&mut self, tasks: &mut Tasks, surface: &mut U) {
        log::info!("Kiosk starting");
        surface.render(&View::project(&self.state));
        if let Some(event) = self.execute(Effect::InitCamera, tasks, surface).await {
            self.dispatch(event, tasks, surface).await;
        }
    }

    async fn handle_command<U: Surface>(
        &mut self,
        command: Command,
        tasks: &mut Tasks,
        surface: &mut U,
    ) {
        let event = match command {
            Command::Capture => {
                if self.state.screen() != Screen::Camera || !self.state.camera().capture_enabled() {
                    log::warn!("Capture is not available right now");
                    return;
                }
                match self.camera.capture_photo() {
                    Ok(capture) => Event::PhotoCaptured(capture),
                    Err(e) => {
                        log::error!("Capture failed: {}", e);
                        surface.alert(&e.user_message());
                        return;
                    }
                }
            }
            Command::Upload(path) => {
                if self.state.screen() != Screen::Camera {
                    log::warn!("Upload is only available on the camera screen");
                    return;
                }
                match self.camera.handle_file_upload(path.as_deref()) {
                    Ok(Some(capture)) => Event::PhotoCaptured(capture),
                    Ok(None) => return,
                    Err(e) => {
                        log::error!("Upload failed: {}", e);
                        surface.alert(&e.user_message());
                        return;
                    }
                }
            }
            Command::Select(id) => Event::CharacterSelected(id),
            Command::Retake => Event::Retake,
            Command::Print => Event::PrintRequested,
            Command::Quit => return,
        };

        self.dispatch(event, tasks, surface).await;
    }

    /// Reduce `event`, render, and run the resulting effects. Effects that
    /// produce follow-up events are reduced in order before returning.
    async fn dispatch<U: Surface>(&mut self, event: Event, tasks: &mut Tasks, surface: &mut U) {
        let mut events = VecDeque::from([event]);

        while let Some(event) = events.pop_front() {
            let (next, effects) = reduce(&self.state, event);
            self.state = next;
            surface.render(&View::project(&self.state));

            for effect in effects {
                if let Some(follow_up) = self.execute(effect, tasks, surface).await {
                    events.push_back(follow_up);
                }
            }
        }
    }

    async fn execute<U: Surface>(
        &mut self,
        effect: Effect,
        tasks: &mut Tasks,
        surface: &mut U,
    ) -> Option<Event> {
        match effect {
            Effect::InitCamera => {
                let init = self.camera.init_camera().await;
                if let Some(warning) = &init.warning {
                    surface.notice(warning);
                }
                Some(Event::CameraInitialized(init.status))
            }
            Effect::ScheduleSubmit { ticket, delay } => {
                tasks.debounce = Some((ticket, Box::pin(tokio::time::sleep(delay))));
                None
            }
            Effect::StartSwap {
                generation,
                image,
                character,
            } => {
                log::info!("Starting swap {} with {}", generation, character);
                tasks.debounce = None;
                let swapper = self.swapper.clone();
                let progress_tx = tasks.progress_tx.clone();
                let swap = async move {
                    let result = swapper
                        .perform_face_swap(Some(&image), Some(&character), move |progress| {
                            let _ = progress_tx.send((generation, progress));
                        })
                        .await;
                    match result {
                        Ok(result_url) => Event::SwapSucceeded {
                            generation,
                            result_url,
                        },
                        Err(e) => Event::SwapFailed {
                            generation,
                            message: e.to_string(),
                        },
                    }
                };
                tasks.swap = Some(swap.boxed_local());
                None
            }
            Effect::AbandonSwap => {
                if tasks.swap.take().is_some() {
                    log::info!("Abandoned in-flight swap");
                }
                tasks.debounce = None;
                None
            }
            Effect::Alert(message) => {
                surface.alert(&message);
                None
            }
            Effect::Print { result_url } => {
                if tasks.print.is_some() {
                    surface.notice("Already printing, please wait.");
                    return None;
                }
                surface.notice("Sending your photo to the printer...");
                let job = PrintJob {
                    service: self.swapper.service().clone(),
                    cache: self.cache.clone(),
                    printer: self.printer.clone(),
                    cache_max_mb: self.cache_max_mb,
                };
                tasks.print = Some(job.run(result_url).boxed_local());
                None
            }
        }
    }
}

fn report_print<U: Surface>(outcome: Result<PathBuf, KioskError>, surface: &mut U) {
    match outcome {
        Ok(path) => {
            log::info!("Printed {}", path.display());
            surface.notice("Your photo is printing.");
        }
        Err(e) => {
            log::error!("Print failed: {}", e);
            surface.alert(&e.to_string());
        }
    }
}

async fn task_finished<T>(slot: &mut Option<LocalBoxFuture<'static, T>>) -> T {
    let Some(task) = slot.as_mut() else {
        return std::future::pending().await;
    };
    let output = task.await;
    *slot = None;
    output
}

async fn debounce_elapsed(slot: &mut Option<(DebounceTicket, Pin<Box<Sleep>>)>) -> DebounceTicket {
    let Some((ticket, sleep)) = slot.as_mut() else {
        return std::future::pending().await;
    };
    sleep.as_mut().await;
    let ticket = *ticket;
    *slot = None;
    ticket
}
