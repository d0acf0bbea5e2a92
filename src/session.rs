//! Session state and the pure reducer that drives it.
//!
//! Every user action and every async completion arrives as an [`Event`].
//! [`reduce`] maps `(state, event)` to the next state plus the [`Effect`]s
//! the runtime must carry out. The reducer never does I/O.

use std::time::Duration;

use crate::camera::CameraStatus;
use crate::photo::Capture;
use crate::router::{Screen, ScreenRouter};
use crate::selection::{CharacterId, DebounceTicket, SelectionController};
use crate::swap::{SwapError, SwapJob, SwapProgress};

/// Everything the kiosk knows about the current visitor.
#[derive(Debug, Clone)]
pub struct SessionState {
    router: ScreenRouter,
    captured: Option<Capture>,
    selection: SelectionController,
    job: Option<SwapJob>,
    camera: CameraStatus,
    loading_text: Option<&'static str>,
    generation: u64,
}

impl SessionState {
    pub fn new(selection: SelectionController) -> Self {
        Self {
            router: ScreenRouter::new(),
            captured: None,
            selection,
            job: None,
            camera: CameraStatus::Off,
            loading_text: None,
            generation: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        self.router.current()
    }

    pub fn captured(&self) -> Option<&Capture> {
        self.captured.as_ref()
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selected(&self) -> Option<&CharacterId> {
        self.selection.selected()
    }

    pub fn job(&self) -> Option<&SwapJob> {
        self.job.as_ref()
    }

    pub fn camera(&self) -> &CameraStatus {
        &self.camera
    }

    pub fn loading_text(&self) -> Option<&'static str> {
        self.loading_text
    }

    /// Bumped by every new swap and every retake.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn result_url(&self) -> Option<&str> {
        self.job.as_ref().and_then(SwapJob::result_url)
    }

    /// Whether an event tagged `generation` belongs to the tracked, still
    /// running job.
    fn is_live_job(&self, generation: u64) -> bool {
        self.screen() == Screen::Processing
            && self
                .job
                .as_ref()
                .is_some_and(|job| job.generation() == generation && job.is_pending())
    }

    fn switch_to(&mut self, screen: Screen) -> bool {
        match self.router.switch_to(screen) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }
}

/// Input to the reducer.
#[derive(Debug, Clone)]
pub enum Event {
    /// A camera (re)initialization finished.
    CameraInitialized(CameraStatus),
    /// A snapshot or upload produced a new capture.
    PhotoCaptured(Capture),
    /// The user tapped a character card.
    CharacterSelected(String),
    /// The debounce for a pick ran out.
    DebounceElapsed(DebounceTicket),
    SwapProgressed {
        generation: u64,
        progress: SwapProgress,
    },
    SwapSucceeded {
        generation: u64,
        result_url: String,
    },
    SwapFailed {
        generation: u64,
        message: String,
    },
    Retake,
    PrintRequested,
}

/// Work the runtime performs on behalf of the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Release any stream and acquire the camera again.
    InitCamera,
    /// Fire [`Event::DebounceElapsed`] after `delay`, replacing any earlier
    /// schedule.
    ScheduleSubmit {
        ticket: DebounceTicket,
        delay: Duration,
    },
    /// Run the swap and report back tagged with `generation`.
    StartSwap {
        generation: u64,
        image: Capture,
        character: CharacterId,
    },
    /// Stop tracking any in-flight swap.
    AbandonSwap,
    /// Blocking message for the user.
    Alert(String),
    /// Send the result to the printer.
    Print { result_url: String },
}

/// Alert text for a failed swap.
pub fn swap_failure_alert(message: &str) -> String {
    format!("Sorry, something went wrong: {}\nPlease try again.", message)
}

/// Pure transition function.
pub fn reduce(state: &SessionState, event: Event) -> (SessionState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        Event::CameraInitialized(status) => {
            next.camera = status;
        }

        Event::PhotoCaptured(capture) => {
            if next.screen() == Screen::Camera && next.switch_to(Screen::Character) {
                next.captured = Some(capture);
                next.camera = CameraStatus::Off;
            } else {
                log::warn!("Ignoring capture outside the camera screen");
            }
        }

        Event::CharacterSelected(id) => {
            if next.screen() != Screen::Character {
                log::warn!("Ignoring character pick on the {} screen", next.screen());
            } else {
                match next.selection.select_character(&id) {
                    Ok(ticket) => effects.push(Effect::ScheduleSubmit {
                        ticket,
                        delay: next.selection.debounce(),
                    }),
                    Err(e) => effects.push(Effect::Alert(e.to_string())),
                }
            }
        }

        Event::DebounceElapsed(ticket) => {
            if next.selection.is_current(ticket) && next.screen() == Screen::Character {
                start_swap(&mut next, &mut effects);
            } else {
                log::debug!("Dropping superseded debounce {:?}", ticket);
            }
        }

        Event::SwapProgressed {
            generation,
            progress,
        } => {
            if next.is_live_job(generation) {
                if let (SwapProgress::Submitted { prediction_id }, Some(job)) =
                    (&progress, next.job.as_mut())
                {
                    job.set_prediction_id(prediction_id.clone());
                }
                next.loading_text = Some(progress.message());
            }
        }

        Event::SwapSucceeded {
            generation,
            result_url,
        } => {
            if next.is_live_job(generation) {
                if let Some(job) = next.job.as_mut() {
                    job.succeed(result_url);
                }
                next.switch_to(Screen::Result);
                next.loading_text = None;
            } else {
                log::info!("Ignoring result of superseded swap {}", generation);
            }
        }

        Event::SwapFailed {
            generation,
            message,
        } => {
            if next.is_live_job(generation) {
                log::error!("Face swap error: {}", message);
                if let Some(job) = next.job.as_mut() {
                    job.fail();
                }
                next.job = None;
                next.switch_to(Screen::Character);
                next.loading_text = None;
                effects.push(Effect::Alert(swap_failure_alert(&message)));
            } else {
                log::info!("Ignoring failure of superseded swap {}", generation);
            }
        }

        Event::Retake => {
            next.captured = None;
            next.selection.clear();
            next.job = None;
            next.loading_text = None;
            next.generation += 1;
            next.camera = CameraStatus::Off;
            next.switch_to(Screen::Camera);
            effects.push(Effect::AbandonSwap);
            effects.push(Effect::InitCamera);
        }

        Event::PrintRequested => match next.result_url() {
            Some(url) if next.screen() == Screen::Result => {
                effects.push(Effect::Print {
                    result_url: url.to_string(),
                });
            }
            _ => log::warn!("Nothing to print on the {} screen", next.screen()),
        },
    }

    (next, effects)
}

/// Precondition check and transition into processing.
fn start_swap(next: &mut SessionState, effects: &mut Vec<Effect>) {
    let (Some(image), Some(character)) = (next.captured.clone(), next.selected().cloned()) else {
        effects.push(Effect::Alert(SwapError::MissingInput.to_string()));
        return;
    };

    if !next.switch_to(Screen::Processing) {
        return;
    }

    next.generation += 1;
    next.job = Some(SwapJob::pending(next.generation));
    next.loading_text = Some(SwapProgress::Uploading.message());
    effects.push(Effect::StartSwap {
        generation: next.generation,
        image,
        character,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::CaptureSource;
    use crate::selection::{Catalog, DEFAULT_DEBOUNCE};
    use crate::swap::{JobStatus, ProgressPhase};

    fn fresh() -> SessionState {
        SessionState::new(SelectionController::new(Catalog::default(), DEFAULT_DEBOUNCE))
    }

    fn photo() -> Capture {
        Capture::from_bytes("image/png", &[1, 2, 3], CaptureSource::Camera)
    }

    fn apply(state: SessionState, event: Event) -> (SessionState, Vec<Effect>) {
        reduce(&state, event)
    }

    fn on_character_screen() -> SessionState {
        apply(fresh(), Event::PhotoCaptured(photo())).0
    }

    fn ticket_of(effects: &[Effect]) -> DebounceTicket {
        match effects {
            [Effect::ScheduleSubmit { ticket, .. }] => *ticket,
            other => panic!("expected a single ScheduleSubmit, got {:?}", other),
        }
    }

    fn processing() -> (SessionState, u64) {
        let (state, effects) = apply(
            on_character_screen(),
            Event::CharacterSelected("batman".to_string()),
        );
        let (state, effects) = apply(state, Event::DebounceElapsed(ticket_of(&effects)));
        match effects.as_slice() {
            [Effect::StartSwap { generation, .. }] => (state, *generation),
            other => panic!("expected StartSwap, got {:?}", other),
        }
    }

    #[test]
    fn test_initial_state() {
        let state = fresh();
        assert_eq!(state.screen(), Screen::Camera);
        assert!(state.captured().is_none());
        assert!(state.selected().is_none());
        assert!(state.job().is_none());
        assert_eq!(state.camera(), &CameraStatus::Off);
    }

    #[test]
    fn test_capture_moves_to_character() {
        let state = on_character_screen();
        assert_eq!(state.screen(), Screen::Character);
        assert_eq!(state.captured(), Some(&photo()));
    }

    #[test]
    fn test_capture_ignored_off_camera_screen() {
        let state = on_character_screen();
        let replacement = Capture::from_bytes("image/png", &[9], CaptureSource::Upload);
        let (next, _) = apply(state, Event::PhotoCaptured(replacement));
        assert_eq!(next.captured(), Some(&photo()));
    }

    #[test]
    fn test_selection_schedules_instead_of_submitting() {
        let (state, effects) = apply(
            on_character_screen(),
            Event::CharacterSelected("superman".to_string()),
        );
        assert_eq!(state.screen(), Screen::Character);
        assert!(matches!(
            effects.as_slice(),
            [Effect::ScheduleSubmit { delay, .. }] if *delay == DEFAULT_DEBOUNCE
        ));
    }

    #[test]
    fn test_unknown_character_alerts() {
        let (state, effects) = apply(
            on_character_screen(),
            Event::CharacterSelected("hulk".to_string()),
        );
        assert!(state.selected().is_none());
        assert_eq!(
            effects,
            vec![Effect::Alert("Unknown character: hulk".to_string())]
        );
    }

    #[test]
    fn test_debounce_does_not_stack() {
        let (state, first) = apply(
            on_character_screen(),
            Event::CharacterSelected("superman".to_string()),
        );
        let (state, second) = apply(state, Event::CharacterSelected("batman".to_string()));

        let (state, stale) = apply(state, Event::DebounceElapsed(ticket_of(&first)));
        assert!(stale.is_empty());
        assert_eq!(state.screen(), Screen::Character);

        let (state, effects) = apply(state, Event::DebounceElapsed(ticket_of(&second)));
        assert_eq!(state.screen(), Screen::Processing);
        match effects.as_slice() {
            [Effect::StartSwap { character, .. }] => assert_eq!(character.as_str(), "batman"),
            other => panic!("expected StartSwap, got {:?}", other),
        }

        let (_, again) = apply(state, Event::DebounceElapsed(ticket_of(&second)));
        assert!(again.is_empty());
    }

    #[test]
    fn test_processing_tracks_job_and_progress() {
        let (state, generation) = processing();
        assert_eq!(state.loading_text(), Some("Uploading your photo..."));
        assert!(state.job().unwrap().is_pending());

        let (state, _) = apply(
            state,
            Event::SwapProgressed {
                generation,
                progress: SwapProgress::Submitted {
                    prediction_id: "p-42".to_string(),
                },
            },
        );
        assert_eq!(state.job().unwrap().prediction_id(), Some("p-42"));
        assert_eq!(state.loading_text(), Some("Creating your traditional photo..."));

        let (state, _) = apply(
            state,
            Event::SwapProgressed {
                generation,
                progress: SwapProgress::Polling(ProgressPhase::Analyzing),
            },
        );
        assert_eq!(state.loading_text(), Some("Analyzing your face..."));
    }

    #[test]
    fn test_success_shows_result() {
        let (state, generation) = processing();
        let (state, effects) = apply(
            state,
            Event::SwapSucceeded {
                generation,
                result_url: "https://cdn.example.com/out.png".to_string(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(state.screen(), Screen::Result);
        assert_eq!(state.result_url(), Some("https://cdn.example.com/out.png"));
        assert_eq!(state.job().unwrap().status(), JobStatus::Succeeded);
    }

    #[test]
    fn test_failure_returns_to_character_keeping_photo() {
        let (state, generation) = processing();
        let (state, effects) = apply(
            state,
            Event::SwapFailed {
                generation,
                message: "Generation failed".to_string(),
            },
        );
        assert_eq!(state.screen(), Screen::Character);
        assert_eq!(state.captured(), Some(&photo()));
        assert!(state.job().is_none());
        assert_eq!(
            effects,
            vec![Effect::Alert(
                "Sorry, something went wrong: Generation failed\nPlease try again.".to_string()
            )]
        );
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let (state, generation) = processing();
        let (state, _) = apply(state, Event::Retake);
        let (state, _) = apply(state, Event::PhotoCaptured(photo()));

        let (state, effects) = apply(
            state,
            Event::SwapSucceeded {
                generation,
                result_url: "https://cdn.example.com/stale.png".to_string(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(state.screen(), Screen::Character);
        assert!(state.result_url().is_none());

        let (state, effects) = apply(
            state,
            Event::SwapFailed {
                generation,
                message: "late".to_string(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(state.screen(), Screen::Character);
    }

    #[test]
    fn test_retake_from_every_screen() {
        let (processing_state, generation) = processing();
        let (result_state, _) = apply(
            processing_state.clone(),
            Event::SwapSucceeded {
                generation,
                result_url: "https://cdn.example.com/out.png".to_string(),
            },
        );
        let starts = [
            fresh(),
            on_character_screen(),
            processing_state,
            result_state,
        ];

        for start in starts {
            let before = start.generation();
            let (state, effects) = apply(start, Event::Retake);
            assert_eq!(state.screen(), Screen::Camera);
            assert!(state.captured().is_none());
            assert!(state.selected().is_none());
            assert!(state.job().is_none());
            assert!(state.generation() > before);
            assert_eq!(effects, vec![Effect::AbandonSwap, Effect::InitCamera]);
        }
    }

    #[test]
    fn test_retake_cancels_pending_debounce() {
        let (state, effects) = apply(
            on_character_screen(),
            Event::CharacterSelected("ironman".to_string()),
        );
        let (state, _) = apply(state, Event::Retake);
        let (state, _) = apply(state, Event::PhotoCaptured(photo()));
        let (state, effects) = apply(state, Event::DebounceElapsed(ticket_of(&effects)));
        assert!(effects.is_empty());
        assert_eq!(state.screen(), Screen::Character);
    }

    #[test]
    fn test_print_only_on_result_screen() {
        let (_, effects) = apply(on_character_screen(), Event::PrintRequested);
        assert!(effects.is_empty());

        let (state, generation) = processing();
        let (state, _) = apply(
            state,
            Event::SwapSucceeded {
                generation,
                result_url: "https://cdn.example.com/out.png".to_string(),
            },
        );
        let (_, effects) = apply(state, Event::PrintRequested);
        assert_eq!(
            effects,
            vec![Effect::Print {
                result_url: "https://cdn.example.com/out.png".to_string()
            }]
        );
    }

    #[test]
    fn test_camera_status_is_recorded() {
        let (state, _) = apply(
            fresh(),
            Event::CameraInitialized(CameraStatus::Unavailable {
                message: "No camera found on this device.".to_string(),
            }),
        );
        assert!(!state.camera().capture_enabled());
    }
}
