//! What the kiosk shows, derived from session state alone.

use std::fmt;

use crate::camera::CameraStatus;
use crate::photo::CaptureSource;
use crate::router::Screen;
use crate::session::SessionState;

/// One character card on the selection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterCard {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Summary of the captured photo for the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub source: CaptureSource,
    pub mime: &'static str,
    pub encoded_len: usize,
}

/// A rendering-agnostic snapshot of the visible UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub screen: Screen,
    pub capture_enabled: bool,
    pub camera_error: Option<String>,
    pub preview: Option<Preview>,
    pub cards: Vec<CharacterCard>,
    pub loading_text: Option<&'static str>,
    pub result_url: Option<String>,
}

impl View {
    /// Project the session. Only the active screen's fields are filled in.
    pub fn project(state: &SessionState) -> Self {
        let screen = state.screen();
        let selection = state.selection();

        let camera_error = match state.camera() {
            CameraStatus::Unavailable { message } if screen == Screen::Camera => {
                Some(message.clone())
            }
            _ => None,
        };

        let preview = match screen {
            Screen::Character | Screen::Processing | Screen::Result => {
                state.captured().map(|capture| Preview {
                    source: capture.source(),
                    mime: capture.mime(),
                    encoded_len: capture.data_uri().len(),
                })
            }
            Screen::Camera => None,
        };

        let cards = if screen == Screen::Character {
            selection
                .catalog()
                .iter()
                .map(|character| CharacterCard {
                    id: character.id.to_string(),
                    name: character.name.clone(),
                    selected: selection.is_marked(&character.id),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            screen,
            capture_enabled: screen == Screen::Camera && state.camera().capture_enabled(),
            camera_error,
            preview,
            cards,
            loading_text: (screen == Screen::Processing)
                .then(|| state.loading_text())
                .flatten(),
            result_url: (screen == Screen::Result)
                .then(|| state.result_url().map(str::to_string))
                .flatten(),
        }
    }

    pub fn selected_card(&self) -> Option<&CharacterCard> {
        self.cards.iter().find(|card| card.selected)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.screen)?;

        match self.screen {
            Screen::Camera => {
                if let Some(error) = &self.camera_error {
                    writeln!(f, "Camera unavailable: {}", error)?;
                } else if self.capture_enabled {
                    writeln!(f, "Camera live. Type `capture` to take a photo.")?;
                } else {
                    writeln!(f, "Starting camera...")?;
                }
                write!(f, "Type `upload <path>` to use a photo from disk.")
            }
            Screen::Character => {
                if let Some(preview) = &self.preview {
                    writeln!(
                        f,
                        "Photo: {} from {:?} ({} bytes)",
                        preview.mime, preview.source, preview.encoded_len
                    )?;
                }
                for card in &self.cards {
                    let marker = if card.selected { "*" } else { " " };
                    writeln!(f, " [{}] {:<28} {}", marker, card.name, card.id)?;
                }
                write!(f, "Type `select <id>` to choose, or `retake`.")
            }
            Screen::Processing => write!(f, "{}", self.loading_text.unwrap_or_default()),
            Screen::Result => {
                if let Some(url) = &self.result_url {
                    writeln!(f, "Your photo is ready: {}", url)?;
                }
                write!(f, "Type `print` to print it, or `retake` to start over.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::Capture;
    use crate::selection::{Catalog, SelectionController, DEFAULT_DEBOUNCE};
    use crate::session::{reduce, Event};

    fn fresh() -> SessionState {
        SessionState::new(SelectionController::new(Catalog::default(), DEFAULT_DEBOUNCE))
    }

    #[test]
    fn test_camera_screen_disabled_until_ready() {
        let view = View::project(&fresh());
        assert_eq!(view.screen, Screen::Camera);
        assert!(!view.capture_enabled);
        assert!(view.cards.is_empty());

        let (ready, _) = reduce(&fresh(), Event::CameraInitialized(CameraStatus::Ready));
        assert!(View::project(&ready).capture_enabled);
    }

    #[test]
    fn test_camera_error_is_shown() {
        let (state, _) = reduce(
            &fresh(),
            Event::CameraInitialized(CameraStatus::Unavailable {
                message: "No camera found on this device.".to_string(),
            }),
        );
        let view = View::project(&state);
        assert!(!view.capture_enabled);
        assert_eq!(
            view.camera_error.as_deref(),
            Some("No camera found on this device.")
        );
        assert!(view.to_string().contains("Camera unavailable"));
    }

    #[test]
    fn test_character_screen_marks_exactly_one_card() {
        let capture = Capture::from_bytes("image/png", &[1, 2], CaptureSource::Upload);
        let (state, _) = reduce(&fresh(), Event::PhotoCaptured(capture));
        let (state, _) = reduce(&state, Event::CharacterSelected("superman".to_string()));
        let (state, _) = reduce(&state, Event::CharacterSelected("spiderman".to_string()));

        let view = View::project(&state);
        assert_eq!(view.cards.len(), Catalog::default().len());
        assert_eq!(view.cards.iter().filter(|c| c.selected).count(), 1);
        assert_eq!(view.selected_card().unwrap().id, "spiderman");
        assert_eq!(view.preview.as_ref().unwrap().source, CaptureSource::Upload);
    }
}
