//! Screen router: which of the four kiosk screens is visible.

use std::fmt;

/// One of the four mutually exclusive kiosk screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Camera,
    Character,
    Processing,
    Result,
}

impl Screen {
    pub const ALL: [Screen; 4] = [
        Screen::Camera,
        Screen::Character,
        Screen::Processing,
        Screen::Result,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Camera => "camera",
            Screen::Character => "character",
            Screen::Processing => "processing",
            Screen::Result => "result",
        }
    }

    fn index(self) -> usize {
        match self {
            Screen::Camera => 0,
            Screen::Character => 1,
            Screen::Processing => 2,
            Screen::Result => 3,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("invalid screen transition from {from} to {to}")]
    InvalidTransition { from: Screen, to: Screen },
}

/// Transition table. Switching to the current screen is always allowed.
pub fn can_transition(from: Screen, to: Screen) -> bool {
    use Screen::*;

    from == to
        || matches!(
            (from, to),
            (Camera, Character)
                | (Character, Processing)
                | (Processing, Result)
                | (Processing, Character)
                | (Character | Processing | Result, Camera)
        )
}

/// Visibility toggle over the four screens. Exactly one is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenRouter {
    current: Screen,
    visible: [bool; 4],
}

impl Default for ScreenRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenRouter {
    /// Router showing the camera screen.
    pub fn new() -> Self {
        let mut visible = [false; 4];
        visible[Screen::Camera.index()] = true;
        Self {
            current: Screen::Camera,
            visible,
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn is_visible(&self, screen: Screen) -> bool {
        self.visible[screen.index()]
    }

    pub fn visible_screens(&self) -> Vec<Screen> {
        Screen::ALL
            .into_iter()
            .filter(|s| self.is_visible(*s))
            .collect()
    }

    /// Show `to` and hide everything else.
    ///
    /// Returns `Ok(false)` when `to` is already showing (no observable change).
    pub fn switch_to(&mut self, to: Screen) -> Result<bool, RouterError> {
        let from = self.current;
        if !can_transition(from, to) {
            return Err(RouterError::InvalidTransition { from, to });
        }
        if from == to {
            return Ok(false);
        }

        self.visible = [false; 4];
        self.visible[to.index()] = true;
        self.current = to;
        log::debug!("Screen: {} -> {}", from, to);
        Ok(true)
    }
}
