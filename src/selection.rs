//! Selection controller: the character catalog and the debounced pick.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

/// Delay between a pick and the submission it triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Characters offered when the config does not list any.
pub const DEFAULT_CHARACTERS: &[(&str, &str)] = &[
    ("superman", "Superman"),
    ("batman", "Batman"),
    ("spiderman", "Spider-Man"),
    ("wonderwoman", "Wonder Woman"),
    ("ironman", "Iron Man"),
    ("captainamerica", "Captain America"),
    ("saudi_central_male", "Saudi Central (Male)"),
    ("saudi_traditional_daglah", "Saudi Traditional Daglah"),
];

/// Identifier of a character overlay, as sent to the swap service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One selectable card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
}

/// Fixed, externally defined set of characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    characters: Arc<[Character]>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_CHARACTERS
                .iter()
                .map(|(id, name)| Character {
                    id: CharacterId::new(*id),
                    name: name.to_string(),
                })
                .collect(),
        )
    }
}

impl Catalog {
    pub fn new(characters: Vec<Character>) -> Self {
        Self {
            characters: characters.into(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Unknown character: {0}")]
    UnknownCharacter(String),
}

/// Token tying a scheduled submission to the pick that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket(u64);

/// Tracks the single marked card and the latest debounce ticket.
#[derive(Debug, Clone)]
pub struct SelectionController {
    catalog: Catalog,
    selected: Option<CharacterId>,
    ticket: u64,
    debounce: Duration,
}

impl SelectionController {
    pub fn new(catalog: Catalog, debounce: Duration) -> Self {
        Self {
            catalog,
            selected: None,
            ticket: 0,
            debounce,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selected(&self) -> Option<&CharacterId> {
        self.selected.as_ref()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Whether the card for `id` is currently highlighted.
    pub fn is_marked(&self, id: &CharacterId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    /// Unmark the previous card, mark `id`, and issue a fresh ticket.
    ///
    /// Earlier tickets stop being current, so only the last pick in a burst
    /// ever submits.
    pub fn select_character(&mut self, id: &str) -> Result<DebounceTicket, SelectionError> {
        let character = self
            .catalog
            .get(id)
            .ok_or_else(|| SelectionError::UnknownCharacter(id.to_string()))?;

        self.selected = Some(character.id.clone());
        self.ticket += 1;
        log::info!("Selected character: {}", id);
        Ok(DebounceTicket(self.ticket))
    }

    pub fn is_current(&self, ticket: DebounceTicket) -> bool {
        self.selected.is_some() && ticket.0 == self.ticket
    }

    /// Drop the selection and invalidate any outstanding ticket.
    pub fn clear(&mut self) {
        self.selected = None;
        self.ticket += 1;
    }
}
