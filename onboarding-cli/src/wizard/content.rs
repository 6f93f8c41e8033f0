//! Course content for the onboarding wizard
//!
//! A course is an ordered, immutable list of blocks. The index of a block is
//! the wizard step it is shown at. The default course is embedded in the
//! binary; a different one can be loaded from a TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::Field;

/// Course shipped with the binary
const DEFAULT_COURSE: &str = include_str!("../../content/course.toml");

/// Greeting marker substituted with a personalized greeting when no other is configured
const DEFAULT_GREETING: &str = "Great!";

/// Glyph shown when a block has neither a loadable image nor a placeholder
const FALLBACK_PLACEHOLDER: &str = "🖼️";

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("course has no blocks")]
    Empty,
    #[error("failed to read course file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse course: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Action a button triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    SubmitName,
    SubmitTown,
    Next,
    Prev,
    StartLesson,
    Settings,
}

impl ActionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmitName => "submit_name",
            Self::SubmitTown => "submit_town",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::StartLesson => "start_lesson",
            Self::Settings => "settings",
        }
    }

    /// Field persisted by this action, if it is a submit action
    pub fn submitted_field(&self) -> Option<Field> {
        match self {
            Self::SubmitName => Some(Field::Name),
            Self::SubmitTown => Some(Field::Town),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of interaction a block carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    NameInput,
    TownInput,
    #[default]
    Plain,
}

impl BlockKind {
    /// The draft field edited on blocks of this kind
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::NameInput => Some(Field::Name),
            Self::TownInput => Some(Field::Town),
            Self::Plain => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub action: ActionId,
}

/// One page of the wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl Block {
    /// Image URL, only when it points at a remote resource
    pub fn remote_image(&self) -> Option<&str> {
        self.image.as_deref().filter(|url| url.starts_with("http"))
    }

    pub fn placeholder_glyph(&self) -> &str {
        self.placeholder.as_deref().unwrap_or(FALLBACK_PLACEHOLDER)
    }

    /// Action of the first button, triggered by Enter on input blocks
    pub fn primary_action(&self) -> Option<ActionId> {
        self.buttons.first().map(|b| b.action)
    }
}

#[derive(Debug, Deserialize)]
struct CourseFile {
    #[serde(default)]
    greeting: Option<String>,
    #[serde(default)]
    blocks: Vec<Block>,
}

/// Ordered, non-empty block sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    greeting: String,
    blocks: Vec<Block>,
}

impl Course {
    pub fn new(blocks: Vec<Block>) -> Result<Self, CourseError> {
        if blocks.is_empty() {
            return Err(CourseError::Empty);
        }
        Ok(Self {
            greeting: DEFAULT_GREETING.to_string(),
            blocks,
        })
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// The course embedded in the binary
    pub fn builtin() -> Result<Self, CourseError> {
        Self::from_toml(DEFAULT_COURSE)
    }

    pub fn from_toml(source: &str) -> Result<Self, CourseError> {
        let file: CourseFile = toml::from_str(source)?;
        let course = Self::new(file.blocks)?;
        Ok(match file.greeting {
            Some(greeting) => course.with_greeting(greeting),
            None => course,
        })
    }

    pub fn load(path: &Path) -> Result<Self, CourseError> {
        let source = std::fs::read_to_string(path).map_err(|source| CourseError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&source)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Index of the last block
    pub fn last_index(&self) -> usize {
        self.blocks.len() - 1
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Title of the block at `index`, personalized with the user's name.
    ///
    /// The first block is never personalized; later blocks replace the
    /// greeting marker ("Great!") with "Great, <name>!".
    pub fn display_title(&self, index: usize, name: &str) -> String {
        let title = &self.blocks[index].title;
        if index == 0 || name.is_empty() {
            return title.clone();
        }
        personalize(title, &self.greeting, name)
    }
}

fn personalize(title: &str, greeting: &str, name: &str) -> String {
    if greeting.is_empty() {
        return title.to_string();
    }
    let stem = greeting.trim_end_matches('!');
    title.replacen(greeting, &format!("{}, {}!", stem, name), 1)
}
