//! Screen flow as an explicit state machine.
//!
//! The app is always on exactly one screen, and each screen owns the data it
//! shows. Moving between screens is a pure function of the current screen and
//! an event, so the flow can be tested without any UI.
//!
//! ```text
//!   Create --Submit--> Share --Preview--> Experience(preview)
//!     ^                  |  ^                  |
//!     +------Back--------+  +-------Back-------+
//!
//!   any --OpenLink--> Experience(link)   (or Create when the link is bad)
//! ```

use std::fmt;

use thiserror::Error;

use crate::decoder::{decode_with_config, DecoderConfig};
use crate::message::{Message, ValidationError};

/// How the experience screen was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The author is previewing their own wish.
    Preview,
    /// The wish was opened from a share link.
    Link,
}

/// The current screen and its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Authoring, optionally pre-filled with a message being edited.
    Create { draft: Option<Message> },
    /// Showing the share link for a finished message.
    Share { message: Message },
    /// Playing the wish.
    Experience { message: Message, origin: Origin },
}

/// Something the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Finish authoring.
    Submit(Message),
    /// Go back one screen.
    Back,
    /// Preview the wish from the share screen.
    Preview,
    /// Open a share link.
    OpenLink(String),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Event::Submit(_) => "submit",
            Event::Back => "back",
            Event::Preview => "preview",
            Event::OpenLink(_) => "open-link",
        };
        f.write_str(name)
    }
}

/// Errors from screen transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Message cannot be shared: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Event '{event}' does not apply to the {screen} screen")]
    NotApplicable { screen: &'static str, event: String },
}

impl Default for Screen {
    fn default() -> Self {
        Screen::Create { draft: None }
    }
}

impl Screen {
    /// Screen for a page load: the shared wish if the URL carries a valid
    /// one, the authoring screen otherwise.
    pub fn from_location(url: &str, config: &DecoderConfig) -> Self {
        match decode_with_config(url, config) {
            Some(message) => Screen::Experience {
                message,
                origin: Origin::Link,
            },
            None => Screen::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Screen::Create { .. } => "create",
            Screen::Share { .. } => "share",
            Screen::Experience { .. } => "experience",
        }
    }

    /// The message this screen holds, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Screen::Create { draft } => draft.as_ref(),
            Screen::Share { message } | Screen::Experience { message, .. } => Some(message),
        }
    }

    /// Applies an event, consuming the current screen.
    pub fn transition(self, event: Event) -> Result<Screen, FlowError> {
        transition(self, event, &DecoderConfig::default())
    }
}

/// Computes the next screen.
pub fn transition(screen: Screen, event: Event, config: &DecoderConfig) -> Result<Screen, FlowError> {
    match (screen, event) {
        (_, Event::OpenLink(url)) => Ok(Screen::from_location(&url, config)),

        (Screen::Create { .. }, Event::Submit(message)) => {
            message.validate()?;
            Ok(Screen::Share { message })
        }

        (Screen::Share { message }, Event::Back) => Ok(Screen::Create {
            draft: Some(message),
        }),

        (Screen::Share { message }, Event::Preview) => Ok(Screen::Experience {
            message,
            origin: Origin::Preview,
        }),

        (
            Screen::Experience {
                message,
                origin: Origin::Preview,
            },
            Event::Back,
        ) => Ok(Screen::Share { message }),

        (
            Screen::Experience {
                origin: Origin::Link,
                ..
            },
            Event::Back,
        ) => Ok(Screen::default()),

        (screen, event) => Err(FlowError::NotApplicable {
            screen: screen.name(),
            event: event.to_string(),
        }),
    }
}
