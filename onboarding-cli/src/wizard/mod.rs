//! Onboarding wizard
//!
//! Walks the user through an ordered list of content blocks, collecting a
//! name and a city. Input blocks only advance once the backend has accepted
//! the value.
//!
//! - `content` - blocks, buttons and the course they form
//! - `state` - draft profile and wizard state
//! - `msg` - messages in, effects out
//! - `machine` - pure state transitions
//! - `controller` - async driver that performs effects against a backend

pub mod content;
pub mod controller;
pub mod error;
pub mod machine;
pub mod msg;
pub mod state;

pub use content::{ActionId, Block, BlockKind, Course};
pub use controller::{WizardController, perform};
pub use machine::{ServerDefaults, Wizard};
pub use msg::{Effect, Msg};
pub use state::{Field, UserDraft};
