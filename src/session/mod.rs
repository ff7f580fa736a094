//! Editor session plumbing
//!
//! This module contains:
//! - Per-session tool state (sequence numbering, sticker/image/blur picks)
//! - Pointer events and editor commands
//! - Keyboard shortcut mapping

pub mod messages;
pub mod shortcuts;
pub mod state;

pub use messages::{EditorCommand, Modifiers, PointerEvent, PointerKind};
pub use state::{SequenceCounter, SessionContext};
