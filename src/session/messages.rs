//! Input and command types for an editor session
//!
//! This module contains:
//! - Pointer events fed to the active tool
//! - EditorCommand enum for explicit editor commands

use crate::domain::{AnnotationKind, Point, Rect, StickerKind};

// ============================================================================
// Pointer Input Types
// ============================================================================

/// Phase of a pointer gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Pointer pressed (gesture start)
    Down,
    /// Pointer moved while pressed
    Move,
    /// Pointer released (gesture end)
    Up,
}

/// Keyboard modifiers held during a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn control() -> Self {
        Self {
            control: true,
            ..Self::NONE
        }
    }
}

/// Pointer event in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub point: Point,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Down, x, y)
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Move, x, y)
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Up, x, y)
    }

    fn new(kind: PointerKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            point: Point::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(self, modifiers: Modifiers) -> Self {
        Self { modifiers, ..self }
    }
}

// ============================================================================
// Editor Commands
// ============================================================================

/// Explicit commands sent by the editor shell
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    /// Undo last change
    Undo,
    /// Redo undone change
    Redo,
    /// Delete the selected annotation
    DeleteSelected,
    /// Remove every annotation
    ClearAll,
    /// Restart sequence marker numbering at 1
    RestartSequence,
    /// Choose the sticker placed by the sticker tool
    SetSticker(Option<StickerKind>),
    /// Choose the image asset placed by the insert-image tool
    SetImage(Option<String>),
    /// Set pixel block size for new blur regions
    SetBlurPixelSize(u32),
    /// Switch the active drawing tool
    SetTool(AnnotationKind),
    /// Toggle the lock flag of the selected annotation
    ToggleLock,
    /// Enter crop-selection mode
    BeginCrop,
    /// Crop the source image to a rectangle
    Crop(Rect),
    /// Resize the source image
    Resize { width: u32, height: u32 },
    /// Abort the current gesture or crop selection
    Cancel,
}
