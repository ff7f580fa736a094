//! Keyboard shortcut mapping
//!
//! Shortcuts resolve to an `EditorCommand`; the editor shell decides where
//! the key came from.

use crate::domain::AnnotationKind;
use crate::session::messages::{EditorCommand, Modifiers};

/// Non-character keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Named {
    Escape,
    Delete,
    Backspace,
    Enter,
}

/// A pressed key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Character(String),
    Named(Named),
}

impl Key {
    pub fn character(c: &str) -> Self {
        Key::Character(c.to_string())
    }
}

/// Map a key press to an editor command
///
/// `editing_text` suppresses single-letter tool shortcuts and deletion so
/// typing into a text box does not trigger them.
pub fn handle_key_event(key: &Key, modifiers: Modifiers, editing_text: bool) -> Option<EditorCommand> {
    match key {
        // Undo/redo shortcuts
        Key::Character(c)
            if c.eq_ignore_ascii_case("z") && modifiers.control && !modifiers.shift =>
        {
            Some(EditorCommand::Undo)
        }
        Key::Character(c)
            if (c.eq_ignore_ascii_case("y") && modifiers.control)
                || (c.eq_ignore_ascii_case("z") && modifiers.control && modifiers.shift) =>
        {
            Some(EditorCommand::Redo)
        }
        Key::Named(Named::Escape) => Some(EditorCommand::Cancel),
        Key::Named(Named::Delete | Named::Backspace) if !editing_text => {
            Some(EditorCommand::DeleteSelected)
        }
        Key::Character(c) if c.eq_ignore_ascii_case("l") && modifiers.control => {
            Some(EditorCommand::ToggleLock)
        }
        Key::Character(c) if !editing_text && !modifiers.control && !modifiers.alt => {
            tool_for_key(c).map(EditorCommand::SetTool)
        }
        _ => None,
    }
}

fn tool_for_key(c: &str) -> Option<AnnotationKind> {
    let kind = match c {
        "r" => AnnotationKind::Rectangle,
        "e" => AnnotationKind::Ellipse,
        "p" => AnnotationKind::Curve,
        "h" => AnnotationKind::Highlight,
        "a" => AnnotationKind::BigHeadArrow,
        "A" => AnnotationKind::LineArrow,
        "b" => AnnotationKind::BezierArrow,
        "l" => AnnotationKind::Line,
        "t" => AnnotationKind::Text,
        "c" => AnnotationKind::Callout,
        "n" => AnnotationKind::List,
        "s" => AnnotationKind::Sticker,
        "i" => AnnotationKind::InsertImage,
        "x" => AnnotationKind::Blur,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl_shift() -> Modifiers {
        Modifiers {
            control: true,
            shift: true,
            alt: false,
        }
    }

    #[test]
    fn test_undo_redo_shortcuts() {
        assert_eq!(
            handle_key_event(&Key::character("z"), Modifiers::control(), false),
            Some(EditorCommand::Undo)
        );
        assert_eq!(
            handle_key_event(&Key::character("y"), Modifiers::control(), false),
            Some(EditorCommand::Redo)
        );
        assert_eq!(
            handle_key_event(&Key::character("Z"), ctrl_shift(), false),
            Some(EditorCommand::Redo)
        );
    }

    #[test]
    fn test_delete_suppressed_while_typing() {
        let key = Key::Named(Named::Delete);
        assert_eq!(
            handle_key_event(&key, Modifiers::NONE, false),
            Some(EditorCommand::DeleteSelected)
        );
        assert_eq!(handle_key_event(&key, Modifiers::NONE, true), None);
    }

    #[test]
    fn test_tool_shortcuts() {
        assert_eq!(
            handle_key_event(&Key::character("r"), Modifiers::NONE, false),
            Some(EditorCommand::SetTool(AnnotationKind::Rectangle))
        );
        assert_eq!(
            handle_key_event(&Key::character("x"), Modifiers::NONE, false),
            Some(EditorCommand::SetTool(AnnotationKind::Blur))
        );
        assert_eq!(handle_key_event(&Key::character("r"), Modifiers::NONE, true), None);
        assert_eq!(
            handle_key_event(&Key::Named(Named::Escape), Modifiers::NONE, true),
            Some(EditorCommand::Cancel)
        );
    }
}
