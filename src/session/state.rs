//! Per-session mutable state handed to every tool call
//!
//! Counters and selections that a single editor owns live here rather than
//! in globals, so two editors never see each other's numbering or picks.

use crate::assets::AssetStore;
use crate::domain::StickerKind;

/// Smallest blur block size
pub const MIN_BLUR_PIXEL_SIZE: u32 = 4;
/// Largest blur block size
pub const MAX_BLUR_PIXEL_SIZE: u32 = 32;
/// Blur block size of a fresh session
pub const DEFAULT_BLUR_PIXEL_SIZE: u32 = 10;

/// Monotonic counter behind sequence markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCounter {
    next: u32,
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SequenceCounter {
    /// Number the next marker will receive
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Hand out the next number
    pub fn advance(&mut self) -> u32 {
        let n = self.next;
        self.next = self.next.saturating_add(1);
        n
    }

    /// Start numbering from 1 again
    pub fn restart(&mut self) {
        self.next = 1;
    }
}

/// Session-wide tool state
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub sequence: SequenceCounter,
    pub selected_sticker: Option<StickerKind>,
    /// Asset key placed by the insert-image tool
    pub selected_image: Option<String>,
    blur_pixel_size: u32,
    pub assets: AssetStore,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            sequence: SequenceCounter::default(),
            selected_sticker: None,
            selected_image: None,
            blur_pixel_size: DEFAULT_BLUR_PIXEL_SIZE,
            assets: AssetStore::default(),
        }
    }
}

impl SessionContext {
    pub fn blur_pixel_size(&self) -> u32 {
        self.blur_pixel_size
    }

    /// Set the block size for new blur regions, clamped to 4..=32
    pub fn set_blur_pixel_size(&mut self, size: u32) {
        self.blur_pixel_size = size.clamp(MIN_BLUR_PIXEL_SIZE, MAX_BLUR_PIXEL_SIZE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_counter() {
        let mut counter = SequenceCounter::default();
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.advance(), 2);
        assert_eq!(counter.peek(), 3);
        counter.restart();
        assert_eq!(counter.advance(), 1);
    }

    #[test]
    fn test_blur_pixel_size_clamped() {
        let mut ctx = SessionContext::default();
        ctx.set_blur_pixel_size(1);
        assert_eq!(ctx.blur_pixel_size(), MIN_BLUR_PIXEL_SIZE);
        ctx.set_blur_pixel_size(100);
        assert_eq!(ctx.blur_pixel_size(), MAX_BLUR_PIXEL_SIZE);
        ctx.set_blur_pixel_size(12);
        assert_eq!(ctx.blur_pixel_size(), 12);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut a = SessionContext::default();
        let b = SessionContext::default();
        a.sequence.advance();
        a.sequence.advance();
        assert_eq!(a.sequence.peek(), 3);
        assert_eq!(b.sequence.peek(), 1);
    }
}
