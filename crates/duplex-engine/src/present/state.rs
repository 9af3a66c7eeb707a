//! Which display buffer is drawable, and whether a flip is still pending.

/// Index of one of the two display buffers.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct BufferIndex(u8);

impl BufferIndex {
    pub const FIRST: BufferIndex = BufferIndex(0);
    pub const SECOND: BufferIndex = BufferIndex(1);

    /// Both indices, in flip order.
    pub const ALL: [BufferIndex; 2] = [Self::FIRST, Self::SECOND];

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// The buffer that is not `self`.
    #[inline]
    pub const fn other(self) -> BufferIndex {
        BufferIndex(self.0 ^ 1)
    }
}

/// Which buffer is being drawn and whether the last flip may still be scanning out.
///
/// Invariant: drawing never targets a buffer while `flip_in_flight` is set; the flag is
/// cleared exactly once per completed wait.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PresentationState {
    current: BufferIndex,
    flip_in_flight: bool,
}

impl PresentationState {
    #[inline]
    pub fn current(&self) -> BufferIndex {
        self.current
    }

    #[inline]
    pub fn flip_in_flight(&self) -> bool {
        self.flip_in_flight
    }

    pub(crate) fn mark_flip_submitted(&mut self) {
        self.flip_in_flight = true;
    }

    pub(crate) fn mark_flip_retired(&mut self) {
        self.flip_in_flight = false;
    }

    pub(crate) fn advance(&mut self) {
        self.current = self.current.other();
    }
}
