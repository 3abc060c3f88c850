// regcp.rs - Capture offsets and the capture checkpoint stack.
// Checkpoints save a slice of capture slots plus the paren counters before a
// repeatable or alternated sub-match, so a failed attempt can be undone.

use smallvec::SmallVec;

use crate::error::MatchError;

/// Upper bound on capture slots saved across all live checkpoints.
const MAX_CHECKPOINT_SLOTS: usize = 1 << 28;

/// Offsets of one capture group. `start_tmp` holds an OPEN position not
/// yet committed by its CLOSE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParenSlot {
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub start_tmp: Option<usize>,
}

/// Capture state of an in-progress match. Slot 0 is the whole match.
#[derive(Debug, Clone)]
pub struct Parens {
    pub offs: Vec<ParenSlot>,
    /// Highest group closed so far, or opened and being tracked.
    pub lastparen: u32,
    /// Most recently closed group.
    pub lastcloseparen: u32,
}

impl Parens {
    pub fn new(nparens: u32) -> Self {
        Parens {
            offs: vec![ParenSlot::default(); nparens as usize + 1],
            lastparen: 0,
            lastcloseparen: 0,
        }
    }

    pub fn nparens(&self) -> u32 {
        (self.offs.len() - 1) as u32
    }

    /// Clear every group, ready for a new start position.
    pub fn reset(&mut self) {
        for slot in &mut self.offs {
            *slot = ParenSlot::default();
        }
        self.lastparen = 0;
        self.lastcloseparen = 0;
    }

    /// Byte range of group `n` if it is defined.
    #[inline]
    pub fn group(&self, n: u32) -> Option<(usize, usize)> {
        if n > self.lastparen && n != 0 {
            return None;
        }
        let slot = self.offs.get(n as usize)?;
        match (slot.start, slot.end) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => None,
        }
    }

    /// Mark groups above `lastparen` closed-unset and restore the counters.
    pub fn unwind(&mut self, lastparen: u32, lastcloseparen: u32) {
        let mut n = self.lastparen;
        while n > lastparen {
            if let Some(slot) = self.offs.get_mut(n as usize) {
                slot.end = None;
            }
            n -= 1;
        }
        self.lastparen = n;
        self.lastcloseparen = lastcloseparen;
    }

    /// Record the close of group `n` at `end`, committing its pending start.
    pub fn close(&mut self, n: u32, end: usize) {
        if let Some(slot) = self.offs.get_mut(n as usize) {
            slot.start = slot.start_tmp;
            slot.end = Some(end);
        }
        if n > self.lastparen {
            self.lastparen = n;
        }
        self.lastcloseparen = n;
    }
}

/// Identifier of a pushed checkpoint: its depth on the stack.
pub type CpId = usize;

#[derive(Debug)]
struct CpFrame {
    /// Groups `floor + 1 ..= floor + slots.len()`.
    floor: u32,
    slots: SmallVec<[ParenSlot; 4]>,
    maxopenparen: u32,
    lastparen: u32,
    lastcloseparen: u32,
}

/// Stack of saved capture slices, separate from the backtrack stack.
#[derive(Debug, Default)]
pub struct CheckpointStack {
    frames: Vec<CpFrame>,
    saved_slots: usize,
}

impl CheckpointStack {
    pub fn new() -> Self {
        CheckpointStack::default()
    }

    /// Current depth; a checkpoint pushed next gets this id.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Save groups above `parenfloor` up to `maxopenparen` together with the
    /// paren counters.
    pub fn push(
        &mut self,
        parens: &Parens,
        parenfloor: u32,
        maxopenparen: u32,
    ) -> Result<CpId, MatchError> {
        let top = maxopenparen.min(parens.nparens());
        let count = top.saturating_sub(parenfloor) as usize;
        self.saved_slots = self
            .saved_slots
            .checked_add(count)
            .filter(|&n| n <= MAX_CHECKPOINT_SLOTS)
            .ok_or(MatchError::CheckpointOverflow)?;
        let lo = parenfloor as usize + 1;
        let slots = if count > 0 {
            parens.offs[lo..lo + count].iter().copied().collect()
        } else {
            SmallVec::new()
        };
        let id = self.frames.len();
        self.frames.push(CpFrame {
            floor: parenfloor,
            slots,
            maxopenparen,
            lastparen: parens.lastparen,
            lastcloseparen: parens.lastcloseparen,
        });
        Ok(id)
    }

    /// Restore checkpoint `id` into `parens`, leaving it on the stack.
    /// Frames above it are discarded.
    pub fn restore(&mut self, id: CpId, parens: &mut Parens, maxopenparen: &mut u32) {
        self.truncate(id + 1);
        if let Some(frame) = self.frames.get(id) {
            apply(frame, parens, maxopenparen);
        }
    }

    /// Restore checkpoint `id` into `parens` without discarding any frame.
    pub fn reapply(&self, id: CpId, parens: &mut Parens, maxopenparen: &mut u32) {
        if let Some(frame) = self.frames.get(id) {
            apply(frame, parens, maxopenparen);
        }
    }

    /// Discard every frame above `id`, then pop `id` itself and restore it.
    pub fn restore_and_pop(&mut self, id: CpId, parens: &mut Parens, maxopenparen: &mut u32) {
        self.truncate(id + 1);
        if let Some(frame) = self.frames.pop() {
            self.saved_slots -= frame.slots.len();
            apply(&frame, parens, maxopenparen);
        }
    }

    /// Discard checkpoint `id` and everything above it without restoring.
    #[inline]
    pub fn blow(&mut self, id: CpId) {
        self.truncate(id);
    }

    /// Drop frames down to depth `depth`.
    pub fn truncate(&mut self, depth: usize) {
        while self.frames.len() > depth {
            if let Some(frame) = self.frames.pop() {
                self.saved_slots -= frame.slots.len();
            }
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.saved_slots = 0;
    }
}

fn apply(frame: &CpFrame, parens: &mut Parens, maxopenparen: &mut u32) {
    *maxopenparen = frame.maxopenparen;
    parens.lastparen = frame.lastparen;
    parens.lastcloseparen = frame.lastcloseparen;
    let lo = frame.floor as usize + 1;
    for (i, slot) in frame.slots.iter().enumerate() {
        if let Some(dst) = parens.offs.get_mut(lo + i) {
            *dst = *slot;
        }
    }
    // Groups past the restored lastparen must not keep a stale end; groups
    // that were never opened lose their start as well.
    for n in parens.lastparen as usize + 1..parens.offs.len() {
        if n as u32 > *maxopenparen {
            parens.offs[n].start = None;
        }
        parens.offs[n].end = None;
    }
}
