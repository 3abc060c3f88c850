// regtrie.rs - Trie matching for literal alternations.
// An alternation of literal words compiles to one transition table walked in
// a single pass. Words that accept along the walked path are then tried in
// declaration order, each one's end recomputed from the shortest accepted
// word and the stored word lengths.

use smallvec::SmallVec;

use crate::error::MatchError;
use crate::regenc::{hop_forward, MatchEncoding};
use crate::regint::FoldKind;
use crate::regint::Locale;
use crate::unicode::fold_with;

/// Word identifiers are 1-based in declaration order.
pub type WordId = u16;

#[derive(Debug, Clone, Default)]
struct TrieState {
    /// Sorted by code point.
    trans: Vec<(u32, u32)>,
    /// Words ending in this state, ascending.
    accept: SmallVec<[WordId; 2]>,
    /// Nearest accepting proper ancestor other than the root, else 0.
    prev_accept: u32,
}

#[derive(Debug, Clone, Copy)]
struct TrieWord {
    /// Length in characters.
    len: u32,
}

#[derive(Debug, Clone)]
pub struct Trie {
    states: Vec<TrieState>,
    words: Vec<TrieWord>,
    pub fold: Option<FoldKind>,
    /// Per word: offset from the trie node to the word's branch tail, or
    /// empty when all words continue at the trie node's successor.
    pub jump: Vec<i32>,
}

/// Result of walking the trie at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieWalk {
    /// End of the shortest accepted word.
    pub firstpos: usize,
    /// Character length of that word.
    pub firstlen: u32,
    /// Deepest accepting state reached.
    pub topstate: u32,
    /// Number of accepted words.
    pub accepted: u32,
}

impl Trie {
    /// Build from words given as code point sequences. Under a fold the
    /// words are folded here and subject characters at match time.
    pub fn new(words: &[Vec<u32>], fold: Option<FoldKind>) -> Result<Trie, MatchError> {
        if matches!(fold, Some(FoldKind::Locale)) {
            return Err(MatchError::InvalidArgument("trie cannot fold under the runtime locale"));
        }
        if words.is_empty() || words.len() > WordId::MAX as usize {
            return Err(MatchError::InvalidArgument("trie word count out of range"));
        }
        let mut states = vec![TrieState::default()];
        let mut info = Vec::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            let mut s = 0usize;
            for &raw in word {
                let c = fold_code(fold, raw);
                s = match states[s].trans.binary_search_by_key(&c, |&(k, _)| k) {
                    Ok(j) => states[s].trans[j].1 as usize,
                    Err(j) => {
                        let id = states.len();
                        states[s].trans.insert(j, (c, id as u32));
                        states.push(TrieState::default());
                        id
                    }
                };
            }
            states[s].accept.push((i + 1) as WordId);
            info.push(TrieWord { len: word.len() as u32 });
        }
        // Link every state to its nearest accepting ancestor.
        let mut stack = vec![(0usize, 0u32)];
        while let Some((s, inherited)) = stack.pop() {
            states[s].prev_accept = inherited;
            let pass = if s != 0 && !states[s].accept.is_empty() { s as u32 } else { inherited };
            for j in 0..states[s].trans.len() {
                stack.push((states[s].trans[j].1 as usize, pass));
            }
        }
        Ok(Trie { states, words: info, fold, jump: Vec::new() })
    }

    pub fn with_jumps(mut self, jump: Vec<i32>) -> Self {
        self.jump = jump;
        self
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn word_len(&self, w: WordId) -> u32 {
        self.words.get(w as usize - 1).map_or(0, |info| info.len)
    }

    /// Code points that can start a word (the empty word aside).
    pub fn first_chars(&self) -> impl Iterator<Item = u32> + '_ {
        self.states[0].trans.iter().map(|&(c, _)| c)
    }

    /// True if the empty word is in the trie.
    pub fn accepts_empty(&self) -> bool {
        !self.states[0].accept.is_empty()
    }

    pub fn validate(&self, node: usize) -> Result<(), MatchError> {
        let n = self.states.len() as u32;
        for st in &self.states {
            if st.trans.iter().any(|&(_, to)| to == 0 || to >= n) || st.prev_accept >= n {
                return Err(MatchError::corrupt(node, "trie transition out of range"));
            }
            if st.accept.iter().any(|&w| w == 0 || w as usize > self.words.len()) {
                return Err(MatchError::corrupt(node, "trie word id out of range"));
            }
        }
        if !self.jump.is_empty() && self.jump.len() != self.words.len() {
            return Err(MatchError::corrupt(node, "trie jump table size mismatch"));
        }
        if matches!(self.fold, Some(FoldKind::Locale)) {
            return Err(MatchError::corrupt(node, "trie with locale folding"));
        }
        Ok(())
    }

    /// Walk from `pos`, recording the shortest and deepest accepting states.
    pub fn walk(
        &self,
        enc: MatchEncoding,
        data: &[u8],
        pos: usize,
        end: usize,
    ) -> Result<Option<TrieWalk>, MatchError> {
        let mut walk: Option<TrieWalk> = None;
        let mut state = 0usize;
        let mut p = pos;
        let mut depth = 0u32;
        loop {
            let st = &self.states[state];
            if !st.accept.is_empty() {
                let accepted = st.accept.len() as u32;
                walk = Some(match walk {
                    None => TrieWalk { firstpos: p, firstlen: depth, topstate: state as u32, accepted },
                    Some(w) => TrieWalk { topstate: state as u32, accepted: w.accepted + accepted, ..w },
                });
            }
            if p >= end || st.trans.is_empty() {
                break;
            }
            let (raw, len) = enc.decode(data, p, end)?;
            let c = fold_code(self.fold, raw);
            match st.trans.binary_search_by_key(&c, |&(k, _)| k) {
                Ok(j) => state = st.trans[j].1 as usize,
                Err(_) => break,
            }
            p += len;
            depth += 1;
        }
        Ok(walk)
    }

    /// Smallest accepted word id greater than `after` along the walked path.
    pub fn next_word(&self, walk: &TrieWalk, after: WordId) -> Option<WordId> {
        let mut best: Option<WordId> = None;
        let mut s = walk.topstate as usize;
        loop {
            for &w in &self.states[s].accept {
                if w > after && best.map_or(true, |b| w < b) {
                    best = Some(w);
                }
            }
            if s == 0 {
                break;
            }
            s = self.states[s].prev_accept as usize;
            if s == 0 && self.states[0].accept.is_empty() {
                break;
            }
        }
        best
    }

    /// End position of word `w` for this walk.
    pub fn word_end(
        &self,
        enc: MatchEncoding,
        data: &[u8],
        walk: &TrieWalk,
        w: WordId,
        end: usize,
    ) -> usize {
        let extra = self.word_len(w).saturating_sub(walk.firstlen) as usize;
        hop_forward(enc, data, walk.firstpos, extra, end).0
    }
}

#[inline]
fn fold_code(fold: Option<FoldKind>, c: u32) -> u32 {
    match fold {
        None | Some(FoldKind::Locale) => c,
        Some(kind) => fold_with(kind, c, Locale::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encodings::UTF8;

    fn words(ws: &[&str]) -> Vec<Vec<u32>> {
        ws.iter().map(|w| w.chars().map(|c| c as u32).collect()).collect()
    }

    fn tried(trie: &Trie, s: &str) -> Vec<(WordId, usize)> {
        let data = s.as_bytes();
        let Some(walk) = trie.walk(&UTF8, data, 0, data.len()).unwrap() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut last = 0;
        while let Some(w) = trie.next_word(&walk, last) {
            out.push((w, trie.word_end(&UTF8, data, &walk, w, data.len())));
            last = w;
        }
        out
    }

    #[test]
    fn declaration_order() {
        let trie = Trie::new(&words(&["foo", "foobar", "fo"]), None).unwrap();
        assert_eq!(tried(&trie, "foobarx"), vec![(1, 3), (2, 6), (3, 2)]);
        assert_eq!(tried(&trie, "fox"), vec![(3, 2)]);
        assert!(tried(&trie, "bar").is_empty());
    }

    #[test]
    fn folded_walk() {
        let trie = Trie::new(&words(&["Straße", "st"]), Some(FoldKind::Unicode)).unwrap();
        assert_eq!(tried(&trie, "STRAẞE"), vec![(1, 8), (2, 2)]);
    }

    #[test]
    fn duplicate_and_empty_words() {
        let trie = Trie::new(&words(&["ab", "", "ab"]), None).unwrap();
        assert!(trie.accepts_empty());
        assert_eq!(tried(&trie, "ab"), vec![(1, 2), (2, 0), (3, 2)]);
        assert_eq!(tried(&trie, "x"), vec![(2, 0)]);
    }

    #[test]
    fn validate_checks_jumps() {
        let trie = Trie::new(&words(&["a", "b"]), None).unwrap().with_jumps(vec![3]);
        assert!(trie.validate(4).is_err());
        assert!(Trie::new(&words(&["a"]), Some(FoldKind::Locale)).is_err());
    }
}
