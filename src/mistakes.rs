use itertools::Itertools;
use std::collections::BTreeMap;

/// Expected character -> one entry per wrong keystroke made while that
/// character was the target.
pub type MistakeMap = BTreeMap<char, Vec<char>>;

/// Keystroke mistakes at three scopes.
///
/// * `word`: the word in progress, cleared by [`MistakeRecorder::begin_word`]
/// * `session`: `keyMistakes`, cleared by a practice reset
/// * `cumulative`: `cumulativeKeyMistakes`, lives for the whole chapter run
///   and feeds the end-of-chapter heat map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MistakeRecorder {
    word: MistakeMap,
    session: MistakeMap,
    cumulative: MistakeMap,
    confusions: Vec<(char, char)>,
}

impl MistakeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a wrong keystroke against `expected`. The maps store the
    /// expected character; what was actually typed is kept as a confusion
    /// pair for the current word.
    pub fn record(&mut self, expected: char, typed: char) {
        for map in [&mut self.word, &mut self.session, &mut self.cumulative] {
            map.entry(expected).or_default().push(expected);
        }
        self.confusions.push((expected, typed));
    }

    pub fn begin_word(&mut self) {
        self.word.clear();
        self.confusions.clear();
    }

    pub fn reset_session(&mut self) {
        self.session.clear();
        self.begin_word();
    }

    pub fn reset_cumulative(&mut self) {
        self.cumulative.clear();
    }

    pub fn word_mistakes(&self) -> &MistakeMap {
        &self.word
    }

    pub fn key_mistakes(&self) -> &MistakeMap {
        &self.session
    }

    pub fn cumulative_key_mistakes(&self) -> &MistakeMap {
        &self.cumulative
    }

    /// `(expected, typed)` pairs for the word in progress, in keystroke order.
    pub fn word_confusions(&self) -> &[(char, char)] {
        &self.confusions
    }

    /// Cumulative mistakes per expected character, most missed first.
    pub fn heat_map(&self) -> Vec<(char, usize)> {
        rank(&self.cumulative)
    }
}

pub fn total_mistakes(map: &MistakeMap) -> usize {
    map.values().map(Vec::len).sum()
}

pub fn rank(map: &MistakeMap) -> Vec<(char, usize)> {
    map.iter()
        .map(|(c, hits)| (*c, hits.len()))
        .filter(|(_, n)| *n > 0)
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
        .collect()
}
