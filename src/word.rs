use serde::{Deserialize, Serialize};

/// A vocabulary entry as delivered by a dictionary. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl Word {
    pub fn new(id: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            word: word.into(),
            phonetic: None,
            translation: None,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    pub fn with_phonetic(mut self, phonetic: impl Into<String>) -> Self {
        self.phonetic = Some(phonetic.into());
        self
    }

    /// Blank words cannot be completed and are dropped at load time.
    pub fn is_typeable(&self) -> bool {
        !self.word.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.word.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.word.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_deserialization_without_optionals() {
        let json = r#"{ "id": "w1", "word": "apple" }"#;
        let word: Word = serde_json::from_str(json).unwrap();

        assert_eq!(word.word, "apple");
        assert_eq!(word.phonetic, None);
        assert_eq!(word.translation, None);
    }

    #[test]
    fn test_len_counts_chars() {
        assert_eq!(Word::new("1", "café").len(), 4);
    }

    #[test]
    fn test_is_typeable() {
        assert!(Word::new("1", "hi").is_typeable());
        assert!(!Word::new("2", "").is_typeable());
        assert!(!Word::new("3", "   ").is_typeable());
    }
}
