//! Parsed contents of one chat export file.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Index;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::error::LoadError;

const EN_PLACEHOLDERS: [&str; 4] = [
    "image omitted",
    "video omitted",
    "audio omitted",
    "document omitted",
];

const IT_PLACEHOLDERS: [&str; 4] = [
    "immagine omessa",
    "video omesso",
    "audio omesso",
    "documento omesso",
];

/// Language the exporting WhatsApp app was set to.
///
/// Omitted-media placeholders are localized, so this picks the set of
/// contents treated as non-messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLanguage {
    #[default]
    En,
    It,
}

impl AppLanguage {
    pub fn placeholders(self) -> &'static [&'static str] {
        match self {
            AppLanguage::En => &EN_PLACEHOLDERS,
            AppLanguage::It => &IT_PLACEHOLDERS,
        }
    }
}

impl FromStr for AppLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(AppLanguage::En),
            "it" => Ok(AppLanguage::It),
            _ => Err(format!("unsupported app language: {}", s)),
        }
    }
}

impl fmt::Display for AppLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppLanguage::En => write!(f, "en"),
            AppLanguage::It => write!(f, "it"),
        }
    }
}

/// Ordered messages of one export plus the placeholder set used to clean them.
#[derive(Debug, Clone)]
pub struct ChatDataset {
    messages: Vec<Message>,
    placeholders: HashSet<String>,
    source: Option<PathBuf>,
}

impl ChatDataset {
    /// Build a dataset from already parsed messages.
    ///
    /// `placeholders` overrides the language table when given.
    pub fn new(
        messages: Vec<Message>,
        language: AppLanguage,
        placeholders: Option<Vec<String>>,
    ) -> Self {
        let placeholders = match placeholders {
            Some(list) => list.into_iter().collect(),
            None => language
                .placeholders()
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        };
        Self {
            messages,
            placeholders,
            source: None,
        }
    }

    /// Parse export text line by line, skipping blank and malformed lines.
    pub fn parse_text(text: &str, language: AppLanguage) -> Self {
        let (messages, _) = parse_lines(text.lines().map(str::to_string));
        Self::new(messages, language, None)
    }

    /// Read and parse an export file.
    ///
    /// Malformed rows are skipped. The file itself failing to read, or
    /// containing non-blank lines of which none parse, is a [`LoadError`].
    pub fn from_txt_file(path: &Path, language: AppLanguage) -> Result<Self, LoadError> {
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_err)?;

        let (messages, non_blank) = parse_lines(lines);
        if messages.is_empty() && non_blank > 0 {
            return Err(LoadError::NoMessages {
                path: path.to_path_buf(),
                lines: non_blank,
            });
        }

        tracing::debug!(
            path = %path.display(),
            parsed = messages.len(),
            skipped = non_blank - messages.len(),
            "parsed export file"
        );

        let mut dataset = Self::new(messages, language, None);
        dataset.source = Some(path.to_path_buf());
        Ok(dataset)
    }

    /// All parsed messages, in file order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages whose content is not an omitted-media placeholder.
    pub fn clean_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| !self.placeholders.contains(m.content()))
    }

    pub fn is_placeholder(&self, content: &str) -> bool {
        self.placeholders.contains(content)
    }

    /// Unique sender names.
    pub fn senders(&self) -> BTreeSet<&str> {
        self.messages.iter().map(Message::sender).collect()
    }

    pub fn total_messages(&self) -> usize {
        self.messages.len()
    }

    pub fn total_clean_messages(&self) -> usize {
        self.clean_messages().count()
    }

    /// File the dataset was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl Index<usize> for ChatDataset {
    type Output = Message;

    fn index(&self, index: usize) -> &Self::Output {
        &self.messages[index]
    }
}

impl<'a> IntoIterator for &'a ChatDataset {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl fmt::Display for ChatDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChatDataset(total_messages={}, total_clean_messages={})",
            self.total_messages(),
            self.total_clean_messages()
        )
    }
}

/// Returns the parsed messages and the number of non-blank lines seen.
fn parse_lines(lines: impl IntoIterator<Item = String>) -> (Vec<Message>, usize) {
    let mut messages = Vec::new();
    let mut non_blank = 0;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        non_blank += 1;
        if let Ok(message) = Message::from_raw(line) {
            messages.push(message);
        }
    }
    (messages, non_blank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EXPORT: &str = "\
[01/02/23, 10:15:30] Alice: Hello there
[01/02/23, 10:16:02] Bob: image omitted

this line is garbage
[01/02/23, 10:17:45] Alice: video omitted
   [02/02/23, 08:00:00] Carol: Morning!
[31/02/23, 08:00:00] Carol: impossible date
[02/02/23, 08:01:00] Bob: Hi Carol
";

    fn write_export(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_text_keeps_order_and_skips_bad_rows() {
        let data = ChatDataset::parse_text(EXPORT, AppLanguage::En);
        let senders: Vec<&str> = data.iter().map(Message::sender).collect();
        assert_eq!(senders, vec!["Alice", "Bob", "Alice", "Carol", "Bob"]);
        assert_eq!(data.total_messages(), 5);
        assert_eq!(data[3].content(), "Morning!");
    }

    #[test]
    fn test_clean_messages_filter_placeholders() {
        let data = ChatDataset::parse_text(EXPORT, AppLanguage::En);
        assert_eq!(data.total_clean_messages(), 3);
        assert!(data.clean_messages().all(|m| !data.is_placeholder(m.content())));
        let placeholder_count = data
            .messages()
            .iter()
            .filter(|m| data.is_placeholder(m.content()))
            .count();
        assert_eq!(
            data.total_clean_messages(),
            data.total_messages() - placeholder_count
        );
    }

    #[test]
    fn test_placeholder_excluded_but_retained() {
        let data =
            ChatDataset::parse_text("[01/02/23, 10:15:30] Alice: image omitted", AppLanguage::En);
        assert_eq!(data.total_messages(), 1);
        assert_eq!(data.total_clean_messages(), 0);
    }

    #[test]
    fn test_italian_placeholders() {
        let text = "[01/02/23, 10:15:30] Alice: immagine omessa\n\
                    [01/02/23, 10:15:31] Alice: image omitted";
        let data = ChatDataset::parse_text(text, AppLanguage::It);
        let clean: Vec<&str> = data.clean_messages().map(Message::content).collect();
        assert_eq!(clean, vec!["image omitted"]);
    }

    #[test]
    fn test_placeholder_override() {
        let data = ChatDataset::parse_text(EXPORT, AppLanguage::En);
        let custom = ChatDataset::new(
            data.messages().to_vec(),
            AppLanguage::En,
            Some(vec!["Hi Carol".to_string()]),
        );
        assert_eq!(custom.total_clean_messages(), 4);
    }

    #[test]
    fn test_senders() {
        let data = ChatDataset::parse_text(EXPORT, AppLanguage::En);
        let senders: Vec<&str> = data.senders().into_iter().collect();
        assert_eq!(senders, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_from_txt_file() {
        let file = write_export(EXPORT);
        let data = ChatDataset::from_txt_file(file.path(), AppLanguage::En).unwrap();
        assert_eq!(data.total_messages(), 5);
        assert_eq!(data.source(), Some(file.path()));
    }

    #[test]
    fn test_from_txt_file_missing() {
        let err = ChatDataset::from_txt_file(Path::new("/nonexistent/chat.txt"), AppLanguage::En)
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_from_txt_file_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x5b, 0xff, 0xfe, 0x0a]).unwrap();
        let err = ChatDataset::from_txt_file(file.path(), AppLanguage::En).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_from_txt_file_without_messages() {
        let file = write_export("hello\nworld\n");
        let err = ChatDataset::from_txt_file(file.path(), AppLanguage::En).unwrap_err();
        assert!(matches!(err, LoadError::NoMessages { lines: 2, .. }));
    }

    #[test]
    fn test_from_txt_file_empty() {
        let file = write_export("\n\n");
        let data = ChatDataset::from_txt_file(file.path(), AppLanguage::En).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_display() {
        let data = ChatDataset::parse_text(EXPORT, AppLanguage::En);
        assert_eq!(
            data.to_string(),
            "ChatDataset(total_messages=5, total_clean_messages=3)"
        );
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("EN".parse::<AppLanguage>().unwrap(), AppLanguage::En);
        assert_eq!("it".parse::<AppLanguage>().unwrap(), AppLanguage::It);
        assert!("fr".parse::<AppLanguage>().is_err());
    }
}
