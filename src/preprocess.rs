//! Text normalization and fastText line assembly.
//!
//! A CSV row goes in, a single supervised-training (or inference) line
//! comes out: the encoded label token, when the row carries one, followed
//! by the cleaned text columns. Everything here is pure over its inputs.

use thiserror::Error;

use crate::taxonomy::{
    Module, ModuleMatcher, TaxonomyError, DEFAULT_MODULE_DELIMITER, LABEL_PREFIX,
    MODULE_DELIMITERS,
};

/// Characters folded to spaces before tokenization: ASCII punctuation plus
/// the dash and quote variants that show up in publication metadata.
pub const PUNCTUATION_CHARACTERS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~\u{2013}\u{2012}\u{2014}\u{2018}\u{2019}\u{201d}\u{201c}";

/// Tokens shorter than this are dropped by [`clean`].
pub const MIN_TOKEN_LENGTH: usize = 3;

/// CSV columns read for text by default.
pub const DEFAULT_TEXT_FIELDS: [&str; 6] = [
    "item_title",
    "authors",
    "publication_name",
    "abstract_description",
    "excerpts_ts",
    "yt_description",
];

/// CSV column holding the module code by default.
pub const DEFAULT_CLASS_FIELD: &str = "module_id_for_all";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreprocessError {
    #[error("missing input field: {0:?}")]
    MissingField(String),
    #[error(transparent)]
    Code(#[from] TaxonomyError),
}

/// Normalizes free text for the classifier.
///
/// Punctuation and linebreaks are folded to spaces, decimal digits to `0`,
/// the result is lowercased, and tokens shorter than [`MIN_TOKEN_LENGTH`]
/// are dropped. Idempotent, and never fails.
pub fn clean(s: &str) -> String {
    clean_tokens(s, MIN_TOKEN_LENGTH)
}

fn clean_tokens(s: &str, min_token_length: usize) -> String {
    let folded: String = s
        .chars()
        .map(|c| {
            if PUNCTUATION_CHARACTERS.contains(c) {
                ' '
            } else if c.is_ascii_digit() {
                '0'
            } else {
                c
            }
        })
        .collect();

    folded
        .to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() >= min_token_length)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A CSV row as an ordered mapping from column name to value.
///
/// Iteration follows insertion order, which for rows read from a file is
/// the header order. Inserting an existing column overwrites its value in
/// place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row by pairing a CSV record with its header.
    pub fn from_record(headers: &csv::StringRecord, record: &csv::StringRecord) -> Self {
        headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        if let Some(existing) = self.fields.iter_mut().find(|(name, _)| *name == field) {
            existing.1 = value.into();
        } else {
            self.fields.push((field, value.into()));
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (field, value) in iter {
            row.insert(field, value);
        }
        row
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Row {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect()
    }
}

/// Settings for turning rows into fastText lines.
///
/// Replaces what used to be scattered module-level constants: text columns,
/// the class column, the token-length threshold, the label prefix, and the
/// module code delimiters all travel together and are passed explicitly to
/// the entry points that need them.
#[derive(Debug, Clone)]
pub struct TextConfig {
    text_fields: Vec<String>,
    class_field: String,
    min_token_length: usize,
    label_prefix: String,
    module_delimiter: String,
    matcher: ModuleMatcher,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            text_fields: DEFAULT_TEXT_FIELDS.iter().map(|f| f.to_string()).collect(),
            class_field: DEFAULT_CLASS_FIELD.to_string(),
            min_token_length: MIN_TOKEN_LENGTH,
            label_prefix: LABEL_PREFIX.to_string(),
            module_delimiter: DEFAULT_MODULE_DELIMITER.to_string(),
            matcher: ModuleMatcher::new("", &MODULE_DELIMITERS)
                .expect("default delimiter set is not empty"),
        }
    }
}

impl TextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts line assembly to the given columns, in order. An empty
    /// list falls back to every column present in a row.
    pub fn with_text_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_class_field(mut self, field: impl Into<String>) -> Self {
        self.class_field = field.into();
        self
    }

    pub fn with_min_token_length(mut self, length: usize) -> Self {
        self.min_token_length = length;
        self
    }

    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// Sets the delimiter used when encoding labels.
    pub fn with_module_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.module_delimiter = delimiter.into();
        self
    }

    /// Replaces the delimiter set accepted when parsing class-field values.
    pub fn with_module_delimiters(mut self, delimiters: &[&str]) -> Result<Self, TaxonomyError> {
        self.matcher = ModuleMatcher::new("", delimiters)?;
        Ok(self)
    }

    pub fn text_fields(&self) -> &[String] {
        &self.text_fields
    }

    pub fn class_field(&self) -> &str {
        &self.class_field
    }

    pub fn label_prefix(&self) -> &str {
        &self.label_prefix
    }

    pub fn module_delimiter(&self) -> &str {
        &self.module_delimiter
    }

    /// [`clean`] with this configuration's token-length threshold.
    pub fn clean(&self, s: &str) -> String {
        clean_tokens(s, self.min_token_length)
    }

    /// Parses a class-field value into a [`Module`].
    pub fn parse_module(&self, value: &str) -> Result<Module, TaxonomyError> {
        self.matcher.parse(value)
    }

    /// Parses a predicted label token, prefix included, into a [`Module`].
    pub fn parse_label(&self, label: &str) -> Result<Module, TaxonomyError> {
        let code = label
            .strip_prefix(self.label_prefix.as_str())
            .ok_or_else(|| TaxonomyError::InvalidCode(label.to_string()))?;
        self.matcher.parse(code)
    }

    /// Encodes a module as a label token with this configuration's prefix
    /// and delimiter.
    pub fn label(&self, module: &Module) -> String {
        module.to_label(&self.label_prefix, &self.module_delimiter)
    }
}

/// Assembles one fastText training or inference line from a row.
///
/// When the class field is present its value is parsed and re-encoded as
/// the leading label token; each configured text field is then cleaned and
/// appended in order. Every configured field must be present in the row.
/// With an empty text-field list every column of the row is used instead,
/// in row order.
pub fn fasttext_line(row: &Row, config: &TextConfig) -> Result<String, PreprocessError> {
    let label = match row.get(config.class_field()) {
        Some(value) => config.label(&config.parse_module(value)?),
        None => String::new(),
    };

    let mut pieces = vec![label];
    if config.text_fields().is_empty() {
        for (_, value) in row.iter() {
            pieces.push(config.clean(value));
        }
    } else {
        for field in config.text_fields() {
            let value = row
                .get(field)
                .ok_or_else(|| PreprocessError::MissingField(field.clone()))?;
            pieces.push(config.clean(value));
        }
    }

    Ok(pieces.join(" ").trim().to_string())
}
