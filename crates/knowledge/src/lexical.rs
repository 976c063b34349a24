//! Keyword predicates over named text fields.
//!
//! A filter matches an entity when any field contains any keyword as a
//! case-insensitive substring. A filter with no keywords or no fields
//! matches nothing.

use crate::text::keywords;
use crate::types::{Document, QaPair};

/// A named text column that a filter can target.
pub trait SearchField: Copy + std::fmt::Debug + Send + Sync + 'static {
    /// Column name in the store.
    fn column(&self) -> &'static str;
}

/// Entities that expose their searchable fields.
pub trait Searchable<F: SearchField> {
    fn field_value(&self, field: F) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentField {
    Title,
    Body,
    Subject,
    Author,
}

impl DocumentField {
    pub const ALL: [DocumentField; 4] = [
        DocumentField::Title,
        DocumentField::Body,
        DocumentField::Subject,
        DocumentField::Author,
    ];
}

impl SearchField for DocumentField {
    fn column(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::Subject => "subject",
            Self::Author => "author",
        }
    }
}

impl Searchable<DocumentField> for Document {
    fn field_value(&self, field: DocumentField) -> Option<&str> {
        match field {
            DocumentField::Title => Some(&self.title),
            DocumentField::Body => Some(&self.body),
            DocumentField::Subject => self.subject.as_deref(),
            DocumentField::Author => self.author.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaField {
    Question,
    Answer,
}

impl QaField {
    pub const ALL: [QaField; 2] = [QaField::Question, QaField::Answer];
}

impl SearchField for QaField {
    fn column(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }
}

impl Searchable<QaField> for QaPair {
    fn field_value(&self, field: QaField) -> Option<&str> {
        match field {
            QaField::Question => Some(&self.question),
            QaField::Answer => Some(&self.answer),
        }
    }
}

/// OR of `keyword in field` over every keyword × field pair.
#[derive(Debug, Clone)]
pub struct LexicalFilter<F> {
    keywords: Vec<String>,
    fields: Vec<F>,
}

impl<F: SearchField> LexicalFilter<F> {
    /// Build a filter from explicit keywords; they are lowercased and blanks dropped.
    pub fn new(keywords: impl IntoIterator<Item = String>, fields: &[F]) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            fields: fields.to_vec(),
        }
    }

    /// Build a filter from free text, keeping keywords of at least `min_chars`.
    pub fn from_query(query: &str, min_chars: usize, fields: &[F]) -> Self {
        Self::new(keywords(query, min_chars), fields)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn fields(&self) -> &[F] {
        &self.fields
    }

    /// True when the filter can never match.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() || self.fields.is_empty()
    }

    /// Evaluate the filter against an in-memory entity.
    pub fn matches<T: Searchable<F>>(&self, entity: &T) -> bool {
        if self.is_empty() {
            return false;
        }
        self.fields.iter().any(|field| {
            entity.field_value(*field).is_some_and(|value| {
                let value = value.to_lowercase();
                self.keywords.iter().any(|k| value.contains(k.as_str()))
            })
        })
    }

    /// Render the filter as a SQL predicate with positional parameters.
    ///
    /// Keyword `n` binds to `?n`. The predicate relies on a `casefold`
    /// scalar function registered on the connection. Returns `None` for an
    /// empty filter so callers skip the query entirely.
    pub fn to_sql(&self) -> Option<(String, Vec<String>)> {
        if self.is_empty() {
            return None;
        }

        let mut terms = Vec::with_capacity(self.keywords.len() * self.fields.len());
        for index in 1..=self.keywords.len() {
            for field in &self.fields {
                terms.push(format!("instr(casefold({}), ?{}) > 0", field.column(), index));
            }
        }

        Some((format!("({})", terms.join(" OR ")), self.keywords.clone()))
    }
}
