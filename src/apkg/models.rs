//! Note types, notes and decks as Anki stores them

use std::sync::{Arc, OnceLock};

use regex::Regex;
use sha2::{Digest, Sha256};

use super::package::{PackageError, Result};
use crate::config::ModelConfig;

/// Separator between note fields in the `notes.flds` column
pub const FIELD_SEPARATOR: char = '\u{1f}';

const BASE91_TABLE: &[u8; 91] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
}

impl Field {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// A card template: one card is generated per template whose required
/// fields are filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub qfmt: String,
    pub afmt: String,
}

/// Which fields must be non-empty for a template to produce a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    All,
    Any,
    None,
}

impl RequirementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::All => "all",
            RequirementKind::Any => "any",
            RequirementKind::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRequirement {
    pub ord: usize,
    pub kind: RequirementKind,
    pub fields: Vec<usize>,
}

/// A note type (Anki "model")
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub fields: Vec<Field>,
    pub templates: Vec<Template>,
    pub css: String,
    /// Index of the field Anki sorts the browser by
    pub sort_field: usize,
}

impl Model {
    pub fn new(id: i64, name: &str, fields: Vec<Field>, templates: Vec<Template>) -> Self {
        Self {
            id,
            name: name.to_string(),
            fields,
            templates,
            css: String::new(),
            sort_field: 0,
        }
    }

    pub fn with_css(mut self, css: &str) -> Self {
        self.css = css.to_string();
        self
    }

    /// The fixed Question/Answer note type every conversion uses
    pub fn question_answer(config: &ModelConfig) -> Self {
        Self::new(
            config.id,
            &config.name,
            vec![Field::new("Question"), Field::new("Answer")],
            vec![Template {
                name: config.template_name.clone(),
                qfmt: config.front_template.clone(),
                afmt: config.back_template.clone(),
            }],
        )
        .with_css(&config.css)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Card generation rules derived from the front side of each template
    pub fn requirements(&self) -> Vec<TemplateRequirement> {
        self.templates
            .iter()
            .enumerate()
            .map(|(ord, template)| {
                let mut fields: Vec<usize> = referenced_fields(&template.qfmt)
                    .iter()
                    .filter_map(|name| self.fields.iter().position(|f| &f.name == name))
                    .collect();
                fields.sort_unstable();
                fields.dedup();

                let kind = if fields.is_empty() {
                    RequirementKind::None
                } else {
                    RequirementKind::All
                };

                TemplateRequirement { ord, kind, fields }
            })
            .collect()
    }
}

fn field_reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid field reference regex"))
}

fn html_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid html tag regex"))
}

/// Field names a template renders, ignoring sections, comments and
/// `FrontSide`. Filters such as `text:Question` resolve to `Question`.
fn referenced_fields(template: &str) -> Vec<String> {
    field_reference_regex()
        .captures_iter(template)
        .filter_map(|caps| {
            let tag = caps[1].trim();
            if tag.starts_with(&['#', '/', '^', '!'][..]) {
                return None;
            }
            let name = tag.rsplit(':').next().unwrap_or(tag).trim();
            if name.is_empty() || name == "FrontSide" {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}

/// Anki's text for sorting and duplicate search: the field without markup
pub fn strip_html(text: &str) -> String {
    html_tag_regex().replace_all(text, "").trim().to_string()
}

/// Stable note identifier: Anki's base91 rendering of the first 8 bytes of
/// SHA-256 over the field values joined with `__`.
pub fn guid_for(values: &[String]) -> String {
    let joined = values.join("__");
    let digest = Sha256::digest(joined.as_bytes());

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let mut value = u64::from_be_bytes(bytes);

    let mut reversed = Vec::new();
    while value > 0 {
        reversed.push(BASE91_TABLE[(value % 91) as usize] as char);
        value /= 91;
    }
    reversed.iter().rev().collect()
}

/// One flashcard's data bound to a note type
#[derive(Debug, Clone)]
pub struct Note {
    model: Arc<Model>,
    fields: Vec<String>,
    tags: Vec<String>,
    guid: String,
}

impl Note {
    /// Create a note; the number of values must match the model's fields
    pub fn new(model: &Arc<Model>, fields: Vec<String>) -> Result<Self> {
        if fields.len() != model.fields.len() {
            return Err(PackageError::FieldCount {
                model: model.name.clone(),
                expected: model.fields.len(),
                actual: fields.len(),
            });
        }

        let guid = guid_for(&fields);
        Ok(Self {
            model: Arc::clone(model),
            fields,
            tags: Vec::new(),
            guid,
        })
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub(crate) fn model_arc(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Value of the `notes.flds` column
    pub fn joined_fields(&self) -> String {
        self.fields.join(&FIELD_SEPARATOR.to_string())
    }

    /// Value of the `notes.tags` column: space separated, padded with spaces
    pub fn joined_tags(&self) -> String {
        if self.tags.is_empty() {
            String::new()
        } else {
            format!(" {} ", self.tags.join(" "))
        }
    }

    pub fn sort_field(&self) -> String {
        self.fields
            .get(self.model.sort_field)
            .map(|f| strip_html(f))
            .unwrap_or_default()
    }

    /// Template ordinals that produce a card for this note
    pub fn card_ords(&self) -> Vec<usize> {
        self.model
            .requirements()
            .into_iter()
            .filter(|req| {
                let filled = |idx: &usize| {
                    self.fields
                        .get(*idx)
                        .map(|f| !f.trim().is_empty())
                        .unwrap_or(false)
                };
                match req.kind {
                    RequirementKind::All => req.fields.iter().all(filled),
                    RequirementKind::Any => req.fields.iter().any(filled),
                    RequirementKind::None => false,
                }
            })
            .map(|req| req.ord)
            .collect()
    }
}

/// A named, ordered collection of notes
#[derive(Debug, Clone)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub description: String,
    notes: Vec<Note>,
}

impl Deck {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: String::new(),
            notes: Vec::new(),
        }
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Distinct note types used by this deck, in first-use order
    pub fn models(&self) -> Vec<Arc<Model>> {
        let mut models: Vec<Arc<Model>> = Vec::new();
        for note in &self.notes {
            if !models.iter().any(|m| m.id == note.model().id) {
                models.push(Arc::clone(note.model_arc()));
            }
        }
        models
    }
}
