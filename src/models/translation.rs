use std::fmt;

use serde::{Deserialize, Serialize};

use super::{non_empty, ValidationError, Violation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Adjective,
    Adverb,
    Conjunction,
    Interjection,
    Noun,
    Prefix,
    Pronoun,
    Quantifier,
    Suffix,
    Verb,
}

impl PartOfSpeech {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
            Self::Conjunction => "conjunction",
            Self::Interjection => "interjection",
            Self::Noun => "noun",
            Self::Prefix => "prefix",
            Self::Pronoun => "pronoun",
            Self::Quantifier => "quantifier",
            Self::Suffix => "suffix",
            Self::Verb => "verb",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NounType {
    Primary,
    Radical,
    Deverbal,
}

/// Plural and partitive forms of a noun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NounFields {
    pub abs_plural: String,
    /// Second absolutive plural, for nouns that have one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abs_plural2: Option<String>,
    pub erg_plural: String,
    pub gen_plural: String,
    pub dat_plural: String,
    pub par: String,
}

/// Stems and participles of a verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbFields {
    pub inf_i: String,
    pub prog_stem: String,
    pub perf_stem: String,
    pub n_part: String,
    pub t_part: String,
    pub s_part: String,
    pub v_part: String,
}

/// Part of speech together with the data only that part of speech carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Adjective,
    Adverb,
    Conjunction,
    Interjection,
    Noun {
        noun_type: NounType,
        noun_fields: NounFields,
    },
    Prefix,
    Pronoun,
    Quantifier,
    Suffix,
    Verb {
        verb_fields: VerbFields,
    },
}

impl Category {
    pub fn part_of_speech(&self) -> PartOfSpeech {
        match self {
            Self::Adjective => PartOfSpeech::Adjective,
            Self::Adverb => PartOfSpeech::Adverb,
            Self::Conjunction => PartOfSpeech::Conjunction,
            Self::Interjection => PartOfSpeech::Interjection,
            Self::Noun { .. } => PartOfSpeech::Noun,
            Self::Prefix => PartOfSpeech::Prefix,
            Self::Pronoun => PartOfSpeech::Pronoun,
            Self::Quantifier => PartOfSpeech::Quantifier,
            Self::Suffix => PartOfSpeech::Suffix,
            Self::Verb { .. } => PartOfSpeech::Verb,
        }
    }

    /// Pair `cat` with its payload, rejecting anything missing or misplaced.
    ///
    /// Nouns need `noun_type` and `noun_fields`, verbs need `verb_fields`,
    /// and no other category may carry any of the three.
    fn new(
        cat: PartOfSpeech,
        noun_type: Option<NounType>,
        noun_fields: Option<NounFields>,
        verb_fields: Option<VerbFields>,
    ) -> Result<Self, ValidationError> {
        let mut violations = Vec::new();

        let required = |field: &'static str, present: bool, violations: &mut Vec<Violation>| {
            if !present {
                violations.push(Violation::Required {
                    field,
                    category: cat,
                });
            }
        };
        let forbidden = |field: &'static str,
                         present: bool,
                         owner: PartOfSpeech,
                         violations: &mut Vec<Violation>| {
            if present {
                violations.push(Violation::Forbidden {
                    field,
                    category: owner,
                });
            }
        };

        let is_noun = cat == PartOfSpeech::Noun;
        let is_verb = cat == PartOfSpeech::Verb;

        if is_noun {
            required("noun_type", noun_type.is_some(), &mut violations);
            required("noun_fields", noun_fields.is_some(), &mut violations);
        }
        if is_verb {
            required("verb_fields", verb_fields.is_some(), &mut violations);
        }
        if !is_noun {
            let noun = PartOfSpeech::Noun;
            forbidden("noun_type", noun_type.is_some(), noun, &mut violations);
            forbidden("noun_fields", noun_fields.is_some(), noun, &mut violations);
        }
        if !is_verb {
            let verb = PartOfSpeech::Verb;
            forbidden("verb_fields", verb_fields.is_some(), verb, &mut violations);
        }

        let category = match cat {
            PartOfSpeech::Noun => noun_type
                .zip(noun_fields)
                .map(|(noun_type, noun_fields)| Self::Noun {
                    noun_type,
                    noun_fields,
                }),
            PartOfSpeech::Verb => verb_fields.map(|verb_fields| Self::Verb { verb_fields }),
            PartOfSpeech::Adjective => Some(Self::Adjective),
            PartOfSpeech::Adverb => Some(Self::Adverb),
            PartOfSpeech::Conjunction => Some(Self::Conjunction),
            PartOfSpeech::Interjection => Some(Self::Interjection),
            PartOfSpeech::Prefix => Some(Self::Prefix),
            PartOfSpeech::Pronoun => Some(Self::Pronoun),
            PartOfSpeech::Quantifier => Some(Self::Quantifier),
            PartOfSpeech::Suffix => Some(Self::Suffix),
        };

        match category {
            Some(category) if violations.is_empty() => Ok(category),
            _ => Err(ValidationError { violations }),
        }
    }
}

/// A translation as clients send it and as the store keeps it: one flat
/// object with the category-specific fields optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationDocument {
    /// Word in Kelma
    pub kelma: String,
    pub english: String,
    /// Root the word derives from, by value
    pub root: String,
    #[serde(default)]
    pub swadesh: bool,
    pub cat: PartOfSpeech,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noun_type: Option<NounType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noun_fields: Option<NounFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb_fields: Option<VerbFields>,
}

/// A validated translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TranslationDocument", into = "TranslationDocument")]
pub struct Translation {
    pub kelma: String,
    pub english: String,
    pub root: String,
    /// Member of the Swadesh core-vocabulary list
    pub swadesh: bool,
    pub category: Category,
}

impl TryFrom<TranslationDocument> for Translation {
    type Error = ValidationError;

    fn try_from(doc: TranslationDocument) -> Result<Self, Self::Error> {
        let category = Category::new(doc.cat, doc.noun_type, doc.noun_fields, doc.verb_fields)?;
        Ok(Self {
            kelma: doc.kelma,
            english: doc.english,
            root: doc.root,
            swadesh: doc.swadesh,
            category,
        })
    }
}

impl From<Translation> for TranslationDocument {
    fn from(translation: Translation) -> Self {
        let cat = translation.category.part_of_speech();
        let (noun_type, noun_fields, verb_fields) = match translation.category {
            Category::Noun {
                noun_type,
                noun_fields,
            } => (Some(noun_type), Some(noun_fields), None),
            Category::Verb { verb_fields } => (None, None, Some(verb_fields)),
            _ => (None, None, None),
        };

        Self {
            kelma: translation.kelma,
            english: translation.english,
            root: translation.root,
            swadesh: translation.swadesh,
            cat,
            noun_type,
            noun_fields,
            verb_fields,
        }
    }
}

impl Translation {
    /// Apply a partial update and re-validate the result.
    ///
    /// Changing `cat` drops the stored category payload; the patch has to
    /// bring whatever the new category requires.
    pub fn apply(self, patch: TranslationPatch) -> Result<Self, ValidationError> {
        let mut doc = TranslationDocument::from(self);

        if let Some(kelma) = non_empty(patch.kelma) {
            doc.kelma = kelma;
        }
        if let Some(english) = non_empty(patch.english) {
            doc.english = english;
        }
        if let Some(root) = non_empty(patch.root) {
            doc.root = root;
        }
        if let Some(swadesh) = patch.swadesh {
            doc.swadesh = swadesh;
        }
        if let Some(cat) = patch.cat {
            if cat != doc.cat {
                doc.noun_type = None;
                doc.noun_fields = None;
                doc.verb_fields = None;
            }
            doc.cat = cat;
        }
        if patch.noun_type.is_some() {
            doc.noun_type = patch.noun_type;
        }
        if patch.noun_fields.is_some() {
            doc.noun_fields = patch.noun_fields;
        }
        if patch.verb_fields.is_some() {
            doc.verb_fields = patch.verb_fields;
        }

        Self::try_from(doc)
    }
}

/// Body of `PUT /translations/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TranslationPatch {
    #[serde(default)]
    pub kelma: Option<String>,
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub swadesh: Option<bool>,
    #[serde(default)]
    pub cat: Option<PartOfSpeech>,
    #[serde(default)]
    pub noun_type: Option<NounType>,
    #[serde(default)]
    pub noun_fields: Option<NounFields>,
    #[serde(default)]
    pub verb_fields: Option<VerbFields>,
}

impl TranslationPatch {
    /// True when nothing survives the null/empty filter.
    pub fn is_empty(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, str::is_empty);
        blank(&self.kelma)
            && blank(&self.english)
            && blank(&self.root)
            && self.swadesh.is_none()
            && self.cat.is_none()
            && self.noun_type.is_none()
            && self.noun_fields.is_none()
            && self.verb_fields.is_none()
    }
}
