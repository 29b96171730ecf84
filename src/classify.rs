//! Keyword heuristics for naming conventions found in real models.
//!
//! Exporters rarely fill in structured material data, so walls, channels and
//! pipes are classified by looking for keywords in the texts an author did
//! fill in: the element name, its type name and its type description.

use serde::{Deserialize, Serialize};

use crate::model::{Element, ModelGraph};

/// One labelled keyword list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Ordered categories plus the label used when none of them matches.
/// Earlier categories take priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCategories {
    pub categories: Vec<KeywordCategory>,
    pub default_label: String,
}

impl KeywordCategories {
    #[must_use]
    pub fn new(default_label: impl Into<String>) -> Self {
        Self {
            categories: Vec::new(),
            default_label: default_label.into(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, label: impl Into<String>, keywords: &[&str]) -> Self {
        self.categories.push(KeywordCategory {
            label: label.into(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        });
        self
    }

    /// Wall construction presets, German and English.
    #[must_use]
    pub fn wall_types() -> Self {
        Self::new("Unknown")
            .with_category(
                "GKB",
                &[
                    "gkb",
                    "gipskarton",
                    "gipswand",
                    "trockenbau",
                    "trockenbauwand",
                    "drywall",
                    "plasterboard",
                    "gypsum board",
                    "gypsum wall",
                ],
            )
            .with_category("Concrete", &["beton", "concrete", "stahlbeton"])
            .with_category(
                "Brick",
                &["ziegel", "brick", "mauerwerk", "masonry", "stein"],
            )
            .with_category("Wood", &["holz", "wood", "timber"])
    }

    /// Label of the first category with a keyword in any text, else the
    /// default label.
    #[must_use]
    pub fn classify<'c>(&'c self, texts: &[Option<&str>]) -> &'c str {
        classify_by_keyword(texts, self)
    }
}

impl Default for KeywordCategories {
    fn default() -> Self {
        Self::wall_types()
    }
}

/// Returns the label of the first category (in priority order) with a
/// keyword contained in any present text, compared case-insensitively.
/// Falls back to `categories.default_label`.
#[must_use]
pub fn classify_by_keyword<'c>(
    texts: &[Option<&str>],
    categories: &'c KeywordCategories,
) -> &'c str {
    let lowered = lowercase_texts(texts);

    categories
        .categories
        .iter()
        .find(|category| contains_keyword(&lowered, &category.keywords))
        .map_or(categories.default_label.as_str(), |category| {
            category.label.as_str()
        })
}

/// Whether any keyword appears in any present text, case-insensitively.
#[must_use]
pub fn matches_any<S: AsRef<str>>(texts: &[Option<&str>], keywords: &[S]) -> bool {
    contains_keyword(&lowercase_texts(texts), keywords)
}

/// Texts an element is classified by: own name (falling back to long
/// name), type name, type description.
#[must_use]
pub fn candidate_texts<'g>(graph: &'g ModelGraph, element: &'g Element) -> [Option<&'g str>; 3] {
    let type_object = graph.type_object(element.id);
    [
        element.label(),
        type_object.and_then(|t| t.name.as_deref()),
        type_object.and_then(|t| t.description.as_deref()),
    ]
}

fn lowercase_texts(texts: &[Option<&str>]) -> Vec<String> {
    texts.iter().flatten().map(|t| t.to_lowercase()).collect()
}

// blank keywords are ignored; they would match every text
fn contains_keyword<S: AsRef<str>>(lowered: &[String], keywords: &[S]) -> bool {
    keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| lowered.iter().any(|text| text.contains(&k)))
}
