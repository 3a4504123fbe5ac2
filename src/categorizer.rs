//! Keyword categorization — hazard types and damage/relief impact types.
//!
//! Two independent tables (hazard, impact) share one detection algorithm:
//! case-insensitive substring containment of each keyword phrase. A text can
//! be a Storm and mention Housing damage and Food relief at the same time.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use crate::error::{CoreError, Result};

// ── Built-in tables ─────────────────────────────────────────────────

struct KeywordSet {
    label: &'static str,
    domain: CategoryDomain,
    description: &'static str,
    keywords: &'static [&'static str],
}

// Table order is priority order for `primary_category`.
static HAZARD_KEYWORDS: &[KeywordSet] = &[
    KeywordSet {
        label: "Flood",
        domain: CategoryDomain::Hazard,
        description: "River, flash and coastal flooding",
        keywords: &[
            "lũ", "lụt", "ngập", "lũ quét", "triều cường", "nước dâng",
            "flood", "inundat",
        ],
    },
    KeywordSet {
        label: "Storm",
        domain: CategoryDomain::Hazard,
        description: "Typhoons, tropical depressions and whirlwinds",
        keywords: &[
            "bão", "áp thấp nhiệt đới", "lốc xoáy", "gió giật",
            "storm", "typhoon", "cyclone",
        ],
    },
    KeywordSet {
        label: "Earthquake",
        domain: CategoryDomain::Hazard,
        description: "Earthquakes and aftershocks",
        keywords: &["động đất", "rung chấn", "dư chấn", "earthquake", "tremor"],
    },
    KeywordSet {
        label: "Fire",
        domain: CategoryDomain::Hazard,
        description: "Building and forest fires",
        keywords: &["cháy", "hỏa hoạn", "cháy rừng", "fire", "wildfire"],
    },
    KeywordSet {
        label: "Landslide",
        domain: CategoryDomain::Hazard,
        description: "Landslides and riverbank erosion",
        keywords: &["sạt lở", "lở đất", "landslide", "mudslide"],
    },
    KeywordSet {
        label: "Emergency",
        domain: CategoryDomain::Hazard,
        description: "Generic emergency and rescue language",
        keywords: &[
            "khẩn cấp", "cứu hộ", "cứu nạn", "sơ tán", "thảm họa",
            "emergency", "rescue", "evacuat", "disaster",
        ],
    },
];

static IMPACT_KEYWORDS: &[KeywordSet] = &[
    KeywordSet {
        label: "Infrastructure",
        domain: CategoryDomain::Damage,
        description: "Roads, bridges, power and telecoms",
        keywords: &[
            "sập cầu", "cây cầu", "tuyến đường", "giao thông", "mất điện",
            "cột điện", "mất sóng", "cây đổ",
            "bridge", "road", "power outage", "infrastructure",
        ],
    },
    KeywordSet {
        label: "Housing",
        domain: CategoryDomain::Damage,
        description: "Damaged or destroyed homes",
        keywords: &[
            "nhà sập", "sập nhà", "tốc mái", "nhà cửa", "ngập nhà", "hư hỏng nhà",
            "house", "home", "roof",
        ],
    },
    KeywordSet {
        label: "Agriculture",
        domain: CategoryDomain::Damage,
        description: "Crops, livestock and aquaculture losses",
        keywords: &[
            "hoa màu", "lúa", "cây trồng", "gia súc", "gia cầm", "nuôi trồng",
            "crop", "livestock", "agricultur",
        ],
    },
    KeywordSet {
        label: "Human",
        domain: CategoryDomain::Damage,
        description: "Deaths, injuries and missing people",
        keywords: &[
            "người chết", "tử vong", "thiệt mạng", "mất tích", "thương vong",
            "trọng thương", "death", "dead", "missing", "injured", "casualt",
        ],
    },
    KeywordSet {
        label: "Food",
        domain: CategoryDomain::Relief,
        description: "Food and drinking supplies",
        keywords: &[
            "gạo", "mì tôm", "thức ăn", "lương thực", "đồ ăn", "thực phẩm",
            "food", "rice",
        ],
    },
    KeywordSet {
        label: "Medical",
        domain: CategoryDomain::Relief,
        description: "Medicine and medical care",
        keywords: &[
            "y tế", "thuốc", "bệnh viện", "trạm xá", "bác sĩ",
            "medical", "medicine", "hospital", "doctor",
        ],
    },
    KeywordSet {
        label: "Shelter",
        domain: CategoryDomain::Relief,
        description: "Temporary housing and evacuation shelter",
        keywords: &["nhà tạm", "lều", "chỗ trú", "nơi trú", "shelter", "tent"],
    },
    KeywordSet {
        label: "Hygiene",
        domain: CategoryDomain::Relief,
        description: "Clean water, sanitation and disinfection",
        keywords: &[
            "nước sạch", "vệ sinh", "khử trùng", "xà phòng",
            "hygiene", "sanitation", "clean water",
        ],
    },
];

fn table_from_sets(sets: &[KeywordSet], default_domain: CategoryDomain) -> CategoryTable {
    let mut table = CategoryTable::new(default_domain);
    for set in sets {
        table.upsert(
            Category::new(set.label, set.domain, set.keywords.iter().copied())
                .with_description(set.description),
        );
    }
    table
}

/// Flood, Storm, Earthquake, Fire, Landslide, Emergency.
pub fn default_hazard_table() -> CategoryTable {
    table_from_sets(HAZARD_KEYWORDS, CategoryDomain::Hazard)
}

/// Infrastructure, Housing, Agriculture, Human damage;
/// Food, Medical, Shelter, Hygiene relief.
pub fn default_impact_table() -> CategoryTable {
    table_from_sets(IMPACT_KEYWORDS, CategoryDomain::Damage)
}

// ── Categories ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryDomain {
    Damage,
    Relief,
    Hazard,
}

fn normalize_keyword(keyword: &str) -> Option<String> {
    let keyword = keyword.trim().to_lowercase();
    (!keyword.is_empty()).then_some(keyword)
}

/// A named set of keyword phrases. Keywords are lowercase, non-empty and
/// unique, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub domain: CategoryDomain,
    pub description: Option<String>,
    keywords: Vec<String>,
}

impl Category {
    pub fn new<I, S>(name: impl Into<String>, domain: CategoryDomain, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut category = Self {
            name: name.into(),
            domain,
            description: None,
            keywords: Vec::new(),
        };
        category.add_keywords(keywords);
        category
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns `false` when the keyword was blank or already present.
    pub fn add_keyword(&mut self, keyword: &str) -> bool {
        match normalize_keyword(keyword) {
            Some(k) if !self.keywords.contains(&k) => {
                self.keywords.push(k);
                true
            }
            _ => false,
        }
    }

    /// Number of keywords actually added.
    pub fn add_keywords<I, S>(&mut self, keywords: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keywords
            .into_iter()
            .filter(|k| self.add_keyword(k.as_ref()))
            .count()
    }

    pub fn replace_keywords<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords.clear();
        self.add_keywords(keywords);
    }

    /// Keywords found in `haystack`, which must already be lowercase.
    pub fn hit_count(&self, haystack: &str) -> usize {
        self.keywords
            .iter()
            .filter(|kw| haystack.contains(kw.as_str()))
            .count()
    }

    /// Stops at the first keyword found.
    pub fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|kw| haystack.contains(kw.as_str()))
    }
}

// ── Table ───────────────────────────────────────────────────────────

/// An ordered set of categories with unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
    default_domain: CategoryDomain,
}

impl CategoryTable {
    /// An empty table. `default_domain` is given to categories created
    /// implicitly, by keyword additions or by loading a keyword document.
    pub fn new(default_domain: CategoryDomain) -> Self {
        Self {
            categories: Vec::new(),
            default_domain,
        }
    }

    pub fn default_domain(&self) -> CategoryDomain {
        self.default_domain
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    pub fn by_domain(&self, domain: CategoryDomain) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(move |c| c.domain == domain)
    }

    /// Insert `category`, overwriting any category with the same name in place.
    pub fn upsert(&mut self, category: Category) {
        match self.get_mut(&category.name) {
            Some(existing) => *existing = category,
            None => self.categories.push(category),
        }
    }

    /// Copy domain and description from same-named categories in `other`.
    /// Used to recover metadata a list-only keyword document cannot carry.
    pub fn inherit_metadata(&mut self, other: &CategoryTable) {
        for category in &mut self.categories {
            if let Some(source) = other.get(&category.name) {
                category.domain = source.domain;
                category.description = source.description.clone();
            }
        }
    }

    fn entry(&mut self, name: &str) -> &mut Category {
        let idx = match self.categories.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                let empty: [&str; 0] = [];
                self.categories
                    .push(Category::new(name, self.default_domain, empty));
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx]
    }

    /// Append keywords, creating the category if absent. Returns how many
    /// keywords were new.
    pub fn add_keywords<I, S>(&mut self, name: &str, keywords: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entry(name).add_keywords(keywords)
    }

    /// Replace a category's keywords wholesale, creating it if absent.
    pub fn replace_keywords<I, S>(&mut self, name: &str, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entry(name).replace_keywords(keywords)
    }

    // Detection

    fn matches_with(
        &self,
        text: &str,
        filter: impl Fn(&Category) -> bool,
    ) -> BTreeMap<String, usize> {
        let haystack = text.to_lowercase();
        self.categories
            .iter()
            .filter(|c| filter(c))
            .filter_map(|c| {
                let hits = c.hit_count(&haystack);
                (hits > 0).then(|| (c.name.clone(), hits))
            })
            .collect()
    }

    /// Category name → number of its keywords present in `text`.
    /// Categories without hits are omitted.
    pub fn detect_matches(&self, text: &str) -> BTreeMap<String, usize> {
        self.matches_with(text, |_| true)
    }

    pub fn detect_matches_in_domain(
        &self,
        text: &str,
        domain: CategoryDomain,
    ) -> BTreeMap<String, usize> {
        self.matches_with(text, |c| c.domain == domain)
    }

    /// Names of categories with at least one keyword in `text`.
    pub fn detect_categories(&self, text: &str) -> BTreeSet<String> {
        let haystack = text.to_lowercase();
        self.categories
            .iter()
            .filter(|c| c.matches(&haystack))
            .map(|c| c.name.clone())
            .collect()
    }

    /// First category in table order with a hit.
    pub fn primary_category(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.matches(&haystack))
            .map(|c| c.name.as_str())
    }

    // Persistence. Only name → keywords survives; domains and
    // descriptions are reset to the table's defaults on load.

    pub fn to_keyword_document(&self) -> KeywordDocument {
        KeywordDocument {
            entries: self
                .categories
                .iter()
                .map(|c| (c.name.clone(), c.keywords.clone()))
                .collect(),
        }
    }

    pub fn from_keyword_document(document: KeywordDocument, default_domain: CategoryDomain) -> Self {
        let mut table = Self::new(default_domain);
        for (name, keywords) in document.entries {
            table.upsert(Category::new(name, default_domain, keywords));
        }
        table
    }

    /// Category name → keyword list.
    pub fn to_keyword_map(&self) -> BTreeMap<String, Vec<String>> {
        self.categories
            .iter()
            .map(|c| (c.name.clone(), c.keywords.clone()))
            .collect()
    }

    pub fn from_json_str(json: &str, default_domain: CategoryDomain) -> Result<Self> {
        let document: KeywordDocument = serde_json::from_str(json)?;
        Ok(Self::from_keyword_document(document, default_domain))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_keyword_document())?)
    }

    pub fn from_toml_str(toml_str: &str, default_domain: CategoryDomain) -> Result<Self> {
        let document: KeywordDocument = toml::from_str(toml_str)?;
        Ok(Self::from_keyword_document(document, default_domain))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(&self.to_keyword_document())?)
    }

    /// Load a `.json` or `.toml` keyword document.
    pub fn load(path: impl AsRef<Path>, default_domain: CategoryDomain) -> Result<Self> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let contents = fs::read_to_string(path)?;
        let table = match format {
            DocumentFormat::Json => Self::from_json_str(&contents, default_domain)?,
            DocumentFormat::Toml => Self::from_toml_str(&contents, default_domain)?,
        };
        info!(path = %path.display(), categories = table.len(), "Loaded keyword table");
        Ok(table)
    }

    /// Write the table as a `.json` or `.toml` keyword document.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = match DocumentFormat::from_path(path)? {
            DocumentFormat::Json => self.to_json_string()?,
            DocumentFormat::Toml => self.to_toml_string()?,
        };
        fs::write(path, contents)?;
        info!(path = %path.display(), categories = self.len(), "Saved keyword table");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(CoreError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// The external key → list representation of a table, in document order.
/// `{ "Flood": ["lũ", "flood"], "Storm": ["bão"] }`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordDocument {
    pub entries: Vec<(String, Vec<String>)>,
}

impl Serialize for KeywordDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, keywords) in &self.entries {
            map.serialize_entry(name, keywords)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeywordDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = KeywordDocument;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category name to keyword list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, keywords)) = access.next_entry::<String, Vec<String>>()? {
                    entries.push((name, keywords));
                }
                Ok(KeywordDocument { entries })
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

// ── Shared categorizer ──────────────────────────────────────────────

/// A single mutation of the category table.
#[derive(Debug, Clone)]
pub enum CategoryCommand {
    /// Add a category, overwriting one with the same name.
    AddCategory(Category),
    /// Append keywords, creating the category if absent.
    AddKeywords { name: String, keywords: Vec<String> },
    /// Replace a category's keywords, creating it if absent.
    ReplaceKeywords { name: String, keywords: Vec<String> },
    /// Swap in a whole new table.
    ReplaceTable(CategoryTable),
}

/// A category table shared between one writer and many readers.
///
/// Detection works on an immutable snapshot; every mutation copies the
/// table if a snapshot is still held elsewhere and swaps the new one in.
#[derive(Debug)]
pub struct KeywordCategorizer {
    table: RwLock<Arc<CategoryTable>>,
}

impl KeywordCategorizer {
    pub fn new(table: CategoryTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    pub fn hazards() -> Self {
        Self::new(default_hazard_table())
    }

    pub fn impacts() -> Self {
        Self::new(default_impact_table())
    }

    /// The current table. Later mutations do not affect it.
    pub fn snapshot(&self) -> Arc<CategoryTable> {
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply one mutation. Returns the number of keywords added, where
    /// that is meaningful, and 0 otherwise.
    pub fn apply(&self, command: CategoryCommand) -> usize {
        let mut guard = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let table = Arc::make_mut(&mut *guard);
        match command {
            CategoryCommand::AddCategory(category) => {
                debug!(category = %category.name, "Adding category");
                table.upsert(category);
                0
            }
            CategoryCommand::AddKeywords { name, keywords } => {
                let added = table.add_keywords(&name, &keywords);
                debug!(category = %name, added, "Added keywords");
                added
            }
            CategoryCommand::ReplaceKeywords { name, keywords } => {
                debug!(category = %name, count = keywords.len(), "Replacing keywords");
                table.replace_keywords(&name, &keywords);
                0
            }
            CategoryCommand::ReplaceTable(replacement) => {
                *table = replacement;
                0
            }
        }
    }

    pub fn add_category(&self, category: Category) {
        self.apply(CategoryCommand::AddCategory(category));
    }

    pub fn add_keyword(&self, name: &str, keyword: &str) -> bool {
        self.add_keywords(name, [keyword]) == 1
    }

    pub fn add_keywords<I, S>(&self, name: &str, keywords: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply(CategoryCommand::AddKeywords {
            name: name.to_string(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        })
    }

    pub fn replace_keywords<I, S>(&self, name: &str, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply(CategoryCommand::ReplaceKeywords {
            name: name.to_string(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        });
    }

    pub fn detect_matches(&self, text: &str) -> BTreeMap<String, usize> {
        self.snapshot().detect_matches(text)
    }

    pub fn detect_matches_in_domain(&self, text: &str, domain: CategoryDomain) -> BTreeMap<String, usize> {
        self.snapshot().detect_matches_in_domain(text, domain)
    }

    pub fn detect_categories(&self, text: &str) -> BTreeSet<String> {
        self.snapshot().detect_categories(text)
    }

    pub fn primary_category(&self, text: &str) -> Option<String> {
        self.snapshot().primary_category(text).map(str::to_string)
    }

    /// Replace the table with the document at `path`. Unsaved runtime
    /// additions are lost. On error the current table is left untouched.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<()> {
        let default_domain = self.snapshot().default_domain();
        let table = CategoryTable::load(path, default_domain)?;
        self.apply(CategoryCommand::ReplaceTable(table));
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.snapshot().save(path)
    }
}
