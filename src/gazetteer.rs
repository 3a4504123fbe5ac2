//! Location extraction — Vietnamese administrative place names.
//!
//! Matching is lowercase substring containment against every alias of every
//! entry; each place is reported once under its canonical display name, in
//! the order it first appears in the text.

use std::collections::HashMap;

static PROVINCES: &[&str] = &[
    "Hà Nội", "Hồ Chí Minh", "Đà Nẵng", "Hải Phòng", "Cần Thơ",
    "An Giang", "Bà Rịa-Vũng Tàu", "Bắc Giang", "Bắc Kạn", "Bạc Liêu",
    "Bắc Ninh", "Bến Tre", "Bình Định", "Bình Dương", "Bình Phước",
    "Bình Thuận", "Cà Mau", "Cao Bằng", "Đắk Lắk", "Đắk Nông", "Điện Biên",
    "Đồng Nai", "Đồng Tháp", "Gia Lai", "Hà Giang", "Hà Nam", "Hà Tĩnh",
    "Hải Dương", "Hậu Giang", "Hòa Bình", "Hưng Yên", "Khánh Hòa",
    "Kiên Giang", "Kon Tum", "Lai Châu", "Lâm Đồng", "Lạng Sơn", "Lào Cai",
    "Long An", "Nam Định", "Nghệ An", "Ninh Bình", "Ninh Thuận", "Phú Thọ",
    "Phú Yên", "Quảng Bình", "Quảng Nam", "Quảng Ngãi", "Quảng Ninh",
    "Quảng Trị", "Sóc Trăng", "Sơn La", "Tây Ninh", "Thái Bình", "Thái Nguyên",
    "Thanh Hóa", "Thừa Thiên Huế", "Tiền Giang", "Trà Vinh", "Tuyên Quang",
    "Vĩnh Long", "Vĩnh Phúc", "Yên Bái",
];

static CITIES: &[&str] = &[
    "thủ đức", "hạ long", "cẩm phả", "uông bí", "móng cái",
    "thái nguyên", "sông công", "phổ yên", "việt trì", "vĩnh yên",
    "phúc yên", "bắc ninh", "từ sơn", "hải dương", "chí linh",
    "hưng yên", "thái bình", "nam định", "ninh bình", "tam điệp",
    "thanh hóa", "sầm sơn", "bỉm sơn", "vinh", "cửa lò", "thái hòa",
    "hà tĩnh", "đồng hới", "đông hà", "huế", "hội an", "tam kỳ",
    "quảng ngãi", "quy nhơn", "tuy hòa", "nha trang", "cam ranh",
    "phan rang", "phan thiết", "biên hòa", "long khánh", "vũng tàu",
    "bà rịa", "thủ dầu một", "dĩ an", "thuận an", "tân uyên",
    "bến cát", "đồng xoài", "tây ninh", "mỹ tho", "bến tre",
    "trà vinh", "vĩnh long", "sa đéc", "cao lãnh", "hồng ngự",
    "long xuyên", "châu đốc", "rạch giá", "hà tiên", "vị thanh",
    "ngã bảy", "sóc trăng", "bạc liêu", "cà mau", "buôn ma thuột",
    "pleiku", "kon tum", "gia nghĩa", "đà lạt", "bảo lộc",
];

// Spellings seen in comments that differ from the canonical name.
static ALIASES: &[(&str, &[&str])] = &[
    ("Hồ Chí Minh", &["tp hcm", "tp.hcm", "tphcm", "sài gòn"]),
    ("Bà Rịa-Vũng Tàu", &["bà rịa - vũng tàu", "bà rịa vũng tàu"]),
    ("Thừa Thiên Huế", &["thừa thiên - huế", "thừa thiên-huế"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminLevel {
    Province,
    City,
}

/// How to treat a place whose match lies inside a longer place's match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Report every entry with any match ("Trà Vinh" also reports "Vinh").
    #[default]
    ReportAll,
    /// Drop an entry when each of its matches lies inside a longer match
    /// of another entry.
    LongestMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GazetteerEntry {
    pub canonical_name: String,
    pub level: AdminLevel,
    /// Lowercase, diacritics kept. Always includes the lowercased canonical name.
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    start: usize,
    end: usize,
    entry: usize,
}

impl Hit {
    fn covered_by(&self, other: &Hit) -> bool {
        other.entry != self.entry
            && other.start <= self.start
            && other.end >= self.end
            && other.end - other.start > self.end - self.start
    }
}

/// Static lookup of known place names.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
    index: HashMap<String, usize>,
    overlap: OverlapPolicy,
}

/// "bắc ninh" → "Bắc Ninh"
pub fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provinces, major cities and common aliases.
    pub fn vietnam() -> Self {
        let mut gazetteer = Self::new();
        for name in PROVINCES {
            gazetteer.insert(name, AdminLevel::Province, &[]);
        }
        for name in CITIES {
            gazetteer.insert(&capitalize_words(name), AdminLevel::City, &[]);
        }
        for (name, aliases) in ALIASES {
            gazetteer.insert(name, AdminLevel::Province, aliases);
        }
        gazetteer
    }

    /// Add a place, or more aliases for a place already present.
    pub fn with_entry(mut self, canonical_name: &str, level: AdminLevel, aliases: &[&str]) -> Self {
        self.insert(canonical_name, level, aliases);
        self
    }

    pub fn with_overlap_policy(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    fn insert(&mut self, canonical_name: &str, level: AdminLevel, aliases: &[&str]) {
        let canonical_name = canonical_name.trim();
        let key = canonical_name.to_lowercase();
        if key.is_empty() {
            return;
        }
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.entries.push(GazetteerEntry {
                    canonical_name: canonical_name.to_string(),
                    level,
                    aliases: vec![key.clone()],
                });
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[idx];
        for alias in aliases {
            let alias = alias.trim().to_lowercase();
            if !alias.is_empty() && !entry.aliases.contains(&alias) {
                entry.aliases.push(alias);
            }
        }
    }

    pub fn entries(&self) -> &[GazetteerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GazetteerEntry> {
        self.index
            .get(&name.trim().to_lowercase())
            .map(|&idx| &self.entries[idx])
    }

    fn hits(&self, lower: &str) -> Vec<Hit> {
        let mut hits = Vec::new();
        for (entry_idx, entry) in self.entries.iter().enumerate() {
            for alias in &entry.aliases {
                for (start, matched) in lower.match_indices(alias.as_str()) {
                    hits.push(Hit {
                        start,
                        end: start + matched.len(),
                        entry: entry_idx,
                    });
                }
            }
        }
        hits
    }

    /// Entries mentioned in `text`, first-seen order, no duplicates.
    pub fn extract_entries(&self, text: &str) -> Vec<&GazetteerEntry> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let lower = text.to_lowercase();
        let hits = self.hits(&lower);

        let kept: Vec<&Hit> = match self.overlap {
            OverlapPolicy::ReportAll => hits.iter().collect(),
            OverlapPolicy::LongestMatch => hits
                .iter()
                .filter(|h| !hits.iter().any(|other| h.covered_by(other)))
                .collect(),
        };

        let mut first_seen: HashMap<usize, usize> = HashMap::new();
        for hit in kept {
            first_seen
                .entry(hit.entry)
                .and_modify(|pos| *pos = (*pos).min(hit.start))
                .or_insert(hit.start);
        }

        let mut ordered: Vec<(usize, usize)> = first_seen
            .into_iter()
            .map(|(entry, pos)| (pos, entry))
            .collect();
        ordered.sort_unstable();
        ordered
            .into_iter()
            .map(|(_, entry)| &self.entries[entry])
            .collect()
    }

    /// Canonical names of the places mentioned in `text`.
    pub fn extract_all(&self, text: &str) -> Vec<String> {
        self.extract_entries(text)
            .into_iter()
            .map(|e| e.canonical_name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_and_format() {
        let gazetteer = Gazetteer::vietnam();
        let text = "Bão lớn càn quét qua hà nội, sau đó tiến vào tp HỒ CHÍ MINH gây ngập tại thủ đức.";
        assert_eq!(
            gazetteer.extract_all(text),
            vec!["Hà Nội", "Hồ Chí Minh", "Thủ Đức"]
        );
    }

    #[test]
    fn test_no_duplicates() {
        let gazetteer = Gazetteer::vietnam();
        let text = "Hà Nội mưa to. HÀ NỘI ngập. Đà Nẵng ổn, còn hà nội thì chưa.";
        assert_eq!(gazetteer.extract_all(text), vec!["Hà Nội", "Đà Nẵng"]);
    }

    #[test]
    fn test_first_seen_order() {
        let gazetteer = Gazetteer::vietnam();
        let text = "Đà Nẵng, rồi Quảng Nam, rồi lại Đà Nẵng";
        assert_eq!(gazetteer.extract_all(text), vec!["Đà Nẵng", "Quảng Nam"]);
    }

    #[test]
    fn test_empty() {
        let gazetteer = Gazetteer::vietnam();
        assert!(gazetteer.extract_all("").is_empty());
        assert!(gazetteer.extract_all("   ").is_empty());
        assert!(gazetteer.extract_all("no place here").is_empty());
    }

    #[test]
    fn test_alias_maps_to_canonical() {
        let gazetteer = Gazetteer::vietnam();
        assert_eq!(gazetteer.extract_all("Sài Gòn mưa lớn"), vec!["Hồ Chí Minh"]);
        assert_eq!(
            gazetteer.extract_all("TP HCM và Hồ Chí Minh là một"),
            vec!["Hồ Chí Minh"]
        );
    }

    #[test]
    fn test_province_and_city_merged() {
        let gazetteer = Gazetteer::vietnam();
        let entry = gazetteer.get("thái nguyên").unwrap();
        assert_eq!(entry.canonical_name, "Thái Nguyên");
        assert_eq!(entry.level, AdminLevel::Province);
        assert_eq!(gazetteer.extract_all("Thái Nguyên ngập"), vec!["Thái Nguyên"]);
    }

    #[test]
    fn test_overlap_reports_both_by_default() {
        let gazetteer = Gazetteer::vietnam();
        assert_eq!(
            gazetteer.extract_all("Lũ ở Trà Vinh"),
            vec!["Trà Vinh", "Vinh"]
        );
    }

    #[test]
    fn test_overlap_longest_match() {
        let gazetteer = Gazetteer::vietnam().with_overlap_policy(OverlapPolicy::LongestMatch);
        assert_eq!(gazetteer.extract_all("Lũ ở Trà Vinh"), vec!["Trà Vinh"]);
        // a separate mention of the shorter name still counts
        assert_eq!(
            gazetteer.extract_all("Trà Vinh và thành phố Vinh"),
            vec!["Trà Vinh", "Vinh"]
        );
    }

    #[test]
    fn test_with_entry() {
        let gazetteer = Gazetteer::new()
            .with_entry("Mường Tè", AdminLevel::City, &["muong te"])
            .with_entry("mường tè", AdminLevel::City, &["mường-tè"]);
        assert_eq!(gazetteer.len(), 1);
        assert_eq!(gazetteer.entries()[0].aliases.len(), 3);
        assert_eq!(gazetteer.extract_all("sạt lở ở MUONG TE"), vec!["Mường Tè"]);
    }

    #[test]
    fn test_capitalize_words() {
        assert_eq!(capitalize_words("buôn ma thuột"), "Buôn Ma Thuột");
        assert_eq!(capitalize_words("đà lạt"), "Đà Lạt");
    }
}
