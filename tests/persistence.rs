use std::fs;

use relief_text_core::{
    fill_date_range_csv, CategoryDomain, CategoryTable, CoreConfig, CoreError,
    KeywordCategorizer, Preprocessor, Stopwords, TextRecord,
};
use tempfile::tempdir;

#[test]
fn test_table_round_trip_json_and_toml() {
    let dir = tempdir().unwrap();
    let table = relief_text_core::default_impact_table();

    for name in ["impact.json", "impact.toml"] {
        let path = dir.path().join(name);
        table.save(&path).unwrap();
        let loaded = CategoryTable::load(&path, CategoryDomain::Damage).unwrap();
        assert_eq!(loaded.to_keyword_map(), table.to_keyword_map(), "{name}");
        let names: Vec<&str> = loaded.names().collect();
        let expected: Vec<&str> = table.names().collect();
        assert_eq!(names, expected, "{name}");
    }
}

#[test]
fn test_round_trip_loses_domains() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("impact.json");
    relief_text_core::default_impact_table().save(&path).unwrap();

    let loaded = CategoryTable::load(&path, CategoryDomain::Damage).unwrap();
    assert_eq!(loaded.get("Food").map(|c| c.domain), Some(CategoryDomain::Damage));
    assert_eq!(loaded.get("Food").and_then(|c| c.description.clone()), None);
}

#[test]
fn test_load_replaces_runtime_additions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hazards.json");
    fs::write(&path, r#"{ "Drought": ["hạn hán", "drought"], "Flood": ["lũ"] }"#).unwrap();

    let categorizer = KeywordCategorizer::hazards();
    categorizer.add_keyword("Storm", "giông");
    categorizer.load(&path).unwrap();

    let snapshot = categorizer.snapshot();
    let names: Vec<&str> = snapshot.names().collect();
    assert_eq!(names, vec!["Drought", "Flood"]);
    assert!(categorizer.detect_categories("giông lớn").is_empty());
    assert_eq!(
        categorizer.primary_category("Hạn hán kéo dài"),
        Some("Drought".to_string())
    );
}

#[test]
fn test_failed_load_keeps_table() {
    let dir = tempdir().unwrap();
    let categorizer = KeywordCategorizer::hazards();
    let before = categorizer.snapshot().to_keyword_map();

    let missing = categorizer.load(dir.path().join("missing.json"));
    assert!(matches!(missing, Err(CoreError::Io(_))));

    let malformed = dir.path().join("broken.json");
    fs::write(&malformed, "{ \"Flood\": ").unwrap();
    assert!(matches!(categorizer.load(&malformed), Err(CoreError::Json(_))));

    let unsupported = dir.path().join("hazards.yaml");
    fs::write(&unsupported, "Flood: [lũ]").unwrap();
    assert!(matches!(
        categorizer.load(&unsupported),
        Err(CoreError::UnsupportedFormat(_))
    ));

    assert_eq!(categorizer.snapshot().to_keyword_map(), before);
}

#[test]
fn test_stopwords_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stopwords.txt");
    fs::write(&path, "Và\n\n  bởi vì  \nthe\n").unwrap();

    let stopwords = Stopwords::load(&path).unwrap();
    assert_eq!(stopwords.len(), 3);
    assert!(stopwords.contains("và"));
    assert!(stopwords.contains("Bởi Vì"));
}

#[test]
fn test_fill_date_range_csv_in_place() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("comments.csv");
    fs::write(
        &path,
        "date,text\nUnknown,a\nUnknown,b\nUnknown,\"c, d\"\n01/09/2024,e\n",
    )
    .unwrap();

    let touched = fill_date_range_csv(&path, &path, 2, 3, "07/09/2024").unwrap();
    assert_eq!(touched, 2);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "date,text\nUnknown,a\n07/09/2024,b\n07/09/2024,\"c, d\"\n01/09/2024,e\n"
    );
}

#[test]
fn test_fill_date_range_csv_to_new_file() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("in.csv");
    let destination = dir.path().join("out.csv");
    fs::write(&source, "date,text\nx,a\ny,b\n").unwrap();

    let touched = fill_date_range_csv(&source, &destination, 1, 10, "07/09/2024").unwrap();
    assert_eq!(touched, 2);
    assert_eq!(fs::read_to_string(&source).unwrap(), "date,text\nx,a\ny,b\n");
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "date,text\n07/09/2024,a\n07/09/2024,b\n"
    );
}

#[test]
fn test_fill_date_range_csv_never_touches_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("comments.csv");
    fs::write(&path, "date,text\nx,a\ny,b\n").unwrap();

    let touched = fill_date_range_csv(&path, &path, 0, 1, "07/09/2024").unwrap();
    assert_eq!(touched, 1);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "date,text\n07/09/2024,a\ny,b\n"
    );
}

#[test]
fn test_fill_date_range_csv_missing_source() {
    let dir = tempdir().unwrap();
    let result = fill_date_range_csv(
        dir.path().join("nope.csv"),
        dir.path().join("out.csv"),
        1,
        2,
        "07/09/2024",
    );
    assert!(matches!(result, Err(CoreError::Io(_))));
}

#[test]
fn test_preprocessor_from_config_files() {
    let dir = tempdir().unwrap();
    let stopwords = dir.path().join("stopwords.txt");
    let impacts = dir.path().join("impact.toml");
    let config_path = dir.path().join("relief.toml");

    fs::write(&stopwords, "và\nở\n").unwrap();
    fs::write(
        &impacts,
        "Food = [\"gạo\", \"nước uống\"]\nBoats = [\"thuyền\", \"xuồng\"]\n",
    )
    .unwrap();
    fs::write(
        &config_path,
        format!(
            "stopwords_path = {:?}\nimpact_keywords_path = {:?}\nstrip_urls = true\n",
            stopwords.display().to_string(),
            impacts.display().to_string()
        ),
    )
    .unwrap();

    let config = CoreConfig::load(&config_path).unwrap();
    let preprocessor = Preprocessor::from_config(&config).unwrap();
    assert_eq!(preprocessor.cleaner().stopwords().len(), 2);

    let analyzed = preprocessor.analyze(&TextRecord::new(
        1,
        "Cần xuồng và nước uống ở Huế https://example.com/post/1",
        None,
    ));
    assert_eq!(analyzed.cleaned_text, "Cần xuồng nước uống Huế");
    // Food keeps its built-in domain; the new category takes the table default.
    assert_eq!(analyzed.relief.get("Food"), Some(&1));
    assert_eq!(analyzed.damage.get("Boats"), Some(&1));
    assert_eq!(analyzed.normalized_date, "Unknown");
}
