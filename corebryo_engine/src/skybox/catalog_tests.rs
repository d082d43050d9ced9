use super::*;
use std::fs;
use tempfile::TempDir;

fn root() -> PathBuf {
    PathBuf::from("/assets")
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_default_entry_with_size() {
    let catalog = SkyboxCatalog::parse("default = desert\ndesert = sky.hdr; size=256", &root())
        .expect("catalog");

    let entry = catalog.default_entry();
    assert_eq!(entry.name, "desert");
    assert_eq!(entry.size, 256);
    assert!(entry.hdr_path.ends_with("sky.hdr"));
    assert_eq!(entry.hdr_path, root().join("sky.hdr"));
}

#[test]
fn test_comments_blank_and_malformed_lines_skipped() {
    let text = "\n# night = ignored.hdr\n   \njust some words\n = nameless.hdr\nempty =\nday = day.hdr\n";
    let catalog = SkyboxCatalog::parse(text, &root()).expect("catalog");

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.default_entry().name, "day");
    assert_eq!(catalog.default_entry().size, DEFAULT_FACE_SIZE);
}

#[test]
fn test_absolute_path_kept() {
    let catalog = SkyboxCatalog::parse("abs = /data/sky.hdr", &root()).expect("catalog");
    assert_eq!(catalog.default_entry().hdr_path, PathBuf::from("/data/sky.hdr"));
}

#[test]
fn test_size_reads_leading_digits() {
    let text = "a = a.hdr; size=128px\nb = b.hdr;size= 64\nc = c.hdr; size=huge\nd = d.hdr; size=0";
    let catalog = SkyboxCatalog::parse(text, &root()).expect("catalog");

    assert_eq!(catalog.get("a").map(|e| e.size), Some(128));
    assert_eq!(catalog.get("b").map(|e| e.size), Some(64));
    assert_eq!(catalog.get("c").map(|e| e.size), Some(DEFAULT_FACE_SIZE));
    assert_eq!(catalog.get("d").map(|e| e.size), Some(DEFAULT_FACE_SIZE));
}

#[test]
fn test_zero_size_uses_default_face_size() {
    let catalog = SkyboxCatalog::parse("night = night.hdr; size=0", &root()).expect("catalog");
    let entry = catalog.default_entry();

    assert_eq!(entry.size, 512);
    assert_eq!(entry.size, DEFAULT_FACE_SIZE);
    assert_eq!(entry.hdr_path, root().join("night.hdr"));
}

#[test]
fn test_entry_without_path_skipped() {
    let catalog = SkyboxCatalog::parse("broken = ; size=64\nok = ok.hdr", &root()).expect("catalog");
    assert!(catalog.get("broken").is_none());
    assert_eq!(catalog.len(), 1);
}

#[test]
fn test_unknown_default_falls_back_to_first_name() {
    let text = "default = missing\nzeta = z.hdr\nalpha = a.hdr";
    let catalog = SkyboxCatalog::parse(text, &root()).expect("catalog");

    assert_eq!(catalog.default_entry().name, "alpha");
    let names: Vec<&str> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[test]
fn test_default_may_precede_or_follow_entries() {
    let text = "zeta = z.hdr\nalpha = a.hdr\ndefault = zeta";
    let catalog = SkyboxCatalog::parse(text, &root()).expect("catalog");
    assert_eq!(catalog.default_entry().name, "zeta");
}

#[test]
fn test_repeated_name_keeps_last_definition() {
    let catalog = SkyboxCatalog::parse("sky = one.hdr\nsky = two.hdr; size=32", &root()).expect("catalog");

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.default_entry().hdr_path, root().join("two.hdr"));
    assert_eq!(catalog.default_entry().size, 32);
}

#[test]
fn test_empty_catalog_is_error() {
    let result = SkyboxCatalog::parse("# nothing\ndefault = sky\n", &root());
    assert!(matches!(result, Err(Error::Catalog(_))));
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_load_missing_file_is_error() {
    let dir = TempDir::new().expect("tempdir");
    let result = SkyboxCatalog::load(&dir.path().join(CATALOG_FILE_NAME), dir.path());
    assert!(matches!(result, Err(Error::Catalog(_))));
}

#[test]
fn test_discover_searches_subdirectories() {
    let dir = TempDir::new().expect("tempdir");
    let nested = dir.path().join("Skyboxes");
    fs::create_dir_all(&nested).expect("mkdir");
    fs::write(nested.join(CATALOG_FILE_NAME), "default = dusk\ndusk = Skyboxes/dusk.hdr; size=64")
        .expect("write");

    let catalog = SkyboxCatalog::discover(dir.path()).expect("catalog");
    let entry = catalog.default_entry();
    assert_eq!(entry.size, 64);
    assert_eq!(entry.hdr_path, dir.path().join("Skyboxes/dusk.hdr"));
}

#[test]
fn test_discover_without_catalog_is_error() {
    let dir = TempDir::new().expect("tempdir");
    assert!(matches!(SkyboxCatalog::discover(dir.path()), Err(Error::Catalog(_))));
}

#[test]
fn test_locate_assets_root_from_nested_directory() {
    let dir = TempDir::new().expect("tempdir");
    let ready = dir.path().join("Assets").join("Ready");
    let deep = dir.path().join("build").join("bin");
    fs::create_dir_all(&ready).expect("mkdir");
    fs::create_dir_all(&deep).expect("mkdir");

    assert_eq!(super::super::assets::locate_assets_root_from(&deep), Some(ready));
}
