//! Registry Facade Tests
//!
//! Exercises the public functions and `Registry` against the bundled catalog
//! and against on-disk fixtures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use artifact_registry::{
    compare_schemas, get_detailed_codes, get_exit_code_info, get_exit_codes_version, get_schema,
    get_terminal_config, list_schemas, load_terminal_catalog, map_to_simplified, normalize_schema,
    ExitCode, MissingSegment, Registry, RegistryError, SimplifiedMode,
};
use tempfile::TempDir;

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").leak()
}

fn data_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").leak()
}

// =============================================================================
// Schemas
// =============================================================================

#[test]
fn test_list_schemas_unknown_is_empty() {
    assert!(list_schemas("no-such-category", "v1.0.0").is_empty());
    assert!(list_schemas("pathfinder", "v9.9.9").is_empty());
    assert!(list_schemas("", "").is_empty());
}

#[test]
fn test_list_schemas_known() {
    let names = list_schemas("pathfinder", "v1.0.0");
    assert!(names.contains(&"find-query.schema.json".to_string()));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_get_schema_missing_names_segment() {
    let cases = [
        ("no-such-category", "v1.0.0", "x", MissingSegment::Category),
        ("pathfinder", "v9.9.9", "find-query", MissingSegment::Version),
        ("pathfinder", "v1.0.0", "no-such-schema", MissingSegment::Name),
    ];
    for (category, version, name, expected) in cases {
        match get_schema(category, version, name) {
            Err(RegistryError::NotFound { segment, .. }) => assert_eq!(segment, expected),
            other => panic!("expected NotFound for {category}/{version}/{name}, got {:?}", other),
        }
    }
}

#[test]
fn test_terminal_schema_document() {
    let doc = get_schema("terminal", "v1.0.0", "schema.json").unwrap();
    assert!(doc.contains_key("$schema"));
    assert!(doc.contains_key("properties"));
}

#[test]
fn test_pathfinder_schema_by_short_name() {
    let doc = get_schema("pathfinder", "v1.0.0", "find-query").unwrap();
    assert!(doc.contains_key("$id") || doc.contains_key("$schema"));
    assert_eq!(doc.key.name, "find-query.schema.json");
}

#[test]
fn test_nested_category() {
    let names = list_schemas("observability/logging", "v1.0.0");
    assert_eq!(
        names,
        vec![
            "definitions.schema.json",
            "log-event.schema.json",
            "logger-config.schema.json",
            "middleware-config.schema.json",
            "severity-filter.schema.json",
        ]
    );
    let doc = get_schema("observability/logging", "v1.0.0", "log-event").unwrap();
    assert!(doc.contains_key("$schema"));
}

#[test]
fn test_every_bundled_schema_parses() {
    let registry = Registry::bundled().unwrap();
    let store = registry.store();
    for category in store.categories() {
        for version in store.versions(&category) {
            for name in registry.list_schemas(&category, &version) {
                let doc = registry.get_schema(&category, &version, &name).unwrap();
                assert!(doc.checksum.as_str().len() == 64, "{}", doc.key);
            }
        }
    }
}

#[test]
fn test_json_and_toml_fixtures_normalize_identically() {
    let json = fs::read_to_string(fixtures_path().join("box-chars.schema.json")).unwrap();
    let toml = fs::read_to_string(fixtures_path().join("box-chars.schema.toml")).unwrap();
    assert_eq!(normalize_schema(&json).unwrap(), normalize_schema(&toml).unwrap());
    assert!(compare_schemas(&json, &toml).unwrap().equal);
}

// =============================================================================
// Terminal Profiles
// =============================================================================

#[test]
fn test_terminal_catalog_contents() {
    let catalog = load_terminal_catalog().unwrap();
    assert!(!catalog.is_empty());
    assert!(catalog.contains_key("iTerm2"));
    for (name, profile) in catalog {
        assert_eq!(&profile.name, name);
    }
}

#[test]
fn test_get_terminal_config() {
    assert_eq!(get_terminal_config("iTerm2").unwrap().name, "iTerm2");

    let err = get_terminal_config("NoSuchTerminal").unwrap_err();
    assert!(matches!(&err, RegistryError::ConfigNotFound { name } if name == "NoSuchTerminal"));
    assert!(err.to_string().contains("Terminal config not found"));
}

// =============================================================================
// Exit Codes
// =============================================================================

#[test]
fn test_exit_code_round_trip() {
    for info in get_detailed_codes().unwrap() {
        assert_eq!(get_exit_code_info(info.code).unwrap().name, info.name);
        assert_eq!(get_exit_code_info(info.name).unwrap().code, info.code);
    }
}

#[test]
fn test_detailed_codes_sorted_without_duplicates() {
    let codes = get_detailed_codes().unwrap();
    assert_eq!(codes.len(), ExitCode::ALL.len());
    assert!(codes.windows(2).all(|w| w[0].code < w[1].code));
    let names: HashSet<_> = codes.iter().map(|c| c.name).collect();
    assert_eq!(names.len(), codes.len());
}

#[test]
fn test_mapping_totality() {
    let registry = Registry::bundled().unwrap();
    for version in registry.taxonomy().mapping_versions() {
        for code in ExitCode::ALL {
            let mode = map_to_simplified(code.code(), &version).unwrap();
            assert!(SimplifiedMode::ALL.contains(&mode));
        }
    }
}

#[test]
fn test_mapping_errors() {
    assert!(matches!(
        map_to_simplified(0, "v0.0.1"),
        Err(RegistryError::UnknownMappingVersion { .. })
    ));
    assert!(matches!(
        map_to_simplified(999, "v1.0.0"),
        Err(RegistryError::UnknownExitCode { .. })
    ));
}

#[test]
fn test_exit_codes_version() {
    assert_eq!(get_exit_codes_version(), "v1.0.0");
    assert_eq!(Registry::bundled().unwrap().get_exit_codes_version(), "v1.0.0");
}

#[test]
fn test_process_exit_conversion() {
    let code: std::process::ExitCode = ExitCode::SignalTerm.into();
    assert_eq!(format!("{:?}", code), format!("{:?}", std::process::ExitCode::from(143u8)));
}

// =============================================================================
// On-disk Catalogs
// =============================================================================

fn copy_tree(from: &Path, to: &Path) {
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry.unwrap();
        let target = to.join(entry.path().strip_prefix(from).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

#[test]
fn test_directory_matches_bundled() {
    let registry = Registry::from_directory(data_path()).unwrap();
    let bundled = Registry::bundled().unwrap();
    assert_eq!(registry.bundle_checksum(), bundled.bundle_checksum());
    assert_eq!(
        registry.list_schemas("pathfinder", "v1.0.0"),
        bundled.list_schemas("pathfinder", "v1.0.0")
    );
}

#[test]
fn test_bundle_checksum_stable_and_sensitive() {
    let dir = TempDir::new().unwrap();
    copy_tree(data_path(), dir.path());

    let first = Registry::from_directory(dir.path()).unwrap();
    let second = Registry::from_directory(dir.path()).unwrap();
    assert_eq!(first.bundle_checksum(), second.bundle_checksum());

    fs::write(dir.path().join("ascii/v1.0.0/extra.schema.json"), "{}").unwrap();
    let changed = Registry::from_directory(dir.path()).unwrap();
    assert_ne!(first.bundle_checksum(), changed.bundle_checksum());
}

#[test]
fn test_readme_in_terminal_catalog_is_ignored() {
    let dir = TempDir::new().unwrap();
    copy_tree(data_path(), dir.path());
    fs::write(dir.path().join("terminal/v1.0.0/catalog/README.md"), "# Profiles\n").unwrap();

    let registry = Registry::from_directory(dir.path()).unwrap();
    assert_eq!(registry.get_terminal_config("iTerm2").unwrap().name, "iTerm2");
    assert!(!registry.load_terminal_catalog().unwrap().contains_key("README"));
}

#[test]
fn test_mismatched_terminal_profile_fails_catalog() {
    let dir = TempDir::new().unwrap();
    copy_tree(data_path(), dir.path());
    fs::write(
        dir.path().join("terminal/v1.0.0/catalog/Hyper.toml"),
        "name = \"HyperTerm\"\n[overrides]\nemoji_width = 2\n",
    )
    .unwrap();

    let registry = Registry::from_directory(dir.path()).unwrap();
    assert!(matches!(
        registry.load_terminal_catalog(),
        Err(RegistryError::TerminalNameMismatch { .. })
    ));
}

#[test]
fn test_on_disk_mappings_override_bundled() {
    let dir = TempDir::new().unwrap();
    copy_tree(data_path(), dir.path());
    let path = dir.path().join("foundry/v1.0.0/simplified-modes.toml");
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replace("default_mapping_version = \"v1.0.0\"", "default_mapping_version = \"v1.1.0\"")).unwrap();

    let registry = Registry::from_directory(dir.path()).unwrap();
    assert_eq!(registry.default_mapping_version(), "v1.1.0");
    assert_eq!(registry.get_exit_code_info(10).unwrap().simplified, SimplifiedMode::TransientFailure);
}

#[test]
fn test_broken_mappings_fail_construction() {
    let dir = TempDir::new().unwrap();
    copy_tree(data_path(), dir.path());
    let path = dir.path().join("foundry/v1.0.0/simplified-modes.toml");
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replacen("success = [0]", "success = [0, 1]", 1)).unwrap();

    assert!(matches!(
        Registry::from_directory(dir.path()),
        Err(RegistryError::InvalidMapping(_))
    ));
}

#[test]
fn test_registry_shared_across_threads() {
    let registry = Registry::bundled().unwrap();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert!(registry.get_terminal_config("kitty").is_ok());
            });
        }
    });
}
