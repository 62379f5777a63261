use std::path::{Path, PathBuf};

use pathwatch::cache::{FilePathCache, FilePathCaching};
use pathwatch::fs::mock::MockFileSystem;
use pathwatch::types::{OwnerId, SourceType};
use pathwatch::watch::{build_profiles_from_config, collect_matching_files, resolve_id_paths};
use pathwatch_test_utils::builders::{ConfigFileBuilder, OwnerConfigBuilder};

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/include/a.h", "");
    fs.add_file("/proj/include/b.h", "");
    fs.add_file("/proj/include/gen/c.h", "");
    fs.add_file("/proj/include/scratch.tmp", "");
    fs.add_file("/proj/src/main.c", "");
    fs.add_file("/proj/.pathwatch/paths", "");
    fs
}

fn names(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn owner_files_respect_default_excludes() {
    let cfg = ConfigFileBuilder::new()
        .with_default_exclude("**/gen/**")
        .with_owner("core", OwnerConfigBuilder::new(1).file("include/**").build())
        .build();
    let profiles = build_profiles_from_config(&cfg).unwrap();

    let files = collect_matching_files(&project(), Path::new("/proj"), &profiles[0]).unwrap();

    assert_eq!(
        names(&files),
        vec!["/proj/include/a.h", "/proj/include/b.h", "/proj/include/scratch.tmp"]
    );
}

#[test]
fn owner_exclude_replaces_or_extends_defaults() {
    let cfg = ConfigFileBuilder::new()
        .with_default_exclude("**/gen/**")
        .with_owner(
            "replace",
            OwnerConfigBuilder::new(1).file("include/**").exclude("**/*.tmp").build(),
        )
        .with_owner(
            "extend",
            OwnerConfigBuilder::new(2)
                .file("include/**")
                .exclude("**/*.tmp")
                .append_default_exclude(true)
                .build(),
        )
        .build();
    let profiles = build_profiles_from_config(&cfg).unwrap();
    let fs = project();

    // Owners are visited in name order.
    assert_eq!(profiles[0].name(), "extend");
    let extend = collect_matching_files(&fs, Path::new("/proj"), &profiles[0]).unwrap();
    assert_eq!(names(&extend), vec!["/proj/include/a.h", "/proj/include/b.h"]);

    let replace = collect_matching_files(&fs, Path::new("/proj"), &profiles[1]).unwrap();
    assert_eq!(
        names(&replace),
        vec!["/proj/include/a.h", "/proj/include/b.h", "/proj/include/gen/c.h"]
    );
}

#[test]
fn state_directory_is_never_matched() {
    let cfg = ConfigFileBuilder::new()
        .with_owner("all", OwnerConfigBuilder::new(1).file("**").build())
        .build();
    let profiles = build_profiles_from_config(&cfg).unwrap();

    let files = collect_matching_files(&project(), Path::new("/proj"), &profiles[0]).unwrap();
    assert!(names(&files).iter().all(|f| !f.contains(".pathwatch")));
    assert_eq!(files.len(), 5);
}

#[test]
fn resolve_gives_every_owner_a_record() {
    let cfg = ConfigFileBuilder::new()
        .with_owner(
            "headers",
            OwnerConfigBuilder::new(1)
                .source_type(SourceType::ProjectInclude)
                .file("include/*.h")
                .build(),
        )
        .with_owner("nothing", OwnerConfigBuilder::new(2).file("docs/**").build())
        .build();
    let profiles = build_profiles_from_config(&cfg).unwrap();
    let cache = FilePathCache::new();

    let id_paths = resolve_id_paths(&project(), Path::new("/proj"), &profiles, &cache).unwrap();

    assert_eq!(id_paths.len(), 2);
    assert_eq!(id_paths[0].id, OwnerId::new(1, SourceType::ProjectInclude));
    let files: Vec<String> = id_paths[0]
        .file_path_ids
        .iter()
        .map(|&id| cache.file_path(id).unwrap())
        .collect();
    // `*` crosses directory separators.
    assert_eq!(
        files,
        vec!["/proj/include/a.h", "/proj/include/b.h", "/proj/include/gen/c.h"]
    );
    assert_eq!(id_paths[1].id, OwnerId::new(2, SourceType::Source));
    assert!(id_paths[1].file_path_ids.is_empty());
}
