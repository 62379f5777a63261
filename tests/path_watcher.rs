mod common;

use common::{owner, Fixture};
use pathwatch::cache::FilePathCaching;
use pathwatch::types::{IdPaths, OwnerId, SourceType};
use proptest::prelude::*;

#[test]
fn remove_ids_keeps_directory_still_referenced_by_other_owner() {
    let mut fx = Fixture::new();
    let (p1, p2) = (owner(1), owner(2));

    fx.update(p1, &["/proj/D/a.h", "/proj/D/b.h"]);
    fx.update(p2, &["/proj/D/c.h"]);
    assert_eq!(fx.directory_watcher.watched(), vec!["/proj/D".to_string()]);
    assert_eq!(fx.directory_watcher.add_calls(), 1);

    fx.watcher.remove_ids(&[p1]).unwrap();

    assert_eq!(fx.directory_watcher.remove_calls(), 0);
    assert_eq!(fx.directory_watcher.watched(), vec!["/proj/D".to_string()]);
    assert!(fx.owner_files(p1).is_empty());
    assert_eq!(fx.owner_files(p2), vec!["/proj/D/c.h".to_string()]);
    assert_eq!(fx.watcher.entries().len(), 1);
}

#[test]
fn remove_ids_unwatches_last_reference() {
    let mut fx = Fixture::new();
    let (p1, p2) = (owner(1), owner(2));

    fx.update(p1, &["/proj/D/a.h", "/proj/E/e.h"]);
    fx.update(p2, &["/proj/D/c.h"]);

    fx.watcher.remove_ids(&[p1, p1]).unwrap();

    assert_eq!(fx.directory_watcher.watched(), vec!["/proj/D".to_string()]);
    let log = fx.directory_watcher.log();
    assert_eq!(log.lock().unwrap().removed, vec![vec!["/proj/E".to_string()]]);
}

#[test]
fn second_update_replaces_owner_file_set() {
    let mut fx = Fixture::new();
    let p1 = owner(1);

    fx.update(p1, &["/proj/A/a.h", "/proj/B/b.h"]);
    fx.update(p1, &["/proj/B/b.h", "/proj/C/c.h"]);

    assert_eq!(
        fx.owner_files(p1),
        vec!["/proj/B/b.h".to_string(), "/proj/C/c.h".to_string()]
    );
    assert_eq!(
        fx.directory_watcher.watched(),
        vec!["/proj/B".to_string(), "/proj/C".to_string()]
    );
    let log = fx.directory_watcher.log();
    assert_eq!(log.lock().unwrap().removed, vec![vec!["/proj/A".to_string()]]);
}

#[test]
fn second_update_keeps_directory_shared_with_other_owner() {
    let mut fx = Fixture::new();
    let (p1, p2) = (owner(1), owner(2));

    fx.update(p1, &["/proj/A/a.h", "/proj/B/b.h"]);
    fx.update(p2, &["/proj/A/x.h"]);
    fx.update(p1, &["/proj/B/b.h", "/proj/C/c.h"]);

    assert_eq!(fx.directory_watcher.remove_calls(), 0);
    assert_eq!(
        fx.directory_watcher.watched(),
        vec![
            "/proj/A".to_string(),
            "/proj/B".to_string(),
            "/proj/C".to_string()
        ]
    );
}

#[test]
fn moving_files_within_a_directory_never_unwatches_it() {
    let mut fx = Fixture::new();
    let p1 = owner(1);

    fx.update(p1, &["/proj/D/a.h"]);
    fx.update(p1, &["/proj/D/b.h"]);

    assert_eq!(fx.directory_watcher.add_calls(), 1);
    assert_eq!(fx.directory_watcher.remove_calls(), 0);
    assert_eq!(fx.owner_files(p1), vec!["/proj/D/b.h".to_string()]);
}

#[test]
fn update_leaves_owners_not_mentioned_untouched() {
    let mut fx = Fixture::new();
    let (p1, p2) = (owner(1), owner(2));

    fx.update(p1, &["/proj/D/a.h"]);
    fx.update(p2, &["/proj/D/b.h", "/proj/E/e.h"]);
    let before: Vec<_> = fx
        .watcher
        .entries()
        .iter()
        .filter(|entry| entry.id == p2)
        .map(|entry| (entry.key(), entry.last_modified))
        .collect();

    fx.update(p1, &[]);

    let after: Vec<_> = fx
        .watcher
        .entries()
        .iter()
        .filter(|entry| entry.id == p2)
        .map(|entry| (entry.key(), entry.last_modified))
        .collect();
    assert_eq!(before, after);
    assert!(fx.owner_files(p1).is_empty());
    assert_eq!(fx.directory_watcher.remove_calls(), 0);
}

#[test]
fn same_file_for_different_source_types_is_two_entries() {
    let mut fx = Fixture::new();
    let user = OwnerId::new(1, SourceType::UserInclude);
    let system = OwnerId::new(1, SourceType::SystemInclude);

    fx.update(user, &["/proj/D/a.h"]);
    fx.update(system, &["/proj/D/a.h"]);
    assert_eq!(fx.watcher.entries().len(), 2);

    fx.watcher.remove_ids(&[user]).unwrap();
    assert_eq!(fx.owner_files(system), vec!["/proj/D/a.h".to_string()]);
}

#[test]
fn duplicate_files_in_one_update_are_collapsed() {
    let mut fx = Fixture::new();
    let p1 = owner(1);
    let a = fx.file("/proj/D/a.h");

    fx.watcher
        .update_id_paths(&[IdPaths::new(p1, vec![a, a, a])])
        .unwrap();

    assert_eq!(fx.watcher.entries().len(), 1);
}

#[test]
fn unchanged_timestamp_produces_no_notification() {
    let mut fx = Fixture::new();
    fx.update(owner(1), &["/proj/D/a.h"]);

    fx.flush(&["/proj/D", "/proj/D"]);

    assert!(fx.notifier.paths_calls().is_empty());
    assert!(fx.notifier.id_paths_calls().is_empty());
}

#[test]
fn older_timestamp_produces_no_notification() {
    let mut fx = Fixture::new();
    fx.update(owner(1), &["/proj/D/a.h"]);

    fx.fs.set_modified("/proj/D/a.h", 0);
    fx.flush(&["/proj/D"]);

    assert!(fx.notifier.notifications().is_empty());
}

#[test]
fn newer_timestamp_is_reported_once() {
    let mut fx = Fixture::new();
    let p1 = owner(1);
    fx.update(p1, &["/proj/D/a.h", "/proj/D/b.h"]);

    fx.touch("/proj/D/a.h");
    fx.flush(&["/proj/D"]);
    // Same timestamp again: already recorded in the entry.
    fx.flush(&["/proj/D"]);

    let notifications = fx.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    let a = fx.id("/proj/D/a.h");
    assert_eq!(notifications[0].paths, vec![a]);
    assert_eq!(notifications[0].id_paths, vec![IdPaths::new(p1, vec![a])]);
}

#[test]
fn notification_has_flat_and_grouped_views() {
    let mut fx = Fixture::new();
    let (p1, p2) = (owner(1), owner(2));
    fx.update(p2, &["/proj/D/b.h", "/proj/E/e.h"]);
    fx.update(p1, &["/proj/D/a.h", "/proj/D/b.h"]);

    fx.touch("/proj/E/e.h");
    fx.touch("/proj/D/b.h");
    fx.flush(&["/proj/E", "/proj/D", "/proj/E"]);

    let (b, e) = (fx.id("/proj/D/b.h"), fx.id("/proj/E/e.h"));
    let mut flat = vec![b, e];
    flat.sort();
    let mut p2_files = vec![b, e];
    p2_files.sort();

    let notifications = fx.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].paths, flat);
    assert_eq!(
        notifications[0].id_paths,
        vec![IdPaths::new(p1, vec![b]), IdPaths::new(p2, p2_files)]
    );
}

#[test]
fn unrelated_directory_change_is_ignored() {
    let mut fx = Fixture::new();
    fx.update(owner(1), &["/proj/D/a.h"]);
    fx.touch("/proj/D/a.h");

    fx.flush(&["/proj/Other"]);

    assert!(fx.notifier.notifications().is_empty());
}

#[test]
fn missing_file_counts_as_no_change() {
    let mut fx = Fixture::new();
    fx.update(owner(1), &["/proj/D/a.h"]);

    fx.fs.remove_file("/proj/D/a.h");
    fx.flush(&["/proj/D"]);
    assert!(fx.notifier.notifications().is_empty());

    fx.touch("/proj/D/a.h");
    fx.flush(&["/proj/D"]);
    assert_eq!(fx.notifier.notifications().len(), 1);
}

#[test]
fn without_notifier_changes_are_dropped() {
    let mut fx = Fixture::new();
    fx.update(owner(1), &["/proj/D/a.h"]);

    let previous = fx.watcher.set_notifier(None);
    assert!(previous.is_some());

    fx.touch("/proj/D/a.h");
    fx.flush(&["/proj/D"]);
    assert!(fx.notifier.notifications().is_empty());
    assert!(fx.watcher.compressor().pending().is_empty());

    // Dropped batches leave the stored timestamps alone, so the change is
    // still visible once a notifier is back.
    fx.watcher.set_notifier(previous);
    fx.flush(&["/proj/D"]);
    assert_eq!(fx.notifier.notifications().len(), 1);
}

#[test]
fn directory_changes_are_compressed_until_timeout() {
    let mut fx = Fixture::new();
    fx.update(owner(1), &["/proj/D/a.h"]);
    fx.touch("/proj/D/a.h");

    for _ in 0..3 {
        fx.watcher.directory_changed("/proj/D/").unwrap();
    }
    assert_eq!(fx.watcher.compressor().pending(), &[fx.dir("/proj/D")]);
    assert_eq!(fx.timer.start_count(), 3);
    assert!(fx.timer.is_running());
    assert!(fx.notifier.notifications().is_empty());

    fx.watcher.compressor_timeout().unwrap();
    assert!(!fx.timer.is_running());
    assert!(fx.watcher.compressor().pending().is_empty());
    assert_eq!(fx.notifier.notifications().len(), 1);
}

#[test]
fn entries_resolve_to_their_file_directory() {
    let mut fx = Fixture::new();
    fx.update(owner(1), &["/proj/D/a.h", "/proj/E/F/b.h", "/top.h"]);

    for entry in fx.watcher.entries() {
        let file = fx.path_cache.file_path(entry.file_path_id).unwrap();
        let directory = fx.path_cache.directory_path(entry.directory_path_id).unwrap();
        assert_eq!(
            pathwatch::cache::file_path_cache::directory_of(&file),
            directory
        );
    }
    assert_eq!(
        fx.directory_watcher.watched(),
        vec!["/".to_string(), "/proj/D".to_string(), "/proj/E/F".to_string()]
    );
}

#[derive(Debug, Clone)]
enum Op {
    Update(u32, Vec<usize>),
    Remove(Vec<u32>),
}

const UNIVERSE: &[&str] = &[
    "/p/a/1.h", "/p/a/2.h", "/p/a/3.h", "/p/b/1.h", "/p/b/2.h", "/p/c/1.h", "/p/c/d/1.h",
    "/q/1.h",
];

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4u32, proptest::collection::vec(0..UNIVERSE.len(), 0..6))
            .prop_map(|(part, files)| Op::Update(part, files)),
        proptest::collection::vec(0..4u32, 0..3).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn entry_set_stays_sorted_and_matches_watched_directories(
        ops in proptest::collection::vec(op_strategy(), 1..25)
    ) {
        let mut fx = Fixture::new();

        for op in ops {
            match op {
                Op::Update(part, files) => {
                    let paths: Vec<&str> = files.iter().map(|&i| UNIVERSE[i]).collect();
                    fx.update(owner(part), &paths);
                }
                Op::Remove(parts) => {
                    let ids: Vec<OwnerId> = parts.into_iter().map(owner).collect();
                    fx.watcher.remove_ids(&ids).unwrap();
                }
            }

            let entries = fx.watcher.entries();
            prop_assert!(entries.windows(2).all(|w| w[0].key() < w[1].key()));

            let mut expected: Vec<String> = fx
                .watcher
                .watched_directories()
                .into_iter()
                .map(|id| fx.path_cache.directory_path(id).unwrap())
                .collect();
            expected.sort();
            prop_assert_eq!(fx.directory_watcher.watched(), expected);
        }
    }
}
