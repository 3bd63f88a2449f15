mod common;

use common::{open_test_db, Album, AlbumMapping, FailingAlbumHooks, Track, TrackMapping};
use rowkeep_core::{in_transaction, RepoError, SqliteRepository, TxnScope};

#[test]
fn failing_cascade_rolls_back_both_repositories() {
    let conn = open_test_db();
    let albums = SqliteRepository::with_hooks(&conn, AlbumMapping::new(), FailingAlbumHooks);
    let tracks = SqliteRepository::new(&conn, TrackMapping::new());

    let mut batch = vec![
        Album::new("fine", vec![Track::new("kept?", 1)]),
        Album::new("boom", vec![Track::new("doomed", 2)]),
    ];
    let err = albums.add_all(&mut batch).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));

    // The first album and its track were written before the failure, but
    // the shared transaction discards the whole batch.
    assert!(!in_transaction(&conn));
    assert!(albums.is_empty().unwrap());
    assert!(tracks.is_empty().unwrap());
}

#[test]
fn successful_cascade_commits_both_repositories() {
    let conn = open_test_db();
    let albums = SqliteRepository::with_hooks(&conn, AlbumMapping::new(), FailingAlbumHooks);
    let tracks = SqliteRepository::new(&conn, TrackMapping::new());

    let mut batch = vec![Album::new("fine", vec![Track::new("kept", 1)])];
    albums.add_all(&mut batch).unwrap();

    assert_eq!(albums.size().unwrap(), 1);
    assert_eq!(tracks.size().unwrap(), 1);
}

#[test]
fn repository_calls_join_an_outer_transaction() {
    let conn = open_test_db();
    let tracks = SqliteRepository::new(&conn, TrackMapping::new());

    let scope = TxnScope::begin_if_needed(&conn).unwrap();
    assert!(scope.owns());

    let mut track = Track::new("staged", 9);
    tracks.add(&mut track).unwrap();
    assert!(in_transaction(&conn));

    drop(scope);
    assert!(!in_transaction(&conn));
    assert!(tracks.is_empty().unwrap());
}

#[test]
fn outer_commit_persists_nested_writes() {
    let conn = open_test_db();
    let tracks = SqliteRepository::new(&conn, TrackMapping::new());

    let scope = TxnScope::begin_if_needed(&conn).unwrap();
    let mut track = Track::new("kept", 9);
    tracks.add(&mut track).unwrap();
    scope.commit_if_owned().unwrap();

    assert_eq!(tracks.size().unwrap(), 1);
}

#[test]
fn replace_all_failure_keeps_the_previous_content() {
    let conn = open_test_db();
    let tracks = SqliteRepository::new(&conn, TrackMapping::new());

    let mut initial = vec![Track::new("survivor", 1)];
    tracks.add_all(&mut initial).unwrap();

    // A child pointing at a nonexistent album violates the foreign key,
    // aborting the replace mid-batch.
    let mut orphan = Track::new("orphan", 2);
    orphan.album_id = Some(777_777);
    let mut replacement = vec![Track::new("new", 3), orphan];
    assert!(tracks.replace_all(&mut replacement).is_err());

    let all = tracks.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "survivor");
}
