//! Shared fixtures: a small album/track hierarchy persisted through the
//! generic repository.
#![allow(dead_code)]

use rowkeep_core::{
    open_db_in_memory, Column, ColumnType, DatabaseSchema, EntityHooks, EntityMapping, RepoError,
    RepoResult, SqliteRepository, TableSchema, ID_COLUMN, PARENT_ID_COLUMN,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use std::cell::RefCell;
use std::rc::Rc;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: Option<i64>,
    pub album_id: Option<i64>,
    pub title: String,
    pub duration_secs: i64,
}

impl Track {
    pub fn new(title: &str, duration_secs: i64) -> Self {
        Self {
            id: None,
            album_id: None,
            title: title.to_string(),
            duration_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: Option<i64>,
    pub title: String,
    pub tracks: Vec<Track>,
}

impl Album {
    pub fn new(title: &str, tracks: Vec<Track>) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            tracks,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackMapping {
    table: TableSchema,
}

impl TrackMapping {
    pub fn new() -> Self {
        Self {
            table: TableSchema::new(
                "tracks",
                vec![
                    Column::new(ID_COLUMN, ColumnType::Integer)
                        .unique()
                        .qualifier("PRIMARY KEY ON CONFLICT REPLACE"),
                    Column::new(PARENT_ID_COLUMN, ColumnType::Integer)
                        .nullable()
                        .references("albums", ID_COLUMN),
                    Column::new("TITLE", ColumnType::Text).not_null(),
                    Column::new("DURATION", ColumnType::Integer).not_null(),
                ],
            ),
        }
    }
}

impl EntityMapping for TrackMapping {
    type Entity = Track;

    fn table(&self) -> &TableSchema {
        &self.table
    }

    fn to_row(&self, track: &Track) -> Vec<(&'static str, Value)> {
        vec![
            (ID_COLUMN, opt_integer(track.id)),
            (PARENT_ID_COLUMN, opt_integer(track.album_id)),
            ("TITLE", Value::Text(track.title.clone())),
            ("DURATION", Value::Integer(track.duration_secs)),
        ]
    }

    fn from_row(&self, row: &Row<'_>) -> RepoResult<Track> {
        Ok(Track {
            id: row.get(ID_COLUMN)?,
            album_id: row.get(PARENT_ID_COLUMN)?,
            title: row.get("TITLE")?,
            duration_secs: row.get("DURATION")?,
        })
    }

    fn id(&self, track: &Track) -> Option<i64> {
        track.id
    }

    fn adopt_id(&self, track: &mut Track, id: i64) {
        track.id = Some(id);
    }

    fn set_parent_id(&self, track: &mut Track, parent_id: i64) {
        track.album_id = Some(parent_id);
    }
}

#[derive(Debug, Clone)]
pub struct AlbumMapping {
    table: TableSchema,
}

impl AlbumMapping {
    pub fn new() -> Self {
        Self {
            table: TableSchema::new(
                "albums",
                vec![
                    Column::new(ID_COLUMN, ColumnType::Integer)
                        .unique()
                        .qualifier("PRIMARY KEY ON CONFLICT REPLACE"),
                    Column::new("TITLE", ColumnType::Text).not_null(),
                ],
            ),
        }
    }
}

impl EntityMapping for AlbumMapping {
    type Entity = Album;

    fn table(&self) -> &TableSchema {
        &self.table
    }

    fn to_row(&self, album: &Album) -> Vec<(&'static str, Value)> {
        vec![
            (ID_COLUMN, opt_integer(album.id)),
            ("TITLE", Value::Text(album.title.clone())),
        ]
    }

    fn from_row(&self, row: &Row<'_>) -> RepoResult<Album> {
        Ok(Album {
            id: row.get(ID_COLUMN)?,
            title: row.get("TITLE")?,
            tracks: Vec::new(),
        })
    }

    fn id(&self, album: &Album) -> Option<i64> {
        album.id
    }

    fn adopt_id(&self, album: &mut Album, id: i64) {
        album.id = Some(id);
    }

    fn set_parent_id(&self, _album: &mut Album, _parent_id: i64) {
        // albums are roots of the hierarchy
    }

    fn default_sort(&self) -> Option<&str> {
        Some("TITLE ASC")
    }
}

/// Cascades an album's track list through the lifecycle hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlbumHooks;

fn track_repo(conn: &Connection) -> SqliteRepository<'_, TrackMapping> {
    SqliteRepository::new(conn, TrackMapping::new())
}

impl EntityHooks<Album> for AlbumHooks {
    fn after_store(&self, conn: &Connection, album: &mut Album) -> RepoResult<()> {
        let id = album.id.expect("album id adopted before after_store");
        track_repo(conn).replace_children(&mut album.tracks, id)
    }

    fn after_update(&self, conn: &Connection, album: &mut Album) -> RepoResult<()> {
        let id = album.id.expect("album id present on update");
        track_repo(conn).replace_children(&mut album.tracks, id)
    }

    fn after_load(&self, conn: &Connection, album: &mut Album) -> RepoResult<()> {
        let id = album.id.expect("album id present after load");
        album.tracks =
            track_repo(conn).find_by_field(Some(PARENT_ID_COLUMN), &[Value::Integer(id)])?;
        Ok(())
    }

    fn after_remove(&self, conn: &Connection, album: Option<&Album>) -> RepoResult<()> {
        if let Some(id) = album.and_then(|album| album.id) {
            track_repo(conn).replace_children(&mut [], id)?;
        }
        Ok(())
    }
}

/// Album hooks whose cascade fails for a marker title, after already
/// writing a child row. Exercises nested-transaction rollback.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingAlbumHooks;

impl EntityHooks<Album> for FailingAlbumHooks {
    fn after_store(&self, conn: &Connection, album: &mut Album) -> RepoResult<()> {
        let id = album.id.expect("album id adopted before after_store");
        track_repo(conn).replace_children(&mut album.tracks, id)?;
        if album.title == "boom" {
            return Err(RepoError::InvalidData("marker album rejected".to_string()));
        }
        Ok(())
    }
}

/// Records the ids handed to the update and remove hooks.
#[derive(Debug, Default, Clone)]
pub struct RecordingTrackHooks {
    pub updated: Rc<RefCell<Vec<Option<i64>>>>,
    pub removed: Rc<RefCell<Vec<Option<i64>>>>,
}

impl EntityHooks<Track> for RecordingTrackHooks {
    fn after_update(&self, _conn: &Connection, track: &mut Track) -> RepoResult<()> {
        self.updated.borrow_mut().push(track.id);
        Ok(())
    }

    fn after_remove(&self, _conn: &Connection, track: Option<&Track>) -> RepoResult<()> {
        self.removed.borrow_mut().push(track.and_then(|t| t.id));
        Ok(())
    }
}

pub fn opt_integer(value: Option<i64>) -> Value {
    value.map(Value::Integer).unwrap_or(Value::Null)
}

pub fn schema() -> DatabaseSchema {
    DatabaseSchema::new(SCHEMA_VERSION)
        .with_table(AlbumMapping::new().table().clone())
        .with_table(TrackMapping::new().table().clone())
}

pub fn open_test_db() -> Connection {
    open_db_in_memory(&schema()).unwrap()
}

pub fn track_titles(tracks: &[Track]) -> Vec<String> {
    tracks.iter().map(|track| track.title.clone()).collect()
}
