use agenda_core::db::open_db_in_memory;
use agenda_core::{
    export_file, export_to_dir, import_from_str, AgendaDocument, AgendaPersistence,
    KeyValueStore, PersistenceError, SqliteKeyValueStore, Subtopic, Topic, STORAGE_KEY,
};

fn sprint_review() -> AgendaDocument {
    let mut document = AgendaDocument::empty("Sprint Review", "2024-03-01");
    let mut topic = Topic::new("Demo");
    topic.comment = "Recorded for the wiki".to_string();
    topic.subtopics.push(Subtopic::new("Search"));
    topic.subtopics[0].completed = true;
    document.topics.push(topic);
    document
}

#[test]
fn load_returns_default_document_when_nothing_is_stored() {
    let conn = open_db_in_memory().unwrap();
    let persistence = AgendaPersistence::new(SqliteKeyValueStore::try_new(&conn).unwrap());

    let document = persistence.load().unwrap();

    assert_eq!(document.title, "Weekly Agenda");
    assert_eq!(document.topics[0].title, "Project Updates");
}

#[test]
fn save_then_load_returns_equal_document() {
    let conn = open_db_in_memory().unwrap();
    let persistence = AgendaPersistence::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    let document = sprint_review();

    persistence.save(&document).unwrap();

    assert_eq!(persistence.load().unwrap(), document);
}

#[test]
fn save_overwrites_single_storage_key() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::try_new(&conn).unwrap();
    let persistence = AgendaPersistence::new(&store);
    let mut document = sprint_review();

    persistence.save(&document).unwrap();
    document.set_title("Renamed");
    persistence.save(&document).unwrap();

    let raw = store.get_item(STORAGE_KEY).unwrap().unwrap();
    let stored: AgendaDocument = serde_json::from_str(raw.as_str()).unwrap();
    assert_eq!(stored.title, "Renamed");
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM local_storage;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn corrupt_stored_value_fails_without_overwriting_it() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::try_new(&conn).unwrap();
    store.set_item(STORAGE_KEY, "{not json").unwrap();
    let persistence = AgendaPersistence::new(&store);

    let err = persistence.load().unwrap_err();

    match err {
        PersistenceError::CorruptStorage { key, cause } => {
            assert_eq!(key, STORAGE_KEY);
            assert_eq!(cause.line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        store.get_item(STORAGE_KEY).unwrap().as_deref(),
        Some("{not json")
    );
}

#[test]
fn clear_restores_default_on_next_load() {
    let conn = open_db_in_memory().unwrap();
    let persistence = AgendaPersistence::new(SqliteKeyValueStore::try_new(&conn).unwrap());
    persistence.save(&sprint_review()).unwrap();

    persistence.clear().unwrap();

    assert_eq!(persistence.load().unwrap().title, "Weekly Agenda");
}

#[test]
fn export_file_is_named_after_agenda_date() {
    let document = sprint_review();

    let export = export_file(&document).unwrap();

    assert_eq!(export.file_name, "meeting-2024-03-01.json");
    assert!(export.contents.contains("\n  \"title\": \"Sprint Review\""));
}

#[test]
fn exported_contents_import_back_to_equal_document() {
    let document = sprint_review();

    let export = export_file(&document).unwrap();
    let imported = import_from_str(export.contents.as_str()).unwrap();

    assert_eq!(imported, document);
}

#[test]
fn export_to_dir_writes_named_file() {
    let dir = tempfile::tempdir().unwrap();
    let document = sprint_review();

    let path = export_to_dir(&document, dir.path()).unwrap();

    assert_eq!(path, dir.path().join("meeting-2024-03-01.json"));
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(import_from_str(written.as_str()).unwrap(), document);
}

#[test]
fn export_to_missing_dir_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");

    let err = export_to_dir(&sprint_review(), &missing).unwrap_err();

    match err {
        PersistenceError::Io { path, .. } => {
            assert_eq!(path, missing.join("meeting-2024-03-01.json"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn import_rejects_malformed_and_incomplete_files() {
    assert!(import_from_str("this is not json").is_err());
    assert!(import_from_str("[]").is_err());

    let err = import_from_str(r#"{"title": "No topics", "date": "2024-01-01"}"#).unwrap_err();
    assert!(err.message.contains("topics"));
}

#[test]
fn import_accepts_hand_written_ids() {
    let raw = r#"{
        "title": "Hand edited",
        "date": "2024-03-01",
        "topics": [
            {
                "id": "topic-1",
                "title": "A",
                "completed": false,
                "comment": "",
                "subtopics": [{ "id": "s1", "title": "B", "completed": true }]
            },
            { "id": 42, "title": "C" },
            { "id": null, "title": "D" }
        ]
    }"#;

    let document = import_from_str(raw).unwrap();

    assert_eq!(document.title, "Hand edited");
    assert_eq!(document.topics.len(), 3);
    assert_eq!(document.topics[0].subtopics[0].title, "B");
    assert!(document.topics[0].subtopics[0].completed);
    let mut ids = std::collections::HashSet::new();
    for topic in &document.topics {
        assert!(ids.insert(topic.id));
        for subtopic in &topic.subtopics {
            assert!(ids.insert(subtopic.id));
        }
    }
}

#[test]
fn import_keeps_valid_uuid_ids() {
    let id = "6f1c2d3e-4b5a-4c7d-8e9f-0a1b2c3d4e5f";
    let raw = format!(
        r#"{{"title":"Kept","date":"2024-03-01","topics":[{{"id":"{id}","title":"A"}}]}}"#
    );

    let document = import_from_str(raw.as_str()).unwrap();

    assert_eq!(document.topics[0].id.to_string(), id);
}

#[test]
fn import_replaces_repeated_ids() {
    let id = "6f1c2d3e-4b5a-4c7d-8e9f-0a1b2c3d4e5f";
    let raw = format!(
        r#"{{"title":"Dup","date":"2024-03-01","topics":[
            {{"id":"{id}","title":"A","subtopics":[{{"id":"{id}","title":"A.1"}}]}},
            {{"id":"{id}","title":"B"}}
        ]}}"#
    );

    let document = import_from_str(raw.as_str()).unwrap();

    assert_eq!(document.topics[0].id.to_string(), id);
    assert_ne!(document.topics[0].subtopics[0].id, document.topics[0].id);
    assert_ne!(document.topics[1].id, document.topics[0].id);
    assert_ne!(document.topics[1].id, document.topics[0].subtopics[0].id);
}
