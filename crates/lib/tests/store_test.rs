//! # CSV Record Store Tests

use kbrefine::errors::StoreError;
use kbrefine::providers::store::{csv_store::CsvRecordStore, RecordStore, STATUS_COLUMN};
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;

const DATASET: &str = "\
Article title,Article subtitle,Article body,Category
VXLAN,,,Networking
\"BGP, EVPN\",Routing protocol,<p>Old body</p>,
";

#[tokio::test]
async fn test_load_ids_and_read() {
    // --- 1. Arrange ---
    let store = CsvRecordStore::from_reader(DATASET.as_bytes()).unwrap();

    // --- 2. Act ---
    let ids = store.ids().await.unwrap();
    let vxlan = store.read("VXLAN").await.unwrap();
    let bgp = store.read("BGP, EVPN").await.unwrap();

    // --- 3. Assert ---
    assert_eq!(ids, vec!["VXLAN", "BGP, EVPN"]);
    assert_eq!(vxlan.title, "VXLAN");
    assert!(vxlan.subtitle.is_empty());
    assert_eq!(vxlan.category.as_deref(), Some("Networking"));
    assert_eq!(bgp.body, "<p>Old body</p>");
    assert!(bgp.category.is_none());
}

#[tokio::test]
async fn test_unknown_entry_is_not_found() {
    let store = CsvRecordStore::from_reader(DATASET.as_bytes()).unwrap();

    let err = store.read("MPLS").await.unwrap_err();

    assert!(matches!(err, StoreError::NotFound(id) if id == "MPLS"));
}

#[test]
fn test_title_column_is_required() {
    let result = CsvRecordStore::from_reader("Name,Body\nx,y\n".as_bytes());

    assert!(matches!(result, Err(StoreError::MissingColumn(_))));
}

#[tokio::test]
async fn test_write_adds_columns_and_save_quotes_every_field() {
    // --- 1. Arrange ---
    let mut input = NamedTempFile::new().unwrap();
    input.write_all(DATASET.as_bytes()).unwrap();
    let store = CsvRecordStore::open(input.path()).unwrap();
    let fields = BTreeMap::from([
        ("Article subtitle".to_string(), "A new subtitle".to_string()),
        (STATUS_COLUMN.to_string(), "accepted".to_string()),
    ]);

    // --- 2. Act ---
    store.write("VXLAN", &fields).await.unwrap();
    let output = NamedTempFile::new().unwrap();
    store.save(output.path()).await.unwrap();

    // --- 3. Assert ---
    assert_eq!(store.read("VXLAN").await.unwrap().subtitle, "A new subtitle");
    assert_eq!(store.field("VXLAN", STATUS_COLUMN).await.unwrap(), "accepted");
    assert_eq!(store.field("BGP, EVPN", STATUS_COLUMN).await.unwrap(), "");

    let saved = std::fs::read_to_string(output.path()).unwrap();
    let mut lines = saved.lines();
    assert_eq!(
        lines.next().unwrap(),
        "\"Article title\",\"Article subtitle\",\"Article body\",\"Category\",\"processing_status\""
    );
    assert_eq!(
        lines.next().unwrap(),
        "\"VXLAN\",\"A new subtitle\",\"\",\"Networking\",\"accepted\""
    );

    let reloaded = CsvRecordStore::open(output.path()).unwrap();
    assert_eq!(reloaded.ids().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_write_to_unknown_entry_fails() {
    let store = CsvRecordStore::from_reader(DATASET.as_bytes()).unwrap();

    let result = store.write("MPLS", &BTreeMap::new()).await;

    assert!(matches!(result, Err(StoreError::NotFound(_))));
}
