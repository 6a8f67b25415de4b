use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn put_get_delete_round_trip() {
    let dir = tempdir().expect("temp dir");
    let storage = LocalFileStorage::new(dir.path().to_path_buf());

    storage.put("abc-report.pdf", b"bytes").await.unwrap();
    assert_eq!(storage.get("abc-report.pdf").await.unwrap(), b"bytes");

    storage.delete("abc-report.pdf").await.unwrap();
    assert!(matches!(
        storage.get("abc-report.pdf").await,
        Err(DomainError::FileMissing { .. })
    ));
}

#[tokio::test]
async fn get_missing_key_is_file_missing() {
    let dir = tempdir().expect("temp dir");
    let storage = LocalFileStorage::new(dir.path().to_path_buf());

    assert!(matches!(
        storage.get("never-stored").await,
        Err(DomainError::FileMissing { .. })
    ));
}

#[tokio::test]
async fn delete_missing_key_is_file_missing() {
    let dir = tempdir().expect("temp dir");
    let storage = LocalFileStorage::new(dir.path().to_path_buf());

    assert!(matches!(
        storage.delete("never-stored").await,
        Err(DomainError::FileMissing { .. })
    ));
}

#[tokio::test]
async fn keys_cannot_escape_the_root() {
    let dir = tempdir().expect("temp dir");
    let storage = LocalFileStorage::new(dir.path().join("root"));

    storage.put("../escape.txt", b"bytes").await.unwrap();

    // The separator is flattened, so the file lands under the root.
    assert!(!dir.path().join("escape.txt").exists());
    assert_eq!(storage.get("../escape.txt").await.unwrap(), b"bytes");
}

#[test]
fn reports_local_kind() {
    let storage = LocalFileStorage::new(std::path::PathBuf::from("/tmp"));
    assert_eq!(storage.kind(), StorageKind::Local);
}
