use image::{Rgba, RgbaImage};

use super::*;
use crate::imaging::export::encode_png;

fn png_bytes() -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]))).unwrap()
}

fn service() -> StorageService {
    let config = StudioConfig::in_memory("http://studio.test");
    StorageService::new(Arc::new(MemoryStore::new()), &config)
}

fn token_of(url: &str) -> &str {
    url.split("token=").nth(1).unwrap()
}

#[test]
fn upload_url_carries_id_and_token() {
    let svc = service();
    let grant = svc.request_upload();
    let prefix = format!("http://studio.test/api/objects/uploads/{}?token=", grant.object_id);
    assert!(grant.upload_url.starts_with(&prefix), "{}", grant.upload_url);
    assert_eq!(token_of(&grant.upload_url).len(), 32);
}

#[tokio::test]
async fn uploaded_object_is_private_until_published() {
    let svc = service();
    let grant = svc.request_upload();
    let bytes = png_bytes();
    let meta = svc
        .accept_upload(grant.object_id, token_of(&grant.upload_url), Some("image/png"), bytes.clone())
        .await
        .unwrap();
    assert_eq!(meta.visibility, Visibility::Private);
    assert_eq!(meta.size, bytes.len() as u64);
    assert_eq!(meta.sha256.len(), 64);

    assert!(matches!(svc.fetch_public(grant.object_id).await, Err(StorageError::NotFound(_))));

    let path = svc.publish(&grant.upload_url).await.unwrap();
    assert_eq!(path, format!("/objects/uploads/{}", grant.object_id));

    let obj = svc.fetch_public(grant.object_id).await.unwrap();
    assert_eq!(obj.bytes, bytes);
    assert_eq!(obj.meta.content_type, "image/png");
}

#[tokio::test]
async fn ticket_is_single_use() {
    let svc = service();
    let grant = svc.request_upload();
    let token = token_of(&grant.upload_url).to_string();
    svc.accept_upload(grant.object_id, &token, Some("image/png"), png_bytes())
        .await
        .unwrap();
    let err = svc
        .accept_upload(grant.object_id, &token, Some("image/png"), png_bytes())
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rejected_body_leaves_ticket_usable() {
    let svc = service();
    let grant = svc.request_upload();
    let token = token_of(&grant.upload_url).to_string();

    let err = svc
        .accept_upload(grant.object_id, &token, Some("text/html"), png_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::UnsupportedContentType(_)));

    assert!(
        svc.accept_upload(grant.object_id, &token, Some("image/png; charset=binary"), png_bytes())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn body_checks() {
    let mut config = StudioConfig::in_memory("http://studio.test");
    config.max_upload_bytes = 16;
    let svc = StorageService::new(Arc::new(MemoryStore::new()), &config);
    let grant = svc.request_upload();
    let token = token_of(&grant.upload_url).to_string();
    let id = grant.object_id;

    let empty = svc.accept_upload(id, &token, Some("image/png"), Vec::new()).await;
    assert!(matches!(empty, Err(StorageError::EmptyBody)));

    let big = svc.accept_upload(id, &token, Some("image/png"), vec![0; 17]).await;
    assert!(matches!(big, Err(StorageError::TooLarge { size: 17, limit: 16 })));

    let svg = svc
        .accept_upload(id, &token, Some("image/svg+xml"), b"<svg/>".to_vec())
        .await;
    assert!(matches!(svg, Err(StorageError::UnsupportedContentType(_))));

    let missing = svc.accept_upload(id, &token, None, b"abc".to_vec()).await;
    assert!(matches!(missing, Err(StorageError::UnsupportedContentType(_))));

    let garbage = svc
        .accept_upload(id, &token, Some("image/png"), b"not a png".to_vec())
        .await;
    assert!(matches!(garbage, Err(StorageError::UnsupportedContentType(_))));
}

#[tokio::test]
async fn unknown_ticket_is_forbidden() {
    let svc = service();
    let err = svc
        .accept_upload(Uuid::new_v4(), "deadbeef", Some("image/png"), png_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::TicketRejected(TicketRejection::Unknown)));
}

#[tokio::test]
async fn publish_unknown_object_is_not_found() {
    let svc = service();
    let err = svc
        .publish(&object_path(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn publish_is_idempotent() {
    let svc = service();
    let grant = svc.request_upload();
    svc.accept_upload(grant.object_id, token_of(&grant.upload_url), Some("image/png"), png_bytes())
        .await
        .unwrap();
    let first = svc.publish(&grant.upload_url).await.unwrap();
    let second = svc.publish(&first).await.unwrap();
    assert_eq!(first, second);
}

#[test]
fn parse_object_ref_forms() {
    let id = Uuid::new_v4();
    let expect = |raw: String| assert_eq!(parse_object_ref(&raw).unwrap(), id, "{raw}");
    expect(format!("https://cdn.example/api/objects/uploads/{id}?token=abc"));
    expect(format!("/api/objects/uploads/{id}"));
    expect(format!("/objects/uploads/{id}"));
    expect(format!("http://h:3000/objects/uploads/{id}/"));
    expect(format!("  /objects/uploads/{id}#frag "));
}

#[test]
fn parse_object_ref_rejects_other_paths() {
    for raw in ["", "/objects/uploads/", "/objects/uploads/not-a-uuid", "https://example.com", "/other/123"] {
        assert!(matches!(parse_object_ref(raw), Err(StorageError::InvalidPath(_))), "{raw}");
    }
}

#[test]
fn public_url_joins_base() {
    let svc = service();
    assert_eq!(svc.public_url("/objects/uploads/x"), "http://studio.test/objects/uploads/x");
}

#[test]
fn error_codes() {
    assert_eq!(StorageError::EmptyBody.error_code(), "E_EMPTY_BODY");
    assert_eq!(StorageError::TooLarge { size: 2, limit: 1 }.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(StorageError::Io(std::io::Error::other("disk")).retryable());
    assert!(!StorageError::NotFound(Uuid::nil()).retryable());
}

#[tokio::test]
async fn open_store_memory() {
    let config = StudioConfig::in_memory("http://studio.test");
    let store = open_store(&config).await.unwrap();
    assert!(store.head(Uuid::new_v4()).await.unwrap().is_none());
}

/// Memory store whose first `put` fails with an I/O error.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    failed_once: std::sync::atomic::AtomicBool,
}

#[async_trait::async_trait]
impl ObjectStore for FlakyStore {
    async fn put(&self, meta: ObjectMeta, bytes: Vec<u8>) -> Result<(), StorageError> {
        if !self.failed_once.swap(true, std::sync::atomic::Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.inner.put(meta, bytes).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredObject>, StorageError> {
        self.inner.get(id).await
    }

    async fn head(&self, id: Uuid) -> Result<Option<ObjectMeta>, StorageError> {
        self.inner.head(id).await
    }

    async fn set_visibility(&self, id: Uuid, visibility: Visibility) -> Result<Option<ObjectMeta>, StorageError> {
        self.inner.set_visibility(id, visibility).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StorageError> {
        self.inner.delete(id).await
    }
}

#[tokio::test]
async fn failed_write_keeps_ticket_for_retry() {
    let config = StudioConfig::in_memory("http://studio.test");
    let svc = StorageService::new(Arc::new(FlakyStore::default()), &config);
    let grant = svc.request_upload();
    let token = token_of(&grant.upload_url).to_string();

    let err = svc
        .accept_upload(grant.object_id, &token, Some("image/png"), png_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Io(_)));
    assert!(err.retryable());

    let meta = svc
        .accept_upload(grant.object_id, &token, Some("image/png"), png_bytes())
        .await
        .unwrap();
    assert_eq!(meta.id, grant.object_id);
}
