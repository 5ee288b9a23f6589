//! Main client implementation

use crate::{
    transport::{ApiRequest, HttpTransport, RequestBody, Transport},
    types::ObjectListPayload,
    AccountInfo, Cache, ClientError, Config, DownloadOutcome, Endpoint, FileInput, FileSource,
    Logger, ResponseEnvelope, Result, StoredObject, UploadOptions,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// Square Cloud Blob client
pub struct BlobClient {
    config: Config,
    transport: Arc<dyn Transport>,
    cache: Cache,
    log: Logger,
    // Serialize cold fetches so concurrent callers share one request.
    account_fetch: Mutex<()>,
    objects_fetch: Mutex<()>,
}

impl BlobClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, transport)
    }

    /// Create with an API key and default settings
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(Config::new(api_key))
    }

    /// Create from environment variables, see [`Config::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    /// Create with a custom transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let log = Logger::new(config.debug);
        let cache = Cache::new(config.clean_cache_timer, log);

        Ok(Self {
            config,
            transport,
            cache,
            log,
            account_fetch: Mutex::new(()),
            objects_fetch: Mutex::new(()),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the cache
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Drop cached account info and objects
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    // ==================== Account ====================

    /// Account info, served from the cache when present
    pub async fn get_account_info(&self) -> Result<AccountInfo> {
        if let Some(account) = self.cache.account() {
            return Ok(account);
        }
        let _guard = self.account_fetch.lock().await;
        if let Some(account) = self.cache.account() {
            return Ok(account);
        }
        self.fetch_account_info().await
    }

    /// Fetch account info from the API and cache it.
    ///
    /// The API refreshes these numbers about every two hours; prefer
    /// [`get_account_info`](Self::get_account_info).
    #[instrument(skip(self))]
    pub async fn fetch_account_info(&self) -> Result<AccountInfo> {
        let endpoint = Endpoint::AccountInfo;
        self.log.info(format!("Fetching account info from {}", endpoint));

        let envelope = self.call(ApiRequest::new(endpoint)).await?;
        let account: AccountInfo = envelope.payload_as()?;
        self.cache.set_account(account.clone());
        Ok(account)
    }

    // ==================== Objects ====================

    /// All stored objects, served from the cache when a non-empty list is cached
    pub async fn get_objects(&self) -> Result<Vec<StoredObject>> {
        if let Some(objects) = self.cached_objects() {
            return Ok(objects);
        }
        let _guard = self.objects_fetch.lock().await;
        if let Some(objects) = self.cached_objects() {
            return Ok(objects);
        }
        self.fetch_objects().await
    }

    /// Fetch the object list from the API and replace the cached list
    #[instrument(skip(self))]
    pub async fn fetch_objects(&self) -> Result<Vec<StoredObject>> {
        let endpoint = Endpoint::ListObjects;
        self.log.info(format!("Fetching objects from {}", endpoint));

        let envelope = self.call(ApiRequest::new(endpoint)).await?;
        let objects: Vec<StoredObject> = envelope
            .payload_as::<ObjectListPayload>()?
            .into_entries()
            .into_iter()
            .map(|entry| {
                let url = self.config.object_url(&entry.id);
                StoredObject::from_entry(entry, url)
            })
            .collect();

        self.log.info(format!("Found {} objects", objects.len()));
        self.cache.set_objects(objects.clone());
        Ok(objects)
    }

    /// Upload a file as `name`.
    ///
    /// The file is validated before anything is sent. The cached object
    /// list is left untouched; call [`fetch_objects`](Self::fetch_objects)
    /// to see the new object.
    #[instrument(skip(self, source, options))]
    pub async fn upload_object(
        &self,
        name: &str,
        source: impl Into<FileSource>,
        options: UploadOptions,
    ) -> Result<ResponseEnvelope> {
        let endpoint = Endpoint::Upload;
        let input = FileInput::new(source.into(), options.mimetype.as_deref())?;
        let (data, mimetype, file_name) = input.into_parts();

        let request = ApiRequest::new(endpoint)
            .with_query(options.query(name))
            .with_body(RequestBody::Multipart {
                data,
                mimetype,
                file_name: file_name.unwrap_or_else(|| name.to_string()),
            });

        self.log.info(format!("Uploading {:?} to {}", name, endpoint));
        self.call(request).await
    }

    /// Delete objects in one request.
    ///
    /// On success every requested id is dropped from the cached list; the
    /// API reports failures for the whole batch, not per id.
    #[instrument(skip(self, objects), fields(count = objects.len()))]
    pub async fn delete_objects(&self, objects: &[StoredObject]) -> Result<ResponseEnvelope> {
        if objects.is_empty() {
            return Err(ClientError::InvalidInput("no objects to delete".to_string()));
        }
        let endpoint = Endpoint::Delete;
        let ids: Vec<&str> = objects.iter().map(StoredObject::id).collect();

        self.log.info(format!("Deleting {} object(s) via {}", ids.len(), endpoint));
        let request =
            ApiRequest::new(endpoint).with_body(RequestBody::Json(json!({ "objects": ids })));
        let envelope = self.call(request).await?;

        let removed = self.cache.remove_objects(&ids);
        tracing::debug!(removed, "pruned deleted objects from cache");
        Ok(envelope)
    }

    /// Delete a single object
    pub async fn delete_object(&self, object: &StoredObject) -> Result<ResponseEnvelope> {
        self.delete_objects(std::slice::from_ref(object)).await
    }

    /// Download an object into the configured download directory.
    ///
    /// HTTP and connection failures are logged and returned as
    /// [`DownloadOutcome::Failed`]; only local disk errors are `Err`.
    #[instrument(skip(self, object), fields(id = object.id()))]
    pub async fn download_object(&self, object: &StoredObject) -> Result<DownloadOutcome> {
        let file_name = object.file_name();
        if file_name.is_empty() || file_name == "." || file_name == ".." {
            return Err(ClientError::InvalidInput(format!(
                "object id {:?} has no usable file name",
                object.id()
            )));
        }

        self.log.info(format!("Downloading object from {}", object.url()));
        let response = match self.transport.download(object.url()).await {
            Ok(response) => response,
            Err(e) => {
                self.log
                    .warn(format!("Failed to download object from {}: {}", object.url(), e));
                return Ok(DownloadOutcome::Failed {
                    status: None,
                    reason: e.to_string(),
                });
            }
        };

        if response.status != 200 {
            self.log.warn(format!(
                "Failed to download object from {}. Status code: {}",
                object.url(),
                response.status
            ));
            return Ok(DownloadOutcome::Failed {
                status: Some(response.status),
                reason: format!("HTTP {}", response.status),
            });
        }

        let path = self.config.download_dir.join(file_name);
        let written = match tokio::fs::create_dir_all(&self.config.download_dir).await {
            Ok(()) => tokio::fs::write(&path, &response.body).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            self.log
                .error(format!("Could not save {} to {}: {}", object.id(), path.display(), e));
            return Err(e.into());
        }
        self.log.info(format!("Downloaded object and saved in {}", path.display()));
        Ok(DownloadOutcome::Saved(path))
    }

    // ==================== Helper Methods ====================

    fn cached_objects(&self) -> Option<Vec<StoredObject>> {
        self.cache.objects().filter(|objects| !objects.is_empty())
    }

    async fn call(&self, request: ApiRequest) -> Result<ResponseEnvelope> {
        let envelope = self.transport.send(request).await?;
        if let Some(err) = envelope.error() {
            let code = envelope.error_code().unwrap_or("unknown");
            self.log.warn(format!(
                "Error occurred during {} request: {}",
                envelope.endpoint().name(),
                code
            ));
            if let Some(hint) = envelope.hint() {
                self.log.warn(hint);
            }
            return Err(err);
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RawResponse;
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex as SyncMutex;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::time::Duration;

    /// In-memory stand-in for the blob API
    #[derive(Default)]
    struct MemoryTransport {
        objects: SyncMutex<Vec<Value>>,
        calls: SyncMutex<Vec<ApiRequest>>,
        failures: SyncMutex<HashMap<Endpoint, &'static str>>,
        downloads: SyncMutex<HashMap<String, RawResponse>>,
    }

    impl MemoryTransport {
        fn with_objects(ids: &[&str]) -> Arc<Self> {
            let transport = Self::default();
            *transport.objects.lock() = ids
                .iter()
                .map(|id| json!({"id": id, "size": 2048, "created_at": "2024-05-01T12:00:00Z"}))
                .collect();
            Arc::new(transport)
        }

        fn fail(&self, endpoint: Endpoint, code: &'static str) {
            self.failures.lock().insert(endpoint, code);
        }

        fn calls_to(&self, endpoint: Endpoint) -> Vec<ApiRequest> {
            self.calls
                .lock()
                .iter()
                .filter(|r| r.endpoint == endpoint)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send(&self, request: ApiRequest) -> Result<ResponseEnvelope> {
            tokio::task::yield_now().await;
            self.calls.lock().push(request.clone());

            let endpoint = request.endpoint;
            if let Some(code) = self.failures.lock().get(&endpoint) {
                return Ok(ResponseEnvelope::new(
                    json!({"status": "error", "code": code}),
                    endpoint,
                    400,
                ));
            }

            let response = match endpoint {
                Endpoint::AccountInfo => json!({
                    "objects": self.objects.lock().len(),
                    "storage_occupied": 4096,
                    "plan_included": 1_073_741_824u64,
                    "billing": {
                        "extra_storage": 0,
                        "storage_price": 0,
                        "objects_price": 0,
                        "total_estimate": 0
                    }
                }),
                Endpoint::ListObjects => json!({ "objects": *self.objects.lock() }),
                Endpoint::Upload => {
                    let name = request.query_value("name").unwrap_or_default();
                    let id = match request.query_value("prefix") {
                        Some(prefix) => format!("user/{}_{}", prefix, name),
                        None => format!("user/{}", name),
                    };
                    let size = match &request.body {
                        RequestBody::Multipart { data, .. } => data.len(),
                        _ => 0,
                    };
                    let object = json!({"id": id, "size": size});
                    self.objects.lock().push(object.clone());
                    object
                }
                Endpoint::Delete => {
                    if let RequestBody::Json(body) = &request.body {
                        let ids: Vec<String> =
                            serde_json::from_value(body["objects"].clone()).unwrap_or_default();
                        self.objects
                            .lock()
                            .retain(|o| !ids.iter().any(|id| o["id"] == id.as_str()));
                    }
                    json!("success")
                }
            };

            Ok(ResponseEnvelope::new(
                json!({"status": "success", "response": response}),
                endpoint,
                200,
            ))
        }

        async fn download(&self, url: &str) -> Result<RawResponse> {
            self.downloads
                .lock()
                .get(url)
                .cloned()
                .ok_or_else(|| ClientError::InvalidResponse(format!("connection refused: {url}")))
        }
    }

    fn client(transport: Arc<MemoryTransport>) -> BlobClient {
        BlobClient::with_transport(Config::new("test-key"), transport).unwrap()
    }

    fn pdf(len: usize) -> Vec<u8> {
        let mut data = b"%PDF-1.7\n".to_vec();
        data.resize(len, b' ');
        data
    }

    #[tokio::test]
    async fn test_account_info_is_cached() {
        let transport = MemoryTransport::with_objects(&["user/a.png"]);
        let client = client(transport.clone());

        let first = client.get_account_info().await.unwrap();
        let second = client.get_account_info().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.objects, 1);
        assert_eq!(transport.calls_to(Endpoint::AccountInfo).len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_cold_reads_share_one_fetch() {
        let transport = MemoryTransport::with_objects(&["user/a.png"]);
        let client = client(transport.clone());

        let (a, b, c) = tokio::join!(
            client.get_objects(),
            client.get_objects(),
            client.get_objects()
        );
        assert_eq!(a.unwrap().len(), 1);
        assert_eq!(b.unwrap().len(), 1);
        assert_eq!(c.unwrap().len(), 1);
        assert_eq!(transport.calls_to(Endpoint::ListObjects).len(), 1);
    }

    #[tokio::test]
    async fn test_objects_built_with_public_url() {
        let transport = MemoryTransport::with_objects(&["user/docs_report.pdf"]);
        let client = client(transport);

        let objects = client.get_objects().await.unwrap();
        assert_eq!(objects[0].id(), "user/docs_report.pdf");
        assert_eq!(objects[0].size(), 2048);
        assert_eq!(objects[0].created_at(), Some("2024-05-01T12:00:00Z"));
        assert_eq!(
            objects[0].url(),
            "https://public-blob.squarecloud.dev/user/docs_report.pdf"
        );
    }

    #[tokio::test]
    async fn test_empty_object_list_is_refetched() {
        let transport = MemoryTransport::with_objects(&[]);
        let client = client(transport.clone());

        assert!(client.get_objects().await.unwrap().is_empty());
        assert!(client.get_objects().await.unwrap().is_empty());
        assert_eq!(transport.calls_to(Endpoint::ListObjects).len(), 2);
    }

    #[tokio::test]
    async fn test_delete_prunes_requested_ids_from_cache() {
        let transport = MemoryTransport::with_objects(&["a", "c"]);
        let client = client(transport.clone());
        let cached = client.get_objects().await.unwrap();
        assert_eq!(cached.len(), 2);

        let b = StoredObject::new("b", 1, None, None, "unused");
        let envelope = client.delete_objects(&[cached[0].clone(), b]).await.unwrap();
        assert!(envelope.is_success());

        let ids: Vec<String> = client
            .get_objects()
            .await
            .unwrap()
            .iter()
            .map(|o| o.id().to_string())
            .collect();
        assert_eq!(ids, vec!["c"]);
        assert_eq!(transport.calls_to(Endpoint::ListObjects).len(), 1);

        let delete = &transport.calls_to(Endpoint::Delete)[0];
        match &delete.body {
            RequestBody::Json(body) => assert_eq!(body, &json!({"objects": ["a", "b"]})),
            other => panic!("Expected JSON body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_cache() {
        let transport = MemoryTransport::with_objects(&["a"]);
        transport.fail(Endpoint::Delete, "FAILED_DELETE");
        let client = client(transport.clone());
        let cached = client.get_objects().await.unwrap();

        let result = client.delete_object(&cached[0]).await;
        assert!(matches!(result, Err(ClientError::FailedToDelete)));
        assert_eq!(client.cache().objects().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_nothing_is_rejected() {
        let transport = MemoryTransport::with_objects(&[]);
        let client = client(transport.clone());

        let result = client.delete_objects(&[]).await;
        assert!(matches!(result, Err(ClientError::InvalidInput(_))));
        assert!(transport.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_upload_drops_out_of_range_expire() {
        let transport = MemoryTransport::with_objects(&[]);
        let client = client(transport.clone());

        let options = UploadOptions::new().with_expire(400).with_prefix("docs");
        client.upload_object("report", pdf(2048), options).await.unwrap();

        let upload = &transport.calls_to(Endpoint::Upload)[0];
        assert_eq!(upload.query_value("expire"), None);
        assert_eq!(upload.query_value("prefix"), Some("docs"));
        assert_eq!(upload.query_value("auto_download"), Some("true"));
        assert_eq!(upload.query_value("security_hash"), Some("false"));
        match &upload.body {
            RequestBody::Multipart {
                data,
                mimetype,
                file_name,
            } => {
                assert_eq!(data.len(), 2048);
                assert_eq!(mimetype, "application/pdf");
                assert_eq!(file_name, "report");
            }
            other => panic!("Expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_upload_sends_nothing() {
        let transport = MemoryTransport::with_objects(&[]);
        let client = client(transport.clone());

        let result = client
            .upload_object("tiny", Bytes::from_static(b"%PDF-"), UploadOptions::default())
            .await;
        assert!(matches!(result, Err(ClientError::FileTooSmall { size: 5 })));
        assert!(transport.calls.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_visible_after_cache_expiry() {
        let transport = MemoryTransport::with_objects(&["user/old.png"]);
        let client = client(transport.clone());
        assert_eq!(client.get_objects().await.unwrap().len(), 1);

        client
            .upload_object("fresh", pdf(4096), UploadOptions::new().with_expire(30))
            .await
            .unwrap();
        // Still the cached list.
        assert_eq!(client.get_objects().await.unwrap().len(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        let objects = client.get_objects().await.unwrap();
        assert!(objects.iter().any(|o| o.id() == "user/fresh"));
        assert_eq!(transport.calls_to(Endpoint::ListObjects).len(), 2);
    }

    #[tokio::test]
    async fn test_error_envelope_is_typed_and_not_cached() {
        let transport = MemoryTransport::with_objects(&[]);
        transport.fail(Endpoint::AccountInfo, "ACCESS_DENIED");
        let client = client(transport.clone());

        assert!(matches!(client.get_account_info().await, Err(ClientError::Unauthorized)));
        assert!(client.cache().account().is_none());
        assert!(client.get_account_info().await.is_err());
        assert_eq!(transport.calls_to(Endpoint::AccountInfo).len(), 2);
    }

    #[tokio::test]
    async fn test_download_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let transport = MemoryTransport::with_objects(&[]);
        let config = Config::new("test-key").with_download_dir(dir.path().join("downloads"));
        let client = BlobClient::with_transport(config, transport.clone()).unwrap();

        let ok = StoredObject::new("user/ok.txt", 5, None, None, "http://blob/ok");
        let missing = StoredObject::new("user/missing.txt", 5, None, None, "http://blob/missing");
        let offline = StoredObject::new("user/offline.txt", 5, None, None, "http://blob/offline");
        transport.downloads.lock().insert(
            "http://blob/ok".to_string(),
            RawResponse {
                status: 200,
                body: Bytes::from_static(b"hello"),
            },
        );
        transport.downloads.lock().insert(
            "http://blob/missing".to_string(),
            RawResponse {
                status: 404,
                body: Bytes::new(),
            },
        );

        let saved = client.download_object(&ok).await.unwrap();
        let path = dir.path().join("downloads").join("ok.txt");
        assert_eq!(saved, DownloadOutcome::Saved(path.clone()));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");

        match client.download_object(&missing).await.unwrap() {
            DownloadOutcome::Failed { status, .. } => assert_eq!(status, Some(404)),
            other => panic!("Expected failure, got {other:?}"),
        }
        assert!(!dir.path().join("downloads").join("missing.txt").exists());

        let outcome = client.download_object(&offline).await.unwrap();
        assert!(matches!(outcome, DownloadOutcome::Failed { status: None, .. }));
    }

    #[tokio::test]
    async fn test_download_disk_failure_is_error() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let transport = MemoryTransport::with_objects(&[]);
        // The download directory is an existing regular file.
        let config = Config::new("test-key").with_download_dir(blocker.path());
        let client = BlobClient::with_transport(config, transport.clone()).unwrap();

        transport.downloads.lock().insert(
            "http://blob/ok".to_string(),
            RawResponse {
                status: 200,
                body: Bytes::from_static(b"hello"),
            },
        );
        let ok = StoredObject::new("user/ok.txt", 5, None, None, "http://blob/ok");

        assert!(matches!(client.download_object(&ok).await, Err(ClientError::Io(_))));
    }

    #[test]
    fn test_rejects_empty_api_key() {
        let result = BlobClient::with_transport(Config::default(), MemoryTransport::with_objects(&[]));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
