//! Store Module
//!
//! 取り込みパイプラインの外部コラボレーター（Blobストアとドキュメントストア）の
//! インターフェースと、ローカル実装を提供します。

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::IngestError;
use crate::security::validate_zip_path;
use crate::types::MovieRecord;

/// Blobストア
///
/// コンテナ名とBlob名からファイル全体のバイト列を取得します。
pub trait BlobStore {
    /// Blobを取得する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<u8>)` - Blobの内容
    /// * `Err(IngestError::NotFound)` - コンテナまたはBlobが存在しない場合
    fn get_blob(&self, container: &str, blob: &str) -> Result<Vec<u8>, IngestError>;
}

/// ドキュメントストア
///
/// `id`をキーとしてJSONドキュメントを挿入または更新します。
pub trait DocumentStore {
    fn upsert(
        &self,
        database: &str,
        container: &str,
        id: &str,
        document: Value,
    ) -> Result<(), IngestError>;
}

/// バッチ全体をドキュメントストアに書き込む
///
/// 途中で失敗してもすべてのレコードの書き込みを試みます。
/// 戻り値はすべての書き込みが成功した場合のみ`true`で、
/// どのレコードが失敗したかは返しません（ログにのみ出力します）。
pub fn upsert_batch<D>(store: &D, database: &str, container: &str, records: &[MovieRecord]) -> bool
where
    D: DocumentStore + ?Sized,
{
    let mut success = true;

    for record in records {
        let result = serde_json::to_value(record)
            .map_err(IngestError::from)
            .and_then(|document| store.upsert(database, container, &record.id, document));

        if let Err(e) = result {
            log::warn!(
                "Movie '{}' could not be upserted into {}.{}: {}",
                record.id,
                database,
                container,
                e
            );
            success = false;
        }
    }

    success
}

/// メモリ上のBlobストア
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    containers: HashMap<String, HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blobを追加する（コンテナがなければ作成）
    pub fn insert(&mut self, container: &str, blob: &str, bytes: Vec<u8>) {
        self.containers
            .entry(container.to_string())
            .or_default()
            .insert(blob.to_string(), bytes);
    }

    /// 空のコンテナを作成する
    pub fn create_container(&mut self, container: &str) {
        self.containers.entry(container.to_string()).or_default();
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get_blob(&self, container: &str, blob: &str) -> Result<Vec<u8>, IngestError> {
        self.containers
            .get(container)
            .and_then(|blobs| blobs.get(blob))
            .cloned()
            .ok_or_else(|| IngestError::NotFound {
                container: container.to_string(),
                blob: blob.to_string(),
            })
    }
}

/// ディレクトリをBlobストアとして扱う実装
///
/// `root/<container>/<blob>`のファイルを読み込みます。
/// Blob名にはパストラバーサル対策の検証を適用します。
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BlobStore for FsBlobStore {
    fn get_blob(&self, container: &str, blob: &str) -> Result<Vec<u8>, IngestError> {
        let not_found = || IngestError::NotFound {
            container: container.to_string(),
            blob: blob.to_string(),
        };

        validate_zip_path(container)
            .and_then(|_| validate_zip_path(blob))
            .map_err(|e| IngestError::SecurityViolation(format!("Invalid blob path: {}", e)))?;

        let container_dir = self.root.join(container);
        if !container_dir.is_dir() {
            return Err(not_found());
        }

        let blob_path = container_dir.join(blob);
        if !blob_path.is_file() {
            return Err(not_found());
        }

        match std::fs::read(blob_path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }
}

type DocumentKey = (String, String, String);

/// メモリ上のドキュメントストア
///
/// (データベース, コンテナ, id) をキーにドキュメントを保持します。
/// 複数スレッドからの同時書き込みに対応します。
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<BTreeMap<DocumentKey, Value>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みドキュメントを取得する
    pub fn get(&self, database: &str, container: &str, id: &str) -> Option<Value> {
        let key = (database.to_string(), container.to_string(), id.to_string());
        self.lock().get(&key).cloned()
    }

    /// 保存済みドキュメント数
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<DocumentKey, Value>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn upsert(
        &self,
        database: &str,
        container: &str,
        id: &str,
        document: Value,
    ) -> Result<(), IngestError> {
        if id.trim().is_empty() {
            return Err(IngestError::Upsert("document id must not be blank".to_string()));
        }
        let key = (database.to_string(), container.to_string(), id.to_string());
        self.lock().insert(key, document);
        Ok(())
    }
}
