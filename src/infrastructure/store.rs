//! 存储后端抽象 - 基础设施层
//!
//! 对象存储 + 记录表。业务层只通过 [`PaperStore`] 访问，不关心具体实现。

use crate::error::{AppResult, StorageError};
use crate::models::{NewNote, PaperRecord, StoredNote, UploadedPaper};
use chrono::{DateTime, Utc};
use std::path::{Component, Path};

/// 存储后端
///
/// 记录的 id 和时间戳由实现分配
#[allow(async_fn_in_trait)]
pub trait PaperStore {
    /// 对象的公开访问地址
    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn put_object(&self, bucket: &str, path: &str, bytes: &[u8]) -> AppResult<()>;

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> AppResult<()>;

    async fn insert_paper(&self, paper: UploadedPaper) -> AppResult<PaperRecord>;

    async fn delete_paper(&self, id: u64) -> AppResult<()>;

    /// 按插入顺序返回
    async fn list_papers(&self, subject_code: Option<&str>) -> AppResult<Vec<PaperRecord>>;

    async fn insert_note(&self, note: NewNote) -> AppResult<StoredNote>;

    async fn delete_note(&self, id: u64) -> AppResult<()>;

    /// 按创建时间倒序返回
    async fn list_notes(&self, subject_code: Option<&str>) -> AppResult<Vec<StoredNote>>;
}

/// 对象存储路径：`<科目代码>/<毫秒时间戳>-<序号>-<文件名>`
///
/// 序号由上传方单调递增，同一毫秒内上传同名文件也不会冲突
pub fn storage_path(subject_code: &str, file_name: &str, now: DateTime<Utc>, seq: u64) -> String {
    format!(
        "{}/{}-{}-{}",
        subject_code,
        now.timestamp_millis(),
        seq,
        file_name
    )
}

/// 拼接公开访问地址
pub fn join_public_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), bucket, path)
}

/// 对象路径只能是相对路径，且不能包含 `..`
pub fn check_object_path(path: &str) -> Result<(), StorageError> {
    let valid = !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidPath {
            path: path.to_string(),
        })
    }
}

/// 笔记按创建时间倒序，同一时刻按 id 倒序
pub(crate) fn sort_notes_newest_first(notes: &mut [StoredNote]) {
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
