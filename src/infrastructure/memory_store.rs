//! 内存存储后端
//!
//! 用于测试和本地预览；支持注入一次性故障来验证回滚逻辑

use crate::error::{AppError, AppResult, StorageError};
use crate::infrastructure::store::{
    check_object_path, join_public_url, sort_notes_newest_first, PaperStore,
};
use crate::models::{NewNote, PaperRecord, StoredNote, UploadedPaper};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    objects: HashMap<(String, String), Vec<u8>>,
    papers: Vec<PaperRecord>,
    notes: Vec<StoredNote>,
    next_id: u64,
    fail_next_put: bool,
    fail_next_insert: bool,
    fail_next_delete: bool,
}

impl MemoryState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn take_insert_failure(&mut self, table: &'static str) -> AppResult<()> {
        if std::mem::take(&mut self.fail_next_insert) {
            return Err(StorageError::RecordInsertFailed {
                table,
                reason: "injected failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn take_delete_failure(&mut self, table: &'static str, id: u64) -> AppResult<()> {
        if std::mem::take(&mut self.fail_next_delete) {
            return Err(StorageError::RecordDeleteFailed {
                table,
                id,
                reason: "injected failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// 内存存储后端
#[derive(Debug)]
pub struct MemoryStore {
    public_base_url: String,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// 下一次写对象失败
    pub async fn fail_next_object_put(&self) {
        self.state.lock().await.fail_next_put = true;
    }

    /// 下一次插入记录失败
    pub async fn fail_next_record_insert(&self) {
        self.state.lock().await.fail_next_insert = true;
    }

    /// 下一次删除记录失败
    pub async fn fail_next_record_delete(&self) {
        self.state.lock().await.fail_next_delete = true;
    }

    pub async fn has_object(&self, bucket: &str, path: &str) -> bool {
        self.state
            .lock()
            .await
            .objects
            .contains_key(&(bucket.to_string(), path.to_string()))
    }

    pub async fn object_count(&self) -> usize {
        self.state.lock().await.objects.len()
    }
}

impl PaperStore for MemoryStore {
    fn public_url(&self, bucket: &str, path: &str) -> String {
        join_public_url(&self.public_base_url, bucket, path)
    }

    async fn put_object(&self, bucket: &str, path: &str, bytes: &[u8]) -> AppResult<()> {
        check_object_path(path)?;
        let mut state = self.state.lock().await;

        if std::mem::take(&mut state.fail_next_put) {
            return Err(AppError::object_write_failed(
                bucket,
                path,
                std::io::Error::other("injected failure"),
            ));
        }

        let key = (bucket.to_string(), path.to_string());
        if state.objects.contains_key(&key) {
            return Err(AppError::object_write_failed(
                bucket,
                path,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "object already exists"),
            ));
        }
        state.objects.insert(key, bytes.to_vec());
        Ok(())
    }

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for path in paths {
            state.objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    async fn insert_paper(&self, paper: UploadedPaper) -> AppResult<PaperRecord> {
        let mut state = self.state.lock().await;
        state.take_insert_failure("papers")?;

        let record = PaperRecord {
            id: state.allocate_id(),
            paper,
        };
        state.papers.push(record.clone());
        Ok(record)
    }

    async fn delete_paper(&self, id: u64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.take_delete_failure("papers", id)?;
        let before = state.papers.len();
        state.papers.retain(|r| r.id != id);
        if state.papers.len() == before {
            return Err(AppError::record_not_found("papers", id));
        }
        Ok(())
    }

    async fn list_papers(&self, subject_code: Option<&str>) -> AppResult<Vec<PaperRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .papers
            .iter()
            .filter(|r| subject_code.map_or(true, |code| r.paper.parsed.subject_code == code))
            .cloned()
            .collect())
    }

    async fn insert_note(&self, note: NewNote) -> AppResult<StoredNote> {
        let mut state = self.state.lock().await;
        state.take_insert_failure("notes")?;

        let stored = StoredNote {
            id: state.allocate_id(),
            url: note.url,
            subject_code: note.subject_code,
            title: note.title,
            description: note.description,
            file_name: note.file_name,
            file_path: note.file_path,
            file_size: note.file_size,
            created_at: Utc::now(),
        };
        state.notes.push(stored.clone());
        Ok(stored)
    }

    async fn delete_note(&self, id: u64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.take_delete_failure("notes", id)?;
        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        if state.notes.len() == before {
            return Err(AppError::record_not_found("notes", id));
        }
        Ok(())
    }

    async fn list_notes(&self, subject_code: Option<&str>) -> AppResult<Vec<StoredNote>> {
        let state = self.state.lock().await;
        let mut notes: Vec<StoredNote> = state
            .notes
            .iter()
            .filter(|n| subject_code.map_or(true, |code| n.subject_code == code))
            .cloned()
            .collect();
        sort_notes_newest_first(&mut notes);
        Ok(notes)
    }
}
