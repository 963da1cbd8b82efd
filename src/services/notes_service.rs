//! 笔记服务 - 业务能力层
//!
//! 按科目上传、列出、删除 PDF 笔记，并为知识点查找对应笔记。

use crate::error::{AppResult, UploadError};
use crate::infrastructure::{storage_path, PaperStore};
use crate::models::{IncomingFile, NewNote, StoredNote, PDF_MIME_TYPE};
use crate::services::paper_library::remove_object_logged;
use crate::services::UploadSummary;
use chrono::Utc;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{error, info, warn};

static SECTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\s+").expect("section prefix pattern is valid"));

/// 笔记服务
pub struct NotesService {
    bucket: String,
    notes: Vec<StoredNote>,
    // 对象路径序号
    next_object_seq: u64,
}

impl NotesService {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            notes: Vec::new(),
            next_object_seq: 0,
        }
    }

    /// 当前已加载的笔记，最新的在前
    pub fn notes(&self) -> &[StoredNote] {
        &self.notes
    }

    /// 从存储后端加载某个科目的笔记
    pub async fn load_notes<S: PaperStore>(
        &mut self,
        store: &S,
        subject_code: &str,
    ) -> AppResult<usize> {
        self.notes = store.list_notes(Some(subject_code)).await?;
        info!("📚 科目 {} 共有 {} 份笔记", subject_code, self.notes.len());
        Ok(self.notes.len())
    }

    /// 是否已有同名、同大小的笔记
    pub fn is_already_stored(&self, file: &IncomingFile) -> bool {
        self.notes
            .iter()
            .any(|n| n.file_name == file.file_name && n.file_size == Some(file.size_bytes()))
    }

    /// 上传一批笔记
    ///
    /// 只接受 PDF。同一批笔记共用 `title` 和 `description`；
    /// `title` 为空时取文件名去掉扩展名
    pub async fn upload_notes<S: PaperStore>(
        &mut self,
        store: &S,
        subject_code: &str,
        title: &str,
        description: Option<&str>,
        files: Vec<IncomingFile>,
    ) -> UploadSummary {
        let mut summary = UploadSummary::default();

        for file in files {
            if file.mime_type != PDF_MIME_TYPE {
                let rejection = UploadError::UnsupportedMediaType {
                    file_name: file.file_name.clone(),
                    mime_type: file.mime_type.clone(),
                };
                warn!("⚠️ 跳过笔记: {}", rejection);
                summary.record_rejection(&rejection);
                continue;
            }

            let title = match title.trim() {
                "" => note_title(&file.file_name),
                given => given.to_string(),
            };
            let note = NewNote {
                subject_code: subject_code.to_string(),
                title,
                description: description
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
                file_name: file.file_name.clone(),
                file_path: String::new(),
                file_size: Some(file.size_bytes()),
                url: String::new(),
            };

            self.next_object_seq += 1;
            match self.upload_one(store, note, &file.bytes).await {
                Ok(note) => {
                    info!("✓ 笔记已上传: {}", note.title);
                    self.notes.insert(0, note);
                    summary.succeeded += 1;
                }
                Err(e) => {
                    error!("❌ 笔记上传失败 {}: {}", file.file_name, e);
                    summary.storage_failed += 1;
                }
            }
        }

        info!("📤 笔记上传完成: {}", summary);
        summary
    }

    async fn upload_one<S: PaperStore>(
        &self,
        store: &S,
        mut note: NewNote,
        bytes: &[u8],
    ) -> AppResult<StoredNote> {
        let path = storage_path(
            &note.subject_code,
            &note.file_name,
            Utc::now(),
            self.next_object_seq,
        );
        store.put_object(&self.bucket, &path, bytes).await?;

        note.url = store.public_url(&self.bucket, &path);
        note.file_path = path.clone();

        match store.insert_note(note).await {
            Ok(stored) => Ok(stored),
            Err(e) => {
                remove_object_logged(store, &self.bucket, &path).await;
                Err(e)
            }
        }
    }

    /// 删除一份笔记（记录和对象）
    pub async fn remove_note<S: PaperStore>(&mut self, store: &S, id: u64) -> AppResult<()> {
        let file_path = self
            .notes
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.file_path.clone());

        store.delete_note(id).await?;
        if let Some(path) = file_path {
            remove_object_logged(store, &self.bucket, &path).await;
        }

        self.notes.retain(|n| n.id != id);
        info!("🗑️ 已删除笔记 #{}", id);
        Ok(())
    }

    /// 删除全部已加载的笔记
    pub async fn clear_notes<S: PaperStore>(&mut self, store: &S) -> AppResult<usize> {
        let ids: Vec<u64> = self.notes.iter().map(|n| n.id).collect();
        for id in &ids {
            self.remove_note(store, *id).await?;
        }
        Ok(ids.len())
    }
}

/// 文件名去掉扩展名作为标题
pub fn note_title(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

/// 为知识点查找笔记
///
/// 1. 标题或文件名中包含知识点编号（不区分大小写）
/// 2. 否则去掉标题前的 `1.2 ` 编号，取长度大于 2 的单词，任一单词出现在笔记标题中即可
pub fn find_note_for_topic<'a>(
    notes: &'a [StoredNote],
    topic_id: &str,
    topic_title: &str,
) -> Option<&'a StoredNote> {
    let topic_id = topic_id.to_lowercase();
    if !topic_id.is_empty() {
        let by_id = notes.iter().find(|n| {
            n.title.to_lowercase().contains(&topic_id)
                || n.file_name.to_lowercase().contains(&topic_id)
        });
        if by_id.is_some() {
            return by_id;
        }
    }

    let stripped = SECTION_PREFIX.replace(topic_title, "").to_lowercase();
    let keywords: Vec<&str> = stripped
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect();
    if keywords.is_empty() {
        return None;
    }

    notes.iter().find(|n| {
        let title = n.title.to_lowercase();
        keywords.iter().any(|k| title.contains(k))
    })
}
