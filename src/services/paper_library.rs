//! 真题库服务 - 业务能力层
//!
//! 持有本次会话中接收的全部真题文件，负责上传、移除、清空和分组查询。
//! 文件集合由调用方显式持有，不存在全局状态。

use crate::error::AppResult;
use crate::grouping::{find_duplicate_slots, group_papers_for_subject, DuplicateSlot, GroupCache};
use crate::infrastructure::{storage_path, PaperStore, PreviewHandle, PreviewRegistry};
use crate::models::{
    GroupKey, IncomingFile, PaperGroup, PaperRecord, ParsedFileName, UploadedPaper,
};
use crate::parser::validate_upload;
use crate::services::UploadSummary;
use chrono::Utc;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, error, info, warn};

/// 库内条目编号（与存储后端的记录 id 无关）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 库内条目
///
/// 暂存（尚未持久化）的条目持有预览句柄；条目被移除、替换或清空时句柄随之释放
#[derive(Debug)]
pub struct LibraryEntry {
    pub id: EntryId,
    /// 存储后端中的记录 id
    pub record_id: Option<u64>,
    pub paper: UploadedPaper,
    preview: Option<PreviewHandle>,
}

impl LibraryEntry {
    pub fn is_staged(&self) -> bool {
        self.preview.is_some()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }
}

/// 真题库
pub struct PaperLibrary {
    bucket: String,
    entries: Vec<LibraryEntry>,
    next_entry_id: u64,
    // 对象路径序号
    next_object_seq: u64,
    version: u64,
    cache: GroupCache,
    previews: PreviewRegistry,
}

impl PaperLibrary {
    /// 创建真题库
    ///
    /// # 参数
    /// - `bucket`: 真题所在的存储桶
    pub fn new(bucket: impl Into<String>) -> Self {
        Self::with_previews(bucket, PreviewRegistry::new())
    }

    /// 使用外部的预览句柄登记表创建
    pub fn with_previews(bucket: impl Into<String>, previews: PreviewRegistry) -> Self {
        Self {
            bucket: bucket.into(),
            entries: Vec::new(),
            next_entry_id: 0,
            next_object_seq: 0,
            version: 0,
            cache: GroupCache::new(),
            previews,
        }
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// 按处理顺序排列的全部条目
    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&LibraryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 文件集合版本，每次增删都会递增
    pub fn version(&self) -> u64 {
        self.version
    }

    /// 库中出现过的科目代码
    pub fn subject_codes(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .map(|e| e.paper.parsed.subject_code.clone())
            .collect()
    }

    /// 暂存一批文件：只校验和生成预览，不写入存储
    pub fn stage_batch(&mut self, files: Vec<IncomingFile>) -> UploadSummary {
        let mut summary = UploadSummary::default();

        for file in files {
            let parsed = match validate_upload(&file.file_name, &file.mime_type) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("⚠️ 跳过文件: {}", e);
                    summary.record_rejection(&e);
                    continue;
                }
            };

            self.warn_if_slot_taken(&parsed, &file.file_name);

            let size_bytes = file.size_bytes();
            let preview = self.previews.open(file.bytes);
            let paper = UploadedPaper {
                parsed,
                original_file_name: file.file_name,
                storage_path: None,
                size_bytes,
                url: preview.url(),
                uploaded_at: Utc::now(),
            };
            self.push_entry(paper, None, Some(preview));
            summary.succeeded += 1;
        }

        info!("📥 暂存完成: {}", summary);
        summary
    }

    /// 上传一批文件并写入存储
    ///
    /// 非 PDF、文件名不合格、存储失败都只计入失败数，不会中断整批
    pub async fn upload_batch<S: PaperStore>(
        &mut self,
        store: &S,
        files: Vec<IncomingFile>,
    ) -> UploadSummary {
        let mut summary = UploadSummary::default();

        for file in files {
            let parsed = match validate_upload(&file.file_name, &file.mime_type) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("⚠️ 跳过文件: {}", e);
                    summary.record_rejection(&e);
                    continue;
                }
            };

            self.warn_if_slot_taken(&parsed, &file.file_name);

            // 预览句柄只在写入期间存在，离开作用域即释放
            let preview = self.previews.open(file.bytes);
            let seq = self.next_object_seq();
            match persist_paper(
                store,
                &self.bucket,
                parsed,
                &file.file_name,
                preview.bytes(),
                seq,
            )
            .await
            {
                Ok(record) => {
                    debug!("✓ 已上传 {} → 记录 #{}", file.file_name, record.id);
                    self.push_entry(record.paper, Some(record.id), None);
                    summary.succeeded += 1;
                }
                Err(e) => {
                    error!("❌ 上传失败 {}: {}", file.file_name, e);
                    summary.storage_failed += 1;
                }
            }
        }

        info!("📤 上传完成: {}", summary);
        summary
    }

    /// 把所有暂存条目写入存储
    ///
    /// 成功的条目原地替换为存储记录并释放预览句柄，失败的保持暂存
    pub async fn persist_staged<S: PaperStore>(&mut self, store: &S) -> UploadSummary {
        let mut summary = UploadSummary::default();
        let staged: Vec<EntryId> = self
            .entries
            .iter()
            .filter(|e| e.is_staged())
            .map(|e| e.id)
            .collect();

        for id in staged {
            let Some(index) = self.position(id) else {
                continue;
            };
            let seq = self.next_object_seq();
            let entry = &self.entries[index];
            let Some(preview) = entry.preview.as_ref() else {
                continue;
            };

            let result = persist_paper(
                store,
                &self.bucket,
                entry.paper.parsed.clone(),
                &entry.paper.original_file_name,
                preview.bytes(),
                seq,
            )
            .await;

            match result {
                Ok(record) => {
                    let entry = &mut self.entries[index];
                    entry.paper = record.paper;
                    entry.record_id = Some(record.id);
                    entry.preview = None;
                    summary.succeeded += 1;
                }
                Err(e) => {
                    error!("❌ 持久化失败 {}: {}", id, e);
                    summary.storage_failed += 1;
                }
            }
        }

        if summary.succeeded > 0 {
            self.bump_version();
        }
        info!("💾 持久化完成: {}", summary);
        summary
    }

    /// 移除一个条目；已持久化的同时删除记录和对象
    ///
    /// 条目不存在时返回 `Ok(false)`
    pub async fn remove<S: PaperStore>(&mut self, store: &S, id: EntryId) -> AppResult<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        if let Some(record_id) = self.entries[index].record_id {
            store.delete_paper(record_id).await?;
            if let Some(path) = self.entries[index].paper.storage_path.clone() {
                remove_object_logged(store, &self.bucket, &path).await;
            }
        }

        let entry = self.entries.remove(index);
        info!("🗑️ 已移除 {} ({})", entry.paper.original_file_name, id);
        self.bump_version();
        Ok(true)
    }

    /// 清空真题库
    ///
    /// 暂存条目（及其预览句柄）总会被清空；删除存储记录失败的条目保留在库中，
    /// 与存储后端保持一致，并在最后返回遇到的第一个错误
    pub async fn clear<S: PaperStore>(&mut self, store: &S) -> AppResult<usize> {
        let mut first_error = None;
        let mut kept = Vec::new();

        for entry in &self.entries {
            let Some(record_id) = entry.record_id else {
                continue;
            };
            match store.delete_paper(record_id).await {
                Ok(()) => {
                    if let Some(path) = &entry.paper.storage_path {
                        remove_object_logged(store, &self.bucket, path).await;
                    }
                }
                Err(e) => {
                    error!("删除记录 #{} 失败: {}", record_id, e);
                    kept.push(entry.id);
                    first_error.get_or_insert(e);
                }
            }
        }

        let before = self.entries.len();
        self.entries.retain(|e| kept.contains(&e.id));
        let removed = before - self.entries.len();
        self.cache.invalidate();
        self.bump_version();
        info!("🧹 已清空 {} 个文件", removed);

        match first_error {
            Some(e) => {
                warn!("⚠️ {} 个文件未能从存储中删除，仍保留在库中", kept.len());
                Err(e)
            }
            None => Ok(removed),
        }
    }

    /// 是否已有同名、同大小的已持久化文件
    ///
    /// 用于跳过上次运行已经上传过的文件
    pub fn is_already_stored(&self, file: &IncomingFile) -> bool {
        self.entries.iter().any(|e| {
            e.record_id.is_some()
                && e.paper.original_file_name == file.file_name
                && e.paper.size_bytes == file.size_bytes()
        })
    }

    /// 从存储后端加载已有记录，已在库中的记录会被跳过
    pub async fn load_from_store<S: PaperStore>(&mut self, store: &S) -> AppResult<usize> {
        let records = store.list_papers(None).await?;
        let mut loaded = 0;

        for record in records {
            if self.entries.iter().any(|e| e.record_id == Some(record.id)) {
                continue;
            }
            self.push_entry(record.paper, Some(record.id), None);
            loaded += 1;
        }

        if loaded > 0 {
            for duplicate in self.duplicate_slots(None) {
                warn!(
                    "⚠️ 重复的 {} {} {} {}: {} 被 {} 覆盖",
                    duplicate.year,
                    duplicate.session,
                    duplicate.paper_variant,
                    duplicate.document_type,
                    duplicate.overwritten,
                    duplicate.winner
                );
            }
        }

        info!("✓ 从存储加载 {} 个文件", loaded);
        Ok(loaded)
    }

    /// 指定科目的分组结果（带缓存）
    pub fn grouped(&mut self, subject_code: &str) -> Vec<PaperGroup> {
        let entries = &self.entries;
        self.cache.get_or_build(subject_code, self.version, || {
            let papers: Vec<UploadedPaper> = entries.iter().map(|e| e.paper.clone()).collect();
            group_papers_for_subject(&papers, subject_code)
        })
    }

    /// 分组时会被覆盖的槽位
    pub fn duplicate_slots(&self, subject_code: Option<&str>) -> Vec<DuplicateSlot> {
        let papers: Vec<UploadedPaper> = self
            .entries
            .iter()
            .filter(|e| subject_code.map_or(true, |code| e.paper.parsed.subject_code == code))
            .map(|e| e.paper.clone())
            .collect();
        find_duplicate_slots(&papers)
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn push_entry(
        &mut self,
        paper: UploadedPaper,
        record_id: Option<u64>,
        preview: Option<PreviewHandle>,
    ) -> EntryId {
        self.next_entry_id += 1;
        let id = EntryId(self.next_entry_id);
        self.entries.push(LibraryEntry {
            id,
            record_id,
            paper,
            preview,
        });
        self.bump_version();
        id
    }

    fn next_object_seq(&mut self) -> u64 {
        self.next_object_seq += 1;
        self.next_object_seq
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }

    /// 同一科目、同一 (年份, 考试季, 卷别)、同一文档类型已存在时给出警告
    fn warn_if_slot_taken(&self, parsed: &ParsedFileName, file_name: &str) {
        let key = GroupKey::of(parsed);
        let existing = self.entries.iter().rev().find(|e| {
            e.paper.parsed.subject_code == parsed.subject_code
                && e.paper.parsed.document_type == parsed.document_type
                && GroupKey::of(&e.paper.parsed) == key
        });

        if let Some(existing) = existing {
            warn!(
                "⚠️ {} 与 {} 对应同一份 {}，分组时以后上传的为准",
                file_name, existing.paper.original_file_name, parsed.document_type
            );
        }
    }
}

/// 写入对象和记录；记录写入失败时删除已写入的对象
async fn persist_paper<S: PaperStore>(
    store: &S,
    bucket: &str,
    parsed: ParsedFileName,
    file_name: &str,
    bytes: &[u8],
    seq: u64,
) -> AppResult<PaperRecord> {
    let path = storage_path(&parsed.subject_code, file_name, Utc::now(), seq);
    store.put_object(bucket, &path, bytes).await?;

    let paper = UploadedPaper {
        parsed,
        original_file_name: file_name.to_string(),
        url: store.public_url(bucket, &path),
        storage_path: Some(path.clone()),
        size_bytes: bytes.len() as u64,
        uploaded_at: Utc::now(),
    };

    match store.insert_paper(paper).await {
        Ok(record) => Ok(record),
        Err(e) => {
            remove_object_logged(store, bucket, &path).await;
            Err(e)
        }
    }
}

/// 删除对象，失败只记录日志
pub(crate) async fn remove_object_logged<S: PaperStore>(store: &S, bucket: &str, path: &str) {
    if let Err(e) = store.remove_objects(bucket, &[path.to_string()]).await {
        error!("删除对象 {}/{} 失败: {}", bucket, path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStore;
    use crate::models::{Availability, PDF_MIME_TYPE};

    fn pdf(name: &str) -> IncomingFile {
        IncomingFile::new(name, PDF_MIME_TYPE, format!("%PDF-{}", name).into_bytes())
    }

    fn store() -> MemoryStore {
        MemoryStore::new("http://localhost/public")
    }

    #[test]
    fn test_stage_batch_counts_failures_without_aborting() {
        let mut library = PaperLibrary::new("papers");
        let summary = library.stage_batch(vec![
            pdf("9709_p11_m25_qp.pdf"),
            IncomingFile::new("9709_p11_m25_ms.pdf", "image/png", vec![1, 2, 3]),
            pdf("notes.pdf"),
            pdf("9709_p11_m25_ms.pdf"),
        ]);

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.unsupported, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.to_string(), "2 succeeded / 2 failed");
        assert_eq!(library.len(), 2);
        assert_eq!(library.previews().live(), 2);
        assert!(library.entries().iter().all(|e| e.is_staged()));
    }

    #[tokio::test]
    async fn test_remove_releases_preview() {
        let store = store();
        let mut library = PaperLibrary::new("papers");
        library.stage_batch(vec![pdf("9709_p11_m25_qp.pdf"), pdf("9709_p11_m25_ms.pdf")]);
        let first = library.entries()[0].id;

        assert!(library.remove(&store, first).await.unwrap());
        assert_eq!(library.previews().live(), 1);
        assert!(!library.remove(&store, first).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_releases_all_previews() {
        let store = store();
        let mut library = PaperLibrary::new("papers");
        library.stage_batch(vec![pdf("9709_p11_m25_qp.pdf"), pdf("9709_p12_m25_qp.pdf")]);

        assert_eq!(library.clear(&store).await.unwrap(), 2);
        assert_eq!(library.previews().live(), 0);
        assert!(library.is_empty());
    }

    #[tokio::test]
    async fn test_persist_staged_replaces_preview_with_record() {
        let store = store();
        let mut library = PaperLibrary::new("papers");
        library.stage_batch(vec![pdf("9709_p11_m25_qp.pdf"), pdf("9709_p11_m25_ms.pdf")]);

        store.fail_next_record_insert().await;
        let summary = library.persist_staged(&store).await;
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.storage_failed, 1);
        // 失败的那一个保留预览，对象已回滚
        assert_eq!(library.previews().live(), 1);
        assert_eq!(store.object_count().await, 1);

        let summary = library.persist_staged(&store).await;
        assert_eq!(summary.succeeded, 1);
        assert_eq!(library.previews().live(), 0);
        assert!(library.entries().iter().all(|e| e.paper.is_persisted()));
        assert_eq!(store.list_papers(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_batch_persists_and_releases_previews() {
        let store = store();
        let mut library = PaperLibrary::new("papers");

        let summary = library
            .upload_batch(
                &store,
                vec![
                    pdf("9709_p11_m25_qp.pdf"),
                    pdf("9709_p11_m25_ms.pdf"),
                    pdf("9709_p11_x25_qp.pdf"),
                ],
            )
            .await;

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.malformed, 1);
        assert_eq!(library.previews().live(), 0);

        let record = &library.entries()[0];
        let path = record.paper.storage_path.as_deref().unwrap();
        assert!(path.starts_with("9709/"));
        assert!(path.ends_with("-9709_p11_m25_qp.pdf"));
        assert!(store.has_object("papers", path).await);
        assert_eq!(
            record.paper.url,
            format!("http://localhost/public/papers/{}", path)
        );
    }

    #[tokio::test]
    async fn test_storage_failures_count_as_failed() {
        let store = store();
        let mut library = PaperLibrary::new("papers");

        store.fail_next_object_put().await;
        let summary = library
            .upload_batch(&store, vec![pdf("9709_p11_m25_qp.pdf"), pdf("9709_p12_m25_qp.pdf")])
            .await;
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.storage_failed, 1);

        store.fail_next_record_insert().await;
        let summary = library
            .upload_batch(&store, vec![pdf("9709_p13_m25_qp.pdf")])
            .await;
        assert_eq!(summary.storage_failed, 1);
        // 记录写入失败后对象被回滚
        assert_eq!(store.object_count().await, 1);
        assert_eq!(library.len(), 1);
        assert_eq!(library.previews().live(), 0);
    }

    #[tokio::test]
    async fn test_remove_persisted_deletes_record_and_object() {
        let store = store();
        let mut library = PaperLibrary::new("papers");
        library
            .upload_batch(&store, vec![pdf("9709_p11_m25_qp.pdf")])
            .await;
        let id = library.entries()[0].id;

        assert!(library.remove(&store, id).await.unwrap());
        assert!(store.list_papers(None).await.unwrap().is_empty());
        assert_eq!(store.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_same_name_twice_in_one_batch_last_wins() {
        let store = store();
        let mut library = PaperLibrary::new("papers");

        let summary = library
            .upload_batch(
                &store,
                vec![
                    IncomingFile::new("9709_p11_m25_qp.pdf", PDF_MIME_TYPE, b"%PDF-first".to_vec()),
                    IncomingFile::new(
                        "9709_p11_m25_qp.pdf",
                        PDF_MIME_TYPE,
                        b"%PDF-second-upload".to_vec(),
                    ),
                ],
            )
            .await;
        assert_eq!(summary.to_string(), "2 succeeded / 0 failed");
        assert_eq!(store.object_count().await, 2);

        let groups = library.grouped("9709");
        assert_eq!(groups.len(), 1);
        let qp = groups[0].question_paper.as_ref().unwrap();
        assert_eq!(qp.size_bytes, 18);
        assert_eq!(library.duplicate_slots(Some("9709")).len(), 1);
    }

    #[tokio::test]
    async fn test_clear_keeps_entries_whose_record_delete_failed() {
        let store = store();
        let mut library = PaperLibrary::new("papers");
        library
            .upload_batch(&store, vec![pdf("9709_p11_m25_qp.pdf"), pdf("9709_p11_m25_ms.pdf")])
            .await;
        library.stage_batch(vec![pdf("9709_p12_m25_qp.pdf")]);

        store.fail_next_record_delete().await;
        assert!(library.clear(&store).await.is_err());

        // 暂存文件和删除成功的记录都已移除，删除失败的仍与存储一致
        assert_eq!(library.previews().live(), 0);
        assert_eq!(library.len(), 1);
        let remaining = store.list_papers(None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(library.entries()[0].record_id, Some(remaining[0].id));
        assert_eq!(store.object_count().await, 1);

        // 重新加载不会把已删除的记录带回来
        let mut reloaded = PaperLibrary::new("papers");
        assert_eq!(reloaded.load_from_store(&store).await.unwrap(), 1);

        assert_eq!(library.clear(&store).await.unwrap(), 1);
        assert!(store.list_papers(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_is_already_stored_matches_name_and_size() {
        let store = store();
        let mut library = PaperLibrary::new("papers");
        library
            .upload_batch(&store, vec![pdf("9709_p11_m25_qp.pdf")])
            .await;
        library.stage_batch(vec![pdf("9709_p12_m25_qp.pdf")]);

        assert!(library.is_already_stored(&pdf("9709_p11_m25_qp.pdf")));
        assert!(!library.is_already_stored(&IncomingFile::new(
            "9709_p11_m25_qp.pdf",
            PDF_MIME_TYPE,
            b"%PDF-changed content".to_vec(),
        )));
        // 暂存的文件还没有持久化
        assert!(!library.is_already_stored(&pdf("9709_p12_m25_qp.pdf")));
    }

    #[test]
    fn test_grouped_is_invalidated_by_changes() {
        let mut library = PaperLibrary::new("papers");
        library.stage_batch(vec![pdf("9709_p11_m25_qp.pdf")]);

        let groups = library.grouped("9709");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].availability(), Availability::MarkSchemeComingSoon);

        library.stage_batch(vec![pdf("9709_p11_m25_ms.pdf")]);
        let groups = library.grouped("9709");
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_complete());
    }

    #[test]
    fn test_duplicate_upload_last_one_wins() {
        let mut library = PaperLibrary::new("papers");
        library.stage_batch(vec![
            pdf("9709_p11_m25_qp.pdf"),
            pdf("9709_P11_M25_QP.pdf"),
        ]);

        let groups = library.grouped("9709");
        assert_eq!(groups.len(), 1);
        let qp = groups[0].question_paper.as_ref().unwrap();
        assert_eq!(qp.original_file_name, "9709_P11_M25_QP.pdf");

        let duplicates = library.duplicate_slots(Some("9709"));
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].overwritten, "9709_p11_m25_qp.pdf");
        assert_eq!(duplicates[0].winner, "9709_P11_M25_QP.pdf");
    }

    #[tokio::test]
    async fn test_load_from_store_skips_known_records() {
        let store = store();
        let mut uploader = PaperLibrary::new("papers");
        uploader
            .upload_batch(&store, vec![pdf("9709_p11_m25_qp.pdf"), pdf("9702_p42_w24_ms.pdf")])
            .await;

        let mut library = PaperLibrary::new("papers");
        assert_eq!(library.load_from_store(&store).await.unwrap(), 2);
        assert_eq!(library.load_from_store(&store).await.unwrap(), 0);
        assert_eq!(
            library.subject_codes().into_iter().collect::<Vec<_>>(),
            vec!["9702".to_string(), "9709".to_string()]
        );
    }
}
