//! 批量上传处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整的上传流程和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、打开存储目录、加载已有真题
//! 2. **批量读取**：扫描上传目录中的文件并识别 MIME 类型
//! 3. **上传真题**：校验文件名，写入存储，统计成功 / 失败
//! 4. **上传笔记**：处理 `notes/<科目代码>/` 下的 PDF 笔记
//! 5. **分组导出**：按科目输出分组结果并写入 JSON
//! 6. **全局统计**：汇总所有上传结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个文件的校验细节
//! - **资源所有者**：唯一持有存储后端的模块
//! - **向下委托**：委托 services 完成上传和分组

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::FsStore;
use crate::models::{IncomingFile, PaperGroup, Subject};
use crate::services::{NotesService, PaperLibrary, UploadSummary};
use crate::utils::logging::{
    append_to_log_file, init_log_file, log_startup, log_subject_groups, log_upload_summary,
    print_final_stats,
};
use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

/// 笔记所在的子目录
const NOTES_DIR: &str = "notes";

/// 应用主结构
pub struct App {
    config: Config,
    store: FsStore,
    library: PaperLibrary,
}

/// 导出的科目分组
#[derive(Debug, Serialize)]
pub struct SubjectCatalog {
    pub subject_code: String,
    pub subject_name: Option<String>,
    pub groups: Vec<PaperGroup>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let store = FsStore::open(&config.storage_root, config.public_base_url.clone())
            .await
            .with_context(|| format!("无法打开存储目录: {}", config.storage_root))?;

        let mut library = PaperLibrary::new(config.papers_bucket.clone());
        library
            .load_from_store(&store)
            .await
            .context("加载已有真题失败")?;

        Ok(Self {
            config,
            store,
            library,
        })
    }

    pub fn library(&self) -> &PaperLibrary {
        &self.library
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<Vec<SubjectCatalog>> {
        info!("\n📁 正在扫描待上传的文件...");
        let upload_folder = PathBuf::from(&self.config.upload_folder);
        let files = load_upload_files(&upload_folder).await?;
        let files = skip_stored(files, |f| self.library.is_already_stored(f));

        let mut total = UploadSummary::default();

        if files.is_empty() {
            warn!("⚠️ 上传目录中没有文件: {}", upload_folder.display());
        } else {
            info!("✓ 找到 {} 个待上传的文件", files.len());
            let summary = self.library.upload_batch(&self.store, files).await;
            log_upload_summary("真题", &summary);
            append_to_log_file(&self.config.output_log_file, &format!("真题: {}", summary))?;
            total.merge(summary);
        }

        let notes_summary = self.upload_notes(&upload_folder.join(NOTES_DIR)).await?;
        total.merge(notes_summary);

        let catalog = self.build_catalog();
        self.write_catalog(&catalog).await?;

        let group_count = catalog.iter().map(|c| c.groups.len()).sum();
        print_final_stats(&total, group_count, &self.config.output_log_file);

        Ok(catalog)
    }

    /// 上传 `notes/<科目代码>/` 下的笔记
    async fn upload_notes(&self, notes_root: &Path) -> Result<UploadSummary> {
        let mut total = UploadSummary::default();
        if !fs::try_exists(notes_root).await.unwrap_or(false) {
            return Ok(total);
        }

        for subject_dir in list_entries(notes_root, EntryKind::Directory).await? {
            let Some(code) = subject_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if Subject::from_code_str(code).is_none() {
                warn!("⚠️ 未知科目代码，跳过笔记目录: {}", subject_dir.display());
                continue;
            }

            let mut notes = NotesService::new(self.config.notes_bucket.clone());
            notes
                .load_notes(&self.store, code)
                .await
                .with_context(|| format!("加载笔记失败: {}", code))?;

            let files = load_upload_files(&subject_dir).await?;
            let files = skip_stored(files, |f| notes.is_already_stored(f));
            if files.is_empty() {
                continue;
            }

            // 标题留空，按文件名生成
            let summary = notes.upload_notes(&self.store, code, "", None, files).await;
            log_upload_summary(&format!("{} 笔记", code), &summary);
            append_to_log_file(
                &self.config.output_log_file,
                &format!("笔记 {}: {}", code, summary),
            )?;
            total.merge(summary);
        }

        Ok(total)
    }

    /// 按科目生成分组结果
    fn build_catalog(&mut self) -> Vec<SubjectCatalog> {
        let mut catalog = Vec::new();

        for code in self.library.subject_codes() {
            let subject = Subject::from_code_str(&code);
            let groups = self.library.grouped(&code);
            log_subject_groups(&code, &groups);

            if let Some(subject) = subject {
                for group in groups.iter().filter(|g| !subject.lists_variant(&g.paper_variant)) {
                    warn!(
                        "⚠️ {} 的卷别 {} 不在科目目录中",
                        subject.name(),
                        group.paper_variant
                    );
                }
            }

            catalog.push(SubjectCatalog {
                subject_name: subject.map(|s| s.name().to_string()),
                subject_code: code,
                groups,
            });
        }

        catalog
    }

    async fn write_catalog(&self, catalog: &[SubjectCatalog]) -> Result<()> {
        let path = &self.config.catalog_output_file;
        let json = serde_json::to_string_pretty(catalog)?;
        fs::write(path, json)
            .await
            .map_err(|e| AppError::file_write_failed(path.clone(), e))?;
        info!("💾 分组结果已写入 {}", path);
        Ok(())
    }
}

/// 去掉上次运行已经上传过的文件
fn skip_stored(
    files: Vec<IncomingFile>,
    is_stored: impl Fn(&IncomingFile) -> bool,
) -> Vec<IncomingFile> {
    files
        .into_iter()
        .filter(|file| {
            let stored = is_stored(file);
            if stored {
                info!("⏭️ 已上传过，跳过: {}", file.file_name);
            }
            !stored
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

/// 列出目录下的文件或子目录（不递归），按路径排序
async fn list_entries(dir: &Path, kind: EntryKind) -> Result<Vec<PathBuf>> {
    let mut read_dir = fs::read_dir(dir)
        .await
        .map_err(|e| AppError::file_read_failed(dir.display().to_string(), e))?;

    let mut paths = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let file_type = entry.file_type().await?;
        let matches = match kind {
            EntryKind::File => file_type.is_file(),
            EntryKind::Directory => file_type.is_dir(),
        };
        if matches {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// 读取目录下的全部文件，并按内容识别 MIME 类型
///
/// 目录不存在时返回空列表；单个文件读取失败只记录日志
pub async fn load_upload_files(dir: &Path) -> Result<Vec<IncomingFile>> {
    if !fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(Vec::new());
    }

    let paths = list_entries(dir, EntryKind::File).await?;
    let reads = paths.into_iter().map(|path| async move {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        fs::read(&path)
            .await
            .map(|bytes| IncomingFile::sniffed(file_name, bytes))
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))
    });

    let mut files = Vec::new();
    for result in join_all(reads).await {
        match result {
            Ok(file) => files.push(file),
            Err(e) => error!("❌ {}", e),
        }
    }
    Ok(files)
}
