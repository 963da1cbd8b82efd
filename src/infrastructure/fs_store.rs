//! 本地目录存储后端
//!
//! 目录结构：
//!
//! ```text
//! <root>/
//! ├── papers.toml          # 真题记录
//! ├── notes.toml           # 笔记记录
//! └── <bucket>/<科目代码>/<毫秒时间戳>-<文件名>
//! ```

use crate::error::{AppError, AppResult, StorageError};
use crate::infrastructure::store::{
    check_object_path, join_public_url, sort_notes_newest_first, PaperStore,
};
use crate::models::{NewNote, PaperRecord, StoredNote, UploadedPaper};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const PAPERS_INDEX: &str = "papers.toml";
const NOTES_INDEX: &str = "notes.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PaperIndex {
    next_id: u64,
    #[serde(default)]
    papers: Vec<PaperRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NoteIndex {
    next_id: u64,
    #[serde(default)]
    notes: Vec<StoredNote>,
}

/// 本地目录存储后端
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    public_base_url: String,
    // 记录索引是读-改-写，需要串行化
    index_lock: Mutex<()>,
}

impl FsStore {
    /// 打开（必要时创建）存储目录
    pub async fn open(root: impl AsRef<Path>, public_base_url: impl Into<String>) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| AppError::file_write_failed(root.display().to_string(), e))?;
        info!("📂 存储目录: {}", root.display());

        Ok(Self {
            root,
            public_base_url: public_base_url.into(),
            index_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 对象在磁盘上的位置
    pub fn object_path(&self, bucket: &str, path: &str) -> AppResult<PathBuf> {
        check_object_path(bucket)?;
        check_object_path(path)?;
        Ok(self.root.join(bucket).join(path))
    }

    async fn read_index<T: DeserializeOwned + Default>(&self, name: &str) -> AppResult<T> {
        let path = self.root.join(name);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(AppError::file_read_failed(path.display().to_string(), e)),
        };

        toml::from_str(&content).map_err(|source| {
            AppError::Storage(StorageError::IndexCorrupted {
                path: path.display().to_string(),
                source,
            })
        })
    }

    async fn write_index<T: Serialize>(&self, name: &str, index: &T) -> AppResult<()> {
        let path = self.root.join(name);
        let content = toml::to_string(index).map_err(|source| StorageError::IndexWriteFailed {
            path: path.display().to_string(),
            source,
        })?;

        // 先写临时文件再改名，避免写到一半的索引
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| AppError::file_write_failed(tmp.display().to_string(), e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        Ok(())
    }
}

impl PaperStore for FsStore {
    fn public_url(&self, bucket: &str, path: &str) -> String {
        join_public_url(&self.public_base_url, bucket, path)
    }

    async fn put_object(&self, bucket: &str, path: &str, bytes: &[u8]) -> AppResult<()> {
        let target = self.object_path(bucket, path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::object_write_failed(bucket, path, e))?;
        }

        // create_new 保证已存在的对象不会被覆盖
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| AppError::object_write_failed(bucket, path, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| AppError::object_write_failed(bucket, path, e))?;
        file.flush()
            .await
            .map_err(|e| AppError::object_write_failed(bucket, path, e))?;

        debug!("写入对象 {}/{} ({} 字节)", bucket, path, bytes.len());
        Ok(())
    }

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> AppResult<()> {
        for path in paths {
            let target = self.object_path(bucket, path)?;
            match fs::remove_file(&target).await {
                Ok(()) => debug!("删除对象 {}/{}", bucket, path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("对象不存在，跳过删除: {}/{}", bucket, path);
                }
                Err(e) => return Err(AppError::object_remove_failed(bucket, path.clone(), e)),
            }
        }
        Ok(())
    }

    async fn insert_paper(&self, paper: UploadedPaper) -> AppResult<PaperRecord> {
        let _guard = self.index_lock.lock().await;
        let mut index: PaperIndex = self.read_index(PAPERS_INDEX).await?;

        index.next_id += 1;
        let record = PaperRecord {
            id: index.next_id,
            paper,
        };
        index.papers.push(record.clone());

        self.write_index(PAPERS_INDEX, &index).await?;
        Ok(record)
    }

    async fn delete_paper(&self, id: u64) -> AppResult<()> {
        let _guard = self.index_lock.lock().await;
        let mut index: PaperIndex = self.read_index(PAPERS_INDEX).await?;

        let before = index.papers.len();
        index.papers.retain(|r| r.id != id);
        if index.papers.len() == before {
            return Err(AppError::record_not_found("papers", id));
        }

        self.write_index(PAPERS_INDEX, &index).await
    }

    async fn list_papers(&self, subject_code: Option<&str>) -> AppResult<Vec<PaperRecord>> {
        let _guard = self.index_lock.lock().await;
        let index: PaperIndex = self.read_index(PAPERS_INDEX).await?;

        Ok(index
            .papers
            .into_iter()
            .filter(|r| subject_code.map_or(true, |code| r.paper.parsed.subject_code == code))
            .collect())
    }

    async fn insert_note(&self, note: NewNote) -> AppResult<StoredNote> {
        let _guard = self.index_lock.lock().await;
        let mut index: NoteIndex = self.read_index(NOTES_INDEX).await?;

        index.next_id += 1;
        let stored = StoredNote {
            id: index.next_id,
            subject_code: note.subject_code,
            title: note.title,
            description: note.description,
            file_name: note.file_name,
            file_path: note.file_path,
            file_size: note.file_size,
            url: note.url,
            created_at: Utc::now(),
        };
        index.notes.push(stored.clone());

        self.write_index(NOTES_INDEX, &index).await?;
        Ok(stored)
    }

    async fn delete_note(&self, id: u64) -> AppResult<()> {
        let _guard = self.index_lock.lock().await;
        let mut index: NoteIndex = self.read_index(NOTES_INDEX).await?;

        let before = index.notes.len();
        index.notes.retain(|n| n.id != id);
        if index.notes.len() == before {
            return Err(AppError::record_not_found("notes", id));
        }

        self.write_index(NOTES_INDEX, &index).await
    }

    async fn list_notes(&self, subject_code: Option<&str>) -> AppResult<Vec<StoredNote>> {
        let _guard = self.index_lock.lock().await;
        let index: NoteIndex = self.read_index(NOTES_INDEX).await?;

        let mut notes: Vec<StoredNote> = index
            .notes
            .into_iter()
            .filter(|n| subject_code.map_or(true, |code| n.subject_code == code))
            .collect();
        sort_notes_newest_first(&mut notes);
        Ok(notes)
    }
}
