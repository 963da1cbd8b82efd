//! # A-Level Papers
//!
//! 管理 A-Level 真题 PDF 的 Rust 应用程序：解析文件名、配对试卷与评分标准、按固定顺序分组
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `PaperStore` - 对象存储 + 记录表抽象（`FsStore` / `MemoryStore`）
//! - `PreviewRegistry` - 未持久化文件的预览句柄
//!
//! ### ② 纯逻辑（Parser / Grouping）
//! - `parser/` - 文件名解析与上传校验
//! - `grouping/` - 配对、排序、分组缓存
//!
//! ### ③ 业务能力层（Services）
//! - `PaperLibrary` - 真题上传、移除、清空、分组查询
//! - `NotesService` - 笔记上传与知识点匹配
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 扫描上传目录，驱动整批上传并导出分组
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod grouping;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, UploadError};
pub use grouping::{group_papers, group_papers_for_subject, GroupCache};
pub use infrastructure::{FsStore, MemoryStore, PaperStore, PreviewHandle, PreviewRegistry};
pub use models::{
    Availability, DocumentType, IncomingFile, PaperGroup, ParsedFileName, Session, Subject,
    UploadedPaper,
};
pub use orchestrator::App;
pub use parser::{parse_filename, validate_upload};
pub use services::{find_note_for_topic, NotesService, PaperLibrary, UploadSummary};
