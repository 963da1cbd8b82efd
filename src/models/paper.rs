use crate::models::{DocumentType, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// PDF 的 MIME 类型
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// 无法识别内容时使用的 MIME 类型
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// 从文件名解析出的真题信息
///
/// 只有整个文件名匹配 `code_variant_sessionYear_type.pdf` 时才会创建
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedFileName {
    /// 科目代码（4 位数字，原样保留）
    pub subject_code: String,
    /// 卷别，如 `p11`（小写）
    pub paper_variant: String,
    /// 卷号，只取卷别的第一位数字（`p42` → 4），仅用于展示分组
    pub paper_number: u8,
    pub session: Session,
    /// 完整年份（`25` → 2025）
    pub year: u16,
    pub document_type: DocumentType,
}

impl ParsedFileName {
    /// 卷别数字部分的数值（`p11` → 11）
    pub fn variant_number(&self) -> Option<u32> {
        variant_number(&self.paper_variant)
    }

    /// 规范化的小写文件名
    pub fn canonical_file_name(&self) -> String {
        format!(
            "{}_{}_{}{:02}_{}.pdf",
            self.subject_code,
            self.paper_variant,
            self.session.code(),
            self.year % 100,
            self.document_type.code()
        )
    }
}

/// 解析卷别 `p` 之后的数字，`p2` → 2，`p11` → 11
///
/// 排序必须按数值比较，字符串比较会把 `p11` 排在 `p2` 前面
pub fn variant_number(variant: &str) -> Option<u32> {
    let digits = variant
        .strip_prefix('p')
        .or_else(|| variant.strip_prefix('P'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// 可以参与分组的文件
///
/// 分组只关心解析结果，其余字段（存储路径、大小、URL）原样带出
pub trait PaperFile: Clone {
    fn parsed(&self) -> &ParsedFileName;

    /// 日志和冲突报告中显示的文件名
    fn display_name(&self) -> String {
        self.parsed().canonical_file_name()
    }
}

impl PaperFile for ParsedFileName {
    fn parsed(&self) -> &ParsedFileName {
        self
    }
}

/// 已接收的真题文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedPaper {
    pub parsed: ParsedFileName,
    /// 上传时的原始文件名
    pub original_file_name: String,
    /// 存储路径，尚未持久化时为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    pub size_bytes: u64,
    /// 下载地址（持久化前为预览地址）
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedPaper {
    pub fn is_persisted(&self) -> bool {
        self.storage_path.is_some()
    }
}

impl PaperFile for UploadedPaper {
    fn parsed(&self) -> &ParsedFileName {
        &self.parsed
    }

    fn display_name(&self) -> String {
        self.original_file_name.clone()
    }
}

/// 存储后端中的真题记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: u64,
    pub paper: UploadedPaper,
}

/// 待上传的文件
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// 根据文件内容（magic bytes）识别 MIME 类型
    pub fn sniffed(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or(UNKNOWN_MIME_TYPE);
        Self::new(file_name, mime_type, bytes)
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}
