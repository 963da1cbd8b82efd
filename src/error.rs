use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 单个文件的上传校验错误
    #[error("上传错误: {0}")]
    Upload(#[from] UploadError),
    /// 存储后端错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 本地文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 上传校验错误
///
/// 只有这两种，都只影响当前文件，不会中断整批上传
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// 文件名不符合 `code_variant_sessionYear_type.pdf`
    #[error("文件名格式不正确: {file_name}")]
    MalformedFilename { file_name: String },
    /// 不是 PDF
    #[error("不支持的文件类型 {mime_type}: {file_name}")]
    UnsupportedMediaType {
        file_name: String,
        mime_type: String,
    },
}

/// 存储后端错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 写入对象失败
    #[error("写入对象失败 ({bucket}/{path}): {source}")]
    ObjectWriteFailed {
        bucket: String,
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 删除对象失败
    #[error("删除对象失败 ({bucket}/{path}): {source}")]
    ObjectRemoveFailed {
        bucket: String,
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 对象路径不合法
    #[error("对象路径不合法: {path}")]
    InvalidPath { path: String },
    /// 插入记录失败
    #[error("插入记录失败 ({table}): {reason}")]
    RecordInsertFailed { table: &'static str, reason: String },
    /// 删除记录失败
    #[error("删除记录失败 ({table}#{id}): {reason}")]
    RecordDeleteFailed {
        table: &'static str,
        id: u64,
        reason: String,
    },
    /// 记录不存在
    #[error("记录不存在 ({table}#{id})")]
    RecordNotFound { table: &'static str, id: u64 },
    /// 索引文件解析失败
    #[error("索引文件解析失败 ({path}): {source}")]
    IndexCorrupted {
        path: String,
        source: toml::de::Error,
    },
    /// 索引文件序列化失败
    #[error("索引文件序列化失败 ({path}): {source}")]
    IndexWriteFailed {
        path: String,
        source: toml::ser::Error,
    },
}

/// 本地文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON序列化失败: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建对象写入错误
    pub fn object_write_failed(
        bucket: impl Into<String>,
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Storage(StorageError::ObjectWriteFailed {
            bucket: bucket.into(),
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建对象删除错误
    pub fn object_remove_failed(
        bucket: impl Into<String>,
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Storage(StorageError::ObjectRemoveFailed {
            bucket: bucket.into(),
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建记录不存在错误
    pub fn record_not_found(table: &'static str, id: u64) -> Self {
        AppError::Storage(StorageError::RecordNotFound { table, id })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
