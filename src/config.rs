use crate::error::ConfigError;
use std::str::FromStr;
use tracing::warn;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 待上传文件所在目录
    pub upload_folder: String,
    /// 本地存储根目录（对象 + 记录索引）
    pub storage_root: String,
    /// 真题存储桶
    pub papers_bucket: String,
    /// 笔记存储桶
    pub notes_bucket: String,
    /// 公开访问地址前缀
    pub public_base_url: String,
    /// 分组结果导出文件
    pub catalog_output_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_folder: "uploads".to_string(),
            storage_root: "storage".to_string(),
            papers_bucket: "papers".to_string(),
            notes_bucket: "notes".to_string(),
            public_base_url: "http://localhost:54321/storage/v1/object/public".to_string(),
            catalog_output_file: "catalog.json".to_string(),
            verbose_logging: false,
            output_log_file: "upload_log.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            upload_folder: std::env::var("UPLOAD_FOLDER").unwrap_or(default.upload_folder),
            storage_root: std::env::var("STORAGE_ROOT").unwrap_or(default.storage_root),
            papers_bucket: std::env::var("PAPERS_BUCKET").unwrap_or(default.papers_bucket),
            notes_bucket: std::env::var("NOTES_BUCKET").unwrap_or(default.notes_bucket),
            public_base_url: std::env::var("PUBLIC_BASE_URL").unwrap_or(default.public_base_url),
            catalog_output_file: std::env::var("CATALOG_OUTPUT_FILE")
                .unwrap_or(default.catalog_output_file),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }
}

/// 读取并解析环境变量，变量不存在时返回 `Ok(None)`
pub fn parse_env_var<T: FromStr>(var_name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => parse_value(var_name, &value).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T: FromStr>(var_name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: std::any::type_name::<T>().to_string(),
        })
}

/// 解析失败时记录警告并回退到默认值
fn env_or<T: FromStr>(var_name: &str, default: T) -> T {
    match parse_env_var(var_name) {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(e) => {
            warn!("{}，使用默认值", e);
            default
        }
    }
}
