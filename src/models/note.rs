use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 存储后端中的笔记记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNote {
    pub id: u64,
    pub subject_code: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub file_name: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// 待写入的笔记记录，id 和时间由存储后端分配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub subject_code: String,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_path: String,
    pub file_size: Option<u64>,
    pub url: String,
}
