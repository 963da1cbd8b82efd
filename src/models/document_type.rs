use serde::{Deserialize, Serialize};

/// 文档类型：试卷或评分标准
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// 试卷
    #[serde(rename = "qp")]
    QuestionPaper,
    /// 评分标准
    #[serde(rename = "ms")]
    MarkScheme,
}

impl DocumentType {
    /// 从文件名中的 `qp` / `ms` 解析（不区分大小写）
    pub fn from_code(code: &str) -> Option<Self> {
        if code.eq_ignore_ascii_case("qp") {
            Some(DocumentType::QuestionPaper)
        } else if code.eq_ignore_ascii_case("ms") {
            Some(DocumentType::MarkScheme)
        } else {
            None
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DocumentType::QuestionPaper => "qp",
            DocumentType::MarkScheme => "ms",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
