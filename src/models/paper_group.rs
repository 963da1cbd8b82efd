use crate::models::{DocumentType, PaperFile, ParsedFileName, Session, UploadedPaper};
use serde::{Deserialize, Serialize};

/// 分组键：(年份, 考试季, 卷别)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub year: u16,
    pub session: Session,
    pub paper_variant: String,
}

impl GroupKey {
    pub fn of(parsed: &ParsedFileName) -> Self {
        Self {
            year: parsed.year,
            session: parsed.session,
            paper_variant: parsed.paper_variant.clone(),
        }
    }
}

/// 同一 (年份, 考试季, 卷别) 下的一套试卷和评分标准
///
/// 每次分组时重新生成，不会原地修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperGroup<F = UploadedPaper> {
    pub year: u16,
    pub session: Session,
    pub paper_number: u8,
    pub paper_variant: String,
    pub question_paper: Option<F>,
    pub mark_scheme: Option<F>,
}

/// 一组资料的完整程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Complete,
    /// 只有试卷
    MarkSchemeComingSoon,
    /// 只有评分标准
    PaperComingSoon,
    /// 两个槽位都为空（分组结果中不会出现）
    Empty,
}

impl<F: PaperFile> PaperGroup<F> {
    pub(crate) fn empty(parsed: &ParsedFileName) -> Self {
        Self {
            year: parsed.year,
            session: parsed.session,
            paper_number: parsed.paper_number,
            paper_variant: parsed.paper_variant.clone(),
            question_paper: None,
            mark_scheme: None,
        }
    }

    pub fn key(&self) -> GroupKey {
        GroupKey {
            year: self.year,
            session: self.session,
            paper_variant: self.paper_variant.clone(),
        }
    }

    /// 放入对应的槽位，已有文件时直接覆盖，返回被覆盖的文件
    pub(crate) fn fill(&mut self, file: F) -> Option<F> {
        let slot = match file.parsed().document_type {
            DocumentType::QuestionPaper => &mut self.question_paper,
            DocumentType::MarkScheme => &mut self.mark_scheme,
        };
        slot.replace(file)
    }

    pub fn availability(&self) -> Availability {
        match (&self.question_paper, &self.mark_scheme) {
            (Some(_), Some(_)) => Availability::Complete,
            (Some(_), None) => Availability::MarkSchemeComingSoon,
            (None, Some(_)) => Availability::PaperComingSoon,
            (None, None) => Availability::Empty,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.question_paper.is_some() && self.mark_scheme.is_some()
    }

    /// 展示用标题，如 `2025 MJ Paper 1 (p11)`
    pub fn title(&self) -> String {
        format!(
            "{} {} Paper {} ({})",
            self.year, self.session, self.paper_number, self.paper_variant
        )
    }
}
