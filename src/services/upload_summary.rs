use crate::error::UploadError;
use std::fmt;

/// 一批上传的统计
///
/// 每个文件的错误只计数，不中断整批
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub succeeded: usize,
    /// 文件名不符合格式
    pub malformed: usize,
    /// 不是 PDF
    pub unsupported: usize,
    /// 写入存储失败
    pub storage_failed: usize,
}

impl UploadSummary {
    pub fn failed(&self) -> usize {
        self.malformed + self.unsupported + self.storage_failed
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed()
    }

    pub fn record_rejection(&mut self, err: &UploadError) {
        match err {
            UploadError::MalformedFilename { .. } => self.malformed += 1,
            UploadError::UnsupportedMediaType { .. } => self.unsupported += 1,
        }
    }

    pub fn merge(&mut self, other: UploadSummary) {
        self.succeeded += other.succeeded;
        self.malformed += other.malformed;
        self.unsupported += other.unsupported;
        self.storage_failed += other.storage_failed;
    }
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} succeeded / {} failed", self.succeeded, self.failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_counts_every_failure_kind() {
        let mut summary = UploadSummary {
            succeeded: 3,
            ..Default::default()
        };
        summary.record_rejection(&UploadError::MalformedFilename {
            file_name: "notes.pdf".to_string(),
        });
        summary.record_rejection(&UploadError::UnsupportedMediaType {
            file_name: "a.png".to_string(),
            mime_type: "image/png".to_string(),
        });
        summary.storage_failed += 1;

        assert_eq!(summary.failed(), 3);
        assert_eq!(summary.total(), 6);
        assert_eq!(summary.to_string(), "3 succeeded / 3 failed");
    }
}
