use crate::error::UploadError;
use crate::models::{DocumentType, ParsedFileName, Session, PDF_MIME_TYPE};
use regex::Regex;
use std::sync::LazyLock;

/// `^\d{4}_p\d{2}_[smw]\d{2}_(qp|ms)\.pdf$`，字母不区分大小写，数字只接受 ASCII
static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9]{4})_(p([0-9])[0-9])_([smw])([0-9]{2})_(qp|ms)\.pdf$")
        .expect("filename pattern is valid")
});

/// 解析真题文件名
///
/// 整个文件名必须匹配固定格式，否则返回 `None`，不会产生不完整的结果。
/// 除字母大小写外不做任何规范化：空格、多余后缀、其他分隔符都会被拒绝。
///
/// # 示例
/// `9709_p11_m25_qp.pdf` → 科目 9709，卷别 p11，卷号 1，MJ 2025，试卷
pub fn parse_filename(filename: &str) -> Option<ParsedFileName> {
    // 非 ASCII 字符在 Unicode 大小写折叠下可能匹配字母（如 U+017F 匹配 `s`）
    if !filename.is_ascii() {
        return None;
    }

    let caps = FILENAME_PATTERN.captures(filename)?;

    let subject_code = caps[1].to_string();
    let paper_variant = caps[2].to_ascii_lowercase();
    let paper_number = caps[3].parse().ok()?;
    let session = caps[4].chars().next().and_then(Session::from_code)?;
    let year = 2000 + caps[5].parse::<u16>().ok()?;
    let document_type = DocumentType::from_code(&caps[6])?;

    Some(ParsedFileName {
        subject_code,
        paper_variant,
        paper_number,
        session,
        year,
        document_type,
    })
}

/// 上传边界校验：先检查 MIME 类型，再解析文件名
pub fn validate_upload(file_name: &str, mime_type: &str) -> Result<ParsedFileName, UploadError> {
    if mime_type != PDF_MIME_TYPE {
        return Err(UploadError::UnsupportedMediaType {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
        });
    }

    parse_filename(file_name).ok_or_else(|| UploadError::MalformedFilename {
        file_name: file_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_may_june_question_paper() {
        let parsed = parse_filename("9709_p11_m25_qp.pdf").unwrap();

        assert_eq!(parsed.subject_code, "9709");
        assert_eq!(parsed.paper_variant, "p11");
        assert_eq!(parsed.paper_number, 1);
        assert_eq!(parsed.session, Session::MJ);
        assert_eq!(parsed.year, 2025);
        assert_eq!(parsed.document_type, DocumentType::QuestionPaper);
    }

    #[test]
    fn test_parse_oct_nov_mark_scheme() {
        let parsed = parse_filename("9700_p42_w24_ms.pdf").unwrap();

        assert_eq!(parsed.subject_code, "9700");
        assert_eq!(parsed.paper_variant, "p42");
        assert_eq!(parsed.paper_number, 4);
        assert_eq!(parsed.session, Session::ND);
        assert_eq!(parsed.year, 2024);
        assert_eq!(parsed.document_type, DocumentType::MarkScheme);
    }

    #[test]
    fn test_parse_feb_march() {
        let parsed = parse_filename("9231_p23_s00_qp.pdf").unwrap();
        assert_eq!(parsed.session, Session::FM);
        assert_eq!(parsed.year, 2000);
        assert_eq!(parsed.paper_number, 2);
    }

    #[test]
    fn test_letters_are_case_insensitive() {
        let parsed = parse_filename("9709_P11_M25_QP.PDF").unwrap();

        assert_eq!(parsed.paper_variant, "p11");
        assert_eq!(parsed.session, Session::MJ);
        assert_eq!(parsed.document_type, DocumentType::QuestionPaper);
    }

    #[test]
    fn test_paper_number_ignores_second_digit() {
        assert_eq!(parse_filename("9702_p19_m25_qp.pdf").unwrap().paper_number, 1);
        assert_eq!(parse_filename("9702_p01_m25_qp.pdf").unwrap().paper_number, 0);
    }

    #[test]
    fn test_rejects_non_matching_names() {
        let rejected = [
            "notes.pdf",
            "9709_11_m25_qp.pdf",
            "9709_p11_x25_qp.pdf",
            "9709_p11_m25_qp.PDF.pdf",
            "9709_p11_m25_qp.docx",
            "9709_p11_m25_qp",
            "970_p11_m25_qp.pdf",
            "97091_p11_m25_qp.pdf",
            "9709_p1_m25_qp.pdf",
            "9709_p111_m25_qp.pdf",
            "9709_p11_m2025_qp.pdf",
            "9709_p11_m25_er.pdf",
            "9709-p11-m25-qp.pdf",
            " 9709_p11_m25_qp.pdf",
            "9709_p11_m25_qp.pdf ",
            "9709_p11_m25_qp (1).pdf",
            "dir/9709_p11_m25_qp.pdf",
            "",
        ];

        for name in rejected {
            assert_eq!(parse_filename(name), None, "{} 不应被解析", name);
        }
    }

    #[test]
    fn test_rejects_unicode_lookalikes() {
        // 阿拉伯-印度数字和长 s
        assert_eq!(parse_filename("٩٧٠٩_p11_m25_qp.pdf"), None);
        assert_eq!(parse_filename("9709_p11_\u{17F}25_qp.pdf"), None);
    }

    #[test]
    fn test_validate_upload_checks_mime_first() {
        let err = validate_upload("notes.pdf", "text/plain").unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedMediaType { .. }));

        let err = validate_upload("notes.pdf", PDF_MIME_TYPE).unwrap_err();
        assert_eq!(
            err,
            UploadError::MalformedFilename {
                file_name: "notes.pdf".to_string()
            }
        );

        assert!(validate_upload("9709_p11_m25_qp.pdf", PDF_MIME_TYPE).is_ok());
    }
}
