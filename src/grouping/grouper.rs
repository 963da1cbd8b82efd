use crate::models::{DocumentType, GroupKey, PaperFile, PaperGroup, Session};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// 把文件分组成试卷/评分标准对
///
/// 调用方负责先按科目过滤（或使用 [`group_papers_for_subject`]）。
/// 同一槽位出现多个文件时，按处理顺序后者覆盖前者。
///
/// 输出顺序：年份降序 → 考试季 FM/MJ/ND → 卷别数值升序
pub fn group_papers<F: PaperFile>(files: &[F]) -> Vec<PaperGroup<F>> {
    let mut grouped: HashMap<GroupKey, PaperGroup<F>> = HashMap::new();

    for file in files {
        let parsed = file.parsed();
        grouped
            .entry(GroupKey::of(parsed))
            .or_insert_with(|| PaperGroup::empty(parsed))
            .fill(file.clone());
    }

    let mut groups: Vec<PaperGroup<F>> = grouped.into_values().collect();
    groups.sort_by(compare_groups);
    groups
}

/// 只分组指定科目的文件
pub fn group_papers_for_subject<F: PaperFile>(files: &[F], subject_code: &str) -> Vec<PaperGroup<F>> {
    let subject_files: Vec<F> = files
        .iter()
        .filter(|f| f.parsed().subject_code == subject_code)
        .cloned()
        .collect();
    group_papers(&subject_files)
}

/// 分组排序规则
///
/// 卷别按 `p` 之后的数值比较；数值相同（如 `p02` 与 `p2`）时再按字符串比较，保证全序
pub fn compare_groups<F>(a: &PaperGroup<F>, b: &PaperGroup<F>) -> Ordering {
    b.year
        .cmp(&a.year)
        .then_with(|| a.session.rank().cmp(&b.session.rank()))
        .then_with(|| variant_sort_key(&a.paper_variant).cmp(&variant_sort_key(&b.paper_variant)))
        .then_with(|| a.paper_variant.cmp(&b.paper_variant))
}

fn variant_sort_key(variant: &str) -> u32 {
    crate::models::variant_number(variant).unwrap_or(u32::MAX)
}

/// 被覆盖的槽位
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSlot {
    pub year: u16,
    pub session: Session,
    pub paper_variant: String,
    pub document_type: DocumentType,
    /// 被覆盖的文件
    pub overwritten: String,
    /// 最终保留的文件
    pub winner: String,
}

/// 找出分组时会被覆盖的槽位
///
/// 分组本身仍然是后者覆盖前者，这里只负责把覆盖报告出来
pub fn find_duplicate_slots<F: PaperFile>(files: &[F]) -> Vec<DuplicateSlot> {
    let mut seen: HashMap<(String, GroupKey, DocumentType), String> = HashMap::new();
    let mut duplicates = Vec::new();

    for file in files {
        let parsed = file.parsed();
        let slot = (
            parsed.subject_code.clone(),
            GroupKey::of(parsed),
            parsed.document_type,
        );
        let name = file.display_name();

        if let Some(previous) = seen.insert(slot, name.clone()) {
            duplicates.push(DuplicateSlot {
                year: parsed.year,
                session: parsed.session,
                paper_variant: parsed.paper_variant.clone(),
                document_type: parsed.document_type,
                overwritten: previous,
                winner: name,
            });
        }
    }

    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, ParsedFileName};
    use crate::parser::parse_filename;

    fn parse_all(names: &[&str]) -> Vec<ParsedFileName> {
        names
            .iter()
            .map(|n| parse_filename(n).unwrap_or_else(|| panic!("无法解析 {}", n)))
            .collect()
    }

    fn synthetic(variant: &str, document_type: DocumentType) -> ParsedFileName {
        ParsedFileName {
            subject_code: "9709".to_string(),
            paper_variant: variant.to_string(),
            paper_number: variant[1..2].parse().unwrap(),
            session: Session::MJ,
            year: 2025,
            document_type,
        }
    }

    #[test]
    fn test_pair_merges_into_one_complete_group() {
        let files = parse_all(&["9709_p11_m25_qp.pdf", "9709_p11_m25_ms.pdf"]);
        let groups = group_papers(&files);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.year, 2025);
        assert_eq!(group.session, Session::MJ);
        assert_eq!(group.paper_variant, "p11");
        assert_eq!(group.paper_number, 1);
        assert!(group.is_complete());
        assert_eq!(group.availability(), Availability::Complete);
    }

    #[test]
    fn test_half_filled_groups_are_kept() {
        let files = parse_all(&["9709_p11_m25_qp.pdf", "9709_p12_m25_ms.pdf"]);
        let groups = group_papers(&files);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].availability(), Availability::MarkSchemeComingSoon);
        assert_eq!(groups[1].availability(), Availability::PaperComingSoon);
    }

    #[test]
    fn test_orders_by_year_desc_then_session() {
        let files = parse_all(&[
            "9709_p11_w24_qp.pdf",
            "9709_p11_s24_qp.pdf",
            "9709_p11_m25_qp.pdf",
            "9709_p11_m24_qp.pdf",
            "9709_p11_w25_qp.pdf",
            "9709_p11_s25_qp.pdf",
        ]);
        let order: Vec<(u16, Session)> = group_papers(&files)
            .iter()
            .map(|g| (g.year, g.session))
            .collect();

        assert_eq!(
            order,
            vec![
                (2025, Session::FM),
                (2025, Session::MJ),
                (2025, Session::ND),
                (2024, Session::FM),
                (2024, Session::MJ),
                (2024, Session::ND),
            ]
        );
    }

    #[test]
    fn test_variants_sort_numerically_not_lexically() {
        let files = vec![
            synthetic("p11", DocumentType::QuestionPaper),
            synthetic("p2", DocumentType::QuestionPaper),
            synthetic("p32", DocumentType::QuestionPaper),
        ];
        let variants: Vec<String> = group_papers(&files)
            .into_iter()
            .map(|g| g.paper_variant)
            .collect();

        assert_eq!(variants, vec!["p2", "p11", "p32"]);
    }

    #[test]
    fn test_grouping_ignores_input_order() {
        let files = parse_all(&[
            "9709_p11_m25_qp.pdf",
            "9709_p11_m25_ms.pdf",
            "9709_p12_m25_qp.pdf",
            "9709_p31_w24_ms.pdf",
            "9709_p21_s24_qp.pdf",
            "9709_p21_s24_ms.pdf",
            "9709_p13_w25_qp.pdf",
        ]);
        let expected = group_papers(&files);

        let mut reversed = files.clone();
        reversed.reverse();
        assert_eq!(group_papers(&reversed), expected);

        // 简单的确定性置换
        for shift in 1..files.len() {
            let mut rotated = files.clone();
            rotated.rotate_left(shift);
            assert_eq!(group_papers(&rotated), expected);
        }
    }

    #[test]
    fn test_duplicate_slot_keeps_last_processed() {
        let first = crate::models::UploadedPaper {
            parsed: parse_filename("9709_p11_m25_qp.pdf").unwrap(),
            original_file_name: "9709_p11_m25_qp.pdf".to_string(),
            storage_path: None,
            size_bytes: 10,
            url: "preview://1".to_string(),
            uploaded_at: chrono::Utc::now(),
        };
        let second = crate::models::UploadedPaper {
            parsed: parse_filename("9709_P11_M25_QP.pdf").unwrap(),
            original_file_name: "9709_P11_M25_QP.pdf".to_string(),
            size_bytes: 20,
            url: "preview://2".to_string(),
            ..first.clone()
        };

        let groups = group_papers(&[first.clone(), second.clone()]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].question_paper.as_ref(), Some(&second));
        assert!(groups[0].mark_scheme.is_none());

        let groups = group_papers(&[second, first.clone()]);
        assert_eq!(groups[0].question_paper.as_ref(), Some(&first));
    }

    #[test]
    fn test_find_duplicate_slots_reports_overwrites() {
        let files = parse_all(&[
            "9709_p11_m25_qp.pdf",
            "9709_p11_m25_ms.pdf",
            "9709_p11_m25_QP.pdf",
        ]);
        let duplicates = find_duplicate_slots(&files);

        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].document_type, DocumentType::QuestionPaper);
        assert_eq!(duplicates[0].paper_variant, "p11");
    }

    #[test]
    fn test_no_duplicates_across_subjects() {
        let files = parse_all(&["9709_p11_m25_qp.pdf", "9702_p11_m25_qp.pdf"]);
        assert!(find_duplicate_slots(&files).is_empty());
    }

    #[test]
    fn test_group_for_subject_filters() {
        let files = parse_all(&[
            "9709_p11_m25_qp.pdf",
            "9702_p11_m25_qp.pdf",
            "9702_p11_m25_ms.pdf",
        ]);

        let physics = group_papers_for_subject(&files, "9702");
        assert_eq!(physics.len(), 1);
        assert!(physics[0].is_complete());

        assert!(group_papers_for_subject(&files, "9700").is_empty());
    }
}
