//! 真题分组
//!
//! 把解析好的文件按 (年份, 考试季, 卷别) 配对成试卷 + 评分标准，并按固定顺序输出

pub mod cache;
pub mod grouper;

pub use cache::GroupCache;
pub use grouper::{
    compare_groups, find_duplicate_slots, group_papers, group_papers_for_subject, DuplicateSlot,
};
