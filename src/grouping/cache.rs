use crate::models::{PaperGroup, UploadedPaper};
use std::collections::HashMap;
use tracing::debug;

/// 分组结果缓存
///
/// 以 (科目代码, 文件集合版本) 为键；版本变化后旧结果不会再被返回
#[derive(Debug, Default)]
pub struct GroupCache {
    entries: HashMap<String, (u64, Vec<PaperGroup<UploadedPaper>>)>,
}

impl GroupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 命中则返回缓存，否则调用 `build` 重新分组并写入缓存
    pub fn get_or_build(
        &mut self,
        subject_code: &str,
        version: u64,
        build: impl FnOnce() -> Vec<PaperGroup<UploadedPaper>>,
    ) -> Vec<PaperGroup<UploadedPaper>> {
        if let Some((cached_version, groups)) = self.entries.get(subject_code) {
            if *cached_version == version {
                debug!("分组缓存命中: {} (版本 {})", subject_code, version);
                return groups.clone();
            }
        }

        let groups = build();
        self.entries
            .insert(subject_code.to_string(), (version, groups.clone()));
        groups
    }

    /// 丢弃所有缓存
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
