//! 预览句柄 - 基础设施层
//!
//! 文件被接收但尚未持久化时，用内存中的预览句柄引用文件内容。
//! 句柄在 `Drop` 时释放，移除、替换、清空任何一条路径都不会泄漏。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: AtomicU64,
    live: AtomicUsize,
}

/// 预览句柄登记表
///
/// 可以廉价克隆，克隆之间共享计数
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为文件内容创建预览句柄
    pub fn open(&self, bytes: Vec<u8>) -> PreviewHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.live.fetch_add(1, Ordering::AcqRel);
        debug!("打开预览句柄 #{} ({} 字节)", id, bytes.len());

        PreviewHandle {
            id,
            bytes: Arc::from(bytes),
            registry: Arc::clone(&self.inner),
        }
    }

    /// 尚未释放的句柄数量
    pub fn live(&self) -> usize {
        self.inner.live.load(Ordering::Acquire)
    }
}

/// 预览句柄
///
/// 不可克隆，只有一个所有者
#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    bytes: Arc<[u8]>,
    registry: Arc<RegistryInner>,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 预览地址
    pub fn url(&self) -> String {
        format!("preview://{}", self.id)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.live.fetch_sub(1, Ordering::AcqRel);
        debug!("释放预览句柄 #{}", self.id);
    }
}
