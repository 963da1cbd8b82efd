//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（存储后端、预览句柄），只暴露能力，不认识业务流程

pub mod fs_store;
pub mod memory_store;
pub mod preview;
pub mod store;

pub use fs_store::FsStore;
pub use memory_store::MemoryStore;
pub use preview::{PreviewHandle, PreviewRegistry};
pub use store::{storage_path, PaperStore};
