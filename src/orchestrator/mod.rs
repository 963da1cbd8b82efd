//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次完整的上传流程，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量上传处理器
//! - 管理应用生命周期（初始化、运行）
//! - 扫描上传目录，读取文件（`Vec<IncomingFile>`）
//! - 持有存储后端（FsStore）
//! - 输出分组结果和全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理整个上传目录)
//!     ↓
//! services (能力层：PaperLibrary / NotesService)
//!     ↓
//! grouping + parser (纯函数：解析、配对、排序)
//!     ↓
//! infrastructure (基础设施：PaperStore / PreviewRegistry)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有存储后端
//! 2. **向下依赖**：编排层 → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做文件名校验

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{load_upload_files, App, SubjectCatalog};
