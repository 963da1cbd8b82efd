//! 业务能力层（Services）
//!
//! 描述"我能做什么"：真题上传与分组、笔记管理。
//! 只通过 [`PaperStore`](crate::infrastructure::PaperStore) 访问存储，不关心具体后端。

pub mod notes_service;
pub mod paper_library;
pub mod upload_summary;

pub use notes_service::{find_note_for_topic, note_title, NotesService};
pub use paper_library::{EntryId, LibraryEntry, PaperLibrary};
pub use upload_summary::UploadSummary;
