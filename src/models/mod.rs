pub mod document_type;
pub mod note;
pub mod paper;
pub mod paper_group;
pub mod session;
pub mod subject;

pub use document_type::DocumentType;
pub use note::{NewNote, StoredNote};
pub use paper::{
    variant_number, IncomingFile, PaperFile, PaperRecord, ParsedFileName, UploadedPaper,
    PDF_MIME_TYPE, UNKNOWN_MIME_TYPE,
};
pub use paper_group::{Availability, GroupKey, PaperGroup};
pub use session::Session;
pub use subject::Subject;
