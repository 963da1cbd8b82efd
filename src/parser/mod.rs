//! 文件名解析
//!
//! 真题文件名约定：`code_variant_sessionYear_type.pdf`，例如 `9709_p11_m25_qp.pdf`

pub mod filename;

pub use filename::{parse_filename, validate_upload};
