use crate::config::Config;
use crate::models::{Availability, PaperGroup, Subject};
use crate::services::UploadSummary;
use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化 tracing
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug / info。重复调用不会报错。
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n真题上传日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 追加一行到日志文件
pub fn append_to_log_file(log_file_path: &str, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%H:%M:%S"),
        line
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 真题上传与分组");
    info!("📁 上传目录: {}", config.upload_folder);
    info!("📂 存储目录: {}", config.storage_root);
    info!("🪣 存储桶: {} / {}", config.papers_bucket, config.notes_bucket);
    info!("{}", "=".repeat(60));
}

/// 记录一批上传的结果
///
/// # 参数
/// - `label`: 批次名称（真题 / 笔记）
/// - `summary`: 上传统计
pub fn log_upload_summary(label: &str, summary: &UploadSummary) {
    info!("\n{}", "─".repeat(60));
    info!("✓ {}上传: {}", label, summary);
    if summary.malformed > 0 {
        warn!("  文件名不合格: {}", summary.malformed);
    }
    if summary.unsupported > 0 {
        warn!("  不是 PDF: {}", summary.unsupported);
    }
    if summary.storage_failed > 0 {
        warn!("  存储失败: {}", summary.storage_failed);
    }
    info!("{}", "─".repeat(60));
}

/// 输出某个科目的分组
///
/// # 参数
/// - `subject_code`: 科目代码
/// - `groups`: 已排序的分组
pub fn log_subject_groups(subject_code: &str, groups: &[PaperGroup]) {
    let subject_name = Subject::from_code_str(subject_code)
        .map(|s| s.name())
        .unwrap_or("未知科目");

    info!("\n📘 {} ({}) - {} 组", subject_name, subject_code, groups.len());
    for group in groups {
        let status = match group.availability() {
            Availability::Complete => "✅",
            Availability::MarkSchemeComingSoon => "⏳ mark scheme coming soon",
            Availability::PaperComingSoon => "⏳ paper coming soon",
            Availability::Empty => "⚠️ 空分组",
        };
        info!("  {} {}", group.title(), status);
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 全部上传的统计
/// - `group_count`: 分组总数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(summary: &UploadSummary, group_count: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.succeeded, summary.total());
    info!("❌ 失败: {}", summary.failed());
    info!("📚 分组: {}", group_count);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}
