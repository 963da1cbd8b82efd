use alevel_papers::config::parse_env_var;
use alevel_papers::utils::logging::init_tracing;
use alevel_papers::{App, Config};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志（先于配置加载，配置解析失败的警告才能输出）
    let verbose = parse_env_var::<bool>("VERBOSE_LOGGING")
        .ok()
        .flatten()
        .unwrap_or(false);
    init_tracing(verbose);

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    let _catalog = App::initialize(config).await?.run().await?;

    Ok(())
}
