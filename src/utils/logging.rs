/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，否则 verbose 时为 debug，默认 info。
/// 重复调用不会报错（测试里会多次初始化）
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("academic_comics={0},comic_forge={0}", default_level))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 学术漫画生成");
    info!("🗄️ 存储后端: {:?}  数据目录: {}", config.store_backend, config.data_dir);
    info!("🤖 文本模型: {}  图片模型: {}", config.llm_model_name, config.image_model_name);
    info!("{}", "=".repeat(60));
}

/// 记录待处理漫画加载信息
pub fn log_comics_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待生成的漫画", total);
    info!("📋 最多同时生成 {} 本", max_concurrent);
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, failed: usize, skipped: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    if skipped > 0 {
        info!("⏭️ 跳过（已在运行或写入冲突）: {}", skipped);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
