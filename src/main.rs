use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info};

use academic_comics::cli::{Cli, Commands};
use academic_comics::utils::logging;
use academic_comics::viewer::{render_library, Pager};
use academic_comics::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    let app = App::initialize(config).await?;

    match &cli.command {
        Commands::Create { file, generate, .. } => {
            let Some(params) = cli.command.comic_params() else {
                bail!("缺少漫画参数");
            };
            match app.create(&params, file, *generate).await {
                Ok(comic) => println!("{}\t{}", comic.id, comic.status),
                Err(e) => {
                    error!("❌ 漫画生成失败: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Generate { id } => match app.generate(id).await {
            Ok(comic) => info!("🎉 漫画已生成: {} 《{}》", comic.id, comic.title),
            Err(e) => {
                error!("❌ 漫画生成失败: {}", e);
                return Err(e.into());
            }
        },
        Commands::ProcessPending => {
            let summary = app.process_pending().await?;
            if summary.failed > 0 {
                bail!("{} 本漫画生成失败", summary.failed);
            }
        }
        Commands::List => {
            let comics = app.list().await?;
            println!("{}", render_library(&comics));
        }
        Commands::Show { id, page } => {
            let comic = app.show(id).await?;
            let mut pager = Pager::open(&comic)?;
            pager.go_to(*page);
            println!("{}", pager.render());
        }
        Commands::Download { id, out } => {
            let report = app.download(id, out).await?;
            info!("✅ 已下载 {} 张图片到 {}", report.saved.len(), out.display());
        }
    }

    Ok(())
}
