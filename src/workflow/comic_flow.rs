//! 漫画生成流程 - 流程层
//!
//! 核心职责：定义"一本漫画"的完整生成流程
//!
//! 流程顺序（每个阶段开始前先把状态写回存储）：
//! 1. extracting：提取文档内容 → 生成学术摘要并保存
//! 2. scripting：结构化生成脚本并校验
//! 3. generating_images：逐个面板生成图片，最后生成封面
//! 4. completed：脚本 + 封面 + 状态一次写入
//!
//! 任何一步出错都会写入 failed 和错误信息；写入冲突除外，
//! 说明记录已被别人接管，直接停止

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::comic::{Comic, ComicPatch};
use crate::models::script::{Page, ScriptDraft};
use crate::services::{ComicStore, GenerationProvider};
use crate::utils::logging::truncate_text;
use crate::workflow::comic_ctx::ComicCtx;
use crate::workflow::prompts;
use crate::workflow::run_registry::RunRegistry;
use crate::workflow::state_machine::{transition, Command, Event, ProgressStep};

/// 进度通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub comic_id: String,
    pub step: ProgressStep,
}

/// 漫画生成流程
///
/// - 只依赖存储和生成两个能力
/// - 同一个 ID 同时只允许一个任务（由 `RunRegistry` 保证）
/// - 所有远程调用严格串行
pub struct ComicFlow {
    store: Arc<dyn ComicStore>,
    generator: Arc<dyn GenerationProvider>,
    registry: RunRegistry,
    progress: Option<UnboundedSender<ProgressUpdate>>,
}

impl ComicFlow {
    pub fn new(store: Arc<dyn ComicStore>, generator: Arc<dyn GenerationProvider>) -> Self {
        Self {
            store,
            generator,
            registry: RunRegistry::new(),
            progress: None,
        }
    }

    /// 与其他流程共享任务登记表
    pub fn with_registry(mut self, registry: RunRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 订阅进度通知
    pub fn with_progress(mut self, sender: UnboundedSender<ProgressUpdate>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// 对指定漫画执行一次完整生成
    ///
    /// 成功时返回最终记录；失败时记录已写成 failed，返回原始错误
    pub async fn run(&self, id: &str) -> AppResult<Comic> {
        let _guard = self.registry.acquire(id)?;

        let comic = self.store.get(id).await?;
        let mut ctx = ComicCtx::new(comic);
        info!(
            "{} 🚀 开始生成: {} 页, {} 风格",
            ctx, ctx.comic.page_count, ctx.comic.humor_style
        );

        match self.drive(&mut ctx).await {
            Ok(()) => {
                info!("{} ✅ 生成完成, 共 {} 个面板", ctx, ctx.comic.panel_count());
                Ok(ctx.into_comic())
            }
            Err(err) if err.is_stale_write() => {
                warn!("{} ⚠️ 记录已被其他写入方修改，停止生成: {}", ctx, err);
                Err(err)
            }
            Err(err) => {
                error!("{} ❌ 生成失败: {}", ctx, err);
                self.record_failure(&mut ctx, &err).await;
                Err(err)
            }
        }
    }

    /// 按状态机推进，直到完成
    async fn drive(&self, ctx: &mut ComicCtx) -> AppResult<()> {
        let mut event = Event::Start;

        loop {
            let restart = matches!(event, Event::Start);
            let (next, command) = transition(ctx.status(), event)?;

            // 完成和失败的状态跟随各自的数据一起写入
            let writes_own_status =
                matches!(command, Command::Finish { .. } | Command::RecordFailure { .. });
            if restart {
                self.write(ctx, ComicPatch::restart(next)).await?;
            } else if next != ctx.status() && !writes_own_status {
                self.write(ctx, ComicPatch::status(next)).await?;
            }

            match self.execute(ctx, command).await? {
                Some(next_event) => event = next_event,
                None => return Ok(()),
            }
        }
    }

    /// 执行一条命令，返回下一个事件；`None` 表示流程结束
    async fn execute(&self, ctx: &mut ComicCtx, command: Command) -> AppResult<Option<Event>> {
        let step = command.progress_step();
        match command {
            Command::ExtractContent => {
                self.report(ctx, step);
                info!("{} 📄 正在提取文档内容...", ctx);
                let extracted = self
                    .generator
                    .extract_content(&ctx.comic.uploaded_file_url, &ctx.comic.topic)
                    .await?;
                debug!("{} 提取结果: {}", ctx, truncate_text(&extracted, 80));
                Ok(Some(Event::ContentExtracted(extracted)))
            }
            Command::Summarize { extracted } => {
                self.report(ctx, step);
                info!("{} 🧠 正在生成学术摘要...", ctx);
                let prompt = prompts::summary_prompt(&ctx.comic.topic, &extracted);
                let summary = self.generator.generate_text(&prompt).await?;
                self.write(ctx, ComicPatch::summary(summary.clone())).await?;
                Ok(Some(Event::SummaryReady(summary)))
            }
            Command::WriteScript { summary } => {
                self.report(ctx, step);
                info!("{} ✍️ 正在编写 {} 页脚本...", ctx, ctx.comic.page_count);
                let prompt = prompts::script_prompt(&ctx.comic, &summary);
                let value = self
                    .generator
                    .generate_structured(&prompt, &ScriptDraft::json_schema())
                    .await?;
                let script = ScriptDraft::from_value(value)?;
                script.validate(ctx.comic.page_count)?;
                info!(
                    "{} ✓ 脚本完成: {} 页, {} 个面板",
                    ctx,
                    script.pages.len(),
                    script.panel_count()
                );
                Ok(Some(Event::ScriptReady(script)))
            }
            Command::IllustratePanels { script } => {
                self.report(ctx, step);
                let (pages, cover_image_url) = self.illustrate(ctx, script).await?;
                Ok(Some(Event::ImagesReady {
                    pages,
                    cover_image_url,
                }))
            }
            Command::Finish {
                pages,
                cover_image_url,
            } => {
                self.write(ctx, ComicPatch::completed(pages, cover_image_url))
                    .await?;
                // 完成状态落盘之后才通知
                self.report(ctx, step);
                Ok(None)
            }
            Command::RecordFailure { message } => {
                self.write(ctx, ComicPatch::failed(message)).await?;
                Ok(None)
            }
        }
    }

    /// 逐个面板生成图片，最后生成封面
    ///
    /// 上一张图片返回之前不会发出下一张的请求
    async fn illustrate(&self, ctx: &ComicCtx, script: ScriptDraft) -> AppResult<(Vec<Page>, String)> {
        let total = script.panel_count();
        let mut finished = 0usize;
        let mut pages = Vec::with_capacity(script.pages.len());

        for page in script.pages {
            let mut panels = Vec::with_capacity(page.panels.len());
            for panel in page.panels {
                let prompt = prompts::panel_image_prompt(&panel.image_prompt, &ctx.comic.topic);
                let image_url = self.generator.generate_image(&prompt).await?;
                finished += 1;
                info!(
                    "{} 🎨 第 {} 页面板 {} 完成 ({}/{})",
                    ctx, page.page_number, panel.panel_number, finished, total
                );
                panels.push(panel.into_panel(image_url));
            }
            pages.push(Page {
                page_number: page.page_number,
                panels,
            });
        }

        info!("{} 🖼️ 正在生成封面...", ctx);
        let cover_prompt = prompts::cover_prompt(&ctx.comic.title, &ctx.comic.topic);
        let cover_image_url = self.generator.generate_image(&cover_prompt).await?;

        Ok((pages, cover_image_url))
    }

    /// 把失败写回记录；写失败只记日志，调用方仍拿到原始错误
    async fn record_failure(&self, ctx: &mut ComicCtx, err: &AppError) {
        let command = match transition(ctx.status(), Event::Fail(err.to_string())) {
            Ok((_, command)) => command,
            Err(e) => {
                warn!("{} 当前状态无法记录失败: {}", ctx, e);
                return;
            }
        };

        if let Err(e) = self.execute(ctx, command).await {
            error!("{} ❌ 写入失败状态时出错: {}", ctx, e);
        }
    }

    /// 带版本号写入，成功后刷新上下文
    async fn write(&self, ctx: &mut ComicCtx, patch: ComicPatch) -> AppResult<()> {
        let updated = self.store.update(ctx.id(), ctx.version(), patch).await?;
        ctx.refresh(updated);
        Ok(())
    }

    fn report(&self, ctx: &ComicCtx, step: Option<ProgressStep>) {
        if let (Some(sender), Some(step)) = (&self.progress, step) {
            // 接收方已关闭时忽略
            let _ = sender.send(ProgressUpdate {
                comic_id: ctx.id().to_string(),
                step,
            });
        }
    }
}
