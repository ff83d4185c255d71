use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tokio::sync::{mpsc, Notify};
use tokio_test::{assert_err, assert_ok};

use academic_comics::error::{AppError, AppResult, RemoteOperation};
use academic_comics::models::{Comic, ComicPatch, ComicStatus, HumorStyle, NewComic};
use academic_comics::orchestrator::BatchProcessor;
use academic_comics::services::{ComicStore, GenerationProvider, MemoryComicStore};
use academic_comics::viewer::{Pager, PagerView};
use academic_comics::workflow::{ComicFlow, ProgressStep};

const IMAGE_FAILURE: &str = "image quota exceeded";
const EXTRACT_FAILURE: &str = "unsupported document";
const SUMMARY_FAILURE: &str = "text model overloaded";
const SCRIPT_FAILURE: &str = "structured output refused";

/// 可编排的生成能力替身
#[derive(Default)]
struct StubProvider {
    /// 返回脚本的页数和每页面板数
    pages: u32,
    panels_per_page: u32,
    /// 第 N 次图片调用时失败（从 1 开始）
    fail_on_image_call: Option<usize>,
    /// 对应阶段直接失败
    fail_extraction: bool,
    fail_summary: bool,
    fail_script: bool,
    extract_calls: AtomicUsize,
    text_calls: AtomicUsize,
    structured_calls: AtomicUsize,
    image_calls: AtomicUsize,
    image_prompts: Mutex<Vec<String>>,
    structured_prompts: Mutex<Vec<String>>,
    /// 提取阶段的握手：先通知已进入，再等待放行
    entered: Option<Arc<Notify>>,
    release: Option<Arc<Notify>>,
    /// 生成摘要时偷偷改写记录，模拟另一个写入方
    interfere: Option<(Arc<MemoryComicStore>, String)>,
}

impl StubProvider {
    fn new(pages: u32, panels_per_page: u32) -> Self {
        Self {
            pages,
            panels_per_page,
            ..Default::default()
        }
    }

    fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    fn script(&self) -> JsonValue {
        let pages: Vec<JsonValue> = (1..=self.pages)
            .map(|p| {
                let panels: Vec<JsonValue> = (1..=self.panels_per_page)
                    .map(|n| {
                        json!({
                            "panel_number": n,
                            "scene_description": format!("page {} panel {}", p, n),
                            "dialogue": format!("line {}-{}", p, n),
                            "image_prompt": format!("prompt {}-{}", p, n)
                        })
                    })
                    .collect();
                json!({ "page_number": p, "panels": panels })
            })
            .collect();
        json!({ "pages": pages })
    }
}

#[async_trait]
impl GenerationProvider for StubProvider {
    async fn extract_content(&self, _file_url: &str, topic: &str) -> AppResult<String> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_extraction {
            return Err(AppError::remote(RemoteOperation::ContentExtraction, EXTRACT_FAILURE));
        }
        if let Some(entered) = &self.entered {
            entered.notify_one();
        }
        if let Some(release) = &self.release {
            release.notified().await;
        }
        Ok(format!("extracted notes about {}", topic))
    }

    async fn generate_text(&self, _prompt: &str) -> AppResult<String> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_summary {
            return Err(AppError::remote(RemoteOperation::TextGeneration, SUMMARY_FAILURE));
        }
        if let Some((store, id)) = &self.interfere {
            let current = store.get(id).await?;
            store
                .update(id, current.version, ComicPatch::summary("someone else"))
                .await?;
        }
        Ok("a tidy academic summary".to_string())
    }

    async fn generate_structured(&self, prompt: &str, _schema: &JsonValue) -> AppResult<JsonValue> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.structured_prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_script {
            return Err(AppError::remote(RemoteOperation::StructuredGeneration, SCRIPT_FAILURE));
        }
        Ok(self.script())
    }

    async fn generate_image(&self, prompt: &str) -> AppResult<String> {
        let call = self.image_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.image_prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_on_image_call == Some(call) {
            return Err(AppError::remote(RemoteOperation::ImageGeneration, IMAGE_FAILURE));
        }
        Ok(format!("https://img.test/{}.png", call))
    }
}

async fn create_comic(store: &MemoryComicStore, page_count: u32) -> Comic {
    store
        .create(NewComic {
            title: "Photosynthesis Party".to_string(),
            topic: "Photosynthesis".to_string(),
            humor_style: HumorStyle::Witty,
            page_count,
            uploaded_file_url: "file:///tmp/leaf.txt".to_string(),
            status: ComicStatus::Uploading,
        })
        .await
        .unwrap()
}

fn flow(store: &Arc<MemoryComicStore>, provider: &Arc<StubProvider>) -> ComicFlow {
    ComicFlow::new(store.clone(), provider.clone())
}

#[tokio::test]
async fn test_three_pages_two_panels_generates_six_panels_and_cover() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider::new(3, 2));
    let comic = create_comic(&store, 3).await;

    let finished = assert_ok!(flow(&store, &provider).run(&comic.id).await);

    assert_eq!(provider.image_calls(), 7);
    assert_eq!(provider.extract_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.text_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.structured_calls.load(Ordering::SeqCst), 1);

    let stored = store.get(&comic.id).await.unwrap();
    assert_eq!(stored, finished);
    assert_eq!(stored.status, ComicStatus::Completed);
    assert_eq!(stored.script.len(), 3);
    assert_eq!(stored.cover_image_url.as_deref(), Some("https://img.test/7.png"));
    assert_eq!(stored.academic_summary.as_deref(), Some("a tidy academic summary"));
    assert_eq!(stored.error_message, None);

    // 面板按页、按序生成，封面最后
    let urls: Vec<&str> = stored
        .script
        .iter()
        .flat_map(|page| page.panels.iter().map(|panel| panel.image_url.as_str()))
        .collect();
    assert_eq!(
        urls,
        (1..=6)
            .map(|n| format!("https://img.test/{}.png", n))
            .collect::<Vec<_>>()
    );

    let prompts = provider.image_prompts.lock().unwrap().clone();
    assert!(prompts[0].starts_with("prompt 1-1. Minimalist comic book art style"));
    assert!(prompts[0].ends_with("Photosynthesis concept visualization."));
    assert!(prompts[6].starts_with("Comic book cover for \"Photosynthesis Party\""));

    let structured_prompts = provider.structured_prompts.lock().unwrap().clone();
    assert!(structured_prompts[0].contains("Create EXACTLY 3 pages"));
}

#[tokio::test]
async fn test_status_checkpoints_are_written_in_order() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider::new(3, 2));
    let comic = create_comic(&store, 3).await;

    assert_ok!(flow(&store, &provider).run(&comic.id).await);

    assert_eq!(
        store.status_history(&comic.id).await,
        vec![
            ComicStatus::Uploading,
            ComicStatus::Extracting,
            ComicStatus::Scripting,
            ComicStatus::GeneratingImages,
            ComicStatus::Completed,
        ]
    );
}

#[tokio::test]
async fn test_failure_on_fourth_image_records_failed_with_message() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider {
        fail_on_image_call: Some(4),
        ..StubProvider::new(3, 2)
    });
    let comic = create_comic(&store, 3).await;

    let err = assert_err!(flow(&store, &provider).run(&comic.id).await);
    assert_eq!(err.to_string(), IMAGE_FAILURE);

    // 第 4 次失败后不再发出请求
    assert_eq!(provider.image_calls(), 4);

    let stored = store.get(&comic.id).await.unwrap();
    assert_eq!(stored.status, ComicStatus::Failed);
    assert_eq!(stored.error_message.as_deref(), Some(IMAGE_FAILURE));
    assert!(stored.script.is_empty());
    assert_eq!(stored.cover_image_url, None);
    // 摘要在失败前已经保存
    assert_eq!(stored.academic_summary.as_deref(), Some("a tidy academic summary"));
    assert_eq!(
        store.status_history(&comic.id).await.last(),
        Some(&ComicStatus::Failed)
    );
}

#[tokio::test]
async fn test_failure_in_each_text_stage_records_failed_with_message() {
    let cases = [
        (
            StubProvider {
                fail_extraction: true,
                ..StubProvider::new(3, 2)
            },
            EXTRACT_FAILURE,
            vec![ComicStatus::Extracting],
        ),
        (
            StubProvider {
                fail_summary: true,
                ..StubProvider::new(3, 2)
            },
            SUMMARY_FAILURE,
            vec![ComicStatus::Extracting],
        ),
        (
            StubProvider {
                fail_script: true,
                ..StubProvider::new(3, 2)
            },
            SCRIPT_FAILURE,
            vec![ComicStatus::Extracting, ComicStatus::Scripting],
        ),
    ];

    for (provider, message, reached) in cases {
        let mut expected_history = vec![ComicStatus::Uploading];
        expected_history.extend(reached);
        expected_history.push(ComicStatus::Failed);

        let store = Arc::new(MemoryComicStore::new());
        let provider = Arc::new(provider);
        let comic = create_comic(&store, 3).await;

        let err = assert_err!(flow(&store, &provider).run(&comic.id).await);
        assert_eq!(err.to_string(), message);
        assert_eq!(provider.image_calls(), 0);

        let stored = store.get(&comic.id).await.unwrap();
        assert_eq!(stored.status, ComicStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some(message));
        assert!(stored.script.is_empty());
        assert_eq!(store.status_history(&comic.id).await, expected_history);
    }
}

#[tokio::test]
async fn test_rerun_issues_fresh_calls_and_overwrites_results() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider::new(3, 2));
    let comic = create_comic(&store, 3).await;
    let flow = flow(&store, &provider);

    let first = assert_ok!(flow.run(&comic.id).await);
    let second = assert_ok!(flow.run(&comic.id).await);

    assert_eq!(provider.extract_calls.load(Ordering::SeqCst), 2);
    assert_eq!(provider.image_calls(), 14);
    assert_eq!(first.cover_image_url.as_deref(), Some("https://img.test/7.png"));
    assert_eq!(second.cover_image_url.as_deref(), Some("https://img.test/14.png"));
    assert_eq!(second.script[0].panels[0].image_url, "https://img.test/8.png");
    assert!(second.version > first.version);
}

#[tokio::test]
async fn test_rerun_after_failure_clears_error() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider {
        fail_on_image_call: Some(2),
        ..StubProvider::new(3, 1)
    });
    let comic = create_comic(&store, 3).await;
    let flow = flow(&store, &provider);

    assert_err!(flow.run(&comic.id).await);
    assert_eq!(
        store.get(&comic.id).await.unwrap().status,
        ComicStatus::Failed
    );

    let recovered = assert_ok!(flow.run(&comic.id).await);
    assert_eq!(recovered.status, ComicStatus::Completed);
    assert_eq!(recovered.error_message, None);
}

#[tokio::test]
async fn test_missing_comic_is_not_found_without_writes() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider::new(3, 2));

    let err = assert_err!(flow(&store, &provider).run("no-such-comic").await);
    assert!(matches!(err, AppError::NotFound { .. }));
    assert_eq!(provider.extract_calls.load(Ordering::SeqCst), 0);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_page_count_mismatch_fails_before_any_image() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider::new(2, 2));
    let comic = create_comic(&store, 3).await;

    let err = assert_err!(flow(&store, &provider).run(&comic.id).await);
    assert!(matches!(err, AppError::ValidationFailure { .. }));
    assert_eq!(provider.image_calls(), 0);

    let stored = store.get(&comic.id).await.unwrap();
    assert_eq!(stored.status, ComicStatus::Failed);
    assert_eq!(stored.error_message, Some(err.to_string()));
}

#[tokio::test]
async fn test_concurrent_run_for_same_comic_is_rejected() {
    let store = Arc::new(MemoryComicStore::new());
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let provider = Arc::new(StubProvider {
        entered: Some(entered.clone()),
        release: Some(release.clone()),
        ..StubProvider::new(3, 2)
    });
    let comic = create_comic(&store, 3).await;
    let flow = Arc::new(flow(&store, &provider));

    let first = {
        let flow = flow.clone();
        let id = comic.id.clone();
        tokio::spawn(async move { flow.run(&id).await })
    };

    // 等第一个任务进入提取阶段
    entered.notified().await;

    let err = assert_err!(flow.run(&comic.id).await);
    assert!(matches!(err, AppError::AlreadyRunning { .. }));
    // 被拒绝的任务不会写状态
    assert_eq!(
        store.get(&comic.id).await.unwrap().status,
        ComicStatus::Extracting
    );

    release.notify_one();
    let finished = assert_ok!(first.await.unwrap());
    assert_eq!(finished.status, ComicStatus::Completed);
    assert_eq!(provider.extract_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stale_write_stops_without_recording_failure() {
    let store = Arc::new(MemoryComicStore::new());
    let comic = create_comic(&store, 3).await;
    let provider = Arc::new(StubProvider {
        interfere: Some((store.clone(), comic.id.clone())),
        ..StubProvider::new(3, 2)
    });

    let err = assert_err!(flow(&store, &provider).run(&comic.id).await);
    assert!(err.is_stale_write());
    assert_eq!(provider.structured_calls.load(Ordering::SeqCst), 0);

    let stored = store.get(&comic.id).await.unwrap();
    assert_eq!(stored.status, ComicStatus::Extracting);
    assert_eq!(stored.error_message, None);
    assert_eq!(stored.academic_summary.as_deref(), Some("someone else"));
}

#[tokio::test]
async fn test_progress_steps_are_reported_in_order() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider::new(3, 2));
    let comic = create_comic(&store, 3).await;
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let flow = flow(&store, &provider).with_progress(sender);
    assert_ok!(flow.run(&comic.id).await);
    drop(flow);

    let mut steps = Vec::new();
    while let Some(update) = receiver.recv().await {
        assert_eq!(update.comic_id, comic.id);
        steps.push(update.step);
    }
    assert_eq!(
        steps,
        vec![
            ProgressStep::ExtractingContent,
            ProgressStep::AcademicAnalysis,
            ProgressStep::ScriptWriting,
            ProgressStep::GeneratingArt,
            ProgressStep::Complete,
        ]
    );
}

#[tokio::test]
async fn test_batch_processes_only_uploading_comics() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider::new(3, 1));
    let pending_a = create_comic(&store, 3).await;
    let pending_b = create_comic(&store, 3).await;
    let done = create_comic(&store, 3).await;
    let done = store
        .update(&done.id, done.version, ComicPatch::completed(Vec::new(), "cover"))
        .await
        .unwrap();

    let flow = Arc::new(flow(&store, &provider));
    let summary = BatchProcessor::new(store.clone(), flow, 2)
        .process_pending()
        .await
        .unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 0);
    // 每本 3 个面板 + 1 个封面
    assert_eq!(provider.image_calls(), 8);

    for id in [&pending_a.id, &pending_b.id] {
        assert_eq!(
            store.get(id).await.unwrap().status,
            ComicStatus::Completed
        );
    }
    assert_eq!(store.get(&done.id).await.unwrap().version, done.version);
}

#[tokio::test]
async fn test_completed_comic_pages_through_cover_and_script() {
    let store = Arc::new(MemoryComicStore::new());
    let provider = Arc::new(StubProvider::new(3, 2));
    let comic = create_comic(&store, 3).await;
    let finished = assert_ok!(flow(&store, &provider).run(&comic.id).await);

    let mut pager = assert_ok!(Pager::open(&finished));
    assert!(matches!(pager.current(), PagerView::Cover { .. }));

    for _ in 0..5 {
        pager.next_page();
    }
    assert_eq!(pager.index(), 3);
    match pager.current() {
        PagerView::Page(page) => assert_eq!(page.page_number, 3),
        other => panic!("expected last page, got {:?}", other),
    }
    assert_eq!(pager.position_label(), "Page 4 of 4");
}
