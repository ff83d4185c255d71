//! 漫画生成状态机
//!
//! `transition` 是纯函数：(当前状态, 事件) → (新状态, 下一步命令)。
//! 副作用（远程调用、写记录）全部由 `ComicFlow` 根据命令执行
//!
//! ```text
//! 任意状态 ──Start──▶ extracting ──ContentExtracted──▶ extracting
//!   ──SummaryReady──▶ scripting ──ScriptReady──▶ generating_images
//!   ──ImagesReady──▶ completed
//! 任意非终态 ──Fail──▶ failed
//! ```

use crate::error::{AppError, AppResult};
use crate::models::comic::ComicStatus;
use crate::models::script::{Page, ScriptDraft};

/// 驱动状态机的事件
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// 开始（或重新开始）一次生成
    Start,
    /// 文档内容已提取
    ContentExtracted(String),
    /// 学术摘要已生成并保存
    SummaryReady(String),
    /// 脚本已生成并通过校验
    ScriptReady(ScriptDraft),
    /// 所有面板和封面都已生成
    ImagesReady {
        pages: Vec<Page>,
        cover_image_url: String,
    },
    /// 任意阶段出错
    Fail(String),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::ContentExtracted(_) => "content_extracted",
            Event::SummaryReady(_) => "summary_ready",
            Event::ScriptReady(_) => "script_ready",
            Event::ImagesReady { .. } => "images_ready",
            Event::Fail(_) => "fail",
        }
    }
}

/// 状态转移后要执行的命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ExtractContent,
    Summarize { extracted: String },
    WriteScript { summary: String },
    IllustratePanels { script: ScriptDraft },
    Finish {
        pages: Vec<Page>,
        cover_image_url: String,
    },
    RecordFailure { message: String },
}

impl Command {
    /// 对应的进度步骤
    pub fn progress_step(&self) -> Option<ProgressStep> {
        match self {
            Command::ExtractContent => Some(ProgressStep::ExtractingContent),
            Command::Summarize { .. } => Some(ProgressStep::AcademicAnalysis),
            Command::WriteScript { .. } => Some(ProgressStep::ScriptWriting),
            Command::IllustratePanels { .. } => Some(ProgressStep::GeneratingArt),
            Command::Finish { .. } => Some(ProgressStep::Complete),
            Command::RecordFailure { .. } => None,
        }
    }
}

/// 面向用户的进度步骤（1 ~ 5）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressStep {
    ExtractingContent = 1,
    AcademicAnalysis = 2,
    ScriptWriting = 3,
    GeneratingArt = 4,
    Complete = 5,
}

impl ProgressStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            ProgressStep::ExtractingContent => "Extracting Content",
            ProgressStep::AcademicAnalysis => "Academic Analysis",
            ProgressStep::ScriptWriting => "Script Writing",
            ProgressStep::GeneratingArt => "Generating Art",
            ProgressStep::Complete => "Complete",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ProgressStep::ExtractingContent => "Reading your uploaded material",
            ProgressStep::AcademicAnalysis => "Summarizing key concepts",
            ProgressStep::ScriptWriting => "Creating comic narrative",
            ProgressStep::GeneratingArt => "Drawing comic panels",
            ProgressStep::Complete => "Your comic is ready!",
        }
    }
}

/// 状态转移
pub fn transition(state: ComicStatus, event: Event) -> AppResult<(ComicStatus, Command)> {
    use ComicStatus::*;

    match (state, event) {
        (_, Event::Start) => Ok((Extracting, Command::ExtractContent)),
        (Extracting, Event::ContentExtracted(extracted)) => {
            Ok((Extracting, Command::Summarize { extracted }))
        }
        (Extracting, Event::SummaryReady(summary)) => {
            Ok((Scripting, Command::WriteScript { summary }))
        }
        (Scripting, Event::ScriptReady(script)) => {
            Ok((GeneratingImages, Command::IllustratePanels { script }))
        }
        (
            GeneratingImages,
            Event::ImagesReady {
                pages,
                cover_image_url,
            },
        ) => Ok((
            Completed,
            Command::Finish {
                pages,
                cover_image_url,
            },
        )),
        (state, Event::Fail(message)) if !state.is_terminal() => {
            Ok((Failed, Command::RecordFailure { message }))
        }
        (state, event) => Err(AppError::InvalidTransition {
            from: state.to_string(),
            event: event.name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ComicStatus::*;

    fn empty_script() -> ScriptDraft {
        ScriptDraft { pages: Vec::new() }
    }

    #[test]
    fn test_happy_path_moves_forward() {
        let (s, c) = transition(Uploading, Event::Start).unwrap();
        assert_eq!((s, c), (Extracting, Command::ExtractContent));

        let (s, c) = transition(s, Event::ContentExtracted("text".into())).unwrap();
        assert_eq!(s, Extracting);
        assert_eq!(c.progress_step(), Some(ProgressStep::AcademicAnalysis));

        let (s, _) = transition(s, Event::SummaryReady("summary".into())).unwrap();
        assert_eq!(s, Scripting);

        let (s, _) = transition(s, Event::ScriptReady(empty_script())).unwrap();
        assert_eq!(s, GeneratingImages);

        let (s, c) = transition(
            s,
            Event::ImagesReady {
                pages: Vec::new(),
                cover_image_url: "cover".into(),
            },
        )
        .unwrap();
        assert_eq!(s, Completed);
        assert_eq!(c.progress_step(), Some(ProgressStep::Complete));
    }

    #[test]
    fn test_start_is_accepted_from_every_state() {
        for state in [Uploading, Extracting, Scripting, GeneratingImages, Completed, Failed] {
            let (next, command) = transition(state, Event::Start).unwrap();
            assert_eq!(next, Extracting);
            assert_eq!(command, Command::ExtractContent);
        }
    }

    #[test]
    fn test_events_out_of_order_are_rejected() {
        assert!(transition(Uploading, Event::SummaryReady("s".into())).is_err());
        assert!(transition(Extracting, Event::ScriptReady(empty_script())).is_err());
        assert!(transition(Scripting, Event::ContentExtracted("t".into())).is_err());
        let err = transition(
            Completed,
            Event::ImagesReady {
                pages: Vec::new(),
                cover_image_url: String::new(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn test_fail_only_from_non_terminal_states() {
        for state in [Uploading, Extracting, Scripting, GeneratingImages] {
            let (next, command) = transition(state, Event::Fail("boom".into())).unwrap();
            assert_eq!(next, Failed);
            assert_eq!(
                command,
                Command::RecordFailure {
                    message: "boom".into()
                }
            );
        }
        assert!(transition(Completed, Event::Fail("x".into())).is_err());
        assert!(transition(Failed, Event::Fail("x".into())).is_err());
    }

    #[test]
    fn test_progress_steps_are_numbered() {
        assert_eq!(ProgressStep::ExtractingContent.number(), 1);
        assert_eq!(ProgressStep::Complete.number(), 5);
        assert!(ProgressStep::ScriptWriting < ProgressStep::GeneratingArt);
    }
}
