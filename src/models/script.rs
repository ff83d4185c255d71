//! 漫画脚本数据结构
//!
//! `ScriptDraft` 是结构化生成接口返回的原始结构，必须先经过 `validate`
//! 才能变成带图片的 `Page` / `Panel` 写进记录

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::{AppError, AppResult};

/// 漫画中的一页
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 从 1 开始连续编号
    pub page_number: u32,
    pub panels: Vec<Panel>,
}

/// 最小的画面单元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    /// 页内从 1 开始连续编号
    pub panel_number: u32,
    pub scene_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
    #[serde(default)]
    pub image_prompt: String,
    #[serde(default)]
    pub image_url: String,
}

/// 结构化生成返回的脚本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDraft {
    pub pages: Vec<DraftPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPage {
    #[serde(deserialize_with = "whole_number")]
    pub page_number: u32,
    pub panels: Vec<DraftPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPanel {
    #[serde(deserialize_with = "whole_number")]
    pub panel_number: u32,
    pub scene_description: String,
    #[serde(default)]
    pub dialogue: Option<String>,
    pub image_prompt: String,
}

/// 编号字段：模型有时会把 1 写成 1.0，只要是非负整数值就接受
fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(serde::de::Error::custom(format!(
            "编号必须是非负整数，实际为 {}",
            value
        )));
    }
    Ok(value as u32)
}

impl ScriptDraft {
    /// 请求结构化生成时附带的 JSON Schema
    pub fn json_schema() -> JsonValue {
        json!({
            "type": "object",
            "required": ["pages"],
            "properties": {
                "pages": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["page_number", "panels"],
                        "properties": {
                            "page_number": { "type": "integer" },
                            "panels": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "required": ["panel_number", "scene_description", "image_prompt"],
                                    "properties": {
                                        "panel_number": { "type": "integer" },
                                        "scene_description": { "type": "string" },
                                        "dialogue": { "type": "string" },
                                        "image_prompt": { "type": "string" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    /// 把结构化生成的结果反序列化为脚本
    pub fn from_value(value: JsonValue) -> AppResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::validation(format!("脚本结构不符合 Schema: {}", e)))
    }

    /// 校验脚本形状
    ///
    /// - 页数必须等于请求的页数
    /// - 页码必须正好是 1..=N
    /// - 每页至少一个面板，面板编号正好是 1..=M
    /// - 场景描述和图片提示词不能为空
    pub fn validate(&self, expected_pages: u32) -> AppResult<()> {
        if self.pages.len() != expected_pages as usize {
            return Err(AppError::validation(format!(
                "脚本页数为 {}，期望 {}",
                self.pages.len(),
                expected_pages
            )));
        }

        for (page_idx, page) in self.pages.iter().enumerate() {
            let expected_page_number = page_idx as u32 + 1;
            if page.page_number != expected_page_number {
                return Err(AppError::validation(format!(
                    "第 {} 页的页码为 {}，页码必须从 1 开始连续",
                    expected_page_number, page.page_number
                )));
            }

            if page.panels.is_empty() {
                return Err(AppError::validation(format!(
                    "第 {} 页没有任何面板",
                    page.page_number
                )));
            }

            for (panel_idx, panel) in page.panels.iter().enumerate() {
                let expected_panel_number = panel_idx as u32 + 1;
                if panel.panel_number != expected_panel_number {
                    return Err(AppError::validation(format!(
                        "第 {} 页第 {} 个面板编号为 {}，面板编号必须从 1 开始连续",
                        page.page_number, expected_panel_number, panel.panel_number
                    )));
                }
                if panel.scene_description.trim().is_empty() {
                    return Err(AppError::validation(format!(
                        "第 {} 页面板 {} 缺少场景描述",
                        page.page_number, panel.panel_number
                    )));
                }
                if panel.image_prompt.trim().is_empty() {
                    return Err(AppError::validation(format!(
                        "第 {} 页面板 {} 缺少图片提示词",
                        page.page_number, panel.panel_number
                    )));
                }
            }
        }

        Ok(())
    }

    /// 面板总数
    pub fn panel_count(&self) -> usize {
        self.pages.iter().map(|page| page.panels.len()).sum()
    }
}

impl DraftPanel {
    /// 附上生成好的图片，变成最终面板
    pub fn into_panel(self, image_url: impl Into<String>) -> Panel {
        let dialogue = self.dialogue.filter(|d| !d.trim().is_empty());
        Panel {
            panel_number: self.panel_number,
            scene_description: self.scene_description,
            dialogue,
            image_prompt: self.image_prompt,
            image_url: image_url.into(),
        }
    }
}
