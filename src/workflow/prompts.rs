//! 生成流程中用到的提示词

use crate::models::comic::Comic;

/// 面板图片统一追加的画风描述
const PANEL_STYLE_SUFFIX: &str = "Minimalist comic book art style, simple clean lines, black and white with neon accent colors (cyan, purple, magenta), futuristic aesthetic, academic theme.";

/// 学术摘要提示词
pub fn summary_prompt(topic: &str, extracted: &str) -> String {
    format!(
        r#"You are an expert educator. Create a clear, accurate academic summary of the following content about "{topic}".

Organize the information into key concepts, each with:
- Main concept/theory name
- Clear explanation
- Important facts or formulas
- Real-world applications or examples

Content to summarize:
{extracted}

Make it educational, accurate, and well-structured for learning."#
    )
}

/// 脚本提示词，页数是硬性要求
pub fn script_prompt(comic: &Comic, summary: &str) -> String {
    let pages = comic.page_count;
    let topic = &comic.topic;
    let humor = comic.humor_style.as_str();

    format!(
        r#"You are a master comic book writer who creates educational comics. Create a {pages}-page comic script about "{topic}" with {humor} humor.

Academic Content:
{summary}

CRITICAL REQUIREMENTS:
1. Create EXACTLY {pages} pages
2. Each page should have 2-4 panels
3. Humor style: {humor}
4. Keep academic accuracy - never compromise educational content
5. Use characters that personify concepts or represent students/professors
6. Include dialogue that's both funny and educational
7. Each panel needs a visual scene description and dialogue

Output as JSON with this EXACT structure:
{{
  "pages": [
    {{
      "page_number": 1,
      "panels": [
        {{
          "panel_number": 1,
          "scene_description": "Detailed visual description for image generation",
          "dialogue": "What the characters say",
          "image_prompt": "Detailed prompt for image generation (minimalist comic art style, simple clean lines, academic theme)"
        }}
      ]
    }}
  ]
}}"#
    )
}

/// 面板图片提示词：面板自己的描述 + 固定画风 + 主题
pub fn panel_image_prompt(image_prompt: &str, topic: &str) -> String {
    format!(
        "{}. {} {} concept visualization.",
        image_prompt.trim_end_matches('.'),
        PANEL_STYLE_SUFFIX,
        topic
    )
}

/// 封面提示词
pub fn cover_prompt(title: &str, topic: &str) -> String {
    format!(
        r#"Comic book cover for "{title}". Topic: {topic}. Futuristic minimalist style, neon colors (cyan, purple, magenta), academic theme, clean bold title text, professional comic book cover design"#
    )
}
