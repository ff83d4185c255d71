use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 幽默风格枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumorStyle {
    /// 机智
    #[default]
    Witty,
    /// 梗图
    Meme,
    /// 宝莱坞
    Bollywood,
    /// 双关语
    Puns,
    /// 讽刺
    Sarcastic,
}

/// 别名表（小写）
static ALIASES: phf::Map<&'static str, HumorStyle> = phf_map! {
    "witty" => HumorStyle::Witty,
    "clever" => HumorStyle::Witty,
    "meme" => HumorStyle::Meme,
    "memes" => HumorStyle::Meme,
    "meme-style" => HumorStyle::Meme,
    "bollywood" => HumorStyle::Bollywood,
    "puns" => HumorStyle::Puns,
    "pun" => HumorStyle::Puns,
    "wordplay" => HumorStyle::Puns,
    "sarcastic" => HumorStyle::Sarcastic,
    "sarcasm" => HumorStyle::Sarcastic,
};

impl HumorStyle {
    pub const ALL: [HumorStyle; 5] = [
        HumorStyle::Witty,
        HumorStyle::Meme,
        HumorStyle::Bollywood,
        HumorStyle::Puns,
        HumorStyle::Sarcastic,
    ];

    /// 接口里使用的取值
    pub fn as_str(self) -> &'static str {
        match self {
            HumorStyle::Witty => "witty",
            HumorStyle::Meme => "meme",
            HumorStyle::Bollywood => "bollywood",
            HumorStyle::Puns => "puns",
            HumorStyle::Sarcastic => "sarcastic",
        }
    }

    /// 展示名称
    pub fn label(self) -> &'static str {
        match self {
            HumorStyle::Witty => "Witty & Clever",
            HumorStyle::Meme => "Meme-style",
            HumorStyle::Bollywood => "Bollywood-inspired",
            HumorStyle::Puns => "Puns & Wordplay",
            HumorStyle::Sarcastic => "Sarcastic",
        }
    }

    /// 从字符串解析（忽略大小写，支持别名）
    pub fn find(s: &str) -> Option<Self> {
        ALIASES.get(s.trim().to_lowercase().as_str()).copied()
    }
}

impl std::str::FromStr for HumorStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::find(s).ok_or_else(|| {
            let allowed: Vec<&str> = Self::ALL.iter().map(|h| h.as_str()).collect();
            format!("未知的幽默风格 '{}'，可选: {}", s, allowed.join(", "))
        })
    }
}

impl std::fmt::Display for HumorStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
