use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Multiplier4x,
    Stability,
    Volatility,
    TotalVolume,
    VolumeIntegral,
    Wear,
    RecentStable,
    Stable,
    Volatile,
    None,
    ClearConfirm,
    InvalidValue,
}

impl Language {
    /// Pick the label language from a page path, falling back to a document language tag.
    pub fn detect(path: &str, lang_tag: &str) -> Self {
        if path.contains("/zh-CN/") || path.contains("/zh/") {
            return Self::Zh;
        }
        if path.contains("/en/") || path.contains("/en-US/") {
            return Self::En;
        }
        if lang_tag.starts_with("en") {
            return Self::En;
        }
        Self::Zh
    }

    pub fn text(self, label: Label) -> &'static str {
        match self {
            Self::Zh => match label {
                Label::Multiplier4x => "4倍时间",
                Label::Stability => "稳定度",
                Label::Volatility => "波动率",
                Label::TotalVolume => "交易量",
                Label::VolumeIntegral => "交易量积分",
                Label::Wear => "磨损 / 磨损率",
                Label::RecentStable => "最近稳定",
                Label::Stable => "稳定",
                Label::Volatile => "波动",
                Label::None => "暂无",
                Label::ClearConfirm => "是否清空 交易量 / 交易量积分 / 磨损 / 磨损率？",
                Label::InvalidValue => "无效的数值",
            },
            Self::En => match label {
                Label::Multiplier4x => "4x Time",
                Label::Stability => "Stability",
                Label::Volatility => "Volatility",
                Label::TotalVolume => "Volume",
                Label::VolumeIntegral => "Volume Points",
                Label::Wear => "Wear / Wear Rate",
                Label::RecentStable => "Recent Stable",
                Label::Stable => "Stable",
                Label::Volatile => "Volatile",
                Label::None => "None",
                Label::ClearConfirm => {
                    "Clear all data: Volume / Volume Points / Wear / Wear Rate?"
                }
                Label::InvalidValue => "Invalid value",
            },
        }
    }
}
