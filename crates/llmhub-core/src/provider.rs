use serde::{Deserialize, Serialize};

/// Where the caller wants to deploy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    #[default]
    Global,
    /// Mainland China: only domestic vendors are reachable without a proxy.
    #[serde(alias = "cn_mainland")]
    Cn,
    /// Outside China: domestic-only vendors are excluded.
    Overseas,
}

impl Region {
    /// Whether a model from a CN (or non-CN) vendor is usable in this region.
    pub fn admits(self, is_cn_provider: bool) -> bool {
        match self {
            Self::Global => true,
            Self::Cn => is_cn_provider,
            Self::Overseas => !is_cn_provider,
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Cn => write!(f, "cn"),
            Self::Overseas => write!(f, "overseas"),
        }
    }
}

impl std::str::FromStr for Region {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "cn" | "cn_mainland" | "china" => Ok(Self::Cn),
            "overseas" | "intl" => Ok(Self::Overseas),
            other => Err(format!("unknown region: {other}")),
        }
    }
}

/// Static vendor registry entry.
#[derive(Debug, Clone)]
pub struct Vendor {
    pub id: &'static str,
    pub kind: VendorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorKind {
    /// Headquartered in mainland China.
    Domestic,
    International,
}

/// Vendors treated as CN providers when a snapshot does not carry the flag.
pub const VENDORS: &[Vendor] = &[
    Vendor { id: "01ai", kind: VendorKind::Domestic },
    Vendor { id: "alibaba", kind: VendorKind::Domestic },
    Vendor { id: "baichuan", kind: VendorKind::Domestic },
    Vendor { id: "baidu", kind: VendorKind::Domestic },
    Vendor { id: "bytedance", kind: VendorKind::Domestic },
    Vendor { id: "deepseek", kind: VendorKind::Domestic },
    Vendor { id: "doubao", kind: VendorKind::Domestic },
    Vendor { id: "kimi", kind: VendorKind::Domestic },
    Vendor { id: "minimax", kind: VendorKind::Domestic },
    Vendor { id: "moonshot", kind: VendorKind::Domestic },
    Vendor { id: "qwen", kind: VendorKind::Domestic },
    Vendor { id: "sensenova", kind: VendorKind::Domestic },
    Vendor { id: "spark", kind: VendorKind::Domestic },
    Vendor { id: "stepfun", kind: VendorKind::Domestic },
    Vendor { id: "tencent", kind: VendorKind::Domestic },
    Vendor { id: "xiaomi", kind: VendorKind::Domestic },
    Vendor { id: "z ai", kind: VendorKind::Domestic },
    Vendor { id: "zhipu", kind: VendorKind::Domestic },
    Vendor { id: "anthropic", kind: VendorKind::International },
    Vendor { id: "google", kind: VendorKind::International },
    Vendor { id: "meta", kind: VendorKind::International },
    Vendor { id: "mistral", kind: VendorKind::International },
    Vendor { id: "openai", kind: VendorKind::International },
    Vendor { id: "xai", kind: VendorKind::International },
];

/// Look up a creator name such as "ByteDance Seed" or "DeepSeek" in the registry.
/// Matches on the lowercase name or its first word.
pub fn find_vendor(creator: &str) -> Option<&'static Vendor> {
    let lower = creator.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    let first = lower.split_whitespace().next().unwrap_or(&lower);
    VENDORS.iter().find(|v| v.id == lower || v.id == first)
}

pub fn is_domestic_vendor(creator: &str) -> bool {
    find_vendor(creator).is_some_and(|v| v.kind == VendorKind::Domestic)
}
