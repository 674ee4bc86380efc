use crate::{EnumConversionError, GroupId, Page};
use serde::{Deserialize, Serialize};

/// Pages at or above this SEO score count as "high".
pub const HIGH_SCORE_THRESHOLD: f32 = 90.0;
/// Pages strictly below this SEO score count as "low".
pub const LOW_SCORE_THRESHOLD: f32 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    All,
    SubdomainsOnly,
    HighScore,
    LowScore,
}

impl ViewMode {
    /// Hard predicate applied after visibility and group annotation.
    /// Pages without a score match neither score mode.
    pub fn admits(self, page: &Page) -> bool {
        match self {
            ViewMode::All => true,
            ViewMode::SubdomainsOnly => page.is_subdomain,
            ViewMode::HighScore => page
                .seo_score
                .is_some_and(|score| score >= HIGH_SCORE_THRESHOLD),
            ViewMode::LowScore => page
                .seo_score
                .is_some_and(|score| score < LOW_SCORE_THRESHOLD),
        }
    }
}

impl TryFrom<&str> for ViewMode {
    type Error = EnumConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "all" => Ok(ViewMode::All),
            "subdomains" | "subdomains_only" => Ok(ViewMode::SubdomainsOnly),
            "high" | "high_score" => Ok(ViewMode::HighScore),
            "low" | "low_score" => Ok(ViewMode::LowScore),
            _ => Err(EnumConversionError::InvalidViewMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub view_mode: ViewMode,
    /// Include pages whose visibility flag is off.
    pub show_hidden: bool,
    /// Dim pages outside this group instead of removing them.
    pub active_group: Option<GroupId>,
}
