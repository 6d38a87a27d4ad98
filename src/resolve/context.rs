use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Request context used to select and parameterise a template.
///
/// Nothing here executes business logic; the fields pick a template variant
/// and seed the environment the caller builds for interpretation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl ScreenContext {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Template variants to try, most specific first.
    ///
    /// `en_US` → `["en-US", "en"]`. The default template (no variant) is
    /// always tried after these.
    pub fn variant_candidates(&self) -> Vec<String> {
        let Some(locale) = self.locale.as_deref().map(str::trim).filter(|l| !l.is_empty()) else {
            return Vec::new();
        };
        let normalized = locale.replace('_', "-");
        let mut candidates = vec![normalized.clone()];
        if let Some((language, _region)) = normalized.split_once('-') {
            if !language.is_empty() {
                candidates.push(language.to_string());
            }
        }
        candidates
    }
}
