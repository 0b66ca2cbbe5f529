use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "safe")]
    Safe,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryResult {
    pub filtered: bool,
    pub severity: Severity,
}

impl CategoryResult {
    pub fn safe() -> Self {
        Self {
            filtered: false,
            severity: Severity::Safe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DetectResult {
    pub filtered: bool,
    pub detected: bool,
}

/// Per-choice filter annotations. The empty value serializes as `{}`, which
/// is what final stream chunks and role-only chunks carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContentFilterResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hate: Option<CategoryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_harm: Option<CategoryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sexual: Option<CategoryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violence: Option<CategoryResult>,
}

impl ContentFilterResults {
    /// The four-category "nothing was filtered" scaffold.
    pub fn safe() -> Self {
        Self {
            hate: Some(CategoryResult::safe()),
            self_harm: Some(CategoryResult::safe()),
            sexual: Some(CategoryResult::safe()),
            violence: Some(CategoryResult::safe()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Prompt-level filter annotations carry a jailbreak verdict on top of the
/// four content categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromptContentFilterResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hate: Option<CategoryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_harm: Option<CategoryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sexual: Option<CategoryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violence: Option<CategoryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jailbreak: Option<DetectResult>,
}

impl PromptContentFilterResults {
    pub fn safe() -> Self {
        Self {
            hate: Some(CategoryResult::safe()),
            self_harm: Some(CategoryResult::safe()),
            sexual: Some(CategoryResult::safe()),
            violence: Some(CategoryResult::safe()),
            jailbreak: Some(DetectResult {
                filtered: false,
                detected: false,
            }),
        }
    }
}
