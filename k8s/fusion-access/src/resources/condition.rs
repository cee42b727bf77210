use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A status condition as reported by the storage scale operator.
/// Unlike `metav1.Condition`, every field but the type may be absent.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCondition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl ResourceCondition {
    /// Create a new condition of the given type, status and reason.
    pub fn new(type_: &str, status: &str, reason: &str) -> Self {
        Self {
            type_: type_.to_string(),
            status: status.to_string(),
            reason: Some(reason.to_string()),
            ..Default::default()
        }
    }
    /// Add a message.
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
    /// Whether the status is "True".
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
    /// Whether the status is "False".
    pub fn is_false(&self) -> bool {
        self.status == "False"
    }
    /// The reason, or an empty string.
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }
}

/// Find the first condition of the given type.
pub fn find_condition<'a>(
    conditions: &'a [ResourceCondition],
    type_: &str,
) -> Option<&'a ResourceCondition> {
    conditions.iter().find(|c| c.type_ == type_)
}
