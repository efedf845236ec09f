// ── Declarative side-effect descriptors ──
//
// Attached to a request's `meta.on_success` / `meta.on_failure`. They
// describe what should happen once the request settles; nothing here
// performs the effect. See `effects::plan_effects` for the interpreter.

use adminkit_api::Identifier;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Notification ─────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Warning,
    Error,
}

/// Interpolation arguments for the notification's translation key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageArgs {
    /// Number of affected records, for pluralized messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_count: Option<usize>,
}

impl MessageArgs {
    pub fn count(n: usize) -> Self {
        Self {
            smart_count: Some(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Translation key or literal message.
    pub body: String,
    pub level: NotificationLevel,
    #[serde(default)]
    pub message_args: MessageArgs,
    /// Shown with an undo affordance while an undoable mutation is pending.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub undoable: bool,
}

impl Notification {
    pub fn new(body: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            body: body.into(),
            level,
            message_args: MessageArgs::default(),
            undoable: false,
        }
    }

    pub fn info(body: impl Into<String>) -> Self {
        Self::new(body, NotificationLevel::Info)
    }

    pub fn warning(body: impl Into<String>) -> Self {
        Self::new(body, NotificationLevel::Warning)
    }

    pub fn with_count(mut self, n: usize) -> Self {
        self.message_args = MessageArgs::count(n);
        self
    }
}

// ── Redirection ──────────────────────────────────────────────────────

/// Where to go after a settlement. Serialized as the string target, or
/// `false` when redirection is explicitly disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirection {
    List,
    Create,
    Edit,
    Show,
    /// Literal path, used as-is.
    Path(String),
    Disabled,
}

impl Redirection {
    /// Resolve against the resource's base path and the affected record.
    ///
    /// `None` when there is nowhere to go: redirection disabled, no base
    /// path for a relative target, or no id for a record target.
    pub fn resolve(&self, base_path: Option<&str>, id: Option<&Identifier>) -> Option<String> {
        match self {
            Self::Disabled => None,
            Self::Path(path) => Some(path.clone()),
            Self::List => base_path.map(str::to_owned),
            Self::Create => base_path.map(|base| format!("{base}/create")),
            Self::Edit => Some(format!("{}/{}", base_path?, encode_id(id?))),
            Self::Show => Some(format!("{}/{}/show", base_path?, encode_id(id?))),
        }
    }
}

impl From<&str> for Redirection {
    fn from(target: &str) -> Self {
        match target {
            "list" => Self::List,
            "create" => Self::Create,
            "edit" => Self::Edit,
            "show" => Self::Show,
            "" | "false" => Self::Disabled,
            path => Self::Path(path.to_owned()),
        }
    }
}

impl Serialize for Redirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::List => serializer.serialize_str("list"),
            Self::Create => serializer.serialize_str("create"),
            Self::Edit => serializer.serialize_str("edit"),
            Self::Show => serializer.serialize_str("show"),
            Self::Path(path) => serializer.serialize_str(path),
            Self::Disabled => serializer.serialize_bool(false),
        }
    }
}

fn encode_id(id: &Identifier) -> String {
    url::form_urlencoded::byte_serialize(id.to_string().as_bytes()).collect()
}

// ── SideEffects ──────────────────────────────────────────────────────

/// Effects declared for one outcome of a request.
///
/// At most one notification and one redirect target per outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideEffects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<Redirection>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub refresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unselect_all: bool,
}

impl SideEffects {
    pub fn notify(notification: Notification) -> Self {
        Self {
            notification: Some(notification),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_relative_targets() {
        let id = Identifier::Num(12);
        assert_eq!(
            Redirection::List.resolve(Some("/posts"), Some(&id)).as_deref(),
            Some("/posts")
        );
        assert_eq!(
            Redirection::Create.resolve(Some("/posts"), None).as_deref(),
            Some("/posts/create")
        );
        assert_eq!(
            Redirection::Edit.resolve(Some("/posts"), Some(&id)).as_deref(),
            Some("/posts/12")
        );
        assert_eq!(
            Redirection::Show.resolve(Some("/posts"), Some(&id)).as_deref(),
            Some("/posts/12/show")
        );
    }

    #[test]
    fn edit_target_encodes_string_ids() {
        let id = Identifier::Str("a/b c".into());
        assert_eq!(
            Redirection::Edit.resolve(Some("/tags"), Some(&id)).as_deref(),
            Some("/tags/a%2Fb+c")
        );
    }

    #[test]
    fn unresolvable_targets_yield_nothing() {
        assert_eq!(Redirection::Disabled.resolve(Some("/posts"), None), None);
        assert_eq!(Redirection::Edit.resolve(Some("/posts"), None), None);
        assert_eq!(Redirection::List.resolve(None, None), None);
        assert_eq!(
            Redirection::Path("/dashboard".into()).resolve(None, None).as_deref(),
            Some("/dashboard")
        );
    }

    #[test]
    fn redirection_from_str() {
        assert_eq!(Redirection::from("edit"), Redirection::Edit);
        assert_eq!(Redirection::from("false"), Redirection::Disabled);
        assert_eq!(
            Redirection::from("/custom"),
            Redirection::Path("/custom".into())
        );
    }

    #[test]
    fn side_effects_serialize_sparsely() {
        let effects = SideEffects {
            notification: Some(Notification::info("notification.deleted").with_count(3)),
            redirect_to: Some(Redirection::Disabled),
            refresh: true,
            base_path: Some("/posts".into()),
            unselect_all: true,
        };
        assert_eq!(
            serde_json::to_value(&effects).unwrap(),
            json!({
                "notification": {
                    "body": "notification.deleted",
                    "level": "info",
                    "messageArgs": {"smart_count": 3}
                },
                "redirectTo": false,
                "refresh": true,
                "basePath": "/posts",
                "unselectAll": true
            })
        );
        assert_eq!(serde_json::to_value(SideEffects::default()).unwrap(), json!({}));
    }
}
