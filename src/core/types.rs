use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel id carried by the anonymous identity.
pub const ANONYMOUS_ID: &str = "anonymous";

/// The principal a request acts on behalf of.
///
/// Either a confirmed user resolved from credentials or the anonymous
/// sentinel. Every request context holds exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: String,
    email: String,
    confirmed: bool,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>, confirmed: bool) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            confirmed,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            id: ANONYMOUS_ID.to_string(),
            email: String::new(),
            confirmed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn is_anonymous(&self) -> bool {
        self.id == ANONYMOUS_ID
    }

    /// Id this identity owns resources under.
    #[inline]
    pub fn owner_id(&self) -> &str {
        &self.id
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self::new(user.id.clone(), user.email.clone(), user.confirmed)
    }
}

/// Registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub confirmed: bool,
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
}

/// Public profile of a confirmed user. `id` is the owning user's id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    pub age: i64,
}

impl Profile {
    /// Zero-valued profile owned by `id`.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Scalar attribute value as recorded in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{:?}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedField {
    pub previous: FieldValue,
    pub current: FieldValue,
}

/// One history record: the attributes an update changed, with before/after values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub timestamp: DateTime<Utc>,
    pub fields: BTreeMap<String, ChangedField>,
}

impl Change {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, name: &str) -> Option<&ChangedField> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity() {
        let anon = Identity::anonymous();
        assert!(anon.is_anonymous());
        assert!(!anon.is_confirmed());
        assert_eq!(anon.owner_id(), ANONYMOUS_ID);
        assert_eq!(Identity::default(), anon);
    }

    #[test]
    fn test_identity_from_user() {
        let user = User {
            id: "u-1".into(),
            email: "a@b.c".into(),
            password: "secret".into(),
            confirmed: true,
        };
        let identity = Identity::from(&user);
        assert_eq!(identity.id(), "u-1");
        assert_eq!(identity.email(), "a@b.c");
        assert!(identity.is_confirmed());
        assert!(!identity.is_anonymous());
    }

    #[test]
    fn test_profile_json_uses_camel_case() {
        let mut profile = Profile::empty("p-1");
        profile.first_name = "John".into();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["firstName"], "John");
        assert_eq!(json["age"], 0);

        let parsed: Profile = serde_json::from_str(r#"{"id":"p-1","lastName":"Smith"}"#).unwrap();
        assert_eq!(parsed.last_name, "Smith");
        assert_eq!(parsed.first_name, "");
    }

    #[test]
    fn test_user_password_not_serialized() {
        let user = User {
            id: "u-1".into(),
            email: "a@b.c".into(),
            password: "secret".into(),
            confirmed: false,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_field_value_untagged_json() {
        let field = ChangedField {
            previous: FieldValue::from(""),
            current: FieldValue::from("John"),
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["previous"], "");
        assert_eq!(json["current"], "John");

        let age: FieldValue = serde_json::from_str("30").unwrap();
        assert_eq!(age, FieldValue::Integer(30));
    }
}
