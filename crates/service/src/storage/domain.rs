use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use models::storage_object::AclType;

/// A stored object as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageObject {
    pub object_id: String,
    pub object_type: String,
    pub object_data: String,
    pub object_score: f32,
    pub acl_type: AclType,
    pub acl_param: String,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

/// Incoming create/update/sync payload.
///
/// `CreatedOn` is always server-assigned; `ModifiedOn` is only read by sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageObjectInput {
    pub object_id: String,
    pub object_type: String,
    #[serde(default = "empty_document", deserialize_with = "document_text")]
    pub object_data: String,
    #[serde(default)]
    pub object_score: f32,
    #[serde(default)]
    pub acl_type: AclType,
    #[serde(default)]
    pub acl_param: Option<String>,
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

fn empty_document() -> String { "{}".to_string() }

/// Accept the body either as serialized text or as an inline JSON value.
fn document_text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(de)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => empty_document(),
        other => other.to_string(),
    })
}

impl StorageObjectInput {
    pub fn new(object_id: impl Into<String>, object_type: impl Into<String>, object_data: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            object_type: object_type.into(),
            object_data: object_data.into(),
            object_score: 0.0,
            acl_type: AclType::Public,
            acl_param: None,
            modified_on: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.object_score = score;
        self
    }

    pub fn with_acl(mut self, acl_type: AclType, acl_param: Option<String>) -> Self {
        self.acl_type = acl_type;
        self.acl_param = acl_param;
        self
    }

    pub fn with_modified_on(mut self, modified_on: DateTime<Utc>) -> Self {
        self.modified_on = Some(modified_on);
        self
    }

    /// Materialize a brand-new record stamped at `now`.
    pub(crate) fn into_new_object(self, now: DateTime<Utc>) -> StorageObject {
        StorageObject {
            object_id: self.object_id,
            object_type: self.object_type,
            object_data: self.object_data,
            object_score: self.object_score,
            acl_type: self.acl_type,
            acl_param: self.acl_param.unwrap_or_default(),
            created_on: now,
            modified_on: now,
        }
    }
}

/// Identity of whoever issued the request; anonymous when no token was presented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Option<String>,
}

impl Caller {
    pub fn anonymous() -> Self { Self { user_id: None } }

    pub fn user(id: impl Into<String>) -> Self { Self { user_id: Some(id.into()) } }

    pub fn is_authenticated(&self) -> bool { self.user_id.is_some() }
}

/// Read query over the decoded bodies of one object type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default, rename = "orderBy")]
    pub order_by: Option<String>,
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub top: Option<i64>,
}

impl QueryRequest {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self { object_type: object_type.into(), ..Default::default() }
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn page(mut self, skip: Option<i64>, top: Option<i64>) -> Self {
        self.skip = skip;
        self.top = top;
        self
    }
}

/// Position of one object within the leaderboard of its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RankEntry {
    pub object_id: String,
    pub object_type: String,
    pub object_score: f32,
    pub rank: u64,
}

/// A full object together with its leaderboard position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RankedObject {
    #[serde(flatten)]
    pub object: StorageObject,
    pub rank: u64,
}

impl From<models::storage_object::Model> for StorageObject {
    fn from(m: models::storage_object::Model) -> Self {
        Self {
            object_id: m.object_id,
            object_type: m.object_type,
            object_data: m.object_data,
            object_score: m.object_score,
            acl_type: m.acl_type,
            acl_param: m.acl_param,
            created_on: m.created_on.with_timezone(&Utc),
            modified_on: m.modified_on.with_timezone(&Utc),
        }
    }
}

impl From<StorageObject> for models::storage_object::Model {
    fn from(o: StorageObject) -> Self {
        Self {
            object_id: o.object_id,
            object_type: o.object_type,
            object_data: o.object_data,
            object_score: o.object_score,
            acl_type: o.acl_type,
            acl_param: o.acl_param,
            created_on: o.created_on.into(),
            modified_on: o.modified_on.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_pascal_case() {
        let input: StorageObjectInput = serde_json::from_str(
            r#"{"ObjectId":"a","ObjectType":"Player","ObjectData":"{\"hp\":3}","ObjectScore":2.5,"AclType":"User","AclParam":"alice"}"#,
        )
        .unwrap();
        assert_eq!(input.object_id, "a");
        assert_eq!(input.acl_type, AclType::User);
        assert_eq!(input.acl_param.as_deref(), Some("alice"));
        assert!(input.modified_on.is_none());
    }

    #[test]
    fn inline_document_is_accepted() {
        let input: StorageObjectInput =
            serde_json::from_str(r#"{"ObjectId":"a","ObjectType":"T","ObjectData":{"hp":3}}"#).unwrap();
        assert_eq!(input.object_data, r#"{"hp":3}"#);
        assert_eq!(input.acl_type, AclType::Public);

        let missing: StorageObjectInput = serde_json::from_str(r#"{"ObjectId":"a","ObjectType":"T"}"#).unwrap();
        assert_eq!(missing.object_data, "{}");
    }

    #[test]
    fn new_object_gets_equal_timestamps() {
        let now = Utc::now();
        let obj = StorageObjectInput::new("a", "T", "{}").into_new_object(now);
        assert_eq!(obj.created_on, now);
        assert_eq!(obj.modified_on, now);
        assert_eq!(obj.acl_param, "");
    }

    #[test]
    fn query_request_reads_wire_names() {
        let q: QueryRequest = serde_json::from_str(r#"{"type":"Player","orderBy":"score desc","top":5}"#).unwrap();
        assert_eq!(q.object_type, "Player");
        assert_eq!(q.order_by.as_deref(), Some("score desc"));
        assert_eq!(q.top, Some(5));
    }

    #[test]
    fn ranked_object_serializes_flat() {
        let object = StorageObjectInput::new("a", "Player", r#"{"hp":3}"#).with_score(4.0).into_new_object(Utc::now());
        let v = serde_json::to_value(RankedObject { object, rank: 2 }).unwrap();
        assert_eq!(v["ObjectId"], "a");
        assert_eq!(v["ObjectData"], r#"{"hp":3}"#);
        assert_eq!(v["AclType"], "Public");
        assert_eq!(v["Rank"], 2);
    }
}
