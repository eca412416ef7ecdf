use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use tracing::{debug, info, instrument, warn};

use models::storage_object as rules;

use super::acl::ensure_can_write;
use super::domain::{Caller, QueryRequest, StorageObject, StorageObjectInput};
use super::query::CompiledQuery;
use super::repository::{PendingWrite, StorageObjectRepository};
use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// Storage business service independent of web framework.
///
/// Every mutating call is total over "absent" ids: creates and upserts
/// materialize the object, property/delta/delete calls on a missing id are
/// silent successes.
pub struct StorageObjectService<R: ?Sized> {
    repo: Arc<R>,
}

fn validate_input(input: &StorageObjectInput) -> Result<(), ServiceError> {
    rules::validate_object_id(&input.object_id)?;
    rules::validate_object_type(&input.object_type)?;
    rules::validate_object_data(&input.object_data)?;
    if let Some(p) = &input.acl_param {
        rules::validate_acl_param(p)?;
    }
    if !input.object_score.is_finite() {
        return Err(ServiceError::Validation("ObjectScore must be finite".into()));
    }
    Ok(())
}

/// Server write time that never moves backwards for an existing row.
fn stamp(existing: Option<&StorageObject>) -> DateTime<Utc> {
    let now = Utc::now();
    match existing {
        Some(e) if e.modified_on > now => e.modified_on,
        _ => now,
    }
}

/// Decide what an upsert does to `existing`. Pure: nothing is persisted here.
fn plan_upsert(existing: Option<&StorageObject>, input: StorageObjectInput, caller: &Caller) -> Result<PendingWrite, ServiceError> {
    validate_input(&input)?;
    let Some(current) = existing else {
        return Ok(PendingWrite::Insert(input.into_new_object(stamp(None))));
    };
    ensure_can_write(current, caller)?;
    if current.object_type != input.object_type {
        return Err(ServiceError::InvalidOperation(format!(
            "ObjectType of {} cannot change from {} to {}",
            current.object_id, current.object_type, input.object_type
        )));
    }
    Ok(PendingWrite::Overwrite(StorageObject {
        object_data: input.object_data,
        object_score: input.object_score,
        modified_on: stamp(Some(current)),
        ..current.clone()
    }))
}

fn decode_body(object: &StorageObject) -> Result<Map<String, Value>, ServiceError> {
    match serde_json::from_str::<Value>(&object.object_data) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ServiceError::Validation(format!("ObjectData of {} is not a JSON object", object.object_id))),
        Err(e) => Err(ServiceError::Validation(format!("ObjectData of {} is not valid JSON: {e}", object.object_id))),
    }
}

fn not_numeric(property: &str) -> ServiceError {
    ServiceError::Validation(format!("property {property} is not numeric"))
}

fn float_value(current: Option<&Value>, property: &str) -> Result<f64, ServiceError> {
    match current {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| not_numeric(property)),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| not_numeric(property)),
        Some(_) => Err(not_numeric(property)),
    }
}

/// Integers are read exactly; only fractional values go through `f64` and are truncated.
fn integer_value(current: Option<&Value>, property: &str) -> Result<i64, ServiceError> {
    match current {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(i),
            None => n.as_f64().map(|f| f as i64).ok_or_else(|| not_numeric(property)),
        },
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(i),
            Err(_) => float_value(current, property).map(|f| f as i64),
        },
        _ => float_value(current, property).map(|f| f as i64),
    }
}

fn apply_delta(current: Option<&Value>, property: &str, delta: f64, is_float: bool) -> Result<Value, ServiceError> {
    if is_float {
        let sum = float_value(current, property)? + delta;
        Number::from_f64(sum)
            .map(Value::Number)
            .ok_or_else(|| ServiceError::Validation(format!("property {property} overflowed")))
    } else {
        let sum = integer_value(current, property)?.saturating_add(delta as i64);
        Ok(Value::Number(sum.into()))
    }
}

impl<R: StorageObjectRepository + ?Sized> StorageObjectService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Store a new object; fails with `Conflict` when the id is taken.
    ///
    /// # Examples
    /// ```
    /// use service::storage::{StorageObjectService, domain::StorageObjectInput, repository::mock::InMemoryStorageRepository};
    /// use std::sync::Arc;
    /// let svc = StorageObjectService::new(Arc::new(InMemoryStorageRepository::default()));
    /// let created = tokio_test::block_on(svc.create(StorageObjectInput::new("hero-1", "Player", r#"{"hp":10}"#))).unwrap();
    /// assert_eq!(created.created_on, created.modified_on);
    /// assert!(tokio_test::block_on(svc.create(StorageObjectInput::new("hero-1", "Player", "{}"))).is_err());
    /// ```
    #[instrument(skip(self, input), fields(object_id = %input.object_id, object_type = %input.object_type))]
    pub async fn create(&self, input: StorageObjectInput) -> Result<StorageObject, ServiceError> {
        validate_input(&input)?;
        if self.repo.find(&input.object_id).await?.is_some() {
            return Err(ServiceError::Conflict(format!("object {} already exists", input.object_id)));
        }
        let created = self.repo.insert(input.into_new_object(stamp(None))).await?;
        info!(object_id = %created.object_id, "storage_object_created");
        Ok(created)
    }

    /// Absent ids are a successful `None`.
    pub async fn get(&self, object_id: &str) -> Result<Option<StorageObject>, ServiceError> {
        self.repo.find(object_id).await
    }

    /// Objects in request order; ids that do not exist are skipped.
    pub async fn get_set(&self, object_ids: &[String]) -> Result<Vec<StorageObject>, ServiceError> {
        let found = self.repo.find_many(object_ids).await?;
        let mut by_id: HashMap<String, StorageObject> = found.into_iter().map(|o| (o.object_id.clone(), o)).collect();
        Ok(object_ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    #[instrument(skip(self, request), fields(object_type = %request.object_type))]
    pub async fn query(&self, request: &QueryRequest) -> Result<Vec<StorageObject>, ServiceError> {
        rules::validate_object_type(&request.object_type)?;
        let compiled = CompiledQuery::compile(
            request.filter.as_deref(),
            request.order_by.as_deref(),
            Pagination::new(request.skip, request.top),
        )?;
        let rows = self.repo.list_by_type(&request.object_type).await?;
        Ok(compiled.run(rows))
    }

    /// Upsert: creates when absent, otherwise replaces body and score of the stored row.
    #[instrument(skip(self, input, caller), fields(object_id = %input.object_id, caller = ?caller.user_id))]
    pub async fn update(&self, input: StorageObjectInput, caller: &Caller) -> Result<StorageObject, ServiceError> {
        let existing = self.repo.find(&input.object_id).await?;
        match plan_upsert(existing.as_ref(), input, caller) {
            Ok(write) => self.persist(write).await,
            Err(e) => {
                warn!(error = %e, "storage_object_update_rejected");
                Err(e)
            }
        }
    }

    /// Apply the write only when the client's `ModifiedOn` is newer than the stored one.
    #[instrument(skip(self, input, caller), fields(object_id = %input.object_id))]
    pub async fn sync(&self, input: StorageObjectInput, caller: &Caller) -> Result<StorageObject, ServiceError> {
        let Some(existing) = self.repo.find(&input.object_id).await? else {
            return self.create(input).await;
        };
        match input.modified_on {
            Some(claimed) if existing.modified_on < claimed => {
                let write = plan_upsert(Some(&existing), input, caller)?;
                self.persist(write).await
            }
            _ => {
                debug!(stored = %existing.modified_on, "sync_stale_write_dropped");
                Ok(existing)
            }
        }
    }

    /// Validate every item first, then persist the batch atomically.
    #[instrument(skip(self, inputs, caller), fields(count = inputs.len()))]
    pub async fn update_set(&self, inputs: Vec<StorageObjectInput>, caller: &Caller) -> Result<(), ServiceError> {
        let ids: Vec<String> = inputs.iter().map(|i| i.object_id.clone()).collect();
        let mut current: HashMap<String, StorageObject> = self
            .repo
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|o| (o.object_id.clone(), o))
            .collect();

        let mut writes: Vec<PendingWrite> = Vec::with_capacity(inputs.len());
        let mut slot: HashMap<String, usize> = HashMap::new();
        for input in inputs {
            let id = input.object_id.clone();
            let planned = plan_upsert(current.get(&id), input, caller)?;
            current.insert(id.clone(), planned.object().clone());
            match slot.get(&id) {
                // repeated id: keep the first write's kind, take the latest state
                Some(&i) => {
                    let state = planned.object().clone();
                    writes[i] = match &writes[i] {
                        PendingWrite::Insert(_) => PendingWrite::Insert(state),
                        PendingWrite::Overwrite(_) => PendingWrite::Overwrite(state),
                    };
                }
                None => {
                    slot.insert(id, writes.len());
                    writes.push(planned);
                }
            }
        }

        let count = writes.len();
        self.repo.save_batch(writes).await?;
        info!(count, "storage_object_batch_saved");
        Ok(())
    }

    /// Set one top-level body field to a string value.
    #[instrument(skip(self, value, caller), fields(object_id = %object_id, property = %property))]
    pub async fn update_property(&self, object_id: &str, property: &str, value: &str, caller: &Caller) -> Result<(), ServiceError> {
        if property.trim().is_empty() {
            return Err(ServiceError::Validation("propertyName required".into()));
        }
        let Some(existing) = self.repo.find(object_id).await? else { return Ok(()) };
        ensure_can_write(&existing, caller)?;

        let mut body = decode_body(&existing)?;
        body.insert(property.to_string(), Value::String(value.to_string()));
        self.rewrite_body(existing, body).await
    }

    /// Add `delta` to a numeric body field. Int mode adds integers exactly and truncates fractions.
    #[instrument(skip(self, caller), fields(object_id = %object_id, property = %property))]
    pub async fn update_delta(&self, object_id: &str, property: &str, delta: f64, is_float: bool, caller: &Caller) -> Result<(), ServiceError> {
        if property.trim().is_empty() {
            return Err(ServiceError::Validation("propertyName required".into()));
        }
        if !delta.is_finite() {
            return Err(ServiceError::Validation("delta must be finite".into()));
        }
        let Some(existing) = self.repo.find(object_id).await? else { return Ok(()) };
        ensure_can_write(&existing, caller)?;

        let mut body = decode_body(&existing)?;
        let next = apply_delta(body.get(property), property, delta, is_float)?;
        body.insert(property.to_string(), next);
        self.rewrite_body(existing, body).await
    }

    #[instrument(skip(self, caller), fields(object_id = %object_id))]
    pub async fn delete(&self, object_id: &str, caller: &Caller) -> Result<(), ServiceError> {
        let Some(existing) = self.repo.find(object_id).await? else { return Ok(()) };
        ensure_can_write(&existing, caller)?;
        if self.repo.delete(object_id).await? {
            info!(object_id = %object_id, "storage_object_deleted");
        }
        Ok(())
    }

    /// Remove every object owned by `owner`; used when the owning account goes away.
    pub async fn delete_owned_by(&self, owner: &str) -> Result<u64, ServiceError> {
        let removed = self.repo.delete_owned_by(owner).await?;
        info!(owner = %owner, removed, "storage_objects_owned_deleted");
        Ok(removed)
    }

    async fn persist(&self, write: PendingWrite) -> Result<StorageObject, ServiceError> {
        match write {
            PendingWrite::Insert(o) => {
                let created = self.repo.insert(o).await?;
                info!(object_id = %created.object_id, "storage_object_created");
                Ok(created)
            }
            PendingWrite::Overwrite(o) => {
                let updated = self.repo.overwrite(o).await?;
                info!(object_id = %updated.object_id, "storage_object_updated");
                Ok(updated)
            }
        }
    }

    async fn rewrite_body(&self, existing: StorageObject, body: Map<String, Value>) -> Result<(), ServiceError> {
        let modified_on = stamp(Some(&existing));
        let updated = StorageObject {
            object_data: Value::Object(body).to_string(),
            modified_on,
            ..existing
        };
        self.repo.overwrite(updated).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::domain::AclType;
    use crate::storage::repository::mock::InMemoryStorageRepository;
    use chrono::Duration;
    use serde_json::json;

    fn service() -> StorageObjectService<InMemoryStorageRepository> {
        StorageObjectService::new(Arc::new(InMemoryStorageRepository::default()))
    }

    fn player(id: &str, body: Value) -> StorageObjectInput {
        StorageObjectInput::new(id, "Player", body.to_string())
    }

    fn body(o: &StorageObject) -> Value {
        serde_json::from_str(&o.object_data).unwrap()
    }

    #[tokio::test]
    async fn create_then_duplicate_conflicts() -> Result<(), anyhow::Error> {
        let svc = service();
        let created = svc.create(player("p1", json!({"hp": 3})).with_score(2.0)).await?;
        assert_eq!(created.created_on, created.modified_on);
        assert_eq!(created.object_score, 2.0);
        assert!(matches!(svc.create(player("p1", json!({}))).await, Err(ServiceError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload() {
        let svc = service();
        let bad = StorageObjectInput::new("p1", "Player", "{broken");
        assert!(matches!(svc.create(bad).await, Err(ServiceError::Model(_))));
        let blank = StorageObjectInput::new("", "Player", "{}");
        assert!(svc.create(blank).await.is_err());
    }

    #[tokio::test]
    async fn update_on_missing_id_behaves_like_create() -> Result<(), anyhow::Error> {
        let a = service();
        let b = service();
        let input = player("p1", json!({"hp": 3})).with_score(4.0).with_acl(AclType::User, Some("alice".into()));
        let via_create = a.create(input.clone()).await?;
        let via_update = b.update(input, &Caller::anonymous()).await?;
        assert_eq!(via_create.object_data, via_update.object_data);
        assert_eq!(via_create.object_score, via_update.object_score);
        assert_eq!(via_create.acl_type, via_update.acl_type);
        assert_eq!(via_create.acl_param, via_update.acl_param);
        assert_eq!(via_update.created_on, via_update.modified_on);
        Ok(())
    }

    #[tokio::test]
    async fn update_keeps_identity_fields() -> Result<(), anyhow::Error> {
        let svc = service();
        let created = svc.create(player("p1", json!({"hp": 3})).with_acl(AclType::Admin, None)).await?;
        let incoming = player("p1", json!({"hp": 9})).with_score(7.0).with_acl(AclType::Public, Some("mallory".into()));
        let updated = svc.update(incoming, &Caller::user("alice")).await?;
        assert_eq!(body(&updated), json!({"hp": 9}));
        assert_eq!(updated.object_score, 7.0);
        assert_eq!(updated.acl_type, AclType::Admin);
        assert_eq!(updated.acl_param, "");
        assert_eq!(updated.created_on, created.created_on);
        assert!(updated.modified_on >= created.modified_on);
        Ok(())
    }

    #[tokio::test]
    async fn type_change_is_rejected_and_leaves_object_unchanged() -> Result<(), anyhow::Error> {
        let svc = service();
        let created = svc.create(player("p1", json!({"hp": 3}))).await?;
        let enemy = StorageObjectInput::new("p1", "Enemy", json!({"hp": 99}).to_string());
        assert!(matches!(svc.update(enemy, &Caller::anonymous()).await, Err(ServiceError::InvalidOperation(_))));
        assert_eq!(svc.get("p1").await?, Some(created));
        Ok(())
    }

    #[tokio::test]
    async fn user_acl_enforced_on_update() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(player("save", json!({"lvl": 1})).with_acl(AclType::User, Some("alice".into()))).await?;

        let res = svc.update(player("save", json!({"lvl": 2})), &Caller::user("bob")).await;
        assert!(matches!(res, Err(ServiceError::Unauthorized(_))));
        assert_eq!(body(&svc.get("save").await?.unwrap()), json!({"lvl": 1}));

        let ok = svc.update(player("save", json!({"lvl": 2})), &Caller::user("alice")).await?;
        assert_eq!(body(&ok), json!({"lvl": 2}));
        Ok(())
    }

    #[tokio::test]
    async fn admin_acl_requires_authentication() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(player("cfg", json!({})).with_acl(AclType::Admin, None)).await?;
        assert!(svc.delete("cfg", &Caller::anonymous()).await.is_err());
        svc.delete("cfg", &Caller::user("anyone")).await?;
        assert!(svc.get("cfg").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn sync_applies_only_newer_claims() -> Result<(), anyhow::Error> {
        let svc = service();
        let stored = svc.create(player("p1", json!({"v": 0}))).await?;
        let t0 = stored.modified_on;

        let stale = player("p1", json!({"v": -1})).with_modified_on(t0 - Duration::hours(1));
        let kept = svc.sync(stale, &Caller::anonymous()).await?;
        assert_eq!(kept, stored);

        let same = player("p1", json!({"v": -2})).with_modified_on(t0);
        assert_eq!(svc.sync(same, &Caller::anonymous()).await?, stored);

        let newer = player("p1", json!({"v": 1})).with_modified_on(t0 + Duration::hours(1));
        let applied = svc.sync(newer, &Caller::anonymous()).await?;
        assert_eq!(body(&applied), json!({"v": 1}));
        assert_eq!(svc.get("p1").await?, Some(applied));
        Ok(())
    }

    #[tokio::test]
    async fn sync_without_claim_is_stale_and_missing_creates() -> Result<(), anyhow::Error> {
        let svc = service();
        let created = svc.sync(player("p1", json!({"v": 1})), &Caller::anonymous()).await?;
        assert_eq!(body(&created), json!({"v": 1}));
        let again = svc.sync(player("p1", json!({"v": 2})), &Caller::anonymous()).await?;
        assert_eq!(again, created);
        Ok(())
    }

    #[tokio::test]
    async fn get_set_skips_missing_ids() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(player("a", json!({}))).await?;
        svc.create(player("b", json!({}))).await?;
        let ids = vec!["b".to_string(), "zzz".to_string(), "a".to_string()];
        let got: Vec<String> = svc.get_set(&ids).await?.into_iter().map(|o| o.object_id).collect();
        assert_eq!(got, vec!["b", "a"]);
        assert!(svc.get("zzz").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn update_set_is_all_or_nothing() -> Result<(), anyhow::Error> {
        let repo = Arc::new(InMemoryStorageRepository::default());
        let svc = StorageObjectService::new(repo.clone());
        svc.create(player("owned", json!({"v": 0})).with_acl(AclType::User, Some("alice".into()))).await?;

        let batch = vec![player("new-1", json!({})), player("owned", json!({"v": 1}))];
        assert!(svc.update_set(batch, &Caller::user("bob")).await.is_err());
        assert!(svc.get("new-1").await?.is_none());
        assert_eq!(repo.len().await, 1);

        let batch = vec![player("new-1", json!({})), player("owned", json!({"v": 1})), player("new-1", json!({"v": 2}))];
        svc.update_set(batch, &Caller::user("alice")).await?;
        assert_eq!(body(&svc.get("new-1").await?.unwrap()), json!({"v": 2}));
        assert_eq!(body(&svc.get("owned").await?.unwrap()), json!({"v": 1}));
        Ok(())
    }

    #[tokio::test]
    async fn update_set_rejects_type_change() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(player("p1", json!({}))).await?;
        let batch = vec![
            player("p2", json!({})),
            StorageObjectInput::new("p1", "Enemy", "{}"),
        ];
        assert!(matches!(svc.update_set(batch, &Caller::anonymous()).await, Err(ServiceError::InvalidOperation(_))));
        assert!(svc.get("p2").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn update_property_sets_string_field() -> Result<(), anyhow::Error> {
        let svc = service();
        let created = svc.create(player("p1", json!({"name": "old", "hp": 3}))).await?;
        svc.update_property("p1", "name", "new", &Caller::anonymous()).await?;
        svc.update_property("p1", "title", "Sir", &Caller::anonymous()).await?;
        let after = svc.get("p1").await?.unwrap();
        assert_eq!(body(&after), json!({"name": "new", "hp": 3, "title": "Sir"}));
        assert!(after.modified_on >= created.modified_on);

        // missing object is a no-op
        svc.update_property("nobody", "name", "x", &Caller::anonymous()).await?;
        assert!(svc.get("nobody").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn update_property_respects_acl() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(player("p1", json!({"name": "a"})).with_acl(AclType::User, Some("alice".into()))).await?;
        let res = svc.update_property("p1", "name", "b", &Caller::user("bob")).await;
        assert!(matches!(res, Err(ServiceError::Unauthorized(_))));
        Ok(())
    }

    #[tokio::test]
    async fn update_delta_int_and_float() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(player("int", json!({"coins": 10}))).await?;
        svc.update_delta("int", "coins", 5.0, false, &Caller::anonymous()).await?;
        svc.update_delta("int", "coins", 5.0, false, &Caller::anonymous()).await?;
        assert_eq!(body(&svc.get("int").await?.unwrap())["coins"], json!(20));

        svc.create(player("float", json!({"coins": 10.0}))).await?;
        svc.update_delta("float", "coins", 0.5, true, &Caller::anonymous()).await?;
        svc.update_delta("float", "coins", 0.5, true, &Caller::anonymous()).await?;
        assert_eq!(body(&svc.get("float").await?.unwrap())["coins"].as_f64(), Some(11.0));
        Ok(())
    }

    #[tokio::test]
    async fn update_delta_truncates_and_coerces() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(player("p1", json!({"coins": "7"}))).await?;
        svc.update_delta("p1", "coins", 2.9, false, &Caller::anonymous()).await?;
        assert_eq!(body(&svc.get("p1").await?.unwrap())["coins"], json!(9));

        svc.update_delta("p1", "gems", 3.0, false, &Caller::anonymous()).await?;
        assert_eq!(body(&svc.get("p1").await?.unwrap())["gems"], json!(3));

        svc.update_property("p1", "name", "ada", &Caller::anonymous()).await?;
        assert!(matches!(
            svc.update_delta("p1", "name", 1.0, false, &Caller::anonymous()).await,
            Err(ServiceError::Validation(_))
        ));

        // missing object is a no-op
        svc.update_delta("ghost", "coins", 1.0, false, &Caller::anonymous()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn partial_updates_leave_other_fields_byte_identical() -> Result<(), anyhow::Error> {
        let svc = service();
        let raw = r#"{"z":1,"big":12345678901234567890123,"ratio":0.1000000000000000055511151231257827,"a":2}"#;
        svc.create(StorageObjectInput::new("p", "Player", raw)).await?;

        svc.update_property("p", "name", "x", &Caller::anonymous()).await?;
        let after = svc.get("p").await?.unwrap();
        assert_eq!(
            after.object_data,
            r#"{"z":1,"big":12345678901234567890123,"ratio":0.1000000000000000055511151231257827,"a":2,"name":"x"}"#
        );

        svc.update_delta("p", "z", 4.0, false, &Caller::anonymous()).await?;
        let after = svc.get("p").await?.unwrap();
        assert_eq!(
            after.object_data,
            r#"{"z":5,"big":12345678901234567890123,"ratio":0.1000000000000000055511151231257827,"a":2,"name":"x"}"#
        );
        Ok(())
    }

    #[tokio::test]
    async fn update_delta_keeps_large_integers_exact() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(StorageObjectInput::new("p1", "Player", r#"{"coins":9007199254740995}"#)).await?;
        svc.update_delta("p1", "coins", 0.0, false, &Caller::anonymous()).await?;
        assert_eq!(svc.get("p1").await?.unwrap().object_data, r#"{"coins":9007199254740995}"#);

        svc.update_delta("p1", "coins", 2.0, false, &Caller::anonymous()).await?;
        assert_eq!(svc.get("p1").await?.unwrap().object_data, r#"{"coins":9007199254740997}"#);

        svc.create(StorageObjectInput::new("p2", "Player", r#"{"coins":"9007199254740995"}"#)).await?;
        svc.update_delta("p2", "coins", 1.0, false, &Caller::anonymous()).await?;
        assert_eq!(svc.get("p2").await?.unwrap().object_data, r#"{"coins":9007199254740996}"#);
        Ok(())
    }

    #[tokio::test]
    async fn delete_missing_is_ok() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.delete("never-existed", &Caller::anonymous()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn query_filters_sorts_and_pages() -> Result<(), anyhow::Error> {
        let svc = service();
        for (i, score) in [5, 15, 25].iter().enumerate() {
            svc.create(player(&format!("p{i}"), json!({"score": score})).with_score(*score as f32)).await?;
        }
        svc.create(StorageObjectInput::new("e1", "Enemy", json!({"score": 50}).to_string())).await?;

        let req = QueryRequest::new("Player").filter("score gt 10").order_by("score desc");
        let scores: Vec<Value> = svc.query(&req).await?.iter().map(|o| body(o)["score"].clone()).collect();
        assert_eq!(scores, vec![json!(25), json!(15)]);

        // default order is score ascending
        let all: Vec<String> = svc.query(&QueryRequest::new("Player")).await?.into_iter().map(|o| o.object_id).collect();
        assert_eq!(all, vec!["p0", "p1", "p2"]);
        Ok(())
    }

    #[tokio::test]
    async fn query_top_is_clamped() -> Result<(), anyhow::Error> {
        let svc = service();
        for i in 0..30 {
            svc.create(player(&format!("p{i}"), json!({"i": i})).with_score(i as f32)).await?;
        }
        let req = QueryRequest::new("Player").page(None, Some(1000));
        assert_eq!(svc.query(&req).await?.len(), 25);
        let req = QueryRequest::new("Player").page(Some(20), Some(1000));
        assert_eq!(svc.query(&req).await?.len(), 10);
        Ok(())
    }

    #[tokio::test]
    async fn query_rejects_bad_filter() {
        let svc = service();
        let req = QueryRequest::new("Player").filter("score zz 1");
        assert!(matches!(svc.query(&req).await, Err(ServiceError::Query(_))));
    }

    #[tokio::test]
    async fn delete_owned_by_removes_only_owner_rows() -> Result<(), anyhow::Error> {
        let svc = service();
        svc.create(player("a", json!({})).with_acl(AclType::User, Some("alice".into()))).await?;
        svc.create(player("b", json!({})).with_acl(AclType::User, Some("bob".into()))).await?;
        assert_eq!(svc.delete_owned_by("alice").await?, 1);
        assert!(svc.get("a").await?.is_none());
        assert!(svc.get("b").await?.is_some());
        Ok(())
    }
}
