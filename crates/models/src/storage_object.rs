use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

pub const MAX_OBJECT_ID_LEN: usize = 128;
pub const MAX_OBJECT_TYPE_LEN: usize = 64;
pub const MAX_ACL_PARAM_LEN: usize = 128;

/// Write policy attached to every stored object.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AclType {
    #[default]
    #[sea_orm(string_value = "Public")]
    Public,
    #[sea_orm(string_value = "User")]
    User,
    #[sea_orm(string_value = "Admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_object")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub object_id: String,
    pub object_type: String,
    #[sea_orm(column_type = "Text")]
    pub object_data: String,
    pub object_score: f32,
    pub acl_type: AclType,
    pub acl_param: String,
    pub created_on: DateTimeWithTimeZone,
    pub modified_on: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_object_id(id: &str) -> Result<(), errors::ModelError> {
    if id.trim().is_empty() {
        return Err(errors::ModelError::Validation("ObjectId required".into()));
    }
    if id.len() > MAX_OBJECT_ID_LEN {
        return Err(errors::ModelError::Validation(format!("ObjectId too long (<={MAX_OBJECT_ID_LEN})")));
    }
    Ok(())
}

pub fn validate_object_type(ty: &str) -> Result<(), errors::ModelError> {
    if ty.trim().is_empty() {
        return Err(errors::ModelError::Validation("ObjectType required".into()));
    }
    if ty.len() > MAX_OBJECT_TYPE_LEN {
        return Err(errors::ModelError::Validation(format!("ObjectType too long (<={MAX_OBJECT_TYPE_LEN})")));
    }
    Ok(())
}

pub fn validate_acl_param(param: &str) -> Result<(), errors::ModelError> {
    if param.len() > MAX_ACL_PARAM_LEN {
        return Err(errors::ModelError::Validation(format!("AclParam too long (<={MAX_ACL_PARAM_LEN})")));
    }
    Ok(())
}

/// The body is opaque to the store but must at least be a JSON document.
pub fn validate_object_data(data: &str) -> Result<(), errors::ModelError> {
    serde_json::from_str::<serde_json::Value>(data)
        .map(|_| ())
        .map_err(|e| errors::ModelError::Validation(format!("ObjectData is not valid JSON: {e}")))
}

pub fn validate(model: &Model) -> Result<(), errors::ModelError> {
    validate_object_id(&model.object_id)?;
    validate_object_type(&model.object_type)?;
    validate_acl_param(&model.acl_param)?;
    validate_object_data(&model.object_data)?;
    if !model.object_score.is_finite() {
        return Err(errors::ModelError::Validation("ObjectScore must be finite".into()));
    }
    Ok(())
}

pub async fn find<C: ConnectionTrait>(db: &C, object_id: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id(object_id.to_string())
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_many<C: ConnectionTrait>(db: &C, ids: &[String]) -> Result<Vec<Model>, errors::ModelError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Entity::find()
        .filter(Column::ObjectId.is_in(ids.iter().cloned()))
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Every row of one type, lowest score first.
pub async fn list_by_type<C: ConnectionTrait>(db: &C, object_type: &str) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::ObjectType.eq(object_type.to_string()))
        .order_by_asc(Column::ObjectScore)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Highest scores of one type, limited to `limit` rows.
pub async fn top_by_score<C: ConnectionTrait>(db: &C, object_type: &str, limit: u64) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::ObjectType.eq(object_type.to_string()))
        .order_by_desc(Column::ObjectScore)
        .order_by_asc(Column::ObjectId)
        .limit(limit)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn count_above<C: ConnectionTrait>(db: &C, object_type: &str, score: f32) -> Result<u64, errors::ModelError> {
    Entity::find()
        .filter(Column::ObjectType.eq(object_type.to_string()))
        .filter(Column::ObjectScore.gt(score))
        .count(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn insert<C: ConnectionTrait>(db: &C, model: Model) -> Result<Model, errors::ModelError> {
    validate(&model)?;
    let am = ActiveModel {
        object_id: Set(model.object_id),
        object_type: Set(model.object_type),
        object_data: Set(model.object_data),
        object_score: Set(model.object_score),
        acl_type: Set(model.acl_type),
        acl_param: Set(model.acl_param),
        created_on: Set(model.created_on),
        modified_on: Set(model.modified_on),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Overwrite the mutable columns of an existing row.
pub async fn overwrite<C: ConnectionTrait>(db: &C, model: Model) -> Result<Model, errors::ModelError> {
    validate(&model)?;
    let am = ActiveModel {
        object_id: sea_orm::ActiveValue::Unchanged(model.object_id),
        object_type: Set(model.object_type),
        object_data: Set(model.object_data),
        object_score: Set(model.object_score),
        acl_type: Set(model.acl_type),
        acl_param: Set(model.acl_param),
        created_on: Set(model.created_on),
        modified_on: Set(model.modified_on),
    };
    am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn delete<C: ConnectionTrait>(db: &C, object_id: &str) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(object_id.to_string())
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}

/// Remove every object owned by `owner` (`AclParam == owner`); returns the number removed.
pub async fn delete_owned_by<C: ConnectionTrait>(db: &C, owner: &str) -> Result<u64, errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::AclParam.eq(owner.to_string()))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected)
}
