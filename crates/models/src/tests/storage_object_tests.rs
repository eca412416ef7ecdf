use anyhow::Result;
use chrono::Utc;
use migration::MigratorTrait;
use uuid::Uuid;

use crate::db::connect;
use crate::storage_object::{self, AclType, Model};
use crate::{user, user_credentials};

fn object(ty: &str, score: f32, owner: &str) -> Model {
    let now = Utc::now().into();
    Model {
        object_id: format!("obj_{}", Uuid::new_v4()),
        object_type: ty.to_string(),
        object_data: r#"{"level":1}"#.into(),
        object_score: score,
        acl_type: if owner.is_empty() { AclType::Public } else { AclType::User },
        acl_param: owner.to_string(),
        created_on: now,
        modified_on: now,
    }
}

#[tokio::test]
async fn test_storage_object_crud() -> Result<()> {
    if !super::db_tests_enabled() {
        return Ok(());
    }
    let db = connect().await?;
    migration::Migrator::up(&db, None).await?;

    let ty = format!("crud_{}", Uuid::new_v4().simple());
    let created = storage_object::insert(&db, object(&ty, 3.0, "")).await?;
    let found = storage_object::find(&db, &created.object_id).await?.expect("row exists");
    assert_eq!(found.object_type, ty);

    let mut changed = found.clone();
    changed.object_data = r#"{"level":2}"#.into();
    changed.object_score = 9.0;
    let updated = storage_object::overwrite(&db, changed).await?;
    assert_eq!(updated.object_score, 9.0);

    assert!(storage_object::delete(&db, &created.object_id).await?);
    assert!(!storage_object::delete(&db, &created.object_id).await?);
    assert!(storage_object::find(&db, &created.object_id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_list_and_rank_by_score() -> Result<()> {
    if !super::db_tests_enabled() {
        return Ok(());
    }
    let db = connect().await?;
    migration::Migrator::up(&db, None).await?;

    let ty = format!("rank_{}", Uuid::new_v4().simple());
    let mut ids = Vec::new();
    for score in [5.0, 25.0, 15.0] {
        ids.push(storage_object::insert(&db, object(&ty, score, "")).await?.object_id);
    }

    let asc: Vec<f32> = storage_object::list_by_type(&db, &ty).await?.iter().map(|m| m.object_score).collect();
    assert_eq!(asc, vec![5.0, 15.0, 25.0]);

    let top = storage_object::top_by_score(&db, &ty, 2).await?;
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].object_score, 25.0);
    assert_eq!(storage_object::count_above(&db, &ty, 15.0).await?, 1);

    for id in ids {
        storage_object::delete(&db, &id).await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_user_delete_with_owned_objects() -> Result<()> {
    if !super::db_tests_enabled() {
        return Ok(());
    }
    let db = connect().await?;
    migration::Migrator::up(&db, None).await?;

    let u = user::create(&db, &format!("owner_{}@example.com", Uuid::new_v4()), "Owner").await?;
    user_credentials::upsert_password(&db, u.id, "hash".into(), "argon2").await?;
    let owner = u.id.to_string();
    let owned = storage_object::insert(&db, object("Save", 1.0, &owner)).await?;
    let public = storage_object::insert(&db, object("Save", 1.0, "")).await?;

    assert_eq!(storage_object::delete_owned_by(&db, &owner).await?, 1);
    assert!(user::hard_delete(&db, u.id).await?);
    assert!(user_credentials::find_by_user(&db, u.id).await?.is_none());
    assert!(storage_object::find(&db, &owned.object_id).await?.is_none());
    assert!(storage_object::find(&db, &public.object_id).await?.is_some());

    storage_object::delete(&db, &public.object_id).await?;
    Ok(())
}
