use super::domain::{AclType, Caller, StorageObject};
use crate::errors::ServiceError;

/// Whether `caller` may mutate `object`. Reads are never ACL-checked.
pub fn can_write(object: &StorageObject, caller: &Caller) -> bool {
    match object.acl_type {
        AclType::Public => true,
        AclType::Admin => caller.is_authenticated(),
        AclType::User => caller.user_id.as_deref() == Some(object.acl_param.as_str()),
    }
}

pub fn ensure_can_write(object: &StorageObject, caller: &Caller) -> Result<(), ServiceError> {
    if can_write(object, caller) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(format!("write denied on object {}", object.object_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::domain::StorageObjectInput;
    use chrono::Utc;

    fn object(acl_type: AclType, param: Option<&str>) -> StorageObject {
        StorageObjectInput::new("o", "T", "{}")
            .with_acl(acl_type, param.map(str::to_string))
            .into_new_object(Utc::now())
    }

    #[test]
    fn public_allows_anyone() {
        assert!(can_write(&object(AclType::Public, None), &Caller::anonymous()));
    }

    #[test]
    fn admin_requires_authentication_only() {
        let o = object(AclType::Admin, None);
        assert!(!can_write(&o, &Caller::anonymous()));
        assert!(can_write(&o, &Caller::user("anyone")));
    }

    #[test]
    fn user_requires_owner() {
        let o = object(AclType::User, Some("alice"));
        assert!(can_write(&o, &Caller::user("alice")));
        assert!(!can_write(&o, &Caller::user("bob")));
        assert!(matches!(ensure_can_write(&o, &Caller::anonymous()), Err(ServiceError::Unauthorized(_))));
    }

    #[test]
    fn user_acl_without_owner_rejects_anonymous() {
        // empty AclParam must not match a missing identity
        let o = object(AclType::User, None);
        assert!(!can_write(&o, &Caller::anonymous()));
    }
}
