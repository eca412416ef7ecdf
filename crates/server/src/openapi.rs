use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub email: String, pub name: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ChangePasswordRequest { pub old_password: String, pub new_password: String }

/// One of `Public`, `User`, `Admin`.
#[derive(ToSchema)]
pub enum AclTypeDoc { Public, User, Admin }

#[derive(ToSchema)]
#[schema(as = StorageObject)]
#[allow(non_snake_case)]
pub struct StorageObjectDoc {
    pub ObjectId: String,
    pub ObjectType: String,
    /// serialized JSON document
    pub ObjectData: String,
    pub ObjectScore: f32,
    pub AclType: AclTypeDoc,
    pub AclParam: String,
    /// RFC 3339
    pub CreatedOn: String,
    /// RFC 3339
    pub ModifiedOn: String,
}

#[derive(ToSchema)]
#[schema(as = StorageObjectInput)]
#[allow(non_snake_case)]
pub struct StorageObjectInputDoc {
    pub ObjectId: String,
    pub ObjectType: String,
    /// serialized JSON text or an inline JSON object
    pub ObjectData: Option<String>,
    pub ObjectScore: Option<f32>,
    pub AclType: Option<AclTypeDoc>,
    pub AclParam: Option<String>,
    /// only read by `/storage/sync`
    pub ModifiedOn: Option<String>,
}

#[derive(ToSchema)]
#[schema(as = UpdatePropertyRequest)]
#[allow(non_snake_case)]
pub struct UpdatePropertyDoc { pub id: String, pub propertyName: String, pub propertyValue: String }

#[derive(ToSchema)]
#[schema(as = UpdateDeltaRequest)]
#[allow(non_snake_case)]
pub struct UpdateDeltaDoc { pub id: String, pub propertyName: String, pub delta: f64, pub isFloat: Option<bool> }

#[derive(ToSchema)]
#[schema(as = RankEntry)]
#[allow(non_snake_case)]
pub struct RankEntryDoc { pub ObjectId: String, pub ObjectType: String, pub ObjectScore: f32, pub Rank: u64 }

/// A stored object with its leaderboard position.
#[derive(ToSchema)]
#[schema(as = RankedObject)]
#[allow(non_snake_case)]
pub struct RankedObjectDoc {
    pub ObjectId: String,
    pub ObjectType: String,
    pub ObjectData: String,
    pub ObjectScore: f32,
    pub AclType: AclTypeDoc,
    pub AclParam: String,
    pub CreatedOn: String,
    pub ModifiedOn: String,
    pub Rank: u64,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::storage::query,
        crate::routes::storage::get,
        crate::routes::storage::get_set,
        crate::routes::storage::create,
        crate::routes::storage::update,
        crate::routes::storage::sync,
        crate::routes::storage::update_set,
        crate::routes::storage::update_property,
        crate::routes::storage::update_delta,
        crate::routes::storage::delete,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::change_password,
        crate::routes::auth::delete_account,
        crate::routes::leaderboard::top,
        crate::routes::leaderboard::rank,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ChangePasswordRequest,
            AclTypeDoc,
            StorageObjectDoc,
            StorageObjectInputDoc,
            UpdatePropertyDoc,
            UpdateDeltaDoc,
            RankEntryDoc,
            RankedObjectDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "storage"),
        (name = "auth"),
        (name = "leaderboard")
    )
)]
pub struct ApiDoc;
