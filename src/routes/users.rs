use actix_web::{post, get, put, delete, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::db::is_unique_violation;
use crate::middleware::AdminUser;
use crate::models::dto::MaskedUser;
use crate::models::users::{self, Entity as Users, Column as UserColumn, ActiveModel as UserActiveModel};
use crate::utils::password;

const DEFAULT_PAGE_SIZE: u64 = 6;
const PASSWORD_MASK: &str = "********";

// DTO pour la création d'un utilisateur par un admin
#[derive(Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub role: Option<String>, // 'user' (défaut) ou 'admin'
}

// DTO pour la mise à jour (mot de passe optionnel)
#[derive(Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub password: Option<String>,
}

// Query string de la pagination par curseur
#[derive(Deserialize)]
pub struct UsersQuery {
    pub cursor: Option<i32>,
    pub limit: Option<u64>,
}

/// nextCursor = id de la dernière ligne, seulement si la page est pleine
/// (page pleine = il y a peut-être encore des lignes après)
fn compute_next_cursor(users: &[users::Model], limit: u64) -> Option<i32> {
    if users.len() as u64 == limit {
        users.last().map(|u| u.id)
    } else {
        None
    }
}

/// POST /api/admin/create-user - Créer un utilisateur (PROTÉGÉE admin)
#[post("/admin/create-user")]
pub async fn create_user(
    admin_user: AdminUser,
    body: web::Json<CreateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    // 1. Hash le mot de passe (jamais stocké en clair)
    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Password hashing error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 2. Insérer — la contrainte UNIQUE sur user_name détecte le doublon
    let new_user = UserActiveModel {
        admin_id: Set(Some(admin_user.id)),
        user_name: Set(body.name.clone()),
        user_password: Set(password_hash),
        role: Set(body.role.clone().unwrap_or_else(|| "user".to_string())),
        ..Default::default()
    };

    match new_user.insert(db.get_ref()).await {
        Ok(user) => HttpResponse::Created().json(serde_json::json!({
            "message": "User created successfully",
            "user": user, // le hash est skip_serializing
        })),
        Err(e) if is_unique_violation(&e) => HttpResponse::BadRequest().json(serde_json::json!({
            "message": "User with this name already exists"
        })),
        Err(e) => {
            log::error!("User creation error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// GET /api/admin/users?cursor&limit - Liste paginée par curseur (PROTÉGÉE admin)
///
/// Keyset pagination : renvoie les lignes d'id strictement supérieur au
/// curseur, ordonnées par id croissant, limitées à `limit` (défaut 6).
#[get("/admin/users")]
pub async fn list_users(
    _admin_user: AdminUser,
    query: web::Query<UsersQuery>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let mut find = Users::find();
    if let Some(cursor) = query.cursor {
        find = find.filter(UserColumn::Id.gt(cursor));
    }

    let users = match find
        .order_by_asc(UserColumn::Id)
        .limit(limit)
        .all(db.get_ref())
        .await
    {
        Ok(users) => users,
        Err(e) => {
            log::error!("Fetch users error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let next_cursor = compute_next_cursor(&users, limit);

    // Masquer le mot de passe quel que soit le hash stocké
    let masked_users: Vec<MaskedUser> = users
        .into_iter()
        .map(|u| MaskedUser {
            id: u.id,
            name: u.user_name,
            password: PASSWORD_MASK.to_string(),
            role: u.role,
            admin_id: u.admin_id,
            created_at: u.created_at,
            updated_at: u.updated_at,
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Users fetched successfully",
        "users": masked_users,
        "nextCursor": next_cursor,
    }))
}

/// PUT /api/admin/users/{id} - Mise à jour partielle (PROTÉGÉE admin)
/// Le nom est toujours mis à jour; le mot de passe seulement s'il est fourni.
#[put("/admin/users/{id}")]
pub async fn update_user(
    _admin_user: AdminUser,
    path: web::Path<i32>,
    body: web::Json<UpdateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    let user_id = path.into_inner();

    // 1. Récupérer l'utilisateur
    let user = match Users::find_by_id(user_id).one(db.get_ref()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "User not found"
            }));
        }
        Err(e) => {
            log::error!("Update user error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 2. Appliquer les modifications
    let mut active_model: UserActiveModel = user.into();
    active_model.user_name = Set(body.name.clone());
    active_model.updated_at = Set(Utc::now().fixed_offset());

    if let Some(ref new_password) = body.password {
        let password_hash = match password::hash_password(new_password) {
            Ok(hash) => hash,
            Err(e) => {
                log::error!("Password hashing error: {}", e);
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "message": "Server error"
                }));
            }
        };
        active_model.user_password = Set(password_hash);
    }

    match active_model.update(db.get_ref()).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "message": "User updated successfully",
            "user": user,
        })),
        Err(e) if is_unique_violation(&e) => HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Username already exists"
        })),
        Err(e) => {
            log::error!("Update user error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// DELETE /api/admin/users/{id} - Suppression (PROTÉGÉE admin)
/// Les user_stocks associés partent en cascade côté BD.
#[delete("/admin/users/{id}")]
pub async fn delete_user(
    _admin_user: AdminUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let user_id = path.into_inner();

    let user = match Users::find_by_id(user_id).one(db.get_ref()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "User not found"
            }));
        }
        Err(e) => {
            log::error!("Delete user error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    match user.delete(db.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "message": "User deleted successfully"
        })),
        Err(e) => {
            log::error!("Delete user error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

pub fn user_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_user)
        .service(list_users)
        .service(update_user)
        .service(delete_user);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i32) -> users::Model {
        let now = Utc::now().fixed_offset();
        users::Model {
            id,
            admin_id: Some(1),
            user_name: format!("user{}", id),
            user_password: "pbkdf2:sha256:260000$x$y".to_string(),
            role: "user".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_next_cursor_on_full_page() {
        let page: Vec<_> = (1..=6).map(user).collect();
        assert_eq!(compute_next_cursor(&page, 6), Some(6));
    }

    #[test]
    fn test_no_next_cursor_on_partial_page() {
        let page: Vec<_> = (1..=4).map(user).collect();
        assert_eq!(compute_next_cursor(&page, 6), None);
    }

    #[test]
    fn test_no_next_cursor_on_empty_page() {
        assert_eq!(compute_next_cursor(&[], 6), None);
    }

    #[test]
    fn test_chained_pages_enumerate_all_rows_once() {
        // 8 lignes, limit 3 : pages [1,2,3], [4,5,6], [7,8] puis stop
        let rows: Vec<_> = (1..=8).map(user).collect();
        let limit = 3u64;

        let mut seen = Vec::new();
        let mut cursor: Option<i32> = None;

        loop {
            let page: Vec<_> = rows
                .iter()
                .filter(|u| cursor.map_or(true, |c| u.id > c))
                .take(limit as usize)
                .cloned()
                .collect();

            seen.extend(page.iter().map(|u| u.id));

            match compute_next_cursor(&page, limit) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
