use actix_web::{post, get, web, HttpResponse};
use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter, ColumnTrait, Set, ActiveModelTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::is_unique_violation;
use crate::models::admin::{Entity as Admins, Column as AdminColumn, ActiveModel as AdminActiveModel};
use crate::models::users::{Entity as Users, Column as UserColumn};
use crate::utils::{password, jwt};
use crate::middleware::{AdminUser, AuthUser};

// DTO pour l'inscription admin
#[derive(Deserialize, Validate)]
pub struct AdminRegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// DTO pour la connexion admin
#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

// DTO pour la connexion utilisateur
#[derive(Deserialize)]
pub struct UserLoginRequest {
    pub name: String,
    pub password: String,
}

// Identité admin renvoyée après login/verify
#[derive(Serialize)]
pub struct AdminInfo {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// POST /api/admin/register - Créer un compte admin (PUBLIC)
#[post("/admin/register")]
pub async fn admin_register(
    body: web::Json<AdminRegisterRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    // 1. Hash le mot de passe
    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Password hashing error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 2. Insérer — la contrainte UNIQUE sur email détecte le doublon
    let new_admin = AdminActiveModel {
        admin_name: Set(body.name.clone()),
        email: Set(body.email.clone()),
        admin_password: Set(password_hash),
        ..Default::default()
    };

    match new_admin.insert(db.get_ref()).await {
        Ok(admin) => HttpResponse::Created().json(serde_json::json!({
            "message": "Admin registered successfully",
            "admin": AdminInfo {
                id: admin.id,
                name: admin.admin_name,
                email: admin.email,
            }
        })),
        Err(e) if is_unique_violation(&e) => HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Admin with this email already exists"
        })),
        Err(e) => {
            log::error!("Admin registration error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// POST /api/admin/login - Connexion admin par email (PUBLIC)
#[post("/admin/login")]
pub async fn admin_login(
    body: web::Json<AdminLoginRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    // 1. Trouver l'admin par email
    let admin = match Admins::find()
        .filter(AdminColumn::Email.eq(&body.email))
        .one(db.get_ref())
        .await
    {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Invalid email or password"
            }));
        }
        Err(e) => {
            log::error!("Admin login error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 2. Vérifier le mot de passe contre le hash stocké
    let is_valid = match password::verify_password(&body.password, &admin.admin_password) {
        Ok(valid) => valid,
        Err(e) => {
            log::error!("Password verification error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    if !is_valid {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid email or password"
        }));
    }

    // 3. Générer le JWT avec payload {id, role: admin}
    let token = match jwt::generate_token(admin.id, "admin") {
        Ok(token) => token,
        Err(e) => {
            log::error!("Token generation error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Login successful",
        "token": token,
        "admin": AdminInfo {
            id: admin.id,
            name: admin.admin_name,
            email: admin.email,
        }
    }))
}

/// GET /api/admin/verify - Vérifier le token admin (PROTÉGÉE admin)
#[get("/admin/verify")]
pub async fn admin_verify(
    admin_user: AdminUser,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    match Admins::find_by_id(admin_user.id).one(db.get_ref()).await {
        Ok(Some(admin)) => HttpResponse::Ok().json(AdminInfo {
            id: admin.id,
            name: admin.admin_name,
            email: admin.email,
        }),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Admin not found"
        })),
        Err(e) => {
            log::error!("Admin verification error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// POST /api/user/login - Connexion utilisateur par user_name (PUBLIC)
#[post("/user/login")]
pub async fn user_login(
    body: web::Json<UserLoginRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    // 1. Trouver l'utilisateur
    let user = match Users::find()
        .filter(UserColumn::UserName.eq(&body.name))
        .one(db.get_ref())
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Invalid name or password"
            }));
        }
        Err(e) => {
            log::error!("User login error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 2. Vérifier le mot de passe
    let is_valid = match password::verify_password(&body.password, &user.user_password) {
        Ok(valid) => valid,
        Err(e) => {
            log::error!("Password verification error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    if !is_valid {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid name or password"
        }));
    }

    // 3. Générer le JWT avec payload {id, role: user}
    let token = match jwt::generate_token(user.id, "user") {
        Ok(token) => token,
        Err(e) => {
            log::error!("Token generation error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Login successful",
        "token": token,
        "user": {
            "id": user.id,
            "name": user.user_name,
        }
    }))
}

/// GET /api/user/verify - Vérifier le token utilisateur (PROTÉGÉE)
#[get("/user/verify")]
pub async fn user_verify(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    match Users::find_by_id(auth_user.id).one(db.get_ref()).await {
        Ok(Some(user)) => HttpResponse::Ok().json(serde_json::json!({
            "id": user.id,
            "name": user.user_name,
            "role": user.role,
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "User not found"
        })),
        Err(e) => {
            log::error!("User verification error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(admin_register)
        .service(admin_login)
        .service(admin_verify)
        .service(user_login)
        .service(user_verify);
}
