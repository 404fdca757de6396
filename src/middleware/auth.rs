use actix_web::{dev::Payload, Error, FromRequest, HttpRequest, HttpResponse};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::utils::jwt;

/// Structure qui contient l'identité portée par le bearer token
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub role: String, // 'admin' ou 'user'
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

fn auth_error(status_response: HttpResponse) -> Error {
    actix_web::error::InternalError::from_response("", status_response).into()
}

/// Implémentation de FromRequest pour AuthUser
/// Cela permet à Actix-Web d'extraire automatiquement AuthUser des requêtes
impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // 1. Extraire le header Authorization
        let auth_header = match req.headers().get("Authorization") {
            Some(header) => header,
            None => {
                return ready(Err(auth_error(HttpResponse::Unauthorized().json(
                    serde_json::json!({
                        "message": "Access denied. No token provided."
                    }),
                ))));
            }
        };

        // 2. Convertir le header en string
        let auth_str = match auth_header.to_str() {
            Ok(s) => s,
            Err(_) => {
                return ready(Err(auth_error(HttpResponse::Unauthorized().json(
                    serde_json::json!({
                        "message": "Invalid Authorization header"
                    }),
                ))));
            }
        };

        // 3. Extraire le token (format: "Bearer <token>")
        let token = if auth_str.starts_with("Bearer ") {
            &auth_str[7..]
        } else {
            return ready(Err(auth_error(HttpResponse::Unauthorized().json(
                serde_json::json!({
                    "message": "Invalid Authorization format (expected: Bearer <token>)"
                }),
            ))));
        };

        // 4. Vérifier le token JWT (signature + expiration)
        let claims = match jwt::verify_token(token) {
            Ok(claims) => claims,
            Err(_) => {
                return ready(Err(auth_error(HttpResponse::BadRequest().json(
                    serde_json::json!({
                        "message": "Invalid token"
                    }),
                ))));
            }
        };

        // 5. Créer et retourner AuthUser
        ready(Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        }))
    }
}

/// Extracteur pour les routes réservées aux admins.
/// Remplace les vérifications role == "admin" dispersées dans les handlers :
/// le rôle est contrôlé une seule fois, ici.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: i32,
}

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let auth_user = match AuthUser::from_request(req, payload).into_inner() {
            Ok(user) => user,
            Err(e) => return ready(Err(e)),
        };

        if !auth_user.is_admin() {
            return ready(Err(auth_error(HttpResponse::Forbidden().json(
                serde_json::json!({
                    "message": "Access denied. Admin privileges required."
                }),
            ))));
        }

        ready(Ok(AdminUser { id: auth_user.id }))
    }
}
