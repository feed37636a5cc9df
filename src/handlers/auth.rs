use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{self, Role};
use crate::utils::auth::{create_jwt, hash_password, verify_password};
use crate::utils::config::Config;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub access_type: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
    pub name: String,
    pub access_type: Role,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn register(
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    req: web::Json<RegisterRequest>,
) -> impl Responder {
    log::info!("Registration attempt for email: {}", req.email);

    // Check if registration is allowed
    if !config.allow_registration {
        log::warn!("Registration attempt rejected - registration is disabled");
        return HttpResponse::Forbidden().json(ErrorResponse {
            error: "Registration is currently disabled".to_string(),
        });
    }

    // Check if email already exists
    let existing_user = user::Entity::find()
        .filter(user::Column::Email.eq(&req.email))
        .one(db.get_ref())
        .await;

    match existing_user {
        Ok(Some(_)) => {
            log::warn!("Registration failed - email '{}' already exists", req.email);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Email already exists".to_string(),
            });
        }
        Err(e) => {
            log::error!("Database error during registration: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Database error: {}", e),
            });
        }
        _ => {}
    }

    // Hash password
    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Failed to hash password: {}", e),
            });
        }
    };

    // Create user
    let user_id = Uuid::new_v4();
    let new_user = user::ActiveModel {
        id: Set(user_id),
        name: Set(req.name.clone()),
        email: Set(req.email.clone()),
        password_hash: Set(password_hash),
        access_type: Set(req.access_type),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    };

    let user_result = new_user.insert(db.get_ref()).await;

    match user_result {
        Ok(user) => {
            log::info!("User '{}' created successfully (ID: {})", user.name, user.id);

            // Generate JWT
            let token = match create_jwt(
                user.id,
                user.access_type,
                &config.jwt_secret,
                config.jwt_expiration_hours,
            ) {
                Ok(t) => t,
                Err(e) => {
                    log::error!("Failed to generate token: {}", e);
                    return HttpResponse::InternalServerError().json(ErrorResponse {
                        error: format!("Failed to generate token: {}", e),
                    });
                }
            };

            HttpResponse::Created().json(AuthResponse {
                token,
                user_id: user.id.to_string(),
                name: user.name,
                access_type: user.access_type,
            })
        }
        Err(e) => {
            log::error!("Failed to create user: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Failed to create user: {}", e),
            })
        }
    }
}

pub async fn login(
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    req: web::Json<LoginRequest>,
) -> impl Responder {
    log::info!("Login attempt for email: {}", req.email);

    // Find user by email
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&req.email))
        .one(db.get_ref())
        .await;

    match user {
        Ok(Some(user)) => {
            if !user.is_active {
                log::warn!("Login rejected - user '{}' is inactive", req.email);
                return HttpResponse::Unauthorized().json(ErrorResponse {
                    error: "Invalid credentials".to_string(),
                });
            }

            // Verify password
            match verify_password(&req.password, &user.password_hash) {
                Ok(true) => {
                    // Generate JWT
                    let token = match create_jwt(
                        user.id,
                        user.access_type,
                        &config.jwt_secret,
                        config.jwt_expiration_hours,
                    ) {
                        Ok(t) => t,
                        Err(e) => {
                            log::error!("Failed to generate token: {}", e);
                            return HttpResponse::InternalServerError().json(ErrorResponse {
                                error: format!("Failed to generate token: {}", e),
                            });
                        }
                    };

                    log::info!("Login succeeded for '{}'", req.email);

                    HttpResponse::Ok().json(AuthResponse {
                        token,
                        user_id: user.id.to_string(),
                        name: user.name,
                        access_type: user.access_type,
                    })
                }
                Ok(false) => {
                    log::warn!("Invalid password for '{}'", req.email);
                    HttpResponse::Unauthorized().json(ErrorResponse {
                        error: "Invalid credentials".to_string(),
                    })
                }
                Err(e) => {
                    log::error!("Failed to verify password: {}", e);
                    HttpResponse::InternalServerError().json(ErrorResponse {
                        error: format!("Failed to verify password: {}", e),
                    })
                }
            }
        }
        Ok(None) => {
            log::warn!("User '{}' not found", req.email);
            HttpResponse::Unauthorized().json(ErrorResponse {
                error: "Invalid credentials".to_string(),
            })
        }
        Err(e) => {
            log::error!("Database error during login: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Database error: {}", e),
            })
        }
    }
}
