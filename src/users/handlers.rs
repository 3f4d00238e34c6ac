use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{extractors::AuthUser, policy},
    db::StoreError,
    error::{internal, ApiError},
    response::MessageResponse,
    state::AppState,
    users::{
        dto::{LoginRequest, LoginResponse, SignupRequest, UserResponse},
        repo_types::NewUser,
    },
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/signup", post(signup))
        .route("/users/login", post(login))
}

/// Mounted behind the auth gate.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:user", get(get_user))
        .route("/users/:user/flag", patch(flag_user))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(mut payload) = payload.map_err(|e| {
        warn!(error = %e, "signup body rejected");
        ApiError::BadRequest("could not parse the request")
    })?;
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required"));
    }

    // Cheap check before paying for the hash; the unique index still decides.
    let existing = state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(internal("Could not create user"))?;
    if existing.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Conflict - user already exists"));
    }

    let password_hash = state.hasher.hash_blocking(payload.password).await?;

    let user = match state
        .users
        .save(NewUser {
            email: payload.email,
            password_hash,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone_number: payload.phone_number,
            address: payload.address,
            is_admin: payload.is_admin,
        })
        .await
    {
        Ok(u) => u,
        Err(StoreError::Duplicate) => {
            warn!("signup hit a unique constraint");
            return Err(ApiError::Conflict("Conflict - user already exists"));
        }
        Err(e) => return Err(internal("Could not create user")(e)),
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(mut payload) = payload.map_err(|e| {
        warn!(error = %e, "login body rejected");
        ApiError::BadRequest("could not parse the request")
    })?;
    payload.email = payload.email.trim().to_lowercase();

    let user = match state.users.find_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            state.hasher.verify_dummy_blocking(payload.password).await;
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Unauthorized("Invalid credentials"));
        }
        Err(e) => return Err(internal("Could not log in")(e)),
    };

    let ok = state
        .hasher
        .verify_blocking(payload.password, user.password_hash.clone())
        .await;
    if !ok {
        warn!(email = %payload.email, user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let jwt = state
        .jwt
        .sign(user.id, &user.email, user.is_admin)
        .map_err(internal("could not generate token"))?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        message: "User logged in successfully with JWT token",
        jwt,
        user,
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = email.trim().to_lowercase();
    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(internal("Could not fetch user"))?
        .ok_or(ApiError::NotFound("user not found"))?;

    Ok(Json(UserResponse {
        message: "User retrieved successfully",
        user,
    }))
}

#[instrument(skip(state))]
pub async fn flag_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID"))?;

    policy::ensure_can_flag_user(&caller).map_err(|e| {
        warn!(error = %e, caller_id = caller.user_id, target_id = id, "flag denied");
        ApiError::Forbidden("Only administrators can flag users")
    })?;

    let found = state
        .users
        .flag(id)
        .await
        .map_err(internal("Could not flag user"))?;
    if !found {
        return Err(ApiError::NotFound("user not found"));
    }

    info!(caller_id = caller.user_id, target_id = id, "user flagged");
    Ok(Json(MessageResponse {
        message: "User flagged successfully",
    }))
}
