//! Sign-in, sign-up, sign-out and the cached user profile
//!
//! Successful sign-in and sign-up persist the returned token pair and user
//! blob to the client's token store, so every later request carries the new
//! credentials.

use std::str::FromStr;

use api_client::{ApiClient, RequestOptions};
use common::Secret;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::payload::{Id, Payload};

/// Account type chosen at sign-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Host,
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "host" => Ok(Role::Host),
            other => Err(Error::InvalidInput(format!(
                "unknown role '{other}', expected student or host"
            ))),
        }
    }
}

/// The signed-in user as the backend describes them.
///
/// Unknown fields are ignored; the full blob stays in the token store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Sign-up details.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: Secret<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(alias = "token", alias = "accessToken")]
    access_token: String,
    #[serde(default, alias = "refreshToken")]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<Value>,
}

/// Sign in with email and password.
pub async fn login(client: &ApiClient, email: &str, password: &Secret<String>) -> Result<UserProfile> {
    require("email", email)?;
    require("password", password.as_str())?;

    let body = json!({ "email": email, "password": password.as_str() });
    let response: AuthResponse = client
        .post("/auth/login", Some(body), RequestOptions::default())
        .await?
        .json()?;
    let profile = persist_session(client, response)?;
    info!(user_id = ?profile.id, "signed in");
    Ok(profile)
}

/// Create an account and sign in to it.
pub async fn register(client: &ApiClient, registration: &Registration) -> Result<UserProfile> {
    require("name", &registration.name)?;
    require("email", &registration.email)?;
    if registration.password.as_str().len() < 6 {
        return Err(Error::InvalidInput(
            "password must be at least 6 characters".into(),
        ));
    }

    let body = json!({
        "name": registration.name,
        "email": registration.email,
        "password": registration.password.as_str(),
        "role": registration.role,
    });
    let response: AuthResponse = client
        .post("/auth/register", Some(body), RequestOptions::default())
        .await?
        .json()?;
    let profile = persist_session(client, response)?;
    info!(user_id = ?profile.id, role = ?registration.role, "account created");
    Ok(profile)
}

/// Sign out. The server call is best effort; the local session is always
/// cleared.
pub async fn logout(client: &ApiClient) -> Result<()> {
    if client.token_store().get().access_token().is_some() {
        if let Err(e) = client
            .post("/auth/logout", None, RequestOptions::default())
            .await
        {
            warn!(status = e.status(), error = %e, "server logout failed, clearing local session");
        }
    }
    client.token_store().clear()?;
    info!("signed out");
    Ok(())
}

/// Fetch the current user's profile and refresh the cached copy.
pub async fn me(client: &ApiClient) -> Result<UserProfile> {
    let user = client
        .get_json::<Payload<Value>>("/auth/me", RequestOptions::default())
        .await?
        .into_inner();
    client.token_store().set_user(user.clone())?;
    Ok(profile_from(&user))
}

/// The cached profile, without a network call.
pub fn cached_user(client: &ApiClient) -> Option<UserProfile> {
    client.token_store().user().map(|user| profile_from(&user))
}

fn persist_session(client: &ApiClient, response: AuthResponse) -> Result<UserProfile> {
    let store = client.token_store();
    // A new sign-in never inherits the previous account's refresh token or user.
    store.clear()?;
    store.set(&response.access_token, response.refresh_token.as_deref())?;
    match response.user {
        Some(user) => {
            let profile = profile_from(&user);
            store.set_user(user)?;
            Ok(profile)
        }
        None => Ok(UserProfile::default()),
    }
}

fn profile_from(user: &Value) -> UserProfile {
    UserProfile::deserialize(user).unwrap_or_default()
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}
