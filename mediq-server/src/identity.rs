//! Sign-up and credential checks

use mediq_core::{Principal, Profile, Role};
use serde::Deserialize;

use crate::crypto::{hash_password, verify_password};
use crate::error::ServerError;
use crate::store::{NewUser, PublicUser, StoreResult, UserStore};

/// Sign-up submission. Every field is optional on the wire so a missing
/// one is reported as a validation error rather than a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct SignUpForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub specialty: Option<String>,
}

/// Login submission with the role the caller claims to hold
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Register a new user and return it without its credential
pub fn sign_up<U: UserStore>(
    users: &U,
    form: SignUpForm,
    bcrypt_cost: u32,
) -> Result<PublicUser, ServerError> {
    let (email, password, name, role) = match (
        required(form.email),
        required(form.password),
        required(form.name),
        required(form.role),
    ) {
        (Some(email), Some(password), Some(name), Some(role)) => (email, password, name, role),
        _ => return Err(ServerError::MissingFields),
    };

    let role: Role = role.parse()?;
    let profile = Profile::new(role, form.specialty)?;

    if users.find_by_email(&email)?.is_some() {
        return Err(ServerError::DuplicateIdentity);
    }

    let password_hash =
        hash_password(&password, bcrypt_cost).map_err(|e| ServerError::Internal(e.to_string()))?;

    // The store's unique constraint still catches a concurrent sign-up
    let user = users.create_user(NewUser {
        email,
        password_hash,
        name,
        profile,
    })?;

    tracing::info!(user_id = %user.id, role = %role, "User signed up");
    Ok(user.into())
}

/// Check credentials and the asserted role.
///
/// Every rejection (unknown email, wrong password, role mismatch, missing
/// field) yields `Ok(None)` so callers cannot tell them apart. Only store
/// failures are errors.
pub fn authenticate<U: UserStore>(
    users: &U,
    credentials: &Credentials,
) -> StoreResult<Option<Principal>> {
    let (Some(email), Some(password), Some(role)) = (
        credentials.email.as_deref(),
        credentials.password.as_deref(),
        credentials.role.as_deref(),
    ) else {
        return Ok(None);
    };

    let Ok(role) = role.parse::<Role>() else {
        return Ok(None);
    };

    let Some(user) = users.find_by_email(email)? else {
        return Ok(None);
    };

    if user.profile.role() != role {
        return Ok(None);
    }

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(Some(PublicUser::from(user).principal())),
        Ok(false) => Ok(None),
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Stored credential could not be checked");
            Ok(None)
        }
    }
}
