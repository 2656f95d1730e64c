//! Dashboard accounts
//!
//! Passwords are stored as Argon2id PHC strings. Account rules live here so
//! the HTTP handlers stay thin:
//!
//! - emails are unique after trimming and lowercasing
//! - an `admin` may be linked to one school by NPSN, which must exist
//! - superadmin accounts cannot be deleted
//! - inactive accounts cannot log in
//!
//! Sessions and tokens are out of scope; [`login`] only checks credentials
//! and stamps the login time.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::{
    check_password, normalize_email, Admin, AdminRole, AdminUpdate, Credentials, NewAdmin,
    PasswordReset,
};
use crate::storage::{AdminRepository, SchoolRepository};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::other(format!("password hashing failed: {e}")))
}

/// Check a password against a stored hash
///
/// A mismatch is `Ok(false)`; a malformed stored hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| Error::other(format!("stored password hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// School id for an admin's NPSN; superadmins and blank NPSNs link nothing
fn resolve_school<S: SchoolRepository>(store: &S, role: AdminRole, npsn: &str) -> Result<String> {
    if role == AdminRole::Superadmin || npsn.is_empty() {
        return Ok(String::new());
    }
    store
        .find_school_by_npsn(npsn)?
        .map(|school| school.id)
        .ok_or_else(|| Error::not_found("School", npsn))
}

fn ensure_email_free<S: AdminRepository>(store: &S, email: &str, owner: Option<&str>) -> Result<()> {
    match store.find_admin_by_email(email)? {
        Some(existing) if Some(existing.id.as_str()) != owner => Err(Error::validation(format!(
            "email is already registered: {email}"
        ))),
        _ => Ok(()),
    }
}

/// Validate, hash and store a new account
pub fn create_admin<S>(store: &S, mut payload: NewAdmin) -> Result<Admin>
where
    S: AdminRepository + SchoolRepository,
{
    payload.validate()?;
    ensure_email_free(store, &payload.email, None)?;
    let school_id = resolve_school(store, payload.role, &payload.npsn)?;

    let hash = hash_password(&payload.password)?;
    let admin = payload.into_admin(hash, school_id);
    store.insert_admin(&admin)?;

    tracing::info!(id = %admin.id, role = %admin.role, "Admin account created");
    Ok(admin)
}

/// Apply a partial update, re-linking the school when the NPSN changes
pub fn update_admin<S>(store: &S, id: &str, update: AdminUpdate) -> Result<Admin>
where
    S: AdminRepository + SchoolRepository,
{
    let mut admin = store
        .get_admin(id)?
        .ok_or_else(|| Error::not_found("Admin", id))?;

    update.apply(&mut admin)?;
    ensure_email_free(store, &admin.email, Some(&admin.id))?;
    if admin.school_id.is_empty() {
        admin.school_id = resolve_school(store, admin.role, &admin.npsn)?;
    }
    store.update_admin(&admin)?;

    tracing::info!(id = %admin.id, "Admin account updated");
    Ok(admin)
}

/// Delete an account; superadmins are protected
pub fn delete_admin<S: AdminRepository>(store: &S, id: &str) -> Result<Admin> {
    let admin = store
        .get_admin(id)?
        .ok_or_else(|| Error::not_found("Admin", id))?;
    if admin.is_superadmin() {
        return Err(Error::forbidden("superadmin accounts cannot be deleted"));
    }

    store.delete_admin(id)?;
    tracing::info!(id = %admin.id, "Admin account deleted");
    Ok(admin)
}

/// Replace an account's password
pub fn reset_password<S: AdminRepository>(store: &S, id: &str, reset: PasswordReset) -> Result<()> {
    check_password(&reset.new_password)?;
    if store.get_admin(id)?.is_none() {
        return Err(Error::not_found("Admin", id));
    }

    let hash = hash_password(&reset.new_password)?;
    store.set_password_hash(id, &hash)?;
    tracing::info!(id, "Admin password reset");
    Ok(())
}

/// Check credentials and stamp the login
pub fn login<S: AdminRepository>(store: &S, credentials: Credentials) -> Result<Admin> {
    let email = normalize_email(&credentials.email);
    if email.is_empty() || credentials.password.is_empty() {
        return Err(Error::validation("email and password are required"));
    }

    let Some(mut admin) = store.find_admin_by_email(&email)? else {
        tracing::debug!(email = %email, "Login for unknown account");
        return Err(Error::unauthorized(INVALID_CREDENTIALS));
    };
    if !admin.is_active {
        return Err(Error::unauthorized("account is inactive"));
    }
    if !verify_password(&credentials.password, &admin.password_hash)? {
        tracing::debug!(id = %admin.id, "Login with wrong password");
        return Err(Error::unauthorized(INVALID_CREDENTIALS));
    }

    let now = Utc::now();
    store.record_login(&admin.id, now)?;
    admin.last_login = Some(now);

    tracing::info!(id = %admin.id, role = %admin.role, "Admin logged in");
    Ok(admin)
}
