use std::sync::Arc;

use bson::oid::ObjectId;

use shelf_authz::{Claims, JwtKeys, PasswordHasher, Role};

use crate::error::{FieldErrors, ServiceError, ServiceResult};

use super::{
    models::{CreateUser, LoginRequest, TokenResponse, UpdateUser, User, UserResponse},
    store::UserStore,
};

pub(crate) const EMAIL_TAKEN: &str = "An account with that email already exists";
pub(crate) const USERNAME_TAKEN: &str = "Username already taken";
const NOT_FOUND: &str = "User not found";

/// User accounts, credentials and token issuance.
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    keys: Arc<JwtKeys>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, keys: Arc<JwtKeys>) -> Self {
        Self {
            store,
            hasher,
            keys,
        }
    }

    pub fn keys(&self) -> Arc<JwtKeys> {
        self.keys.clone()
    }

    /// Self-registration. The requested role is ignored.
    pub async fn register(&self, input: CreateUser) -> ServiceResult<UserResponse> {
        self.insert(input, Role::Reader).await
    }

    /// Admin-side creation; honors the requested role.
    pub async fn create(&self, input: CreateUser) -> ServiceResult<UserResponse> {
        let role = input.role.unwrap_or_default();
        self.insert(input, role).await
    }

    async fn insert(&self, input: CreateUser, role: Role) -> ServiceResult<UserResponse> {
        let mut errors = FieldErrors::new();
        errors.require("username", &input.username);
        errors.require("email", &input.email);
        errors.require("password", &input.password);
        errors.into_result("Invalid user")?;

        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::AlreadyExists(EMAIL_TAKEN.to_string()));
        }
        if self.store.find_by_username(&username).await?.is_some() {
            return Err(ServiceError::AlreadyExists(USERNAME_TAKEN.to_string()));
        }

        let now = shelf_db::now();
        let user = User {
            id: ObjectId::new(),
            username,
            email,
            password: self.hasher.hash(&input.password).await?,
            role,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&user).await?;

        tracing::info!(user = %user.email, role = %user.role, "user created");
        Ok(user.into())
    }

    /// Check credentials and issue a bearer token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, input: LoginRequest) -> ServiceResult<TokenResponse> {
        let Some(user) = self.store.find_by_email(input.email.trim()).await? else {
            tracing::info!(email = %input.email, "login for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.hasher.verify(&input.password, &user.password).await? {
            tracing::info!(user = %user.email, "login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self
            .keys
            .issue(&user.id.to_hex(), &user.email, user.role)?;
        Ok(TokenResponse { token })
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<UserResponse>> {
        let users = self.store.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get(&self, email: &str, actor: &Claims) -> ServiceResult<UserResponse> {
        Ok(self.find_for(email, actor).await?.into())
    }

    pub async fn update(
        &self,
        email: &str,
        input: UpdateUser,
        actor: &Claims,
    ) -> ServiceResult<UserResponse> {
        let mut user = self.find_for(email, actor).await?;

        if let Some(role) = input.role {
            if role != user.role && !actor.is_admin() {
                return Err(ServiceError::Forbidden(
                    "Only admins can change roles".to_string(),
                ));
            }
            user.role = role;
        }

        if let Some(new_email) = non_empty(input.email) {
            if new_email != user.email {
                if self.store.find_by_email(&new_email).await?.is_some() {
                    return Err(ServiceError::AlreadyExists(EMAIL_TAKEN.to_string()));
                }
                user.email = new_email;
            }
        }

        if let Some(username) = non_empty(input.username) {
            if username != user.username {
                if self.store.find_by_username(&username).await?.is_some() {
                    return Err(ServiceError::AlreadyExists(USERNAME_TAKEN.to_string()));
                }
                user.username = username;
            }
        }

        if let Some(password) = non_empty(input.password) {
            user.password = self.hasher.hash(&password).await?;
        }

        user.updated_at = shelf_db::now();
        if !self.store.replace(&user).await? {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }

        tracing::info!(user = %user.email, by = %actor.email, "user updated");
        Ok(user.into())
    }

    pub async fn delete(&self, email: &str) -> ServiceResult<()> {
        if !self.store.delete_by_email(email).await? {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }
        tracing::info!(user = %email, "user deleted");
        Ok(())
    }

    /// Load the account at `email` if `actor` owns it or is an admin.
    ///
    /// Ownership is decided by id: the email claim goes stale as soon as the
    /// account's email changes. Readers get 403 for missing accounts too.
    async fn find_for(&self, email: &str, actor: &Claims) -> ServiceResult<User> {
        match self.store.find_by_email(email).await? {
            Some(user) if actor.is_admin() || user.id.to_hex() == actor.id => Ok(user),
            None if actor.is_admin() => Err(ServiceError::NotFound(NOT_FOUND.to_string())),
            _ => Err(ServiceError::Forbidden(
                "Forbidden: insufficient permissions".to_string(),
            )),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
