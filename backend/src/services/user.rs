//! User service for authentication and account management
//!
//! Password hashing and verification run on the blocking thread pool.
//! Store errors convert into [`ApiError`] through `?`.

use crate::auth::{AuthUser, JwtService, PasswordService};
use crate::error::ApiError;
use crate::repositories::{NewUser, UpdateUserProfile, UserStore};
use bandsync_shared::errors::AuthError;
use bandsync_shared::models::{User, UserWithMemberships};
use bandsync_shared::types::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
};
use bandsync_shared::validation::{
    validate_email, validate_not_empty_if_provided, validate_password, validate_phone_number,
    validate_profile_image_url, validate_required, validate_timezone, ValidationError,
};
use tracing::{info, warn};

pub const PASSWORD_UPDATED: &str = "Password updated successfully";
pub const RESET_LINK_SENT: &str =
    "If a user with that email exists, a password reset link will be sent";
pub const PASSWORD_RESET: &str = "Password has been reset successfully";

/// User service for authentication operations
pub struct UserService;

impl UserService {
    /// Register a new user and issue their first token
    pub async fn register(
        store: &dyn UserStore,
        jwt: &JwtService,
        passwords: &PasswordService,
        req: RegisterRequest,
    ) -> Result<AuthResponse, ApiError> {
        Self::validate_registration(&req)?;

        if store.find_by_email(&req.email).await?.is_some() {
            return Err(ApiError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = passwords
            .hash_async(req.password)
            .await
            .map_err(ApiError::Internal)?;

        // A concurrent registration can still win the race; the unique
        // constraint then surfaces as the same Conflict.
        let user = store
            .create_user(NewUser {
                email: req.email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
                phone_number: req.phone_number,
            })
            .await?;

        let token = jwt.issue(user.id).map_err(ApiError::Internal)?;
        info!(user_id = %user.id, "User registered");

        Ok(AuthResponse {
            success: true,
            token,
            user: User::from(user),
        })
    }

    /// Login with email and password
    ///
    /// Unknown emails and wrong passwords produce the same error.
    pub async fn login(
        store: &dyn UserStore,
        jwt: &JwtService,
        passwords: &PasswordService,
        req: LoginRequest,
    ) -> Result<AuthResponse, ApiError> {
        ValidationError::check("email", validate_email(&req.email))?;
        ValidationError::check("password", validate_required(&req.password))?;

        let invalid = || ApiError::Unauthorized(AuthError::InvalidCredentials.to_string());

        let Some(user) = store.find_by_email(&req.email).await? else {
            // Both failure paths pay for one Argon2 verification
            passwords
                .verify_dummy_async(req.password)
                .await
                .map_err(ApiError::Internal)?;
            info!("Login failed: unknown email");
            return Err(invalid());
        };

        let valid = passwords
            .verify_async(req.password, user.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?;

        if !valid {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(invalid());
        }

        let token = jwt.issue(user.id).map_err(ApiError::Internal)?;
        info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse {
            success: true,
            token,
            user: User::from(user),
        })
    }

    /// Current user's profile with band memberships
    pub async fn get_current_user(
        store: &dyn UserStore,
        auth: &AuthUser,
    ) -> Result<UserWithMemberships, ApiError> {
        let user = store
            .find_by_id(auth.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let band_memberships = store.memberships_for_user(auth.user_id).await?;

        Ok(UserWithMemberships {
            user: User::from(user),
            band_memberships,
        })
    }

    /// Update non-credential profile fields
    pub async fn update_profile(
        store: &dyn UserStore,
        auth: &AuthUser,
        req: UpdateProfileRequest,
    ) -> Result<User, ApiError> {
        Self::validate_profile_update(&req)?;

        let updates = UpdateUserProfile {
            first_name: req.first_name,
            last_name: req.last_name,
            phone_number: req.phone_number,
            timezone: req.timezone,
            profile_image_url: req.profile_image_url,
        };

        let user = store.update_profile(auth.user_id, updates).await?;
        Ok(User::from(user))
    }

    /// Replace the password after checking the current one
    ///
    /// Tokens issued before the change stay valid until they expire.
    pub async fn change_password(
        store: &dyn UserStore,
        passwords: &PasswordService,
        auth: &AuthUser,
        req: ChangePasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        ValidationError::check("currentPassword", validate_required(&req.current_password))?;
        ValidationError::check("newPassword", validate_password(&req.new_password))?;

        let user = store
            .find_by_id(auth.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let valid = passwords
            .verify_async(req.current_password, user.password_hash)
            .await
            .map_err(ApiError::Internal)?;

        if !valid {
            warn!(user_id = %auth.user_id, "Password change rejected: wrong current password");
            return Err(ApiError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = passwords
            .hash_async(req.new_password)
            .await
            .map_err(ApiError::Internal)?;
        store.update_password_hash(auth.user_id, &new_hash).await?;

        info!(user_id = %auth.user_id, "Password changed");
        Ok(MessageResponse::new(PASSWORD_UPDATED))
    }

    /// Acknowledge a reset request. No token is generated and no email is sent.
    pub fn forgot_password(req: &ForgotPasswordRequest) -> Result<MessageResponse, ApiError> {
        ValidationError::check("email", validate_email(&req.email))?;
        Ok(MessageResponse::new(RESET_LINK_SENT))
    }

    /// Acknowledge a reset. The token is not checked and nothing is stored.
    pub fn reset_password(req: &ResetPasswordRequest) -> Result<MessageResponse, ApiError> {
        ValidationError::check("token", validate_required(&req.token))?;
        ValidationError::check("password", validate_password(&req.password))?;
        Ok(MessageResponse::new(PASSWORD_RESET))
    }

    fn validate_registration(req: &RegisterRequest) -> Result<(), ValidationError> {
        ValidationError::check("email", validate_email(&req.email))?;
        ValidationError::check("password", validate_password(&req.password))?;
        ValidationError::check("firstName", validate_required(&req.first_name))?;
        ValidationError::check("lastName", validate_required(&req.last_name))?;
        if let Some(ref phone) = req.phone_number {
            ValidationError::check("phoneNumber", validate_phone_number(phone))?;
        }
        Ok(())
    }

    fn validate_profile_update(req: &UpdateProfileRequest) -> Result<(), ValidationError> {
        if let Some(ref first_name) = req.first_name {
            ValidationError::check("firstName", validate_not_empty_if_provided(first_name))?;
        }
        if let Some(ref last_name) = req.last_name {
            ValidationError::check("lastName", validate_not_empty_if_provided(last_name))?;
        }
        if let Some(ref phone) = req.phone_number {
            ValidationError::check("phoneNumber", validate_phone_number(phone))?;
        }
        if let Some(ref timezone) = req.timezone {
            ValidationError::check("timezone", validate_timezone(timezone))?;
        }
        if let Some(ref url) = req.profile_image_url {
            ValidationError::check("profileImageUrl", validate_profile_image_url(url))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashingConfig;
    use crate::repositories::InMemoryUserStore;

    fn services() -> (InMemoryUserStore, JwtService, PasswordService) {
        let passwords = PasswordService::new(&HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        (
            InMemoryUserStore::new(),
            JwtService::new("service-test-secret", 3600),
            passwords,
        )
    }

    fn registration(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: None,
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    async fn auth_user_for(store: &InMemoryUserStore, email: &str) -> AuthUser {
        let user = store.find_by_email(email).await.unwrap().unwrap();
        AuthUser {
            user_id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }

    #[tokio::test]
    async fn test_register_issues_token_for_new_user() {
        let (store, jwt, passwords) = services();

        let resp = UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(jwt.verify(&resp.token).unwrap(), resp.user.id);
        assert_eq!(resp.user.email, "a@x.com");

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
    }

    #[tokio::test]
    async fn test_register_same_email_twice_conflicts() {
        let (store, jwt, passwords) = services();
        UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
            .await
            .unwrap();

        let err = UserService::register(&store, &jwt, &passwords, registration("a@x.com", "other12"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_missing_first_name() {
        let (store, jwt, passwords) = services();
        let mut req = registration("a@x.com", "secret1");
        req.first_name = " ".to_string();

        let err = UserService::register(&store, &jwt, &passwords, req)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: Some(ref f), .. } if f == "firstName"));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_login_with_registered_credentials() {
        let (store, jwt, passwords) = services();
        UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
            .await
            .unwrap();

        let resp = UserService::login(&store, &jwt, &passwords, login("a@x.com", "secret1"))
            .await
            .unwrap();
        assert!(resp.success);
        assert_eq!(jwt.verify(&resp.token).unwrap(), resp.user.id);
    }

    #[tokio::test]
    async fn test_login_errors_do_not_reveal_account_existence() {
        let (store, jwt, passwords) = services();
        UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
            .await
            .unwrap();

        let wrong_password = UserService::login(&store, &jwt, &passwords, login("a@x.com", "nope123"))
            .await
            .unwrap_err();
        let unknown_email = UserService::login(&store, &jwt, &passwords, login("b@x.com", "secret1"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, ApiError::Unauthorized(ref m) if m == "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_change_password_requires_current_password() {
        let (store, jwt, passwords) = services();
        UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
            .await
            .unwrap();
        let auth = auth_user_for(&store, "a@x.com").await;

        let err = UserService::change_password(
            &store,
            &passwords,
            &auth,
            ChangePasswordRequest {
                current_password: "wrong-one".to_string(),
                new_password: "newsecret".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Current password is incorrect"));

        // The old password still works
        assert!(UserService::login(&store, &jwt, &passwords, login("a@x.com", "secret1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_change_password_replaces_credentials() {
        let (store, jwt, passwords) = services();
        let registered =
            UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
                .await
                .unwrap();
        let auth = auth_user_for(&store, "a@x.com").await;

        let resp = UserService::change_password(
            &store,
            &passwords,
            &auth,
            ChangePasswordRequest {
                current_password: "secret1".to_string(),
                new_password: "newsecret".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.message, PASSWORD_UPDATED);

        assert!(UserService::login(&store, &jwt, &passwords, login("a@x.com", "secret1"))
            .await
            .is_err());
        assert!(UserService::login(&store, &jwt, &passwords, login("a@x.com", "newsecret"))
            .await
            .is_ok());
        // Existing tokens are not revoked
        assert!(jwt.verify(&registered.token).is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_changes_only_given_fields() {
        let (store, jwt, passwords) = services();
        UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
            .await
            .unwrap();
        let auth = auth_user_for(&store, "a@x.com").await;

        let user = UserService::update_profile(
            &store,
            &auth,
            UpdateProfileRequest {
                timezone: Some("America/Chicago".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.timezone.as_deref(), Some("America/Chicago"));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_bad_url() {
        let (store, jwt, passwords) = services();
        UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
            .await
            .unwrap();
        let auth = auth_user_for(&store, "a@x.com").await;

        let err = UserService::update_profile(
            &store,
            &auth,
            UpdateProfileRequest {
                profile_image_url: Some("not a url".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_change_password_short_new_password_names_field() {
        let (store, jwt, passwords) = services();
        UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
            .await
            .unwrap();
        let auth = auth_user_for(&store, "a@x.com").await;

        let err = UserService::change_password(
            &store,
            &passwords,
            &auth,
            ChangePasswordRequest {
                current_password: "secret1".to_string(),
                new_password: "abc".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Validation { ref message, .. }
                if message == "New password must be at least 6 characters long"
        ));
    }

    #[tokio::test]
    async fn test_update_profile_blank_name_message() {
        let (store, jwt, passwords) = services();
        UserService::register(&store, &jwt, &passwords, registration("a@x.com", "secret1"))
            .await
            .unwrap();
        let auth = auth_user_for(&store, "a@x.com").await;

        let err = UserService::update_profile(
            &store,
            &auth,
            UpdateProfileRequest {
                last_name: Some("".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Validation { ref message, .. }
                if message == "Last name cannot be empty if provided"
        ));
    }

    #[tokio::test]
    async fn test_get_current_user_for_vanished_user_is_not_found() {
        let (store, _, _) = services();
        let auth = AuthUser {
            user_id: uuid::Uuid::new_v4(),
            email: "gone@x.com".to_string(),
            first_name: "Gone".to_string(),
            last_name: "User".to_string(),
        };

        let err = UserService::get_current_user(&store, &auth).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_reset_stubs_only_acknowledge() {
        let forgot = UserService::forgot_password(&ForgotPasswordRequest {
            email: "a@x.com".to_string(),
        })
        .unwrap();
        assert_eq!(forgot.message, RESET_LINK_SENT);

        let reset = UserService::reset_password(&ResetPasswordRequest {
            token: "anything".to_string(),
            password: "secret1".to_string(),
        })
        .unwrap();
        assert_eq!(reset.message, PASSWORD_RESET);

        assert!(UserService::reset_password(&ResetPasswordRequest {
            token: "".to_string(),
            password: "secret1".to_string(),
        })
        .is_err());
    }
}
