pub mod auth;
pub mod users;

pub use auth::{
    AppleLoginRequest, AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    RegisterRequest, ResetPasswordRequest, ResetTokenClaims, TokenClaims, UpdateProfileRequest,
    RESET_ACTION,
};
pub use users::PublicUser;
