use serde::{Deserialize, Serialize};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub code: String,
}

/// Minimal profile summary returned alongside the session token.
#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub monitoring_status: String,
    pub device_count: i32,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: ProfileSummary,
}

/// Request body for the forgot-password flow.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Generic acknowledgement body.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SetupCheckQuery {
    pub token: String,
}

/// Setup-check result. The provisioning fields are present only while the
/// account still has to enroll an authenticator.
#[derive(Debug, Serialize)]
pub struct SetupCheckResponse {
    pub mfa_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otpauth_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_png_base64: Option<String>,
}

/// Request body for finalizing account setup (activation).
#[derive(Debug, Deserialize)]
pub struct FinalizeSetupRequest {
    pub token: String,
    pub code: String,
    pub password: String,
}

/// Request body for completing a plain password reset.
#[derive(Debug, Deserialize)]
pub struct CompleteResetRequest {
    pub token: String,
    pub password: String,
}

/// Request body for an authenticated password change.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub code: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_check_omits_provisioning_when_absent() {
        let response = SetupCheckResponse {
            mfa_required: false,
            otpauth_url: None,
            qr_png_base64: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"mfa_required":false}"#);
    }

    #[test]
    fn login_response_serialization() {
        let response = LoginResponse {
            token: "abc".into(),
            user: ProfileSummary {
                name: "Uma".into(),
                monitoring_status: "active".into(),
                device_count: 3,
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"token\":\"abc\""));
        assert!(json.contains("\"device_count\":3"));
    }
}
