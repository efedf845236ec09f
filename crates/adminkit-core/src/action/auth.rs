// ── Auth actions ──
//
// Login, session check and logout requests. Executed by `Admin` through
// the configured `AuthProvider`.

use serde::Serialize;
use serde_json::Value;

pub const AUTH_SIGN_IN_ERROR: &str = "ra.auth.sign_in_error";
pub const AUTH_CHECK_ERROR: &str = "ra.auth.auth_check_error";
pub const NOTIFICATION_LOGGED_OUT: &str = "ra.notification.logged_out";

/// Path the user is sent to when the session is gone.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// Provider-specific credentials or check parameters.
    pub payload: Value,
    /// Where the user was (login: where to go back to after success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_params: Option<Value>,
}

/// `USER_LOGIN` request.
pub fn user_login(payload: Value, path_name: Option<&str>) -> AuthRequest {
    AuthRequest {
        payload,
        path_name: path_name.map(str::to_owned),
        route_params: None,
    }
}

/// `USER_CHECK` request.
pub fn user_check(payload: Value, path_name: Option<&str>, route_params: Option<Value>) -> AuthRequest {
    AuthRequest {
        payload,
        path_name: path_name.map(str::to_owned),
        route_params,
    }
}

/// `USER_LOGOUT` payload: where to land once signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

pub fn user_logout(redirect_to: Option<&str>) -> LogoutRequest {
    LogoutRequest {
        redirect_to: redirect_to.map(str::to_owned),
    }
}
