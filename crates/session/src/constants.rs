//! Fixed names shared by the session store, the request client, and the
//! marketplace resources.

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the cached user profile
pub const USER_KEY: &str = "user";

/// Refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Route the client is sent to when its session cannot be recovered
pub const SIGN_UP_ROUTE: &str = "/signup";

/// Routes that belong to the authentication flow. A de-authentication while
/// on one of these does not navigate.
pub const AUTH_ROUTES: &[&str] = &["/login", "/signup", "/forgot-password", "/reset-password"];

/// Access tokens issued by the demo backend start with this prefix
pub const MOCK_TOKEN_PREFIX: &str = "mock-token-";
