//! Command execution
//!
//! Each command maps to one or two marketplace calls and yields a JSON value
//! for the caller to print.

use api_client::ApiClient;
use chrono::Utc;
use marketplace::{
    DateRange, NewBooking, NewReview, Registration, SearchFilters, auth, bookings, earnings, reviews,
    wishlist,
};
use serde_json::{Value, json};
use session::Navigator;
use session::constants::SIGN_UP_ROUTE;

use crate::cli::Command;

pub async fn run(client: &ApiClient, command: Command) -> marketplace::Result<Value> {
    let output = match command {
        Command::Login { email, password } => {
            let user = auth::login(client, &email, &password).await?;
            json!({ "signed_in": true, "user": user })
        }
        Command::Signup {
            name,
            email,
            password,
            role,
        } => {
            let registration = Registration {
                name,
                email,
                password,
                role,
            };
            let user = auth::register(client, &registration).await?;
            json!({ "signed_in": true, "user": user })
        }
        Command::Logout => {
            auth::logout(client).await?;
            json!({ "signed_in": false })
        }
        Command::Whoami => whoami(client).await?,
        Command::Listings(filters) => {
            to_value(marketplace::accommodations::search(client, &SearchFilters::from(filters)).await?)
        }
        Command::Listing { id } => {
            let listing = marketplace::accommodations::get(client, &id).await?;
            let reviews = reviews::list_for(client, &id).await?;
            json!({
                "listing": listing,
                "average_rating": reviews::average_rating(&reviews),
                "reviews": reviews.len(),
            })
        }
        Command::Book {
            listing,
            check_in,
            check_out,
            guests,
        } => {
            let booking = NewBooking {
                accommodation_id: listing,
                stay: DateRange::new(check_in, check_out)?,
                guests,
                message: None,
            };
            to_value(bookings::create(client, &booking).await?)
        }
        Command::Bookings => to_value(bookings::list_mine(client).await?),
        Command::Cancel { id } => to_value(bookings::cancel(client, &id).await?),
        Command::Reviews { listing } => to_value(reviews::list_for(client, &listing).await?),
        Command::Review {
            listing,
            rating,
            comment,
        } => {
            let review = NewReview {
                accommodation_id: listing,
                rating,
                comment,
            };
            to_value(reviews::create(client, &review).await?)
        }
        Command::Wishlist => to_value(wishlist::list(client).await?),
        Command::Save { listing } => {
            wishlist::add(client, &listing).await?;
            json!({ "saved": listing })
        }
        Command::Unsave { listing } => {
            wishlist::remove(client, &listing).await?;
            json!({ "removed": listing })
        }
        Command::Earnings => {
            let summary = earnings::summary(client).await?;
            let transactions = earnings::transactions(client).await?;
            json!({ "summary": summary, "transactions": transactions })
        }
    };
    Ok(output)
}

/// Report the signed-in user. Demo sessions answer from the cached profile
/// without contacting the server.
async fn whoami(client: &ApiClient) -> marketplace::Result<Value> {
    let credentials = client.token_store().get();
    let Some(token) = credentials.access_token() else {
        return Ok(json!({ "signed_in": false }));
    };

    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    let expires_in = session::decode_claims(token)
        .ok()
        .and_then(|claims| claims.expires_in(now));

    let mock_mode = client.is_mock_mode();
    let user = if mock_mode {
        auth::cached_user(client)
    } else {
        Some(auth::me(client).await?)
    };

    Ok(json!({
        "signed_in": true,
        "mock_mode": mock_mode,
        "expires_in_secs": expires_in,
        "user": user,
    }))
}

/// Whether the session was ended while running a command away from the
/// sign-up route.
pub fn session_ended(route: &str, navigator: &dyn Navigator) -> bool {
    route != SIGN_UP_ROUTE && navigator.current_path() == SIGN_UP_ROUTE
}

fn to_value<T: serde::Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use api_client::ReqwestTransport;
    use axum::body::Body;
    use axum::http::StatusCode;
    use session::{FileTokenStore, Location, MemoryTokenStore, TokenStore};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Backend that signs in `ada@uni.ac.uk`, lists bookings for `Bearer A1`,
    /// and rejects everything else with 401.
    async fn start_backend() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let app = axum::Router::new().fallback(|request: axum::http::Request<Body>| async move {
                let auth = request
                    .headers()
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                match (request.method().as_str(), request.uri().path()) {
                    ("POST", "/api/auth/login") => (
                        StatusCode::OK,
                        axum::Json(json!({
                            "access_token": "A1",
                            "refresh_token": "R1",
                            "user": {"id": 1, "name": "Ada", "role": "student"}
                        })),
                    ),
                    ("GET", "/api/bookings") if auth == "Bearer A1" => (
                        StatusCode::OK,
                        axum::Json(json!({"data": [{
                            "id": 3, "check_in": "2026-09-01", "check_out": "2027-06-30", "status": "pending"
                        }]})),
                    ),
                    _ => (
                        StatusCode::UNAUTHORIZED,
                        axum::Json(json!({"message": "Authentication required"})),
                    ),
                }
            });
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        format!("http://{addr}/api")
    }

    fn client(base_url: &str, store: Arc<dyn TokenStore>, location: Arc<Location>) -> ApiClient {
        ApiClient::builder()
            .base_url(base_url)
            .timeout(Duration::from_secs(5))
            .token_store(store)
            .navigator(location)
            .transport(Arc::new(ReqwestTransport::default()))
            .build()
            .unwrap()
    }

    fn command(line: &str) -> Command {
        Cli::try_parse_from(std::iter::once("campus-stay").chain(line.split_whitespace()))
            .unwrap()
            .command
    }

    #[tokio::test]
    async fn login_then_bookings_share_the_session_file() {
        let base_url = start_backend().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let login = command("login ada@uni.ac.uk hunter22");
        let store = Arc::new(FileTokenStore::load(path.clone()).unwrap());
        let location = Arc::new(Location::new(login.route()));
        let output = run(&client(&base_url, store, location), login).await.unwrap();
        assert_eq!(output["user"]["name"], "Ada");

        // A later invocation reads the persisted tokens
        let bookings = command("bookings");
        let store = Arc::new(FileTokenStore::load(path).unwrap());
        let location = Arc::new(Location::new(bookings.route()));
        let output = run(&client(&base_url, store, location.clone()), bookings)
            .await
            .unwrap();
        assert_eq!(output[0]["status"], "pending");
        assert!(!session_ended("/bookings", location.as_ref()));
    }

    #[tokio::test]
    async fn expired_session_is_reported() {
        let base_url = start_backend().await;
        let store = Arc::new(MemoryTokenStore::with_tokens("stale", None));
        let wishlist = command("wishlist");
        let route = wishlist.route();
        let location = Arc::new(Location::new(route));

        let err = run(&client(&base_url, store.clone(), location.clone()), wishlist)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Authentication required");
        assert!(store.get().is_empty());
        assert!(session_ended(route, location.as_ref()));
    }

    #[tokio::test]
    async fn whoami_signed_out() {
        let store = Arc::new(MemoryTokenStore::new());
        let client = client("http://127.0.0.1:9/api", store, Arc::new(Location::default()));
        let output = run(&client, Command::Whoami).await.unwrap();
        assert_eq!(output, json!({"signed_in": false}));
    }

    #[tokio::test]
    async fn whoami_in_mock_mode_stays_offline() {
        let store = Arc::new(MemoryTokenStore::with_tokens("mock-token-demo", None));
        store.set_user(json!({"id": 7, "name": "Demo Host"})).unwrap();
        let client = client("http://127.0.0.1:9/api", store, Arc::new(Location::default()));

        let output = run(&client, Command::Whoami).await.unwrap();
        assert_eq!(output["mock_mode"], true);
        assert_eq!(output["user"]["name"], "Demo Host");
        assert_eq!(output["expires_in_secs"], Value::Null);
    }

    #[test]
    fn signing_up_is_not_an_ended_session() {
        let location = Location::new("/signup");
        assert!(!session_ended("/signup", &location));
    }
}
