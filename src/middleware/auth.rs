use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::middleware::session::AuthSession;

/// Gate for protected pages: requests without a logged-in session are
/// redirected to the login entry point instead of reaching the handler.
///
/// This check is read-only; it never creates or mutates a session.
pub async fn require_login(session: Session, request: Request, next: Next) -> Response {
    match AuthSession::new(&session).user().await {
        Ok(Some(user)) if user.is_logged_in => next.run(request).await,
        _ => Redirect::temporary("/auth/login").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;
    use crate::model::user::UserIdentity;

    /// Gated route plus helper routes that mutate the session, sharing one
    /// session store across cloned routers.
    fn gated_app() -> Router {
        Router::new()
            .route("/dashboard", get(|| async { "shell" }))
            .route_layer(middleware::from_fn(require_login))
            .route(
                "/test/login",
                get(|session: Session| async move {
                    let identity = UserIdentity {
                        is_logged_in: true,
                        access_token: Some("token-abc".to_string()),
                        avatar_url: None,
                    };
                    AuthSession::new(&session).set_user(&identity).await.unwrap();
                }),
            )
            .route(
                "/test/logout",
                get(|session: Session| async move {
                    AuthSession::new(&session).logout().await.unwrap();
                }),
            )
            .layer(SessionManagerLayer::new(MemoryStore::default()))
    }

    fn request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie.to_string());
        }
        builder.body(Body::empty()).unwrap()
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        let raw = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("response should carry a session cookie")
            .to_str()
            .unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .expect("redirect should carry a location")
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn anonymous_request_is_redirected_to_login() {
        let response = gated_app()
            .oneshot(request("/dashboard", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/auth/login");
    }

    #[tokio::test]
    async fn logged_in_request_reaches_the_handler() {
        let app = gated_app();

        let login = app
            .clone()
            .oneshot(request("/test/login", None))
            .await
            .unwrap();
        let cookie = session_cookie(&login);

        let response = app
            .oneshot(request("/dashboard", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_regates_the_protected_route() {
        let app = gated_app();

        let login = app
            .clone()
            .oneshot(request("/test/login", None))
            .await
            .unwrap();
        let cookie = session_cookie(&login);

        let before = app
            .clone()
            .oneshot(request("/dashboard", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(before.status(), StatusCode::OK);

        app.clone()
            .oneshot(request("/test/logout", Some(&cookie)))
            .await
            .unwrap();

        let after = app
            .oneshot(request("/dashboard", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(after.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&after), "/auth/login");
    }
}
