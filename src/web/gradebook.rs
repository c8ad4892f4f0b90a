//! Grade book handlers.

use crate::models::gradebook::student_from_form;
use crate::session::{SESSION_COOKIE, Session};
use crate::web::AppState;
use crate::web::db_test::HTML_CONTENT_TYPE;
use crate::web::render::gradebook_page;
use axum::Form;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::HashMap;
use tracing::{debug, info};

pub async fn show(State(state): State<AppState>, jar: CookieJar) -> Response {
    let session = state.sessions.load(session_id(&jar)).await;
    respond(jar, &session)
}

pub async fn submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut session = state.sessions.load(session_id(&jar)).await;

    match student_from_form(&form) {
        Some(student) => {
            info!(session_id = %session.id(), name = %student.name, "Student added");
            session.add_student(student);
        }
        None => debug!(session_id = %session.id(), "Submission without a name ignored"),
    }

    respond(jar, &session)
}

fn respond(jar: CookieJar, session: &Session) -> Response {
    let jar = if session.is_new() {
        jar.add(session_cookie(session.id().to_string()))
    } else {
        jar
    };

    (
        jar,
        [(header::CONTENT_TYPE, HTML_CONTENT_TYPE)],
        gradebook_page(session.students()),
    )
        .into_response()
}

/// Cookie handing a new session id to the client.
pub fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Session id sent by the client, if any.
pub fn session_id(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
}
