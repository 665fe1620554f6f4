//! Browser form handlers

use std::collections::HashMap;

use axum::{
    extract::{rejection::FormRejection, State},
    response::Html,
    Form,
};

use crate::inference;
use crate::models::FieldBag;
use crate::{views, AppState};

/// Render the empty input form
pub async fn form(State(state): State<AppState>) -> Html<String> {
    Html(views::render_form(&state.store, &FieldBag::default(), None))
}

/// Classify a form submission; on failure re-render the form with the
/// submitted values and the error message
pub async fn submit(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Html<String> {
    let bag = match form {
        Ok(Form(fields)) => FieldBag::from(fields),
        Err(e) => {
            tracing::warn!("Rejected form submission: {}", e);
            let message = format!("Invalid form submission: {}", e.body_text());
            return Html(views::render_form(&state.store, &FieldBag::default(), Some(&message)));
        }
    };

    match inference::analyze(&state.store, &bag) {
        Ok(result) => Html(views::render_result(&result)),
        Err(e) => {
            tracing::warn!("Form analysis failed: {}", e);
            Html(views::render_form(&state.store, &bag, Some(&e.to_string())))
        }
    }
}
