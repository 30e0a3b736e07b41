//! Page and redirect responses.
//!
//! Pages are JSON documents: the view name, the drained flash messages and a
//! view-specific context.

use actix_web::{http::header, HttpResponse};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use validator::ValidationErrors;

use crate::messages::{FlashMessage, Messages};

#[derive(Debug, Serialize)]
pub struct Page<'a> {
    pub view: &'a str,
    pub messages: Vec<FlashMessage>,
    pub context: Value,
}

/// Renders `view` with `context`, consuming the pending messages.
pub fn render(view: &str, messages: &Messages, context: Value) -> HttpResponse {
    HttpResponse::Ok().json(Page {
        view,
        messages: messages.take(),
        context,
    })
}

pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

/// Field name to the messages of its failed checks.
pub fn form_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({})", error.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
