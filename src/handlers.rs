// Request handlers — one read-modify-write cycle per form post
//
// Every mutating route loads the document, applies a single change, persists
// it when something actually changed and redirects back to the index. Missing
// form fields behave like empty ones: nothing happens, the redirect still does.

use crate::constants::HISTORY_PREVIEW_LIMIT;
use crate::errors::AppError;
use crate::server::AppState;
use crate::state::Document;
use crate::templates::{IndexContext, TemplateEngine, INDEX_TEMPLATE};
use axum::extract::{Form, State};
use axum::response::{Html, Redirect};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FillerForm {
    pub word: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplacementForm {
    pub src: String,
    pub dst: String,
}

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let document = {
        let _guard = state.write_lock.lock().await;
        let store = state.store.clone();
        run_blocking(move || store.read()).await?
    };
    let ctx = IndexContext::new(state.store.path(), &document, HISTORY_PREVIEW_LIMIT);
    let html = state.templates.render(INDEX_TEMPLATE, ctx.to_value())?;
    Ok(Html(html))
}

pub async fn add_filler(
    State(state): State<Arc<AppState>>,
    form: Option<Form<FillerForm>>,
) -> Result<Redirect, AppError> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    apply_change(&state, "add filler", move |doc| doc.add_filler(&form.word)).await
}

pub async fn delete_filler(
    State(state): State<Arc<AppState>>,
    form: Option<Form<FillerForm>>,
) -> Result<Redirect, AppError> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    apply_change(&state, "delete filler", move |doc| doc.remove_filler(&form.word)).await
}

pub async fn upsert_replacement(
    State(state): State<Arc<AppState>>,
    form: Option<Form<ReplacementForm>>,
) -> Result<Redirect, AppError> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    apply_change(&state, "upsert replacement", move |doc| {
        doc.upsert_replacement(&form.src, &form.dst)
    })
    .await
}

pub async fn delete_replacement(
    State(state): State<Arc<AppState>>,
    form: Option<Form<ReplacementForm>>,
) -> Result<Redirect, AppError> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    apply_change(&state, "delete replacement", move |doc| {
        doc.remove_replacement(&form.src)
    })
    .await
}

pub async fn clear_history(State(state): State<Arc<AppState>>) -> Result<Redirect, AppError> {
    apply_change(&state, "clear history", |doc| {
        let dropped = doc.clear_history();
        info!("Dropping {} history entries", dropped);
        true
    })
    .await
}

async fn apply_change<F>(state: &AppState, action: &str, change: F) -> Result<Redirect, AppError>
where
    F: FnOnce(&mut Document) -> bool + Send + 'static,
{
    let _guard = state.write_lock.lock().await;
    let store = state.store.clone();
    let saved = run_blocking(move || {
        let mut document = store.read()?;
        if !change(&mut document) {
            return Ok(false);
        }
        store.write(&document)?;
        Ok(true)
    })
    .await?;
    if saved {
        info!("{} saved", action);
    } else {
        debug!("{} left the state unchanged", action);
    }
    Ok(Redirect::to("/"))
}

/// Runs store file I/O on the blocking pool.
async fn run_blocking<F, R>(task: F) -> Result<R, AppError>
where
    F: FnOnce() -> Result<R, AppError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| AppError::Other(format!("blocking task failed: {}", err)))?
}
