use std::str::FromStr;

use actix_web::{HttpResponse, guard, web};
use futures::future::try_join_all;
use promptlift_ai_provider::{
    AiProviderError,
    models::{Level, Provider},
};
use promptlift_git_provider::{flatten_with_retry, models::RepoCoordinate};
use promptlift_prompt::{enhance_code_message, enhance_prompt_messages, generate_code_message};
use serde::{Deserialize, Serialize};

use crate::{HEALTH_PATH, error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct EnhancePromptRequest {
    #[serde(alias = "aiType")]
    pub provider: Option<String>,
    pub prompt: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnhancePromptResponse {
    pub enhanced: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateCodeRequest {
    #[serde(alias = "aiType")]
    pub provider: Option<String>,
    pub prompt: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateCodeResponse {
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRepoRequest {
    pub repo_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRepoResponse {
    pub code_base: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceCodeRequest {
    #[serde(alias = "aiType")]
    pub provider: Option<String>,
    pub code_base: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceCodeResponse {
    pub enhanced_code: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/{tail:.*}")
            .guard(guard::Options())
            .to(preflight),
    )
    .route("/api/enhance-prompt", web::post().to(enhance_prompt))
    .route("/api/generate-code", web::post().to(generate_code))
    .route("/api/ingest-repo", web::post().to(ingest_repo))
    .route("/api/enhance-code", web::post().to(enhance_code))
    .route(HEALTH_PATH, web::get().to(health));
}

async fn health() -> &'static str {
    "OK"
}

async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Decompose the prompt three ways and enhance each decomposition.
async fn enhance_prompt(
    state: web::Data<AppState>,
    body: web::Json<EnhancePromptRequest>,
) -> Result<HttpResponse, ApiError> {
    let provider = required(body.provider.as_deref(), "provider")?;
    let prompt = required(body.prompt.as_deref(), "prompt")?;
    let level = required(body.level.as_deref(), "level")?;
    let provider = parse_provider(provider)?;
    let level = parse_level(level)?;

    let messages = enhance_prompt_messages(prompt, level);
    let enhanced = try_join_all(
        messages
            .iter()
            .map(|message| state.dispatcher.dispatch(provider, message)),
    )
    .await?;

    Ok(HttpResponse::Ok().json(EnhancePromptResponse { enhanced }))
}

async fn generate_code(
    state: web::Data<AppState>,
    body: web::Json<GenerateCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    let provider = required(body.provider.as_deref(), "provider")?;
    let prompt = required(body.prompt.as_deref(), "prompt")?;
    let level = required(body.level.as_deref(), "level")?;
    let provider = parse_provider(provider)?;
    let level = parse_level(level)?;

    let code = state
        .dispatcher
        .dispatch(provider, &generate_code_message(prompt, level))
        .await?;

    Ok(HttpResponse::Ok().json(GenerateCodeResponse { code }))
}

async fn ingest_repo(
    state: web::Data<AppState>,
    body: web::Json<IngestRepoRequest>,
) -> Result<HttpResponse, ApiError> {
    let repo_url = required(body.repo_url.as_deref(), "repoUrl")?;
    let coordinate = RepoCoordinate::parse_url(repo_url)?;

    log::info!(
        "Ingesting {coordinate} via {}",
        state.repo_host.provider_name()
    );
    let code_base = flatten_with_retry(
        state.repo_host.as_ref(),
        &coordinate,
        state.ingest_retry_delay,
    )
    .await?;
    log::debug!("Ingested {coordinate}: {} bytes", code_base.len());

    Ok(HttpResponse::Ok().json(IngestRepoResponse { code_base }))
}

async fn enhance_code(
    state: web::Data<AppState>,
    body: web::Json<EnhanceCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    let provider = required(body.provider.as_deref(), "provider")?;
    let code_base = required(body.code_base.as_deref(), "codeBase")?;
    let level = required(body.level.as_deref(), "level")?;
    let provider = parse_provider(provider)?;
    let level = parse_level(level)?;

    let enhanced_code = state
        .dispatcher
        .dispatch(provider, &enhance_code_message(code_base, level))
        .await?;

    Ok(HttpResponse::Ok().json(EnhanceCodeResponse { enhanced_code }))
}

/// Whitespace-only values count as missing.
fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Validation(format!("Missing required field: {name}")))
}

fn parse_provider(value: &str) -> Result<Provider, ApiError> {
    Provider::from_str(value.trim())
        .map_err(|_| AiProviderError::UnsupportedProvider(value.to_string()).into())
}

fn parse_level(value: &str) -> Result<Level, ApiError> {
    Level::from_str(value.trim())
        .map_err(|_| ApiError::Validation(format!("Invalid level: {value}")))
}
