//! 翻译 key、译文工作流与语言包

use actix_web::{HttpResponse, web};
use std::sync::Arc;
use tracing::trace;

use crate::api::extractors::Authenticated;
use crate::errors::Result;
use crate::services::TranslationService;

use super::helpers::{created_response, parse_locale, success_response};
use super::types::{
    BundleQuery, KeyBody, KeyListQuery, MessageResponse, TranslationStatusBody,
    TranslationValueBody, UpdateKeyBody,
};

// ============ Keys ============

pub async fn list_keys(
    actor: Authenticated,
    query: web::Query<KeyListQuery>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    let keys = translations
        .list_keys(&actor, query.category.as_deref())
        .await?;
    Ok(success_response(keys))
}

pub async fn create_key(
    actor: Authenticated,
    body: web::Json<KeyBody>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    let key = translations
        .create_key(&actor, body.into_inner().into())
        .await?;
    Ok(created_response(key))
}

pub async fn get_key(
    actor: Authenticated,
    path: web::Path<String>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    Ok(success_response(translations.get_key(&actor, &path).await?))
}

pub async fn update_key(
    actor: Authenticated,
    path: web::Path<String>,
    body: web::Json<UpdateKeyBody>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let key = translations
        .update_key(&actor, &path, body.category, body.description)
        .await?;
    Ok(success_response(key))
}

pub async fn delete_key(
    actor: Authenticated,
    path: web::Path<String>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    translations.delete_key(&actor, &path).await?;
    Ok(success_response(MessageResponse {
        message: "Translation key deleted".to_string(),
    }))
}

// ============ Values ============

pub async fn get_translation(
    actor: Authenticated,
    path: web::Path<(String, String)>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    let (key_id, locale) = path.into_inner();
    let locale = parse_locale(&locale)?;
    Ok(success_response(
        translations.get_translation(&actor, &key_id, locale).await?,
    ))
}

pub async fn upsert_translation(
    actor: Authenticated,
    path: web::Path<(String, String)>,
    body: web::Json<TranslationValueBody>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    let (key_id, locale) = path.into_inner();
    let locale = parse_locale(&locale)?;
    let translation = translations
        .upsert(&actor, &key_id, locale, &body.value)
        .await?;
    Ok(success_response(translation))
}

pub async fn change_translation_status(
    actor: Authenticated,
    path: web::Path<(String, String)>,
    body: web::Json<TranslationStatusBody>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    let (key_id, locale) = path.into_inner();
    let locale = parse_locale(&locale)?;
    let translation = translations
        .change_status(&actor, &key_id, locale, body.status)
        .await?;
    Ok(success_response(translation))
}

pub async fn translation_history(
    actor: Authenticated,
    path: web::Path<(String, String)>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    let (key_id, locale) = path.into_inner();
    let locale = parse_locale(&locale)?;
    Ok(success_response(
        translations.history(&actor, &key_id, locale).await?,
    ))
}

// ============ Bundles ============

pub async fn get_bundle(
    actor: Authenticated,
    path: web::Path<String>,
    query: web::Query<BundleQuery>,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    let locale = parse_locale(&path)?;
    let bundle = translations
        .get_bundle(&actor, locale, query.fallback)
        .await?;
    trace!("Serving {} bundle with {} entries", locale, bundle.len());
    // Arc<HashMap> 序列化为普通对象
    Ok(success_response(bundle.as_ref()))
}

pub async fn coverage(
    actor: Authenticated,
    translations: web::Data<Arc<TranslationService>>,
) -> Result<HttpResponse> {
    Ok(success_response(translations.coverage(&actor).await?))
}
