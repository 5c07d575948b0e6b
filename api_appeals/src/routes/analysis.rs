use std::sync::Arc;

use actix_web::{
    HttpRequest, Responder, post,
    web::{self},
};
use common::{error::Res, http::Success, vision::VisionOracle};

use crate::{
    dtos::analysis::{AnalysisRequest, ChatRequest},
    services,
};

/// Free compliance analysis of a driver's account. Open to anonymous callers;
/// never returns a letter and never touches the ledger.
///
/// # Arguments
///
/// * `req` - The text to analyse.
///
/// # Returns
///
/// A `Result` containing the matched issues, success probability and summary,
/// or an `AppError` when the text is missing.
#[post("")]
pub async fn post_analysis(req: web::Json<AnalysisRequest>) -> Res<impl Responder> {
    let analysis = services::analysis::analyze_text(&req.text)?;
    Success::ok(analysis)
}

/// Reads a ticket photo. The body is the raw image; `Content-Type` must be
/// an image type.
#[post("/ticket")]
pub async fn post_ticket(
    http: HttpRequest,
    body: web::Bytes,
    oracle: web::Data<Arc<dyn VisionOracle>>,
) -> Res<impl Responder> {
    let mime_type = http
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let ticket = services::analysis::read_ticket(oracle.get_ref().as_ref(), &body, &mime_type).await?;
    Success::ok(ticket)
}

#[post("")]
pub async fn post_chat(req: web::Json<ChatRequest>) -> Res<impl Responder> {
    let reply = services::analysis::chat(req.into_inner())?;
    Success::ok(reply)
}
