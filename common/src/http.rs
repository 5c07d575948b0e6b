use actix_web::{HttpResponse, Responder, http::header, web};
use serde::Serialize;

use super::error::{AppError, Res};

pub struct Success;
impl Success {
    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Created().json(body))
    }
    /// 201 with a `Location` header pointing at the new resource.
    pub fn created_at<T: Serialize>(location: String, body: T) -> Res<impl Responder> {
        Result::Ok(
            HttpResponse::Created()
                .insert_header((header::LOCATION, location))
                .json(body),
        )
    }
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Ok().json(body))
    }
}

/// Malformed JSON bodies become `400 {"error": ...}` like every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _| AppError::BadRequest(err.to_string()).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _| AppError::BadRequest(err.to_string()).into())
}
