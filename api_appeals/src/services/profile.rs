use common::{
    error::{AppError, Res},
    jwt::JwtClaims,
};
use db::dtos::entitlement::ProfileUpsert;
use ledger::Ledger;

use crate::dtos::profile::{ProfileRequest, ProfileResponse};

fn clean(field: &str, value: Option<String>, max_len: usize) -> Res<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim().to_string();
    if value.is_empty() || value.chars().count() > max_len {
        return Err(AppError::BadRequest(format!("Invalid {}", field)));
    }
    Ok(Some(value))
}

pub async fn update_profile(
    ledger: &Ledger,
    claims: &JwtClaims,
    req: ProfileRequest,
) -> Res<ProfileResponse> {
    let email = clean("email", req.email, 254)?;
    if email.as_deref().is_some_and(|e| !e.contains('@')) {
        return Err(AppError::BadRequest("Invalid email".to_string()));
    }
    let display_name = clean("display_name", req.display_name, 100)?;

    let record = ledger
        .upsert_profile(ProfileUpsert {
            user_id: claims.user_id,
            email: email.or_else(|| claims.email.clone()),
            display_name,
        })
        .await?;
    Ok(record.into())
}
