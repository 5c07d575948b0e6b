use analysis::{analyze, extract_ticket, prose_outside_json};
use common::{
    error::{AppError, Res},
    vision::{TICKET_PROMPT, VisionOracle},
};

use crate::dtos::analysis::{
    AnalysisResponse, ChatMessage, ChatRequest, ChatResponse, TicketResponse,
};

/// Largest driver statement accepted for analysis.
const MAX_TEXT_CHARS: usize = 10_000;

pub(crate) fn require_text(text: &str) -> Res<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("text is required".to_string()));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::BadRequest(format!(
            "text must be at most {} characters",
            MAX_TEXT_CHARS
        )));
    }
    Ok(text)
}

pub fn analyze_text(text: &str) -> Res<AnalysisResponse> {
    Ok(analyze(require_text(text)?).into())
}

/// Sends the photo to the oracle and normalises whatever comes back.
/// Oracle failures degrade to sentinel values.
pub async fn read_ticket(
    oracle: &dyn VisionOracle,
    image: &[u8],
    mime_type: &str,
) -> Res<TicketResponse> {
    if !mime_type.starts_with("image/") {
        return Err(AppError::BadRequest(
            "Ticket upload must be an image".to_string(),
        ));
    }
    if image.is_empty() {
        return Err(AppError::BadRequest("Ticket image is empty".to_string()));
    }

    let reply = match oracle.describe(image, mime_type, TICKET_PROMPT).await {
        Ok(reply) => reply,
        Err(e) => {
            log::warn!("Vision oracle failed, using sentinel ticket: {}", e);
            String::new()
        }
    };

    let ticket = extract_ticket(&reply);
    Ok(TicketResponse {
        detected: ticket.is_detected(),
        analysis: analyze(&prose_outside_json(&reply)).into(),
        ticket,
    })
}

pub fn chat(req: ChatRequest) -> Res<ChatResponse> {
    let last = req
        .messages
        .last()
        .ok_or_else(|| AppError::BadRequest("messages must not be empty".to_string()))?;
    if last.role != "user" {
        return Err(AppError::BadRequest(
            "The last message must come from the user".to_string(),
        ));
    }

    let analysis = analyze_text(&last.content)?;
    Ok(ChatResponse {
        message: ChatMessage {
            role: "assistant".to_string(),
            content: analysis.summary.clone(),
        },
        analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis::TicketDetails;
    use async_trait::async_trait;

    struct DownOracle;

    #[async_trait]
    impl VisionOracle for DownOracle {
        async fn describe(&self, _: &[u8], _: &str, _: &str) -> Res<String> {
            Err(AppError::Internal("timeout".to_string()))
        }
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(matches!(analyze_text("   "), Err(AppError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn oracle_failure_degrades_to_sentinels() {
        let res = read_ticket(&DownOracle, b"\x89PNG", "image/png").await.unwrap();
        assert!(!res.detected);
        assert_eq!(res.ticket, TicketDetails::not_detected());
        assert_eq!(res.analysis.success_probability, 45);
    }

    struct JsonOnlyOracle;

    #[async_trait]
    impl VisionOracle for JsonOnlyOracle {
        async fn describe(&self, _: &[u8], _: &str, _: &str) -> Res<String> {
            Ok(r#"{"numberPlate": "AB12 CDE", "pcnNumber": "WK1", "amount": "70",
                  "date": "01/10/2026", "location": "High Street", "contravention": "Parked",
                  "council": "Camden", "paymentDueDate": "29/10/2026"}"#
                .to_string())
        }
    }

    #[actix_web::test]
    async fn ticket_field_names_are_not_analysed() {
        let res = read_ticket(&JsonOnlyOracle, b"\xFF\xD8", "image/jpeg").await.unwrap();
        assert!(res.detected);
        assert_eq!(res.analysis.issues, vec!["general-review"]);
        assert_eq!(res.analysis.success_probability, 45);
    }

    #[actix_web::test]
    async fn non_images_are_rejected() {
        assert!(read_ticket(&DownOracle, b"hello", "text/plain").await.is_err());
    }

    #[test]
    fn chat_needs_a_trailing_user_message() {
        let msg = |role: &str| ChatMessage {
            role: role.to_string(),
            content: "the meter was broken".to_string(),
        };
        assert!(chat(ChatRequest { messages: vec![] }).is_err());
        assert!(chat(ChatRequest { messages: vec![msg("user"), msg("assistant")] }).is_err());

        let reply = chat(ChatRequest { messages: vec![msg("user")] }).unwrap();
        assert_eq!(reply.message.role, "assistant");
        assert_eq!(reply.analysis.issues, vec!["payment-system"]);
        assert_eq!(reply.analysis.success_probability, 55);
    }
}
