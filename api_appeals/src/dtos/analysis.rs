use analysis::{Analysis, ScoreComponent, TicketDetails};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
}

/// The free artifact. Never carries a letter.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub issues: Vec<String>,
    pub success_probability: u8,
    pub factors: Vec<ScoreComponent>,
    pub summary: String,
}

impl From<Analysis> for AnalysisResponse {
    fn from(analysis: Analysis) -> Self {
        AnalysisResponse {
            issues: analysis.issues,
            success_probability: analysis.probability,
            factors: analysis.components,
            summary: analysis.summary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub ticket: TicketDetails,
    pub detected: bool,
    pub analysis: AnalysisResponse,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub analysis: AnalysisResponse,
}
