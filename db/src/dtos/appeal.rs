use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewAppeal {
    pub user_id: Uuid,
    pub number_plate: String,
    pub ticket_value: i64,
    pub source_text: String,
    pub issues: Vec<String>,
    pub success_probability: i16,
}
