use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for every text field the oracle failed to supply.
pub const NOT_DETECTED: &str = "Not detected";

/// Normalised ticket fields. `amount` is in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetails {
    pub number_plate: String,
    pub pcn_number: String,
    pub amount: i64,
    pub date: String,
    pub location: String,
    pub contravention: String,
    pub council: String,
    pub payment_due_date: String,
}

impl TicketDetails {
    pub fn not_detected() -> Self {
        TicketDetails {
            number_plate: NOT_DETECTED.to_string(),
            pcn_number: NOT_DETECTED.to_string(),
            amount: 0,
            date: NOT_DETECTED.to_string(),
            location: NOT_DETECTED.to_string(),
            contravention: NOT_DETECTED.to_string(),
            council: NOT_DETECTED.to_string(),
            payment_due_date: NOT_DETECTED.to_string(),
        }
    }

    pub fn is_detected(&self) -> bool {
        *self != Self::not_detected()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicket {
    number_plate: Value,
    pcn_number: Value,
    amount: Value,
    date: Value,
    location: Value,
    contravention: Value,
    council: Value,
    payment_due_date: Value,
}

/// Byte range of the first balanced `{...}` span, ignoring braces inside strings.
fn json_span(raw: &str) -> Option<(usize, usize)> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + offset + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Returns the first balanced `{...}` span, ignoring braces inside strings.
pub fn first_json_object(raw: &str) -> Option<&str> {
    json_span(raw).map(|(start, end)| &raw[start..end])
}

/// The oracle's free text with the first structured object cut out.
pub fn prose_outside_json(raw: &str) -> String {
    match json_span(raw) {
        Some((start, end)) => format!("{} {}", &raw[..start], &raw[end..])
            .trim()
            .to_string(),
        None => raw.trim().to_string(),
    }
}

fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Pounds as written on the notice ("£70", "70.00", 70) to pence.
fn amount_in_minor_units(value: &Value) -> i64 {
    let pounds = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect::<String>()
            .parse::<f64>()
            .ok(),
        _ => None,
    };
    pounds
        .filter(|p| p.is_finite() && *p >= 0.0)
        .map(|p| (p * 100.0).round() as i64)
        .unwrap_or(0)
}

fn parse_ticket(raw: &str) -> Option<TicketDetails> {
    let json = first_json_object(raw)?;
    let ticket: RawTicket = serde_json::from_str(json).ok()?;
    Some(TicketDetails {
        number_plate: text_field(&ticket.number_plate)?,
        pcn_number: text_field(&ticket.pcn_number)?,
        amount: amount_in_minor_units(&ticket.amount),
        date: text_field(&ticket.date)?,
        location: text_field(&ticket.location)?,
        contravention: text_field(&ticket.contravention)?,
        council: text_field(&ticket.council)?,
        payment_due_date: text_field(&ticket.payment_due_date)?,
    })
}

/// Best-effort normalisation of the oracle's reply. Never fails: anything
/// unparseable yields [`TicketDetails::not_detected`].
pub fn extract_ticket(raw: &str) -> TicketDetails {
    parse_ticket(raw).unwrap_or_else(|| {
        log::warn!("Ticket extraction fell back to sentinel values");
        TicketDetails::not_detected()
    })
}
