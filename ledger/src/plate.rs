use common::error::{AppError, Res};

/// Uppercases and strips whitespace, then checks for 2 to 8 ASCII alphanumerics.
pub fn normalize_plate(raw: &str) -> Res<String> {
    let plate: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if !(2..=8).contains(&plate.len()) || !plate.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::BadRequest(format!(
            "Invalid vehicle registration: {}",
            raw.trim()
        )));
    }
    Ok(plate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_case_and_spacing() {
        assert_eq!(normalize_plate("ab12 cde").unwrap(), "AB12CDE");
        assert_eq!(normalize_plate("  Ab12\tCdE ").unwrap(), "AB12CDE");
    }

    #[test]
    fn rejects_malformed_plates() {
        assert!(normalize_plate("").is_err());
        assert!(normalize_plate("A").is_err());
        assert!(normalize_plate("AB12-CDE").is_err());
        assert!(normalize_plate("ABCDEFGHI").is_err());
        assert!(normalize_plate("ÄB12CDE").is_err());
    }
}
