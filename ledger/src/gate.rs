use common::payment::PaymentType;
use db::models::entitlement::EntitlementRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    CreateAppeal,
    AddVehicle(&'a str),
    ChangeVehicle(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceeds against the monthly allowance or the first vehicle slot.
    AllowFree,
    /// Already paid for, or asks for nothing new.
    Allow,
    RequirePayment(PaymentType),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::RequirePayment(_))
    }
}

/// Pure decision over a snapshot that has already had its monthly reset applied.
pub fn decide(record: &EntitlementRecord, action: Action<'_>) -> Decision {
    match action {
        Action::CreateAppeal => {
            if record.free_appeals_used == 0 {
                Decision::AllowFree
            } else if record.paid_appeal_credits > 0 {
                Decision::Allow
            } else {
                Decision::RequirePayment(PaymentType::AdditionalAppeal)
            }
        }
        Action::AddVehicle(plate) | Action::ChangeVehicle(plate) => {
            match record.vehicle_registration.as_deref() {
                None => Decision::AllowFree,
                Some(current) if current == plate => Decision::Allow,
                Some(_) if record.vehicle_change_credits > 0 => Decision::Allow,
                Some(_) => Decision::RequirePayment(PaymentType::VehicleAddition),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record() -> EntitlementRecord {
        EntitlementRecord::new(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn appeal_quota() {
        let mut r = record();
        assert_eq!(decide(&r, Action::CreateAppeal), Decision::AllowFree);

        r.free_appeals_used = 1;
        assert_eq!(
            decide(&r, Action::CreateAppeal),
            Decision::RequirePayment(PaymentType::AdditionalAppeal)
        );

        r.paid_appeal_credits = 1;
        assert_eq!(decide(&r, Action::CreateAppeal), Decision::Allow);
    }

    #[test]
    fn vehicle_slot() {
        let mut r = record();
        assert_eq!(decide(&r, Action::AddVehicle("AB12CDE")), Decision::AllowFree);

        r.vehicle_registration = Some("AB12CDE".to_string());
        assert_eq!(decide(&r, Action::AddVehicle("AB12CDE")), Decision::Allow);
        assert_eq!(
            decide(&r, Action::ChangeVehicle("XY99ZZZ")),
            Decision::RequirePayment(PaymentType::VehicleAddition)
        );
        assert!(!decide(&r, Action::AddVehicle("XY99ZZZ")).is_allowed());

        r.vehicle_change_credits = 1;
        assert_eq!(decide(&r, Action::ChangeVehicle("XY99ZZZ")), Decision::Allow);
    }
}
