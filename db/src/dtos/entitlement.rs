use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ProfileUpsert {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Which allowance an appeal draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppealCharge {
    /// Guarded by `free_appeals_used = 0`.
    Free,
    /// Guarded by `paid_appeal_credits > 0`; consumes one credit.
    Paid,
}

/// How a plate write is authorised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleWrite {
    /// Only when no plate is stored or the stored plate is the same.
    VacantOrSame,
    /// Replaces any stored plate and consumes one vehicle change credit.
    UseCredit,
}
