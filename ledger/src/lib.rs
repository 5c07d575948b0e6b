pub mod clock;
pub mod entitlements;
pub mod gate;
pub mod plate;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entitlements::{Ledger, PaymentOutcome};
pub use gate::{Action, Decision, decide};
pub use plate::normalize_plate;
