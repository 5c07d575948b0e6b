use actix_web::web::{self};

pub mod routes {
    pub mod analysis;
    pub mod appeal;
    pub mod profile;
    pub mod usage;
    pub mod vehicle;
}

mod services {
    pub(crate) mod analysis;
    pub(crate) mod appeal;
    pub(crate) mod profile;
    pub(crate) mod usage;
    pub(crate) mod vehicle;
}

mod dtos {
    pub(crate) mod analysis;
    pub(crate) mod appeal;
    pub(crate) mod profile;
    pub(crate) mod usage;
    pub(crate) mod vehicle;
}

/// Largest accepted ticket photo.
pub const MAX_TICKET_BYTES: usize = 10 * 1024 * 1024;

pub fn mount_analysis() -> actix_web::Scope {
    web::scope("/analysis")
        .app_data(web::PayloadConfig::new(MAX_TICKET_BYTES))
        .service(routes::analysis::post_analysis)
        .service(routes::analysis::post_ticket)
}
pub fn mount_chat() -> actix_web::Scope {
    web::scope("/chat").service(routes::analysis::post_chat)
}
pub fn mount_usage() -> actix_web::Scope {
    web::scope("/usage").service(routes::usage::get_usage)
}
pub fn mount_profile() -> actix_web::Scope {
    web::scope("/profile")
        .service(routes::profile::get_profile)
        .service(routes::profile::post_profile)
}
pub fn mount_appeals() -> actix_web::Scope {
    web::scope("/appeals")
        .service(routes::appeal::get_appeals)
        .service(routes::appeal::post_appeal)
        .service(routes::appeal::post_letter)
        .service(routes::appeal::post_status)
}
pub fn mount_vehicles() -> actix_web::Scope {
    web::scope("/vehicles")
        .service(routes::vehicle::get_vehicles)
        .service(routes::vehicle::post_vehicle)
        .service(routes::vehicle::delete_vehicle)
}
