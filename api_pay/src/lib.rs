use actix_web::web::{self};

pub mod routes {
    pub mod pay;
}

mod services {
    pub(crate) mod pay;
}

mod dtos {
    pub(crate) mod pay;
}

pub fn mount_pay() -> actix_web::Scope {
    web::scope("/pay")
        .service(routes::pay::post_intent)
        .service(routes::pay::get_payments)
}
pub fn mount_webhook() -> actix_web::Scope {
    web::scope("/pay").service(routes::pay::post_webhook)
}
