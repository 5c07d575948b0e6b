use middleware::{extractor::ExtractionMiddleware, guard::RequireUserMiddleware};

pub mod middleware {
    pub mod extractor;
    pub mod guard;
}

/// Decodes any bearer token into request extensions. Never rejects.
pub fn middleware() -> ExtractionMiddleware {
    ExtractionMiddleware::new()
}

/// Rejects requests without valid claims with 401.
pub fn require_user() -> RequireUserMiddleware {
    RequireUserMiddleware::new()
}
