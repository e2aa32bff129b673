#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Unknown route \"{route}\" for product \"{product}\"")]
    UnknownRoute { product: String, route: String },

    #[error("Route \"{route}\" for product \"{product}\" requires a resource id")]
    MissingId { product: String, route: String },

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Manual login was not completed within {0}s")]
    LoginTimeout(u64),

    #[error("Final URL is not on a Magic Suite domain: {0}")]
    UnexpectedDomain(String),

    #[error("Browser surface error: {0}")]
    Surface(String),

    #[error("Invalid console allow-list pattern: {0}")]
    Pattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
