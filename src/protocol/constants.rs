//! Protocol constants for the Service Bus REST surface.

/// REST API version appended to every entity URL.
pub const API_VERSION: &str = "2016-07";

/// Query parameter carrying [`API_VERSION`].
pub const API_VERSION_PARAM: &str = "api-version";

/// Query parameter carrying the server-side long-poll wait, in seconds.
pub const TIMEOUT_PARAM: &str = "timeout";

/// Scheme prefix of the `Authorization` header value.
pub const SAS_SCHEME: &str = "SharedAccessSignature";

/// Lifetime of a generated token, in seconds.
pub const TOKEN_TTL_SECS: u64 = 300;

/// Header names used by the protocol.
pub mod headers {
    use http::HeaderName;

    /// JSON metadata block of a received message.
    pub const BROKER_PROPERTIES: HeaderName = HeaderName::from_static("brokerproperties");
    /// Lock-resource URL of a peek-locked message.
    pub const LOCATION: HeaderName = http::header::LOCATION;
    /// Shared access signature.
    pub const AUTHORIZATION: HeaderName = http::header::AUTHORIZATION;
    /// Always `application/json`.
    pub const ACCEPT: HeaderName = http::header::ACCEPT;

    /// Response headers never treated as custom properties in capture-all mode.
    ///
    /// Entries are lower-case.
    pub const RESERVED: &[&str] = &[
        "brokerproperties",
        "content-length",
        "transfer-encoding",
        "connection",
        "keep-alive",
        "strict-transport-security",
        "content-type",
        "location",
        "server",
        "date",
    ];
}

/// Status codes with protocol meaning.
pub mod status {
    /// Message delivered or operation accepted.
    pub const OK: u16 = 200;
    /// Message enqueued, or a locked message was returned.
    pub const CREATED: u16 = 201;
    /// Long poll ended without a message.
    pub const NO_CONTENT: u16 = 204;
}
