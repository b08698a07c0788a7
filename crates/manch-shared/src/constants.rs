/// Application name
pub const APP_NAME: &str = "Manch";

/// MIME types accepted for image uploads
pub const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// MIME types accepted for document uploads
pub const PDF_MIME_TYPES: &[&str] = &["application/pdf"];

/// Maximum image upload size in bytes (5 MiB)
pub const MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024;

/// Hard ceiling enforced by the object store itself (50 MiB)
pub const MAX_OBJECT_SIZE: u64 = 50 * 1024 * 1024;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;
