use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("store not found")]
    NotFound,
    #[error("unresolvable IANA timezone '{0}'")]
    BadTimezone(String),
    #[error("local time '{0}' does not exist or is ambiguous on the DST transition")]
    AmbiguousLocalTime(String),
}
