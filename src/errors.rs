use failure::{Context, Error as FailureError, Fail};
use hyper::StatusCode;

#[derive(Clone, Debug, PartialEq, Eq, Fail)]
pub enum Error {
    #[fail(display = "Configuration error")]
    Configuration,
    #[fail(display = "Travel-time provider rejected credentials")]
    OracleAuth,
    #[fail(display = "Travel-time provider timed out")]
    OracleTimeout,
    #[fail(display = "Travel-time provider failed")]
    OracleUnexpected,
    #[fail(display = "Invalid UK postcode format")]
    InvalidPostcode,
    #[fail(display = "Postcode not found")]
    PostcodeNotFound,
    #[fail(display = "Postcode lookup timed out")]
    GeocoderTimeout,
    #[fail(display = "Postcode lookup service unavailable")]
    GeocoderUnavailable,
    #[fail(display = "Zone store error")]
    ZoneStore,
    #[fail(display = "Address is outside the delivery area")]
    NotDeliverable,
    #[fail(display = "Invalid order")]
    InvalidOrder,
    #[fail(display = "Http client error")]
    HttpClient,
    #[fail(display = "Http request timed out")]
    HttpTimeout,
}

impl Error {
    /// Status a request handler should answer with when this kind reaches it.
    pub fn code(&self) -> StatusCode {
        match *self {
            Error::Configuration | Error::OracleAuth | Error::GeocoderUnavailable | Error::ZoneStore => StatusCode::ServiceUnavailable,
            Error::OracleTimeout | Error::GeocoderTimeout | Error::HttpTimeout => StatusCode::GatewayTimeout,
            Error::OracleUnexpected | Error::HttpClient => StatusCode::BadGateway,
            Error::InvalidPostcode | Error::InvalidOrder => StatusCode::BadRequest,
            Error::PostcodeNotFound => StatusCode::NotFound,
            Error::NotDeliverable => StatusCode::UnprocessableEntity,
        }
    }

    /// Transient kinds are worth retrying as a whole evaluation.
    pub fn is_transient(&self) -> bool {
        match *self {
            Error::OracleTimeout | Error::GeocoderTimeout | Error::HttpTimeout => true,
            _ => false,
        }
    }
}

/// Finds the outermost `Error` kind attached anywhere in the cause chain.
pub fn error_kind(e: &FailureError) -> Option<Error> {
    e.iter_chain()
        .filter_map(|cause| {
            if let Some(ctx) = cause.downcast_ref::<Context<Error>>() {
                Some(ctx.get_context().clone())
            } else {
                cause.downcast_ref::<Error>().cloned()
            }
        })
        .nth(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outermost_kind_wins() {
        let inner: FailureError = format_err!("read timed out").context(Error::HttpTimeout).into();
        let outer: FailureError = inner.context(Error::OracleTimeout).into();
        assert_eq!(error_kind(&outer), Some(Error::OracleTimeout));
    }

    #[test]
    fn kind_found_below_plain_context() {
        let inner: FailureError = format_err!("bad key").context(Error::OracleAuth).into();
        let outer: FailureError = inner.context("Evaluating delivery zone failed").into();
        assert_eq!(error_kind(&outer), Some(Error::OracleAuth));
    }

    #[test]
    fn bare_kind_is_recognised() {
        let e: FailureError = Error::NotDeliverable.into();
        assert_eq!(error_kind(&e), Some(Error::NotDeliverable));
        assert_eq!(error_kind(&format_err!("no kind")), None);
    }

    #[test]
    fn timeouts_are_transient_and_auth_is_not() {
        assert!(Error::OracleTimeout.is_transient());
        assert!(!Error::OracleAuth.is_transient());
        assert_eq!(Error::OracleAuth.code(), StatusCode::ServiceUnavailable);
        assert_eq!(Error::OracleTimeout.code(), StatusCode::GatewayTimeout);
    }
}
