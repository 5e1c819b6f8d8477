//! Read combinators.
//!
//! Every read on the RPC port returns `Result<Option<T>, RpcError>`:
//! `Ok(None)` means the node answered but has nothing yet. Callers pick how
//! absence is reported:
//!
//! - `or_fail` turns absence into `RpcError::NotFound` immediately
//! - `ConvergencePoller::or_timeout` keeps reading until the value appears

use shared_types::RpcError;

pub trait ReadOutcome<T> {
    /// Treat absence as an error naming `what` was missing.
    fn or_fail(self, what: impl FnOnce() -> String) -> Result<T, RpcError>;
}

impl<T> ReadOutcome<T> for Result<Option<T>, RpcError> {
    fn or_fail(self, what: impl FnOnce() -> String) -> Result<T, RpcError> {
        self?.ok_or_else(|| RpcError::not_found(what()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_fail() {
        let present: Result<Option<u8>, RpcError> = Ok(Some(4));
        assert_eq!(present.or_fail(|| "x".into()), Ok(4));

        let absent: Result<Option<u8>, RpcError> = Ok(None);
        let err = absent.or_fail(|| "receipt 0xab".into()).unwrap_err();
        assert_eq!(err.to_string(), "receipt 0xab not found");

        let failed: Result<Option<u8>, RpcError> = Err(RpcError::MemberUnavailable("a".into()));
        assert_eq!(
            failed.or_fail(|| "x".into()),
            Err(RpcError::MemberUnavailable("a".into()))
        );
    }
}
