//! Mapping of SDK failures onto `StoreError`.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use bucketcache_core::StoreError;

/// Error codes S3 uses for a missing key or bucket.
const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NotFound", "NoSuchBucket"];

/// Classify an SDK failure. Any 404 counts as "not found".
pub(crate) fn classify<E>(target: &str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|response| response.status().as_u16());
    let code = err.code().map(str::to_string);

    let not_found = status == Some(404)
        || code
            .as_deref()
            .is_some_and(|code| NOT_FOUND_CODES.contains(&code));
    if not_found {
        return StoreError::not_found(target);
    }

    match &err {
        SdkError::ServiceError(_) | SdkError::ResponseError(_) => StoreError::Service {
            message: err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
            code,
            status,
        },
        _ => StoreError::Transport(DisplayErrorContext(&err).to_string()),
    }
}
