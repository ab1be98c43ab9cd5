//! JSON body decoding.

use std::io::Read;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::DecodeError;

/// Decode the whole body as JSON into `B`, reading the stream once.
///
/// Field names follow serde: exact, case-sensitive matches unless the body
/// type renames them with `#[serde(rename = "...")]` or `rename_all`.
/// Trailing non-whitespace after the JSON value is an error.
///
/// # Errors
///
/// [`DecodeError`] for read failures, malformed JSON, empty bodies and
/// values that do not fit `B`.
pub fn decode_body<B, R>(reader: R) -> Result<B, DecodeError>
where
    B: DeserializeOwned,
    R: Read,
{
    let target = std::any::type_name::<B>();
    match serde_json::from_reader::<_, B>(reader) {
        Ok(body) => {
            debug!(body_shape = target, "JSON body decoded");
            Ok(body)
        }
        Err(err) => {
            let err = DecodeError::new(target, err);
            warn!(
                body_shape = target,
                kind = %err.kind(),
                line = err.line(),
                column = err.column(),
                "JSON body decode failed"
            );
            Err(err)
        }
    }
}
