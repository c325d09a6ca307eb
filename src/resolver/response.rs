//! Decoding of decryption-service replies.
//!
//! The service answers file uploads with JSON wrapped in `<textarea>` tags
//! (an iframe-upload artifact) and plain JSON everywhere else. Two shapes are
//! recognised:
//!
//! ```text
//! { "success": { "links": ["http://...", ...] } }
//! { "form_errors": { "dlcfile": ["message", ...] } }
//! ```

use crate::error::ResolutionError;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
struct SuccessBody {
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DecryptResponse {
    Success {
        success: SuccessBody,
    },
    Failure {
        form_errors: BTreeMap<String, Vec<String>>,
    },
}

fn markup_wrapper() -> &'static Regex {
    static WRAPPER: OnceLock<Regex> = OnceLock::new();
    WRAPPER.get_or_init(|| Regex::new(r"</?textarea>").expect("static regex"))
}

/// Parse a response body into its ordered link list.
pub fn parse_response(body: &str) -> Result<Vec<String>, ResolutionError> {
    let clean = markup_wrapper().replace_all(body, "");

    let value: serde_json::Value = serde_json::from_str(clean.trim())
        .map_err(|e| ResolutionError::Malformed(format!("invalid JSON: {}", e)))?;

    let response: DecryptResponse = serde_json::from_value(value)
        .map_err(|_| ResolutionError::Malformed("unrecognised response shape".to_string()))?;

    match response {
        DecryptResponse::Success { success } => Ok(success.links),
        DecryptResponse::Failure { form_errors } => {
            // Report the first field that carries messages
            match form_errors
                .into_iter()
                .find(|(_, messages)| !messages.is_empty())
            {
                Some((field, messages)) => Err(ResolutionError::Validation { field, messages }),
                None => Err(ResolutionError::Malformed(
                    "error response without messages".to_string(),
                )),
            }
        }
    }
}
