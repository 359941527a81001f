//! DTOs for the storage REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ports::BucketInfo;

#[derive(Debug, Deserialize)]
pub(super) struct BucketDto {
    pub(super) name: String,
    #[serde(default)]
    pub(super) public: bool,
}

impl From<BucketDto> for BucketInfo {
    fn from(value: BucketDto) -> Self {
        Self {
            name: value.name,
            public: value.public,
        }
    }
}

/// Upload acknowledgement. `Key` is prefixed with the bucket name.
#[derive(Debug, Deserialize)]
pub(super) struct UploadResponseDto {
    #[serde(rename = "Key")]
    pub(super) key: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RemoveObjectsDto<'a> {
    pub(super) prefixes: &'a [String],
}

/// Error envelope. `statusCode` arrives as a string or a number depending on
/// the service version.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(rename = "statusCode", default)]
    pub(super) status_code: Option<Value>,
    #[serde(default)]
    pub(super) error: Option<String>,
    #[serde(default)]
    pub(super) message: Option<String>,
}

impl ErrorBodyDto {
    pub(super) fn status_code(&self) -> Option<u16> {
        match self.status_code.as_ref()? {
            Value::Number(number) => number.as_u64().and_then(|code| u16::try_from(code).ok()),
            Value::String(text) => text.parse().ok(),
            _ => None,
        }
    }

    pub(super) fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|message| !message.trim().is_empty())
    }
}
