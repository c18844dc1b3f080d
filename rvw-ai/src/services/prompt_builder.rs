//! Request construction for one batch
//!
//! The system instruction is fixed; the user payload is a heading line plus
//! the batch as a JSON array of `{"product", "comments"}` objects. Persian
//! text is embedded verbatim (serde_json never escapes non-ASCII).

use crate::models::InputRecord;
use crate::types::ServiceRequest;
use serde_json::{json, Value};

/// Analysis instruction, including the mandatory output shape
pub const SYSTEM_INSTRUCTION: &str = concat!(
    "تو یک تحلیلگر حرفه‌ای نظرات مشتریان هستی. ",
    "لیستی از محصولات و نظرات آن‌ها داده می‌شود. ",
    "برای هر محصول یک پاراگراف کوتاه به زبان فارسی بنویس ",
    "(۴ تا ۶ جمله). فقط خروجی JSON زیر را بده:\n",
    "{ \"results\": { \"نام محصول\": \"تحلیل کوتاه\" } }",
);

/// First line of the user payload
pub const PAYLOAD_HEADING: &str = "لیست محصولات و نظرات:";

/// Build the service request for a batch
pub fn build_request(batch: &[InputRecord]) -> ServiceRequest {
    ServiceRequest {
        system: SYSTEM_INSTRUCTION.to_string(),
        user: format!("{}\n{}", PAYLOAD_HEADING, batch_payload(batch)),
    }
}

/// Batch serialized as a compact JSON array
pub fn batch_payload(batch: &[InputRecord]) -> String {
    Value::Array(
        batch
            .iter()
            .map(|record| json!({"product": record.identifier, "comments": record.comments}))
            .collect(),
    )
    .to_string()
}
