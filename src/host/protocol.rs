//! Wire types and framing for the native-messaging stdio protocol.
//!
//! Frames are JSON payloads behind a 4-byte little-endian length
//! prefix, the framing the browser uses for native-messaging hosts.
//! The core sends [`HostRequest`] frames and receives [`ShimMessage`]
//! frames; requests and replies are correlated by UUID.

use serde::{Deserialize, Serialize};
use tokio_util::codec::LengthDelimitedCodec;
use uuid::Uuid;

/// Upper bound on a single frame. The browser rejects larger
/// native-messaging payloads, and nothing in this protocol comes close.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// A lookup request sent to the browser shim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    /// Which window is focused right now?
    FocusedWindow { id: Uuid },
    /// The tabs of a window, in tab-strip order.
    WindowTabs { id: Uuid, window_id: i64 },
    /// Display title of a tab group.
    GroupTitle { id: Uuid, group_id: i64 },
    /// Email of the profile user.
    CurrentUser { id: Uuid },
}

impl HostRequest {
    /// Correlation id of this request.
    pub fn id(&self) -> Uuid {
        match *self {
            Self::FocusedWindow { id }
            | Self::WindowTabs { id, .. }
            | Self::GroupTitle { id, .. }
            | Self::CurrentUser { id } => id,
        }
    }
}

/// A frame received from the browser shim.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShimMessage {
    /// The focused window changed. Also delivered once right after the
    /// shim connects, for the startup baseline.
    FocusChanged { window_id: i64 },
    /// Answer to an earlier [`HostRequest`].
    Reply(Reply),
}

/// Reply payload: exactly one of `result` and `error` is set.
#[derive(Debug, Serialize, Deserialize)]
pub struct Reply {
    /// Correlation id of the request being answered.
    pub id: Uuid,
    /// Call-specific result value on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Shim-side failure description, e.g. "no window with id 5".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Codec for the length-prefixed framing, one instance per direction.
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .little_endian()
        .length_field_length(4)
        .max_frame_length(MAX_FRAME_BYTES)
        .new_codec()
}
