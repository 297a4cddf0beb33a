use serde::Deserialize;

/// Client-to-server frames. The envelope is a flat JSON object whose `type`
/// field selects the variant.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum WsInboundEvent {
    /// "typing.signal": keystroke heartbeat or explicit stop.
    #[serde(rename = "typing.signal")]
    Typing { is_typing: bool },
    /// "conversation.read": acknowledge everything in the conversation.
    #[serde(rename = "conversation.read")]
    Read,
}
