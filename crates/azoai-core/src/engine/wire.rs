use bytes::Bytes;
use serde::Serialize;

/// Encode one value as a single `data: <json>\n\n` SSE frame.
pub fn sse_json_frame<T: Serialize>(value: &T) -> Option<Bytes> {
    let payload = serde_json::to_vec(value).ok()?;
    let mut data = Vec::with_capacity(payload.len() + 8);
    data.extend_from_slice(b"data: ");
    data.extend_from_slice(&payload);
    data.extend_from_slice(b"\n\n");
    Some(Bytes::from(data))
}

pub fn sse_done_frame() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_terminated_by_a_blank_line() {
        let frame = sse_json_frame(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(&frame[..], b"data: {\"a\":1}\n\n");
        assert_eq!(&sse_done_frame()[..], b"data: [DONE]\n\n");
    }
}
