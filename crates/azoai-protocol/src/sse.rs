use bytes::Bytes;

/// Incremental parser for the upstream's SSE byte stream.
///
/// Only `data:` lines contribute to the output; `event:`, `id:`, `retry:`
/// and comment lines are discarded. Multiple `data:` lines belonging to one
/// event are joined with a newline. Lines may end in LF, CR or CRLF; a blank
/// line terminates the pending event. Bytes arriving mid-line are retained
/// until the line completes, so any bytewise split of a stream yields the
/// same events.
#[derive(Debug, Default)]
pub struct SseLineParser {
    buffer: String,
    data_lines: Vec<String>,
    saw_data: bool,
}

impl SseLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, chunk: &Bytes) -> Vec<String> {
        match std::str::from_utf8(chunk) {
            Ok(text) => self.push_str(text),
            Err(_) => Vec::new(),
        }
    }

    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut payloads = Vec::new();

        loop {
            let Some(pos) = self.buffer.find(['\n', '\r']) else {
                break;
            };
            // A bare CR at the buffer end may be half of a CRLF pair; wait
            // for the next read before treating it as a terminator.
            if self.buffer.as_bytes()[pos] == b'\r' && pos + 1 == self.buffer.len() {
                break;
            }

            let line = self.buffer[..pos].to_string();
            let skip = if self.buffer.as_bytes()[pos] == b'\r'
                && self.buffer.as_bytes().get(pos + 1) == Some(&b'\n')
            {
                2
            } else {
                1
            };
            self.buffer.drain(..pos + skip);
            self.accept_line(&line, &mut payloads);
        }

        payloads
    }

    /// Flush at end of stream: an unterminated trailing line still counts.
    pub fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            let line = line.trim_end_matches('\r').to_string();
            self.accept_line(&line, &mut payloads);
        }
        self.flush_event(&mut payloads);
        payloads
    }

    fn accept_line(&mut self, line: &str, payloads: &mut Vec<String>) {
        if line.is_empty() {
            self.flush_event(payloads);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data_lines
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
            self.saw_data = true;
            return;
        }
        if line == "data" {
            self.data_lines.push(String::new());
            self.saw_data = true;
        }
        // Any other field (event:, id:, retry:) is dropped.
    }

    fn flush_event(&mut self, payloads: &mut Vec<String>) {
        if !self.saw_data {
            return;
        }
        payloads.push(self.data_lines.join("\n"));
        self.data_lines.clear();
        self.saw_data = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &str) -> Vec<String> {
        let mut parser = SseLineParser::new();
        let mut out = parser.push_str(input);
        out.extend(parser.finish());
        out
    }

    #[test]
    fn single_event() {
        assert_eq!(parse_all("data: {\"a\":1}\n\n"), vec!["{\"a\":1}"]);
    }

    #[test]
    fn crlf_and_cr_terminators() {
        assert_eq!(parse_all("data: one\r\n\r\n"), vec!["one"]);
        assert_eq!(parse_all("data: one\r\rdata: two\r\r"), vec!["one", "two"]);
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        assert_eq!(parse_all("data: a\ndata: b\n\n"), vec!["a\nb"]);
    }

    #[test]
    fn other_fields_and_comments_are_dropped() {
        let input = ": ping\nevent: message\nid: 7\nretry: 100\ndata: x\n\n";
        assert_eq!(parse_all(input), vec!["x"]);
    }

    #[test]
    fn event_without_data_emits_nothing() {
        assert!(parse_all("event: message\n\n").is_empty());
    }

    #[test]
    fn done_sentinel_is_just_a_payload() {
        assert_eq!(parse_all("data: [DONE]\n\n"), vec!["[DONE]"]);
    }

    #[test]
    fn unterminated_trailing_event_flushes_on_finish() {
        assert_eq!(parse_all("data: tail"), vec!["tail"]);
    }

    #[test]
    fn bytewise_split_yields_identical_events() {
        let stream = "data: {\"n\":1}\r\n\r\ndata: ab\ndata: cd\n\ndata: [DONE]\n\n";
        let whole = parse_all(stream);

        for split in 1..stream.len() {
            let mut parser = SseLineParser::new();
            let mut out = parser.push_str(&stream[..split]);
            out.extend(parser.push_str(&stream[split..]));
            out.extend(parser.finish());
            assert_eq!(out, whole, "split at {split}");
        }
    }

    #[test]
    fn one_byte_at_a_time() {
        let stream = "data: hel\ndata: lo\n\ndata: [DONE]\n\n";
        let mut parser = SseLineParser::new();
        let mut out = Vec::new();
        for ch in stream.chars() {
            out.extend(parser.push_str(&ch.to_string()));
        }
        out.extend(parser.finish());
        assert_eq!(out, vec!["hel\nlo", "[DONE]"]);
    }
}
