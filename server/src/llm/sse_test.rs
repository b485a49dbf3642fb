use super::*;

#[test]
fn single_event_in_one_read() {
    let mut dec = SseDecoder::new();
    assert_eq!(dec.push(b"data: {\"a\":1}\n\n"), vec!["{\"a\":1}".to_string()]);
    assert_eq!(dec.finish(), None);
}

#[test]
fn event_split_across_reads() {
    let mut dec = SseDecoder::new();
    assert!(dec.push(b"data: hel").is_empty());
    assert!(dec.push(b"lo\n").is_empty());
    assert_eq!(dec.push(b"\n"), vec!["hello".to_string()]);
}

#[test]
fn multiple_events_in_one_read() {
    let mut dec = SseDecoder::new();
    let payloads = dec.push(b"data: one\n\ndata: two\n\ndata: thr");
    assert_eq!(payloads, vec!["one".to_string(), "two".to_string()]);
    assert_eq!(dec.push(b"ee\n\n"), vec!["three".to_string()]);
}

#[test]
fn crlf_separators() {
    let mut dec = SseDecoder::new();
    assert_eq!(dec.push(b"data: one\r\n\r\ndata: two\r\n\r\n"), vec!["one".to_string(), "two".to_string()]);
}

#[test]
fn multi_line_data_is_joined() {
    let mut dec = SseDecoder::new();
    assert_eq!(dec.push(b"data: a\ndata: b\n\n"), vec!["a\nb".to_string()]);
}

#[test]
fn comments_and_other_fields_ignored() {
    let mut dec = SseDecoder::new();
    let payloads = dec.push(b": keepalive\n\nevent: message\nid: 7\ndata: x\n\n");
    assert_eq!(payloads, vec!["x".to_string()]);
}

#[test]
fn multibyte_character_split_across_reads() {
    let bytes = "data: caf\u{e9} \u{1F600}\n\n".as_bytes();
    // Split inside the four-byte emoji.
    let split = bytes.len() - 4;
    let mut dec = SseDecoder::new();
    assert!(dec.push(&bytes[..split]).is_empty());
    assert_eq!(dec.push(&bytes[split..]), vec!["caf\u{e9} \u{1F600}".to_string()]);
}

#[test]
fn finish_flushes_unterminated_event() {
    let mut dec = SseDecoder::new();
    assert!(dec.push(b"data: tail").is_empty());
    assert_eq!(dec.finish(), Some("tail".to_string()));
    assert_eq!(dec.finish(), None);
}

#[test]
fn data_without_space_after_colon() {
    let mut dec = SseDecoder::new();
    assert_eq!(dec.push(b"data:tight\n\n"), vec!["tight".to_string()]);
}
