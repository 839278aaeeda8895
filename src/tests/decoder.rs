use futures_util::{stream, StreamExt};

use crate::app::AppError;
use crate::search::decoder::{EventReader, FrameDecoder};
use crate::search::event::StreamEvent;
use crate::search::Stage;

const BODY: &str = concat!(
    "event: progress\n",
    "data: {\"stage\":\"query_expansion_start\",\"message\":\"理解中…\"}\n",
    "\n",
    "event: thinking\n",
    "data: {\"thinking_text\":\"用户想找一只橘猫\",\"is_delta\":true}\r\n",
    "\r\n",
    "data: {\"stage\":\"query_expansion_done\",\"expanded_query\":\"橘猫 可爱 🐱\"}\n",
    "data: not json at all\n",
    "data: [1, 2, 3]\n",
    ": keep-alive comment\n",
    "event: progress\n",
    "data: {\"stage\":\"embedding\",\"message\":\"向量化\"}\n",
    "\n",
    "data:{\"stage\":\"complete\",\"results\":[{\"id\":7,\"url\":\"https://x/7.gif\",\"description\":\"橘猫\"}],\"total\":1}\n",
);

fn decode_chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<StreamEvent> {
    let mut decoder = FrameDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(decoder.push(chunk));
    }
    assert_eq!(decoder.finish(), 0);
    events
}

#[test]
fn test_full_body_decodes_expected_events() {
    let events = decode_chunks([BODY.as_bytes()]);

    let stages: Vec<Stage> = events.iter().map(|e| e.stage.clone()).collect();
    assert_eq!(
        stages,
        vec![
            Stage::QueryExpansionStart,
            Stage::Thinking,
            Stage::QueryExpansionDone,
            Stage::Embedding,
            Stage::Complete,
        ]
    );

    // event type fills in the missing stage
    assert_eq!(events[1].event_type, "thinking");
    assert_eq!(events[1].thinking_text(), Some("用户想找一只橘猫"));
    assert!(events[1].is_delta());

    // blank line after the thinking frame resets the event type
    assert_eq!(events[2].event_type, "progress");
    assert_eq!(events[2].expanded_query(), Some("橘猫 可爱 🐱"));

    assert_eq!(events[4].total(), Some(1));
}

#[test]
fn test_every_split_point_gives_same_events() {
    let bytes = BODY.as_bytes();
    let expected = decode_chunks([bytes]);

    for split in 0..=bytes.len() {
        let (head, tail) = bytes.split_at(split);
        assert_eq!(decode_chunks([head, tail]), expected, "split at byte {split}");
    }
}

#[test]
fn test_byte_at_a_time_gives_same_events() {
    let bytes = BODY.as_bytes();
    let expected = decode_chunks([bytes]);

    assert_eq!(decode_chunks(bytes.chunks(1)), expected);
    assert_eq!(decode_chunks(bytes.chunks(3)), expected);
    assert_eq!(decode_chunks(bytes.chunks(7)), expected);
}

#[test]
fn test_three_way_splits_around_multibyte_chars() {
    let bytes = BODY.as_bytes();
    let expected = decode_chunks([bytes]);

    // every split inside the first multibyte run, combined with every later split
    let first = BODY.find('理').unwrap();
    for i in first..first + 9 {
        for j in (i..bytes.len()).step_by(5) {
            let chunks = [&bytes[..i], &bytes[i..j], &bytes[j..]];
            assert_eq!(decode_chunks(chunks), expected, "split at {i} and {j}");
        }
    }
}

#[test]
fn test_malformed_frames_do_not_stop_decoding() {
    let body = "data: {broken\ndata: {\"stage\":\"searching\"}\n";
    let events = decode_chunks([body.as_bytes()]);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].stage, Stage::Searching);
}

#[test]
fn test_unterminated_last_line_is_discarded() {
    let mut decoder = FrameDecoder::new();
    let events = decoder.push(b"data: {\"stage\":\"embedding\"}\ndata: {\"stage\":\"comp");
    assert_eq!(events.len(), 1);
    assert_eq!(decoder.finish(), "data: {\"stage\":\"comp".len());
}

#[tokio::test]
async fn test_event_reader_yields_events_then_none() {
    let chunks: Vec<Result<Vec<u8>, AppError>> = BODY
        .as_bytes()
        .chunks(11)
        .map(|c| Ok(c.to_vec()))
        .collect();
    let mut reader = EventReader::new(stream::iter(chunks).boxed());

    let mut stages = Vec::new();
    while let Some(event) = reader.next_event().await.unwrap() {
        stages.push(event.stage);
    }
    assert_eq!(stages.len(), 5);
    assert_eq!(stages.last(), Some(&Stage::Complete));
    assert!(reader.next_event().await.unwrap().is_none());
}

#[tokio::test]
async fn test_event_reader_surfaces_transport_error_after_buffered_events() {
    let chunks: Vec<Result<Vec<u8>, AppError>> = vec![
        Ok(b"data: {\"stage\":\"embedding\"}\n".to_vec()),
        Err(AppError::Other(anyhow::anyhow!("connection reset"))),
    ];
    let mut reader = EventReader::new(stream::iter(chunks).boxed());

    let first = reader.next_event().await.unwrap().unwrap();
    assert_eq!(first.stage, Stage::Embedding);
    assert!(reader.next_event().await.is_err());
}
