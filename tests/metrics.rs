#![cfg(feature = "metrics")]
//! Tests for `wsframe` metrics.
//!
//! Counters are observed through `metrics_util::debugging::DebuggingRecorder`
//! while the codec encodes and decodes frames.

use bytes::BytesMut;
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;
use tokio_util::codec::{Decoder, Encoder};
use wsframe::{
    CodecConfig,
    Frame,
    MaskingKey,
    Role,
    WebSocketFrameCodec,
    metrics::{Direction, ERRORS_TOTAL, FRAMES_PROCESSED, inc_errors, inc_frames},
};

fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn counter_value(snapshotter: &Snapshotter, name: &str, label: (&str, &str)) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(k, _, _, _)| {
            k.key().name() == name
                && k.key()
                    .labels()
                    .any(|l| l.key() == label.0 && l.value() == label.1)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => c,
            _ => 0,
        })
        .sum()
}

#[rstest]
#[case(Direction::Inbound, "inbound")]
#[case(Direction::Outbound, "outbound")]
fn frame_counter_is_labelled_by_direction(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || inc_frames(direction));

    assert_eq!(
        counter_value(&snapshotter, FRAMES_PROCESSED, ("direction", label)),
        1
    );
}

#[test]
fn error_counter_is_labelled_by_type() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        inc_errors("protocol");
        inc_errors("protocol");
        inc_errors("eof");
    });

    assert_eq!(counter_value(&snapshotter, ERRORS_TOTAL, ("type", "protocol")), 2);
    assert_eq!(counter_value(&snapshotter, ERRORS_TOTAL, ("type", "eof")), 1);
}

#[test]
fn codec_counts_frames_in_both_directions() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let mut client = WebSocketFrameCodec::new(CodecConfig::new(Role::Client));
        let mut server = WebSocketFrameCodec::new(CodecConfig::new(Role::Server));
        let mut wire = BytesMut::new();
        for payload in ["one", "two"] {
            let frame = Frame::text(payload).with_masking_key(MaskingKey::new([9, 8, 7, 6]));
            client.encode(frame, &mut wire).expect("encode");
        }
        while server.decode(&mut wire).expect("decode").is_some() {}
    });

    assert_eq!(
        counter_value(&snapshotter, FRAMES_PROCESSED, ("direction", "outbound")),
        2
    );
    assert_eq!(
        counter_value(&snapshotter, FRAMES_PROCESSED, ("direction", "inbound")),
        2
    );
}

#[test]
fn codec_counts_rejected_frames() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let mut server = WebSocketFrameCodec::default();
        let mut wire = BytesMut::from(&[0x81, 0x01, b'x'][..]);
        assert!(server.decode(&mut wire).is_err());
    });

    assert_eq!(counter_value(&snapshotter, ERRORS_TOTAL, ("type", "protocol")), 1);
    assert_eq!(
        counter_value(&snapshotter, FRAMES_PROCESSED, ("direction", "inbound")),
        0
    );
}
