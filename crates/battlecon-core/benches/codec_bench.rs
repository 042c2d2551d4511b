//! Criterion benchmarks for frame splitting and the word codec.
//!
//! Run with:
//! ```bash
//! cargo bench --package battlecon-core --bench codec_bench
//! ```

use battlecon_core::{decode_message, encode_message, FrameDecoder, Message, SequenceId};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ── Message fixtures ──────────────────────────────────────────────────────────

fn make_version_reply() -> Message {
    Message {
        sequence_id: SequenceId::new(1),
        from_server: false,
        is_response: true,
        words: vec!["OK".into(), "BF4".into(), "179665".into()],
    }
}

fn make_chat_event() -> Message {
    Message {
        sequence_id: SequenceId::new(2),
        from_server: true,
        is_response: false,
        words: vec![
            "player.onChat".into(),
            "SomePlayer".into(),
            "a reasonably long chat line typed in the middle of a round".into(),
            "all".into(),
        ],
    }
}

/// A 64-player `admin.listPlayers` reply: the largest packet seen routinely.
fn make_player_list() -> Message {
    let columns = ["name", "guid", "teamId", "squadId", "kills", "deaths", "score", "rank", "ping"];
    let mut words = vec!["OK".to_string(), columns.len().to_string()];
    words.extend(columns.iter().map(|c| c.to_string()));
    words.push("64".into());
    for i in 0..64 {
        words.push(format!("Player{i:02}"));
        words.push(format!("EA_{i:032X}"));
        for n in [1, 2, 10, 5, 1200, 40, 30] {
            words.push((n + i).to_string());
        }
    }
    Message {
        sequence_id: SequenceId::new(3),
        from_server: false,
        is_response: true,
        words,
    }
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for (name, msg) in [
        ("version_reply", make_version_reply()),
        ("chat_event", make_chat_event()),
        ("player_list", make_player_list()),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &msg, |b, m| {
            b.iter(|| encode_message(black_box(m)).unwrap())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for (name, msg) in [
        ("version_reply", make_version_reply()),
        ("chat_event", make_chat_event()),
        ("player_list", make_player_list()),
    ] {
        let bytes = encode_message(&msg).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &bytes, |b, bytes| {
            b.iter(|| decode_message(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

fn bench_frame_split(c: &mut Criterion) {
    // 100 chat events delivered in 1460-byte TCP segments.
    let stream: Vec<u8> = (0..100)
        .flat_map(|_| encode_message(&make_chat_event()).unwrap())
        .collect();

    c.bench_function("frame_split_100_events", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::new();
            let mut frames = 0usize;
            for chunk in stream.chunks(1460) {
                decoder.push(black_box(chunk));
                while let Some(frame) = decoder.next_frame().unwrap() {
                    frames += frame.len();
                }
            }
            frames
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_frame_split);
criterion_main!(benches);
