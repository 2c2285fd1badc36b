//! Landmark source — s-expression frames read line by line.
//!
//! Each line is one camera frame, written as a plist:
//!
//! ```text
//! (:t-ms 33.0 :confidence 0.93 :landmarks ((0.51 0.62) (0.48 0.55) ...))
//! (:t-ms 66.0 :index-tip (0.41 0.32) :thumb-tip (0.43 0.35))
//! (:t-ms 99.0 :no-hand t)
//! ```
//!
//! Blank lines and `;` comments are skipped.  A line that does not decode is
//! reported as malformed so the loop can still run the tick as "no hand".

use std::io::BufRead;

use anyhow::{Context, Result};
use lexpr::Value;
use tracing::trace;

use crate::error::FrameError;
use crate::tracking::{HandLandmarks, LANDMARK_COUNT};

/// One decoded camera frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame timestamp, if the producer supplied one.
    pub t_ms: Option<f64>,
    /// `None` when no hand was detected.
    pub hand: Option<HandLandmarks>,
}

/// What a source yields per poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Frame(Frame),
    /// The frame was unreadable; the tick runs as "no hand".
    Malformed(FrameError),
    /// No more frames.
    End,
}

/// Per-tick landmark provider.
pub trait LandmarkSource {
    fn next_frame(&mut self) -> Result<SourceEvent>;
}

/// Reads frames from any buffered reader (replay file, stdin pipe).
pub struct SexpSource<R: BufRead> {
    reader: R,
    line: Vec<u8>,
    /// Lines consumed so far.
    pub line_no: u64,
}

impl<R: BufRead> SexpSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> LandmarkSource for SexpSource<R> {
    fn next_frame(&mut self) -> Result<SourceEvent> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut self.line)
                .with_context(|| format!("Failed to read landmark frame after line {}", self.line_no))?;
            if n == 0 {
                return Ok(SourceEvent::End);
            }
            self.line_no += 1;

            let text = match std::str::from_utf8(&self.line) {
                Ok(text) => text.trim(),
                Err(e) => {
                    return Ok(SourceEvent::Malformed(FrameError::Syntax(format!(
                        "line {} is not valid UTF-8: {}",
                        self.line_no, e
                    ))))
                }
            };
            if text.is_empty() || text.starts_with(';') {
                continue;
            }
            trace!(line = self.line_no, "frame: {}", text);
            return Ok(match parse_frame(text) {
                Ok(frame) => SourceEvent::Frame(frame),
                Err(e) => SourceEvent::Malformed(e),
            });
        }
    }
}

// ── Frame decoding ─────────────────────────────────────────

/// Decode one frame line.
pub fn parse_frame(text: &str) -> Result<Frame, FrameError> {
    let value = lexpr::from_str(text).map_err(|e| FrameError::Syntax(e.to_string()))?;
    if !matches!(value, Value::Cons(_)) {
        return Err(FrameError::NotPlist);
    }

    let t_ms = plist_get(&value, "t-ms").and_then(as_f64);
    if plist_get(&value, "no-hand").is_some_and(is_truthy) {
        return Ok(Frame { t_ms, hand: None });
    }

    let confidence = plist_get(&value, "confidence")
        .and_then(as_f64)
        .unwrap_or(1.0) as f32;

    if let Some(list) = plist_get(&value, "landmarks") {
        let items = list_items(list).ok_or(FrameError::BadPoint { key: "landmarks" })?;
        if items.len() != LANDMARK_COUNT {
            return Err(FrameError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found: items.len(),
            });
        }
        let points = items
            .into_iter()
            .map(|p| as_point(p).ok_or(FrameError::BadPoint { key: "landmarks" }))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Frame {
            t_ms,
            hand: Some(HandLandmarks { points, confidence }),
        });
    }

    let index = plist_get(&value, "index-tip");
    let thumb = plist_get(&value, "thumb-tip");
    let hand = match (index, thumb) {
        (None, None) => None,
        (Some(i), Some(t)) => {
            let i = as_point(i).ok_or(FrameError::BadPoint { key: "index-tip" })?;
            let t = as_point(t).ok_or(FrameError::BadPoint { key: "thumb-tip" })?;
            Some(HandLandmarks::from_tips(i, t, confidence))
        }
        (None, Some(_)) => return Err(FrameError::BadPoint { key: "index-tip" }),
        (Some(_), None) => return Err(FrameError::BadPoint { key: "thumb-tip" }),
    };
    Ok(Frame { t_ms, hand })
}

/// Look up `:key` in a plist.  Accepts both keyword and `:symbol` forms.
fn plist_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        let Value::Cons(next) = pair.cdr() else {
            return None;
        };
        if is_key {
            return Some(next.car());
        }
        current = next.cdr();
    }
    None
}

/// Elements of a proper list.
fn list_items(value: &Value) -> Option<Vec<&Value>> {
    let mut out = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                out.push(pair.car());
                current = pair.cdr();
            }
            Value::Null | Value::Nil => return Some(out),
            _ => return None,
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn as_point(value: &Value) -> Option<[f32; 2]> {
    match list_items(value)?.as_slice() {
        [x, y] => Some([as_f64(x)? as f32, as_f64(y)? as f32]),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Null | Value::Bool(false) => false,
        Value::Symbol(s) => s.as_ref() != "nil",
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::HandLandmark;
    use std::io::Cursor;

    #[test]
    fn test_tips_frame() {
        let f = parse_frame("(:t-ms 33.0 :index-tip (0.25 0.5) :thumb-tip (0.3 0.5))").unwrap();
        assert_eq!(f.t_ms, Some(33.0));
        let hand = f.hand.unwrap();
        assert_eq!(hand.get(HandLandmark::IndexTip), Some([0.25, 0.5]));
        assert_eq!(hand.get(HandLandmark::ThumbTip), Some([0.3, 0.5]));
        assert_eq!(hand.confidence, 1.0);
    }

    #[test]
    fn test_full_landmarks_frame() {
        let points: Vec<String> = (0..LANDMARK_COUNT)
            .map(|i| format!("({} 0.5)", i as f32 / 100.0))
            .collect();
        let line = format!("(:confidence 0.8 :landmarks ({}))", points.join(" "));
        let f = parse_frame(&line).unwrap();
        assert_eq!(f.t_ms, None);
        let hand = f.hand.unwrap();
        assert_eq!(hand.points.len(), LANDMARK_COUNT);
        assert!((hand.confidence - 0.8).abs() < 1e-6);
        assert_eq!(hand.get(HandLandmark::IndexTip), Some([0.08, 0.5]));
    }

    #[test]
    fn test_integer_coordinates() {
        let f = parse_frame("(:index-tip (0 1) :thumb-tip (1 0))").unwrap();
        assert_eq!(f.hand.unwrap().get(HandLandmark::IndexTip), Some([0.0, 1.0]));
    }

    #[test]
    fn test_no_hand_frames() {
        assert_eq!(parse_frame("(:t-ms 5 :no-hand t)").unwrap().hand, None);
        assert_eq!(parse_frame("(:t-ms 5)").unwrap().hand, None);
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(parse_frame("(:index-tip (0.1"), Err(FrameError::Syntax(_))));
        assert_eq!(parse_frame("42"), Err(FrameError::NotPlist));
        assert_eq!(
            parse_frame("(:index-tip (0.1 0.2))"),
            Err(FrameError::BadPoint { key: "thumb-tip" })
        );
        assert_eq!(
            parse_frame("(:index-tip (0.1) :thumb-tip (0.1 0.2))"),
            Err(FrameError::BadPoint { key: "index-tip" })
        );
        assert_eq!(
            parse_frame("(:landmarks ((0.1 0.2) (0.3 0.4)))"),
            Err(FrameError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found: 2
            })
        );
    }

    #[test]
    fn test_source_skips_comments_and_reports_malformed() {
        let input = "; recorded session\n\n(:t-ms 0 :no-hand t)\nnot a frame (\n(:t-ms 33 :index-tip (0.5 0.5) :thumb-tip (0.5 0.5))\n";
        let mut src = SexpSource::new(Cursor::new(input));

        assert!(matches!(
            src.next_frame().unwrap(),
            SourceEvent::Frame(Frame { hand: None, .. })
        ));
        assert!(matches!(src.next_frame().unwrap(), SourceEvent::Malformed(_)));
        match src.next_frame().unwrap() {
            SourceEvent::Frame(f) => {
                assert_eq!(f.t_ms, Some(33.0));
                assert!(f.hand.is_some());
            }
            other => panic!("expected frame, got {:?}", other),
        }
        assert_eq!(src.next_frame().unwrap(), SourceEvent::End);
        assert_eq!(src.line_no, 5);
    }

    #[test]
    fn test_invalid_utf8_line_is_malformed() {
        let mut input = b"(:t-ms 0 :no-hand t)\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"(:t-ms 66 :no-hand t)\n");
        let mut src = SexpSource::new(Cursor::new(input));

        assert!(matches!(src.next_frame().unwrap(), SourceEvent::Frame(_)));
        match src.next_frame().unwrap() {
            SourceEvent::Malformed(FrameError::Syntax(msg)) => assert!(msg.contains("UTF-8")),
            other => panic!("expected malformed frame, got {:?}", other),
        }
        match src.next_frame().unwrap() {
            SourceEvent::Frame(f) => assert_eq!(f.t_ms, Some(66.0)),
            other => panic!("expected frame, got {:?}", other),
        }
        assert_eq!(src.next_frame().unwrap(), SourceEvent::End);
    }
}
