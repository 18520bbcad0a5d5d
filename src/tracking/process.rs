//! Landmark detector running as a child process.
//!
//! The child owns the camera and the model. It prints `READY` once loaded,
//! then one JSON object per processed frame:
//!
//! ```json
//! {"width": 640, "height": 480,
//!  "hands": [{"score": 0.93, "handedness": "Right",
//!             "landmarks": [{"x": 0.51, "y": 0.42, "z": -0.02}, ...]}],
//!  "frame": {"width": 64, "height": 48, "luma": [12, 15, ...]}}
//! ```
//!
//! `frame` is optional; an `error` string marks a frame the child could not
//! process.

use std::io::{self, BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::geometry::Size;

use super::{FrameImage, FrameSource, Hand, Landmark, TrackerConfig, TrackingFrame};

const DEFAULT_SOURCE: Size = Size {
    width: 640.0,
    height: 480.0,
};

/// Model loading can take a while on a cold start
pub const READY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker command is empty")]
    EmptyCommand,
    #[error("failed to start tracker `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("tracker stdout unavailable")]
    MissingStdout,
    #[error("tracker did not signal ready, got: {0:?}")]
    NotReady(String),
    #[error("tracker not ready after {0:?}")]
    ReadyTimeout(Duration),
    #[error("malformed tracker output: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct FrameJson {
    width: u32,
    height: u32,
    luma: Vec<u8>,
}

#[derive(Deserialize, Debug)]
struct DetectionJson {
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    hands: Vec<HandJson>,
    frame: Option<FrameJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Parses one line of detector output.
pub fn decode_frame(line: &str) -> Result<TrackingFrame, TrackerError> {
    let det: DetectionJson = serde_json::from_str(line)?;

    let source = match (det.width, det.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Size::new(w as f64, h as f64),
        _ => DEFAULT_SOURCE,
    };

    if let Some(error) = det.error {
        warn!("detector error: {}", error);
        return Ok(TrackingFrame::empty(source));
    }

    let hands = det
        .hands
        .into_iter()
        .map(|h| Hand {
            landmarks: h
                .landmarks
                .into_iter()
                .map(|l| Landmark {
                    x: l.x,
                    y: l.y,
                    z: l.z,
                })
                .collect(),
            score: h.score,
            handedness: h.handedness,
        })
        .collect();

    let image = det.frame.and_then(|f| {
        if f.luma.len() == (f.width as usize) * (f.height as usize) {
            Some(FrameImage {
                width: f.width,
                height: f.height,
                luma: f.luma,
            })
        } else {
            warn!(
                "dropping thumbnail: {}x{} with {} bytes",
                f.width,
                f.height,
                f.luma.len()
            );
            None
        }
    });

    Ok(TrackingFrame {
        source,
        hands,
        image,
    })
}

/// Flags the detector receives on start-up
pub fn config_args(config: &TrackerConfig) -> Vec<String> {
    vec![
        "--max-hands".into(),
        config.max_hands.to_string(),
        "--model-complexity".into(),
        config.model_complexity.to_string(),
        "--min-detection-confidence".into(),
        config.min_detection_confidence.to_string(),
        "--min-tracking-confidence".into(),
        config.min_tracking_confidence.to_string(),
    ]
}

/// Detector child process plus the thread reading its stdout
#[derive(Debug)]
pub struct LandmarkProcess {
    child: Child,
    rx: Receiver<TrackingFrame>,
}

impl LandmarkProcess {
    /// Splits `command_line` on whitespace and starts it.
    pub fn from_command_line(
        command_line: &str,
        config: &TrackerConfig,
    ) -> Result<Self, TrackerError> {
        let mut parts = command_line.split_whitespace().map(String::from);
        let program = parts.next().ok_or(TrackerError::EmptyCommand)?;
        let args: Vec<String> = parts.collect();
        Self::spawn(&program, &args, config)
    }

    pub fn spawn(
        program: &str,
        args: &[String],
        config: &TrackerConfig,
    ) -> Result<Self, TrackerError> {
        Self::spawn_with_timeout(program, args, config, READY_TIMEOUT)
    }

    /// Starts the detector and waits up to `ready_timeout` for its `READY`
    /// line. On any failure the child is killed and reaped before returning.
    pub fn spawn_with_timeout(
        program: &str,
        args: &[String],
        config: &TrackerConfig,
        ready_timeout: Duration,
    ) -> Result<Self, TrackerError> {
        info!("starting hand detector: {} {:?}", program, args);

        let mut child = Command::new(program)
            .args(args)
            .args(config_args(config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            // the terminal belongs to the TUI
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| TrackerError::Spawn {
                command: program.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let (tx, rx) = mpsc::channel();
        // from here on an early return drops `process`, which kills the child
        let process = Self { child, rx };
        let stdout = stdout.ok_or(TrackerError::MissingStdout)?;

        let (ready_tx, ready_rx) = mpsc::channel();
        thread::spawn(move || pump(BufReader::new(stdout), ready_tx, tx));

        match ready_rx.recv_timeout(ready_timeout) {
            Ok(Ok(())) => {}
            Ok(Err(first_line)) => return Err(TrackerError::NotReady(first_line)),
            Err(RecvTimeoutError::Timeout) => {
                return Err(TrackerError::ReadyTimeout(ready_timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(TrackerError::NotReady(String::new()))
            }
        }
        info!("hand detector ready");
        Ok(process)
    }
}

/// Reads detector output until EOF. The first line answers the handshake on
/// `ready`; every later line is decoded into `frames`. Lines that are not
/// UTF-8 or not JSON are logged and skipped.
fn pump<R: BufRead>(
    mut reader: R,
    ready: Sender<Result<(), String>>,
    frames: Sender<TrackingFrame>,
) {
    let mut ready = Some(ready);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("reading detector output failed: {}", e);
                break;
            }
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim();

        if let Some(ready) = ready.take() {
            let handshake = if line == "READY" {
                Ok(())
            } else {
                Err(line.to_string())
            };
            let failed = handshake.is_err();
            let _ = ready.send(handshake);
            if failed {
                return;
            }
            continue;
        }

        if line.is_empty() {
            continue;
        }
        match decode_frame(line) {
            Ok(frame) => {
                if frames.send(frame).is_err() {
                    break;
                }
            }
            Err(e) => warn!("skipping detector line: {}", e),
        }
    }
    info!("hand detector output closed");
}

impl FrameSource for LandmarkProcess {
    /// Newest frame since the last call; older ones are stale and dropped.
    fn next_frame(&mut self) -> Option<TrackingFrame> {
        let mut latest = None;
        let mut dropped = 0usize;
        while let Ok(frame) = self.rx.try_recv() {
            if latest.replace(frame).is_some() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            trace!(dropped, "skipped stale tracker frames");
        }
        latest
    }
}

impl Drop for LandmarkProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_decode_hand() {
        let line = r#"{"width":1280,"height":720,"hands":[{"score":0.9,"handedness":"Left","landmarks":[{"x":0.1,"y":0.2,"z":0.0},{"x":0.3,"y":0.4}]}]}"#;
        let frame = decode_frame(line).unwrap();
        assert_eq!(frame.source, Size::new(1280.0, 720.0));
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].handedness, "Left");
        assert_eq!(frame.hands[0].landmarks[1].y, 0.4);
        assert!(frame.image.is_none());
    }

    #[test]
    fn test_decode_no_hands_defaults_size() {
        let frame = decode_frame(r#"{"hands":[]}"#).unwrap();
        assert!(frame.hands.is_empty());
        assert_eq!(frame.source, DEFAULT_SOURCE);
    }

    #[test]
    fn test_decode_error_field_yields_empty_frame() {
        let line = r#"{"hands":[{"score":1.0,"landmarks":[]}],"error":"camera busy"}"#;
        let frame = decode_frame(line).unwrap();
        assert!(frame.hands.is_empty());
    }

    #[test]
    fn test_decode_thumbnail() {
        let frame = decode_frame(r#"{"hands":[],"frame":{"width":2,"height":1,"luma":[0,255]}}"#)
            .unwrap();
        let img = frame.image.unwrap();
        assert_eq!(img.sample(1.0, 0.0), 255);
    }

    #[test]
    fn test_decode_drops_inconsistent_thumbnail() {
        let frame = decode_frame(r#"{"hands":[],"frame":{"width":4,"height":4,"luma":[1,2]}}"#)
            .unwrap();
        assert!(frame.image.is_none());
    }

    #[test]
    fn test_decode_garbage_is_error() {
        assert_matches!(decode_frame("not json"), Err(TrackerError::Decode(_)));
    }

    #[test]
    fn test_config_args_carry_thresholds() {
        let args = config_args(&TrackerConfig::default());
        assert_eq!(
            args,
            vec![
                "--max-hands",
                "1",
                "--model-complexity",
                "1",
                "--min-detection-confidence",
                "0.7",
                "--min-tracking-confidence",
                "0.7"
            ]
        );
    }

    fn pumped(input: &[u8]) -> (Result<(), String>, Vec<TrackingFrame>) {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (tx, rx) = mpsc::channel();
        pump(io::Cursor::new(input.to_vec()), ready_tx, tx);
        (ready_rx.recv().unwrap(), rx.try_iter().collect())
    }

    #[test]
    fn test_pump_survives_non_utf8_line() {
        let mut input = b"READY\n".to_vec();
        input.extend_from_slice(b"\xff\xfegarbage\n");
        input.extend_from_slice(b"\n");
        input.extend_from_slice(br#"{"hands":[{"score":0.9,"landmarks":[]}]}"#);
        input.push(b'\n');

        let (ready, frames) = pumped(&input);
        assert_eq!(ready, Ok(()));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].hands.len(), 1);
    }

    #[test]
    fn test_pump_skips_bad_json_and_keeps_going() {
        let (_, frames) = pumped(b"READY\nnot json\n{\"hands\":[]}\n{\"hands\":[]}\n");
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_pump_reports_wrong_first_line() {
        let (ready, frames) = pumped(b"\xffloading\n{\"hands\":[]}\n");
        assert_matches!(ready, Err(line) if line.ends_with("loading"));
        assert!(frames.is_empty());
    }

    #[cfg(unix)]
    fn sh(script: &str, timeout: Duration) -> Result<LandmarkProcess, TrackerError> {
        LandmarkProcess::spawn_with_timeout(
            "sh",
            &["-c".to_string(), script.to_string()],
            &TrackerConfig::default(),
            timeout,
        )
    }

    #[cfg(unix)]
    #[test]
    fn test_detector_frame_after_non_utf8_line() {
        let mut process = sh(
            r#"echo READY; printf '\377\376garbage\n'; echo '{"hands":[{"score":0.9,"landmarks":[]}]}'; exec sleep 5"#,
            Duration::from_secs(5),
        )
        .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let mut frame = None;
        while frame.is_none() && std::time::Instant::now() < deadline {
            frame = process.next_frame();
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(frame.map(|f| f.hands.len()), Some(1));
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_detector_times_out() {
        let started = std::time::Instant::now();
        assert_matches!(
            sh("exec sleep 30", Duration::from_millis(200)),
            Err(TrackerError::ReadyTimeout(_))
        );
        // the child was killed and reaped rather than waited out
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_wrong_handshake_is_not_ready() {
        assert_matches!(
            sh(r"printf '\377oops\n'; exec sleep 30", Duration::from_secs(5)),
            Err(TrackerError::NotReady(_))
        );
        assert_matches!(
            sh("exit 0", Duration::from_secs(5)),
            Err(TrackerError::NotReady(line)) if line.is_empty()
        );
    }

    #[test]
    fn test_empty_command_rejected() {
        assert_matches!(
            LandmarkProcess::from_command_line("   ", &TrackerConfig::default()),
            Err(TrackerError::EmptyCommand)
        );
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        assert_matches!(
            LandmarkProcess::from_command_line(
                "definitely-not-a-hand-detector-binary",
                &TrackerConfig::default()
            ),
            Err(TrackerError::Spawn { .. })
        );
    }
}
