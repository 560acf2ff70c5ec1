// src/data.rs - Recorded pose sessions and replay reports
use crate::classifier::{ExerciseClassifier, SessionEvent, Update};
use crate::exercise::ExerciseKind;
use crate::mediapipe_bridge::PoseSource;
use crate::tracking::{Landmark, PoseFrame, PoseSample, POSE_LANDMARK_COUNT};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct JsonFrame {
    timestamp_ms: u64,
    #[serde(default)]
    landmarks: Option<Vec<[f64; 3]>>,
}

impl From<JsonFrame> for PoseFrame {
    fn from(frame: JsonFrame) -> Self {
        match frame.landmarks {
            Some(points) if !points.is_empty() => PoseFrame::Detected(PoseSample::new(
                frame.timestamp_ms,
                points.into_iter().map(Landmark::from).collect(),
            )),
            _ => PoseFrame::NoDetection {
                timestamp_ms: frame.timestamp_ms,
            },
        }
    }
}

/// Loads a recording, picking the format from the file extension
/// (`.csv`, anything else is read as JSON lines).
pub fn load_recording(path: impl AsRef<Path>) -> Result<Vec<PoseFrame>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(anyhow::anyhow!("Recording does not exist: {}", path.display()));
    }
    let file = File::open(path)
        .with_context(|| format!("Cannot open recording {}", path.display()))?;

    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        read_csv(file)
    } else {
        read_jsonl(BufReader::new(file))
    }
}

pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<PoseFrame>> {
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: JsonFrame = serde_json::from_str(&line)
            .with_context(|| format!("Invalid frame on line {}", i + 1))?;
        frames.push(frame.into());
    }
    Ok(frames)
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<PoseFrame>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut frames = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let frame = parse_csv_record(&record)
            .with_context(|| format!("Invalid frame on data row {}", i + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

fn parse_csv_record(record: &StringRecord) -> Result<PoseFrame> {
    let timestamp_ms = record
        .get(0)
        .ok_or_else(|| anyhow::anyhow!("Missing timestamp"))?
        .trim()
        .parse::<u64>()
        .context("Invalid timestamp")?;

    let detected = match record.get(1).map(str::trim) {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") | Some("") | None => false,
        Some(other) => return Err(anyhow::anyhow!("Invalid detected flag: {}", other)),
    };

    let coords: Vec<&str> = record.iter().skip(2).map(str::trim).collect();
    if !detected || coords.is_empty() || coords.iter().any(|c| c.is_empty()) {
        return Ok(PoseFrame::NoDetection { timestamp_ms });
    }
    if coords.len() % 3 != 0 {
        return Err(anyhow::anyhow!(
            "Expected x,y,z triples, got {} coordinate columns",
            coords.len()
        ));
    }

    let mut landmarks = Vec::with_capacity(coords.len() / 3);
    for xyz in coords.chunks(3) {
        let x = xyz[0].parse::<f64>().context("Invalid x coordinate")?;
        let y = xyz[1].parse::<f64>().context("Invalid y coordinate")?;
        let z = xyz[2].parse::<f64>().context("Invalid z coordinate")?;
        landmarks.push(Landmark::new(x, y, z));
    }
    Ok(PoseFrame::Detected(PoseSample::new(timestamp_ms, landmarks)))
}

/// Writes frames in the CSV layout `read_csv` understands.
pub fn write_csv<W: Write>(writer: W, frames: &[PoseFrame]) -> Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let mut header = vec!["timestamp_ms".to_string(), "detected".to_string()];
    for i in 0..POSE_LANDMARK_COUNT {
        header.push(format!("lm{}_x", i));
        header.push(format!("lm{}_y", i));
        header.push(format!("lm{}_z", i));
    }
    writer.write_record(&header)?;

    for frame in frames {
        let mut row = vec![frame.timestamp_ms().to_string()];
        match frame {
            PoseFrame::Detected(sample) => {
                row.push("true".to_string());
                for lm in &sample.landmarks {
                    row.push(lm.x.to_string());
                    row.push(lm.y.to_string());
                    row.push(lm.z.to_string());
                }
            }
            PoseFrame::NoDetection { .. } => row.push("false".to_string()),
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Summary of one replayed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_name: String,
    pub started_at: DateTime<Local>,
    pub exercise: ExerciseKind,
    pub target_sets: u32,
    pub target: f64,
    pub current_set: u32,
    pub sets_completed: u32,
    pub reps_counted: u32,
    pub progress: f64,
    pub finished: bool,
    pub frames_accepted: usize,
    pub frames_rejected: usize,
    pub frames_without_pose: usize,
}

impl SessionReport {
    fn new(classifier: &ExerciseClassifier) -> Self {
        let started_at = Local::now();
        let state = classifier.state();
        Self {
            session_name: format!("session_{}", started_at.format("%Y%m%d_%H%M%S")),
            started_at,
            exercise: state.exercise,
            target_sets: state.target_sets,
            target: state.target,
            current_set: state.current_set,
            sets_completed: 0,
            reps_counted: 0,
            progress: state.progress,
            finished: state.finished,
            frames_accepted: 0,
            frames_rejected: 0,
            frames_without_pose: 0,
        }
    }

    fn record(&mut self, update: &Update) {
        for event in &update.events {
            match event {
                SessionEvent::RepCompleted { .. } => self.reps_counted += 1,
                SessionEvent::SetCompleted { .. } => self.sets_completed += 1,
                SessionEvent::SessionFinished => {}
            }
        }
        self.current_set = update.state.current_set;
        self.progress = update.state.progress;
        self.finished = update.state.finished;
    }

    pub fn render_text(&self) -> String {
        let unit = if self.exercise.is_timed() { "s" } else { "reps" };
        format!(
            "{} - {}\n\
             Sets completed: {} / {}\n\
             Current set: {} ({:.1} / {} {})\n\
             Reps counted: {}\n\
             Finished: {}\n\
             Frames: {} accepted, {} rejected, {} without pose",
            self.session_name,
            self.exercise,
            self.sets_completed,
            self.target_sets,
            self.current_set,
            self.progress,
            self.target,
            unit,
            self.reps_counted,
            self.finished,
            self.frames_accepted,
            self.frames_rejected,
            self.frames_without_pose,
        )
    }
}

/// Drives every frame of `source` through `classifier`. Rejected frames are
/// counted and skipped; `on_update` sees each accepted one.
pub fn replay_session<S, F>(
    classifier: &mut ExerciseClassifier,
    source: &mut S,
    mut on_update: F,
) -> Result<SessionReport>
where
    S: PoseSource + ?Sized,
    F: FnMut(&Update),
{
    let mut report = SessionReport::new(classifier);

    while let Some(frame) = source.next_frame()? {
        if matches!(frame, PoseFrame::NoDetection { .. }) {
            report.frames_without_pose += 1;
        }
        match classifier.update_frame(&frame) {
            Ok(update) => {
                report.frames_accepted += 1;
                report.record(&update);
                on_update(&update);
            }
            Err(_) => report.frames_rejected += 1,
        }
    }

    Ok(report)
}
