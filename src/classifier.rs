// src/classifier.rs - Session state machine driven one pose frame at a time
use crate::config::ClassifierConfig;
use crate::debounce::StableTimer;
use crate::error::{ClassifierError, Result};
use crate::exercise::{
    evaluate_plank, evaluate_side_plank, squat_knee_angle, squat_zone, ExerciseKind,
    FeedbackCode, HoldVerdict, SquatZone,
};
use crate::tracking::{PoseFrame, PoseSample, POSE_LANDMARK_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

pub const MAX_SETS: u32 = 10;

/// Targets fixed before a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub exercise: ExerciseKind,
    pub target_sets: u32,
    /// Reps per set for squats, seconds per set for the plank variants.
    pub target: f64,
    /// Frames within this long of the first one are not evaluated.
    pub countdown_ms: u64,
}

impl SessionConfig {
    pub fn new(exercise: ExerciseKind, target_sets: u32, target: f64) -> Self {
        Self {
            exercise,
            target_sets,
            target,
            countdown_ms: 0,
        }
    }

    pub fn for_exercise(exercise: ExerciseKind) -> Self {
        let target = match exercise {
            ExerciseKind::Squat => 12.0,
            ExerciseKind::Plank => 30.0,
            ExerciseKind::SidePlank => 20.0,
        };
        Self::new(exercise, 3, target)
    }

    pub fn with_countdown(mut self, countdown_ms: u64) -> Self {
        self.countdown_ms = countdown_ms;
        self
    }

    pub fn adjust_sets(&mut self, delta: i32) {
        let sets = self.target_sets as i64 + delta as i64;
        self.target_sets = sets.clamp(1, MAX_SETS as i64) as u32;
    }

    /// Steps the target by one rep, or five seconds for timed holds.
    pub fn adjust_target(&mut self, delta: i32) {
        let step = if self.exercise.is_timed() { 5.0 } else { 1.0 };
        let change = if delta > 0 { step } else if delta < 0 { -step } else { 0.0 };
        self.target = (self.target + change).max(1.0);
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_sets < 1 {
            return Err(ClassifierError::InvalidConfig(
                "target sets must be at least 1".to_string(),
            ));
        }
        if !self.target.is_finite() || self.target <= 0.0 {
            return Err(ClassifierError::InvalidConfig(format!(
                "target must be a positive number, got {}",
                self.target
            )));
        }
        Ok(())
    }
}

/// Everything the presentation layer needs after an update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionState {
    pub exercise: ExerciseKind,
    pub current_set: u32,
    pub target_sets: u32,
    /// Reps in the current set, or seconds held in the current set.
    pub progress: f64,
    pub target: f64,
    /// Hold time of the current set in whole milliseconds.
    pub held_ms: u64,
    /// Squat: committed to the down phase. Planks: judged correct on the last frame.
    pub lowered_or_held: bool,
    pub debounce: StableTimer,
    pub last_rep_ms: Option<u64>,
    pub last_observed_ms: Option<u64>,
    pub feedback: FeedbackCode,
    pub is_correct_pose: bool,
    pub last_angle: Option<f64>,
    pub finished: bool,
}

impl SessionState {
    fn new(session: &SessionConfig) -> Self {
        Self {
            exercise: session.exercise,
            current_set: 1,
            target_sets: session.target_sets,
            progress: 0.0,
            target: session.target,
            held_ms: 0,
            lowered_or_held: false,
            debounce: StableTimer::new(),
            last_rep_ms: None,
            last_observed_ms: None,
            feedback: FeedbackCode::Idle,
            is_correct_pose: false,
            last_angle: None,
            finished: false,
        }
    }

    pub fn reps(&self) -> u32 {
        self.progress as u32
    }

    /// Three-line summary for an on-screen score panel.
    pub fn scoreboard(&self) -> String {
        let progress = if self.exercise.is_timed() {
            format!("{}: {:.1} / {}", self.exercise, self.progress, self.target)
        } else {
            format!("{}: {} / {}", self.exercise, self.reps(), self.target)
        };
        format!(
            "SET: {} / {}\n{}\n{}",
            self.current_set, self.target_sets, progress, self.feedback
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    RepCompleted { set: u32, reps: u32 },
    SetCompleted { set: u32 },
    SessionFinished,
}

/// Result of feeding one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub state: SessionState,
    pub events: Vec<SessionEvent>,
}

/// Hooks for callers that want events and dropped frames pushed to them.
pub trait SessionObserver {
    fn on_event(&mut self, _event: &SessionEvent) {}
    fn on_rejected(&mut self, _error: &ClassifierError) {}
}

pub struct ExerciseClassifier {
    config: ClassifierConfig,
    session: SessionConfig,
    state: SessionState,
    evaluate_from_ms: Option<u64>,
    observer: Option<Box<dyn SessionObserver>>,
}

impl fmt::Debug for ExerciseClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExerciseClassifier")
            .field("session", &self.session)
            .field("state", &self.state)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl ExerciseClassifier {
    pub fn new(session: SessionConfig, config: ClassifierConfig) -> Result<Self> {
        session.validate()?;
        info!(
            "Starting {} session: {} set(s) of {}",
            session.exercise, session.target_sets, session.target
        );
        Ok(Self {
            state: SessionState::new(&session),
            config,
            session,
            evaluate_from_ms: None,
            observer: None,
        })
    }

    /// Starts a session with the default thresholds and no countdown.
    pub fn start_session(exercise: ExerciseKind, target_sets: u32, target: f64) -> Result<Self> {
        Self::new(
            SessionConfig::new(exercise, target_sets, target),
            ClassifierConfig::default(),
        )
    }

    pub fn with_observer(mut self, observer: impl SessionObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn update(&mut self, sample: &PoseSample) -> Result<Update> {
        if self.state.finished {
            return Ok(self.unchanged());
        }
        if sample.landmarks.len() < POSE_LANDMARK_COUNT {
            return Err(self.reject(ClassifierError::InsufficientLandmarks {
                found: sample.landmarks.len(),
                required: POSE_LANDMARK_COUNT,
            }));
        }
        let Some(since_ms) = self.accept_timestamp(sample.timestamp_ms)? else {
            return Ok(self.unchanged());
        };

        let mut events = Vec::new();
        match self.state.exercise {
            ExerciseKind::Squat => self.run_squat(sample, &mut events),
            ExerciseKind::Plank => {
                let verdict = evaluate_plank(sample, &self.config);
                self.run_hold(verdict, sample.timestamp_ms, since_ms, &mut events);
            }
            ExerciseKind::SidePlank => {
                let verdict = evaluate_side_plank(sample, &self.config);
                self.run_hold(verdict, sample.timestamp_ms, since_ms, &mut events);
            }
        }
        Ok(self.publish(events))
    }

    /// The pose source saw nobody. Counts as an interruption of any run.
    pub fn no_detection(&mut self, timestamp_ms: u64) -> Result<Update> {
        if self.state.finished {
            return Ok(self.unchanged());
        }
        if self.accept_timestamp(timestamp_ms)?.is_some() {
            self.state.debounce.disarm();
            self.state.is_correct_pose = false;
            if self.state.exercise.is_timed() {
                self.state.lowered_or_held = false;
            }
        }
        Ok(self.unchanged())
    }

    pub fn update_frame(&mut self, frame: &PoseFrame) -> Result<Update> {
        match frame {
            PoseFrame::Detected(sample) => self.update(sample),
            PoseFrame::NoDetection { timestamp_ms } => self.no_detection(*timestamp_ms),
        }
    }

    /// Ends the session immediately, whatever the counters say.
    pub fn finish_now(&mut self) -> Update {
        if self.state.finished {
            return self.unchanged();
        }
        let mut events = Vec::new();
        self.finish(&mut events);
        self.publish(events)
    }

    /// Records the frame time. Returns the instant hold time should be
    /// measured from, or None while the countdown is still running.
    fn accept_timestamp(&mut self, timestamp_ms: u64) -> Result<Option<u64>> {
        let previous = self.state.last_observed_ms;
        if let Some(last_observed_ms) = previous {
            if timestamp_ms < last_observed_ms {
                return Err(self.reject(ClassifierError::NonMonotonicTimestamp {
                    timestamp_ms,
                    last_observed_ms,
                }));
            }
        }
        self.state.last_observed_ms = Some(timestamp_ms);

        let countdown_ms = self.session.countdown_ms;
        let evaluate_from = *self
            .evaluate_from_ms
            .get_or_insert_with(|| timestamp_ms.saturating_add(countdown_ms));
        if timestamp_ms < evaluate_from {
            self.state.feedback = FeedbackCode::Idle;
            return Ok(None);
        }
        let since = previous.map_or(timestamp_ms, |p| p.max(evaluate_from));
        Ok(Some(since))
    }

    fn run_squat(&mut self, sample: &PoseSample, events: &mut Vec<SessionEvent>) {
        let now = sample.timestamp_ms;
        let delay = self.config.stability_delay_ms;
        let angle = squat_knee_angle(sample);
        self.state.last_angle = Some(angle);
        self.state.is_correct_pose = angle < self.config.squat_display_angle;

        match squat_zone(angle, &self.config) {
            SquatZone::Down if !self.state.lowered_or_held => {
                if self.state.debounce.observe(true, now, delay) {
                    debug!("Squat down phase committed at {} ms ({:.1} deg)", now, angle);
                    self.state.lowered_or_held = true;
                    self.state.debounce.disarm();
                    self.state.feedback = FeedbackCode::PromptRise;
                }
            }
            SquatZone::Up if self.state.lowered_or_held => {
                let stable = self.state.debounce.observe(true, now, delay);
                let cooled_down = self
                    .state
                    .last_rep_ms
                    .map_or(true, |t| now.saturating_sub(t) > self.config.rep_cooldown_ms);
                if stable && cooled_down {
                    self.state.lowered_or_held = false;
                    self.state.debounce.disarm();
                    self.state.last_rep_ms = Some(now);
                    self.state.progress += 1.0;
                    let reps = self.state.reps();
                    info!("Rep {} of set {} counted", reps, self.state.current_set);
                    events.push(SessionEvent::RepCompleted {
                        set: self.state.current_set,
                        reps,
                    });
                    if self.state.progress >= self.state.target {
                        self.complete_set(events);
                    } else {
                        self.state.feedback = FeedbackCode::Excellent;
                    }
                }
            }
            _ => self.state.debounce.disarm(),
        }
    }

    fn run_hold(
        &mut self,
        verdict: HoldVerdict,
        now: u64,
        since_ms: u64,
        events: &mut Vec<SessionEvent>,
    ) {
        self.state.last_angle = Some(verdict.body_angle);
        self.state.is_correct_pose = verdict.correct;
        self.state.lowered_or_held = verdict.correct;
        self.state.feedback = verdict.feedback;

        if verdict.correct {
            self.state.held_ms += now.saturating_sub(since_ms);
            self.state.progress = self.state.held_ms as f64 / 1000.0;
        }
        let target_ms = (self.state.target * 1000.0).round() as u64;
        if self.state.held_ms >= target_ms {
            self.state.lowered_or_held = false;
            self.complete_set(events);
        }
    }

    fn complete_set(&mut self, events: &mut Vec<SessionEvent>) {
        let set = self.state.current_set;
        events.push(SessionEvent::SetCompleted { set });
        if set < self.state.target_sets {
            info!("Set {} of {} complete", set, self.state.target_sets);
            self.state.current_set += 1;
            self.state.progress = 0.0;
            self.state.held_ms = 0;
            self.state.feedback = FeedbackCode::RestNextSet;
        } else {
            if self.state.exercise.is_timed() {
                self.state.progress = self.state.progress.min(self.state.target);
            }
            self.finish(events);
        }
    }

    fn finish(&mut self, events: &mut Vec<SessionEvent>) {
        info!("{} session finished", self.state.exercise);
        self.state.finished = true;
        self.state.feedback = FeedbackCode::Finished;
        self.state.lowered_or_held = false;
        self.state.debounce.disarm();
        events.push(SessionEvent::SessionFinished);
    }

    fn reject(&mut self, error: ClassifierError) -> ClassifierError {
        warn!("Dropping pose sample: {}", error);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_rejected(&error);
        }
        error
    }

    fn publish(&mut self, events: Vec<SessionEvent>) -> Update {
        if let Some(observer) = self.observer.as_mut() {
            for event in &events {
                observer.on_event(event);
            }
        }
        Update {
            state: self.state,
            events,
        }
    }

    fn unchanged(&self) -> Update {
        Update {
            state: self.state,
            events: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::Landmark;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn blank(ts: u64) -> PoseSample {
        PoseSample::new(ts, vec![Landmark::new(0.5, 0.5, 0.0); POSE_LANDMARK_COUNT])
    }

    #[test]
    fn rejects_non_positive_targets() {
        assert_matches!(
            ExerciseClassifier::start_session(ExerciseKind::Squat, 0, 10.0),
            Err(ClassifierError::InvalidConfig(_))
        );
        assert_matches!(
            ExerciseClassifier::start_session(ExerciseKind::Plank, 2, 0.0),
            Err(ClassifierError::InvalidConfig(_))
        );
        assert_matches!(
            ExerciseClassifier::start_session(ExerciseKind::Plank, 2, f64::NAN),
            Err(ClassifierError::InvalidConfig(_))
        );
    }

    #[test]
    fn fresh_session_state() {
        let classifier = ExerciseClassifier::start_session(ExerciseKind::Squat, 3, 12.0).unwrap();
        let state = classifier.state();
        assert_eq!(state.current_set, 1);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.feedback, FeedbackCode::Idle);
        assert!(!state.finished);
        assert_eq!(state.debounce.anchor_ms(), None);
    }

    #[test]
    fn short_sample_leaves_state_alone() {
        let mut classifier =
            ExerciseClassifier::start_session(ExerciseKind::Squat, 1, 1.0).unwrap();
        let before = *classifier.state();
        let short = PoseSample::new(10, vec![Landmark::default(); 20]);
        assert_matches!(
            classifier.update(&short),
            Err(ClassifierError::InsufficientLandmarks { found: 20, required: 33 })
        );
        assert_eq!(*classifier.state(), before);
    }

    #[test]
    fn older_timestamp_is_dropped() {
        let mut classifier =
            ExerciseClassifier::start_session(ExerciseKind::Plank, 1, 5.0).unwrap();
        classifier.update(&blank(500)).unwrap();
        let before = *classifier.state();
        assert_matches!(
            classifier.update(&blank(499)),
            Err(ClassifierError::NonMonotonicTimestamp {
                timestamp_ms: 499,
                last_observed_ms: 500
            })
        );
        assert_eq!(*classifier.state(), before);
        // Equal timestamps are fine
        assert!(classifier.update(&blank(500)).is_ok());
    }

    #[derive(Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<SessionEvent>>>,
        rejected: Rc<RefCell<usize>>,
    }

    impl SessionObserver for Recorder {
        fn on_event(&mut self, event: &SessionEvent) {
            self.events.borrow_mut().push(*event);
        }

        fn on_rejected(&mut self, _error: &ClassifierError) {
            *self.rejected.borrow_mut() += 1;
        }
    }

    #[test]
    fn observer_sees_rejections_and_events() {
        let recorder = Recorder::default();
        let events = recorder.events.clone();
        let rejected = recorder.rejected.clone();
        let mut classifier = ExerciseClassifier::start_session(ExerciseKind::Squat, 1, 1.0)
            .unwrap()
            .with_observer(recorder);

        classifier.update(&blank(100)).unwrap();
        let _ = classifier.update(&blank(50));
        let _ = classifier.no_detection(10);
        assert_eq!(*rejected.borrow(), 2);

        let update = classifier.finish_now();
        assert_eq!(update.events, vec![SessionEvent::SessionFinished]);
        assert_eq!(*events.borrow(), vec![SessionEvent::SessionFinished]);
    }

    #[test]
    fn finish_now_is_terminal() {
        let mut classifier =
            ExerciseClassifier::start_session(ExerciseKind::Squat, 2, 5.0).unwrap();
        let update = classifier.finish_now();
        assert!(update.state.finished);
        assert_eq!(update.state.feedback, FeedbackCode::Finished);
        assert!(classifier.finish_now().events.is_empty());

        let frozen = *classifier.state();
        let update = classifier.update(&blank(10_000)).unwrap();
        assert_eq!(update.state, frozen);
        assert!(update.events.is_empty());
        // Finished sessions do not even check ordering
        assert!(classifier.no_detection(0).is_ok());
    }

    #[test]
    fn countdown_holds_feedback_at_idle() {
        let session = SessionConfig::new(ExerciseKind::SidePlank, 1, 10.0).with_countdown(3_000);
        let mut classifier = ExerciseClassifier::new(session, ClassifierConfig::default()).unwrap();

        let update = classifier.update(&blank(1_000)).unwrap();
        assert_eq!(update.state.feedback, FeedbackCode::Idle);
        assert_eq!(update.state.last_angle, None);

        let update = classifier.update(&blank(3_999)).unwrap();
        assert_eq!(update.state.feedback, FeedbackCode::Idle);

        let update = classifier.update(&blank(4_000)).unwrap();
        assert!(update.state.last_angle.is_some());
        assert_ne!(update.state.feedback, FeedbackCode::Idle);
    }

    #[test]
    fn set_and_target_adjustment() {
        let mut session = SessionConfig::for_exercise(ExerciseKind::Plank);
        assert_eq!(session.target_sets, 3);
        assert_eq!(session.target, 30.0);

        session.adjust_sets(20);
        assert_eq!(session.target_sets, MAX_SETS);
        session.adjust_sets(-50);
        assert_eq!(session.target_sets, 1);

        session.adjust_target(1);
        assert_eq!(session.target, 35.0);
        for _ in 0..10 {
            session.adjust_target(-1);
        }
        assert_eq!(session.target, 1.0);

        let mut squat = SessionConfig::for_exercise(ExerciseKind::Squat);
        assert_eq!(squat.target, 12.0);
        squat.adjust_target(-1);
        assert_eq!(squat.target, 11.0);

        assert_eq!(SessionConfig::for_exercise(ExerciseKind::SidePlank).target, 20.0);
    }

    #[test]
    fn scoreboard_text() {
        let classifier = ExerciseClassifier::start_session(ExerciseKind::Squat, 3, 12.0).unwrap();
        assert_eq!(
            classifier.state().scoreboard(),
            "SET: 1 / 3\nSQUAT: 0 / 12\nGet ready..."
        );

        let classifier =
            ExerciseClassifier::start_session(ExerciseKind::SidePlank, 2, 20.0).unwrap();
        assert_eq!(
            classifier.state().scoreboard(),
            "SET: 1 / 2\nSIDE PLANK: 0.0 / 20\nGet ready..."
        );
    }
}
