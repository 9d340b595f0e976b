pub mod error;
mod reveal;
mod shuffle;
mod view;

use core::time::Duration;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use model::{quiz::Question, session::SessionState};
use rand::Rng;
use store::SessionStore;
use tokio::sync::mpsc;

pub use error::{Error, Result};
pub use view::{QuestionView, RevealView, Snapshot};

use reveal::Reveal;

/// Externally observable timing contract of the reveal cycle. The split
/// between the overlay phase and the inline correct-answer phase is a
/// presentation concern, so both durations are independent knobs.
#[derive(Clone, Copy, Debug)]
pub struct RevealTiming {
    /// How long the correct/incorrect overlay stays up after an answer.
    pub overlay: Duration,
    /// Total delay between an answer and the automatic advance.
    pub auto_advance: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self { overlay: Duration::from_millis(1500), auto_advance: Duration::from_millis(5000) }
    }
}

enum Persist {
    Save(SessionState),
    Clear,
}

struct Inner {
    session: SessionState,
    /// At most one reveal cycle is outstanding at a time.
    reveal: Option<Reveal>,
    next_cycle: u64,
    /// Seed for the per-question choice permutation. Presentation only;
    /// regenerated on reset, never persisted.
    shuffle_seed: u64,
}

struct Shared {
    questions: Box<[Question]>,
    timing: RevealTiming,
    /// Commands for the single writer task; one channel keeps saves and
    /// clears in mutation order.
    persist: mpsc::UnboundedSender<Persist>,
    inner: Mutex<Inner>,
}

/// The single authority over the session state: every navigation and
/// scoring operation passes through here. Cheap to clone; all clones share
/// one session.
#[derive(Clone)]
pub struct QuizEngine {
    shared: Arc<Shared>,
}

fn tally(questions: &[Question], answers: &[Option<String>]) -> u32 {
    questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| answer.as_deref() == Some(question.correct_answer.as_str()))
        .count() as u32
}

impl QuizEngine {
    /// Builds the engine for one question store, restoring the saved
    /// session if its shape matches and starting fresh otherwise.
    pub async fn new(questions: Vec<Question>, timing: RevealTiming, store: SessionStore) -> Result<Self> {
        let count = questions.len();
        if count == 0 {
            return Err(Error::EmptyStore);
        }

        let session = match store.load().await {
            Some(mut saved) if saved.answers.len() == count && saved.position < count => {
                // The slot carries no version field; trust the answers but
                // not the stored score.
                let score = tally(&questions, &saved.answers);
                if saved.score != score {
                    log::warn!("saved score {} disagrees with answers; corrected to {score}", saved.score);
                    saved.score = score;
                }
                log::info!("restored session at question {}", saved.position + 1);
                saved
            }
            Some(_) => {
                log::warn!("saved session does not match the question store; starting fresh");
                SessionState::fresh(count)
            }
            None => SessionState::fresh(count),
        };

        let (persist, mut commands) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(command) = commands.recv().await {
                match command {
                    Persist::Save(session) => store.save(&session).await,
                    Persist::Clear => store.clear().await,
                }
            }
        });

        let inner = Inner { session, reveal: None, next_cycle: 0, shuffle_seed: rand::random() };
        let shared =
            Shared { questions: questions.into_boxed_slice(), timing, persist, inner: Mutex::new(inner) };
        Ok(Self { shared: Arc::new(shared) })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an answer for the current question and starts a reveal
    /// cycle with its deferred automatic advance. Returns whether the
    /// answer was correct.
    ///
    /// Rejected while a reveal is already showing, so a cycle can never be
    /// scored twice.
    pub fn submit_answer(&self, answer: &str) -> Result<bool> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.session.completed {
            return Err(Error::Completed);
        }
        if inner.reveal.is_some() {
            return Err(Error::RevealInProgress);
        }

        let position = inner.session.position;
        inner.session.answers[position] = Some(String::from(answer));
        inner.session.score = tally(&self.shared.questions, &inner.session.answers);

        let cycle = inner.next_cycle;
        inner.next_cycle += 1;
        let engine = self.clone();
        let delay = self.shared.timing.auto_advance;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.advance_for_cycle(cycle);
        });
        inner.reveal = Some(Reveal::new(cycle, timer));

        self.persist(inner);
        Ok(answer == self.shared.questions[position].correct_answer)
    }

    /// Manual advance. Cancels the pending automatic advance before any
    /// mutation; a no-op unless a reveal cycle is active, which also makes
    /// a second call for the same cycle a no-op.
    pub fn advance(&self) {
        let mut guard = self.lock();
        let Some(reveal) = guard.reveal.take() else { return };
        reveal.cancel();
        self.advance_session(&mut guard);
    }

    /// Automatic advance, invoked by the deferred timer. Applies only if
    /// the cycle that scheduled it is still the active one.
    fn advance_for_cycle(&self, cycle: u64) {
        let mut guard = self.lock();
        if guard.reveal.as_ref().is_some_and(|reveal| reveal.cycle == cycle) {
            guard.reveal = None;
            self.advance_session(&mut guard);
        }
    }

    fn advance_session(&self, inner: &mut Inner) {
        if inner.session.position + 1 < self.shared.questions.len() {
            inner.session.position += 1;
        } else {
            inner.session.completed = true;
        }
        self.persist(inner);
    }

    /// Jumps to a question by its one-based display number. Out-of-range
    /// input is silently ignored; this is a navigation convenience, not a
    /// data mutation.
    pub fn jump_to(&self, question_number: usize) {
        let Some(index) = question_number.checked_sub(1) else { return };
        if index >= self.shared.questions.len() {
            return;
        }
        let mut guard = self.lock();
        if guard.session.completed {
            return;
        }
        self.cancel_reveal(&mut guard);
        guard.session.position = index;
        self.persist(&guard);
    }

    /// Jumps to a uniformly random question other than the current one.
    /// A no-op with fewer than two questions.
    pub fn jump_random(&self) {
        let count = self.shared.questions.len();
        if count <= 1 {
            return;
        }
        let mut guard = self.lock();
        if guard.session.completed {
            return;
        }
        let mut rng = rand::thread_rng();
        let index = loop {
            let candidate = rng.gen_range(0..count);
            if candidate != guard.session.position {
                break candidate;
            }
        };
        self.cancel_reveal(&mut guard);
        guard.session.position = index;
        self.persist(&guard);
    }

    /// Replaces the session with a fresh one and clears the persisted
    /// slot. Confirmation is the caller's concern; this always succeeds.
    pub fn reset(&self) {
        let mut guard = self.lock();
        self.cancel_reveal(&mut guard);
        guard.session = SessionState::fresh(self.shared.questions.len());
        guard.shuffle_seed = rand::random();
        let _ = self.shared.persist.send(Persist::Clear);
    }

    /// Read-only copy of the session record.
    pub fn session(&self) -> SessionState {
        self.lock().session.clone()
    }

    /// Render-ready projection of the current state.
    pub fn snapshot(&self) -> Snapshot {
        let guard = self.lock();
        let session = &guard.session;
        let answered = session.answered();

        let question = if session.completed {
            None
        } else {
            let question = &self.shared.questions[session.position];
            Some(QuestionView {
                id: question.id.get(),
                number: session.position + 1,
                question: question.question.clone(),
                choices: shuffle::shuffled_choices(guard.shuffle_seed, question),
                image: question.image.clone(),
                selected: session.answers[session.position].clone(),
            })
        };

        let reveal = guard.reveal.as_ref().map(|reveal| {
            let question = &self.shared.questions[session.position];
            RevealView {
                correct: session.answers[session.position].as_deref() == Some(question.correct_answer.as_str()),
                correct_answer: question.correct_answer.clone(),
                overlay: reveal.started.elapsed() < self.shared.timing.overlay,
            }
        });

        Snapshot {
            total: self.shared.questions.len(),
            score: session.score,
            answered,
            completed: session.completed,
            question,
            reveal,
        }
    }

    fn cancel_reveal(&self, inner: &mut Inner) {
        if let Some(reveal) = inner.reveal.take() {
            reveal.cancel();
        }
    }

    /// Write-through save: fire-and-forget, never blocks or fails the
    /// operation that triggered it. Saves and clears go through the one
    /// writer task in mutation order, so a pending save cannot land after
    /// a later clear.
    fn persist(&self, inner: &Inner) {
        let _ = self.shared.persist.send(Persist::Save(inner.session.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::{tally, Error, QuizEngine, RevealTiming};
    use core::{num::NonZeroU32, time::Duration};
    use model::{quiz::Question, session::SessionState};
    use store::SessionStore;

    fn questions(count: usize) -> Vec<Question> {
        (1..=count as u32)
            .map(|i| Question {
                id: NonZeroU32::new(i).unwrap(),
                question: format!("Question {i}"),
                correct_answer: "B".into(),
                incorrect_answers: vec!["A".into(), "C".into(), "D".into()],
                image: None,
            })
            .collect()
    }

    fn scratch_store(name: &str) -> SessionStore {
        let dir = std::env::temp_dir().join(format!("navquiz-engine-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(dir.join(store::SLOT_FILE));
        SessionStore::new(&dir)
    }

    async fn engine(name: &str, count: usize) -> QuizEngine {
        QuizEngine::new(questions(count), RevealTiming::default(), scratch_store(name)).await.unwrap()
    }

    /// Lets detached persistence tasks run to completion.
    async fn drain() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn assert_invariants(engine: &QuizEngine, count: usize) {
        let session = engine.session();
        assert_eq!(session.answers.len(), count);
        assert!(session.position < count);
        assert_eq!(session.score, tally(&questions(count), &session.answers));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn empty_store_is_rejected() {
        let result = QuizEngine::new(Vec::new(), RevealTiming::default(), scratch_store("empty")).await;
        assert!(matches!(result, Err(Error::EmptyStore)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn correct_answer_scores_and_reveals() {
        let engine = engine("correct", 5).await;
        assert!(engine.submit_answer("B").unwrap());

        let session = engine.session();
        assert_eq!(session.position, 0);
        assert_eq!(session.score, 1);
        assert_eq!(session.answers[0].as_deref(), Some("B"));
        assert_eq!(session.answers[1..], [None, None, None, None]);

        let snapshot = engine.snapshot();
        let reveal = snapshot.reveal.unwrap();
        assert!(reveal.correct);
        assert!(reveal.overlay);
        assert_eq!(reveal.correct_answer, "B");
        assert_eq!(snapshot.question.unwrap().selected.as_deref(), Some("B"));
        assert_invariants(&engine, 5);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn manual_advance_moves_on_and_clears_the_reveal() {
        let engine = engine("advance", 5).await;
        engine.submit_answer("B").unwrap();
        engine.advance();

        let session = engine.session();
        assert_eq!(session.position, 1);
        assert_eq!(session.score, 1);
        assert!(!session.completed);
        assert!(engine.snapshot().reveal.is_none());
        assert_invariants(&engine, 5);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn wrong_answer_on_the_only_question_completes() {
        let engine = engine("single", 1).await;
        assert!(!engine.submit_answer("A").unwrap());
        engine.advance();

        let session = engine.session();
        assert!(session.completed);
        assert_eq!(session.score, 0);
        assert_eq!(session.position, 0);

        let snapshot = engine.snapshot();
        assert!(snapshot.completed);
        assert!(snapshot.question.is_none());
        assert!(snapshot.reveal.is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn completed_session_rejects_further_play() {
        let engine = engine("terminal", 1).await;
        engine.submit_answer("B").unwrap();
        engine.advance();

        assert_eq!(engine.submit_answer("B"), Err(Error::Completed));
        engine.jump_to(1);
        engine.jump_random();
        assert!(engine.session().completed);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn out_of_range_jump_is_ignored() {
        let engine = engine("jump-range", 5).await;
        engine.jump_to(7);
        engine.jump_to(0);
        assert_eq!(engine.session().position, 0);
        assert_eq!(engine.session(), SessionState::fresh(5));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn jump_discards_the_reveal_and_its_timer() {
        let engine = engine("jump-reveal", 5).await;
        engine.submit_answer("B").unwrap();
        engine.jump_to(3);

        assert_eq!(engine.session().position, 2);
        assert!(engine.snapshot().reveal.is_none());

        // The canceled timer must not fire later.
        tokio::time::sleep(Duration::from_millis(6000)).await;
        drain().await;
        assert_eq!(engine.session().position, 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn random_jump_lands_elsewhere() {
        let engine = engine("random", 5).await;
        for _ in 0..20 {
            let before = engine.session().position;
            engine.jump_random();
            let after = engine.session().position;
            assert!(after < 5);
            assert_ne!(after, before);
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn random_jump_is_a_noop_for_one_question() {
        let engine = engine("random-single", 1).await;
        engine.jump_random();
        assert_eq!(engine.session().position, 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn reset_restores_fresh_state_and_clears_the_slot() {
        let store = scratch_store("reset");
        let engine = QuizEngine::new(questions(3), RevealTiming::default(), store.clone()).await.unwrap();
        engine.submit_answer("B").unwrap();
        engine.advance();
        drain().await;
        assert!(store.load().await.is_some());

        engine.reset();
        drain().await;
        assert_eq!(engine.session(), SessionState::fresh(3));
        assert_eq!(store.load().await, None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn saves_in_flight_cannot_outlive_a_reset() {
        let store = scratch_store("reset-order");
        let engine = QuizEngine::new(questions(3), RevealTiming::default(), store.clone()).await.unwrap();
        engine.submit_answer("B").unwrap();
        engine.advance();
        // No yield before the reset: the pending saves must not resurrect
        // the slot after the clear.
        engine.reset();
        drain().await;

        assert_eq!(engine.session(), SessionState::fresh(3));
        assert_eq!(store.load().await, None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn saved_session_round_trips() {
        let store = scratch_store("round-trip");
        let mut saved = SessionState::fresh(3);
        saved.position = 2;
        saved.answers[0] = Some("B".into());
        saved.answers[1] = Some("A".into());
        saved.score = 1;
        store.save(&saved).await;

        let engine = QuizEngine::new(questions(3), RevealTiming::default(), store).await.unwrap();
        assert_eq!(engine.session(), saved);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn incompatible_saved_shape_falls_back_to_fresh() {
        let store = scratch_store("mismatch");
        store.save(&SessionState::fresh(4)).await;

        let engine = QuizEngine::new(questions(5), RevealTiming::default(), store).await.unwrap();
        assert_eq!(engine.session(), SessionState::fresh(5));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn out_of_range_saved_position_falls_back_to_fresh() {
        let store = scratch_store("bad-position");
        let mut saved = SessionState::fresh(5);
        saved.position = 7;
        store.save(&saved).await;

        let engine = QuizEngine::new(questions(5), RevealTiming::default(), store).await.unwrap();
        assert_eq!(engine.session(), SessionState::fresh(5));
        assert_eq!(engine.snapshot().question.unwrap().number, 1);
        assert!(engine.submit_answer("B").unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn saved_score_is_recomputed_from_answers() {
        let store = scratch_store("bad-score");
        let mut saved = SessionState::fresh(3);
        saved.answers[0] = Some("B".into());
        saved.score = 3;
        store.save(&saved).await;

        let engine = QuizEngine::new(questions(3), RevealTiming::default(), store).await.unwrap();
        assert_eq!(engine.session().score, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn double_submission_is_rejected() {
        let engine = engine("double-submit", 5).await;
        engine.submit_answer("B").unwrap();
        assert_eq!(engine.submit_answer("C"), Err(Error::RevealInProgress));
        assert_eq!(engine.session().score, 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn advance_applies_at_most_once_per_cycle() {
        let engine = engine("idempotent", 5).await;
        engine.submit_answer("B").unwrap();
        engine.advance();
        engine.advance();
        assert_eq!(engine.session().position, 1);

        // Nor does the stale timer add another advance.
        tokio::time::sleep(Duration::from_millis(6000)).await;
        drain().await;
        assert_eq!(engine.session().position, 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn automatic_advance_fires_after_the_total_delay() {
        let engine = engine("auto", 5).await;
        engine.submit_answer("B").unwrap();

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(engine.session().position, 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        drain().await;
        assert_eq!(engine.session().position, 1);
        assert!(engine.snapshot().reveal.is_none());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn overlay_phase_ends_before_the_advance() {
        let engine = engine("overlay", 5).await;
        engine.submit_answer("A").unwrap();
        assert!(engine.snapshot().reveal.unwrap().overlay);

        tokio::time::sleep(Duration::from_millis(1600)).await;
        let reveal = engine.snapshot().reveal.unwrap();
        assert!(!reveal.overlay);
        assert!(!reveal.correct);
        assert_eq!(engine.session().position, 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn custom_timing_is_honored() {
        let timing = RevealTiming { overlay: Duration::from_millis(100), auto_advance: Duration::from_millis(300) };
        let engine = QuizEngine::new(questions(2), timing, scratch_store("timing")).await.unwrap();
        engine.submit_answer("B").unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!engine.snapshot().reveal.unwrap().overlay);

        tokio::time::sleep(Duration::from_millis(200)).await;
        drain().await;
        assert_eq!(engine.session().position, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn revisited_question_can_be_reanswered() {
        let engine = engine("reanswer", 2).await;
        engine.submit_answer("B").unwrap();
        engine.advance();
        assert_eq!(engine.session().score, 1);

        engine.jump_to(1);
        assert!(!engine.submit_answer("A").unwrap());

        let session = engine.session();
        assert_eq!(session.answers[0].as_deref(), Some("A"));
        assert_eq!(session.score, 0);
        assert_invariants(&engine, 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn snapshot_choices_are_stable_until_reset() {
        let engine = engine("choices", 3).await;
        let first = engine.snapshot().question.unwrap().choices;
        assert_eq!(engine.snapshot().question.unwrap().choices, first);
        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, ["A", "B", "C", "D"]);
    }
}
