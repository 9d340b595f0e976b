use model::quiz::Question;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Mixes the per-session seed with the question id so that every question
/// gets its own permutation, yet the order stays put while the user sits
/// on the question.
fn question_seed(seed: u64, id: u32) -> u64 {
    seed ^ u64::from(id).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

/// Returns the question's choices (correct answer plus distractors, empty
/// entries dropped) in a deterministic order keyed by `(seed, id)`.
pub(crate) fn shuffled_choices(seed: u64, question: &Question) -> Vec<String> {
    let mut choices: Vec<String> = core::iter::once(&question.correct_answer)
        .chain(&question.incorrect_answers)
        .filter(|choice| !choice.is_empty())
        .cloned()
        .collect();
    let mut rng = StdRng::seed_from_u64(question_seed(seed, question.id.get()));
    choices.shuffle(&mut rng);
    choices
}
