//! Quiz-taking state: pick an option, submit to lock it in, then move on.

use crate::state::QuizQuestion;

/// How an option should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Plain,
    Selected,
    Correct,
    Incorrect,
}

#[derive(Debug, Default)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    index: usize,
    selected: Option<usize>,
    submitted: bool,
    score: usize,
    answered: usize,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the question set and reset all progress
    pub fn load(&mut self, questions: Vec<QuizQuestion>) {
        self.questions = questions;
        self.reset();
    }

    /// Start the same questions over
    pub fn reset(&mut self) {
        self.index = 0;
        self.selected = None;
        self.submitted = false;
        self.score = 0;
        self.answered = 0;
    }

    /// Record a pending answer. Ignored once the question is submitted.
    pub fn select(&mut self, option: usize) {
        if self.submitted {
            return;
        }
        if let Some(q) = self.current() {
            if option < q.options.len() {
                self.selected = Some(option);
            }
        }
    }

    /// Lock in the pending answer. Returns whether it was correct, or `None`
    /// if there was nothing to submit.
    pub fn submit(&mut self) -> Option<bool> {
        if self.submitted {
            return None;
        }
        let selected = self.selected?;
        let correct = self.current()?.correct_answer == selected;

        if correct {
            self.score += 1;
        }
        self.answered += 1;
        self.submitted = true;
        Some(correct)
    }

    /// Move to the next question; only after submitting, never past the last
    pub fn advance(&mut self) -> bool {
        if !self.submitted || self.index + 1 >= self.questions.len() {
            return false;
        }
        self.index += 1;
        self.selected = None;
        self.submitted = false;
        true
    }

    pub fn is_complete(&self) -> bool {
        !self.questions.is_empty() && self.submitted && self.index + 1 == self.questions.len()
    }

    pub fn mark(&self, option: usize) -> OptionMark {
        let Some(q) = self.current() else {
            return OptionMark::Plain;
        };
        let is_selected = self.selected == Some(option);

        if self.submitted {
            if option == q.correct_answer {
                return OptionMark::Correct;
            }
            if is_selected {
                return OptionMark::Incorrect;
            }
            return OptionMark::Plain;
        }

        if is_selected {
            OptionMark::Selected
        } else {
            OptionMark::Plain
        }
    }

    /// Final score as a whole percentage of all questions
    pub fn percentage(&self) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        (self.score as f64 * 100.0 / self.questions.len() as f64).round() as u32
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: usize) -> QuizQuestion {
        QuizQuestion {
            question: "2+2?".to_string(),
            options: vec!["3".to_string(), "4".to_string(), "5".to_string()],
            correct_answer: correct,
        }
    }

    fn session(correct: &[usize]) -> QuizSession {
        let mut quiz = QuizSession::new();
        quiz.load(correct.iter().map(|&c| question(c)).collect());
        quiz
    }

    #[test]
    fn test_single_question_perfect_score() {
        let mut quiz = session(&[1]);
        quiz.select(1);
        assert_eq!(quiz.submit(), Some(true));

        assert!(quiz.is_complete());
        assert_eq!(quiz.score(), 1);
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz.percentage(), 100);
    }

    #[test]
    fn test_submit_requires_selection() {
        let mut quiz = session(&[0]);
        assert_eq!(quiz.submit(), None);
        assert!(!quiz.is_submitted());
    }

    #[test]
    fn test_cannot_advance_before_submit() {
        let mut quiz = session(&[0, 1]);
        quiz.select(0);
        assert!(!quiz.advance());
        quiz.submit();
        assert!(quiz.advance());
        assert_eq!(quiz.index(), 1);
        assert_eq!(quiz.selected(), None);
    }

    #[test]
    fn test_selection_locked_after_submit() {
        let mut quiz = session(&[2]);
        quiz.select(0);
        quiz.submit();
        quiz.select(2);
        assert_eq!(quiz.selected(), Some(0));
        assert_eq!(quiz.submit(), None);
        assert_eq!(quiz.score(), 0);
    }

    #[test]
    fn test_out_of_range_option_ignored() {
        let mut quiz = session(&[0]);
        quiz.select(7);
        assert_eq!(quiz.selected(), None);
    }

    #[test]
    fn test_marks_after_wrong_answer() {
        let mut quiz = session(&[1]);
        quiz.select(2);
        assert_eq!(quiz.mark(2), OptionMark::Selected);
        quiz.submit();

        assert_eq!(quiz.mark(1), OptionMark::Correct);
        assert_eq!(quiz.mark(2), OptionMark::Incorrect);
        assert_eq!(quiz.mark(0), OptionMark::Plain);
    }

    #[test]
    fn test_score_counts_correct_answers_only() {
        // (correct, picked)
        let answers = [(1, 1), (0, 2), (2, 0), (1, 0)];
        let mut quiz = session(&answers.iter().map(|&(c, _)| c).collect::<Vec<_>>());

        for (n, &(_, pick)) in answers.iter().enumerate() {
            quiz.select(pick);
            quiz.submit();
            assert!(quiz.score() <= quiz.answered());
            assert_eq!(quiz.answered(), n + 1);
            quiz.advance();
        }

        assert_eq!(quiz.score(), 1);
        assert!(quiz.is_complete());
        assert_eq!(quiz.percentage(), 25);
    }

    #[test]
    fn test_percentage_rounds_to_nearest() {
        let mut quiz = session(&[0, 0, 0]);
        for pick in [0, 0, 1] {
            quiz.select(pick);
            quiz.submit();
            quiz.advance();
        }
        // 2/3 = 66.67%
        assert_eq!(quiz.percentage(), 67);
    }

    #[test]
    fn test_reset_starts_over() {
        let mut quiz = session(&[0]);
        quiz.select(0);
        quiz.submit();
        quiz.reset();

        assert!(!quiz.is_complete());
        assert_eq!(quiz.score(), 0);
        assert_eq!(quiz.answered(), 0);
        assert_eq!(quiz.index(), 0);
    }
}
