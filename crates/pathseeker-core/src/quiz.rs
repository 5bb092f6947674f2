//! Career assessment quiz.
//!
//! A fixed bank of multiple-choice questions walked one at a time. Moving
//! forward requires an answer to the current question.

pub struct Question {
    pub text: &'static str,
    pub options: [&'static str; 4],
}

pub static QUESTIONS: [Question; 4] = [
    Question {
        text: "What type of work environment do you prefer?",
        options: [
            "Collaborative team environment",
            "Independent work with minimal supervision",
            "Dynamic, fast-paced environment",
            "Structured, organized workplace",
        ],
    },
    Question {
        text: "Which activity sounds most appealing to you?",
        options: [
            "Solving complex technical problems",
            "Creating visual designs and experiences",
            "Analyzing data to find insights",
            "Leading and managing teams",
        ],
    },
    Question {
        text: "What motivates you most in your career?",
        options: [
            "Making a positive impact on society",
            "Financial success and stability",
            "Creative expression and innovation",
            "Recognition and professional growth",
        ],
    },
    Question {
        text: "How do you prefer to learn new skills?",
        options: [
            "Hands-on experience and practice",
            "Reading and theoretical study",
            "Mentorship and guidance from experts",
            "Trial and error experimentation",
        ],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizState {
    current: usize,
    answers: Vec<Option<usize>>,
}

impl Default for QuizState {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizState {
    pub fn new() -> Self {
        Self {
            current: 0,
            answers: vec![None; QUESTIONS.len()],
        }
    }

    pub fn total(&self) -> usize {
        QUESTIONS.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &'static Question {
        &QUESTIONS[self.current]
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.total()
    }

    /// Record the chosen option for the current question.
    /// Returns false (and records nothing) for an unknown option.
    pub fn answer(&mut self, option: usize) -> bool {
        if option >= self.current_question().options.len() {
            return false;
        }
        self.answers[self.current] = Some(option);
        true
    }

    pub fn current_answer(&self) -> Option<usize> {
        self.answers[self.current]
    }

    /// Next is only available once the current question is answered
    pub fn can_advance(&self) -> bool {
        !self.is_last() && self.current_answer().is_some()
    }

    pub fn next(&mut self) -> bool {
        if self.can_advance() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.is_first() {
            false
        } else {
            self.current -= 1;
            true
        }
    }

    /// Position-based progress: (current + 1) / total * 100
    pub fn progress_percent(&self) -> f64 {
        (self.current + 1) as f64 / self.total() as f64 * 100.0
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.answered_count() == self.total()
    }

    /// Question text paired with the chosen option, for answered questions
    pub fn responses(&self) -> Vec<(&'static str, &'static str)> {
        QUESTIONS
            .iter()
            .zip(&self.answers)
            .filter_map(|(q, a)| a.map(|i| (q.text, q.options[i])))
            .collect()
    }
}
