//! Acceptance check for LLM answers.

use crate::config::RetrievalConfig;
use crate::text::keywords;
use std::fmt;

/// Why an answer was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    TooShort { chars: usize, min: usize },
    TooManyBullets { count: usize, max: usize },
    LowKeywordCoverage { found: usize, required: usize },
    Fragmented { sentences: usize, chars: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { chars, min } => {
                write!(f, "answer too short ({} < {} chars)", chars, min)
            }
            Self::TooManyBullets { count, max } => {
                write!(f, "too many list markers ({} > {})", count, max)
            }
            Self::LowKeywordCoverage { found, required } => write!(
                f,
                "question keywords not covered ({} of {} required)",
                found, required
            ),
            Self::Fragmented { sentences, chars } => write!(
                f,
                "fragmented answer ({} pieces in {} chars)",
                sentences, chars
            ),
        }
    }
}

/// Heuristic quality gate. Total and deterministic.
#[derive(Debug, Clone)]
pub struct QualityGate {
    min_answer_chars: usize,
    max_bullets: usize,
    keyword_min_chars: usize,
    keyword_coverage: f64,
    max_sentences: usize,
    short_answer_chars: usize,
}

impl QualityGate {
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            min_answer_chars: config.min_answer_chars,
            max_bullets: config.max_bullets,
            keyword_min_chars: config.question_keyword_min_chars,
            keyword_coverage: config.keyword_coverage,
            max_sentences: config.max_answer_sentences,
            short_answer_chars: config.short_answer_chars,
        }
    }

    pub fn accepts(&self, answer: &str, question: &str) -> bool {
        self.evaluate(answer, question).is_ok()
    }

    /// Check `answer` against every rule, reporting the first failure.
    pub fn evaluate(&self, answer: &str, question: &str) -> Result<(), Rejection> {
        let trimmed_chars = answer.trim().chars().count();
        if trimmed_chars < self.min_answer_chars {
            return Err(Rejection::TooShort {
                chars: trimmed_chars,
                min: self.min_answer_chars,
            });
        }

        let bullets = answer.matches('•').count().max(answer.matches("\n-").count());
        if bullets > self.max_bullets {
            return Err(Rejection::TooManyBullets {
                count: bullets,
                max: self.max_bullets,
            });
        }

        let question_keywords = keywords(question, self.keyword_min_chars);
        if !question_keywords.is_empty() {
            let lower = answer.to_lowercase();
            let found = question_keywords
                .iter()
                .filter(|k| lower.contains(k.as_str()))
                .count();
            let required = (self.keyword_coverage * question_keywords.len() as f64)
                .max(1.0)
                .ceil() as usize;
            if found < required {
                return Err(Rejection::LowKeywordCoverage { found, required });
            }
        }

        let chars = answer.chars().count();
        let sentences = sentence_pieces(answer);
        if sentences > self.max_sentences && chars < self.short_answer_chars {
            return Err(Rejection::Fragmented { sentences, chars });
        }

        Ok(())
    }
}

/// Pieces produced by cutting at every run of `.`, `!`, `?`.
fn sentence_pieces(text: &str) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for c in text.chars() {
        let terminal = matches!(c, '.' | '!' | '?');
        if terminal && !in_run {
            runs += 1;
        }
        in_run = terminal;
    }
    runs + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> QualityGate {
        QualityGate::new(&RetrievalConfig::default())
    }

    #[test]
    fn test_short_answer_rejected() {
        let result = gate().evaluate("Python — язык.", "Что такое Python?");
        assert!(matches!(result, Err(Rejection::TooShort { .. })));
        assert!(!gate().accepts("   ", ""));
    }

    #[test]
    fn test_zero_keyword_overlap_rejected() {
        let answer = "Этот ответ достаточно длинный, но совсем не о том, что спрашивали.";
        let result = gate().evaluate(answer, "Расскажите про дифференциальные уравнения");
        assert_eq!(
            result,
            Err(Rejection::LowKeywordCoverage {
                found: 0,
                required: 1
            })
        );
    }

    #[test]
    fn test_well_formed_answer_accepted() {
        // Question keywords: методика, преподавания, математики
        let answer = "Согласно методичке №1, методика преподавания опирается на практические \
                      задачи и регулярную обратную связь.";
        assert!(answer.chars().count() >= 90);
        assert!(gate().accepts(answer, "Методика преподавания математики?"));
    }

    #[test]
    fn test_coverage_scales_with_keyword_count() {
        // Ten keywords require three of them
        let question = "альфа бета1 гамма дельта эпсилон дзета1 этаэт тэтат йотаа каппа";
        let two = "В ответе упомянуты только альфа и гамма, больше ничего полезного нет.";
        let three = "В ответе упомянуты альфа, гамма и дельта, этого уже достаточно для нас.";
        assert!(matches!(
            gate().evaluate(two, question),
            Err(Rejection::LowKeywordCoverage { found: 2, required: 3 })
        ));
        assert!(gate().accepts(three, question));
    }

    #[test]
    fn test_bullet_noise_rejected() {
        let answer = format!("Python:{}", "\n- пункт про python".repeat(11));
        assert!(matches!(
            gate().evaluate(&answer, "python"),
            Err(Rejection::TooManyBullets { count: 11, .. })
        ));
    }

    #[test]
    fn test_dot_bullets_rejected() {
        let answer = format!("Python:{}", " • пункт про python".repeat(12));
        assert!(matches!(
            gate().evaluate(&answer, "python"),
            Err(Rejection::TooManyBullets { count: 12, max: 10 })
        ));

        let ten = format!("Python:{}", " • пункт про python".repeat(10));
        assert!(!matches!(
            gate().evaluate(&ten, "python"),
            Err(Rejection::TooManyBullets { .. })
        ));
    }

    #[test]
    fn test_fragmented_answer_rejected() {
        let answer = "Python. Да. Нет. Так. Вот. Ещё. Там. Тут. Всё.";
        assert!(answer.chars().count() < 200);
        assert!(matches!(
            gate().evaluate(answer, "python"),
            Err(Rejection::Fragmented { .. })
        ));
    }

    #[test]
    fn test_deterministic() {
        let answer = "Python — высокоуровневый язык программирования общего назначения.";
        let first = gate().evaluate(answer, "Что такое Python?");
        assert_eq!(first, gate().evaluate(answer, "Что такое Python?"));
        assert!(first.is_ok());
    }
}
