//! Local arithmetic drills and the fixed unit quizzes.

use rand::Rng;

use crate::store::SolvedProblem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    /// Single digit `+` / `-`.
    Easy,
    /// Adds `*`.
    Medium,
    /// Adds integer division, quotient only.
    Hard,
    /// `x + a = b` or `x - a = b`.
    Equation,
}

impl Difficulty {
    pub fn for_age(age: Option<u32>) -> Self {
        match age {
            None => Self::Easy,
            Some(0..=7) => Self::Easy,
            Some(8..=10) => Self::Medium,
            Some(11..=13) => Self::Hard,
            Some(_) => Self::Equation,
        }
    }
}

fn problem(question: String, answer: i64, explanation: String) -> SolvedProblem {
    SolvedProblem {
        question,
        answer: answer.to_string(),
        explanation: Some(explanation),
    }
}

fn binary(a: i64, b: i64, op: char) -> SolvedProblem {
    match op {
        '+' => problem(
            format!("{a} + {b} = ?"),
            a + b,
            format!("{a}에 {b}를 더하면 {}이 됩니다.", a + b),
        ),
        '-' => problem(
            format!("{a} - {b} = ?"),
            a - b,
            format!("{a}에서 {b}를 빼면 {}이 됩니다.", a - b),
        ),
        '*' => problem(
            format!("{a} * {b} = ?"),
            a * b,
            format!("{a}과 {b}를 곱하면 {}이 됩니다.", a * b),
        ),
        _ => problem(
            format!("{a} / {b} = ? (몫만 입력)"),
            a / b,
            format!("{a}을 {b}로 나누면 몫은 {}이 됩니다.", a / b),
        ),
    }
}

pub fn generate(difficulty: Difficulty, rng: &mut impl Rng) -> SolvedProblem {
    match difficulty {
        Difficulty::Easy => {
            let op = if rng.gen_bool(0.5) { '+' } else { '-' };
            binary(rng.gen_range(1..=10), rng.gen_range(1..=10), op)
        }
        Difficulty::Medium => {
            let op = ['+', '-', '*'][rng.gen_range(0..3)];
            binary(rng.gen_range(1..=20), rng.gen_range(1..=10), op)
        }
        Difficulty::Hard => {
            let op = ['+', '-', '*', '/'][rng.gen_range(0..4)];
            binary(rng.gen_range(1..=50), rng.gen_range(1..=20), op)
        }
        Difficulty::Equation => {
            let a: i64 = rng.gen_range(1..=10);
            let b: i64 = rng.gen_range(1..=20);
            if rng.gen_bool(0.5) {
                problem(
                    format!("x + {a} = {b}, x는?"),
                    b - a,
                    format!("{b}에서 {a}를 빼면 x는 {}입니다.", b - a),
                )
            } else {
                problem(
                    format!("x - {a} = {b}, x는?"),
                    b + a,
                    format!("{b}에 {a}를 더하면 x는 {}입니다.", b + a),
                )
            }
        }
    }
}

/// Fixed problem list for a unit quiz, if the unit exists.
pub fn unit_quiz(unit: &str) -> Option<Vec<SolvedProblem>> {
    let items: &[(&str, i64, &str)] = match unit {
        "1단원" => &[
            ("5 + 3 = ?", 8, "5에 3을 더하면 8입니다."),
            ("10 - 4 = ?", 6, "10에서 4를 빼면 6입니다."),
            ("2 * 7 = ?", 14, "2와 7을 곱하면 14입니다."),
        ],
        "2단원" => &[
            ("15 / 3 = ? (몫만 입력)", 5, "15를 3으로 나누면 몫은 5입니다."),
            ("1/4 + 2/4 = ? (분자만 입력)", 3, "분모가 같으니 분자끼리 더하면 1+2=3입니다."),
            ("x + 7 = 12, x는?", 5, "12에서 7을 빼면 5입니다."),
        ],
        _ => return None,
    };
    Some(
        items
            .iter()
            .map(|(q, a, e)| problem(q.to_string(), *a, e.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_difficulty_for_age() {
        assert_eq!(Difficulty::for_age(None), Difficulty::Easy);
        assert_eq!(Difficulty::for_age(Some(7)), Difficulty::Easy);
        assert_eq!(Difficulty::for_age(Some(8)), Difficulty::Medium);
        assert_eq!(Difficulty::for_age(Some(10)), Difficulty::Medium);
        assert_eq!(Difficulty::for_age(Some(13)), Difficulty::Hard);
        assert_eq!(Difficulty::for_age(Some(14)), Difficulty::Equation);
    }

    #[test]
    fn test_generated_answers_are_consistent() {
        let mut rng = StdRng::seed_from_u64(42);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for _ in 0..50 {
                let p = generate(difficulty, &mut rng);
                let tokens: Vec<&str> = p.question.split_whitespace().collect();
                let a: i64 = tokens[0].parse().unwrap();
                let b: i64 = tokens[2].parse().unwrap();
                let expected = match tokens[1] {
                    "+" => a + b,
                    "-" => a - b,
                    "*" => a * b,
                    _ => a / b,
                };
                assert_eq!(p.answer, expected.to_string(), "{}", p.question);
                assert!(p.explanation.is_some());
            }
        }
    }

    #[test]
    fn test_easy_has_no_multiplication() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let q = generate(Difficulty::Easy, &mut rng).question;
            assert!(!q.contains('*') && !q.contains('/'));
        }
    }

    #[test]
    fn test_equation_solution() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let p = generate(Difficulty::Equation, &mut rng);
            let tokens: Vec<&str> = p.question.split_whitespace().collect();
            let a: i64 = tokens[2].parse().unwrap();
            let b: i64 = tokens[4].trim_end_matches(',').parse().unwrap();
            let x: i64 = p.answer.parse().unwrap();
            match tokens[1] {
                "+" => assert_eq!(x + a, b),
                _ => assert_eq!(x - a, b),
            }
        }
    }

    #[test]
    fn test_unit_quizzes() {
        assert_eq!(unit_quiz("1단원").unwrap().len(), 3);
        assert_eq!(unit_quiz("2단원").unwrap()[2].answer, "5");
        assert!(unit_quiz("3단원").is_none());
    }
}
