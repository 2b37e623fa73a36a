use chrono::NaiveDate;

/// One parsed chat input. Prefixes are checked in order; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    EasterEgg,
    RequestProblem,
    RequestExplanation,
    /// `/단원평가 <unit>`. `None` when the unit was left out.
    StartUnitQuiz(Option<String>),
    AddEvent { date: NaiveDate, title: String },
    MalformedEvent,
    /// `/목표설정 <goal>`. `None` when the goal was left out.
    SetGoal(Option<String>),
    /// `/추천 <topic>`. `None` when the topic was left out.
    Recommend(Option<String>),
    Progress,
    LearningPath,
    Compliment,
    Help,
    QuitQuiz,
    Text(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        if input.starts_with("//easter egg") {
            Self::EasterEgg
        } else if input.starts_with("/문제") {
            Self::RequestProblem
        } else if input.starts_with("/해설") {
            Self::RequestExplanation
        } else if let Some(rest) = input.strip_prefix("/단원평가") {
            Self::StartUnitQuiz(rest.split_whitespace().next().map(str::to_string))
        } else if let Some(rest) = input.strip_prefix("/일정추가") {
            parse_event(rest)
        } else if let Some(rest) = input.strip_prefix("/목표설정") {
            Self::SetGoal(argument(rest))
        } else if let Some(rest) = input.strip_prefix("/추천") {
            Self::Recommend(argument(rest))
        } else if input.starts_with("/학습진도") {
            Self::Progress
        } else if input.starts_with("/학습경로") {
            Self::LearningPath
        } else if input.starts_with("/칭찬해줘") {
            Self::Compliment
        } else if input.starts_with("/도움말") {
            Self::Help
        } else if input == "그만할래" {
            Self::QuitQuiz
        } else {
            Self::Text(input.to_string())
        }
    }
}

fn argument(rest: &str) -> Option<String> {
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

fn parse_event(rest: &str) -> Command {
    let mut parts = rest.split_whitespace();
    let date = parts
        .next()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    let title = parts.collect::<Vec<_>>().join(" ");

    match date {
        Some(date) if !title.is_empty() => Command::AddEvent { date, title },
        _ => Command::MalformedEvent,
    }
}

/// Compare an answer with the expected one after stripping all whitespace.
/// Numeric when both sides parse as numbers, textual otherwise.
pub fn is_correct(expected: &str, given: &str) -> bool {
    let expected: String = expected.chars().filter(|c| !c.is_whitespace()).collect();
    let given: String = given.chars().filter(|c| !c.is_whitespace()).collect();
    if given.is_empty() {
        return false;
    }

    if expected == given {
        return true;
    }

    match (expected.parse::<f64>(), given.parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() < 1e-9,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(Command::parse("//easter egg"), Command::EasterEgg);
        assert_eq!(Command::parse("  /문제 주세요"), Command::RequestProblem);
        assert_eq!(Command::parse("/해설"), Command::RequestExplanation);
        assert_eq!(Command::parse("/학습진도"), Command::Progress);
        assert_eq!(Command::parse("/학습경로"), Command::LearningPath);
        assert_eq!(Command::parse("/칭찬해줘"), Command::Compliment);
        assert_eq!(Command::parse("/도움말"), Command::Help);
        assert_eq!(Command::parse("그만할래"), Command::QuitQuiz);
        assert_eq!(
            Command::parse("그만할래요"),
            Command::Text("그만할래요".to_string())
        );
    }

    #[test]
    fn test_parse_unit_quiz() {
        assert_eq!(
            Command::parse("/단원평가 1단원"),
            Command::StartUnitQuiz(Some("1단원".to_string()))
        );
        assert_eq!(Command::parse("/단원평가"), Command::StartUnitQuiz(None));
    }

    #[test]
    fn test_parse_goal_and_recommend() {
        assert_eq!(
            Command::parse("/목표설정 매일 10문제 풀기"),
            Command::SetGoal(Some("매일 10문제 풀기".to_string()))
        );
        assert_eq!(Command::parse("/목표설정   "), Command::SetGoal(None));
        assert_eq!(
            Command::parse("/추천 수학"),
            Command::Recommend(Some("수학".to_string()))
        );
        assert_eq!(Command::parse("/추천"), Command::Recommend(None));
    }

    #[test]
    fn test_parse_event() {
        assert_eq!(
            Command::parse("/일정추가 2024-05-01 수학 시험"),
            Command::AddEvent {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                title: "수학 시험".to_string(),
            }
        );
        assert_eq!(Command::parse("/일정추가 2024-05-01"), Command::MalformedEvent);
        assert_eq!(Command::parse("/일정추가 내일 시험"), Command::MalformedEvent);
    }

    #[test]
    fn test_is_correct() {
        assert!(is_correct("8", " 8 "));
        assert!(is_correct("8", "8.0"));
        assert!(is_correct("-3", "- 3"));
        assert!(!is_correct("8", "9"));
        assert!(!is_correct("8", ""));
        assert!(is_correct("3/4", "3 / 4"));
        assert!(!is_correct("3/4", "0.75"));
    }

    #[test]
    fn test_identical_non_finite_answers_match() {
        assert!(is_correct("NaN", "NaN"));
        assert!(is_correct("inf", " inf"));
        assert!(!is_correct("inf", "-inf"));
    }
}
