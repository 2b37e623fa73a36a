//! Fixed, non-generated replies: knowledge table, keyword replies,
//! encouragements and compliments.

use rand::seq::SliceRandom;
use rand::Rng;

pub const APOLOGY: &str = "죄송해요, 요청을 처리하는 중에 오류가 발생했어요.";

pub const HELP: &str = "제가 할 수 있는 명령어는 다음과 같아요.\n\
- /문제: 새 문제 출제\n\
- /해설: AI 선생님에게 질문하기\n\
- /단원평가 [단원]: 단원 평가 시작 (예: /단원평가 1단원)\n\
- /일정추가 [YYYY-MM-DD] [내용]: 일정 추가\n\
- /목표설정 [목표]: 학습 목표 설정\n\
- /추천 [주제]: 학습 자료 추천\n\
- /학습진도: 지금까지의 정답률\n\
- /학습경로: 나이에 맞는 학습 경로 추천\n\
- /칭찬해줘: 칭찬 한마디\n\
- 질문 [주제]: 지식 검색\n\
- 그만할래: 퀴즈 풀고 종료";

const KNOWLEDGE: &[(&str, &str)] = &[
    ("A가 뭐야?", "A는 알파벳의 첫 번째 글자예요."),
    ("수학이란?", "수학은 수와 양, 모양, 변화의 규칙을 다루는 학문이에요."),
    ("과학이란?", "과학은 자연 현상을 관찰하고 실험해서 원리를 밝혀내는 학문이에요."),
    ("역사란?", "역사는 지나간 일을 기록하고 해석해서 오늘을 이해하는 학문이에요."),
    ("오늘 날씨", "저는 실시간 날씨는 알 수 없어요. 일기 예보를 확인해 주세요!"),
    ("인공지능", "인공지능(AI)은 사람처럼 배우고 추론하는 능력을 컴퓨터 프로그램으로 만든 기술이에요."),
    ("공부 잘하는 법", "꾸준히 복습하고, 모르는 건 바로 질문하고, 충분히 쉬는 게 중요해요!"),
];

/// Keyword replies, checked in order. Farewell comes before greeting
/// because "안녕히" contains "안녕".
const KEYWORDS: &[(&[&str], &str)] = &[
    (&["잘가", "안녕히"], "다음에 또 만나요! 오늘 하루도 정말 잘했어요!"),
    (&["안녕", "하이"], "안녕하세요! 무엇을 도와드릴까요?"),
    (&["고마워", "감사"], "천만에요! 언제든지 도와드릴게요."),
    (&["일정"], "일정을 추가하려면 /일정추가 [YYYY-MM-DD] [내용] 형식으로 입력해 주세요."),
];

const COMPLIMENTS: &[&str] = &[
    "정말 대단해요! 노력한 만큼 꼭 빛날 거예요!",
    "최고예요! 이대로만 하면 못 할 게 없어요!",
    "아주 잘하고 있어요! 가능성이 무궁무진해요!",
    "훌륭해요! 열심히 하는 모습이 멋져요!",
    "멋져요! 이미 충분히 잘하고 있어요!",
];

pub fn knowledge(topic: &str) -> Option<&'static str> {
    KNOWLEDGE
        .iter()
        .find(|(key, _)| *key == topic)
        .map(|(_, answer)| *answer)
}

pub fn keyword_reply(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keys, _)| keys.iter().any(|k| lower.contains(k)))
        .map(|(_, reply)| *reply)
}

pub fn encouragement(input: &str, rng: &mut impl Rng) -> String {
    match rng.gen_range(0..5) {
        0 => format!("'{input}'라고 했군요! 정말 멋진 생각이에요!"),
        1 => format!("'{input}'이(가) 궁금하군요! 궁금한 걸 풀어 가는 모습이 대단해요!"),
        2 => format!("'{input}'에 대해 더 알아볼까요? 열정을 응원해요!"),
        3 => format!("'{input}'라고 했군요! 포기하지 않는 모습이 자랑스러워요!"),
        _ => format!("'{input}'라고 했군요! 할 수 있어요!"),
    }
}

pub fn compliment(rng: &mut impl Rng) -> &'static str {
    COMPLIMENTS.choose(rng).copied().unwrap_or(COMPLIMENTS[0])
}

pub fn goal(goal: Option<&str>) -> String {
    match goal {
        Some(goal) => format!("'{goal}'을(를) 학습 목표로 설정했어요! 꾸준히 노력하면 꼭 달성할 수 있어요!"),
        None => "학습 목표를 입력해 주세요. (예: /목표설정 매일 10문제 풀기)".to_string(),
    }
}

/// Three study links for a topic.
pub fn recommendation(topic: Option<&str>) -> String {
    match topic {
        Some(topic) => format!(
            "'{topic}'에 대한 학습 자료를 추천해요:\n\
             - [{topic} 개념 정리](https://example.com/concept/{topic})\n\
             - [{topic} 문제 풀이](https://example.com/problems/{topic})\n\
             - [{topic} 관련 영상](https://youtube.com/watch?v={topic})"
        ),
        None => "추천받고 싶은 학습 주제를 입력해 주세요. (예: /추천 수학)".to_string(),
    }
}

pub fn learning_path(age: Option<u32>) -> String {
    let Some(age) = age else {
        return "학습 경로를 추천하려면 먼저 나이를 알려 주세요!".to_string();
    };
    let path = match age {
        0..=7 => "기초 연산과 한글 읽기",
        8..=10 => "심화 연산과 독해력 키우기",
        11..=13 => "개념 이해와 문제 해결력 다지기",
        _ => "심화 학습과 진로 탐색",
    };
    format!("{age}살이군요! {path}에 집중하는 것을 추천해요.")
}
