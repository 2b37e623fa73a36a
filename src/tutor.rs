//! Tutoring requests proxied to the text generation API.
//!
//! `/explain` turns a student's question into a step-by-step explanation;
//! `/generate-problem` asks the model for a fenced JSON object
//! `{"problem": ..., "answer": ...}` and parses it out of the reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::{GenerationError, TextGenerator};

/// Curriculum position the student picked: school, grade, semester, unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningContext {
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub unit: String,
}

impl LearningContext {
    /// A context is usable once a unit has been chosen.
    pub fn is_selected(&self) -> bool {
        !self.unit.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedProblem {
    pub problem: String,
    pub answer: String,
}

pub fn explain_prompt(question: &str, ctx: &LearningContext) -> String {
    format!(
        "너는 {school} {grade} 학생을 가르치는 수학 선생님이야.\n\
         학습 단원: {semester} '{unit}'\n\
         학생의 질문: \"{question}\"\n\
         학생 눈높이에 맞춰 핵심 개념부터 짚고, 예시를 하나 들어 단계별로 설명해줘.",
        school = ctx.school,
        grade = ctx.grade,
        semester = ctx.semester,
        unit = ctx.unit,
        question = question,
    )
}

pub fn problem_prompt(ctx: &LearningContext) -> String {
    format!(
        "너는 {school} {grade} 수학 문제 출제자야.\n\
         학습 단원: {semester} '{unit}'\n\
         이 단원의 핵심 개념을 쓰는 적당한 난이도의 단답형 문제 하나를 내줘.\n\
         풀이 없이 정답만, 아래 형식의 JSON 블록 하나로만 답해줘.\n\
         ```json\n{{\"problem\": \"문제\", \"answer\": \"정답\"}}\n```",
        school = ctx.school,
        grade = ctx.grade,
        semester = ctx.semester,
        unit = ctx.unit,
    )
}

/// Body of the first fenced block, or the whole text when there is none.
fn fenced_body(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text.trim();
    };
    let after_fence = &text[open + 3..];
    // skip the info string (`json`) up to the end of the line
    let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn value_to_answer(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse `{problem, answer}` out of free-form model output.
pub fn parse_generated_problem(text: &str) -> Result<GeneratedProblem, GenerationError> {
    let body = fenced_body(text);
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            // fall back to the outermost braces
            let start = body.find('{');
            let end = body.rfind('}');
            match (start, end) {
                (Some(s), Some(e)) if s < e => serde_json::from_str(&body[s..=e])?,
                _ => return Err(GenerationError::Malformed("no JSON object in output".into())),
            }
        }
    };

    let problem = value
        .get("problem")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| GenerationError::Malformed("missing problem".into()))?;
    let answer = value
        .get("answer")
        .and_then(value_to_answer)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| GenerationError::Malformed("missing answer".into()))?;

    Ok(GeneratedProblem {
        problem: problem.to_string(),
        answer,
    })
}

pub struct Tutor {
    generator: Arc<dyn TextGenerator>,
}

impl Tutor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn explain(
        &self,
        question: &str,
        ctx: &LearningContext,
    ) -> Result<String, GenerationError> {
        let text = self.generator.generate(&explain_prompt(question, ctx)).await?;
        Ok(text.trim().to_string())
    }

    pub async fn generate_problem(
        &self,
        ctx: &LearningContext,
    ) -> Result<GeneratedProblem, GenerationError> {
        let text = self.generator.generate(&problem_prompt(ctx)).await?;
        debug!(output_length = text.len(), "problem output received");
        parse_generated_problem(&text).inspect_err(|e| {
            warn!(error = %e, "could not parse generated problem");
        })
    }
}
