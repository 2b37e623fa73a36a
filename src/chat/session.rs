use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::canned::{self, APOLOGY};
use super::command::{is_correct, Command};
use super::drills::{self, Difficulty};
use super::{Backend, BackendError};
use crate::ledger::GrantOutcome;
use crate::store::{SessionStore, SolvedProblem, StoreError};
use crate::tutor::LearningContext;

const NUMERIC_HINT: &str = "(답변은 숫자로만 입력해주세요.)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizKind {
    /// Fixed list for one unit.
    Unit,
    /// One solved problem replayed before leaving. Passing it ends the session.
    Farewell,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    Idle,
    AwaitingAnswer {
        problem: SolvedProblem,
    },
    AwaitingQuestion,
    Quiz {
        kind: QuizKind,
        problems: Vec<SolvedProblem>,
        index: usize,
    },
}

/// Bot messages produced by one input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    pub messages: Vec<String>,
    pub session_ended: bool,
}

impl ChatReply {
    fn say(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

pub struct ChatSession {
    backend: Arc<dyn Backend>,
    store: SessionStore,
    context: LearningContext,
    state: ChatState,
    rng: StdRng,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn Backend>, store: SessionStore) -> Self {
        Self::with_rng(backend, store, StdRng::from_entropy())
    }

    pub fn with_rng(backend: Arc<dyn Backend>, store: SessionStore, rng: StdRng) -> Self {
        Self {
            backend,
            store,
            context: LearningContext::default(),
            state: ChatState::Idle,
            rng,
        }
    }

    pub fn set_context(&mut self, context: LearningContext) {
        self.context = context;
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn greeting(&self) -> String {
        match self.store.state().user_age {
            Some(age) => format!("안녕하세요! {age}살이군요. 무엇을 도와드릴까요?"),
            None => "안녕하세요! AI 숙제 비서예요. 몇 살인가요?".to_string(),
        }
    }

    /// Interpret one line of input.
    pub async fn handle(&mut self, input: &str) -> Result<ChatReply, StoreError> {
        let mut reply = ChatReply::default();
        let command = Command::parse(input);
        debug!(command = ?command, "chat input parsed");

        if command == Command::EasterEgg {
            self.easter_egg(&mut reply).await?;
            return Ok(reply);
        }

        if matches!(self.state, ChatState::Quiz { .. }) {
            self.quiz_answer(input, &mut reply)?;
            return Ok(reply);
        }

        match command {
            Command::EasterEgg => {}
            Command::RequestProblem => self.request_problem(&mut reply).await,
            Command::RequestExplanation => {
                self.state = ChatState::AwaitingQuestion;
                reply.say("궁금한 내용을 질문해 주세요. AI 선생님이 설명해 드릴게요.");
            }
            Command::StartUnitQuiz(unit) => self.start_unit_quiz(unit.as_deref(), &mut reply),
            Command::QuitQuiz => self.start_farewell_quiz(&mut reply),
            Command::AddEvent { date, title } => {
                let event = self.store.add_calendar_event(date, &title)?;
                reply.say(format!("'{}'에 '{}' 일정을 추가했어요.", event.date, event.title));
            }
            Command::MalformedEvent => reply.say(
                "일정 추가 형식이 올바르지 않아요. /일정추가 [YYYY-MM-DD] [내용] 형식으로 입력해 주세요.",
            ),
            Command::SetGoal(goal) => reply.say(canned::goal(goal.as_deref())),
            Command::Recommend(topic) => reply.say(canned::recommendation(topic.as_deref())),
            Command::Progress => reply.say(self.progress_report()),
            Command::LearningPath => reply.say(canned::learning_path(self.store.state().user_age)),
            Command::Compliment => reply.say(canned::compliment(&mut self.rng)),
            Command::Help => reply.say(canned::HELP),
            Command::Text(text) => match self.state.clone() {
                ChatState::AwaitingAnswer { problem } => {
                    self.answer(problem, &text, &mut reply).await?
                }
                ChatState::AwaitingQuestion => self.ask(&text, &mut reply).await?,
                _ => self.idle_text(&text, &mut reply).await?,
            },
        }

        Ok(reply)
    }

    fn fail(&mut self, reply: &mut ChatReply, error: BackendError) {
        warn!(error = %error, "backend request failed");
        self.state = ChatState::Idle;
        reply.say(APOLOGY);
    }

    /// Commit the server's record and announce the reward.
    fn commit(
        &mut self,
        outcome: GrantOutcome,
        reply: &mut ChatReply,
        headline: &str,
    ) -> Result<(), StoreError> {
        reply.say(format!(
            "{headline} +{} XP, +{} 머니를 받았어요.",
            outcome.xp_gained, outcome.money_gained
        ));
        if outcome.reputation_changed {
            reply.say(format!(
                "축하해요! 평판이 '{}'(으)로 올랐어요!",
                outcome.user.reputation
            ));
        }
        self.store.apply_server_user(outcome.user)
    }

    async fn reward_progress(
        &mut self,
        reply: &mut ChatReply,
        headline: &str,
    ) -> Result<(), StoreError> {
        let Some(user_id) = self.store.state().user_id() else {
            reply.say(format!("{headline} 로그인하면 보상을 받을 수 있어요."));
            return Ok(());
        };
        match self.backend.update_progress(user_id).await {
            Ok(outcome) => self.commit(outcome, reply, headline),
            Err(e) => {
                self.fail(reply, e);
                Ok(())
            }
        }
    }

    async fn easter_egg(&mut self, reply: &mut ChatReply) -> Result<(), StoreError> {
        let Some(user_id) = self.store.state().user_id() else {
            reply.say("로그인해야 숨겨진 보상을 받을 수 있어요.");
            return Ok(());
        };
        match self.backend.easter_egg(user_id).await {
            Ok(outcome) => {
                info!(user_id, "easter egg found");
                self.commit(outcome, reply, "이스터에그를 찾았어요!")
            }
            Err(e) => {
                self.fail(reply, e);
                Ok(())
            }
        }
    }

    async fn request_problem(&mut self, reply: &mut ChatReply) {
        let problem = if self.context.is_selected() {
            match self.backend.generate_problem(&self.context).await {
                Ok(generated) => SolvedProblem {
                    question: generated.problem,
                    answer: generated.answer,
                    explanation: None,
                },
                Err(e) => return self.fail(reply, e),
            }
        } else {
            let difficulty = Difficulty::for_age(self.store.state().user_age);
            drills::generate(difficulty, &mut self.rng)
        };

        reply.say(format!("새로운 문제가 출제되었어요: {}", problem.question));
        self.state = ChatState::AwaitingAnswer { problem };
    }

    async fn answer(
        &mut self,
        problem: SolvedProblem,
        text: &str,
        reply: &mut ChatReply,
    ) -> Result<(), StoreError> {
        self.store.record_attempt()?;

        if !is_correct(&problem.answer, text) {
            match &problem.explanation {
                Some(hint) => reply.say(format!("오답이에요. 다시 시도해 보세요. 힌트: {hint}")),
                None => reply.say("오답이에요. 다시 시도해 보세요."),
            }
            return Ok(());
        }

        self.state = ChatState::Idle;
        self.store.add_solved_problem(problem)?;
        self.store.record_correct()?;
        self.reward_progress(reply, "정답이에요!").await
    }

    async fn ask(&mut self, question: &str, reply: &mut ChatReply) -> Result<(), StoreError> {
        match self.backend.explain(question, &self.context).await {
            Ok(explanation) => {
                self.state = ChatState::Idle;
                reply.say(explanation);
                self.reward_progress(reply, "좋은 질문이에요!").await
            }
            Err(e) => {
                self.fail(reply, e);
                Ok(())
            }
        }
    }

    fn start_unit_quiz(&mut self, unit: Option<&str>, reply: &mut ChatReply) {
        let Some((unit, problems)) = unit.and_then(|u| drills::unit_quiz(u).map(|p| (u, p))) else {
            reply.say("해당 단원을 찾을 수 없어요. (예: /단원평가 1단원)");
            return;
        };
        reply.say(format!(
            "{unit} 단원 평가를 시작할게요. 첫 번째 문제: {} {NUMERIC_HINT}",
            problems[0].question
        ));
        self.state = ChatState::Quiz {
            kind: QuizKind::Unit,
            problems,
            index: 0,
        };
    }

    fn start_farewell_quiz(&mut self, reply: &mut ChatReply) {
        let Some(problem) = self.store.state().solved_problems.choose(&mut self.rng).cloned() else {
            reply.say("아직 푼 문제가 없어서 퀴즈를 낼 수 없어요. 다음에 다시 시도해 주세요!");
            return;
        };
        reply.say(format!(
            "오늘 푼 문제로 퀴즈를 낼게요. 맞히면 보내 줄게요! 문제: {} {NUMERIC_HINT}",
            problem.question
        ));
        self.state = ChatState::Quiz {
            kind: QuizKind::Farewell,
            problems: vec![problem],
            index: 0,
        };
    }

    fn quiz_answer(&mut self, text: &str, reply: &mut ChatReply) -> Result<(), StoreError> {
        let ChatState::Quiz {
            kind,
            problems,
            index,
        } = std::mem::take(&mut self.state)
        else {
            return Ok(());
        };
        let Some(problem) = problems.get(index).cloned() else {
            return Ok(());
        };

        self.store.record_attempt()?;
        if !is_correct(&problem.answer, text) {
            let hint = problem.explanation.as_deref().unwrap_or("해설 없음");
            reply.say(format!("오답이에요. 다시 시도해 보세요. 힌트: {hint}"));
            self.state = ChatState::Quiz {
                kind,
                problems,
                index,
            };
            return Ok(());
        }
        self.store.record_correct()?;

        match kind {
            QuizKind::Farewell => {
                reply.say("정답이에요! 오늘 하루도 수고했어요. 다음에 또 만나요!");
                reply.session_ended = true;
            }
            QuizKind::Unit => {
                self.store.add_solved_problem(problem)?;
                let next = index + 1;
                match problems.get(next) {
                    Some(p) => {
                        reply.say(format!("정답이에요! 다음 문제: {} {NUMERIC_HINT}", p.question));
                        self.state = ChatState::Quiz {
                            kind,
                            problems,
                            index: next,
                        };
                    }
                    None => reply.say("정답이에요! 단원 평가 문제를 모두 풀었어요. 수고했어요!"),
                }
            }
        }
        Ok(())
    }

    fn progress_report(&self) -> String {
        let progress = self.store.state().learning_progress;
        if progress.total_problems_solved == 0 {
            return "아직 푼 문제가 없어서 학습 진도를 알려 줄 수 없어요. 문제를 풀어 보세요!"
                .to_string();
        }
        format!(
            "지금까지 총 {}문제를 풀었고, {}문제를 맞혔어요. 정답률은 {:.2}%예요.",
            progress.total_problems_solved,
            progress.correct_answers,
            progress.accuracy()
        )
    }

    async fn idle_text(&mut self, text: &str, reply: &mut ChatReply) -> Result<(), StoreError> {
        if self.store.state().user_age.is_none() {
            if let Ok(age @ 1..=99) = text.parse::<u32>() {
                self.store.set_user_age(Some(age))?;
                reply.say(format!("{age}살이군요! 이제 학습을 시작해 볼까요?"));
                return Ok(());
            }
        }

        if let Some(topic) = text.strip_prefix("질문") {
            let topic = topic.trim();
            if topic.is_empty() {
                reply.say("궁금한 주제를 함께 입력해 주세요. (예: 질문 수학이란?)");
            } else if let Some(answer) = canned::knowledge(topic) {
                reply.say(answer);
            } else if self.context.is_selected() {
                match self.backend.explain(topic, &self.context).await {
                    Ok(explanation) => reply.say(explanation),
                    Err(e) => self.fail(reply, e),
                }
            } else {
                reply.say("아직 그 내용은 잘 몰라요. 학습 단원을 고르면 AI 선생님께 물어볼 수 있어요.");
            }
            return Ok(());
        }

        match canned::keyword_reply(text) {
            Some(response) => reply.say(response),
            None => reply.say(canned::encouragement(text, &mut self.rng)),
        }
        Ok(())
    }
}
