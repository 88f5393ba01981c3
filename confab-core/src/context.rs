//! Token-budgeted assembly of the message list for one completion call.

use crate::estimator::TokenEstimator;
use crate::history::HistoryStore;
use crate::message::Message;
use crate::turn::Turn;

/// Inputs for one context assembly pass.
#[derive(Debug, Clone)]
pub struct ContextParams<'a> {
    /// The question being asked right now; always the final user message.
    pub question: &'a str,
    /// Active policy prompt; always the leading system message.
    pub system_prompt: &'a str,
    /// Whether prior turns may be replayed at all.
    pub include_history: bool,
    /// Token budget for the replayed pairs plus the question.
    pub token_limit: usize,
    /// Model name, for tokenizer selection.
    pub model: &'a str,
}

/// Build the exact ordered message list sent to the completion API.
///
/// Walks history newest to oldest and replays as many eligible turns as the
/// budget allows: the question's own cost counts first, each replayed turn
/// costs `estimate(question) + estimate(answer)`, and the walk stops at the
/// first turn that would reach the limit (older turns are not considered).
/// Translation and Summary turns are never replayed. Included pairs keep
/// chronological order. The current question is never dropped: a budget too
/// small for anything still yields `[system, question]`.
///
/// Pure given its inputs; performs no I/O.
pub fn assemble(
    estimator: &TokenEstimator,
    history: &HistoryStore,
    params: &ContextParams<'_>,
) -> Vec<Message> {
    // Selected turns, newest first.
    let mut selected: Vec<&Turn> = Vec::new();

    if params.include_history && params.token_limit > 0 {
        let mut running = estimator.estimate(params.model, params.question);

        for turn in history.iter().rev() {
            if !turn.kind.replayable() {
                continue;
            }
            let cost = estimator.estimate(params.model, &turn.question)
                + estimator.estimate(params.model, &turn.answer);
            if running + cost >= params.token_limit {
                break;
            }
            running += cost;
            selected.push(turn);
        }
    }

    let mut messages = Vec::with_capacity(selected.len() * 2 + 2);
    messages.push(Message::system(params.system_prompt));
    for turn in selected.iter().rev() {
        messages.push(Message::user(turn.question.as_str()));
        messages.push(Message::assistant(turn.answer.as_str()));
    }
    messages.push(Message::user(params.question));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::turn::TurnKind;
    use serde_json::Value;

    const MODEL: &str = "gpt-4o-mini";

    fn turn(question: &str, answer: &str, kind: TurnKind) -> Turn {
        Turn::new(question, answer, kind, Value::Null, Value::Null)
    }

    fn params<'a>(question: &'a str, token_limit: usize) -> ContextParams<'a> {
        ContextParams {
            question,
            system_prompt: "You are helpful.",
            include_history: true,
            token_limit,
            model: MODEL,
        }
    }

    fn contents(messages: &[Message]) -> Vec<(&Role, &str)> {
        messages
            .iter()
            .map(|m| (&m.role, m.content.as_str()))
            .collect()
    }

    #[test]
    fn test_empty_history_yields_system_and_question() {
        let estimator = TokenEstimator::new();
        let history = HistoryStore::new(5);

        let window = assemble(&estimator, &history, &params("hello", 10_000));
        assert_eq!(
            contents(&window),
            vec![(&Role::System, "You are helpful."), (&Role::User, "hello")]
        );
    }

    #[test]
    fn test_include_history_false_ignores_turns() {
        let estimator = TokenEstimator::new();
        let mut history = HistoryStore::new(5);
        history.append(turn("earlier", "stuff", TurnKind::Chat));

        let mut p = params("hello", 10_000);
        p.include_history = false;
        let window = assemble(&estimator, &history, &p);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_replays_in_chronological_order() {
        let estimator = TokenEstimator::new();
        let mut history = HistoryStore::new(2);
        history.append(turn("question a", "answer a", TurnKind::Chat));
        history.append(turn("question b", "answer b", TurnKind::Chat));
        history.append(turn("question c", "answer c", TurnKind::Chat));

        // Capacity 2: A was evicted, the window replays B then C.
        let window = assemble(&estimator, &history, &params("current", 10_000));
        assert_eq!(
            contents(&window),
            vec![
                (&Role::System, "You are helpful."),
                (&Role::User, "question b"),
                (&Role::Assistant, "answer b"),
                (&Role::User, "question c"),
                (&Role::Assistant, "answer c"),
                (&Role::User, "current"),
            ]
        );
    }

    #[test]
    fn test_translation_and_summary_turns_never_replayed() {
        let estimator = TokenEstimator::new();
        let mut history = HistoryStore::new(5);
        history.append(turn("translate me", "übersetzt", TurnKind::Translation));
        history.append(turn("real question", "real answer", TurnKind::Chat));
        history.append(turn("session so far", "a summary", TurnKind::Summary));

        let window = assemble(&estimator, &history, &params("current", 10_000));
        assert_eq!(
            contents(&window),
            vec![
                (&Role::System, "You are helpful."),
                (&Role::User, "real question"),
                (&Role::Assistant, "real answer"),
                (&Role::User, "current"),
            ]
        );
    }

    #[test]
    fn test_budget_stops_walk_at_older_turns() {
        let estimator = TokenEstimator::new();
        let mut history = HistoryStore::new(5);
        history.append(turn("oldest question", "oldest answer", TurnKind::Chat));
        history.append(turn("newest question", "newest answer", TurnKind::Chat));

        let question = "current question";
        // Budget: question plus exactly the newest pair fits, the older
        // pair would reach the limit.
        let question_cost = estimator.estimate(MODEL, question);
        let newest_cost = estimator.estimate(MODEL, "newest question")
            + estimator.estimate(MODEL, "newest answer");
        let limit = question_cost + newest_cost + 1;

        let window = assemble(&estimator, &history, &params(question, limit));
        assert_eq!(
            contents(&window),
            vec![
                (&Role::System, "You are helpful."),
                (&Role::User, "newest question"),
                (&Role::Assistant, "newest answer"),
                (&Role::User, question),
            ]
        );
    }

    #[test]
    fn test_question_larger_than_budget_degrades_gracefully() {
        let estimator = TokenEstimator::new();
        let mut history = HistoryStore::new(5);
        history.append(turn("some", "history", TurnKind::Chat));

        let window = assemble(&estimator, &history, &params("a very long question indeed", 1));
        assert_eq!(
            contents(&window),
            vec![
                (&Role::System, "You are helpful."),
                (&Role::User, "a very long question indeed"),
            ]
        );
    }

    #[test]
    fn test_window_cost_stays_under_limit() {
        let estimator = TokenEstimator::new();
        let mut history = HistoryStore::new(10);
        for i in 0..10 {
            history.append(turn(
                &format!("question number {i} with some padding words"),
                &format!("answer number {i} with a bit more padding in it"),
                TurnKind::Chat,
            ));
        }

        let question = "the current question";
        for limit in [1usize, 10, 25, 50, 100, 500, 10_000] {
            let window = assemble(&estimator, &history, &params(question, limit));
            // Cost of everything except the system message.
            let cost: usize = window
                .iter()
                .skip(1)
                .map(|m| estimator.estimate(MODEL, &m.content))
                .sum();
            let question_cost = estimator.estimate(MODEL, question);
            // The question itself is always included, even over budget.
            if cost > question_cost {
                assert!(cost < limit, "cost {cost} must stay under limit {limit}");
            }
        }
    }
}
