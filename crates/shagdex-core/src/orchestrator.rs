//! Tool-calling orchestrator: the loop between a user question and the
//! oracle, with tool dispatch in the middle. The single public entry point
//! is [`Orchestrator::answer`], which always produces a user-legible string;
//! transport errors, tool mistakes and runaway loops all degrade to fixed
//! messages instead of surfacing internals.

use crate::cache::AnswerCache;
use crate::errors::OracleError;
use crate::providers::llm::{Oracle, OracleReply, OracleRequest};
use crate::store::RecordSet;
use crate::tools;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const EMPTY_QUESTION: &str = "Please ask a question about the contest archive.";
const NO_DATA: &str =
    "The contest archive is not loaded right now, so I can't answer data questions. \
     Please try again later or contact the site operator.";
const ROUNDS_EXHAUSTED: &str =
    "That question needed more research than I can do in one sitting. \
     Try narrowing it down, for example to one dancer, contest, or year range.";
const EMPTY_REPLY: &str =
    "I couldn't put together an answer to that one. Try rephrasing your question.";

pub struct Orchestrator {
    oracle: Arc<dyn Oracle>,
    /// `None` when the snapshot failed to load; the orchestrator still
    /// answers, in degraded mode.
    records: Option<Arc<RecordSet>>,
    cache: AnswerCache,
    max_rounds: usize,
    retry_backoff: Duration,
    sample_rows: usize,
}

impl Orchestrator {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        records: Option<Arc<RecordSet>>,
        cache: AnswerCache,
        max_rounds: usize,
        retry_backoff: Duration,
        sample_rows: usize,
    ) -> Self {
        Self {
            oracle,
            records,
            cache,
            max_rounds,
            retry_backoff,
            sample_rows,
        }
    }

    /// Answer one question. Infallible: every failure mode maps to a fixed
    /// degraded message, and only genuine answers are cached.
    pub async fn answer(&self, question: &str) -> String {
        let question = question.trim();
        if question.is_empty() {
            return EMPTY_QUESTION.to_string();
        }

        if let Some(hit) = self.cache.get(question) {
            debug!("answer served from cache");
            return hit;
        }

        let Some(records) = &self.records else {
            warn!("question received while archive is unloaded");
            return NO_DATA.to_string();
        };

        let system = self.system_prompt(records);
        let catalog = tools::catalog();
        let mut messages: Vec<Value> = vec![json!({"role": "user", "content": question})];

        for round in 0..self.max_rounds {
            let request = OracleRequest {
                system: system.clone(),
                messages: messages.clone(),
                tools: catalog.clone(),
            };
            let reply = match self.chat_with_retry(&request).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(round, error = %e, "oracle failed, degrading");
                    return e.user_message().to_string();
                }
            };

            if reply.tool_calls.is_empty() {
                let answer = if reply.text.trim().is_empty() {
                    EMPTY_REPLY.to_string()
                } else {
                    reply.text
                };
                info!(rounds = round + 1, "question answered");
                self.cache.store(question, &answer);
                return answer;
            }

            debug!(round, tools = reply.tool_calls.len(), "dispatching tool calls");
            messages.push(assistant_turn(&reply));
            messages.push(tool_results_turn(records, &reply));
        }

        // The oracle kept asking for tools past the round limit. Not cached:
        // a retry may well succeed.
        warn!(max_rounds = self.max_rounds, "round limit reached");
        ROUNDS_EXHAUSTED.to_string()
    }

    /// One retry on transient failures, then give up. Auth and malformed
    /// replies fail immediately.
    async fn chat_with_retry(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        match self.oracle.chat(request).await {
            Ok(reply) => Ok(reply),
            Err(e) if e.is_retryable() => {
                debug!(error = %e, backoff_ms = self.retry_backoff.as_millis(), "retrying oracle");
                tokio::time::sleep(self.retry_backoff).await;
                self.oracle.chat(request).await
            }
            Err(e) => Err(e),
        }
    }

    /// Persona, anti-dump rules, archive overview, and a handful of raw rows
    /// as format examples. Statistics always come from tools, never from the
    /// sample.
    fn system_prompt(&self, records: &RecordSet) -> String {
        let sample = serde_json::to_string_pretty(&records.sample_rows(self.sample_rows))
            .unwrap_or_default();
        format!(
            "You are the Shag Archive Assistant, an expert on competitive shag dancing with \
             access to the complete Competitive Shaggers Association (CSA) and National Shag \
             Dance Championship (NSDC) contest archive.\n\
             \n\
             CRITICAL RULES:\n\
             - NEVER provide bulk data exports or complete lists\n\
             - Limit table responses to a maximum of 10 rows\n\
             - Focus on insights, trends, and specific answers rather than raw data dumps\n\
             - If asked for \"all\" or \"complete\" data, provide summarized insights instead\n\
             - Every statistic you state must come from a tool result in this conversation, \
             never from memory or from the sample rows below\n\
             \n\
             ARCHIVE OVERVIEW:\n{overview}\n\
             \n\
             SAMPLE RECORDS (format reference only):\n{sample}\n\
             \n\
             RESPONSE GUIDELINES:\n\
             - Use markdown formatting; tables for comparative data (max 10 rows)\n\
             - Explain what placements mean and highlight interesting patterns\n\
             - When judge data is involved, mention how many matching records carry no judge \
             data\n\
             - Be conversational and engaging while staying accurate",
            overview = records.knowledge_summary(),
        )
    }
}

/// The oracle's own turn, echoed back with its tool_use blocks so the next
/// round has the full exchange.
fn assistant_turn(reply: &OracleReply) -> Value {
    let mut blocks: Vec<Value> = Vec::new();
    if !reply.text.is_empty() {
        blocks.push(json!({"type": "text", "text": reply.text}));
    }
    for call in &reply.tool_calls {
        blocks.push(json!({
            "type": "tool_use",
            "id": call.id,
            "name": call.name,
            "input": call.arguments,
        }));
    }
    json!({"role": "assistant", "content": blocks})
}

/// Dispatch every requested tool and pack the results into one user turn.
/// Tool errors ride along as ordinary results for the oracle to rephrase.
fn tool_results_turn(records: &RecordSet, reply: &OracleReply) -> Value {
    let results: Vec<Value> = reply
        .tool_calls
        .iter()
        .map(|call| {
            let result = tools::dispatch(records, &call.name, &call.arguments);
            json!({
                "type": "tool_result",
                "tool_use_id": call.id,
                "content": result.to_string(),
            })
        })
        .collect();
    json!({"role": "user", "content": results})
}
