//! System prompts and user-prompt builders for the reasoning stages.

use palco_client::chat::ChatMessage;
use palco_core::{DataProfile, Findings};

use crate::constraints::Constraints;

/// Analyst persona: turns a data profile into evidence-backed findings.
pub const ANALYST_PROMPT: &str = "\
You are the data analyst of an event-marketing insight platform. You receive \
a customer data profile with percentiles, quality metrics and behavioral \
summaries. Your job is to surface evidence-backed findings: key segments, \
opportunities and risks.

Every finding must cite concrete evidence from the profile (numbers, \
percentiles, rates). Do not invent data. Do not propose strategies yet.

Return valid JSON with exactly this shape:
{
  \"key_segments\": [ { \"name\": string, \"size\": integer, \
\"rfm\": { \"R\"?: number, \"F\"?: number, \"M\"?: number }, \
\"traits\"?: [string], \"evidence\": [string] } ],
  \"opportunities\": [ { \"hypothesis\": string, \"evidence\": [string], \
\"est_impact\": string } ],
  \"risks\": [ { \"desc\": string, \"evidence\": [string] } ]
}
Segment sizes must not exceed the profile's total customer count.";

/// Strategist persona: turns findings into actionable strategies.
pub const STRATEGIST_PROMPT: &str = "\
You are the marketing strategist of an event-marketing insight platform. You \
receive evidence-backed findings and campaign constraints, and produce \
specific, actionable strategies. Each strategy must cite at least two pieces \
of evidence from the findings and respect the budget, margin, channel and \
capacity constraints.

Speak like a marketing manager presenting to the team: confident, clear, \
specific about audience, channel, offer, timing and measurable KPIs.

Return valid JSON with exactly this shape:
{
  \"strategies\": [ {
    \"title\": string,
    \"target_segment\": string,
    \"channel\": [string],
    \"offer\": { \"type\": string, \"value\": string },
    \"timing\": { \"start_rule\": string, \"cadence\": string },
    \"kpi\": { \"metric\": string, \"goal\": string, \"timebox_days\": positive integer },
    \"rationale\": [string],
    \"constraints_check\": { \"capacity_ok\": boolean, \"margin_ok\": boolean },
    \"predicted_uplift\"?: { \"method\": string, \"value_pct\": number }
  } ]
}";

/// Messages for the findings stage: analyst persona plus the validated
/// profile as context.
pub fn findings_messages(objective: &str, profile: &DataProfile) -> Vec<ChatMessage> {
    let profile_json =
        serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string());
    let user = format!(
        "Objective: {objective}\n\nDataProfile:\n{profile_json}\n\n\
         Generate findings with concrete evidence."
    );
    vec![ChatMessage::system(ANALYST_PROMPT), ChatMessage::user(user)]
}

/// Messages for the strategy stage: strategist persona plus findings
/// and constraints.
pub fn strategy_messages(
    objective: &str,
    findings: &Findings,
    constraints: &Constraints,
) -> Vec<ChatMessage> {
    let findings_json =
        serde_json::to_string_pretty(findings).unwrap_or_else(|_| "{}".to_string());
    let constraints_json =
        serde_json::to_string_pretty(constraints).unwrap_or_else(|_| "{}".to_string());
    let user = format!(
        "Objective: {objective}\n\nFindings:\n{findings_json}\n\n\
         Constraints:\n{constraints_json}\n\n\
         Generate 3-5 strategies. Each must cite evidence and be specific."
    );
    vec![ChatMessage::system(STRATEGIST_PROMPT), ChatMessage::user(user)]
}
