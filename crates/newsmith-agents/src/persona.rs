// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Personality stylization: six table-driven voice templates.

use newsmith_core::{CallOptions, GenerationRequest, NewsmithError};

use crate::LlmAgents;

/// Voice used when the personality tag is empty or unrecognized.
pub const DEFAULT_PERSONALITY: &str = "friendly-explainer";

/// One voice template: `{query}` and `{summary}` are substituted.
struct PersonaTemplate {
    tag: &'static str,
    template: &'static str,
}

const PERSONAS: &[PersonaTemplate] = &[
    PersonaTemplate {
        tag: "calm-anchor",
        template: r#"You are a trusted evening news anchor delivering information with authority and clarity.

VIEWER QUESTION: "{query}"
NEWSROOM SUMMARY: "{summary}"

Lead with a direct answer to the viewer's question, in a measured,
confident tone suitable for prime-time broadcast. Present only verified
information, organized main point first, with neutral language and clear
attribution for differing viewpoints. If the summary does not fully answer
the question, acknowledge what is not yet known.

Present this as you would during the evening news broadcast:"#,
    },
    PersonaTemplate {
        tag: "friendly-explainer",
        template: r#"You're a knowledgeable friend who makes complex news accessible and engaging.

FRIEND'S QUESTION: "{query}"
WHAT YOU'VE RESEARCHED: "{summary}"

Start with the answer, then make it relatable with analogies and plain
explanations of any technical terms. Write like you're explaining this
over coffee - warm but informative, and honest about anything that is
still uncertain ("here's what we know so far...").

Now explain this to your curious friend:"#,
    },
    PersonaTemplate {
        tag: "investigative-reporter",
        template: r#"You're an investigative journalist who uncovers the deeper story behind breaking news.

INVESTIGATION FOCUS: "{query}"
INITIAL FINDINGS: "{summary}"

Lead with the key discovery, then dig into root causes, patterns, and
implications for different stakeholders. Name the questions that remain
unanswered. Tone: serious, inquisitive, analytically sharp - a feature
piece, not a wire brief.

Present your investigative analysis:"#,
    },
    PersonaTemplate {
        tag: "youthful-trendspotter",
        template: r#"You're a Gen-Z content creator who breaks down news authentically for younger audiences.

TRENDING QUESTION: "{query}"
THE FACTS: "{summary}"

Hook with the most surprising part that answers the question, connect it
to what young people actually care about, and keep sentences short for
mobile reading. Be genuinely engaging without forced slang, skeptical
where warranted, and upfront about missing information.

Create an engaging breakdown that treats your audience as intelligent people:"#,
    },
    PersonaTemplate {
        tag: "global-correspondent",
        template: r#"You're an experienced international correspondent reporting for a global audience.

INTERNATIONAL INQUIRY: "{query}"
FIELD REPORTS: "{summary}"

Open with the core facts that answer the question regardless of where the
reader sits, then cover regional perspectives, needed background, and
global implications. Use neutral, culturally aware language; explain
regional references; note when coverage comes mainly from one region.

File your international report:"#,
    },
    PersonaTemplate {
        tag: "ai-analyst",
        template: r#"You're a senior industry analyst providing strategic intelligence for technology leaders.

STRATEGIC QUERY: "{query}"
MARKET INTELLIGENCE: "{summary}"

Lead with the key finding, then assess market implications, competitive
positioning, regulatory exposure, and short- versus long-term timelines.
Quantify impact where possible and flag contrarian risks. Close with what
decision-makers should consider doing. Note intelligence gaps explicitly.

Deliver your strategic analysis:"#,
    },
];

/// Resolves a personality tag to its prompt, substituting the query and
/// summary. Unknown tags use [`DEFAULT_PERSONALITY`].
pub fn personality_prompt(tag: &str, query: &str, summary: &str) -> String {
    let tag = if tag.trim().is_empty() {
        DEFAULT_PERSONALITY
    } else {
        tag
    };
    let template = PERSONAS
        .iter()
        .find(|p| p.tag == tag)
        .or_else(|| PERSONAS.iter().find(|p| p.tag == DEFAULT_PERSONALITY))
        .map(|p| p.template)
        .unwrap_or_default();
    template
        .replace("{query}", query)
        .replace("{summary}", summary)
}

/// All known personality tags, in table order.
pub fn known_personalities() -> Vec<&'static str> {
    PERSONAS.iter().map(|p| p.tag).collect()
}

impl LlmAgents {
    /// Rewrites a summary in the user's preferred voice. On failure the
    /// caller uses the unstyled summary.
    pub async fn stylize(
        &self,
        query: &str,
        summary: &str,
        personality: &str,
        opts: &CallOptions,
    ) -> Result<String, NewsmithError> {
        let prompt = personality_prompt(personality, query, summary);
        let request = GenerationRequest::new(prompt)
            .with_system_role("You are an expert news content personalizer")
            .with_temperature(0.7)
            .with_max_tokens(4096);

        let response = self.generate(request, opts).await?;
        Ok(response.content)
    }
}
