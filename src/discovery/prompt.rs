// src/discovery/prompt.rs
use super::response::ResponseFormat;
use crate::types::Candidate;

/// Everything the model needs to pick one profile for a company.
pub struct PromptInput<'a> {
    pub company: &'a str,
    pub candidates: &'a [Candidate],
    pub roles: &'a [String],
    pub format: ResponseFormat,
    pub outreach_context: Option<&'a str>,
}

pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let roles = if input.roles.is_empty() {
        "senior executive".to_string()
    } else {
        input.roles.join(", ")
    };

    let profiles = input
        .candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.context_line()))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        r#"You are a research assistant.

Given the company "{company}" and the following LinkedIn profiles:
{profiles}

Which one is most likely the current {roles} of "{company}"?

Selection rules:
1. Prefer a profile whose company name matches "{company}" exactly over loosely related, affiliated or similarly named organizations.
2. Prefer profiles showing a current role over former roles ("ex-", "former", past dates).
3. If a widely known public figure leads "{company}", prefer that person.
4. If you are unsure, still return the single best guess. Never answer with "none"."#,
        company = input.company,
        profiles = profiles,
        roles = roles,
    );

    match input.format {
        ResponseFormat::Structured => {
            prompt.push_str(
                r#"

Respond with a JSON object only, with exactly these fields:
- "url": the chosen LinkedIn profile URL, copied exactly from the list above
- "message": one short, friendly, personalized outreach line addressed to that person
- "confidence": an integer from 0 to 100 for how sure you are this is the right person"#,
            );
            if let Some(context) = input.outreach_context.filter(|c| !c.trim().is_empty()) {
                prompt.push_str(&format!(
                    "\n\nThe outreach line is sent on behalf of: {}",
                    context.trim()
                ));
            }
        }
        ResponseFormat::BareUrl => {
            prompt.push_str("\n\nReturn ONLY the best LinkedIn URL.");
        }
    }

    prompt
}
