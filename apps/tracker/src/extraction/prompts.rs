// Extraction prompt and answer schema.

use serde_json::{json, Value};

use crate::llm_client::prompts::{json_schema_format, JSON_ONLY_INSTRUCTION};
use crate::models::observation::Outcome;

pub const EXTRACTION_SYSTEM: &str = r#"You extract structured data from job application emails.

Rules:
-Extract only information that is explicitly stated in the text. Do not infer or invent anything.
-If a value is not clearly identifiable, return null.

gespraechspartner (contact person):
-If a specific person is explicitly named in the text (usually after the closing phrase), use exactly that name.
-The "From:" line may ONLY be used if it clearly contains a personal name (first + last name; no roles/teams/emails).
-If "From:" is only a team/department/shared mailbox: return null.
-If multiple persons are mentioned directly after the closing phrase, or if the person is unclear, return null.

beworben_als (applied position):
-Job title without additions such as (m/f/d), etc.

anschrift (address):
-Return ONLY a postal address in ONE LINE: "<street> <house_number>, <postal_code> <city>"
-Do NOT include company name, campus/location names, departments, Postfach/PO box lines, country, or any extra lines.
-If you cannot extract street+postal_code+city clearly: return null.

ergebnis (result):
-Absage = clear rejection
-Einladung = ONLY if explicit invitation to interview/meeting/call
-Zwischenstand = all other cases"#;

pub const EXTRACTION_SCHEMA_NAME: &str = "bewerbung_extraction";

/// Full system prompt sent with every extraction call.
pub fn extraction_system_prompt() -> String {
    format!("{EXTRACTION_SYSTEM}\n\n{JSON_ONLY_INSTRUCTION}")
}

/// `response_format` for the extraction call.
pub fn extraction_response_format() -> Value {
    let outcomes: Vec<&str> = Outcome::ALL.iter().map(|o| o.label()).collect();
    json_schema_format(
        EXTRACTION_SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "arbeitgeber_name": {"type": ["string", "null"]},
                "gespraechspartner": {"type": ["string", "null"]},
                "beworben_als": {"type": ["string", "null"]},
                "anschrift": {"type": ["string", "null"]},
                "ergebnis": {"type": "string", "enum": outcomes},
            },
            "required": ["arbeitgeber_name", "beworben_als", "ergebnis"],
            "additionalProperties": false,
        }),
    )
}
