//! Fixed pattern catalog backing the safety score (spec §4.1). Each hit adds
//! its weight to the running score; `blocked = score >= threshold`.

use once_cell::sync::Lazy;
use regex::Regex;

pub struct SignalPattern {
    pub name: &'static str,
    pub regex: Regex,
    pub weight: u32,
}

fn pattern(name: &'static str, source: &str, weight: u32) -> SignalPattern {
    SignalPattern {
        name,
        regex: Regex::new(source).expect("safety pattern must compile"),
        weight,
    }
}

pub static CATALOG: Lazy<Vec<SignalPattern>> = Lazy::new(|| {
    vec![
        pattern(
            "instruction_override",
            r"(?i)ignore (all|any|the) (previous|prior|above) instructions",
            4,
        ),
        pattern(
            "instruction_override_disregard",
            r"(?i)disregard (everything|all) (you were|you've been) told",
            4,
        ),
        pattern(
            "role_switch",
            r"(?i)you are now (a|an)\s",
            3,
        ),
        pattern(
            "role_switch_pretend",
            r"(?i)pretend (you are|to be) (a|an)\s",
            3,
        ),
        pattern(
            "reveal_system_prompt",
            r"(?i)(reveal|show|print|repeat) (your|the) (system|hidden) prompt",
            5,
        ),
        pattern(
            "reveal_instructions",
            r"(?i)what (are|were) your (original )?instructions",
            4,
        ),
        pattern(
            "code_execution",
            r"(?i)\b(run|execute|eval)\s+(this|the following)\s+(code|script|shell)",
            5,
        ),
        pattern(
            "filesystem_request",
            r"(?i)\b(read|delete|write) (the )?file\b",
            4,
        ),
        pattern("control_token", r"(?i)<\|?(system|assistant|endoftext)\|?>", 4),
        pattern("jailbreak_dan", r"(?i)\bdo anything now\b|\bDAN mode\b", 5),
        pattern("jailbreak_no_restrictions", r"(?i)without any (restrictions|filters|limitations)", 3),
        pattern("data_uri", r"(?i)data:[a-z]+/[a-z0-9.+-]+;base64,", 3),
        pattern(
            "link",
            r"(?i)https?://[^\s]+",
            1,
        ),
        pattern(
            "toxic_lexicon",
            r"(?i)\b(kill yourself|i hate you|go die)\b",
            5,
        ),
    ]
});
