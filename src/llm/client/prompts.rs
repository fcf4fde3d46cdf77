//! Default prompts for the oracle and chat.

/// Calculator prompt. Placeholders: `{dob}`, `{tob}`, `{city}`.
pub const DEFAULT_CALCULATOR_PROMPT: &str = "Calculate chart for Date:{dob}, Time:{tob}, City:{city}. Return strictly JSON with keys: House, Planet, Mahadasha, Antardasha, Pratyanerdasha.";

/// Writer prompt. Placeholders: `{name}`, `{question}`, `{facts}`, `{knowledge}`.
pub const DEFAULT_WRITER_PROMPT: &str = r#"USER: {name} | QUESTION: {question}
FACTS: {facts} | DATABASE: {knowledge}
Write EXACTLY 8 crisp lines of reading, one blank line, then EXACTLY 2 lines of remedies. No fluff."#;

/// Persona used for free-form chat.
pub const DEFAULT_ASTROLOGER_PERSONA: &str = "You are an expert, mystical AI Astrologer. Your tone is wise, poetic, and encouraging. \
Use astrological terms like 'Retrograde', 'Houses', 'Aspects', and 'Birth Chart'. \
If a user doesn't provide their Sun sign or birth date, ask for it politely. \
Always remind them that astrology is for guidance and entertainment.";
