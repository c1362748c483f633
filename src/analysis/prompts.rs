//! Prompt templates for the two analysis passes

/// Short summary prompt for a text artifact
#[must_use]
pub fn summary_prompt(role: &str, text: &str) -> String {
    format!(
        "You are a senior application security tester. Provide a bullet-friendly \
         security summary of at most 120 words for the following {role}, \
         highlighting potential vulnerabilities.\n\n{text}"
    )
}

/// Deep-dive prompt aligned with the OWASP Web Security Testing Guide
#[must_use]
pub fn deep_dive_prompt(kind: &str, text: &str) -> String {
    format!(
        "You are an expert pentester using the OWASP Web Security Testing Guide.\n\
         Analyse the following {kind} file and produce:\n\
         - Purpose overview\n\
         - Critical code walkthrough\n\
         - Potential vulnerabilities/misconfigurations (with OWASP refs)\n\
         - Manual or automated tests to confirm each finding\n\
         Limit to 500 words and quote only relevant lines.\n\
         --- BEGIN ---\n\
         {text}\n\
         --- END ---\n"
    )
}
