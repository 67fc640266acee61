//! Vision model prompts for form analysis.
//!
//! Prompts demand JSON-only output; the parsers in
//! [`super::vision`] still tolerate surrounding prose.

/// Prompt for inferring the full form structure from a screenshot.
pub const FORM_ANALYSIS_PROMPT: &str = r#"You are analyzing a job application form. Look at this screenshot and identify ALL visible form fields.

For EACH field provide:
1. The field label (e.g. "First Name", "Email Address", "Years of Experience")
2. The field type: one of text, textarea, dropdown, checkbox, file_upload, radio_group
3. Whether it is required (red asterisk * or "required" text)
4. For dropdowns and radio groups, the visible options in order
5. For file uploads, the accepted file types if shown (e.g. ".pdf", ".docx")
6. A maximum length if the field advertises one

Also identify buttons that advance the form ("Next", "Continue") and
buttons that perform the final submission ("Submit", "Review", "Submit application").

Return ONLY valid JSON in this exact format:
{
    "fields": [
        {
            "label": "First Name",
            "type": "text",
            "required": true,
            "options": [],
            "accepted_file_types": [],
            "max_length": null
        }
    ],
    "next_buttons": ["Next"],
    "submit_buttons": []
}

Do NOT include any explanation, only the JSON."#;

/// Prompt for CAPTCHA presence detection.
pub const CAPTCHA_PROMPT: &str = r#"Look at this screenshot. Is there a CAPTCHA challenge visible?
This could be:
- reCAPTCHA ("I'm not a robot" checkbox)
- Image selection (select all traffic lights, etc.)
- Text CAPTCHA
- hCaptcha

Answer with ONLY "yes" or "no"."#;

/// Prompt for post-submit confirmation classification.
pub const CONFIRMATION_PROMPT: &str = r#"Look at this screenshot. Does it show a successful job application submission?

Look for:
- Success messages ("Application submitted", "Thank you", etc.)
- Confirmation numbers or reference IDs
- Error messages (if submission failed)

Return ONLY valid JSON:
{
    "success": true,
    "message": "Your application has been submitted",
    "confirmation_number": "APP-12345"
}

If the page shows a failure, set "success" to false and put the error in
"message". Use null for a missing confirmation number."#;
