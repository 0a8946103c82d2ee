pub const GENERATION_HINT: &str = "Video generation usually takes 1-3 minutes";
pub const AUTH_REQUIRED: &str =
    "Veo requires a paid Google AI Studio API key. Please select one to continue.";
pub const BILLING_DOCS: &str = "https://ai.google.dev/gemini-api/docs/billing";
pub const PROGRESS_BAR_WIDTH: usize = 30;
