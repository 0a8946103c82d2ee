use animator_core::{AppViewModel, Stage};

use super::constants::*;

/// Turns a view snapshot into the lines printed on the terminal.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if view.needs_authorization {
        lines.push(AUTH_REQUIRED.to_string());
        lines.push(format!("Billing documentation: {BILLING_DOCS}"));
    }

    if view.status.is_active {
        lines.push(format!(
            "{} {:>3}% [{}] {}",
            progress_bar(view.status.progress_percent, PROGRESS_BAR_WIDTH),
            view.status.progress_percent,
            stage_label(view.stage),
            view.status.message
        ));
        lines.push(GENERATION_HINT.to_string());
    }

    if let Some(notice) = &view.notice {
        lines.push(notice.clone());
    }

    if let Some(result) = &view.result {
        let location = result
            .asset_url
            .to_file_path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| result.asset_url.to_string());
        lines.push(format!("Video ready ({}): {location}", result.aspect_ratio));
    }

    lines
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle => "Idle",
        Stage::Authorizing => "Authorizing",
        Stage::Submitted => "Submitted",
        Stage::Polling => "Generating",
        Stage::Retrieving => "Downloading",
        Stage::Succeeded => "Done",
        Stage::Failed => "Failed",
    }
}

fn progress_bar(percent: u8, width: usize) -> String {
    let filled = usize::from(percent.min(100)) * width / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}
