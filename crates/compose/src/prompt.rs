//! Prompt construction and response parsing for the status model.

use std::collections::BTreeSet;

pub(crate) const DEFAULT_DETAILS: &str = "Discord Status Fusion";
pub(crate) const DEFAULT_STATE: &str = "AI-powered status";

/// Render the model prompt from the current observations. The app set is
/// already ordered, so the same inputs always produce the same prompt.
pub(crate) fn build_prompt(apps: &BTreeSet<String>, media: Option<&str>) -> String {
    let apps_text = if apps.is_empty() {
        "No applications detected".to_string()
    } else {
        apps.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    let music_text = media.unwrap_or("No music playing");

    format!(
        r#"Generate Discord status from professional apps. Show exactly 4 apps when possible.

Professional apps detected: {apps_text}
Music: {music_text}

Rules:
- Select exactly 4 most relevant apps from the professional apps list
- CRITICAL: NO DUPLICATE APPS - each app name must appear exactly once
- If less than 4 apps available, show all available apps (don't repeat any)
- Clean up app names: "stable" → "Warp", "zed" → "Zed", "code" → "VS Code", "Adobe Photoshop 2025" → "Photoshop", etc.
- Prioritize: Development tools > Office apps > Creative tools > Browsers
- BE CONSISTENT - always pick the same apps for the same app list
- Line1: Using [app1] + [app2] + [app3] + [app4] (NO music apps here)
- Line2: If music detected → ♪ [exact music text], if "No music playing" → workflow description

Examples:
Professional apps: stable, zed, Microsoft Excel, Safari
Music: Song by Artist on Apple Music
→ Line1: Using Warp + Zed + Excel + Safari
→ Line2: ♪ Song by Artist on Apple Music

Professional apps: stable, Safari, Safari, Safari (duplicates detected)
Music: No music playing
→ Line1: Using Warp + Safari (NO DUPLICATES!)
→ Line2: Development workflow

Professional apps: Adobe Photoshop, Adobe Illustrator, Google Chrome, Figma
Music: No music playing
→ Line1: Using Photoshop + Illustrator + Chrome + Figma
→ Line2: Creative design workflow

Respond exactly:
Line1: [your line]
Line2: [your line]"#
    )
}

/// Pull the two labeled lines out of a model completion. The label may sit
/// anywhere in the line; models often echo the prompt's `→ Line1:` arrow
/// form. Missing labels keep their defaults rather than failing the whole
/// composition.
pub(crate) fn parse_status_lines(completion: &str) -> (String, String) {
    let mut details = DEFAULT_DETAILS.to_string();
    let mut state = DEFAULT_STATE.to_string();

    for line in completion.lines() {
        if let Some(rest) = after_label(line, "line1:") {
            details = rest.to_string();
        } else if let Some(rest) = after_label(line, "line2:") {
            state = rest.to_string();
        }
    }

    (details, state)
}

/// Text after the first occurrence of `label`, matched case-insensitively.
/// The label is ASCII, so byte offsets into the lowercased copy are valid
/// in the original line.
fn after_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let pos = line.to_ascii_lowercase().find(label)?;
    Some(line[pos + label.len()..].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apps(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prompt_lists_apps_and_music() {
        let prompt = build_prompt(&apps(&["Cursor", "stable"]), Some("Song by Artist on Spotify"));
        assert!(prompt.contains("Professional apps detected: Cursor, stable"));
        assert!(prompt.contains("Music: Song by Artist on Spotify"));
    }

    #[test]
    fn prompt_marks_empty_observations() {
        let prompt = build_prompt(&BTreeSet::new(), None);
        assert!(prompt.contains("Professional apps detected: No applications detected"));
        assert!(prompt.contains("Music: No music playing"));
    }

    #[test]
    fn prompt_is_deterministic_for_the_same_set() {
        let a = build_prompt(&apps(&["Safari", "Cursor", "zed"]), None);
        let b = build_prompt(&apps(&["zed", "Safari", "Cursor"]), None);
        assert_eq!(a, b);
    }

    #[test]
    fn parses_both_labeled_lines() {
        let (details, state) =
            parse_status_lines("Line1: Using Cursor + Chrome\nLine2: Working");
        assert_eq!(details, "Using Cursor + Chrome");
        assert_eq!(state, "Working");
    }

    #[test]
    fn labels_match_case_insensitively() {
        let (details, state) = parse_status_lines("line1: A\nLINE2: B");
        assert_eq!(details, "A");
        assert_eq!(state, "B");
    }

    #[test]
    fn arrow_prefixed_labels_are_recognized() {
        let (details, state) =
            parse_status_lines("→ Line1: Using Warp + Zed\n→ Line2: ♪ Song by Artist");
        assert_eq!(details, "Using Warp + Zed");
        assert_eq!(state, "♪ Song by Artist");
    }

    #[test]
    fn missing_labels_keep_defaults() {
        let (details, state) = parse_status_lines("nothing useful here");
        assert_eq!(details, DEFAULT_DETAILS);
        assert_eq!(state, DEFAULT_STATE);
    }

    #[test]
    fn later_labels_win_and_whitespace_is_trimmed() {
        let (details, _) = parse_status_lines("Line1: first\n  Line1:   second  ");
        assert_eq!(details, "second");
    }
}
