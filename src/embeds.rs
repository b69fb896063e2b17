//! Chat message rendering.
//!
//! Every message the relay sends is built here. The length limits are
//! Discord rendering limits and only apply at this layer; the persisted
//! state always keeps the full values.

use crate::discord::types::Embed;
use crate::state::{BuildRecord, PersistedState};

/// Discord embed field value limit.
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// Per-entry changelog limit in the history embed.
pub const HISTORY_CHANGELOG_LIMIT: usize = 500;

/// Per-entry timestamp limit in the history embed.
pub const HISTORY_TIME_LIMIT: usize = 100;

/// Number of builds shown by the history command.
pub const HISTORY_DISPLAY_COUNT: usize = 3;

/// Fallback link when no build has been seen yet.
pub const DOWNLOADS_PAGE_URL: &str = "https://papermc.io/downloads/paper";

pub const POLL_FAILURE_WARNING: &str =
    "⚠️ Failed to check for new Paper builds. Will retry on the next check.";

pub const GENERIC_COMMAND_ERROR: &str = "Something went wrong while processing this command.";

pub const NOT_AVAILABLE: &str = "Not available";

pub const NO_DATA_YET: &str = "No data yet";

pub const NO_CURRENT_BUILD: &str = "No build information available yet.";

pub const NO_HISTORY: &str = "No build history has been recorded yet.";

const FOOTER: &str = "PaperMC Build Notifier";

const COLOR_NEW_BUILD: u32 = 0x2ecc71;
const COLOR_RESTART: u32 = 0xf1c40f;
const COLOR_INFO: u32 = 0x3498db;

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&"..."[..max.min(3)]);
    out
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_owned()
    } else {
        value.to_owned()
    }
}

fn download_link(record: &BuildRecord) -> String {
    format!(
        "[Download {} build #{}]({})",
        record.version, record.build, record.download_url
    )
}

/// Announcement for a newly detected build.
pub fn new_build_embed(record: &BuildRecord) -> Embed {
    Embed::new("🚀 New Paper Build Available!", COLOR_NEW_BUILD)
        .field("Version", or_placeholder(&record.version, NOT_AVAILABLE), true)
        .field(
            "Build",
            or_placeholder(&record.build.to_string(), NOT_AVAILABLE),
            true,
        )
        .field(
            "Changes",
            truncate(&record.changelog.join("\n"), FIELD_VALUE_LIMIT),
            false,
        )
        .field(
            "Released",
            truncate(&or_placeholder(&record.time, NOT_AVAILABLE), FIELD_VALUE_LIMIT),
            false,
        )
        .field("Download", download_link(record), false)
        .footer(FOOTER)
        .timestamp_now()
}

/// One-off announcement sent when the bot comes online.
pub fn restart_embed(state: &PersistedState) -> Embed {
    Embed::new("🔄 Bot Restarted", COLOR_RESTART)
        .description("The Paper build notifier is back online and watching for new builds.")
        .field(
            "Last Known Version",
            or_placeholder(&state.last_version, NO_DATA_YET),
            true,
        )
        .field(
            "Last Known Build",
            or_placeholder(&state.last_build.to_string(), NO_DATA_YET),
            true,
        )
        .footer(FOOTER)
        .timestamp_now()
}

/// Reply to the status command.
pub fn status_embed(state: &PersistedState) -> Embed {
    let latest = state.latest();
    let changes = latest
        .map(|r| r.changelog.join("\n"))
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
    let download = latest
        .map(download_link)
        .unwrap_or_else(|| format!("[Paper downloads]({DOWNLOADS_PAGE_URL})"));

    Embed::new("📊 Paper Build Status", COLOR_INFO)
        .field(
            "Current Version",
            or_placeholder(&state.last_version, NOT_AVAILABLE),
            true,
        )
        .field(
            "Current Build",
            or_placeholder(&state.last_build.to_string(), NOT_AVAILABLE),
            true,
        )
        .field("Latest Changes", truncate(&changes, FIELD_VALUE_LIMIT), false)
        .field("Download", download, false)
        .footer(FOOTER)
        .timestamp_now()
}

/// Reply to the current-build command.
pub fn current_build_text(state: &PersistedState) -> String {
    if state.is_empty() {
        return NO_CURRENT_BUILD.to_owned();
    }
    format!(
        "Current Paper build: {} (build #{})",
        or_placeholder(&state.last_version, NOT_AVAILABLE),
        or_placeholder(&state.last_build.to_string(), NOT_AVAILABLE)
    )
}

/// Reply to the history command.
pub fn history_embed(state: &PersistedState) -> Embed {
    let embed = Embed::new("📜 Recent Paper Builds", COLOR_INFO)
        .footer(FOOTER)
        .timestamp_now();

    if state.last_builds_data.is_empty() {
        return embed.description(NO_HISTORY);
    }

    state
        .last_builds_data
        .iter()
        .take(HISTORY_DISPLAY_COUNT)
        .fold(embed, |embed, record| {
            let value = format!(
                "{}\n**Released:** {}\n[Download]({})",
                truncate(&record.changelog.join("\n"), HISTORY_CHANGELOG_LIMIT),
                truncate(&record.time, HISTORY_TIME_LIMIT),
                record.download_url
            );
            embed.field(
                format!("Version {} - Build #{}", record.version, record.build),
                truncate(&value, FIELD_VALUE_LIMIT),
                false,
            )
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::state::BuildId;

    fn record(build: u64, changelog: Vec<String>) -> BuildRecord {
        BuildRecord {
            version: "1.20.4".to_owned(),
            build: BuildId::Number(build),
            changelog,
            time: "1/5/2024, 3:04:05 PM".to_owned(),
            download_url: format!(
                "https://api.papermc.io/v2/projects/paper/versions/1.20.4/builds/{build}/downloads/paper-1.20.4-{build}.jar"
            ),
        }
    }

    #[test]
    fn truncate_respects_limit() {
        assert_eq!(truncate("short", 10), "short");
        let cut = truncate(&"x".repeat(2000), FIELD_VALUE_LIMIT);
        assert_eq!(cut.chars().count(), FIELD_VALUE_LIMIT);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("abcdef", 2), "..");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let text = "é".repeat(20);
        assert_eq!(truncate(&text, 20), text);
        assert_eq!(truncate(&text, 10).chars().count(), 10);
    }

    #[test]
    fn new_build_embed_has_all_fields() {
        let embed = new_build_embed(&record(11, vec!["- fix A".into(), "- fix B".into()]));
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Version", "Build", "Changes", "Released", "Download"]);
        assert_eq!(embed.fields[2].value, "- fix A\n- fix B");
        assert!(embed.fields[4].value.contains("paper-1.20.4-11.jar"));
        assert!(embed.timestamp.is_some());
    }

    #[test]
    fn new_build_embed_truncates_long_changelog() {
        let embed = new_build_embed(&record(11, vec!["y".repeat(3000)]));
        assert!(embed.fields[2].value.chars().count() <= FIELD_VALUE_LIMIT);
    }

    #[test]
    fn restart_embed_without_data_uses_placeholders() {
        let embed = restart_embed(&PersistedState::default());
        assert_eq!(embed.fields[0].value, NO_DATA_YET);
        assert_eq!(embed.fields[1].value, NO_DATA_YET);
    }

    #[test]
    fn empty_state_placeholders() {
        let state = PersistedState::default();

        let status = status_embed(&state);
        assert_eq!(status.fields[0].value, NOT_AVAILABLE);
        assert_eq!(status.fields[1].value, NOT_AVAILABLE);
        assert!(status.fields[3].value.contains(DOWNLOADS_PAGE_URL));

        assert_eq!(current_build_text(&state), NO_CURRENT_BUILD);

        let history = history_embed(&state);
        assert!(history.fields.is_empty());
        assert_eq!(history.description.as_deref(), Some(NO_HISTORY));
    }

    #[test]
    fn current_build_text_cites_version_and_build() {
        let mut state = PersistedState::default();
        state.record_build(record(11, vec![]));
        assert_eq!(
            current_build_text(&state),
            "Current Paper build: 1.20.4 (build #11)"
        );
    }

    #[test]
    fn history_shows_three_of_five_with_capped_changelog() {
        let mut state = PersistedState::default();
        for build in 1..=5 {
            state.record_build(record(build, vec!["z".repeat(900)]));
        }

        let embed = history_embed(&state);
        assert_eq!(embed.fields.len(), HISTORY_DISPLAY_COUNT);
        assert_eq!(embed.fields[0].name, "Version 1.20.4 - Build #5");
        for field in &embed.fields {
            let changelog = field.value.split("\n**Released:**").next().unwrap();
            assert!(changelog.chars().count() <= HISTORY_CHANGELOG_LIMIT);
            assert!(field.value.chars().count() <= FIELD_VALUE_LIMIT);
        }
    }

    #[test]
    fn status_embed_caps_latest_changes() {
        let mut state = PersistedState::default();
        state.record_build(record(11, vec!["c".repeat(700), "d".repeat(700)]));

        let embed = status_embed(&state);
        assert_eq!(embed.fields[2].name, "Latest Changes");
        assert_eq!(embed.fields[2].value.chars().count(), FIELD_VALUE_LIMIT);
        assert!(embed.fields[2].value.ends_with("..."));
    }

    #[test]
    fn history_caps_release_time() {
        let mut long_time = record(11, vec!["- fix A".into()]);
        long_time.time = "t".repeat(300);
        let mut state = PersistedState::default();
        state.record_build(long_time);

        let embed = history_embed(&state);
        let value = &embed.fields[0].value;
        let time = value
            .split("**Released:** ")
            .nth(1)
            .and_then(|rest| rest.split("\n[Download]").next())
            .unwrap();
        assert_eq!(time.chars().count(), HISTORY_TIME_LIMIT);
        assert!(time.ends_with("..."));
        assert!(value.starts_with("- fix A\n"));
    }
}
