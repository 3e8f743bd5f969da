//! Terminal rendering of client notices and preset listings.

use orbitview_core::{ClientPreset, Notice, NoticeKind, Notifier};

/// Prints success notices to stdout and error notices to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.message),
            NoticeKind::Error => eprintln!("error: {}", notice.message),
        }
    }
}

/// Width of the local id prefix shown in listings.
pub const SHORT_ID_LEN: usize = 8;

pub fn format_preset_row(preset: &ClientPreset) -> String {
    let local_id = preset.local_id().to_string();
    format!(
        "{:<width$}  {:<32}  {:<20}  {:<16}  {}",
        &local_id[..SHORT_ID_LEN],
        preset.store_id().unwrap_or("-"),
        preset.body.name,
        preset.body.model_name,
        preset.created_at.to_rfc3339(),
        width = SHORT_ID_LEN
    )
}

#[cfg(test)]
mod tests {
    use super::format_preset_row;
    use chrono::Utc;
    use orbitview_core::{ClientPreset, SceneState};

    #[test]
    fn row_shows_short_id_and_dash_for_local_presets() {
        let preset = ClientPreset::capture("alice", "Front", &SceneState::default(), Utc::now());
        let row = format_preset_row(&preset);
        assert!(row.starts_with(&preset.local_id().to_string()[..8]));
        assert!(row.contains("  -  "));
        assert!(row.contains("Front"));
        assert!(row.contains("unknown"));
    }
}
